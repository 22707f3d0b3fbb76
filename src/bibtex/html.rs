use once_cell::sync::Lazy;
use regex::Regex;

use super::normalize::CHUNK_SEPARATOR;
use super::Field;

/// HTML opening tag for each emphasis command; every one closes with [`HTML_CLOSE`]
pub const HTML_STYLES: &[(&str, &str)] = &[
    ("emph", r#"<font style="font-style:italic;font-weight:bold;">"#),
    ("textit", r#"<font style="font-style:italic;">"#),
    ("textbf", r#"<font style="font-weight:bold;">"#),
    ("textsc", r#"<font style="font-variant:small-caps;">"#),
];

pub const HTML_CLOSE: &str = "</font>";

static FIELD_END_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Z]{2,3}_END").expect("Invalid field end regex pattern")
});
static HTML_START_SENTINEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)start_html_(\w+?)_start").expect("Invalid HTML start sentinel regex pattern")
});
static HTML_END_SENTINEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)end_html_(\w+?)_end").expect("Invalid HTML end sentinel regex pattern")
});
static CPRIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\cprime").expect("Invalid cprime regex pattern")
});
static BOLD_FONT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\(bold|Bbb)").expect("Invalid bold font regex pattern")
});
static BRACED_CAPITAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Z])\}").expect("Invalid braced capital regex pattern")
});

pub fn html_open_tag(command: &str) -> Option<&'static str> {
    HTML_STYLES
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, tag)| *tag)
}

/// Join filtered entries and turn every remaining marker into final output.
pub fn finalize(chunks: &[String], html: bool) -> String {
    let mut data = chunks.join(CHUNK_SEPARATOR);

    if html {
        data = substitute_html(&data);
    }
    data = substitute_fields(&data);
    cleanup(&data)
}

/// Swap the emphasis sentinels for their HTML tags
pub fn substitute_html(data: &str) -> String {
    let mut data = data.to_string();
    for (command, open_tag) in HTML_STYLES {
        data = data
            .replace(&format!("start_html_{}_start", command), open_tag)
            .replace(&format!("end_html_{}_end", command), HTML_CLOSE);
    }
    data
}

/// Close every identifier span and open it with its LaTeX command
pub fn substitute_fields(data: &str) -> String {
    let mut data = FIELD_END_REGEX.replace_all(data, "}").into_owned();
    for field in Field::ALL {
        data = data.replace(field.start_marker(), field.latex_opener());
    }
    data
}

fn cleanup(data: &str) -> String {
    // sentinels for commands without an HTML mapping
    let data = HTML_START_SENTINEL_REGEX.replace_all(data, "");
    let data = HTML_END_SENTINEL_REGEX.replace_all(&data, "");
    let data = CPRIME_REGEX.replace_all(&data, "$$'$$");
    let data = BOLD_FONT_REGEX.replace_all(&data, r"\bf");
    BRACED_CAPITAL_REGEX.replace_all(&data, "$1").into_owned()
}
