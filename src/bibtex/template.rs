use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::StyleConfig;

/// Style template shipped with the crate
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/default.bst");

/// Active sort stage in the base template (chronological)
pub const DATE_SORT_STAGE: &str = "ITERATE {presort3}";
/// Replacement selecting the name-based sort stage
pub const NAME_SORT_STAGE: &str = "ITERATE {presort2}";

/// Full name format used in the base template, and the surname-only query form
const FULL_NAME_FORMAT: &str = "{f.~}{vv~}{ll}{, jj}";
const QUERY_NAME_FORMAT: &str = "{ll}";

/// Prefix commenting out the bibitem region
const BIBITEM_COMMENT: &str = "% ";
const BIBITEM_ID_VARIANT: &str = "%%id";
const BIBITEM_INITIALS_VARIANT: &str = "%%initials";
const BIBITEM_BRACKET_VARIANT: &str = "%%[]";

static RESIDUAL_STYLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)---\w+?style---").expect("Invalid style placeholder regex pattern")
});
static RESIDUAL_STYLE_END_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)---\w+?styleend---").expect("Invalid style-end placeholder regex pattern")
});

/// Placeholder pair marking where a role's emphasis opens and closes
pub fn placeholders(role: &str) -> (String, String) {
    (format!("---{}style---", role), format!("---{}styleend---", role))
}

/// Opening and closing text wrapped around a role for `command`
pub fn brackets(command: &str, html: bool) -> (String, String) {
    if command.is_empty() {
        return (String::new(), String::new());
    }
    if html {
        // sentinels survive the compiler and are swapped for HTML afterwards
        (
            format!("\\{}{{start_html_{}_start", command, command),
            format!("end_html_{}_end}}", command),
        )
    } else {
        (format!("\\{}{{", command), "}".to_string())
    }
}

/// Style template ready to hand to the bibliography compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    text: String,
    reverse_output: bool,
}

impl CompiledTemplate {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether rendered entries must be reversed (newest first)
    pub fn reverse_output(&self) -> bool {
        self.reverse_output
    }
}

/// Rewrites a base style template according to a [`StyleConfig`]
#[derive(Debug, Clone)]
pub struct TemplateCompiler {
    base: String,
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::with_base(DEFAULT_TEMPLATE)
    }
}

impl TemplateCompiler {
    pub fn with_base(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Compile the base template. Total over every configuration: unknown or malformed
    /// values are ignored and no placeholder survives.
    pub fn compile(&self, config: &StyleConfig) -> CompiledTemplate {
        let mut text = self.base.clone();

        let reverse_output = if config.is_query() {
            // lookups list surnames only, in compiler order
            text = text.replace(FULL_NAME_FORMAT, QUERY_NAME_FORMAT);
            false
        } else {
            text = apply_style_directives(text, config);
            let reverse = apply_sort_order(&mut text, config.sort_by());
            if config.gen_bibitems() {
                text = enable_bibitems(text, config.bibitem_style());
            }
            reverse
        };

        let text = strip_residual_placeholders(&text);
        CompiledTemplate {
            text,
            reverse_output,
        }
    }
}

fn apply_style_directives(mut text: String, config: &StyleConfig) -> String {
    let html = config.is_html();
    for (role, command) in config.style_directives() {
        let (start_token, end_token) = placeholders(&role);
        if !text.contains(&start_token) {
            debug!("Template has no placeholder for role {:?}, ignoring", role);
            continue;
        }
        let (open, close) = brackets(&command, html);
        text = text.replace(&start_token, &open).replace(&end_token, &close);
    }
    text
}

/// Select the sort stage; returns whether output has to be reversed afterwards
fn apply_sort_order(text: &mut String, sort_by: &str) -> bool {
    if sort_by.contains("name") {
        *text = text.replace(DATE_SORT_STAGE, NAME_SORT_STAGE);
        false
    } else {
        if !sort_by.is_empty() && !sort_by.contains("oldest") && !sort_by.contains("newest") {
            debug!("Unrecognised sortBy {:?}, using newest first", sort_by);
        }
        !sort_by.contains("oldest")
    }
}

/// Uncomment the bibitem region and keep the variant matching `bibitem_style`
fn enable_bibitems(text: String, bibitem_style: &str) -> String {
    let mut text = text.replace(BIBITEM_COMMENT, "");
    if bibitem_style.contains("{id}") {
        text = text.replace(BIBITEM_ID_VARIANT, "");
    } else {
        text = text.replace(BIBITEM_INITIALS_VARIANT, "");
    }
    if bibitem_style.contains('[') {
        text = text.replace(BIBITEM_BRACKET_VARIANT, "");
    }
    text
}

fn strip_residual_placeholders(text: &str) -> String {
    let text = RESIDUAL_STYLE_REGEX.replace_all(text, "");
    RESIDUAL_STYLE_END_REGEX.replace_all(&text, "").into_owned()
}
