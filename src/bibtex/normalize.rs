use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_BLANK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\n\r\s]*").expect("Invalid leading blank regex pattern")
});
// A newline right after text belongs to a wrapped line; a newline after a newline is an
// entry boundary.
static WRAPPED_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\n])\n").expect("Invalid wrapped line regex pattern")
});
static SPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r" +").expect("Invalid space run regex pattern")
});

/// Separator between rendered entries
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Turn raw compiler output into one string per entry.
///
/// Lines wrapped by the compiler are joined, space runs collapsed, and entries split on
/// blank lines. With `reverse_output` the entry order is flipped. Chunks that are empty
/// after normalisation (trailing blank lines) are dropped.
pub fn normalize(raw: &str, reverse_output: bool) -> Vec<String> {
    let text = LEADING_BLANK_REGEX.replace(raw, "");
    let text = text.replace('\r', "");
    let text = WRAPPED_LINE_REGEX.replace_all(&text, "$1 ");
    let text = SPACE_RUN_REGEX.replace_all(&text, " ");
    let text = text.replace('\n', CHUNK_SEPARATOR);

    let mut chunks: Vec<String> = text
        .split(CHUNK_SEPARATOR)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(str::to_string)
        .collect();

    if reverse_output {
        chunks.reverse();
    }
    chunks
}
