use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::Field;
use crate::config::StyleConfig;

/// Resolver prefix used when a DOI is shown as a link
pub const DOI_RESOLVER: &str = "http://dx.doi.org/";

static ANY_IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)(MR|ZBL|AR)_START").expect("Invalid identifier regex pattern")
});
static REVIEW_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)(MR|ZBL)_START").expect("Invalid review number regex pattern")
});
// URL span with no whitespace that points at the DOI resolver
static RESOLVER_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)URL_START[^\s\n]*?dx\.doi[^\s\n]*?URL_END")
        .expect("Invalid resolver URL regex pattern")
});

/// Which review numbers (MR / Zbl) to keep
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewPolicy {
    /// One of `Both`, `MR#`, `Zbl#`, `Neither`
    Absolute { keep_mr: bool, keep_zbl: bool },
    /// Anything else, e.g. `Zbl# if no MR#`; evaluated against what the entry contains
    Conditional(String),
}

impl ReviewPolicy {
    pub fn classify(value: &str) -> Self {
        match value {
            "Both" => ReviewPolicy::Absolute { keep_mr: true, keep_zbl: true },
            "MR#" => ReviewPolicy::Absolute { keep_mr: true, keep_zbl: false },
            "Zbl#" => ReviewPolicy::Absolute { keep_mr: false, keep_zbl: true },
            "Neither" => ReviewPolicy::Absolute { keep_mr: false, keep_zbl: false },
            other => ReviewPolicy::Conditional(other.to_string()),
        }
    }
}

/// Remove every span of `field`; a missing span is a no-op
pub fn remove_span(chunk: &str, field: Field) -> String {
    field.span_regex().replace_all(chunk, "").into_owned()
}

/// Inner text of the first span of `field`, if there is one
pub fn span_content(chunk: &str, field: Field) -> Option<&str> {
    field
        .span_regex()
        .captures(chunk)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn has_span(chunk: &str, field: Field) -> bool {
    chunk.contains(field.start_marker())
}

/// Apply the identifier policies of `config` to one rendered entry.
///
/// Steps run in a fixed order and each sees the result of the previous one:
/// review numbers, arXiv, DOI/URL inclusion, DOI-vs-URL rendering.
pub fn filter(chunk: &str, config: &StyleConfig) -> String {
    let mut data = chunk.to_string();

    data = apply_review_policy(data, config.mode_option("MRZbl"));

    if config.mode_option("Arxiv") == "Exclude" {
        data = remove_span(&data, Field::Arxiv);
    }

    data = apply_link_inclusion(data, config.mode_option("IncludeDOIURL"));
    apply_link_rendering(data, config.mode_option("DOIURL"))
}

fn apply_review_policy(mut data: String, policy: &str) -> String {
    match ReviewPolicy::classify(policy) {
        ReviewPolicy::Absolute { keep_mr, keep_zbl } => {
            if !keep_mr {
                data = remove_span(&data, Field::Mr);
            }
            if !keep_zbl {
                data = remove_span(&data, Field::Zbl);
            }
        }
        ReviewPolicy::Conditional(policy) => {
            if policy.is_empty() {
                return data;
            }
            if has_span(&data, Field::Mr) && policy.contains("Zbl# if") {
                data = remove_span(&data, Field::Zbl);
            }
            // Keyed on the Zbl span, not MR, and drops Zbl either way. Kept as the report
            // has always behaved until the intended rule is confirmed.
            if has_span(&data, Field::Zbl) && policy.contains("MR# if") {
                data = remove_span(&data, Field::Zbl);
            }
        }
    }
    data
}

/// Drop both DOI and URL when the inclusion policy says so
fn apply_link_inclusion(data: String, policy: &str) -> String {
    let has_any = ANY_IDENTIFIER_REGEX.is_match(&data);
    let has_review = REVIEW_NUMBER_REGEX.is_match(&data);

    let exclude = policy == "Exclude"
        || (policy.contains("arXiv") && has_any)
        || (policy.contains("Only") && !policy.contains("arXiv") && has_review);

    if exclude {
        let data = remove_span(&data, Field::Doi);
        remove_span(&data, Field::Url)
    } else {
        data
    }
}

/// Decide how DOI and URL are shown
fn apply_link_rendering(data: String, mode: &str) -> String {
    if mode == "URL" {
        return remove_span(&data, Field::Doi);
    }
    if mode == "DOI#" || (mode.contains("different") && RESOLVER_URL_REGEX.is_match(&data)) {
        return remove_span(&data, Field::Url);
    }
    if mode.contains("as") {
        return doi_as_url(data);
    }
    if !mode.is_empty() && !mode.contains("different") {
        debug!("Unrecognised DOIURL mode {:?}, keeping both", mode);
    }
    data
}

/// Show a DOI in URL clothing: every URL span points at the resolver, the DOI span goes.
/// Only a DOI with non-empty text triggers the rewrite; without a URL span the DOI is
/// simply dropped.
fn doi_as_url(data: String) -> String {
    let Some(doi) = span_content(&data, Field::Doi)
        .filter(|doi| !doi.is_empty())
        .map(str::to_string)
    else {
        return data;
    };

    let resolver_span = format!(
        "{}{}{}{}",
        Field::Url.start_marker(),
        DOI_RESOLVER,
        doi,
        Field::Url.end_marker()
    );

    let url = Field::Url
        .span_regex()
        .replace_all(&data, |_: &Captures| resolver_span.clone());
    remove_span(&url, Field::Doi)
}
