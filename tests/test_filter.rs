use citereport::bibtex::filter::{filter, span_content, ReviewPolicy, DOI_RESOLVER};
use citereport::bibtex::Field;
use citereport::StyleConfig;

const BOTH_NUMBERS: &str = "Author, Title. MR_START123MR_END ZBL_START456ZBL_END";

fn config(pairs: &[(&str, &str)]) -> StyleConfig {
    pairs
        .iter()
        .fold(StyleConfig::new(), |config, (key, value)| config.with(*key, *value))
}

#[test]
fn test_chunk_without_spans_is_unchanged() {
    let chunk = "A.~Author, \\textit{A title}, J. Math. 12 (2001), 1--10.";
    let configs = vec![
        StyleConfig::new(),
        config(&[("MRZbl", "Neither"), ("Arxiv", "Exclude")]),
        config(&[("IncludeDOIURL", "Exclude"), ("DOIURL", "URL")]),
        config(&[("MRZbl", "Zbl# if no MR#"), ("DOIURL", "DOI as URL")]),
        config(&[("IncludeDOIURL", "Only if no arXiv"), ("DOIURL", "URL if different")]),
        config(&[("MRZbl", "garbage"), ("DOIURL", "DOI#")]),
    ];
    for config in configs {
        assert_eq!(filter(chunk, &config), chunk, "changed under {:?}", config);
    }
}

#[test]
fn test_review_policy_classification() {
    assert_eq!(
        ReviewPolicy::classify("MR#"),
        ReviewPolicy::Absolute { keep_mr: true, keep_zbl: false }
    );
    assert_eq!(
        ReviewPolicy::classify("Neither"),
        ReviewPolicy::Absolute { keep_mr: false, keep_zbl: false }
    );
    assert_eq!(
        ReviewPolicy::classify("Zbl# if no MR#"),
        ReviewPolicy::Conditional("Zbl# if no MR#".to_string())
    );
}

#[test]
fn test_mr_only_policy_removes_zbl_span() {
    let result = filter(BOTH_NUMBERS, &config(&[("MRZbl", "MR#")]));
    assert!(result.contains("MR_START123MR_END"));
    assert!(!result.contains("ZBL_"));
    assert!(!result.contains("456"));
}

#[test]
fn test_absolute_review_policies() {
    let zbl = filter(BOTH_NUMBERS, &config(&[("MRZbl", "Zbl#")]));
    assert!(!zbl.contains("123"));
    assert!(zbl.contains("ZBL_START456ZBL_END"));

    let neither = filter(BOTH_NUMBERS, &config(&[("MRZbl", "Neither")]));
    assert_eq!(neither.trim(), "Author, Title.");

    let both = filter(BOTH_NUMBERS, &config(&[("MRZbl", "Both")]));
    assert_eq!(both, BOTH_NUMBERS);
}

#[test]
fn test_span_match_is_case_insensitive_and_multiline() {
    let chunk = "X mr_start12\n34mr_end Y";
    let result = filter(chunk, &config(&[("MRZbl", "Zbl#")]));
    assert_eq!(result, "X  Y");
}

#[test]
fn test_mode_prefix_selects_policy_set() {
    let config = config(&[("type", "search"), ("searchMRZbl", "MR#"), ("MRZbl", "Neither")]);
    let result = filter(BOTH_NUMBERS, &config);
    assert!(result.contains("MR_START123MR_END"));
    assert!(!result.contains("456"));
}

#[test]
fn test_conditional_zbl_dropped_when_mr_present() {
    let policy = config(&[("MRZbl", "Zbl# if no MR#")]);

    let result = filter(BOTH_NUMBERS, &policy);
    assert!(result.contains("MR_START123MR_END"));
    assert!(!result.contains("456"));

    let zbl_only = "Title. ZBL_START456ZBL_END";
    assert_eq!(filter(zbl_only, &policy), zbl_only);
}

#[test]
fn test_conditional_mr_policy_drops_zbl_whenever_zbl_present() {
    let policy = config(&[("MRZbl", "MR# if available")]);

    let zbl_only = "Title. ZBL_START456ZBL_END";
    assert_eq!(filter(zbl_only, &policy).trim(), "Title.");

    let mr_only = "Title. MR_START123MR_END";
    assert_eq!(filter(mr_only, &policy), mr_only);
}

#[test]
fn test_arxiv_exclusion() {
    let chunk = "Title. AR_START2001.00001AR_END";
    assert_eq!(filter(chunk, &config(&[("Arxiv", "Exclude")])).trim(), "Title.");
    assert_eq!(filter(chunk, &config(&[("Arxiv", "Include")])), chunk);
}

#[test]
fn test_link_inclusion_exclude() {
    let chunk = "Title. DOI_START10.1/aDOI_END URL_STARThttp://x.org/aURL_END";
    let result = filter(chunk, &config(&[("IncludeDOIURL", "Exclude")]));
    assert_eq!(result.trim(), "Title.");
}

#[test]
fn test_link_inclusion_only_without_identifiers() {
    let policy = config(&[("IncludeDOIURL", "Only if no arXiv, MR# or Zbl#")]);

    let with_arxiv = "T. AR_START1AR_END DOI_START10.1/aDOI_END";
    assert!(!filter(with_arxiv, &policy).contains("DOI_START"));

    let bare = "T. DOI_START10.1/aDOI_END";
    assert_eq!(filter(bare, &policy), bare);
}

#[test]
fn test_link_inclusion_only_without_review_numbers() {
    let policy = config(&[("IncludeDOIURL", "Only if no MR# or Zbl#")]);

    let with_mr = "T. MR_START1MR_END URL_STARThttp://x.org/URL_END";
    assert!(!filter(with_mr, &policy).contains("URL_START"));

    let with_arxiv = "T. AR_START1AR_END URL_STARThttp://x.org/URL_END";
    assert_eq!(filter(with_arxiv, &policy), with_arxiv);
}

#[test]
fn test_link_gate_sees_review_numbers_after_removal() {
    let policy = config(&[
        ("MRZbl", "Neither"),
        ("IncludeDOIURL", "Only if no MR# or Zbl#"),
    ]);
    let chunk = "T. MR_START1MR_END DOI_START10.1/aDOI_END";
    let result = filter(chunk, &policy);
    assert!(!result.contains("MR_START"));
    assert!(result.contains("DOI_START10.1/aDOI_END"));
}

#[test]
fn test_url_mode_drops_doi() {
    let chunk = "T. DOI_START10.1/aDOI_END URL_STARThttp://x.org/URL_END";
    let result = filter(chunk, &config(&[("DOIURL", "URL")]));
    assert!(!result.contains("DOI_START"));
    assert!(result.contains("URL_STARThttp://x.org/URL_END"));
}

#[test]
fn test_doi_mode_drops_url() {
    let chunk = "T. DOI_START10.1/aDOI_END URL_STARThttp://x.org/URL_END";
    let result = filter(chunk, &config(&[("DOIURL", "DOI#")]));
    assert!(result.contains("DOI_START10.1/aDOI_END"));
    assert!(!result.contains("URL_START"));
}

#[test]
fn test_different_mode_only_drops_resolver_urls() {
    let policy = config(&[("DOIURL", "URL if different")]);

    let resolver = "T. DOI_START10.1/aDOI_END URL_STARThttp://dx.doi.org/10.1/aURL_END";
    assert!(!filter(resolver, &policy).contains("URL_START"));

    let publisher = "T. DOI_START10.1/aDOI_END URL_STARThttp://x.org/aURL_END";
    assert_eq!(filter(publisher, &policy), publisher);
}

#[test]
fn test_doi_as_url_synthesis() {
    let chunk = "T. DOI_START10.1000/xyzDOI_END URL_STARTURL_END";
    let result = filter(chunk, &config(&[("DOIURL", "DOI as URL")]));

    assert_eq!(
        span_content(&result, Field::Url),
        Some(format!("{}10.1000/xyz", DOI_RESOLVER).as_str())
    );
    assert!(result.contains("URL_STARThttp://dx.doi.org/10.1000/xyzURL_END"));
    assert!(!result.contains("DOI_START"));
}

#[test]
fn test_doi_as_url_replaces_existing_url() {
    let chunk = "T. DOI_START10.1/aDOI_END URL_STARThttp://x.org/aURL_END";
    let result = filter(chunk, &config(&[("DOIURL", "DOI as URL")]));
    assert!(result.contains("URL_STARThttp://dx.doi.org/10.1/aURL_END"));
    assert!(!result.contains("x.org"));
    assert!(!result.contains("DOI_START"));
}

#[test]
fn test_doi_as_url_without_url_span_drops_doi() {
    let chunk = "T. DOI_START10.1/aDOI_END.";
    let result = filter(chunk, &config(&[("DOIURL", "DOI as URL")]));
    assert_eq!(result, "T. .");
}

#[test]
fn test_doi_as_url_needs_doi_text() {
    let chunk = "T. DOI_STARTDOI_END URL_STARThttp://x.org/URL_END";
    let result = filter(chunk, &config(&[("DOIURL", "DOI as URL")]));
    assert_eq!(result, chunk);
}
