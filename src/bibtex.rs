pub mod filter;
pub mod html;
pub mod normalize;
pub mod session;
pub mod template;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::bibliography::Bibliography;
use crate::config::StyleConfig;
use crate::error::Result;

pub use filter::filter;
pub use html::finalize;
pub use normalize::normalize;
pub use session::{render, RenderSession, Toolchain};
pub use template::{CompiledTemplate, TemplateCompiler};

// Identifier spans written by the style template, compiled once
static MR_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)MR_START(.*?)MR_END").expect("Invalid MR span regex pattern")
});
static ZBL_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)ZBL_START(.*?)ZBL_END").expect("Invalid Zbl span regex pattern")
});
static ARXIV_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)AR_START(.*?)AR_END").expect("Invalid arXiv span regex pattern")
});
static DOI_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)DOI_START(.*?)DOI_END").expect("Invalid DOI span regex pattern")
});
static URL_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)URL_START(.*?)URL_END").expect("Invalid URL span regex pattern")
});

/// Optional identifier fields the style template brackets with `<TAG>_START`/`<TAG>_END`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mr,
    Zbl,
    Arxiv,
    Doi,
    Url,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Mr, Field::Arxiv, Field::Zbl, Field::Doi, Field::Url];

    pub fn start_marker(self) -> &'static str {
        match self {
            Field::Mr => "MR_START",
            Field::Zbl => "ZBL_START",
            Field::Arxiv => "AR_START",
            Field::Doi => "DOI_START",
            Field::Url => "URL_START",
        }
    }

    pub fn end_marker(self) -> &'static str {
        match self {
            Field::Mr => "MR_END",
            Field::Zbl => "ZBL_END",
            Field::Arxiv => "AR_END",
            Field::Doi => "DOI_END",
            Field::Url => "URL_END",
        }
    }

    /// LaTeX command the start marker turns into. MR numbers keep their `MR` prefix.
    pub fn latex_opener(self) -> &'static str {
        match self {
            Field::Mr => r"\mref{MR",
            Field::Zbl => r"\zbl{",
            Field::Arxiv => r"\arxiv{",
            Field::Doi => r"\doi{",
            Field::Url => r"\url{",
        }
    }

    /// Non-greedy, case-insensitive, multi-line span; group 1 is the inner text
    pub fn span_regex(self) -> &'static Regex {
        match self {
            Field::Mr => &*MR_SPAN_REGEX,
            Field::Zbl => &*ZBL_SPAN_REGEX,
            Field::Arxiv => &*ARXIV_SPAN_REGEX,
            Field::Doi => &*DOI_SPAN_REGEX,
            Field::Url => &*URL_SPAN_REGEX,
        }
    }
}

/// Compiles a style once and renders entry batches with it.
///
/// The pipeline is: compiled template -> external compiler -> normalize -> per-entry
/// filter -> HTML/LaTeX finalization.
pub struct BibTex {
    config: StyleConfig,
    template: CompiledTemplate,
    toolchain: Toolchain,
}

impl BibTex {
    /// Compile `config` against the bundled template, using the toolchain from the environment
    pub fn new(config: StyleConfig) -> Self {
        Self::with_toolchain(config, Toolchain::from_env())
    }

    pub fn with_toolchain(config: StyleConfig, toolchain: Toolchain) -> Self {
        let template = TemplateCompiler::default().compile(&config);
        Self {
            config,
            template,
            toolchain,
        }
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    pub fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Render all entries as one block of reference text.
    ///
    /// Compiler failures come back as an empty string; only an unusable scratch
    /// environment is an error.
    pub fn run(&self, bibliography: &Bibliography) -> Result<String> {
        if bibliography.is_empty() {
            info!("No entries to render");
            return Ok(String::new());
        }

        let raw = render(&bibliography.to_bibtex(), &self.template, &self.toolchain)?;
        if raw.is_empty() {
            return Ok(String::new());
        }
        Ok(self.postprocess(&raw))
    }

    /// Render each entry on its own, one string per entry, in bibliography order
    pub fn run_each(&self, bibliography: &Bibliography) -> Result<Vec<String>> {
        let mut rendered = Vec::with_capacity(bibliography.len());
        for entry in bibliography.iter() {
            let single: Bibliography = std::iter::once(entry.clone()).collect();
            rendered.push(self.run(&single)?);
        }
        Ok(rendered)
    }

    /// Everything after the compiler: normalize, filter each entry, finalize
    pub fn postprocess(&self, raw: &str) -> String {
        let chunks = normalize(raw, self.template.reverse_output());
        debug!("Post-processing {} rendered entries", chunks.len());

        let filtered: Vec<String> = chunks
            .iter()
            .map(|chunk| filter(chunk, &self.config))
            .collect();

        finalize(&filtered, self.config.is_html())
    }
}
