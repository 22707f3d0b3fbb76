//! Render bibliographic entries into reference-list text for LaTeX or HTML reports.
//!
//! A [`StyleConfig`] is compiled into a BibTeX style, the entries are run through the
//! external `pdflatex`/`bibtex` pair, and the raw output is filtered per entry (MR, Zbl,
//! arXiv, DOI and URL policies) before emphasis markers become LaTeX or HTML.

pub mod bibliography;
pub mod bibtex;
pub mod config;
pub mod error;

pub use bibliography::{BibEntry, BibEntryBuilder, Bibliography};
pub use bibtex::{BibTex, CompiledTemplate, TemplateCompiler, Toolchain};
pub use config::StyleConfig;
pub use error::{CiteReportError, Result};
