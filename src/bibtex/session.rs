use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

use super::template::CompiledTemplate;
use crate::error::{CiteReportError, Result};

/// Base name shared by every file of one compiler run
pub const JOB_NAME: &str = "citereport";

pub const LATEX_ENV: &str = "CITEREPORT_LATEX";
pub const BIBTEX_ENV: &str = "CITEREPORT_BIBTEX";

/// Extensions of the files a run leaves behind
pub const ARTIFACTS: &[&str] = &["tex", "bst", "bib", "aux", "log", "blg", "bbl"];

/// External programs driving one render, and where their scratch space lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub latex: String,
    pub bibtex: String,
    /// Parent for session directories; the system temp dir when unset
    pub scratch_root: Option<PathBuf>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            latex: "pdflatex".to_string(),
            bibtex: "bibtex".to_string(),
            scratch_root: None,
        }
    }
}

impl Toolchain {
    /// Defaults, overridden by `CITEREPORT_LATEX` / `CITEREPORT_BIBTEX`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            latex: std::env::var(LATEX_ENV).unwrap_or(defaults.latex),
            bibtex: std::env::var(BIBTEX_ENV).unwrap_or(defaults.bibtex),
            scratch_root: None,
        }
    }

    pub fn with_programs(latex: impl Into<String>, bibtex: impl Into<String>) -> Self {
        Self {
            latex: latex.into(),
            bibtex: bibtex.into(),
            scratch_root: None,
        }
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

/// LaTeX driver pulling every entry through the style
fn driver_document() -> String {
    format!(
        "\\documentclass{{article}}\n\
         \\begin{{document}}\n\
         \\nocite{{*}}\n\
         \\bibliographystyle{{{0}}}\n\
         \\bibliography{{{0}}}\n\
         \\end{{document}}\n",
        JOB_NAME
    )
}

/// Scratch directory owned by a single render call.
///
/// Every file of the run lives inside it, and it is removed when the session is closed or
/// dropped, so no path out of [`render`] leaves artifacts behind.
pub struct RenderSession {
    dir: TempDir,
}

impl RenderSession {
    pub fn create(toolchain: &Toolchain) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("citereport-");
        let dir = match &toolchain.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(CiteReportError::Environment)?;

        debug!("Created render session in {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `<job>.<extension>` inside the session
    pub fn artifact(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{}", JOB_NAME, extension))
    }

    /// Write driver document, style and entries where the compiler expects them
    pub fn write_inputs(&self, template: &CompiledTemplate, bib: &str) -> Result<()> {
        let inputs = [
            ("tex", driver_document()),
            ("bst", template.text().to_string()),
            ("bib", bib.to_string()),
        ];
        for (extension, content) in inputs {
            fs::write(self.artifact(extension), content).map_err(CiteReportError::Environment)?;
        }
        Ok(())
    }

    /// Typesetting pass, then bibliography pass, then read the rendered entries
    pub fn compile(&self, toolchain: &Toolchain) -> Result<String> {
        self.run_quietly(&toolchain.latex, &["-interaction=batchmode", JOB_NAME])?;
        self.run_quietly(&toolchain.bibtex, &[JOB_NAME])?;

        let bbl = self.artifact("bbl");
        if !bbl.exists() {
            return Err(CiteReportError::CompileFailure(format!(
                "{} produced no {:?}",
                toolchain.bibtex,
                bbl.file_name().unwrap_or_default()
            )));
        }
        fs::read_to_string(&bbl).map_err(|e| {
            CiteReportError::CompileFailure(format!("could not read {:?}: {}", bbl, e))
        })
    }

    fn run_quietly(&self, program: &str, args: &[&str]) -> Result<()> {
        let status = Command::new(program)
            .args(args)
            .current_dir(self.dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                CiteReportError::CompileFailure(format!("could not run {}: {}", program, e))
            })?;

        // bibtex exits non-zero on mere warnings; the .bbl decides success
        if !status.success() {
            debug!("{} exited with {}", program, status);
        }
        Ok(())
    }

    /// Remove the session directory, reporting (not failing on) removal problems
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove render session {:?}: {}", path, e);
        }
    }
}

/// Run the external compiler over `bib` with `template` and return its raw output.
///
/// A failing compiler yields `""` after cleanup. Only an unusable scratch
/// environment is returned as an error.
pub fn render(bib: &str, template: &CompiledTemplate, toolchain: &Toolchain) -> Result<String> {
    let session = RenderSession::create(toolchain)?;

    let outcome = session
        .write_inputs(template, bib)
        .and_then(|_| session.compile(toolchain));
    session.close();

    match outcome {
        Ok(raw) => {
            if raw.trim().is_empty() {
                info!("Bibliography compiler produced no entries");
            }
            Ok(raw)
        }
        Err(CiteReportError::CompileFailure(reason)) => {
            warn!("Bibliography compilation failed: {}", reason);
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}
