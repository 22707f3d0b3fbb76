#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Raw compiler output for two entries, as the bundled style writes it
pub const FAKE_BBL: &str = r"
\bibitem{old}
A.~Author, Old paper, J. Math. 1 (1990), 1--2. MR_START111MR_END ZBL_START222ZBL_END
DOI_START10.1/oldDOI_END

\bibitem{new}
B.~Author, \textbf{start_html_textbf_startNew paperend_html_textbf_end}, J. Math. 2
(2020). AR_START2001.00001AR_END
";

/// Write an executable shell script standing in for the bibliography compiler.
/// It checks its inputs exist and writes `bbl` as `<job>.bbl`.
#[cfg(unix)]
pub fn fake_bibtex(dir: &Path, bbl: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-bibtex.sh");
    let body = format!(
        "#!/bin/sh\n\
         test -f \"$1.tex\" || exit 3\n\
         test -f \"$1.bst\" || exit 3\n\
         test -f \"$1.bib\" || exit 3\n\
         cat > \"$1.bbl\" <<'CITEREPORT_EOF'\n{}\nCITEREPORT_EOF\n",
        bbl
    );
    fs::write(&script, body).unwrap();
    let mut perms = fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).unwrap();
    script
}

/// Number of entries left in a directory
pub fn entries_in(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
