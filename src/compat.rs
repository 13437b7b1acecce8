//! Cross-environment compatibility scan.
//!
//! Flags constructs that render differently (or not at all) between local
//! Streamlit and the hosted container runtime. Issues fail the scan, warnings
//! do not.

use crate::assess::probe::{Probe, SourceText};
use crate::assess::rules::{ALTAIR_IMPORT, COLUMN_CONFIG_USAGE};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub type CompatResult<T> = Result<T, CompatError>;

#[derive(Debug, Error)]
pub enum CompatError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Issue,
    Warning,
}

struct CompatRule {
    probe: Probe,
    level: Level,
    message: &'static str,
}

const UNIMPORTED_ALTAIR: Probe = Probe::AllOf(&[Probe::Contains("alt.Chart"), Probe::Not(&ALTAIR_IMPORT)]);

const RULES: &[CompatRule] = &[
    CompatRule {
        probe: COLUMN_CONFIG_USAGE,
        level: Level::Issue,
        message: "st.column_config not supported in SiS Container",
    },
    CompatRule {
        probe: Probe::CodeMatches(r"st\.bar_chart\("),
        level: Level::Warning,
        message: "st.bar_chart colors vary, use Altair",
    },
    CompatRule {
        probe: Probe::CodeMatches(r"st\.line_chart\("),
        level: Level::Warning,
        message: "st.line_chart colors vary, use Altair",
    },
    CompatRule {
        probe: UNIMPORTED_ALTAIR,
        level: Level::Issue,
        message: "Using Altair without import",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatFinding {
    pub file: PathBuf,
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompatReport {
    pub issues: Vec<CompatFinding>,
    pub warnings: Vec<CompatFinding>,
    pub files_scanned: usize,
}

impl CompatReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    fn absorb(&mut self, findings: Vec<CompatFinding>) {
        self.files_scanned += 1;
        for finding in findings {
            match finding.level {
                Level::Issue => self.issues.push(finding),
                Level::Warning => self.warnings.push(finding),
            }
        }
    }
}

/// Findings for one file's source
pub fn check_source(file: &Path, source: &str) -> Vec<CompatFinding> {
    let text = SourceText::new(source);
    RULES
        .iter()
        .filter(|rule| rule.probe.holds(&text))
        .map(|rule| CompatFinding {
            file: file.to_path_buf(),
            level: rule.level,
            message: rule.message.to_string(),
        })
        .collect()
}

fn check_file(path: &Path) -> CompatResult<Vec<CompatFinding>> {
    let source = fs::read_to_string(path).map_err(|source| CompatError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(check_source(path, &source))
}

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

/// Scan a single file, or every `.py` file under a directory
pub fn scan(target: &Path) -> CompatResult<CompatReport> {
    let mut report = CompatReport::default();

    if target.is_file() {
        report.absorb(check_file(target)?);
        return Ok(report);
    }
    if !target.is_dir() {
        return Err(CompatError::NotFound(target.to_path_buf()));
    }

    let walker = WalkDir::new(target)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != "__pycache__");
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_python(entry.path()) {
            log::debug!("Scanning {}", entry.path().display());
            report.absorb(check_file(entry.path())?);
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_source() {
        let src = "import altair as alt\nchart = alt.Chart(df).mark_bar()\n";
        assert!(check_source(Path::new("app.py"), src).is_empty());
    }

    #[test]
    fn test_issues_and_warnings() {
        let src = "st.bar_chart(df)\nst.line_chart(df)\nchart = alt.Chart(df)\nst.dataframe(df, column_config={})\n";
        let findings = check_source(Path::new("app.py"), src);
        let messages: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "st.column_config not supported in SiS Container",
                "st.bar_chart colors vary, use Altair",
                "st.line_chart colors vary, use Altair",
                "Using Altair without import",
            ]
        );
    }

    #[test]
    fn test_prose_mention_is_not_an_issue() {
        let src = "# st.column_config is unsupported, so we avoid it\nst.write('no st.bar_chart( here')\n";
        assert!(check_source(Path::new("app.py"), src).is_empty());
    }

    #[test]
    fn test_scan_directory_skips_pycache() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "st.bar_chart(df)\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "st.column_config.TextColumn()\n").unwrap();
        fs::create_dir(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("__pycache__/app.py"), "st.column_config.TextColumn()\n").unwrap();
        fs::create_dir(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("pages/extra.py"), "x = alt.Chart(df)\n").unwrap();

        let report = scan(dir.path()).unwrap();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].file.ends_with("pages/extra.py"));
        assert!(!report.passed());
    }

    #[test]
    fn test_scan_missing_path() {
        let err = scan(Path::new("/no/such/file.py")).unwrap_err();
        assert!(matches!(err, CompatError::NotFound(_)));
    }
}
