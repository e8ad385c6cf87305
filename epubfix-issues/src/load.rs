use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use epubfix_types::issue::ValidationIssue;
use fs_err as fs;
use glob::glob;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Envelope of one validator report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorInfo>,

    #[serde(default)]
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub path: Utf8PathBuf,
    /// File stem, best effort; identifies the validator in diagnostics.
    pub source_id: String,
    pub report: Result<ValidatorReport, ReportLoadError>,
}

#[derive(Debug, Error, Clone)]
pub enum ReportLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

/// Load every `*.json` report under `reports_dir`.
///
/// Per-file failures are carried inside the returned records so one corrupt
/// report never hides the others.
pub fn load_reports(reports_dir: &Utf8Path) -> anyhow::Result<Vec<LoadedReport>> {
    let pattern = reports_dir.join("*.json");
    let pattern_str = pattern.as_str();

    debug!(pattern = %pattern_str, "scanning for validator reports");

    let mut out = Vec::new();
    for entry in glob(pattern_str).context("glob reports/*.json")? {
        let path = entry
            .map_err(|e| anyhow::anyhow!("glob error: {e}"))?
            .to_string_lossy()
            .to_string();

        let utf8_path = Utf8PathBuf::from(path);
        let source_id = utf8_path.file_stem().unwrap_or("unknown").to_string();

        let report = match fs::read_to_string(&utf8_path) {
            Ok(s) => serde_json::from_str::<ValidatorReport>(&s).map_err(|e| {
                ReportLoadError::Json {
                    message: e.to_string(),
                }
            }),
            Err(e) => Err(ReportLoadError::Io {
                message: e.to_string(),
            }),
        };

        out.push(LoadedReport {
            path: utf8_path,
            source_id,
            report,
        });
    }

    // Deterministic order matters.
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

/// Flatten loaded reports into a single issue list, preserving report order
/// and per-report issue order. Failed reports contribute nothing.
pub fn flatten_issues(loaded: &[LoadedReport]) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    for record in loaded {
        if let Ok(report) = &record.report {
            out.extend(report.issues.iter().cloned());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_report(dir: &Utf8Path, name: &str, body: &str) {
        fs::write(dir.join(name).as_std_path(), body).expect("write report");
    }

    fn tempdir_utf8() -> (tempfile::TempDir, Utf8PathBuf) {
        let td = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf8 tempdir");
        (td, path)
    }

    #[test]
    fn loads_reports_in_path_order() {
        let (_td, dir) = tempdir_utf8();
        write_report(
            &dir,
            "b-axe.json",
            r#"{"issues":[{"code":"image-alt","fixable":true}]}"#,
        );
        write_report(
            &dir,
            "a-epubcheck.json",
            r#"{"validator":{"name":"epubcheck"},"issues":[{"code":"RSC-005"}]}"#,
        );

        let loaded = load_reports(&dir).expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].source_id, "a-epubcheck");
        assert_eq!(loaded[1].source_id, "b-axe");

        let issues = flatten_issues(&loaded);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, "RSC-005");
        assert_eq!(issues[1].code, "image-alt");
    }

    #[test]
    fn corrupt_report_is_carried_not_fatal() {
        let (_td, dir) = tempdir_utf8();
        write_report(&dir, "bad.json", "not json {");
        write_report(&dir, "good.json", r#"{"issues":[{"code":"link-name"}]}"#);

        let loaded = load_reports(&dir).expect("load");
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].report.is_err());
        assert!(loaded[1].report.is_ok());

        let issues = flatten_issues(&loaded);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn empty_dir_yields_no_reports() {
        let (_td, dir) = tempdir_utf8();
        let loaded = load_reports(&dir).expect("load");
        assert!(loaded.is_empty());
    }
}
