//! Clap-free settings for the fix and check pipelines.

use camino::Utf8PathBuf;

/// Settings for the fix pipeline.
#[derive(Debug, Clone)]
pub struct FixSettings {
    /// Root of the extracted package (the directory holding `META-INF/`).
    pub package_dir: Utf8PathBuf,
    pub reports_dir: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    // Policy
    /// Strategy-name patterns; empty means every strategy is eligible.
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub max_fixes: Option<u64>,

    /// Build artifacts only; modified documents are not written back.
    pub dry_run: bool,
}

impl Default for FixSettings {
    fn default() -> Self {
        Self {
            package_dir: Utf8PathBuf::from("."),
            reports_dir: Utf8PathBuf::from("reports"),
            out_dir: Utf8PathBuf::from("artifacts/epubfix"),
            allow: Vec::new(),
            deny: Vec::new(),
            max_fixes: None,
            dry_run: false,
        }
    }
}

/// Settings for the check pipeline.
#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub package_dir: Utf8PathBuf,
    pub reports_dir: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            package_dir: Utf8PathBuf::from("."),
            reports_dir: Utf8PathBuf::from("reports"),
            out_dir: Utf8PathBuf::from("artifacts/epubfix"),
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }
}
