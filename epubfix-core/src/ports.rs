//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use epubfix_engine::ProcessingContext;
use epubfix_issues::LoadedReport;

/// Source of a parsed package: document store plus manifest and metadata.
pub trait PackageSource {
    fn load_package(&self) -> anyhow::Result<ProcessingContext>;
}

/// Source of validator reports.
pub trait IssueSource {
    fn load_issues(&self) -> anyhow::Result<Vec<LoadedReport>>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
