//! Report ingestion utilities.
//!
//! epubfix consumes issue reports produced by external validators. It does
//! not enforce strict schema validation here; it is tolerant so it can still
//! plan repairs when a report contains extra fields or misses optional ones.

mod load;

pub use load::{LoadedReport, ReportLoadError, ValidatorReport, flatten_issues, load_reports};
