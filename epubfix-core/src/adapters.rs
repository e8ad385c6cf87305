//! Default filesystem-backed port implementations.

use crate::ports::{IssueSource, PackageSource, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use epubfix_doc::is_xml_media_type;
use epubfix_doc::query::{xml_element_text, xml_elements_with_text};
use epubfix_engine::{ProcessingContext, join_href};
use epubfix_issues::{LoadedReport, ValidatorReport};
use epubfix_types::document::Document;
use epubfix_types::issue::ValidationIssue;
use epubfix_types::package::{ManifestItem, MetaEntry, PackageManifest, PackageMetadata, SpineRef};
use fs_err as fs;
use std::collections::BTreeMap;
use tracing::debug;

/// Reads an extracted package directory: `META-INF/container.xml` names the
/// package document, the package document yields manifest, spine, and
/// metadata, and every file under the directory lands in the store.
#[derive(Debug, Clone)]
pub struct FsPackageSource {
    pub package_dir: Utf8PathBuf,
}

impl FsPackageSource {
    pub fn new(package_dir: Utf8PathBuf) -> Self {
        Self { package_dir }
    }
}

impl PackageSource for FsPackageSource {
    fn load_package(&self) -> anyhow::Result<ProcessingContext> {
        let container_path = self.package_dir.join("META-INF/container.xml");
        let container = fs::read_to_string(&container_path)
            .with_context(|| format!("read {container_path}"))?;
        let opf_path = rootfile_path(&container)
            .with_context(|| format!("no rootfile in {container_path}"))?;

        let opf_abs = self.package_dir.join(&opf_path);
        let opf =
            fs::read_to_string(&opf_abs).with_context(|| format!("read {opf_abs}"))?;

        let manifest = parse_manifest(&opf);
        let metadata = parse_metadata(&opf);
        debug!(
            package = %opf_path,
            items = manifest.items.len(),
            spine = manifest.spine.len(),
            "parsed package document"
        );

        let mut ctx = ProcessingContext::new(opf_path.clone(), manifest, metadata);

        let opf_dir = match opf_path.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        let media_types: BTreeMap<String, String> = ctx
            .manifest
            .items
            .iter()
            .map(|item| (join_href(&opf_dir, &item.href), item.media_type.clone()))
            .collect();

        let mut files = Vec::new();
        collect_files(&self.package_dir, &mut files)?;
        files.sort();

        for path in files {
            let key = path
                .strip_prefix(&self.package_dir)
                .unwrap_or(&path)
                .as_str()
                .to_string();
            if is_tool_output(&key) {
                debug!(path = %key, "skipping non-package file");
                continue;
            }
            let media_type = media_types
                .get(&key)
                .cloned()
                .unwrap_or_else(|| sniff_media_type(&key));

            let bytes = fs::read(&path).with_context(|| format!("read {path}"))?;
            let document = if is_text_media_type(&media_type) {
                match String::from_utf8(bytes) {
                    Ok(text) => Document::text(key, media_type, text),
                    // Declared textual but not UTF-8: keep the bytes opaque.
                    Err(err) => Document::binary(key, media_type, err.into_bytes()),
                }
            } else {
                Document::binary(key, media_type, bytes)
            };
            ctx.insert_document(document);
        }

        Ok(ctx)
    }
}

fn rootfile_path(container: &str) -> Option<String> {
    xml_elements_with_text(container, "rootfile")
        .into_iter()
        .find_map(|(view, _)| view.attr("full-path").map(str::to_string))
}

fn parse_manifest(opf: &str) -> PackageManifest {
    let items = xml_elements_with_text(opf, "item")
        .into_iter()
        .filter_map(|(view, _)| {
            Some(ManifestItem {
                id: view.attr("id")?.to_string(),
                href: view.attr("href")?.to_string(),
                media_type: view.attr("media-type").unwrap_or_default().to_string(),
                properties: view.attr("properties").map(str::to_string),
            })
        })
        .collect();

    let spine = xml_elements_with_text(opf, "itemref")
        .into_iter()
        .filter_map(|(view, _)| {
            Some(SpineRef {
                idref: view.attr("idref")?.to_string(),
                linear: view.attr("linear") != Some("no"),
            })
        })
        .collect();

    PackageManifest { items, spine }
}

fn parse_metadata(opf: &str) -> PackageMetadata {
    let meta = xml_elements_with_text(opf, "meta")
        .into_iter()
        .filter_map(|(view, value)| {
            Some(MetaEntry {
                property: view.attr("property")?.to_string(),
                value,
            })
        })
        .collect();

    PackageMetadata {
        title: xml_element_text(opf, "title"),
        language: xml_element_text(opf, "language"),
        identifier: xml_element_text(opf, "identifier"),
        meta,
    }
}

fn collect_files(dir: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> anyhow::Result<()> {
    for entry in fs::read_dir(dir.as_std_path()).with_context(|| format!("read dir {dir}"))? {
        let entry = entry?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| anyhow::anyhow!("non-utf8 path in package: {}", p.display()))?;
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Conventional tool locations inside the package directory. Output of a
/// previous run must not be ingested as package content.
fn is_tool_output(key: &str) -> bool {
    key == "epubfix.toml" || key.starts_with("artifacts/") || key.starts_with("reports/")
}

fn is_text_media_type(media_type: &str) -> bool {
    let mt = media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase();
    mt.starts_with("text/")
        || is_xml_media_type(&mt)
        || mt == "application/javascript"
        || mt == "application/json"
}

/// Media type for files the manifest does not register.
fn sniff_media_type(path: &str) -> String {
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xhtml" => "application/xhtml+xml",
        "html" | "htm" => "text/html",
        "opf" => "application/oebps-package+xml",
        "ncx" => "application/x-dtbncx+xml",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "css" => "text/css",
        "js" => "application/javascript",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ if path.ends_with("mimetype") => "text/plain",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Loads validator reports via `epubfix_issues::load_reports`.
#[derive(Debug, Clone)]
pub struct FsIssueSource {
    pub reports_dir: Utf8PathBuf,
}

impl FsIssueSource {
    pub fn new(reports_dir: Utf8PathBuf) -> Self {
        Self { reports_dir }
    }
}

impl IssueSource for FsIssueSource {
    fn load_issues(&self) -> anyhow::Result<Vec<LoadedReport>> {
        epubfix_issues::load_reports(&self.reports_dir)
            .with_context(|| format!("load reports from {}", self.reports_dir))
    }
}

/// In-memory issue source for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemoryIssueSource {
    issues: Vec<ValidationIssue>,
}

impl InMemoryIssueSource {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

impl IssueSource for InMemoryIssueSource {
    fn load_issues(&self) -> anyhow::Result<Vec<LoadedReport>> {
        Ok(vec![LoadedReport {
            path: Utf8PathBuf::from("<memory>"),
            source_id: "memory".to_string(),
            report: Ok(ValidatorReport {
                validator: None,
                issues: self.issues.clone(),
            }),
        }])
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .with_context(|| format!("create parent dir for {path}"))?;
        }
        fs::write(path.as_std_path(), contents).with_context(|| format!("write {path}"))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path.as_std_path()).with_context(|| format!("create_dir_all {path}"))
    }
}
