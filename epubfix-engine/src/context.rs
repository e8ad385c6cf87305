use anyhow::Context as _;
use epubfix_doc::{MarkupDoc, MarkupError};
use epubfix_types::document::{Document, DocumentContent};
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;
use epubfix_types::package::{PackageManifest, PackageMetadata};
use std::collections::BTreeMap;

/// The single shared mutable unit handed to every strategy: document store,
/// package manifest and metadata, the full issue list, and the applied
/// fixes so far.
///
/// Construction and teardown belong to the caller; the engine only queries
/// and mutates.
#[derive(Debug, Clone)]
pub struct ProcessingContext {
    /// Store: package-internal path -> document.
    pub contents: BTreeMap<String, Document>,

    pub manifest: PackageManifest,
    pub metadata: PackageMetadata,

    /// Store key of the package document.
    pub package_path: String,

    pub issues: Vec<ValidationIssue>,

    /// Successfully applied fixes, in application order.
    pub fixes: Vec<FixResult>,
}

impl ProcessingContext {
    pub fn new(
        package_path: impl Into<String>,
        manifest: PackageManifest,
        metadata: PackageMetadata,
    ) -> Self {
        Self {
            contents: BTreeMap::new(),
            manifest,
            metadata,
            package_path: package_path.into(),
            issues: Vec::new(),
            fixes: Vec::new(),
        }
    }

    pub fn insert_document(&mut self, document: Document) {
        self.contents.insert(document.path.clone(), document);
    }

    /// Resolve a validator-reported path to a store key.
    ///
    /// Reports disagree with store keys in annoying ways (case, absolute vs
    /// relative, directory prefixes), so resolution tries, in order: exact
    /// match, suffix match on the filename, case-insensitive exact match,
    /// case-insensitive suffix match.
    pub fn resolve_path(&self, reported: &str) -> Option<String> {
        let wanted = reported.trim_start_matches("./").trim_start_matches('/');
        if wanted.is_empty() {
            return None;
        }

        if self.contents.contains_key(wanted) {
            return Some(wanted.to_string());
        }

        let filename = wanted.rsplit('/').next().unwrap_or(wanted);
        let suffix = format!("/{filename}");
        for key in self.contents.keys() {
            if key == filename || key.ends_with(&suffix) {
                return Some(key.clone());
            }
        }

        let wanted_lower = wanted.to_ascii_lowercase();
        for key in self.contents.keys() {
            if key.to_ascii_lowercase() == wanted_lower {
                return Some(key.clone());
            }
        }

        let suffix_lower = suffix.to_ascii_lowercase();
        let filename_lower = filename.to_ascii_lowercase();
        for key in self.contents.keys() {
            let key_lower = key.to_ascii_lowercase();
            if key_lower == filename_lower || key_lower.ends_with(&suffix_lower) {
                return Some(key.clone());
            }
        }

        None
    }

    pub fn resolve_required(&self, reported: &str) -> anyhow::Result<String> {
        self.resolve_path(reported)
            .with_context(|| format!("document not found: {reported}"))
    }

    /// Store key the issue points at, resolved.
    pub fn issue_target(&self, issue: &ValidationIssue) -> anyhow::Result<String> {
        let file = issue
            .file()
            .with_context(|| format!("issue {} has no file location", issue.code))?;
        self.resolve_required(file)
    }

    pub fn document(&self, key: &str) -> Option<&Document> {
        self.contents.get(key)
    }

    /// Parse a stored text document into its editable form. Binary payloads
    /// fail fast.
    pub fn load_markup(&self, key: &str) -> anyhow::Result<MarkupDoc> {
        let document = self
            .contents
            .get(key)
            .with_context(|| format!("document not in store: {key}"))?;
        let text = document.as_text().ok_or_else(|| MarkupError::BinaryDocument {
            path: key.to_string(),
        })?;
        Ok(MarkupDoc::parse(text, &document.media_type)?)
    }

    /// Write an edited form back into the store. Always flags the document
    /// modified; callers only save after an actual change.
    pub fn save_markup(&mut self, key: &str, markup: MarkupDoc) -> anyhow::Result<()> {
        let document = self
            .contents
            .get_mut(key)
            .with_context(|| format!("document not in store: {key}"))?;
        if document.is_binary() {
            return Err(MarkupError::BinaryDocument {
                path: key.to_string(),
            }
            .into());
        }
        document.content = DocumentContent::Text(markup.into_source());
        document.modified = true;
        Ok(())
    }

    /// Store keys of every XHTML/HTML content document, manifest order.
    ///
    /// Manifests are sometimes incomplete relative to what a validator
    /// references, so when the manifest yields nothing this falls back to
    /// sniffing paths of stored text documents.
    pub fn content_documents(&self) -> Vec<String> {
        let opf_dir = match self.package_path.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };

        let mut out = Vec::new();
        for item in &self.manifest.items {
            if !is_content_media_type(&item.media_type) {
                continue;
            }
            let href = item.href.split('#').next().unwrap_or(&item.href);
            let key = join_href(opf_dir, href);
            if let Some(doc) = self.contents.get(&key)
                && doc.as_text().is_some()
            {
                out.push(key);
            }
        }

        if !out.is_empty() {
            return out;
        }

        self.contents
            .iter()
            .filter(|(path, doc)| doc.as_text().is_some() && looks_like_content_path(path))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

fn is_content_media_type(media_type: &str) -> bool {
    media_type.eq_ignore_ascii_case("application/xhtml+xml")
        || media_type.eq_ignore_ascii_case("text/html")
}

fn looks_like_content_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".xhtml") || lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Join a manifest href onto the package document's directory, collapsing
/// `.` and `..` segments.
pub fn join_href(base_dir: &str, href: &str) -> String {
    let mut parts: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
