use serde::{Deserialize, Serialize};

/// A package member held in the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Store key: package-internal path with '/' separators.
    pub path: String,

    pub content: DocumentContent,

    pub media_type: String,

    /// True iff the content was rewritten at least once during a pass.
    #[serde(default)]
    pub modified: bool,
}

impl Document {
    pub fn text(path: impl Into<String>, media_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: DocumentContent::Text(content.into()),
            media_type: media_type.into(),
            modified: false,
        }
    }

    pub fn binary(path: impl Into<String>, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content: DocumentContent::Binary(content),
            media_type: media_type.into(),
            modified: false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            DocumentContent::Text(s) => Some(s),
            DocumentContent::Binary(_) => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.content, DocumentContent::Binary(_))
    }
}

/// Text payloads are candidates for repair; binary payloads are opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentContent {
    Text(String),
    Binary(Vec<u8>),
}
