use serde::{Deserialize, Serialize};

/// Package-level listing of every content file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub items: Vec<ManifestItem>,

    #[serde(default)]
    pub spine: Vec<SpineRef>,
}

impl PackageManifest {
    /// Manifest item whose id matches, if any.
    pub fn item_by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub id: String,

    /// Href relative to the package document.
    pub href: String,

    pub media_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

/// One entry in the ordered reading sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpineRef {
    pub idref: String,

    /// False marks supplementary content outside the main reading order.
    #[serde(default = "default_linear")]
    pub linear: bool,
}

fn default_linear() -> bool {
    true
}

/// Dublin Core package metadata plus refining meta entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<MetaEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub property: String,
    pub value: String,
}
