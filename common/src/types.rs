use serde::{Deserialize, Serialize};

/// Per-file integrity result.
///
/// Only populated fields are serialized. A failed stage leaves its own fields
/// empty and describes the failure in `error_message`; earlier stages keep
/// their results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_hashed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_information: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FileRecord {
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            filename: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn is_hashed(&self) -> bool {
        self.response_hashed.is_some()
    }

    pub fn has_publisher(&self) -> bool {
        self.publisher_information.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(rename = "Filename")]
    pub filename: String,
}

/// Body of a HashNamedFiles request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashFilesRequest {
    pub files: Vec<FileEntry>,
    pub signature: String,
    pub challenge: String,
}

/// Body of a ListAndHashTree request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTreeRequest {
    pub search_pattern: String,
    pub signature: String,
    pub challenge: String,
}
