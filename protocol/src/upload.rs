use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// JSON body returned by the upload endpoint on success.
///
/// The endpoint's schema is not fixed, so the raw value is kept and a few commonly reported
/// fields are exposed through accessors.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct UploadMetadata(pub Value);

impl UploadMetadata {
    /// File name as reported by the server (`filename`, `file_name` or `name`).
    pub fn file_name(&self) -> Option<&str> {
        ["filename", "file_name", "name"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }

    /// Location of the stored file, if the server reported one (`url` or `path`).
    pub fn url(&self) -> Option<&str> {
        ["url", "path"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }
}
