/// Metadata for a file the client already uploaded to object storage and
/// referenced in a chat turn. The bytes themselves never pass through here.
#[derive(Debug, Clone)]
pub struct StagedFileMetadata {
    pub name: String,
    pub path: String,
    pub url: Option<String>,
    pub content_type: String,
    pub size: i64,
}
