use std::collections::BTreeMap;

use crate::FileType;

/// Longest extension accepted into a stored blob name
const MAX_EXTENSION_LEN: usize = 16;

/// Per-type extension lists used to classify uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    extensions: BTreeMap<FileType, Vec<String>>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
            .with_extensions(FileType::Image, ["jpg", "jpeg", "png", "gif", "webp"])
            .with_extensions(FileType::Video, ["mp4", "avi", "mov", "mkv"])
            .with_extensions(FileType::Audio, ["mp3", "wav", "ogg", "m4a"])
            .with_extensions(
                FileType::Document,
                ["pdf", "doc", "docx", "txt", "zip", "rar"],
            )
    }
}

impl TypeTable {
    /// Empty table: everything classifies as `document`
    pub fn new() -> Self {
        Self {
            extensions: BTreeMap::new(),
        }
    }

    /// Replace the extension list of one type
    pub fn with_extensions<I, S>(mut self, file_type: FileType, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self.extensions.insert(file_type, list);
        self
    }

    /// Extensions configured for a type
    pub fn extensions(&self, file_type: FileType) -> &[String] {
        self.extensions
            .get(&file_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Map an extension to its type. Case-insensitive; unknown extensions are
    /// `document`, never an error.
    pub fn classify(&self, extension: &str) -> FileType {
        let extension = extension.to_ascii_lowercase();
        FileType::ALL
            .into_iter()
            .find(|t| self.extensions(*t).iter().any(|e| *e == extension))
            .unwrap_or(FileType::Document)
    }
}

/// Classify against the default table
pub fn classify(extension: &str) -> FileType {
    TypeTable::default().classify(extension)
}

/// Lowercased text after the last `.` of the final path component, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() && !base[1..].contains('.') {
        // ".bashrc" has no extension
        return None;
    }
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extension as it may appear in a stored blob name. Anything that is not a short
/// ASCII alphanumeric run is dropped so client input can never shape a path.
pub fn safe_extension(name: &str) -> Option<String> {
    extension_of(name).filter(|ext| {
        ext.len() <= MAX_EXTENSION_LEN && ext.chars().all(|c| c.is_ascii_alphanumeric())
    })
}
