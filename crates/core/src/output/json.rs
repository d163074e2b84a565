use super::FormatError;
use crate::models::{FoldMap, SourceFile};

/// Convert FoldMap to pretty-printed JSON
pub fn to_json(fold_map: &FoldMap) -> Result<String, FormatError> {
    serde_json::to_string_pretty(fold_map).map_err(FormatError::from)
}

/// Convert a single file's regions to pretty-printed JSON
pub fn file_to_json(file: &SourceFile) -> Result<String, FormatError> {
    serde_json::to_string_pretty(file).map_err(FormatError::from)
}
