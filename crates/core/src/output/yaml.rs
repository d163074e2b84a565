use super::FormatError;
use crate::models::{FoldMap, SourceFile};

/// Convert FoldMap to YAML
pub fn to_yaml(fold_map: &FoldMap) -> Result<String, FormatError> {
    serde_yaml::to_string(fold_map).map_err(FormatError::from)
}

pub fn file_to_yaml(file: &SourceFile) -> Result<String, FormatError> {
    serde_yaml::to_string(file).map_err(FormatError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::identify_foldable_regions;
    use std::path::PathBuf;

    #[test]
    fn test_file_to_yaml() {
        let file = SourceFile {
            path: PathBuf::from("lib.rs"),
            absolute_path: PathBuf::from("/test/lib.rs"),
            regions: identify_foldable_regions("use a;\nfn f() {\n}\n"),
            line_count: 4,
            parsed: true,
            error: None,
        };

        let yaml = file_to_yaml(&file).unwrap();
        assert!(yaml.contains("type: consolidated_use_block"));
        assert!(yaml.contains("type: fn"));
        assert!(yaml.contains("original_lines_details:"));
    }
}
