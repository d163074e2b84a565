mod json;
mod yaml;

pub use json::{file_to_json, to_json};
pub use yaml::{file_to_yaml, to_yaml};

use crate::models::{FoldMap, FoldRegion, SourceFile};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Summary,
    Ansi,
}

/// Format a FoldMap according to the specified format
pub fn format_output(fold_map: &FoldMap, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => to_json(fold_map),
        OutputFormat::Yaml => to_yaml(fold_map),
        OutputFormat::Summary => Ok(format_summary(fold_map)),
        OutputFormat::Ansi => Ok(format_summary_ansi(fold_map)),
    }
}

/// Format the region list of one file
pub fn format_file(file: &SourceFile, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => file_to_json(file),
        OutputFormat::Yaml => file_to_yaml(file),
        OutputFormat::Summary | OutputFormat::Ansi => Ok(format_file_listing(file)),
    }
}

fn region_label(region: &FoldRegion) -> String {
    if region.is_import_block() {
        let spans: Vec<String> = region
            .original_lines_details
            .iter()
            .map(|s| {
                if s.start_line == s.end_line {
                    s.start_line.to_string()
                } else {
                    format!("{}-{}", s.start_line, s.end_line)
                }
            })
            .collect();
        format!(
            "use block ({} statements, lines {})",
            region.count.unwrap_or(0),
            spans.join(", ")
        )
    } else {
        format!(
            "{} (lines {}-{}, brace {}, level {})",
            region.kind.as_str(),
            region.start_line,
            region.end_line,
            region.actual_brace_line,
            region.level
        )
    }
}

fn format_file_listing(file: &SourceFile) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "File: {}\nLine Count: {}\nRegions: {}\n\n",
        file.path.display(),
        file.line_count,
        file.regions.len()
    ));

    if let Some(ref error) = file.error {
        out.push_str(&format!("Error: {}\n", error));
    }

    for (i, region) in file.regions.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}{}\n",
            i + 1,
            region_label(region),
            if region.is_folded { " [folded]" } else { "" }
        ));
    }

    out
}

fn foldable_percent(fold_map: &FoldMap) -> f64 {
    if fold_map.stats.total_lines > 0 {
        (fold_map.stats.foldable_lines as f64 / fold_map.stats.total_lines as f64) * 100.0
    } else {
        0.0
    }
}

fn top_files(fold_map: &FoldMap) -> Vec<&SourceFile> {
    let mut files_by_regions: Vec<_> = fold_map
        .files
        .iter()
        .filter(|f| !f.regions.is_empty())
        .collect();
    files_by_regions.sort_by(|a, b| b.regions.len().cmp(&a.regions.len()));
    files_by_regions.truncate(5);
    files_by_regions
}

/// Generate a human-readable summary
pub fn format_summary(fold_map: &FoldMap) -> String {
    let stats = &fold_map.stats;
    let mut output = String::new();

    output.push_str(&format!(
        "Fold Region Summary\n\
         ===================\n\
         Root: {}\n\n",
        fold_map.root.display()
    ));

    output.push_str(&format!(
        "Files Scanned: {} ({} unreadable)\n\
         Total Lines: {} | Foldable Lines: {} ({:.1}%)\n\n",
        stats.total_files,
        stats.files_with_errors,
        stats.total_lines,
        stats.foldable_lines,
        foldable_percent(fold_map)
    ));

    output.push_str(&format!(
        "Total Regions: {}\n\
         - fn: {}\n\
         - struct: {}\n\
         - impl: {}\n\
         - enum: {}\n\
         - trait: {}\n\
         - mod: {}\n\
         - use blocks: {} ({} statements)\n\n",
        stats.total_regions,
        stats.fn_regions,
        stats.struct_regions,
        stats.impl_regions,
        stats.enum_regions,
        stats.trait_regions,
        stats.mod_regions,
        stats.import_blocks,
        stats.import_statements
    ));

    let top = top_files(fold_map);
    if !top.is_empty() {
        output.push_str("Top files by regions:\n");
        for file in top {
            output.push_str(&format!(
                "  {} ({} regions, {} lines)\n",
                file.path.display(),
                file.regions.len(),
                file.line_count
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "Scan Duration: {}ms ({:.2} files/sec)\n\
         Timestamp: {}\n\
         Tool Version: {}\n",
        fold_map.metadata.scan_duration_ms,
        fold_map.metadata.files_per_second,
        fold_map.metadata.timestamp,
        fold_map.metadata.tool_version
    ));

    output
}

fn format_summary_ansi(fold_map: &FoldMap) -> String {
    let stats = &fold_map.stats;
    let mut output = String::new();

    let bold = "\x1b[1m";
    let reset = "\x1b[0m";
    let cyan = "\x1b[36m";
    let yellow = "\x1b[33m";
    let dim = "\x1b[2m";

    output.push_str(&format!(
        "{}{}Fold Region Summary{}\n\
         {}==================={}\n\
         {}Root:{} {}\n\n",
        bold, cyan, reset, cyan, reset, dim, reset,
        fold_map.root.display()
    ));

    output.push_str(&format!(
        "{}Files Scanned:{} {} | {}Total Lines:{} {} | {}Foldable:{} {} ({:.1}%)\n\n",
        dim, reset, stats.total_files,
        dim, reset, stats.total_lines,
        dim, reset, stats.foldable_lines,
        foldable_percent(fold_map)
    ));

    output.push_str(&format!(
        "{}Total Regions:{} {}\n\
         {}  fn:{} {} | {}struct:{} {} | {}impl:{} {} | {}enum:{} {}\n\
         {}  trait:{} {} | {}mod:{} {} | {}use:{} {} ({} statements)\n\n",
        dim, reset, stats.total_regions,
        dim, reset, stats.fn_regions,
        dim, reset, stats.struct_regions,
        dim, reset, stats.impl_regions,
        dim, reset, stats.enum_regions,
        dim, reset, stats.trait_regions,
        dim, reset, stats.mod_regions,
        dim, reset, stats.import_blocks,
        stats.import_statements
    ));

    let top = top_files(fold_map);
    if !top.is_empty() {
        output.push_str(&format!("{}Top files by regions:{}\n", dim, reset));
        for file in top {
            output.push_str(&format!(
                "  {}{}{} ({}{} regions{}, {} lines)\n",
                yellow,
                file.path.display(),
                reset,
                cyan,
                file.regions.len(),
                reset,
                file.line_count
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "{}Scan:{} {}ms ({:.2} files/sec)\n",
        dim, reset,
        fold_map.metadata.scan_duration_ms,
        fold_map.metadata.files_per_second,
    ));

    output
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::identify_foldable_regions;
    use crate::models::{FoldStats, ScanMetadata};
    use std::path::PathBuf;

    fn sample_file() -> SourceFile {
        SourceFile {
            path: PathBuf::from("src/lib.rs"),
            absolute_path: PathBuf::from("/p/src/lib.rs"),
            regions: identify_foldable_regions(
                "use a;\nuse b::{\n    c,\n};\nimpl X {\n    fn f() {\n    }\n}\n",
            ),
            line_count: 9,
            parsed: true,
            error: None,
        }
    }

    #[test]
    fn test_file_listing() {
        let text = format_file(&sample_file(), OutputFormat::Summary).unwrap();
        assert!(text.contains("Regions: 3"));
        assert!(text.contains("1. use block (2 statements, lines 1, 2-4) [folded]"));
        assert!(text.contains("2. impl (lines 5-8, brace 5, level 0)\n"));
        assert!(text.contains("3. fn (lines 6-7, brace 6, level 1) [folded]"));
    }

    #[test]
    fn test_summary_counts() {
        let file = sample_file();
        let mut stats = FoldStats {
            total_files: 1,
            total_lines: file.line_count,
            ..Default::default()
        };
        for region in &file.regions {
            stats.add_region(region);
        }
        let fold_map = FoldMap {
            root: PathBuf::from("/p"),
            files: vec![file],
            stats,
            metadata: ScanMetadata::default(),
        };

        let summary = format_summary(&fold_map);
        assert!(summary.contains("Total Regions: 3"));
        assert!(summary.contains("- use blocks: 1 (2 statements)"));
        assert!(summary.contains("src/lib.rs (3 regions, 9 lines)"));
    }
}
