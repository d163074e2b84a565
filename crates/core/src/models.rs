use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of foldable region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Fn,
    Struct,
    Impl,
    Enum,
    Trait,
    Mod,
    /// Synthetic region standing for every `use` statement of a file
    ConsolidatedUseBlock,
}

impl RegionKind {
    /// Declaration keywords that open a foldable block
    pub const KEYWORDS: [RegionKind; 6] = [
        RegionKind::Fn,
        RegionKind::Struct,
        RegionKind::Impl,
        RegionKind::Enum,
        RegionKind::Trait,
        RegionKind::Mod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Fn => "fn",
            RegionKind::Struct => "struct",
            RegionKind::Impl => "impl",
            RegionKind::Enum => "enum",
            RegionKind::Trait => "trait",
            RegionKind::Mod => "mod",
            RegionKind::ConsolidatedUseBlock => "consolidated_use_block",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::KEYWORDS
            .into_iter()
            .find(|kind| kind.as_str() == keyword)
    }
}

/// Line span of one original import statement (1-indexed, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start_line: usize,
    pub end_line: usize,
}

impl LineSpan {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A foldable region of source text
///
/// Everything except `is_folded` is fixed once the region is identified;
/// consumers flip `is_folded` with [`FoldRegion::toggle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldRegion {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    /// Line of the declaration keyword; 0 for the consolidated import block
    pub start_line: usize,
    /// Line of the closing brace; 0 for the consolidated import block
    pub end_line: usize,
    /// Line of the opening brace; 0 for the consolidated import block
    pub actual_brace_line: usize,
    /// Brace nesting depth, -1 for the consolidated import block
    pub level: i32,
    pub is_folded: bool,
    /// Number of merged import statements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Spans of the merged import statements, in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub original_lines_details: Vec<LineSpan>,
}

impl FoldRegion {
    pub fn block(
        kind: RegionKind,
        start_line: usize,
        end_line: usize,
        actual_brace_line: usize,
        level: usize,
        is_folded: bool,
    ) -> Self {
        Self {
            kind,
            start_line,
            end_line,
            actual_brace_line,
            level: level as i32,
            is_folded,
            count: None,
            original_lines_details: Vec::new(),
        }
    }

    pub fn consolidated_imports(spans: Vec<LineSpan>, is_folded: bool) -> Self {
        Self {
            kind: RegionKind::ConsolidatedUseBlock,
            start_line: 0,
            end_line: 0,
            actual_brace_line: 0,
            level: -1,
            is_folded,
            count: Some(spans.len()),
            original_lines_details: spans,
        }
    }

    pub fn is_import_block(&self) -> bool {
        self.kind == RegionKind::ConsolidatedUseBlock
    }

    pub fn toggle(&mut self) {
        self.is_folded = !self.is_folded;
    }

    /// Number of source lines the region covers
    pub fn line_count(&self) -> usize {
        if self.is_import_block() {
            self.original_lines_details
                .iter()
                .map(LineSpan::line_count)
                .sum()
        } else {
            self.end_line.saturating_sub(self.start_line) + 1
        }
    }

    /// Body size shown in the fold placeholder: the lines between the
    /// opening and closing brace lines, or every line of every merged import
    /// statement.
    ///
    /// Continuation lines of a multi-line signature are not counted here even
    /// though folding hides them; see [`FoldRegion::collapsed_lines`].
    pub fn hidden_lines(&self) -> usize {
        if self.is_import_block() {
            self.line_count()
        } else {
            self.end_line
                .saturating_sub(self.actual_brace_line)
                .saturating_sub(1)
        }
    }

    /// Number of lines that disappear from view when folded, signature
    /// continuation lines included.
    pub fn collapsed_lines(&self) -> usize {
        if self.is_import_block() {
            self.line_count()
        } else {
            self.end_line
                .saturating_sub(self.start_line)
                .saturating_sub(1)
        }
    }

    /// Whether `line` disappears from view when this region is folded.
    ///
    /// The keyword line and the closing line stay visible.
    pub fn hides_line(&self, line: usize) -> bool {
        if self.is_import_block() {
            self.original_lines_details
                .iter()
                .any(|span| span.contains(line))
        } else {
            self.start_line < line && line < self.end_line
        }
    }
}

/// Flip the first region starting on `start_line` (0 addresses the
/// consolidated import block). Returns false when no region starts there.
pub fn toggle_at(regions: &mut [FoldRegion], start_line: usize) -> bool {
    match regions.iter_mut().find(|r| r.start_line == start_line) {
        Some(region) => {
            region.toggle();
            true
        }
        None => false,
    }
}

/// Default collapsed state per region kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldPolicy {
    #[serde(rename = "fn")]
    pub fold_fn: bool,
    #[serde(rename = "struct")]
    pub fold_struct: bool,
    #[serde(rename = "enum")]
    pub fold_enum: bool,
    #[serde(rename = "impl")]
    pub fold_impl: bool,
    #[serde(rename = "trait")]
    pub fold_trait: bool,
    #[serde(rename = "mod")]
    pub fold_mod: bool,
    #[serde(rename = "imports")]
    pub fold_imports: bool,
}

impl Default for FoldPolicy {
    /// Bodies and imports start folded, impl/trait/mod groupings start open.
    fn default() -> Self {
        Self {
            fold_fn: true,
            fold_struct: true,
            fold_enum: true,
            fold_impl: false,
            fold_trait: false,
            fold_mod: false,
            fold_imports: true,
        }
    }
}

impl FoldPolicy {
    /// Fold everything
    pub fn all() -> Self {
        Self {
            fold_fn: true,
            fold_struct: true,
            fold_enum: true,
            fold_impl: true,
            fold_trait: true,
            fold_mod: true,
            fold_imports: true,
        }
    }

    /// Expand everything
    pub fn none() -> Self {
        Self {
            fold_fn: false,
            fold_struct: false,
            fold_enum: false,
            fold_impl: false,
            fold_trait: false,
            fold_mod: false,
            fold_imports: false,
        }
    }

    pub fn is_folded(&self, kind: RegionKind) -> bool {
        match kind {
            RegionKind::Fn => self.fold_fn,
            RegionKind::Struct => self.fold_struct,
            RegionKind::Enum => self.fold_enum,
            RegionKind::Impl => self.fold_impl,
            RegionKind::Trait => self.fold_trait,
            RegionKind::Mod => self.fold_mod,
            RegionKind::ConsolidatedUseBlock => self.fold_imports,
        }
    }
}

/// A source file with its fold regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Relative path from project root
    pub path: PathBuf,
    /// Absolute path
    pub absolute_path: PathBuf,
    /// All fold regions in this file, in display order
    pub regions: Vec<FoldRegion>,
    /// Total line count
    pub line_count: usize,
    /// Whether the file was read successfully
    pub parsed: bool,
    /// Read error message if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceFile {
    /// Number of merged import statements, 0 when the file has none
    pub fn import_count(&self) -> usize {
        self.regions
            .iter()
            .find(|r| r.is_import_block())
            .and_then(|r| r.count)
            .unwrap_or(0)
    }
}

/// Statistics about fold analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldStats {
    pub total_files: usize,
    pub files_with_errors: usize,
    pub total_regions: usize,
    pub fn_regions: usize,
    pub struct_regions: usize,
    pub impl_regions: usize,
    pub enum_regions: usize,
    pub trait_regions: usize,
    pub mod_regions: usize,
    pub import_blocks: usize,
    pub import_statements: usize,
    pub total_lines: usize,
    pub foldable_lines: usize,
}

impl FoldStats {
    pub fn add_region(&mut self, region: &FoldRegion) {
        self.total_regions += 1;
        self.foldable_lines += region.collapsed_lines();
        match region.kind {
            RegionKind::Fn => self.fn_regions += 1,
            RegionKind::Struct => self.struct_regions += 1,
            RegionKind::Impl => self.impl_regions += 1,
            RegionKind::Enum => self.enum_regions += 1,
            RegionKind::Trait => self.trait_regions += 1,
            RegionKind::Mod => self.mod_regions += 1,
            RegionKind::ConsolidatedUseBlock => {
                self.import_blocks += 1;
                self.import_statements += region.count.unwrap_or(0);
            }
        }
    }
}

/// Scan metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scan_duration_ms: u64,
    pub files_per_second: f64,
    pub timestamp: String,
    pub tool_version: String,
}

impl Default for ScanMetadata {
    fn default() -> Self {
        Self {
            scan_duration_ms: 0,
            files_per_second: 0.0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Aggregated fold analysis results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldMap {
    /// Project root path
    pub root: PathBuf,
    /// All source files analyzed
    pub files: Vec<SourceFile>,
    /// Fold statistics
    pub stats: FoldStats,
    /// Scan metadata
    pub metadata: ScanMetadata,
}

/// Rendered output for a single file
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub content: String,
    pub region_count: usize,
    pub lines_hidden: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fn_region() -> FoldRegion {
        FoldRegion::block(RegionKind::Fn, 3, 9, 4, 0, true)
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(RegionKind::from_keyword("impl"), Some(RegionKind::Impl));
        assert_eq!(RegionKind::from_keyword("consolidated_use_block"), None);
        assert_eq!(RegionKind::from_keyword("let"), None);
    }

    #[test]
    fn test_block_region_lines() {
        let region = fn_region();
        assert_eq!(region.line_count(), 7);
        assert_eq!(region.hidden_lines(), 4);
        assert!(!region.hides_line(3));
        assert!(region.hides_line(4));
        assert!(region.hides_line(8));
        assert!(!region.hides_line(9));
    }

    #[test]
    fn test_one_line_body_hides_nothing() {
        let region = FoldRegion::block(RegionKind::Struct, 1, 2, 1, 0, true);
        assert_eq!(region.hidden_lines(), 0);
    }

    #[test]
    fn test_import_block_lines() {
        let region = FoldRegion::consolidated_imports(
            vec![LineSpan::new(1, 1), LineSpan::new(3, 5)],
            true,
        );
        assert_eq!(region.count, Some(2));
        assert_eq!(region.level, -1);
        assert_eq!(region.line_count(), 4);
        assert_eq!(region.hidden_lines(), 4);
        assert!(region.hides_line(4));
        assert!(!region.hides_line(2));
    }

    #[test]
    fn test_toggle_at() {
        let mut regions = vec![fn_region()];
        assert!(toggle_at(&mut regions, 3));
        assert!(!regions[0].is_folded);
        assert!(!toggle_at(&mut regions, 4));
    }

    #[test]
    fn test_default_policy() {
        let policy = FoldPolicy::default();
        assert!(policy.is_folded(RegionKind::Fn));
        assert!(policy.is_folded(RegionKind::Struct));
        assert!(policy.is_folded(RegionKind::Enum));
        assert!(!policy.is_folded(RegionKind::Impl));
        assert!(!policy.is_folded(RegionKind::Trait));
        assert!(!policy.is_folded(RegionKind::Mod));
        assert!(policy.is_folded(RegionKind::ConsolidatedUseBlock));
    }

    #[test]
    fn test_region_serializes_type_field() {
        let json = serde_json::to_string(&fn_region()).unwrap();
        assert!(json.contains("\"type\":\"fn\""));
        assert!(!json.contains("original_lines_details"));

        let imports = FoldRegion::consolidated_imports(vec![LineSpan::new(1, 1)], true);
        let json = serde_json::to_string(&imports).unwrap();
        assert!(json.contains("\"type\":\"consolidated_use_block\""));
        assert!(json.contains("\"count\":1"));
    }

    #[test]
    fn test_stats_count_imports() {
        let mut stats = FoldStats::default();
        stats.add_region(&FoldRegion::consolidated_imports(
            vec![LineSpan::new(1, 1), LineSpan::new(2, 2)],
            true,
        ));
        stats.add_region(&fn_region());
        assert_eq!(stats.total_regions, 2);
        assert_eq!(stats.import_statements, 2);
        assert_eq!(stats.fn_regions, 1);
        // two import lines plus lines 4..=8 of the fn
        assert_eq!(stats.foldable_lines, 7);
    }

    #[test]
    fn test_signature_lines_collapse_but_are_not_body() {
        let region = FoldRegion::block(RegionKind::Fn, 1, 6, 4, 0, true);
        assert_eq!(region.hidden_lines(), 1);
        assert_eq!(region.collapsed_lines(), 4);
        let hidden = (1..=6).filter(|&l| region.hides_line(l)).count();
        assert_eq!(hidden, region.collapsed_lines());
    }
}
