//! Foldable-region identification.
//!
//! Two passes over the same text share one character-class state machine:
//! the import collector gathers every `use` statement into a single
//! consolidated region, then the block scanner matches declaration keywords
//! to the brace pairs that follow them.

mod blocks;
mod imports;
pub mod lexer;

pub use imports::{collect_imports, ImportScan};
pub use lexer::{split_lines, CharClass, ClassifiedChar, ClassifiedLine, LexState};

use crate::models::{FoldPolicy, FoldRegion};
use std::cmp::Ordering;
use tracing::debug;

/// Identifies foldable regions in source text
///
/// Holds no scan state between calls, so one identifier can be shared across
/// threads and reused for any number of files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionIdentifier {
    policy: FoldPolicy,
}

impl RegionIdentifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: FoldPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FoldPolicy {
        &self.policy
    }

    /// Scan `source` and return its regions, ordered by start line ascending
    /// and, for equal starts, by end line descending.
    ///
    /// The consolidated import block, if any, starts on line 0 and so comes
    /// first.
    pub fn identify(&self, source: &str) -> Vec<FoldRegion> {
        let lines = split_lines(source);
        let imports = collect_imports(&lines);

        let mut regions: Vec<FoldRegion> = imports
            .to_region(self.policy.fold_imports)
            .into_iter()
            .collect();
        regions.extend(blocks::scan_blocks(&lines, &imports, &self.policy));
        regions.sort_by(region_order);

        debug!(
            lines = lines.len(),
            imports = imports.spans().len(),
            regions = regions.len(),
            "identified foldable regions"
        );
        regions
    }
}

fn region_order(a: &FoldRegion, b: &FoldRegion) -> Ordering {
    a.start_line
        .cmp(&b.start_line)
        .then_with(|| b.end_line.cmp(&a.end_line))
}

/// Identify regions with the default fold policy
pub fn identify_foldable_regions(source: &str) -> Vec<FoldRegion> {
    RegionIdentifier::new().identify(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionKind;

    #[test]
    fn test_sorted_outer_first() {
        let source = "mod a {\n    fn b() {\n        1\n    }\n}\n";
        let regions = identify_foldable_regions(source);
        let order: Vec<_> = regions.iter().map(|r| r.kind).collect();
        assert_eq!(order, vec![RegionKind::Mod, RegionKind::Fn]);
    }

    #[test]
    fn test_only_line_leading_keyword_anchors() {
        let source = "fn a() { fn b() {\n}\n}\n";
        let regions = identify_foldable_regions(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].start_line, 1);
        assert_eq!(regions[0].end_line, 3);
    }

    #[test]
    fn test_policy_applied() {
        let source = "use a;\nimpl X {\n    fn f() {\n    }\n}\n";
        let regions = RegionIdentifier::with_policy(FoldPolicy::none()).identify(source);
        assert_eq!(regions.len(), 3);
        assert!(regions.iter().all(|r| !r.is_folded));

        let regions = RegionIdentifier::with_policy(FoldPolicy::all()).identify(source);
        assert!(regions.iter().all(|r| r.is_folded));
    }

    #[test]
    fn test_crlf_and_cr_line_numbers() {
        let lf = identify_foldable_regions("fn a() {\n    1\n}\n");
        let crlf = identify_foldable_regions("fn a() {\r\n    1\r\n}\r\n");
        let cr = identify_foldable_regions("fn a() {\r    1\r}\r");
        assert_eq!(lf, crlf);
        assert_eq!(lf, cr);
        assert_eq!(lf[0].end_line, 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(identify_foldable_regions("").is_empty());
    }
}
