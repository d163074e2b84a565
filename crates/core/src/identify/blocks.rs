use super::imports::ImportScan;
use super::lexer::LexState;
use crate::models::{FoldPolicy, FoldRegion, RegionKind};
use regex::Regex;
use std::sync::OnceLock;

/// Line endings that keep a declaration signature open onto the next line
const SIGNATURE_CONTINUATIONS: [&str; 6] = ["->", ",", "(", "where", ")", ">"];

/// Declaration at the start of a line: visibility, qualifiers, ABI, keyword.
fn keyword_regex() -> &'static Regex {
    static KEYWORD: OnceLock<Regex> = OnceLock::new();
    KEYWORD.get_or_init(|| {
        Regex::new(
            r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:(?:default|const|async|unsafe)\s+)*(?:extern\s+(?:"[^"]*"\s+)?)?(?:(?:async|unsafe)\s+)*(fn|struct|impl|enum|trait|mod)\b"#,
        )
        .expect("keyword pattern is valid")
    })
}

/// Keyword waiting for the brace that opens its body
#[derive(Debug, Clone, Copy)]
struct PendingKeyword {
    line: usize,
    kind: RegionKind,
}

#[derive(Debug)]
struct OpenBrace {
    open_line: usize,
    keyword: Option<RegionKind>,
    level: usize,
    brace_line: usize,
}

/// Match a foldable declaration at the start of `line`.
///
/// Returns the keyword's byte offset so the caller can check it is live code.
fn match_keyword(line: &str) -> Option<(usize, RegionKind)> {
    let caps = keyword_regex().captures(line)?;
    let keyword = caps.get(1)?;
    RegionKind::from_keyword(keyword.as_str()).map(|kind| (keyword.start(), kind))
}

fn continues_signature(code: &str) -> bool {
    SIGNATURE_CONTINUATIONS
        .iter()
        .any(|token| code.ends_with(token))
}

/// Walk the file once and emit a region for every keyword-led brace pair.
///
/// Import-owned lines never anchor a keyword, but their braces still go
/// through the stack as anonymous entries so nesting stays balanced. Stray
/// closing braces are ignored.
pub fn scan_blocks(lines: &[&str], imports: &ImportScan, policy: &FoldPolicy) -> Vec<FoldRegion> {
    let mut state = LexState::new();
    let mut stack: Vec<OpenBrace> = Vec::new();
    let mut pending: Option<PendingKeyword> = None;
    let mut regions = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let starts_inert = state.is_inert();
        let classified = state.classify_line(line);
        let owned = imports.owns(line_no);

        if !owned && !starts_inert {
            if let Some((offset, kind)) = match_keyword(line) {
                if classified.is_live_at(offset) {
                    pending = Some(PendingKeyword {
                        line: line_no,
                        kind,
                    });
                }
            }
        }

        for c in classified.live() {
            match c.ch {
                '{' => {
                    let level = stack.len();
                    let keyword = if owned { None } else { pending.take() };
                    stack.push(match keyword {
                        Some(keyword) => OpenBrace {
                            open_line: keyword.line,
                            keyword: Some(keyword.kind),
                            level,
                            brace_line: line_no,
                        },
                        None => OpenBrace {
                            open_line: line_no,
                            keyword: None,
                            level,
                            brace_line: line_no,
                        },
                    });
                }
                '}' => {
                    let Some(open) = stack.pop() else {
                        continue;
                    };
                    if let Some(kind) = open.keyword {
                        if line_no > open.brace_line {
                            regions.push(FoldRegion::block(
                                kind,
                                open.open_line,
                                line_no,
                                open.brace_line,
                                open.level,
                                policy.is_folded(kind),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(keyword) = pending {
            if keyword.line == line_no
                && !classified.has_live('{')
                && !continues_signature(classified.trimmed_code(line))
            {
                pending = None;
            }
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::imports::collect_imports;
    use crate::identify::lexer::split_lines;

    fn blocks(source: &str) -> Vec<FoldRegion> {
        let lines = split_lines(source);
        let imports = collect_imports(&lines);
        scan_blocks(&lines, &imports, &FoldPolicy::default())
    }

    #[test]
    fn test_keyword_regex_variants() {
        for (line, kind) in [
            ("fn main() {", RegionKind::Fn),
            ("    pub fn run(&self) {", RegionKind::Fn),
            ("pub(crate) struct Config {", RegionKind::Struct),
            ("pub(in crate::a) enum E {", RegionKind::Enum),
            ("unsafe impl Send for X {}", RegionKind::Impl),
            ("pub unsafe extern \"C\" fn cb() {", RegionKind::Fn),
            ("pub async fn fetch() {", RegionKind::Fn),
            ("pub const fn zero() -> u8 {", RegionKind::Fn),
            ("pub trait Visitor {", RegionKind::Trait),
            ("mod tests {", RegionKind::Mod),
        ] {
            assert_eq!(match_keyword(line).map(|(_, k)| k), Some(kind), "{line}");
        }
    }

    #[test]
    fn test_keyword_regex_rejects() {
        for line in [
            "let fnord = 1;",
            "structure {",
            "// fn commented() {",
            "extern crate foo;",
            "x.impl_thing() {",
        ] {
            assert!(match_keyword(line).is_none(), "{line}");
        }
    }

    #[test]
    fn test_brace_on_next_line_after_paren() {
        let regions = blocks("fn main()\n{\n    run();\n}\n");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].start_line, 1);
        assert_eq!(regions[0].actual_brace_line, 2);
        assert_eq!(regions[0].end_line, 4);
    }

    #[test]
    fn test_pending_cancelled_without_continuation() {
        let regions = blocks("struct Unit;\n\nconst X: u8 = {\n    1\n};\n");
        assert!(regions.is_empty());
    }

    #[test]
    fn test_trait_method_declaration_does_not_anchor() {
        let source = "trait T {\n    fn required(&self);\n    fn provided(&self) {\n        todo!()\n    }\n}\n";
        let regions = blocks(source);
        let kinds: Vec<_> = regions.iter().map(|r| (r.kind, r.start_line)).collect();
        assert_eq!(kinds, vec![(RegionKind::Fn, 3), (RegionKind::Trait, 1)]);
    }

    #[test]
    fn test_where_clause_continuation() {
        let source = "impl<T> Foo<T>\nwhere\n    T: Clone,\n{\n    fn a() {}\n}\n";
        let regions = blocks(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::Impl);
        assert_eq!(regions[0].start_line, 1);
        assert_eq!(regions[0].actual_brace_line, 4);
    }

    #[test]
    fn test_trailing_comment_does_not_hide_continuation() {
        let source = "fn f(a: u8, // the a\n     b: u8) {\n    a + b\n}\n";
        let regions = blocks(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].start_line, 1);
        assert_eq!(regions[0].actual_brace_line, 2);
    }

    #[test]
    fn test_keyword_inside_block_comment_ignored() {
        let source = "/*\nfn ghost() {\n}\n*/\nfn real() {\n}\n";
        let regions = blocks(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].start_line, 5);
    }

    #[test]
    fn test_unbalanced_closing_braces_ignored() {
        let regions = blocks("}\n}\nfn f() {\n}\n");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].level, 0);
    }

    #[test]
    fn test_import_lines_do_not_anchor_keywords() {
        let source = "use a::{\n    b,\n};\nfn f() {\n}\n";
        let regions = blocks(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].start_line, 4);
        assert_eq!(regions[0].level, 0);
    }

    #[test]
    fn test_braces_on_import_lines_keep_nesting() {
        let source = "impl Foo {\n    fn a() { use std::fmt::Write;\n        body();\n    }\n    fn b() {\n        body();\n    }\n}\n";
        let regions: Vec<_> = blocks(source)
            .iter()
            .map(|r| (r.kind, r.start_line, r.end_line, r.level))
            .collect();
        assert_eq!(
            regions,
            vec![(RegionKind::Fn, 5, 7, 1), (RegionKind::Impl, 1, 8, 0)]
        );
    }

    #[test]
    fn test_import_line_brace_keeps_pending_keyword() {
        let source = "fn f()\nuse a::{b};\n{\n    1\n}\n";
        let regions = blocks(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].start_line, 1);
        assert_eq!(regions[0].actual_brace_line, 3);
    }

    #[test]
    fn test_char_literal_brace_ignored() {
        let source = "fn f() {\n    let c = '}';\n}\n";
        let regions = blocks(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].end_line, 3);
    }

    #[test]
    fn test_lifetime_does_not_open_string() {
        let source = "struct View<'a> {\n    data: &'a str,\n}\n";
        let regions = blocks(source);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::Struct);
        assert_eq!(regions[0].end_line, 3);
    }
}
