use super::lexer::{ClassifiedChar, ClassifiedLine, LexState};
use crate::models::{FoldRegion, LineSpan};

const USE_KEYWORD: &str = "use";

/// Result of the import pass: one span per `use` statement plus the set of
/// lines those statements own.
#[derive(Debug, Clone, Default)]
pub struct ImportScan {
    spans: Vec<LineSpan>,
    owned: Vec<bool>,
}

impl ImportScan {
    pub fn spans(&self) -> &[LineSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Whether `line` (1-indexed) belongs to an import statement
    pub fn owns(&self, line: usize) -> bool {
        self.owned.get(line).copied().unwrap_or(false)
    }

    /// The consolidated region, if any statement was found
    pub fn to_region(&self, is_folded: bool) -> Option<FoldRegion> {
        if self.spans.is_empty() {
            return None;
        }
        Some(FoldRegion::consolidated_imports(
            self.spans.clone(),
            is_folded,
        ))
    }
}

/// An import statement still waiting for its terminator
#[derive(Debug)]
struct OpenImport {
    start_line: usize,
    depth: i32,
}

impl OpenImport {
    /// Feed live characters; true once the statement is closed.
    ///
    /// A `;` at brace depth zero closes it, as does a stray `}` that drives
    /// the depth negative.
    fn consume<'a>(&mut self, chars: impl Iterator<Item = &'a ClassifiedChar>) -> bool {
        for c in chars {
            match c.ch {
                '{' => self.depth += 1,
                '}' => {
                    self.depth -= 1;
                    if self.depth < 0 {
                        return true;
                    }
                }
                ';' if self.depth == 0 => return true,
                _ => {}
            }
        }
        false
    }
}

/// Collect every `use` statement of the file.
///
/// Attribute lines directly above a statement are folded into its span. A
/// statement still open at the end of input is closed on the last line.
pub fn collect_imports(lines: &[&str]) -> ImportScan {
    let mut state = LexState::new();
    let mut spans = Vec::new();
    let mut open: Option<OpenImport> = None;
    let mut attribute_lines = 0;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let starts_inert = state.is_inert();
        let classified = state.classify_line(line);

        if let Some(stmt) = open.as_mut() {
            if stmt.consume(classified.live()) {
                spans.push(LineSpan::new(stmt.start_line, line_no));
                open = None;
            }
            continue;
        }

        match find_use_keyword(line, &classified) {
            Some(offset) => {
                let mut stmt = OpenImport {
                    start_line: line_no - attribute_lines,
                    depth: 0,
                };
                attribute_lines = 0;
                if stmt.consume(classified.live().filter(|c| c.offset >= offset)) {
                    spans.push(LineSpan::new(stmt.start_line, line_no));
                } else {
                    open = Some(stmt);
                }
            }
            None if !starts_inert && line.trim_start().starts_with("#[") => {
                attribute_lines += 1;
            }
            None => attribute_lines = 0,
        }
    }

    if let Some(stmt) = open {
        spans.push(LineSpan::new(stmt.start_line, lines.len()));
    }

    let mut owned = vec![false; lines.len() + 1];
    for span in &spans {
        for line in span.start_line..=span.end_line.min(lines.len()) {
            owned[line] = true;
        }
    }

    ImportScan { spans, owned }
}

/// Byte offset of a live `use` token on the line.
///
/// The token must stand alone: preceded by line start, whitespace or an
/// opening delimiter and followed by whitespace or the end of the line, so
/// `usefulName` or `reuse` never match.
fn find_use_keyword(line: &str, classified: &ClassifiedLine) -> Option<usize> {
    classified
        .live()
        .filter(|c| c.ch == 'u' && line[c.offset..].starts_with(USE_KEYWORD))
        .map(|c| c.offset)
        .find(|&offset| {
            let before_ok = line[..offset]
                .chars()
                .next_back()
                .map_or(true, |p| p.is_whitespace() || matches!(p, '(' | '[' | '{'));
            let after = offset + USE_KEYWORD.len();
            let after_ok = line[after..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace);
            before_ok && after_ok && classified.is_live_at(after - 1)
        })
}
