//! Character-class state machine shared by the import collector and the
//! block scanner.
//!
//! Each line is classified character by character into live code, comment or
//! string content. The only state carried between lines is whether a block
//! comment or a string literal is still open, so a caller threads one
//! [`LexState`] through the lines of a file and gets a [`ClassifiedLine`] back
//! for each of them.

/// What a single character position belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Live code: braces and keywords found here count
    Code,
    /// `//` comment, runs to the end of the line
    LineComment,
    /// `/* ... */` comment, may span lines
    BlockComment,
    /// String or char literal, including its delimiters
    StringLiteral,
}

/// A character of a line together with its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedChar {
    /// Byte offset within the line
    pub offset: usize,
    pub ch: char,
    pub class: CharClass,
}

impl ClassifiedChar {
    pub fn is_live(&self) -> bool {
        self.class == CharClass::Code
    }
}

/// Comment/string state carried from one line into the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexState {
    pub in_block_comment: bool,
    /// Delimiter of the open string literal, if any
    pub string_delim: Option<char>,
}

impl LexState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_string(&self) -> bool {
        self.string_delim.is_some()
    }

    /// True when the next line starts inside a comment or a string
    pub fn is_inert(&self) -> bool {
        self.in_block_comment || self.in_string()
    }

    /// Classify one line and advance the carried state past it.
    ///
    /// Never fails: an unterminated string or block comment simply stays
    /// open for the following lines.
    pub fn classify_line(&mut self, line: &str) -> ClassifiedLine {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut out = Vec::with_capacity(chars.len());
        let mut in_line_comment = false;
        let mut i = 0;

        let emit = |out: &mut Vec<ClassifiedChar>, idx: usize, class: CharClass| {
            let (offset, ch) = chars[idx];
            out.push(ClassifiedChar { offset, ch, class });
        };

        while i < chars.len() {
            let ch = chars[i].1;
            let next = chars.get(i + 1).map(|&(_, c)| c);

            if self.in_block_comment {
                emit(&mut out, i, CharClass::BlockComment);
                if ch == '*' && next == Some('/') {
                    emit(&mut out, i + 1, CharClass::BlockComment);
                    self.in_block_comment = false;
                    i += 2;
                } else {
                    i += 1;
                }
                continue;
            }

            if in_line_comment {
                emit(&mut out, i, CharClass::LineComment);
                i += 1;
                continue;
            }

            if let Some(delim) = self.string_delim {
                emit(&mut out, i, CharClass::StringLiteral);
                if ch == '\\' && next.is_some() {
                    emit(&mut out, i + 1, CharClass::StringLiteral);
                    i += 2;
                    continue;
                }
                if ch == delim {
                    self.string_delim = None;
                }
                i += 1;
                continue;
            }

            match (ch, next) {
                ('/', Some('/')) => {
                    in_line_comment = true;
                    emit(&mut out, i, CharClass::LineComment);
                    i += 1;
                }
                ('/', Some('*')) => {
                    self.in_block_comment = true;
                    emit(&mut out, i, CharClass::BlockComment);
                    emit(&mut out, i + 1, CharClass::BlockComment);
                    i += 2;
                }
                ('"', _) => {
                    self.string_delim = Some('"');
                    emit(&mut out, i, CharClass::StringLiteral);
                    i += 1;
                }
                ('\'', _) if quote_opens_literal(&chars, i) => {
                    self.string_delim = Some('\'');
                    emit(&mut out, i, CharClass::StringLiteral);
                    i += 1;
                }
                ('r', Some('"' | '#')) => match raw_string_quote(&chars, i) {
                    // Raw strings are read as plain double-quoted strings
                    // starting at their first quote.
                    Some(quote) => {
                        for idx in i..=quote {
                            emit(&mut out, idx, CharClass::StringLiteral);
                        }
                        self.string_delim = Some('"');
                        i = quote + 1;
                    }
                    None => {
                        emit(&mut out, i, CharClass::Code);
                        i += 1;
                    }
                },
                _ => {
                    emit(&mut out, i, CharClass::Code);
                    i += 1;
                }
            }
        }

        ClassifiedLine { chars: out }
    }
}

/// A fully classified line
#[derive(Debug, Clone, Default)]
pub struct ClassifiedLine {
    chars: Vec<ClassifiedChar>,
}

impl ClassifiedLine {
    pub fn chars(&self) -> &[ClassifiedChar] {
        &self.chars
    }

    /// Live code characters, in order
    pub fn live(&self) -> impl Iterator<Item = &ClassifiedChar> {
        self.chars.iter().filter(|c| c.is_live())
    }

    /// Whether the character starting at `offset` is live code
    pub fn is_live_at(&self, offset: usize) -> bool {
        self.chars
            .iter()
            .find(|c| c.offset == offset)
            .is_some_and(|c| c.is_live())
    }

    pub fn has_live(&self, ch: char) -> bool {
        self.live().any(|c| c.ch == ch)
    }

    /// The line up to its last live, non-whitespace character.
    ///
    /// Trailing comments and whitespace are dropped, so the result ends in the
    /// last real token of the line.
    pub fn trimmed_code<'a>(&self, line: &'a str) -> &'a str {
        let end = self
            .chars
            .iter()
            .rev()
            .find(|c| c.is_live() && !c.ch.is_whitespace())
            .map(|c| c.offset + c.ch.len_utf8())
            .unwrap_or(0);
        line[..end].trim_start()
    }
}

/// Split text on `\r\n`, `\r` or `\n`.
///
/// A trailing line terminator yields a final empty line, and empty input is a
/// single empty line, so line numbers stay aligned with what an editor shows.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&text[start..]);

    lines
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Decide whether the `'` at `idx` opens a char/string literal.
///
/// `'a'`, `'{'` and `'\n'` are literals; `'a` and `'static` followed by
/// anything other than a quote are lifetimes or labels and stay code.
fn quote_opens_literal(chars: &[(usize, char)], idx: usize) -> bool {
    match chars.get(idx + 1).map(|&(_, c)| c) {
        Some(c) if is_ident_start(c) => {
            let mut j = idx + 1;
            while j < chars.len() && is_ident_continue(chars[j].1) {
                j += 1;
            }
            chars.get(j).map(|&(_, c)| c) == Some('\'')
        }
        _ => true,
    }
}

/// Index of the opening quote if the `r` at `idx` starts a raw string
/// (`r"`, `r#"`, `br"`, ...). The `r` must not be the tail of an identifier.
fn raw_string_quote(chars: &[(usize, char)], idx: usize) -> Option<usize> {
    if idx > 0 {
        let prev = chars[idx - 1].1;
        let byte_prefix = prev == 'b' && (idx < 2 || !is_ident_continue(chars[idx - 2].1));
        if is_ident_continue(prev) && !byte_prefix {
            return None;
        }
    }

    let mut j = idx + 1;
    while j < chars.len() && chars[j].1 == '#' {
        j += 1;
    }
    (chars.get(j).map(|&(_, c)| c) == Some('"')).then_some(j)
}
