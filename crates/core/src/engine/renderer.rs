use crate::config::ScanConfig;
use crate::identify::{split_lines, RegionIdentifier};
use crate::models::{toggle_at, FoldRegion, RegionKind, RenderedFile};
use std::fs;
use std::path::Path;
use termcolor::Color;

const FOLDED_MARKER: char = '►';
const EXPANDED_MARKER: char = '▼';

/// Renders source text as a numbered, line-by-line view with folds applied
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    colored: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ansi() -> Self {
        Self { colored: true }
    }

    /// Render a file with folds applied, returning plain text
    pub fn render(&self, source: &str, regions: &[FoldRegion]) -> String {
        self.render_counted(source, regions).0
    }

    /// Render and also report how many source lines were hidden
    pub fn render_counted(&self, source: &str, regions: &[FoldRegion]) -> (String, usize) {
        let mut lines = split_lines(source);
        if lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let width = lines.len().to_string().len();
        let mut out = String::with_capacity(source.len() + lines.len() * (width + 5));
        let mut hidden = 0;

        if let Some(imports) = regions.iter().find(|r| r.is_import_block()) {
            out.push_str(&self.gutter(Some(imports), "", width));
            out.push_str(&self.paint(
                imports.kind,
                &format!("use ... ({} statements)", imports.count.unwrap_or(0)),
            ));
            out.push('\n');
        }

        for (idx, text) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if regions.iter().any(|r| r.is_folded && r.hides_line(line_no)) {
                hidden += 1;
                continue;
            }

            let starting = regions
                .iter()
                .find(|r| !r.is_import_block() && r.start_line == line_no);
            out.push_str(&self.gutter(starting, &line_no.to_string(), width));
            out.push_str(text);

            let folded_here = regions
                .iter()
                .find(|r| !r.is_import_block() && r.start_line == line_no && r.is_folded);
            if let Some(region) = folded_here {
                out.push_str(&self.paint(
                    region.kind,
                    &format!(" ... {{{}}} lines ... ", region.hidden_lines()),
                ));
            }
            out.push('\n');
        }

        (out, hidden)
    }

    fn gutter(&self, region: Option<&FoldRegion>, number: &str, width: usize) -> String {
        let marker = match region {
            Some(r) if r.is_folded => FOLDED_MARKER,
            Some(_) => EXPANDED_MARKER,
            None => ' ',
        };
        let marker = match region {
            Some(r) => self.paint(r.kind, &marker.to_string()),
            None => marker.to_string(),
        };
        format!("{} {:>width$} | ", marker, number, width = width)
    }

    fn paint(&self, kind: RegionKind, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }

        let fg_color = match fold_color(kind) {
            Color::Blue => "\x1b[34m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Magenta => "\x1b[35m",
            Color::Cyan => "\x1b[36m",
            Color::Red => "\x1b[31m",
            _ => "\x1b[90m",
        };
        format!("\x1b[2m{}{}\x1b[0m", fg_color, text)
    }
}

/// Get color for region kind
fn fold_color(kind: RegionKind) -> Color {
    match kind {
        RegionKind::Fn => Color::Blue,
        RegionKind::Struct => Color::Cyan,
        RegionKind::Enum => Color::Cyan,
        RegionKind::Impl => Color::Magenta,
        RegionKind::Trait => Color::Yellow,
        RegionKind::Mod => Color::Red,
        RegionKind::ConsolidatedUseBlock => Color::Green,
    }
}

/// Read a file, identify its regions, flip the regions starting on each of
/// `toggles`, and render the result.
pub fn render_file(
    path: &Path,
    config: &ScanConfig,
    toggles: &[usize],
    renderer: Renderer,
) -> Result<RenderedFile, std::io::Error> {
    let content = fs::read_to_string(path)?;

    let mut regions = RegionIdentifier::with_policy(config.fold_policy).identify(&content);
    for &line in toggles {
        toggle_at(&mut regions, line);
    }

    let (rendered, lines_hidden) = renderer.render_counted(&content, &regions);

    Ok(RenderedFile {
        path: path.to_path_buf(),
        content: rendered,
        region_count: regions.len(),
        lines_hidden,
    })
}
