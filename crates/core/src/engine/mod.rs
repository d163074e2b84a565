mod renderer;
mod scanner;

pub use renderer::{render_file, Renderer};
pub use scanner::{FoldScanner, ScanError};
