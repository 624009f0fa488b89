pub mod file_filter;
pub mod text_scanner;

pub use file_filter::FileFilter;
pub use text_scanner::{SourceFile, TextScanner};
