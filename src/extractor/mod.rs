pub mod extraction_run;
pub mod title_extractor;
pub mod workbook;

pub use extraction_run::{ExtractionRun, RunSummary};
pub use title_extractor::{ExtractedEntry, TitleExtractor};
pub use workbook::WorkbookWriter;
