use crate::config::ScanConfig;
use std::path::Path;

pub struct FileFilter {
    extension: String,
}

impl FileFilter {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            extension: normalize_extension(&config.extension),
        }
    }

    /// Extension match is case-insensitive; `notes.TXT` counts as a text file.
    pub fn is_text_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.to_lowercase() == self.extension)
    }

    pub fn get_extension(&self) -> &str {
        &self.extension
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_file_detection() {
        let filter = FileFilter::default();

        assert!(filter.is_text_file(Path::new("a.txt")));
        assert!(filter.is_text_file(Path::new("dir/红楼梦.txt")));

        assert!(!filter.is_text_file(Path::new("提取结果.xlsx")));
        assert!(!filter.is_text_file(Path::new("notes.md")));
        assert!(!filter.is_text_file(Path::new("txt")));
        assert!(!filter.is_text_file(Path::new("archive.txt.gz")));
    }

    #[test]
    fn test_case_insensitive_extension() {
        let filter = FileFilter::default();

        assert!(filter.is_text_file(Path::new("README.TXT")));
        assert!(filter.is_text_file(Path::new("readme.Txt")));
    }

    #[test]
    fn test_configured_extension_is_normalized() {
        let config = ScanConfig {
            extension: " .Text ".to_string(),
        };
        let filter = FileFilter::new(&config);

        assert_eq!(filter.get_extension(), "text");
        assert!(filter.is_text_file(Path::new("novel.text")));
        assert!(!filter.is_text_file(Path::new("novel.txt")));
    }
}
