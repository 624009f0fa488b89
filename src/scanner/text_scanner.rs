use crate::config::ScanConfig;
use crate::error::{Result, TitleGrabError};
use crate::scanner::file_filter::FileFilter;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A text file found directly inside the scanned directory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self { path, file_name }
    }

    /// Reads the whole file. Invalid UTF-8 sequences are dropped rather than failing the read.
    pub fn read_text(&self) -> Result<String> {
        let bytes = fs::read(&self.path)?;
        Ok(decode_dropping_invalid(&bytes))
    }
}

pub struct TextScanner {
    filter: FileFilter,
}

impl TextScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
        }
    }

    pub fn validate_directory<P: AsRef<Path>>(&self, root: P) -> Result<()> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(TitleGrabError::InvalidInput {
                path: format!("{} does not exist", root_path.display()),
            });
        }

        if !root_path.is_dir() {
            return Err(TitleGrabError::InvalidInput {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        Ok(())
    }

    /// Lists matching files directly inside `root` in the order the platform enumerates them.
    pub fn discover<P: AsRef<Path>>(&self, root: P) -> Result<Vec<SourceFile>> {
        let root_path = root.as_ref();
        self.validate_directory(root_path)?;

        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(TitleGrabError::InvalidInput {
                        path: format!("{} cannot be read: {}", root_path.display(), err),
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if self.filter.is_text_file(path) && path.is_file() {
                files.push(SourceFile::new(path.to_path_buf()));
            }
        }

        tracing::debug!(
            directory = %root_path.display(),
            extension = self.filter.get_extension(),
            found = files.len(),
            "discovered text files"
        );

        Ok(files)
    }

    pub fn get_extension(&self) -> &str {
        self.filter.get_extension()
    }
}

impl Default for TextScanner {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
