use crate::error::{Result, TitleGrabError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Characters Excel refuses in worksheet names.
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
const MAX_SHEET_NAME_CHARS: usize = 31;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extension (without the dot) of the files to read.
    pub extension: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the workbook written into the scanned directory.
    pub file_name: String,
    pub sheet_name: String,
    pub content_header: String,
    pub source_header: String,
    pub content_column_width: f64,
    pub source_column_width: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "txt".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: "提取结果.xlsx".to_string(),
            sheet_name: "提取内容".to_string(),
            content_header: "提取内容".to_string(),
            source_header: "文件名".to_string(),
            content_column_width: 60.0,
            source_column_width: 25.0,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(TitleGrabError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TitleGrabError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| TitleGrabError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["titlegrab.toml", ".titlegrab.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| TitleGrabError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| TitleGrabError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let extension = self.scan.extension.trim();
        if extension.is_empty() {
            return Err(TitleGrabError::Config {
                message: "A file extension to scan must be specified".to_string(),
            });
        }
        if extension.contains(['/', '\\', '*']) {
            return Err(TitleGrabError::Config {
                message: format!("Invalid file extension: {}", extension),
            });
        }

        let file_name = &self.output.file_name;
        if !file_name.to_lowercase().ends_with(".xlsx") || file_name.len() <= ".xlsx".len() {
            return Err(TitleGrabError::Config {
                message: format!("Output file name must end with .xlsx: {}", file_name),
            });
        }
        if file_name.contains(['/', '\\']) {
            return Err(TitleGrabError::Config {
                message: format!("Output file name cannot contain path separators: {}", file_name),
            });
        }

        let sheet_name = &self.output.sheet_name;
        if sheet_name.is_empty() || sheet_name.chars().count() > MAX_SHEET_NAME_CHARS {
            return Err(TitleGrabError::Config {
                message: format!(
                    "Sheet name must be between 1 and {} characters",
                    MAX_SHEET_NAME_CHARS
                ),
            });
        }
        if sheet_name.contains(FORBIDDEN_SHEET_CHARS) {
            return Err(TitleGrabError::Config {
                message: format!("Sheet name contains forbidden characters: {}", sheet_name),
            });
        }

        if self.output.content_column_width <= 0.0 || self.output.source_column_width <= 0.0 {
            return Err(TitleGrabError::Config {
                message: "Column widths must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}
