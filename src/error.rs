use thiserror::Error;

#[derive(Error, Debug)]
pub enum TitleGrabError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input directory: {path}")]
    InvalidInput { path: String },

    #[error("Failed to write workbook {path}: {message}")]
    WriteFailure { path: String, message: String },

    #[error("Could not read workbook {path}: {message}")]
    InvalidWorkbook { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Another extraction run is already in progress")]
    RunInProgress,

    #[error("Extraction worker failed: {message}")]
    Worker { message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for TitleGrabError {
    fn user_message(&self) -> String {
        match self {
            TitleGrabError::InvalidInput { path } => {
                format!("Please choose a valid directory: {}", path)
            }
            TitleGrabError::WriteFailure { path, message } => {
                format!("Could not save results to {}: {}", path, message)
            }
            TitleGrabError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            TitleGrabError::RunInProgress => {
                "An extraction is already running".to_string()
            }
            TitleGrabError::Worker { message } => {
                format!("Extraction stopped unexpectedly: {}", message)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            TitleGrabError::InvalidInput { .. } => Some(
                "Pass the path of an existing directory that contains .txt files.".to_string(),
            ),
            TitleGrabError::WriteFailure { .. } => Some(
                "Close the workbook if it is open in another program and check that the directory is writable.".to_string(),
            ),
            TitleGrabError::Config { .. } => Some(
                "Check your configuration file syntax or run with --generate-config to create a fresh one.".to_string(),
            ),
            TitleGrabError::RunInProgress => Some(
                "Wait for the current run to finish before starting another.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for TitleGrabError {
    fn from(error: toml::de::Error) -> Self {
        TitleGrabError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TitleGrabError>;
