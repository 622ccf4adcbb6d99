use thiserror::Error;

#[derive(Error, Debug)]
pub enum EanError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input is missing required columns: {}", .missing.join(", "))]
    MissingColumnsError { missing: Vec<String> },

    #[error("Invalid input row {row}, field '{field}': {reason}")]
    InvalidRowError {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("Lookup dispatch failed: {message}")]
    DispatchError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Configuration,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EanError::ApiError(_) => ErrorCategory::Network,
            EanError::CsvError(_)
            | EanError::MissingColumnsError { .. }
            | EanError::InvalidRowError { .. } => ErrorCategory::Input,
            EanError::IoError(_) | EanError::SerializationError(_) => ErrorCategory::Storage,
            EanError::ConfigError { .. }
            | EanError::ConfigValidationError { .. }
            | EanError::InvalidConfigValueError { .. }
            | EanError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EanError::DispatchError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Storage => {
                ErrorSeverity::High
            }
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EanError::ApiError(_) => {
                "Check network connectivity and the registry endpoint, then retry".to_string()
            }
            EanError::CsvError(_) => "Make sure the input is a valid comma separated file".to_string(),
            EanError::IoError(_) => "Check that the paths exist and are writable".to_string(),
            EanError::SerializationError(_) => "Report this as a bug".to_string(),
            EanError::ConfigError { .. } | EanError::ConfigValidationError { .. } => {
                "Review the configuration file or command line flags".to_string()
            }
            EanError::InvalidConfigValueError { field, .. } => {
                format!("Provide a valid value for '{}'", field)
            }
            EanError::MissingConfigError { field } => format!("Set '{}' in the configuration", field),
            EanError::MissingColumnsError { .. } => {
                "The CSV must contain at least the columns postalCode and streetNumber".to_string()
            }
            EanError::InvalidRowError { row, .. } => format!("Fix data row {} in the input file", row),
            EanError::DispatchError { .. } => {
                "Lower --concurrent-requests and run the batch again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the EAN registry: {}", self),
            ErrorCategory::Input => format!("The input file is not valid: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Storage => format!("Could not read or write files: {}", self),
            ErrorCategory::Internal => format!("The batch could not be completed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EanError>;
