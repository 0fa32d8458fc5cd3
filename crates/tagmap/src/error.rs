//! Error types for tagmap.
//!
//! Errors fall into two groups: data errors, which mean the uploaded
//! spreadsheet is unusable and are reported back to the uploader, and
//! everything else (I/O, unreadable files, rendering, configuration).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tagmap operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Upload Errors ===
    /// The upload request carried no usable file.
    #[error("{reason}")]
    UploadMissing {
        /// Message shown to the uploader.
        reason: &'static str,
    },

    // === Data Errors ===
    /// A required column is absent from the header row.
    #[error("Missing required column: {column}")]
    Schema {
        /// Name of the first missing column.
        column: String,
    },

    /// A coordinate value could not be read as a number.
    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    Coercion {
        /// 1-based data row number.
        row: usize,
        /// Column name.
        column: &'static str,
        /// The offending cell, as text.
        value: String,
    },

    /// A required text value is empty.
    #[error("row {row}: column '{column}' is empty")]
    MissingValue {
        /// 1-based data row number.
        row: usize,
        /// Column name.
        column: &'static str,
    },

    /// A coordinate is outside the valid range even after normalization.
    #[error("row {row}: coordinate ({latitude}, {longitude}) is out of range")]
    CoordinateRange {
        /// 1-based data row number.
        row: usize,
        /// Latitude after normalization.
        latitude: f64,
        /// Longitude after normalization.
        longitude: f64,
    },

    /// The spreadsheet has a header but no data rows.
    #[error("spreadsheet contains no data rows")]
    EmptyDataset,

    // === Input Errors ===
    /// The file is not a readable spreadsheet.
    #[error("failed to read spreadsheet {path}: {message}")]
    Parse {
        /// Path to the spreadsheet.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Output Errors ===
    /// Rendering an HTML template failed.
    #[error("failed to render {template}: {source}")]
    Render {
        /// Template name.
        template: &'static str,
        /// The underlying error.
        #[source]
        source: tera::Error,
    },

    /// Replacing the output document failed.
    #[error("failed to write map document {path}: {source}")]
    DocumentWrite {
        /// Destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for tagmap operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a schema error for a missing column.
    #[must_use]
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
        }
    }

    /// Create a parse error for an unreadable spreadsheet.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by the uploaded data itself.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::Schema { .. }
                | Self::Coercion { .. }
                | Self::MissingValue { .. }
                | Self::CoordinateRange { .. }
                | Self::EmptyDataset
        )
    }

    /// Check if this error means the request had no file.
    #[must_use]
    pub fn is_upload_missing(&self) -> bool {
        matches!(self, Self::UploadMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = Error::missing_column("longitude");
        assert_eq!(err.to_string(), "Missing required column: longitude");
    }

    #[test]
    fn test_upload_missing_display() {
        let err = Error::UploadMissing {
            reason: "No file part",
        };
        assert_eq!(err.to_string(), "No file part");
        assert!(err.is_upload_missing());
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_data_errors() {
        assert!(Error::missing_column("name").is_data_error());
        assert!(Error::EmptyDataset.is_data_error());
        assert!(Error::Coercion {
            row: 1,
            column: "latitude",
            value: "abc".to_string(),
        }
        .is_data_error());
        assert!(Error::MissingValue {
            row: 2,
            column: "description",
        }
        .is_data_error());
        assert!(Error::CoordinateRange {
            row: 1,
            latitude: 91.0,
            longitude: 0.0,
        }
        .is_data_error());
    }

    #[test]
    fn test_non_data_errors() {
        assert!(!Error::internal("boom").is_data_error());
        assert!(!Error::parse("/tmp/x.xlsx", "bad zip").is_data_error());
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!Error::from(io_err).is_data_error());
    }

    #[test]
    fn test_coercion_error_display() {
        let err = Error::Coercion {
            row: 3,
            column: "longitude",
            value: "east".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("longitude"));
        assert!(msg.contains("east"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("/uploads/sites.xlsx", "invalid zip header");
        let msg = err.to_string();
        assert!(msg.contains("/uploads/sites.xlsx"));
        assert!(msg.contains("invalid zip header"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "port must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("port"));
    }
}
