use crate::domain::model::{Axis, Column, CrsKind, Identifier, Role};
use thiserror::Error;

/// Rejection of a catalog file. Always fatal: a catalog is either fully valid or not loaded.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("entry {index}: unknown CRS type '{value}'")]
    UnknownKind { index: usize, value: String },

    #[error("entry {index}: duplicate identifier {id}")]
    DuplicateIdentifier { index: usize, id: Identifier },

    #[error("entry {index}: conversion factor for {id} must be a positive number, got {value}")]
    InvalidConversionFactor {
        index: usize,
        id: Identifier,
        value: f64,
    },

    #[error("entry {index}: CRS {crs} ({kind}) requires a {axis} unit reference")]
    MissingUnitReference {
        index: usize,
        crs: Identifier,
        kind: CrsKind,
        axis: Axis,
    },

    #[error("entry {index}: CRS {crs} references unknown {axis} unit {unit}")]
    UnresolvedUnit {
        index: usize,
        crs: Identifier,
        axis: Axis,
        unit: Identifier,
    },
}

/// Failure of `choose_crs`. The selection state is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("unknown CRS {0}")]
    UnknownCrs(Identifier),

    #[error("CRS {crs} is {kind} and cannot be used for the {role} role")]
    IncompatibleCrsKind {
        role: Role,
        crs: Identifier,
        kind: CrsKind,
    },

    #[error("CRS {crs} references unit {unit}, which is not in the unit catalog")]
    DanglingUnitReference { crs: Identifier, unit: Identifier },

    #[error("CRS {crs} carries no {axis} unit reference")]
    MissingUnitReference { crs: Identifier, axis: Axis },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("no candidate matches '{query}'")]
    NoMatch { query: String },

    #[error("candidate not found")]
    NotFound,
}

/// Error reported by a geodesy provider for a single coordinate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("no transform path from {src} to {dst}")]
    UnsupportedPath { src: Identifier, dst: Identifier },

    #[error("coordinate outside the domain of {crs}: {reason}")]
    OutOfDomain { crs: Identifier, reason: String },
}

/// Per-row failure. Captured in that row's result; the batch continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("column {column}: cannot parse '{value}' as a number")]
    Parse { column: Column, value: String },

    #[error("{axis} transform failed: {source}")]
    Transform {
        axis: Axis,
        #[source]
        source: ProviderError,
    },
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("{role}: {source}")]
    Selector {
        role: Role,
        #[source]
        source: SelectorError,
    },

    #[error("no CRS selected for the {role} role")]
    IncompleteSelection { role: Role },

    #[error("conversion cancelled")]
    Cancelled,

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Catalog,
    Selection,
    Conversion,
    Io,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConvertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::Catalog(_) => ErrorCategory::Catalog,
            ConvertError::Selection(_)
            | ConvertError::Selector { .. }
            | ConvertError::IncompleteSelection { .. } => ErrorCategory::Selection,
            ConvertError::Cancelled | ConvertError::Worker(_) => ErrorCategory::Conversion,
            ConvertError::ZipError(_)
            | ConvertError::CsvError(_)
            | ConvertError::IoError(_)
            | ConvertError::SerializationError(_) => ErrorCategory::Io,
            ConvertError::ConfigError { .. } | ConvertError::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConvertError::Cancelled => ErrorSeverity::Low,
            ConvertError::Selection(_)
            | ConvertError::Selector { .. }
            | ConvertError::IncompleteSelection { .. } => ErrorSeverity::Medium,
            ConvertError::Catalog(_) | ConvertError::Worker(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Catalog => "Fix the offending catalog entry and restart",
            ErrorCategory::Selection => {
                "Check the CRS query for each role with `crs-convert list`"
            }
            ErrorCategory::Conversion => "Re-run the conversion",
            ErrorCategory::Io => "Check that input and output paths exist and are accessible",
            ErrorCategory::Configuration => "Review the configuration file and CLI flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConvertError::Catalog(e) => format!("The CRS/unit catalog could not be loaded: {}", e),
            ConvertError::Cancelled => "The conversion was cancelled; no output was written".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
