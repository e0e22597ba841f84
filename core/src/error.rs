use std::path::PathBuf;

use thiserror::Error;

use crate::models::QuantityKind;

/// Errors raised by the catalog, the unit registry, and the conversion graph.
///
/// Load failures are not represented here: a missing or corrupt data file is
/// recovered in place and reported through `LoadState::Degraded`.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("A UOM with name '{name}' or code '{code}' already exists")]
    DuplicateUom { name: String, code: String },

    #[error("Incompatible units: '{from}' is {from_kind}, '{to}' is {to_kind}")]
    IncompatibleUnits {
        from: String,
        to: String,
        from_kind: QuantityKind,
        to_kind: QuantityKind,
    },

    #[error("Unknown conversion from '{from}' to '{to}'")]
    UnknownConversion { from: String, to: String },

    #[error("UOM '{0}' is still referenced: {1}")]
    ReferentialIntegrity(String, String),

    #[error("Unknown UOM '{0}'")]
    UnknownUom(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Failed to save catalog to {}: {message}", path.display())]
    Persist { path: PathBuf, message: String },
}

impl CatalogError {
    pub(crate) fn persist(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        CatalogError::Persist {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

/// Why a catalog file could not be turned into a catalog. Never escapes `CatalogStore::load`;
/// it becomes the reason carried by `LoadState::Degraded`.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid catalog contents: {0}")]
    Invalid(#[from] CatalogError),
}
