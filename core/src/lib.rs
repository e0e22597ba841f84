pub mod catalog;
pub mod conversion;
pub mod error;
pub mod models;
pub mod service;
pub mod settings;
pub mod snapshot;
pub mod uom;

pub use catalog::{CatalogStore, FileSwitch, LoadState};
pub use error::{CatalogError, SnapshotError};
pub use service::CalPalService;
