use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::catalog::{CatalogStore, FileSwitch, LoadState};
use crate::error::{CatalogError, Result as CatalogResult};
use crate::models::{ConversionEdge, FoodRecord, NewUom, UnitOfMeasure, UomId};
use crate::settings::SettingsStore;

/// Entry point for front ends: the catalog plus the settings that say which file it lives in.
pub struct CalPalService {
    settings: SettingsStore,
    catalog: CatalogStore,
}

impl CalPalService {
    /// Open the settings database and load the remembered catalog, or `default_catalog_path`
    /// when nothing usable is remembered.
    pub fn open(settings_path: &Path, default_catalog_path: &Path) -> Result<Self> {
        let settings = SettingsStore::open(settings_path)?;
        Self::with_settings(settings, default_catalog_path)
    }

    pub fn with_settings(settings: SettingsStore, default_catalog_path: &Path) -> Result<Self> {
        let path = startup_catalog_path(&settings, default_catalog_path)?;
        let catalog = CatalogStore::open(path);
        if let LoadState::Degraded { reason } = catalog.state() {
            warn!(path = %catalog.path().display(), %reason, "catalog loaded in degraded state");
        }
        Ok(Self { settings, catalog })
    }

    // --- Data file ---

    #[must_use]
    pub fn state(&self) -> &LoadState {
        self.catalog.state()
    }

    #[must_use]
    pub fn active_path(&self) -> &Path {
        self.catalog.path()
    }

    /// Switch the active data file and remember it for the next start if accepted.
    pub fn switch_active_file(&mut self, path: &Path) -> Result<FileSwitch> {
        let result = self.catalog.switch_active_file(path);
        if result.accepted {
            self.settings.set_food_data_save_location(path)?;
            info!(path = %path.display(), "remembered data file location");
        }
        Ok(result)
    }

    pub fn export_snapshot_as_text(&self) -> CatalogResult<String> {
        self.catalog.export_snapshot_as_text()
    }

    // --- Foods ---

    #[must_use]
    pub fn find_by_barcode(&self, barcode: &str) -> Option<&FoodRecord> {
        self.catalog.find_by_barcode(barcode)
    }

    #[must_use]
    pub fn list_foods(&self) -> Vec<&FoodRecord> {
        self.catalog.foods().collect()
    }

    #[must_use]
    pub fn brands(&self) -> Vec<String> {
        self.catalog.brands()
    }

    pub fn add_food(&mut self, food: FoodRecord) -> CatalogResult<bool> {
        self.catalog.add_food(food)
    }

    pub fn update_food(&mut self, food: FoodRecord) -> CatalogResult<bool> {
        self.catalog.update_food(food)
    }

    pub fn remove_food(&mut self, barcode: &str) -> CatalogResult<Option<FoodRecord>> {
        self.catalog.remove_food(barcode)
    }

    // --- Units ---

    #[must_use]
    pub fn list_uoms(&self) -> Vec<&UnitOfMeasure> {
        self.catalog.uoms().iter().collect()
    }

    #[must_use]
    pub fn find_uom_by_name(&self, name: &str) -> Option<&UnitOfMeasure> {
        self.catalog.find_uom_by_name(name)
    }

    #[must_use]
    pub fn find_uom_by_code(&self, code: &str) -> Option<&UnitOfMeasure> {
        self.catalog.find_uom_by_code(code)
    }

    #[must_use]
    pub fn find_uom_by_id(&self, id: UomId) -> Option<&UnitOfMeasure> {
        self.catalog.uoms().find_by_id(id)
    }

    /// Resolve a unit typed by a user: code first, then name.
    pub fn resolve_uom(&self, key: &str) -> CatalogResult<&UnitOfMeasure> {
        self.find_uom_by_code(key)
            .or_else(|| self.find_uom_by_name(key))
            .ok_or_else(|| CatalogError::UnknownUom(key.to_string()))
    }

    pub fn add_uom(&mut self, uom: NewUom) -> CatalogResult<UomId> {
        self.catalog.add_uom(uom)
    }

    pub fn remove_uom(&mut self, id: UomId) -> CatalogResult<UnitOfMeasure> {
        self.catalog.remove_uom(id)
    }

    pub fn deactivate_uom(&mut self, id: UomId) -> CatalogResult<()> {
        self.catalog.deactivate_uom(id)
    }

    // --- Conversions ---

    #[must_use]
    pub fn list_conversions(&self) -> Vec<&ConversionEdge> {
        self.catalog.uoms().conversions().edges()
    }

    pub fn add_conversion(
        &mut self,
        from: UomId,
        to: UomId,
        factor: f64,
        multiply: f64,
        description: Option<String>,
    ) -> CatalogResult<ConversionEdge> {
        self.catalog
            .add_conversion(from, to, factor, multiply, description)
    }

    pub fn remove_conversion(&mut self, from: UomId, to: UomId) -> CatalogResult<bool> {
        self.catalog.remove_conversion(from, to)
    }

    pub fn convert(&self, from: UomId, to: UomId, value: f64) -> CatalogResult<f64> {
        self.catalog.convert(from, to, value)
    }
}

/// The remembered catalog path if it is set and still exists, else the default.
fn startup_catalog_path(settings: &SettingsStore, default_path: &Path) -> Result<PathBuf> {
    match settings.food_data_save_location()? {
        Some(saved) if saved.exists() => Ok(saved),
        Some(saved) => {
            warn!(path = %saved.display(), "remembered data file is gone, using default");
            Ok(default_path.to_path_buf())
        }
        None => Ok(default_path.to_path_buf()),
    }
}
