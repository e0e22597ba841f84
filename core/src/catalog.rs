use std::collections::BTreeMap;
use std::io::Write;
use std::mem;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result, SnapshotError};
use crate::models::{
    ConversionEdge, FoodRecord, NewUom, UnitOfMeasure, UomId, brands_distinct,
    validate_food_record,
};
use crate::snapshot::{capture, default_snapshot, hydrate, read_snapshot, to_pretty_json};
use crate::uom::UomRegistry;

/// How the active data file was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadState {
    Unloaded,
    Ok,
    /// The file was missing or unreadable and the built-in default catalog is in use.
    Degraded { reason: String },
}

impl LoadState {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, LoadState::Ok)
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, LoadState::Degraded { .. })
    }
}

/// Outcome of `CatalogStore::switch_active_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSwitch {
    pub accepted: bool,
    pub message: String,
}

/// The durable food catalog: units, conversions, and food records keyed by barcode,
/// bound to one active JSON data file.
///
/// Every successful mutation re-writes the whole file. A failed write is reported as
/// `CatalogError::Persist`; the in-memory change is kept.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    state: LoadState,
    uoms: UomRegistry,
    foods: BTreeMap<String, FoodRecord>,
    /// Barcodes in the order their records were first added.
    added_order: Vec<String>,
}

impl CatalogStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: LoadState::Unloaded,
            uoms: UomRegistry::new(),
            foods: BTreeMap::new(),
            added_order: Vec::new(),
        }
    }

    /// Create a store bound to `path` and load it.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        let path = store.path.clone();
        store.load(&path);
        store
    }

    /// Make `path` the active file and load it. Missing or corrupt files are replaced
    /// in memory by the default catalog and the state becomes `Degraded`.
    pub fn load(&mut self, path: &Path) -> &LoadState {
        self.path = path.to_path_buf();

        let loaded =
            read_snapshot(path).and_then(|snapshot| hydrate(snapshot).map_err(SnapshotError::from));
        match loaded {
            Ok((uoms, foods)) => {
                info!(path = %path.display(), uoms = uoms.len(), foods = foods.len(), "loaded catalog");
                self.uoms = uoms;
                self.added_order = foods.keys().cloned().collect();
                self.foods = foods;
                self.state = LoadState::Ok;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "using default catalog");
                let (uoms, foods) = hydrate(default_snapshot()).unwrap_or_default();
                self.uoms = uoms;
                self.added_order = foods.keys().cloned().collect();
                self.foods = foods;
                self.state = LoadState::Degraded {
                    reason: err.to_string(),
                };
            }
        }
        &self.state
    }

    /// Atomically write the full catalog to the active path.
    pub fn persist(&self) -> Result<()> {
        let text = self.snapshot_text(false)?;
        write_atomic(&self.path, text.as_bytes())
            .map_err(|e| CatalogError::persist(&self.path, e))?;
        debug!(path = %self.path.display(), "saved catalog");
        Ok(())
    }

    /// Switch to another data file. A healthy catalog is never swapped for one that
    /// fails to load: in that case the previous file, path, and contents stay active.
    pub fn switch_active_file(&mut self, new_path: &Path) -> FileSwitch {
        if !new_path.exists() {
            return FileSwitch {
                accepted: false,
                message: CatalogError::PathNotFound(new_path.to_path_buf()).to_string(),
            };
        }

        let was_ok = self.state.is_ok();
        let previous_path = self.path.clone();
        let previous_state = self.state.clone();
        let previous_uoms = mem::take(&mut self.uoms);
        let previous_foods = mem::take(&mut self.foods);
        let previous_order = mem::take(&mut self.added_order);

        self.load(new_path);

        let rejected = match &self.state {
            LoadState::Degraded { reason } if was_ok => Some(reason.clone()),
            _ => None,
        };
        if let Some(reason) = rejected {
            let message = format!("New data file failed to load: {reason}");
            warn!(path = %new_path.display(), %reason, "rejected data file switch");
            self.path = previous_path;
            self.state = previous_state;
            self.uoms = previous_uoms;
            self.foods = previous_foods;
            self.added_order = previous_order;
            return FileSwitch {
                accepted: false,
                message,
            };
        }

        info!(path = %new_path.display(), "switched data file");
        FileSwitch {
            accepted: true,
            message: "Data file changed and reloaded successfully.".to_string(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    #[must_use]
    pub fn uoms(&self) -> &UomRegistry {
        &self.uoms
    }

    #[must_use]
    pub fn find_by_barcode(&self, barcode: &str) -> Option<&FoodRecord> {
        self.foods.get(barcode)
    }

    /// Food records ordered by barcode.
    pub fn foods(&self) -> impl Iterator<Item = &FoodRecord> {
        self.foods.values()
    }

    #[must_use]
    /// Distinct brands in the order their first record was added.
    pub fn brands(&self) -> Vec<String> {
        brands_distinct(self.added_order.iter().filter_map(|b| self.foods.get(b)))
    }

    #[must_use]
    pub fn find_uom_by_name(&self, name: &str) -> Option<&UnitOfMeasure> {
        self.uoms.find_by_name(name)
    }

    #[must_use]
    pub fn find_uom_by_code(&self, code: &str) -> Option<&UnitOfMeasure> {
        self.uoms.find_by_code(code)
    }

    pub fn convert(&self, from: UomId, to: UomId, value: f64) -> Result<f64> {
        self.uoms.convert(from, to, value)
    }

    /// The catalog as the pretty JSON written to disk, with barcodes kept in each
    /// record body so the text stands on its own.
    pub fn export_snapshot_as_text(&self) -> Result<String> {
        self.snapshot_text(true)
    }

    // --- Food mutators ---

    /// Insert a food. An existing barcode is left untouched and `Ok(false)` is returned
    /// without looking at the incoming record.
    pub fn add_food(&mut self, food: FoodRecord) -> Result<bool> {
        let inserted = if self.foods.contains_key(&food.barcode) {
            debug!(barcode = %food.barcode, "food already exists, not overwriting");
            false
        } else {
            self.validate_food(&food)?;
            self.added_order.push(food.barcode.clone());
            self.foods.insert(food.barcode.clone(), food);
            true
        };
        self.persist()?;
        Ok(inserted)
    }

    /// Replace the food with the same barcode, inserting it if absent.
    /// Returns true when an existing record was replaced.
    pub fn update_food(&mut self, food: FoodRecord) -> Result<bool> {
        if !self.foods.contains_key(&food.barcode) {
            self.add_food(food)?;
            return Ok(false);
        }
        self.validate_food(&food)?;
        self.foods.insert(food.barcode.clone(), food);
        self.persist()?;
        Ok(true)
    }

    pub fn remove_food(&mut self, barcode: &str) -> Result<Option<FoodRecord>> {
        let removed = self.foods.remove(barcode);
        if removed.is_some() {
            self.added_order.retain(|b| b != barcode);
        }
        self.persist()?;
        Ok(removed)
    }

    // --- UOM mutators ---

    pub fn add_uom(&mut self, uom: NewUom) -> Result<UomId> {
        let id = self.uoms.add(uom)?;
        self.persist()?;
        Ok(id)
    }

    /// Physically remove a unit. Fails while any food or another unit's conversion
    /// references it.
    pub fn remove_uom(&mut self, id: UomId) -> Result<UnitOfMeasure> {
        let name = self
            .uoms
            .find_by_id(id)
            .map(|u| u.name.clone())
            .ok_or_else(|| CatalogError::UnknownUom(id.to_string()))?;
        let in_use = self
            .foods
            .values()
            .filter(|f| f.serving_size_uom_id == id)
            .count();
        if in_use > 0 {
            return Err(CatalogError::ReferentialIntegrity(
                name,
                format!("{in_use} food(s) use it as their serving unit"),
            ));
        }
        let removed = self.uoms.remove(id)?;
        self.persist()?;
        Ok(removed)
    }

    pub fn deactivate_uom(&mut self, id: UomId) -> Result<()> {
        self.uoms.deactivate(id)?;
        self.persist()
    }

    /// Register a conversion edge. An existing `from -> to` edge is returned as-is.
    pub fn add_conversion(
        &mut self,
        from: UomId,
        to: UomId,
        factor: f64,
        multiply: f64,
        description: Option<String>,
    ) -> Result<ConversionEdge> {
        let edge = self
            .uoms
            .add_conversion(from, to, factor, multiply, description)?
            .clone();
        self.persist()?;
        Ok(edge)
    }

    pub fn remove_conversion(&mut self, from: UomId, to: UomId) -> Result<bool> {
        let removed = self.uoms.remove_conversion(from, to)?;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn validate_food(&self, food: &FoodRecord) -> Result<()> {
        let uom = self
            .uoms
            .find_by_id(food.serving_size_uom_id)
            .ok_or_else(|| CatalogError::UnknownUom(food.serving_size_uom_id.to_string()))?;
        validate_food_record(food, uom)
    }

    fn snapshot_text(&self, keep_barcode: bool) -> Result<String> {
        to_pretty_json(&capture(&self.uoms, &self.foods, keep_barcode))
            .map_err(|e| CatalogError::persist(&self.path, e))
    }
}

/// Write through a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
