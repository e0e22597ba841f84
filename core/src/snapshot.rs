//! On-disk JSON image of a catalog.
//!
//! ```json
//! {
//!     "servingUoms": [ { "name": "Grams", "code": "g", "quantityKind": "Weight" } ],
//!     "conversions": [ { "from": "lbs", "to": "g", "factor": 1.0, "multiply": 453.59237 } ],
//!     "foodData": {
//!         "<barcode>": {
//!             "description": "...", "detailedDescription": "...",
//!             "caloriesPerServing": 170.0, "servingSize": 28.0,
//!             "servingSizeUom": { "name": "Grams", "code": "g" }
//!         }
//!     }
//! }
//! ```
//!
//! The barcode is the `foodData` key and is left out of the record body on write.
//! Unknown fields are rejected everywhere; `conversions`, the UOM metadata fields,
//! and food `name`/`brand` are optional.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, SnapshotError};
use crate::models::{FoodRecord, NewUom, QuantityKind, validate_food_record};
use crate::uom::UomRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SnapshotFile {
    pub serving_uoms: Vec<UomEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversions: Vec<ConversionEntry>,
    pub food_data: BTreeMap<String, FoodEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UomEntry {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    // Files written before units carried a kind only ever held weights.
    #[serde(default = "default_quantity_kind")]
    pub quantity_kind: QuantityKind,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionEntry {
    pub from: String,
    pub to: String,
    pub factor: f64,
    pub multiply: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FoodEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub brand: String,
    pub description: String,
    pub detailed_description: String,
    pub calories_per_serving: f64,
    pub serving_size: f64,
    pub serving_size_uom: ServingUomRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServingUomRef {
    pub name: String,
    pub code: String,
}

fn default_quantity_kind() -> QuantityKind {
    QuantityKind::Weight
}

fn default_active() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_true(v: &bool) -> bool {
    *v
}

/// The catalog substituted when the data file is missing or unreadable.
#[must_use]
pub fn default_snapshot() -> SnapshotFile {
    let uom = |name: &str, code: &str| UomEntry {
        name: name.to_string(),
        code: code.to_string(),
        description: String::new(),
        quantity_kind: QuantityKind::Weight,
        read_only: false,
        active: true,
    };
    SnapshotFile {
        serving_uoms: vec![
            uom("Grams", "g"),
            uom("Pounds", "lbs"),
            uom("Ounce", "oz"),
        ],
        conversions: Vec::new(),
        food_data: BTreeMap::new(),
    }
}

pub fn read_snapshot(path: &Path) -> Result<SnapshotFile, SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::Missing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Pretty JSON with four-space indentation, the format written to disk.
pub fn to_pretty_json(snapshot: &SnapshotFile) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Build the in-memory catalog a snapshot describes.
///
/// Every rule the live catalog enforces is re-checked here, so a file that breaks
/// one (duplicate units, cross-kind edges, foods in volume units, ...) is rejected whole.
pub fn hydrate(
    snapshot: SnapshotFile,
) -> Result<(UomRegistry, BTreeMap<String, FoodRecord>), CatalogError> {
    if snapshot.serving_uoms.is_empty() {
        return Err(CatalogError::Validation(
            "servingUoms must contain at least one unit".into(),
        ));
    }

    let mut registry = UomRegistry::new();
    for entry in snapshot.serving_uoms {
        let id = registry.add(NewUom {
            name: entry.name,
            code: entry.code,
            description: entry.description,
            quantity_kind: entry.quantity_kind,
            read_only: entry.read_only,
        })?;
        if !entry.active {
            // The file is authoritative, including for read-only units.
            registry.set_active(id, false);
        }
    }

    for conv in snapshot.conversions {
        let from = resolve_code(&registry, &conv.from)?;
        let to = resolve_code(&registry, &conv.to)?;
        registry.add_conversion(from, to, conv.factor, conv.multiply, conv.description)?;
    }

    let mut foods = BTreeMap::new();
    for (barcode, entry) in snapshot.food_data {
        let uom = registry
            .find_by_name(&entry.serving_size_uom.name)
            .or_else(|| registry.find_by_code(&entry.serving_size_uom.code))
            .ok_or_else(|| CatalogError::UnknownUom(entry.serving_size_uom.name.clone()))?;
        // The map key is the authoritative barcode.
        let food = FoodRecord {
            barcode: barcode.clone(),
            name: entry.name,
            brand: entry.brand,
            description: entry.description,
            detailed_description: entry.detailed_description,
            calories_per_serving: entry.calories_per_serving,
            serving_size: entry.serving_size,
            serving_size_uom_id: uom.id,
        };
        validate_food_record(&food, uom)?;
        foods.insert(barcode, food);
    }

    Ok((registry, foods))
}

/// Capture the full catalog as a snapshot. With `keep_barcode` the barcode is also
/// written inside each record body, for display.
#[must_use]
pub fn capture(
    registry: &UomRegistry,
    foods: &BTreeMap<String, FoodRecord>,
    keep_barcode: bool,
) -> SnapshotFile {
    let serving_uoms = registry
        .iter()
        .map(|u| UomEntry {
            name: u.name.clone(),
            code: u.code.clone(),
            description: u.description.clone(),
            quantity_kind: u.quantity_kind,
            read_only: u.read_only,
            active: u.active,
        })
        .collect();

    let conversions = registry
        .conversions()
        .edges()
        .into_iter()
        .filter_map(|edge| {
            let from = registry.find_by_id(edge.from)?;
            let to = registry.find_by_id(edge.to)?;
            Some(ConversionEntry {
                from: from.code.clone(),
                to: to.code.clone(),
                factor: edge.factor,
                multiply: edge.multiply,
                description: edge.description.clone(),
            })
        })
        .collect();

    let food_data = foods
        .iter()
        .filter_map(|(barcode, food)| {
            let uom = registry.find_by_id(food.serving_size_uom_id)?;
            Some((
                barcode.clone(),
                FoodEntry {
                    barcode: keep_barcode.then(|| barcode.clone()),
                    name: food.name.clone(),
                    brand: food.brand.clone(),
                    description: food.description.clone(),
                    detailed_description: food.detailed_description.clone(),
                    calories_per_serving: food.calories_per_serving,
                    serving_size: food.serving_size,
                    serving_size_uom: ServingUomRef {
                        name: uom.name.clone(),
                        code: uom.code.clone(),
                    },
                },
            ))
        })
        .collect();

    SnapshotFile {
        serving_uoms,
        conversions,
        food_data,
    }
}

fn resolve_code(
    registry: &UomRegistry,
    code: &str,
) -> Result<crate::models::UomId, CatalogError> {
    registry
        .find_by_code(code)
        .map(|u| u.id)
        .ok_or_else(|| CatalogError::UnknownUom(code.to_string()))
}
