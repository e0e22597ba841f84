use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// The physical dimension a unit measures. Conversions only exist within one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityKind {
    Count,
    Weight,
    Length,
    Area,
    Volume,
    Time,
    Current,
    Resistance,
}

impl QuantityKind {
    pub const ALL: [QuantityKind; 8] = [
        QuantityKind::Count,
        QuantityKind::Weight,
        QuantityKind::Length,
        QuantityKind::Area,
        QuantityKind::Volume,
        QuantityKind::Time,
        QuantityKind::Current,
        QuantityKind::Resistance,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuantityKind::Count => "Count",
            QuantityKind::Weight => "Weight",
            QuantityKind::Length => "Length",
            QuantityKind::Area => "Area",
            QuantityKind::Volume => "Volume",
            QuantityKind::Time => "Time",
            QuantityKind::Current => "Current",
            QuantityKind::Resistance => "Resistance",
        }
    }

    /// Case-insensitive parse of a kind name.
    pub fn parse(s: &str) -> Result<Self> {
        QuantityKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = QuantityKind::ALL.iter().map(|k| k.as_str()).collect();
                CatalogError::Validation(format!(
                    "Invalid quantity kind '{s}'. Must be one of: {}",
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds a food's serving size may be expressed in.
pub const SERVING_KINDS: &[QuantityKind] = &[QuantityKind::Count, QuantityKind::Weight];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UomId(pub u32);

impl fmt::Display for UomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOfMeasure {
    pub id: UomId,
    pub name: String,
    pub code: String,
    pub description: String,
    pub quantity_kind: QuantityKind,
    pub read_only: bool,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct NewUom {
    pub name: String,
    pub code: String,
    pub description: String,
    pub quantity_kind: QuantityKind,
    pub read_only: bool,
}

impl NewUom {
    #[must_use]
    pub fn new(name: &str, code: &str, quantity_kind: QuantityKind) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            description: String::new(),
            quantity_kind,
            read_only: false,
        }
    }
}

pub fn validate_new_uom(uom: &NewUom) -> Result<()> {
    if uom.name.trim().is_empty() {
        return Err(CatalogError::Validation("UOM name must not be empty".into()));
    }
    if uom.code.trim().is_empty() {
        return Err(CatalogError::Validation("UOM code must not be empty".into()));
    }
    Ok(())
}

/// A directed conversion rule: `convert(v) = v * multiply / factor`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionEdge {
    pub from: UomId,
    pub to: UomId,
    pub factor: f64,
    pub multiply: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConversionEdge {
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.multiply / self.factor
    }
}

/// Factors and multipliers must be finite and strictly positive.
pub fn validate_conversion_factors(factor: f64, multiply: f64) -> Result<()> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(CatalogError::Validation(format!(
            "Conversion factor must be greater than 0 (got {factor})"
        )));
    }
    if !multiply.is_finite() || multiply <= 0.0 {
        return Err(CatalogError::Validation(format!(
            "Conversion multiplier must be greater than 0 (got {multiply})"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodRecord {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub detailed_description: String,
    pub calories_per_serving: f64,
    pub serving_size: f64,
    pub serving_size_uom_id: UomId,
}

#[derive(Debug, Clone)]
pub struct NewFood {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub detailed_description: String,
    pub calories_per_serving: f64,
    pub serving_size: f64,
}

impl FoodRecord {
    /// Build a record whose serving size is expressed in `serving_uom`.
    pub fn new(food: NewFood, serving_uom: &UnitOfMeasure) -> Result<Self> {
        let record = FoodRecord {
            barcode: food.barcode.trim().to_string(),
            name: food.name,
            brand: food.brand,
            description: food.description,
            detailed_description: food.detailed_description,
            calories_per_serving: food.calories_per_serving,
            serving_size: food.serving_size,
            serving_size_uom_id: serving_uom.id,
        };
        validate_food_record(&record, serving_uom)?;
        Ok(record)
    }
}

pub fn validate_serving_uom(uom: &UnitOfMeasure) -> Result<()> {
    if SERVING_KINDS.contains(&uom.quantity_kind) {
        return Ok(());
    }
    let names: Vec<&str> = SERVING_KINDS.iter().map(|k| k.as_str()).collect();
    Err(CatalogError::Validation(format!(
        "'{}' is a {} unit; serving sizes must use one of: {}",
        uom.name,
        uom.quantity_kind,
        names.join(", ")
    )))
}

/// Validate a food record against the unit its serving size is expressed in.
pub fn validate_food_record(food: &FoodRecord, serving_uom: &UnitOfMeasure) -> Result<()> {
    if food.barcode.trim().is_empty() {
        return Err(CatalogError::Validation("Barcode must not be empty".into()));
    }
    if food.serving_size_uom_id != serving_uom.id {
        return Err(CatalogError::Validation(format!(
            "Serving UOM id {} does not match '{}'",
            food.serving_size_uom_id, serving_uom.name
        )));
    }
    validate_serving_uom(serving_uom)?;
    if !food.serving_size.is_finite() || food.serving_size <= 0.0 {
        return Err(CatalogError::Validation(
            "servingSize must be greater than 0".into(),
        ));
    }
    if !food.calories_per_serving.is_finite() || food.calories_per_serving < 0.0 {
        return Err(CatalogError::Validation(
            "caloriesPerServing must not be negative".into(),
        ));
    }
    Ok(())
}

/// Distinct brands in first-seen order.
pub fn brands_distinct<'a, I>(foods: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a FoodRecord>,
{
    let mut seen = HashSet::new();
    let mut brands = Vec::new();
    for food in foods {
        if seen.insert(food.brand.as_str()) {
            brands.push(food.brand.clone());
        }
    }
    brands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uom(id: u32, name: &str, kind: QuantityKind) -> UnitOfMeasure {
        UnitOfMeasure {
            id: UomId(id),
            name: name.to_string(),
            code: name.to_lowercase(),
            description: String::new(),
            quantity_kind: kind,
            read_only: false,
            active: true,
        }
    }

    fn sample_food(barcode: &str, brand: &str) -> NewFood {
        NewFood {
            barcode: barcode.to_string(),
            name: "Peanut Butter".to_string(),
            brand: brand.to_string(),
            description: "Creamy".to_string(),
            detailed_description: "Creamy peanut butter, no salt".to_string(),
            calories_per_serving: 190.0,
            serving_size: 32.0,
        }
    }

    #[test]
    fn test_quantity_kind_parse() {
        assert_eq!(QuantityKind::parse("weight").unwrap(), QuantityKind::Weight);
        assert_eq!(QuantityKind::parse(" Volume ").unwrap(), QuantityKind::Volume);
        assert!(QuantityKind::parse("mass").is_err());
    }

    #[test]
    fn test_quantity_kind_serializes_as_name() {
        let json = serde_json::to_string(&QuantityKind::Resistance).unwrap();
        assert_eq!(json, "\"Resistance\"");
    }

    #[test]
    fn test_edge_apply() {
        let edge = ConversionEdge {
            from: UomId(0),
            to: UomId(1),
            factor: 1.0,
            multiply: 453.592_37,
            description: None,
        };
        assert!((edge.apply(2.0) - 907.184_74).abs() < 1e-9);
    }

    #[test]
    fn test_validate_conversion_factors() {
        assert!(validate_conversion_factors(1.0, 16.0).is_ok());
        assert!(validate_conversion_factors(0.0, 16.0).is_err());
        assert!(validate_conversion_factors(1.0, -2.0).is_err());
        assert!(validate_conversion_factors(f64::NAN, 1.0).is_err());
        assert!(validate_conversion_factors(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_food_with_weight_uom() {
        let grams = uom(0, "Grams", QuantityKind::Weight);
        let food = FoodRecord::new(sample_food(" 041271025903 ", "Acme"), &grams).unwrap();
        assert_eq!(food.barcode, "041271025903");
        assert_eq!(food.serving_size_uom_id, grams.id);
    }

    #[test]
    fn test_food_with_count_uom() {
        let each = uom(3, "Each", QuantityKind::Count);
        assert!(FoodRecord::new(sample_food("1", "Acme"), &each).is_ok());
    }

    #[test]
    fn test_food_with_volume_uom_rejected() {
        let liter = uom(2, "Liter", QuantityKind::Volume);
        let err = FoodRecord::new(sample_food("1", "Acme"), &liter).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_food_blank_barcode_rejected() {
        let grams = uom(0, "Grams", QuantityKind::Weight);
        assert!(FoodRecord::new(sample_food("   ", "Acme"), &grams).is_err());
    }

    #[test]
    fn test_food_bad_numbers_rejected() {
        let grams = uom(0, "Grams", QuantityKind::Weight);

        let mut zero_serving = sample_food("1", "Acme");
        zero_serving.serving_size = 0.0;
        assert!(FoodRecord::new(zero_serving, &grams).is_err());

        let mut negative_calories = sample_food("1", "Acme");
        negative_calories.calories_per_serving = -5.0;
        assert!(FoodRecord::new(negative_calories, &grams).is_err());
    }

    #[test]
    fn test_brands_distinct_keeps_first_seen_order() {
        let grams = uom(0, "Grams", QuantityKind::Weight);
        let foods: Vec<FoodRecord> = [("1", "Jif"), ("2", "Skippy"), ("3", "Jif"), ("4", "Acme")]
            .iter()
            .map(|(b, brand)| FoodRecord::new(sample_food(b, brand), &grams).unwrap())
            .collect();
        assert_eq!(brands_distinct(&foods), vec!["Jif", "Skippy", "Acme"]);
    }

    #[test]
    fn test_validate_new_uom() {
        assert!(validate_new_uom(&NewUom::new("Cup", "c", QuantityKind::Volume)).is_ok());
        assert!(validate_new_uom(&NewUom::new("", "c", QuantityKind::Volume)).is_err());
        assert!(validate_new_uom(&NewUom::new("Cup", " ", QuantityKind::Volume)).is_err());
    }
}
