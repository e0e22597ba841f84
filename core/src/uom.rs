use std::collections::{BTreeMap, HashMap};

use tracing::info;

use crate::conversion::ConversionGraph;
use crate::error::{CatalogError, Result};
use crate::models::{ConversionEdge, NewUom, UnitOfMeasure, UomId, validate_new_uom};

/// Units of measure indexed by id, name, and code, plus the conversion edges between them.
///
/// Names and codes are unique and matched exactly (case-sensitive).
#[derive(Debug, Clone, Default)]
pub struct UomRegistry {
    uoms: BTreeMap<UomId, UnitOfMeasure>,
    by_name: HashMap<String, UomId>,
    by_code: HashMap<String, UomId>,
    conversions: ConversionGraph,
    next_id: u32,
}

impl UomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, uom: NewUom) -> Result<UomId> {
        validate_new_uom(&uom)?;
        if self.by_name.contains_key(&uom.name) || self.by_code.contains_key(&uom.code) {
            return Err(CatalogError::DuplicateUom {
                name: uom.name,
                code: uom.code,
            });
        }

        let id = UomId(self.next_id);
        self.next_id += 1;
        self.by_name.insert(uom.name.clone(), id);
        self.by_code.insert(uom.code.clone(), id);
        self.uoms.insert(
            id,
            UnitOfMeasure {
                id,
                name: uom.name,
                code: uom.code,
                description: uom.description,
                quantity_kind: uom.quantity_kind,
                read_only: uom.read_only,
                active: true,
            },
        );
        Ok(id)
    }

    #[must_use]
    pub fn find_by_id(&self, id: UomId) -> Option<&UnitOfMeasure> {
        self.uoms.get(&id)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&UnitOfMeasure> {
        self.by_name.get(name).and_then(|id| self.uoms.get(id))
    }

    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&UnitOfMeasure> {
        self.by_code.get(code).and_then(|id| self.uoms.get(id))
    }

    /// Units in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitOfMeasure> {
        self.uoms.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.uoms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uoms.is_empty()
    }

    #[must_use]
    pub fn conversions(&self) -> &ConversionGraph {
        &self.conversions
    }

    pub fn add_conversion(
        &mut self,
        from: UomId,
        to: UomId,
        factor: f64,
        multiply: f64,
        description: Option<String>,
    ) -> Result<&ConversionEdge> {
        let from = lookup(&self.uoms, from)?;
        let to = lookup(&self.uoms, to)?;
        self.conversions
            .add_conversion(from, to, factor, multiply, description)
    }

    /// Remove the `from -> to` edge. Returns false if no such edge was registered.
    pub fn remove_conversion(&mut self, from: UomId, to: UomId) -> Result<bool> {
        let owner = lookup(&self.uoms, from)?;
        let Some(edge) = self.conversions.edge(from, to).cloned() else {
            return Ok(false);
        };
        Ok(self.conversions.remove_conversion(owner, &edge))
    }

    pub fn convert(&self, from: UomId, to: UomId, value: f64) -> Result<f64> {
        let from = lookup(&self.uoms, from)?;
        let to = lookup(&self.uoms, to)?;
        self.conversions.convert(from, to, value)
    }

    /// Physically remove a unit together with the edges it owns.
    ///
    /// Callers must check food references first; this only guards edges owned by
    /// other units and read-only units.
    pub fn remove(&mut self, id: UomId) -> Result<UnitOfMeasure> {
        let uom = lookup(&self.uoms, id)?;
        if uom.read_only {
            return Err(CatalogError::Validation(format!(
                "'{}' is read-only and cannot be removed",
                uom.name
            )));
        }
        if self.conversions.has_incoming(id) {
            return Err(CatalogError::ReferentialIntegrity(
                uom.name.clone(),
                "conversions from other units target it".into(),
            ));
        }

        let dropped = self.conversions.remove_owned_by(id);
        let Some(uom) = self.uoms.remove(&id) else {
            return Err(CatalogError::UnknownUom(id.to_string()));
        };
        self.by_name.remove(&uom.name);
        self.by_code.remove(&uom.code);
        info!(name = %uom.name, dropped_conversions = dropped, "removed UOM");
        Ok(uom)
    }

    pub fn deactivate(&mut self, id: UomId) -> Result<()> {
        let uom = self
            .uoms
            .get_mut(&id)
            .ok_or_else(|| CatalogError::UnknownUom(id.to_string()))?;
        if uom.read_only {
            return Err(CatalogError::Validation(format!(
                "'{}' is read-only and cannot be deactivated",
                uom.name
            )));
        }
        uom.active = false;
        Ok(())
    }

    pub(crate) fn set_active(&mut self, id: UomId, active: bool) {
        if let Some(uom) = self.uoms.get_mut(&id) {
            uom.active = active;
        }
    }
}

fn lookup(uoms: &BTreeMap<UomId, UnitOfMeasure>, id: UomId) -> Result<&UnitOfMeasure> {
    uoms.get(&id)
        .ok_or_else(|| CatalogError::UnknownUom(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuantityKind;

    fn weights() -> (UomRegistry, UomId, UomId, UomId) {
        let mut reg = UomRegistry::new();
        let lbs = reg
            .add(NewUom::new("Pound", "lbs", QuantityKind::Weight))
            .unwrap();
        let g = reg.add(NewUom::new("Gram", "g", QuantityKind::Weight)).unwrap();
        let oz = reg
            .add(NewUom::new("Ounce", "oz", QuantityKind::Weight))
            .unwrap();
        (reg, lbs, g, oz)
    }

    #[test]
    fn test_add_and_find() {
        let (reg, lbs, g, _) = weights();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.find_by_name("Pound").unwrap().id, lbs);
        assert_eq!(reg.find_by_code("g").unwrap().id, g);
        assert_eq!(reg.find_by_id(g).unwrap().name, "Gram");
        assert!(reg.find_by_id(g).unwrap().active);
    }

    #[test]
    fn test_lookups_are_case_sensitive() {
        let (reg, ..) = weights();
        assert!(reg.find_by_name("pound").is_none());
        assert!(reg.find_by_code("G").is_none());
        assert!(reg.find_by_id(UomId(99)).is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (mut reg, ..) = weights();
        let err = reg
            .add(NewUom::new("Pound", "lb", QuantityKind::Weight))
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateUom { .. }));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let (mut reg, ..) = weights();
        let err = reg
            .add(NewUom::new("Grams", "g", QuantityKind::Weight))
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateUom { .. }));
    }

    #[test]
    fn test_iter_in_registration_order() {
        let (reg, ..) = weights();
        let names: Vec<&str> = reg.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Pound", "Gram", "Ounce"]);
    }

    #[test]
    fn test_convert_through_registry() {
        let (mut reg, lbs, g, _) = weights();
        reg.add_conversion(lbs, g, 1.0, 453.592_37, None).unwrap();
        let v = reg.convert(lbs, g, 2.0).unwrap();
        assert!((v - 907.184_74).abs() < 1e-9);
        assert!(matches!(
            reg.convert(lbs, UomId(42), 1.0).unwrap_err(),
            CatalogError::UnknownUom(_)
        ));
    }

    #[test]
    fn test_remove_conversion_through_registry() {
        let (mut reg, lbs, g, oz) = weights();
        reg.add_conversion(lbs, g, 1.0, 453.592_37, None).unwrap();
        assert!(!reg.remove_conversion(lbs, oz).unwrap());
        assert!(reg.remove_conversion(lbs, g).unwrap());
        assert!(reg.conversions().is_empty());
    }

    #[test]
    fn test_remove_blocked_by_incoming_edge() {
        let (mut reg, lbs, g, _) = weights();
        reg.add_conversion(lbs, g, 1.0, 453.592_37, None).unwrap();
        let err = reg.remove(g).unwrap_err();
        assert!(matches!(err, CatalogError::ReferentialIntegrity(..)));
        assert!(reg.find_by_name("Gram").is_some());
    }

    #[test]
    fn test_remove_drops_owned_edges() {
        let (mut reg, lbs, g, _) = weights();
        reg.add_conversion(lbs, g, 1.0, 453.592_37, None).unwrap();
        let removed = reg.remove(lbs).unwrap();
        assert_eq!(removed.name, "Pound");
        assert!(reg.conversions().is_empty());
        assert!(reg.find_by_code("lbs").is_none());

        // Name and code are free again
        reg.add(NewUom::new("Pound", "lbs", QuantityKind::Weight))
            .unwrap();
    }

    #[test]
    fn test_read_only_cannot_be_removed_or_deactivated() {
        let mut reg = UomRegistry::new();
        let mut each = NewUom::new("Each", "ea", QuantityKind::Count);
        each.read_only = true;
        let id = reg.add(each).unwrap();
        assert!(matches!(reg.remove(id), Err(CatalogError::Validation(_))));
        assert!(matches!(reg.deactivate(id), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_deactivate() {
        let (mut reg, _, g, _) = weights();
        reg.deactivate(g).unwrap();
        assert!(!reg.find_by_id(g).unwrap().active);
    }
}
