use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::models::{ConversionEdge, UnitOfMeasure, UomId, validate_conversion_factors};

/// Directed conversion edges, stored as an adjacency list per source unit and
/// keyed by target id. Lookups are direct-edge only; paths are never composed.
#[derive(Debug, Clone, Default)]
pub struct ConversionGraph {
    outgoing: HashMap<UomId, BTreeMap<UomId, ConversionEdge>>,
}

impl ConversionGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `from -> to`. If that edge already exists it is returned untouched,
    /// even when `factor`/`multiply` differ.
    pub fn add_conversion(
        &mut self,
        from: &UnitOfMeasure,
        to: &UnitOfMeasure,
        factor: f64,
        multiply: f64,
        description: Option<String>,
    ) -> Result<&ConversionEdge> {
        let exists = self
            .outgoing
            .get(&from.id)
            .is_some_and(|edges| edges.contains_key(&to.id));

        if exists {
            debug!(from = %from.name, to = %to.name, "conversion already registered");
        } else {
            if from.quantity_kind != to.quantity_kind {
                return Err(incompatible(from, to));
            }
            validate_conversion_factors(factor, multiply)?;
        }

        let edge = self
            .outgoing
            .entry(from.id)
            .or_default()
            .entry(to.id)
            .or_insert_with(|| ConversionEdge {
                from: from.id,
                to: to.id,
                factor,
                multiply,
                description,
            });
        Ok(edge)
    }

    /// Remove `edge` from `from`'s outgoing set. Returns false if `from` does not own it.
    pub fn remove_conversion(&mut self, from: &UnitOfMeasure, edge: &ConversionEdge) -> bool {
        if edge.from != from.id {
            return false;
        }
        let Some(edges) = self.outgoing.get_mut(&from.id) else {
            return false;
        };
        let removed = edges.remove(&edge.to).is_some();
        if edges.is_empty() {
            self.outgoing.remove(&from.id);
        }
        removed
    }

    /// Convert `value` from one unit to another using a single registered edge.
    pub fn convert(&self, from: &UnitOfMeasure, to: &UnitOfMeasure, value: f64) -> Result<f64> {
        if from.id == to.id {
            return Ok(value);
        }
        if from.quantity_kind != to.quantity_kind {
            return Err(incompatible(from, to));
        }
        self.edge(from.id, to.id)
            .map(|edge| edge.apply(value))
            .ok_or_else(|| CatalogError::UnknownConversion {
                from: from.name.clone(),
                to: to.name.clone(),
            })
    }

    #[must_use]
    pub fn edge(&self, from: UomId, to: UomId) -> Option<&ConversionEdge> {
        self.outgoing.get(&from).and_then(|edges| edges.get(&to))
    }

    pub fn outgoing(&self, from: UomId) -> impl Iterator<Item = &ConversionEdge> {
        self.outgoing
            .get(&from)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    /// True if any edge owned by another unit targets `id`.
    #[must_use]
    pub fn has_incoming(&self, id: UomId) -> bool {
        self.outgoing
            .iter()
            .any(|(from, edges)| *from != id && edges.contains_key(&id))
    }

    /// Drop every edge owned by `id`.
    pub fn remove_owned_by(&mut self, id: UomId) -> usize {
        self.outgoing.remove(&id).map_or(0, |edges| edges.len())
    }

    /// All edges, ordered by source id then target id.
    #[must_use]
    pub fn edges(&self) -> Vec<&ConversionEdge> {
        let mut sources: Vec<&UomId> = self.outgoing.keys().collect();
        sources.sort();
        sources
            .into_iter()
            .flat_map(|from| self.outgoing[from].values())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outgoing.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn incompatible(from: &UnitOfMeasure, to: &UnitOfMeasure) -> CatalogError {
    CatalogError::IncompatibleUnits {
        from: from.name.clone(),
        to: to.name.clone(),
        from_kind: from.quantity_kind,
        to_kind: to.quantity_kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuantityKind;

    fn uom(id: u32, name: &str, code: &str, kind: QuantityKind) -> UnitOfMeasure {
        UnitOfMeasure {
            id: UomId(id),
            name: name.to_string(),
            code: code.to_string(),
            description: String::new(),
            quantity_kind: kind,
            read_only: false,
            active: true,
        }
    }

    fn pound() -> UnitOfMeasure {
        uom(0, "Pound", "lbs", QuantityKind::Weight)
    }

    fn gram() -> UnitOfMeasure {
        uom(1, "Gram", "g", QuantityKind::Weight)
    }

    fn ounce() -> UnitOfMeasure {
        uom(2, "Ounce", "oz", QuantityKind::Weight)
    }

    fn liter() -> UnitOfMeasure {
        uom(3, "Liter", "L", QuantityKind::Volume)
    }

    #[test]
    fn test_convert_pound_to_gram() {
        let mut graph = ConversionGraph::new();
        graph
            .add_conversion(&pound(), &gram(), 1.0, 453.592_37, None)
            .unwrap();
        let grams = graph.convert(&pound(), &gram(), 2.0).unwrap();
        assert!((grams - 907.184_74).abs() < 1e-9);
    }

    #[test]
    fn test_convert_uses_factor_as_divisor() {
        let mut graph = ConversionGraph::new();
        graph
            .add_conversion(&ounce(), &pound(), 16.0, 1.0, Some("16 oz per lb".into()))
            .unwrap();
        let lbs = graph.convert(&ounce(), &pound(), 8.0).unwrap();
        assert!((lbs - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_convert_same_unit_is_identity() {
        let graph = ConversionGraph::new();
        let v = graph.convert(&gram(), &gram(), 12.5).unwrap();
        assert!((v - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_convert_incompatible_kinds() {
        let graph = ConversionGraph::new();
        let err = graph.convert(&gram(), &liter(), 1.0).unwrap_err();
        assert!(matches!(err, CatalogError::IncompatibleUnits { .. }));
    }

    #[test]
    fn test_convert_missing_edge() {
        let graph = ConversionGraph::new();
        let err = graph.convert(&gram(), &pound(), 1.0).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownConversion { .. }));
    }

    #[test]
    fn test_edges_are_not_symmetric() {
        let mut graph = ConversionGraph::new();
        graph
            .add_conversion(&pound(), &gram(), 1.0, 453.592_37, None)
            .unwrap();
        assert!(graph.convert(&gram(), &pound(), 1.0).is_err());
    }

    #[test]
    fn test_no_multi_hop_paths() {
        let mut graph = ConversionGraph::new();
        graph.add_conversion(&ounce(), &pound(), 16.0, 1.0, None).unwrap();
        graph
            .add_conversion(&pound(), &gram(), 1.0, 453.592_37, None)
            .unwrap();
        let err = graph.convert(&ounce(), &gram(), 1.0).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownConversion { .. }));
    }

    #[test]
    fn test_add_conversion_is_idempotent() {
        let mut graph = ConversionGraph::new();
        graph
            .add_conversion(&pound(), &gram(), 1.0, 453.592_37, None)
            .unwrap();
        let edge = graph
            .add_conversion(&pound(), &gram(), 2.0, 1000.0, Some("ignored".into()))
            .unwrap();
        assert!((edge.factor - 1.0).abs() < f64::EPSILON);
        assert!((edge.multiply - 453.592_37).abs() < f64::EPSILON);
        assert!(edge.description.is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_add_conversion_rejects_incompatible_kinds() {
        let mut graph = ConversionGraph::new();
        let err = graph
            .add_conversion(&gram(), &liter(), 1.0, 1.0, None)
            .unwrap_err();
        assert!(matches!(err, CatalogError::IncompatibleUnits { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_add_conversion_rejects_non_positive_factors() {
        let mut graph = ConversionGraph::new();
        assert!(graph.add_conversion(&pound(), &gram(), 0.0, 1.0, None).is_err());
        assert!(graph.add_conversion(&pound(), &gram(), 1.0, -1.0, None).is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_remove_conversion() {
        let mut graph = ConversionGraph::new();
        let edge = graph
            .add_conversion(&pound(), &gram(), 1.0, 453.592_37, None)
            .unwrap()
            .clone();

        // Not owned by gram
        assert!(!graph.remove_conversion(&gram(), &edge));
        assert_eq!(graph.len(), 1);

        assert!(graph.remove_conversion(&pound(), &edge));
        assert!(graph.is_empty());
        assert!(!graph.remove_conversion(&pound(), &edge));
    }

    #[test]
    fn test_has_incoming_and_remove_owned() {
        let mut graph = ConversionGraph::new();
        graph
            .add_conversion(&pound(), &gram(), 1.0, 453.592_37, None)
            .unwrap();
        graph.add_conversion(&pound(), &ounce(), 1.0, 16.0, None).unwrap();

        assert!(graph.has_incoming(UomId(1)));
        assert!(!graph.has_incoming(UomId(0)));
        assert_eq!(graph.outgoing(UomId(0)).count(), 2);

        assert_eq!(graph.remove_owned_by(UomId(0)), 2);
        assert!(!graph.has_incoming(UomId(1)));
    }

    #[test]
    fn test_edges_ordered() {
        let mut graph = ConversionGraph::new();
        graph.add_conversion(&ounce(), &pound(), 16.0, 1.0, None).unwrap();
        graph.add_conversion(&pound(), &ounce(), 1.0, 16.0, None).unwrap();
        graph
            .add_conversion(&pound(), &gram(), 1.0, 453.592_37, None)
            .unwrap();

        let pairs: Vec<(u32, u32)> = graph.edges().iter().map(|e| (e.from.0, e.to.0)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (2, 0)]);
    }
}
