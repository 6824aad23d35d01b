//! Label tables for categorical fields.
//!
//! Simulators report categorical quantities (roadgraph types, signal
//! states, object types) as raw integer codes. A [`CategoryTable`] maps
//! each known code to a dense class index; the normalizer one-hot
//! encodes that index to the table's cardinality.

use indexmap::IndexMap;

use vmax_core::ConfigError;

use crate::catalog::FieldKey;

/// Raw label code to dense class index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTable {
    classes: IndexMap<i32, usize>,
    cardinality: usize,
}

impl CategoryTable {
    /// Build a table from `(label, class)` pairs.
    ///
    /// Cardinality is one past the largest class. Several labels may
    /// share a class; a label listed twice is rejected.
    pub fn new(
        field: &'static str,
        pairs: impl IntoIterator<Item = (i32, usize)>,
    ) -> Result<Self, ConfigError> {
        let mut classes = IndexMap::new();
        for (label, class) in pairs {
            if classes.insert(label, class).is_some() {
                return Err(ConfigError::InvalidParameter {
                    name: field,
                    reason: format!("label {label} mapped more than once"),
                });
            }
        }
        let cardinality = classes.values().max().map_or(0, |&c| c + 1);
        if cardinality == 0 {
            return Err(ConfigError::InvalidParameter {
                name: field,
                reason: "category table is empty".into(),
            });
        }
        Ok(Self {
            classes,
            cardinality,
        })
    }

    /// Class index of a raw label, if known.
    pub fn class_of(&self, label: i32) -> Option<usize> {
        self.classes.get(&label).copied()
    }

    /// Number of one-hot channels.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Known raw labels, in table order.
    pub fn labels(&self) -> impl Iterator<Item = i32> + '_ {
        self.classes.keys().copied()
    }

    /// Default roadgraph table.
    ///
    /// Classes: 0 unknown/padding, 1 lane centre, 2 road line, 3 road
    /// edge, 4 stop sign, 5 crosswalk, 6 speed bump.
    pub fn roadgraph_types() -> Self {
        let pairs = [(-1, 0), (0, 0)]
            .into_iter()
            .chain((1..=3).map(|l| (l, 1)))
            .chain((5..=13).map(|l| (l, 2)))
            .chain((14..=16).map(|l| (l, 3)))
            .chain([(17, 4), (18, 5), (19, 6)]);
        Self::from_static(pairs)
    }

    /// Default traffic-light table.
    ///
    /// Classes: 0 unknown, 1 stop, 2 caution, 3 go. Arrow and flashing
    /// variants fold into their base colour.
    pub fn traffic_light_states() -> Self {
        Self::from_static([
            (0, 0),
            (1, 1),
            (4, 1),
            (7, 1),
            (2, 2),
            (5, 2),
            (8, 2),
            (3, 3),
            (6, 3),
        ])
    }

    /// Default object-type table: unset, vehicle, pedestrian, cyclist,
    /// other.
    pub fn object_types() -> Self {
        Self::from_static((0..=4).map(|l| (l, l as usize)))
    }

    fn from_static(pairs: impl IntoIterator<Item = (i32, usize)>) -> Self {
        let classes: IndexMap<i32, usize> = pairs.into_iter().collect();
        let cardinality = classes.values().max().map_or(0, |&c| c + 1);
        Self {
            classes,
            cardinality,
        }
    }
}

/// The tables used by one extractor, one per categorical field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTables {
    /// Roadgraph `types`.
    pub types: CategoryTable,
    /// Traffic-light `state`.
    pub state: CategoryTable,
    /// Object `object_types`.
    pub object_types: CategoryTable,
}

impl Default for CategoryTables {
    fn default() -> Self {
        Self {
            types: CategoryTable::roadgraph_types(),
            state: CategoryTable::traffic_light_states(),
            object_types: CategoryTable::object_types(),
        }
    }
}

impl CategoryTables {
    /// Table for a categorical key; `None` for every other key.
    pub fn table(&self, key: FieldKey) -> Option<&CategoryTable> {
        match key {
            FieldKey::Types => Some(&self.types),
            FieldKey::State => Some(&self.state),
            FieldKey::ObjectTypes => Some(&self.object_types),
            _ => None,
        }
    }
}
