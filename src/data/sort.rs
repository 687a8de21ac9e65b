//! Column-driven table sorting.
//!
//! A [`SortEngine`] tracks which column is active and in which direction.
//! Activating the active column again flips the direction; activating any
//! other column selects it ascending. Only one column is active at a time.

use serde::Serialize;

/// Comparable value of one row field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Int(i64),
    Text(String),
}

impl From<usize> for SortKey {
    fn from(v: usize) -> Self {
        SortKey::Int(v as i64)
    }
}

impl From<&str> for SortKey {
    fn from(v: &str) -> Self {
        SortKey::Text(v.to_string())
    }
}

/// Rows that expose their fields by column name.
pub trait Sortable {
    /// The key for `field`, or `None` if the row has no such field.
    fn sort_key(&self, field: &str) -> Option<SortKey>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Arrow shown next to the active column header.
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
    pub active: bool,
}

/// Sorting state for one table.
#[derive(Debug, Clone)]
pub struct SortEngine {
    state: SortState,
}

impl Default for SortEngine {
    fn default() -> Self {
        Self::new("index")
    }
}

impl SortEngine {
    /// Start with `field` active and ascending.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            state: SortState {
                field: field.into(),
                direction: SortDirection::Ascending,
                active: true,
            },
        }
    }

    pub fn state(&self) -> &SortState {
        &self.state
    }

    pub fn is_active(&self, field: &str) -> bool {
        self.state.active && self.state.field == field
    }

    /// Direction of `field` if it is the active column.
    pub fn direction_of(&self, field: &str) -> Option<SortDirection> {
        self.is_active(field).then_some(self.state.direction)
    }

    /// Activate `field` and reorder `rows` in place.
    pub fn activate<T: Sortable>(&mut self, field: &str, rows: &mut [T]) {
        if self.is_active(field) {
            self.state.direction = self.state.direction.toggled();
        } else {
            self.state = SortState {
                field: field.to_string(),
                direction: SortDirection::Ascending,
                active: true,
            };
        }
        self.apply(rows);
    }

    /// Reorder `rows` by the current state without changing it.
    pub fn apply<T: Sortable>(&self, rows: &mut [T]) {
        sort_rows(rows, &self.state.field, self.state.direction);
    }
}

/// Stable sort of `rows` by `field`.
///
/// Equal keys keep their relative order in both directions.
pub fn sort_rows<T: Sortable>(rows: &mut [T], field: &str, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ka = a.sort_key(field);
        let kb = b.sort_key(field);
        match direction {
            SortDirection::Ascending => ka.cmp(&kb),
            SortDirection::Descending => kb.cmp(&ka),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        count: usize,
    }

    impl Sortable for Row {
        fn sort_key(&self, field: &str) -> Option<SortKey> {
            match field {
                "name" => Some(self.name.into()),
                "count" => Some(self.count.into()),
                _ => None,
            }
        }
    }

    fn counts(rows: &[Row]) -> Vec<usize> {
        rows.iter().map(|r| r.count).collect()
    }

    #[test]
    fn same_field_toggles_direction() {
        let mut rows = vec![Row { name: "a", count: 2 }, Row { name: "b", count: 1 }];
        let mut engine = SortEngine::default();

        engine.activate("count", &mut rows);
        assert_eq!(counts(&rows), vec![1, 2]);
        assert_eq!(engine.direction_of("count"), Some(SortDirection::Ascending));

        engine.activate("count", &mut rows);
        assert_eq!(counts(&rows), vec![2, 1]);
        assert_eq!(engine.direction_of("count"), Some(SortDirection::Descending));
    }

    #[test]
    fn other_field_starts_ascending_and_takes_the_highlight() {
        let mut rows = vec![Row { name: "b", count: 1 }, Row { name: "a", count: 2 }];
        let mut engine = SortEngine::new("count");
        engine.activate("count", &mut rows);
        assert_eq!(engine.state().direction, SortDirection::Descending);

        engine.activate("name", &mut rows);
        assert!(engine.is_active("name"));
        assert!(!engine.is_active("count"));
        assert_eq!(engine.direction_of("count"), None);
        assert_eq!(rows[0].name, "a");
    }

    #[test]
    fn initial_state_is_index_ascending() {
        let engine = SortEngine::default();
        assert_eq!(
            engine.state(),
            &SortState {
                field: "index".to_string(),
                direction: SortDirection::Ascending,
                active: true,
            }
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut rows = vec![
            Row { name: "x", count: 1 },
            Row { name: "y", count: 0 },
            Row { name: "z", count: 1 },
        ];
        sort_rows(&mut rows, "count", SortDirection::Descending);
        let names: Vec<&str> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["x", "z", "y"]);
    }

    #[test]
    fn unknown_field_keeps_order() {
        let mut rows = vec![Row { name: "b", count: 1 }, Row { name: "a", count: 2 }];
        sort_rows(&mut rows, "missing", SortDirection::Ascending);
        assert_eq!(rows[0].name, "b");
    }
}
