//! Substring Search over the OPC UA Hierarchy
//!
//! Case-insensitive containment search across:
//! - Full node names (`MotionDeviceSystemType.MotionDevices.Axes`)
//! - Each level label column
//!
//! Full-name matches come first, then matches per level column in column
//! order. A node is reported once, at its first position.

use serde::Serialize;

use crate::hierarchy::{HierarchyTable, Selection};

/// A node found by search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Row index in the hierarchy table
    pub row: usize,
    pub object_type: String,
    pub node_type: String,
    pub id: i64,
    pub full_name: String,
    pub levels: Vec<String>,
}

impl SearchHit {
    /// Drill-down selection leading to this node
    pub fn selection(&self) -> Selection {
        Selection::new(self.object_type.clone(), self.levels.clone())
    }
}

/// Lowercased copies of the searchable text of each node
pub struct SearchIndex {
    full_names: Vec<String>,
    /// `levels[level][row]`
    levels: Vec<Vec<Option<String>>>,
}

impl SearchIndex {
    /// Build search index from the hierarchy at startup
    pub fn build(table: &HierarchyTable) -> Self {
        let start = std::time::Instant::now();

        let full_names = table.nodes().iter().map(|n| n.full_name.to_lowercase()).collect();
        let levels = (1..=table.depth())
            .map(|level| {
                table
                    .nodes()
                    .iter()
                    .map(|n| n.level(level).map(str::to_lowercase))
                    .collect()
            })
            .collect();

        tracing::info!("Built search index over {} nodes in {:?}", table.len(), start.elapsed());
        Self { full_names, levels }
    }

    /// Row indices matching `term`, in result order
    pub fn search_rows(&self, term: &str) -> Vec<usize> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut seen = vec![false; self.full_names.len()];
        let mut rows = Vec::new();
        let mut push = |row: usize, rows: &mut Vec<usize>| {
            if !seen[row] {
                seen[row] = true;
                rows.push(row);
            }
        };

        for (row, name) in self.full_names.iter().enumerate() {
            if name.contains(&needle) {
                push(row, &mut rows);
            }
        }
        for column in &self.levels {
            for (row, value) in column.iter().enumerate() {
                if value.as_deref().is_some_and(|v| v.contains(&needle)) {
                    push(row, &mut rows);
                }
            }
        }

        rows
    }

    /// Search and resolve hits against the table the index was built from
    pub fn search(&self, table: &HierarchyTable, term: &str) -> Vec<SearchHit> {
        let rows = self.search_rows(term);
        tracing::debug!("Search '{}' returned {} nodes", term, rows.len());

        rows.into_iter()
            .filter_map(|row| {
                let node = table.node(row)?;
                Some(SearchHit {
                    row,
                    object_type: node.object_type.clone(),
                    node_type: node.node_type.clone(),
                    id: node.id,
                    full_name: node.full_name.clone(),
                    levels: node.level_path(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tests::robot_table;
    use crate::hierarchy::HierarchyNode;

    #[test]
    fn test_empty_term_finds_nothing() {
        let table = robot_table();
        let index = SearchIndex::build(&table);

        assert!(index.search(&table, "").is_empty());
        assert!(index.search(&table, "   ").is_empty());
    }

    #[test]
    fn test_case_insensitive_full_name_match() {
        let table = robot_table();
        let index = SearchIndex::build(&table);

        let hits = index.search(&table, "axes");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 5002);
        assert_eq!(hits[0].levels, vec!["MotionDevices", "Axes"]);
    }

    #[test]
    fn test_results_are_deduplicated() {
        let table = robot_table();
        let index = SearchIndex::build(&table);

        // Matches both the full name and the level_2 column of one row
        let hits = index.search(&table, "PowerTrains");
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();

        assert_eq!(ids, vec![5003]);

        // "MotionDevice" is also a prefix of "MotionDeviceSystemType"
        assert_eq!(index.search_rows("motiondevice"), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_full_name_matches_precede_level_matches() {
        let node = |object_type: &str, level: &str, id: i64, full_name: &str| HierarchyNode {
            object_type: object_type.to_string(),
            levels: vec![Some(level.to_string())],
            id,
            node_type: "Variable".to_string(),
            full_name: full_name.to_string(),
        };
        // Row 0 only matches through its level label, row 1 through its name
        let table = HierarchyTable::from_nodes(
            vec![
                node("GripperType", "JawPosition", 1, "ns=2;i=1"),
                node("GripperType", "Force", 2, "GripperType.JawPosition.Force"),
            ],
            1,
        );
        let index = SearchIndex::build(&table);

        assert_eq!(index.search_rows("jawposition"), vec![1, 0]);
    }

    #[test]
    fn test_hit_selection_presets_drill_down() {
        let table = robot_table();
        let index = SearchIndex::build(&table);

        let hit = &index.search(&table, "motor")[0];
        let selection = hit.selection();

        assert_eq!(selection.object_type, "MotionDeviceSystemType");
        assert_eq!(selection.path_key(), "MotionDeviceSystemType.MotionDevices.PowerTrains.Motor");
        let node = table.resolve_node(&selection.object_type, &selection.levels).unwrap();
        assert_eq!(node.id, hit.id);
    }

    #[test]
    fn test_hit_keeps_level_numbers_across_empty_cells() {
        let node = |levels: Vec<Option<&str>>, id: i64, full_name: &str| HierarchyNode {
            object_type: "GripperType".to_string(),
            levels: levels.into_iter().map(|l| l.map(str::to_string)).collect(),
            id,
            node_type: "Variable".to_string(),
            full_name: full_name.to_string(),
        };
        let table = HierarchyTable::from_nodes(
            vec![
                node(vec![Some("Jaws"), Some("Force"), None], 1, "GripperType.Jaws.Force"),
                node(vec![Some("Jaws"), None, Some("Force")], 2, "GripperType.Jaws..Force"),
            ],
            3,
        );
        let index = SearchIndex::build(&table);

        let hit = index
            .search(&table, "jaws..force")
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(hit.levels, vec!["Jaws", "", "Force"]);

        let selection = hit.selection();
        let node = table.resolve_node(&selection.object_type, &selection.levels).unwrap();
        assert_eq!(node.id, 2);
    }
}
