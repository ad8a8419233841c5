//! OPC UA Object Hierarchy
//!
//! Each row of the hierarchy table is one node: the ObjectType it belongs to,
//! an ordered chain of level labels (`level_1`, `level_2`, ...), its numeric
//! NodeId, its node class and its dotted full name.
//!
//! Drill-down narrows the rows of one ObjectType level by level: the options
//! for level `n + 1` are the distinct values found under the `n` levels
//! chosen so far. Every query is a linear scan over the rows of one type.

use anyhow::{bail, Result};
use polars::prelude::DataFrame;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::data::{has_column, string_values};

/// Node class of a hierarchy row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Object,
    ObjectType,
    Variable,
    Method,
    Other,
}

impl NodeKind {
    pub fn parse(node_type: &str) -> Self {
        match node_type {
            "Object" => NodeKind::Object,
            "ObjectType" => NodeKind::ObjectType,
            "Variable" => NodeKind::Variable,
            "Method" => NodeKind::Method,
            _ => NodeKind::Other,
        }
    }

    /// Label of the value input offered for this kind of node
    pub fn input_label(&self) -> &'static str {
        match self {
            NodeKind::Variable => "Variable Value",
            NodeKind::Method => "Method Parameters",
            NodeKind::Object | NodeKind::ObjectType => "Object Identifier",
            NodeKind::Other => "Value",
        }
    }

    /// Method parameters get a text area, everything else a single line
    pub fn is_multiline(&self) -> bool {
        matches!(self, NodeKind::Method)
    }
}

/// One row of the hierarchy table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub object_type: String,
    /// `levels[0]` is `level_1`
    pub levels: Vec<Option<String>>,
    pub id: i64,
    pub node_type: String,
    pub full_name: String,
}

impl HierarchyNode {
    /// Value of `level_<n>` (1-based)
    pub fn level(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .and_then(|v| v.as_deref())
    }

    /// Index of the deepest non-empty level, 0 if none
    pub fn depth(&self) -> usize {
        self.levels
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |i| i + 1)
    }

    /// Level values up to `depth()`, outermost first
    ///
    /// Empty cells stay in place as `""` so every value keeps its level number.
    pub fn level_path(&self) -> Vec<String> {
        self.levels[..self.depth()]
            .iter()
            .map(|l| l.clone().unwrap_or_default())
            .collect()
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::parse(&self.node_type)
    }

    fn matches<S: AsRef<str>>(&self, selected: &[S]) -> bool {
        selected.iter().enumerate().all(|(i, value)| {
            let value = value.as_ref();
            value.is_empty() || self.level(i + 1) == Some(value)
        })
    }
}

/// A dropdown in the drill-down chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelChoice {
    /// 1-based level number
    pub level: usize,
    pub options: Vec<String>,
    /// `None` when nothing is chosen at this level (the chain ends here)
    pub selected: Option<String>,
}

/// Object type plus chosen level values
///
/// Empty strings stand for "nothing chosen" at that level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub object_type: String,
    #[serde(default)]
    pub levels: Vec<String>,
}

impl Selection {
    pub fn new(object_type: impl Into<String>, levels: Vec<String>) -> Self {
        Self { object_type: object_type.into(), levels }
    }

    /// Chosen (non-empty) level values
    pub fn chosen(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(String::as_str).filter(|l| !l.is_empty())
    }

    pub fn has_choice(&self) -> bool {
        self.chosen().next().is_some()
    }

    /// Key under which a value is stored: `Type.level1.level2`
    pub fn path_key(&self) -> String {
        let chosen: Vec<&str> = self.chosen().collect();
        format!("{}.{}", self.object_type, chosen.join("."))
    }

    /// Human readable path: `Type > level1 > level2`
    pub fn display_path(&self) -> String {
        std::iter::once(self.object_type.as_str())
            .chain(self.chosen())
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// Read-only OPC UA hierarchy
#[derive(Debug, Clone, Default)]
pub struct HierarchyTable {
    nodes: Vec<HierarchyNode>,
    /// Number of `level_<n>` columns
    depth: usize,
    /// Distinct object types, first-appearance order
    object_types: Vec<String>,
    /// Object type -> row indices (file order)
    by_type: FxHashMap<String, Vec<usize>>,
}

impl HierarchyTable {
    /// Build from a frame with `ObjectType`, `level_1..level_N`, `id`, `type`, `full_name`
    ///
    /// Level columns are taken while `level_1`, `level_2`, ... keep existing.
    /// Rows without an object type or a parseable id are skipped.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let object_types = string_values(df, "ObjectType")?;
        let ids = string_values(df, "id")?;
        let node_types = string_values(df, "type")?;
        let full_names = string_values(df, "full_name")?;

        let mut level_columns = Vec::new();
        while has_column(df, &format!("level_{}", level_columns.len() + 1)) {
            let name = format!("level_{}", level_columns.len() + 1);
            level_columns.push(string_values(df, &name)?);
        }
        if level_columns.is_empty() {
            bail!("No level columns found (expected level_1, level_2, ...)");
        }
        let depth = level_columns.len();

        let mut nodes = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for row in 0..df.height() {
            let (Some(object_type), Some(id)) = (
                object_types[row].clone(),
                ids[row].as_deref().and_then(parse_node_id),
            ) else {
                skipped += 1;
                continue;
            };

            nodes.push(HierarchyNode {
                object_type,
                levels: level_columns.iter().map(|c| c[row].clone()).collect(),
                id,
                node_type: node_types[row].clone().unwrap_or_default(),
                full_name: full_names[row].clone().unwrap_or_default(),
            });
        }
        if skipped > 0 {
            tracing::warn!("Skipped {} hierarchy rows without ObjectType or id", skipped);
        }

        Ok(Self::from_nodes(nodes, depth))
    }

    pub fn from_nodes(nodes: Vec<HierarchyNode>, depth: usize) -> Self {
        let mut object_types = Vec::new();
        let mut by_type: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (idx, node) in nodes.iter().enumerate() {
            let rows = by_type.entry(node.object_type.clone()).or_default();
            if rows.is_empty() {
                object_types.push(node.object_type.clone());
            }
            rows.push(idx);
        }

        Self { nodes, depth, object_types, by_type }
    }

    pub fn object_types(&self) -> &[String] {
        &self.object_types
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&HierarchyNode> {
        self.nodes.get(idx)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn rows_of<'a>(&'a self, object_type: &str) -> impl Iterator<Item = &'a HierarchyNode> + 'a {
        self.by_type
            .get(object_type)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.nodes[idx])
    }

    /// Distinct values of `level_<level>` for one object type
    pub fn level_values(&self, object_type: &str, level: usize) -> Vec<String> {
        if level == 0 || level > self.depth {
            return Vec::new();
        }
        distinct(self.rows_of(object_type), level)
    }

    /// Options for the level after `selected`
    ///
    /// Empty entries in `selected` do not narrow the rows.
    pub fn next_level_options<S: AsRef<str>>(&self, object_type: &str, selected: &[S]) -> Vec<String> {
        let next = selected.len() + 1;
        if next > self.depth {
            return Vec::new();
        }
        distinct(self.rows_of(object_type).filter(|n| n.matches(selected)), next)
    }

    /// Node a selection designates
    ///
    /// Among matching rows, one ending exactly at the selection depth wins;
    /// otherwise the first match in file order.
    pub fn resolve_node<S: AsRef<str>>(&self, object_type: &str, selected: &[S]) -> Option<&HierarchyNode> {
        let target_depth = selected
            .iter()
            .rposition(|s| !s.as_ref().is_empty())
            .map_or(0, |i| i + 1);

        let mut first = None;
        for node in self.rows_of(object_type).filter(|n| n.matches(selected)) {
            if node.depth() == target_depth {
                return Some(node);
            }
            first.get_or_insert(node);
        }
        first
    }

    /// Build the dropdown chain for an object type
    ///
    /// A preset value is kept only while it is one of the options at its
    /// level; the chain stops at the first level without options or
    /// without a chosen value.
    pub fn drill_down<S: AsRef<str>>(&self, object_type: &str, preset: &[S]) -> Vec<LevelChoice> {
        let mut chosen: Vec<String> = Vec::new();
        let mut choices = Vec::new();

        loop {
            let options = self.next_level_options(object_type, &chosen);
            if options.is_empty() {
                break;
            }

            let level = chosen.len() + 1;
            let selected = preset
                .get(level - 1)
                .map(|p| p.as_ref())
                .filter(|p| options.iter().any(|o| o == p))
                .map(str::to_string);

            let stop = selected.is_none();
            if let Some(value) = &selected {
                chosen.push(value.clone());
            }
            choices.push(LevelChoice { level, options, selected });

            if stop {
                break;
            }
        }

        choices
    }

    /// Selection as the drill-down shows it
    ///
    /// Unknown or missing object types fall back to the first one; level
    /// values that are no longer reachable are dropped. `None` only for an
    /// empty table.
    pub fn normalize(&self, selection: Option<&Selection>) -> Option<Selection> {
        let object_type = selection
            .map(|s| s.object_type.as_str())
            .filter(|t| self.by_type.contains_key(*t))
            .or_else(|| self.object_types.first().map(String::as_str))?;

        let preset = selection
            .filter(|s| s.object_type == object_type)
            .map_or(&[][..], |s| s.levels.as_slice());

        let levels = self
            .drill_down(object_type, preset)
            .into_iter()
            .map_while(|choice| choice.selected)
            .collect();

        Some(Selection::new(object_type, levels))
    }
}

/// Distinct non-empty values of `level_<level>`, first-appearance order
fn distinct<'a>(nodes: impl Iterator<Item = &'a HierarchyNode>, level: usize) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for value in nodes.filter_map(|n| n.level(level)) {
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    values
}

/// Node ids are integers; spreadsheets sometimes export them as `5001.0`
fn parse_node_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use polars::prelude::*;

    pub(crate) fn robot_table() -> HierarchyTable {
        let df = df![
            "ObjectType" => &[
                "MotionDeviceSystemType", "MotionDeviceSystemType", "MotionDeviceSystemType",
                "MotionDeviceSystemType", "MotionDeviceSystemType", "ControllerType",
            ],
            "level_1" => &[
                Some("MotionDevices"), Some("MotionDevices"), Some("MotionDevices"),
                Some("Controllers"), Some("SafetyStates"), Some("Software"),
            ],
            "level_2" => &[None, Some("Axes"), Some("PowerTrains"), None, Some("EmergencyStop"), None],
            "level_3" => &[None, None, Some("Motor"), None, None, None],
            "id" => &["5001", "5002", "5003", "5004", "5005.0", "6001"],
            "type" => &["Object", "Object", "Variable", "Object", "Method", "ObjectType"],
            "full_name" => &[
                "MotionDeviceSystemType.MotionDevices",
                "MotionDeviceSystemType.MotionDevices.Axes",
                "MotionDeviceSystemType.MotionDevices.PowerTrains.Motor",
                "MotionDeviceSystemType.Controllers",
                "MotionDeviceSystemType.SafetyStates.EmergencyStop",
                "ControllerType.Software",
            ],
        ]
        .unwrap();
        HierarchyTable::from_dataframe(&df).unwrap()
    }

    #[test]
    fn test_object_types_in_order() {
        let table = robot_table();

        assert_eq!(table.object_types(), &["MotionDeviceSystemType", "ControllerType"]);
        assert_eq!(table.depth(), 3);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_level_values() {
        let table = robot_table();

        assert_eq!(
            table.level_values("MotionDeviceSystemType", 1),
            vec!["MotionDevices", "Controllers", "SafetyStates"]
        );
        assert_eq!(
            table.level_values("MotionDeviceSystemType", 2),
            vec!["Axes", "PowerTrains", "EmergencyStop"]
        );
        assert!(table.level_values("MotionDeviceSystemType", 4).is_empty());
        assert!(table.level_values("Unknown", 1).is_empty());
    }

    #[test]
    fn test_next_level_options_narrow_by_selection() {
        let table = robot_table();
        let none: [&str; 0] = [];

        assert_eq!(
            table.next_level_options("MotionDeviceSystemType", &none),
            vec!["MotionDevices", "Controllers", "SafetyStates"]
        );
        assert_eq!(
            table.next_level_options("MotionDeviceSystemType", &["MotionDevices"]),
            vec!["Axes", "PowerTrains"]
        );
        assert_eq!(
            table.next_level_options("MotionDeviceSystemType", &["MotionDevices", "PowerTrains"]),
            vec!["Motor"]
        );
        // Beyond the last level column
        assert!(table
            .next_level_options("MotionDeviceSystemType", &["MotionDevices", "PowerTrains", "Motor"])
            .is_empty());
    }

    #[test]
    fn test_empty_selection_does_not_narrow() {
        let table = robot_table();

        assert_eq!(
            table.next_level_options("MotionDeviceSystemType", &[""]),
            vec!["Axes", "PowerTrains", "EmergencyStop"]
        );
    }

    #[test]
    fn test_resolve_node_prefers_exact_depth() {
        let table = robot_table();

        let node = table.resolve_node("MotionDeviceSystemType", &["MotionDevices"]).unwrap();
        assert_eq!(node.id, 5001);

        let node = table
            .resolve_node("MotionDeviceSystemType", &["MotionDevices", "PowerTrains"])
            .unwrap();
        // No row ends at PowerTrains; first match is the Motor variable
        assert_eq!(node.id, 5003);
        assert_eq!(node.kind(), NodeKind::Variable);

        assert!(table.resolve_node("MotionDeviceSystemType", &["Nowhere"]).is_none());
    }

    #[test]
    fn test_fractional_ids_are_parsed() {
        let table = robot_table();

        let node = table
            .resolve_node("MotionDeviceSystemType", &["SafetyStates", "EmergencyStop"])
            .unwrap();
        assert_eq!(node.id, 5005);
        assert_eq!(node.kind().input_label(), "Method Parameters");
        assert!(node.kind().is_multiline());
    }

    #[test]
    fn test_drill_down_follows_preset() {
        let table = robot_table();

        let chain = table.drill_down("MotionDeviceSystemType", &["MotionDevices", "PowerTrains"]);

        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].selected.as_deref(), Some("MotionDevices"));
        assert_eq!(chain[1].selected.as_deref(), Some("PowerTrains"));
        assert_eq!(chain[2].options, vec!["Motor"]);
        assert_eq!(chain[2].selected, None);
    }

    #[test]
    fn test_drill_down_drops_stale_preset() {
        let table = robot_table();

        let chain = table.drill_down("ControllerType", &["MotionDevices"]);

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].options, vec!["Software"]);
        assert_eq!(chain[0].selected, None);
    }

    #[test]
    fn test_normalize_selection() {
        let table = robot_table();

        let first = table.normalize(None).unwrap();
        assert_eq!(first, Selection::new("MotionDeviceSystemType", vec![]));

        let unknown = Selection::new("GripperType", vec!["Jaws".to_string()]);
        assert_eq!(table.normalize(Some(&unknown)).unwrap().object_type, "MotionDeviceSystemType");

        let stale = Selection::new(
            "MotionDeviceSystemType",
            vec!["MotionDevices".to_string(), "EmergencyStop".to_string()],
        );
        assert_eq!(
            table.normalize(Some(&stale)).unwrap().levels,
            vec!["MotionDevices".to_string()]
        );

        assert!(HierarchyTable::default().normalize(None).is_none());
    }

    #[test]
    fn test_selection_paths() {
        let selection = Selection::new(
            "MotionDeviceSystemType",
            vec!["MotionDevices".to_string(), "Axes".to_string(), String::new()],
        );

        assert!(selection.has_choice());
        assert_eq!(selection.path_key(), "MotionDeviceSystemType.MotionDevices.Axes");
        assert_eq!(selection.display_path(), "MotionDeviceSystemType > MotionDevices > Axes");
        assert!(!Selection::new("ControllerType", vec![String::new()]).has_choice());
    }

    #[test]
    fn test_rows_without_id_are_skipped() {
        let df = df![
            "ObjectType" => &["A", "A"],
            "level_1" => &["x", "y"],
            "id" => &[Some("1"), None],
            "type" => &["Object", "Object"],
            "full_name" => &["A.x", "A.y"],
        ]
        .unwrap();

        let table = HierarchyTable::from_dataframe(&df).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.level_values("A", 1), vec!["x"]);
    }

    #[test]
    fn test_no_level_columns_is_error() {
        let df = df![
            "ObjectType" => &["A"],
            "id" => &["1"],
            "type" => &["Object"],
            "full_name" => &["A"],
        ]
        .unwrap();

        assert!(HierarchyTable::from_dataframe(&df).is_err());
    }
}
