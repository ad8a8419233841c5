//! View Models for the form templates
//!
//! Plain structs with everything precomputed (selected flags, labels,
//! URLs) so the askama templates only loop and print.

use chrono::NaiveDate;

use crate::asset::{AssetType, DcatForm, OpcuaValues};
use crate::data::CatalogData;
use crate::hierarchy::Selection;
use crate::search_index::SearchHit;
use crate::session::{Flash, FlashKind};
use crate::store::SavedAsset;

/// One `<option>` of a select
#[derive(Debug, Clone, PartialEq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct FlashView {
    pub css_class: &'static str,
    pub message: String,
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        Self { css_class: flash.kind.css_class(), message: flash.message }
    }
}

/// DCAT tab values (draft or defaults)
#[derive(Debug, Clone)]
pub struct DcatView {
    pub asset_types: Vec<OptionView>,
    pub title: String,
    pub description: String,
    pub issued: String,
    pub modified: String,
    pub primary_topic: String,
    pub conforms_to: String,
    pub owner_name: String,
    pub owner_organization: String,
    pub owner_email: String,
    pub keywords: String,
}

impl DcatView {
    pub fn build(draft: &DcatForm, today: NaiveDate) -> Self {
        let current = draft.asset_type().unwrap_or_default();
        let date_or_today = |raw: &str| {
            if raw.trim().is_empty() {
                today.format("%Y-%m-%d").to_string()
            } else {
                raw.to_string()
            }
        };

        Self {
            asset_types: AssetType::ALL
                .iter()
                .map(|t| OptionView {
                    value: t.label().to_string(),
                    label: t.label().to_string(),
                    selected: *t == current,
                })
                .collect(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            issued: date_or_today(&draft.issued),
            modified: date_or_today(&draft.modified),
            primary_topic: draft.primary_topic.clone(),
            conforms_to: draft.conforms_to.clone(),
            owner_name: draft.owner_name.clone(),
            owner_organization: draft.owner_organization.clone(),
            owner_email: draft.owner_email.clone(),
            keywords: draft.keywords.clone(),
        }
    }
}

/// Search box, result table and result message
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub term: String,
    pub hits: Vec<HitView>,
    pub message: Option<FlashView>,
}

#[derive(Debug, Clone)]
pub struct HitView {
    /// Position in the result list, posted back to apply the hit
    pub index: usize,
    pub object_type: String,
    pub node_type: String,
    pub id: i64,
    pub full_name: String,
}

impl SearchView {
    pub fn build(term: &str, hits: Vec<SearchHit>) -> Self {
        if term.trim().is_empty() {
            return Self::default();
        }

        let message = if hits.is_empty() {
            FlashView {
                css_class: FlashKind::Warning.css_class(),
                message: format!("No nodes found matching '{}'", term),
            }
        } else {
            FlashView {
                css_class: FlashKind::Success.css_class(),
                message: format!("Found {} matching nodes", hits.len()),
            }
        };

        Self {
            term: term.to_string(),
            hits: hits
                .into_iter()
                .enumerate()
                .map(|(index, hit)| HitView {
                    index,
                    object_type: hit.object_type,
                    node_type: hit.node_type,
                    id: hit.id,
                    full_name: hit.full_name,
                })
                .collect(),
            message: Some(message),
        }
    }
}

/// A level dropdown
#[derive(Debug, Clone)]
pub struct LevelView {
    /// Form field name, `level_<n>`
    pub name: String,
    pub label: String,
    pub options: Vec<OptionView>,
}

/// Node the current selection points at
#[derive(Debug, Clone)]
pub struct NodeView {
    pub id: i64,
    pub node_type: String,
    pub input_label: &'static str,
    pub multiline: bool,
}

#[derive(Debug, Clone)]
pub struct ValueRow {
    pub path: String,
    pub id: i64,
    pub node_type: String,
    pub value: String,
}

/// OPC UA drill-down panel (also served alone as an htmx fragment)
#[derive(Debug, Clone, Default)]
pub struct PanelView {
    pub object_types: Vec<OptionView>,
    pub current_object_type: String,
    pub levels: Vec<LevelView>,
    pub selected_path: Option<String>,
    pub node: Option<NodeView>,
    pub values: Vec<ValueRow>,
}

impl PanelView {
    pub fn build(data: &CatalogData, selection: Option<&Selection>, values: &OpcuaValues) -> Self {
        let table = &data.hierarchy;
        let values = values
            .iter()
            .map(|(path, v)| ValueRow {
                path: path.clone(),
                id: v.id,
                node_type: v.node_type.clone(),
                value: v.value.clone(),
            })
            .collect();

        let Some(selection) = table.normalize(selection) else {
            return Self { values, ..Self::default() };
        };

        let object_types = table
            .object_types()
            .iter()
            .map(|t| OptionView {
                value: t.clone(),
                label: t.clone(),
                selected: *t == selection.object_type,
            })
            .collect();

        let levels = table
            .drill_down(&selection.object_type, &selection.levels)
            .into_iter()
            .map(|choice| {
                let blank = OptionView {
                    value: String::new(),
                    label: String::new(),
                    selected: choice.selected.is_none(),
                };
                let options = std::iter::once(blank)
                    .chain(choice.options.iter().map(|o| OptionView {
                        value: o.clone(),
                        label: o.clone(),
                        selected: choice.selected.as_deref() == Some(o.as_str()),
                    }))
                    .collect();

                LevelView {
                    name: format!("level_{}", choice.level),
                    label: format!("Level {}", choice.level),
                    options,
                }
            })
            .collect();

        let (selected_path, node) = if selection.has_choice() {
            let node = table
                .resolve_node(&selection.object_type, &selection.levels)
                .map(|n| NodeView {
                    id: n.id,
                    node_type: n.node_type.clone(),
                    input_label: n.kind().input_label(),
                    multiline: n.kind().is_multiline(),
                });
            (Some(selection.display_path()), node)
        } else {
            (None, None)
        };

        Self {
            object_types,
            current_object_type: selection.object_type,
            levels,
            selected_path,
            node,
            values,
        }
    }
}

/// Result of the last successful save
#[derive(Debug, Clone)]
pub struct SavedView {
    pub filename: String,
    pub download_url: String,
    pub json: String,
}

impl From<&SavedAsset> for SavedView {
    fn from(saved: &SavedAsset) -> Self {
        Self {
            filename: saved.filename.clone(),
            download_url: format!("/assets/{}", urlencoding::encode(&saved.filename)),
            json: saved.json.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::OpcuaValue;
    use crate::catalog::PropertyCatalog;
    use crate::hierarchy::tests::robot_table;

    fn data() -> CatalogData {
        CatalogData { properties: PropertyCatalog::default(), hierarchy: robot_table() }
    }

    #[test]
    fn test_panel_defaults_to_first_object_type() {
        let panel = PanelView::build(&data(), None, &OpcuaValues::new());

        assert_eq!(panel.current_object_type, "MotionDeviceSystemType");
        assert!(panel.object_types[0].selected);
        assert_eq!(panel.levels.len(), 1);
        // Blank first option, then three level_1 values
        assert_eq!(panel.levels[0].options.len(), 4);
        assert!(panel.levels[0].options[0].selected);
        assert!(panel.selected_path.is_none());
        assert!(panel.node.is_none());
    }

    #[test]
    fn test_panel_shows_node_for_selection() {
        let selection = Selection::new(
            "MotionDeviceSystemType",
            vec!["SafetyStates".to_string(), "EmergencyStop".to_string()],
        );
        let mut values = OpcuaValues::new();
        values.insert(
            selection.path_key(),
            OpcuaValue { id: 5005, node_type: "Method".to_string(), value: "latch=true".to_string() },
        );

        let panel = PanelView::build(&data(), Some(&selection), &values);

        assert_eq!(
            panel.selected_path.as_deref(),
            Some("MotionDeviceSystemType > SafetyStates > EmergencyStop")
        );
        let node = panel.node.unwrap();
        assert_eq!(node.id, 5005);
        assert!(node.multiline);
        assert_eq!(panel.values.len(), 1);
        assert_eq!(panel.values[0].path, "MotionDeviceSystemType.SafetyStates.EmergencyStop");
    }

    #[test]
    fn test_search_view_messages() {
        let empty = SearchView::build("gripper", Vec::new());
        assert_eq!(empty.message.unwrap().message, "No nodes found matching 'gripper'");

        assert!(SearchView::build("", Vec::new()).message.is_none());
    }

    #[test]
    fn test_dcat_view_defaults_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let view = DcatView::build(&DcatForm::default(), today);

        assert_eq!(view.issued, "2025-03-14");
        assert_eq!(view.modified, "2025-03-14");
        assert!(view.asset_types[0].selected);
    }

    #[test]
    fn test_saved_view_encodes_download_url() {
        let saved = SavedAsset {
            filename: "Gripper_Data_20250314_092653.json".to_string(),
            path: "output/Gripper_Data_20250314_092653.json".into(),
            json: "{}".to_string(),
        };

        let view = SavedView::from(&saved);

        assert_eq!(view.download_url, "/assets/Gripper_Data_20250314_092653.json");
    }
}
