//! Asset Description Document
//!
//! The document written for each submission combines:
//! - `asset_type`: what kind of asset is described
//! - `dcat`: mandatory cataloging fields (DCAT / Dublin Core terms)
//! - `opcua`: optional values attached to OPC UA hierarchy paths
//!
//! Raw form input arrives as [`DcatForm`] (all strings) and is validated
//! into a [`DcatRecord`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::hierarchy::{HierarchyNode, HierarchyTable};

/// Shown when the final save is attempted without the mandatory fields
pub const MANDATORY_FIELDS_MESSAGE: &str =
    "Please fill in the mandatory fields (Title and Description) in the first tab.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title and Description are required fields.")]
    MissingRequired,

    #[error("Invalid {field} date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("Unknown asset type '{0}'")]
    UnknownAssetType(String),

    #[error("Please enter a value.")]
    EmptyValue,

    #[error("Select a node in the hierarchy before adding a value.")]
    NoNodeSelected,

    #[error("Unknown OPC UA path '{0}'")]
    UnknownPath(String),
}

/// Kind of asset being described
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetType {
    #[default]
    #[serde(rename = "Software Service")]
    SoftwareService,
    Model,
    #[serde(rename = "Raw Data")]
    RawData,
}

impl AssetType {
    pub const ALL: [AssetType; 3] = [AssetType::SoftwareService, AssetType::Model, AssetType::RawData];

    pub fn label(&self) -> &'static str {
        match self {
            AssetType::SoftwareService => "Software Service",
            AssetType::Model => "Model",
            AssetType::RawData => "Raw Data",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AssetType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|t| t.label() == s.trim())
            .ok_or_else(|| ValidationError::UnknownAssetType(s.to_string()))
    }
}

/// Asset owner block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub organization: String,
    pub email: String,
}

/// Validated DCAT section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcatRecord {
    /// dcterms:title
    pub title: String,
    /// dcterms:description
    pub description: String,
    /// dcterms:issued
    pub issued: NaiveDate,
    /// dcterms:modified
    pub modified: NaiveDate,
    /// foaf:primaryTopic
    pub primary_topic: String,
    /// dcat:conformsTo
    pub conforms_to: String,
    pub owner: Owner,
    pub keywords: Vec<String>,
}

/// Raw DCAT tab input, as posted by the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcatForm {
    pub asset_type: String,
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

impl DcatForm {
    /// Selected asset type; the first option when nothing was posted
    pub fn asset_type(&self) -> Result<AssetType, ValidationError> {
        if self.asset_type.trim().is_empty() {
            return Ok(AssetType::default());
        }
        self.asset_type.parse()
    }

    /// Check mandatory fields and parse dates
    ///
    /// Text fields are kept verbatim; a whitespace-only title or description
    /// counts as missing. Blank dates default to `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<DcatRecord, ValidationError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(ValidationError::MissingRequired);
        }

        Ok(DcatRecord {
            title: self.title.clone(),
            description: self.description.clone(),
            issued: parse_date("issued", &self.issued, today)?,
            modified: parse_date("modified", &self.modified, today)?,
            primary_topic: self.primary_topic.clone(),
            conforms_to: self.conforms_to.clone(),
            owner: Owner {
                name: self.owner_name.clone(),
                organization: self.owner_organization.clone(),
                email: self.owner_email.clone(),
            },
            keywords: parse_keywords(&self.keywords),
        })
    }
}

fn parse_date(field: &'static str, raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(today);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// Comma separated keywords, trimmed, blanks dropped
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Value attached to one OPC UA node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcuaValue {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: String,
    pub value: String,
}

impl OpcuaValue {
    pub fn for_node(node: &HierarchyNode, value: &str) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyValue);
        }
        Ok(Self {
            id: node.id,
            node_type: node.node_type.clone(),
            value: value.to_string(),
        })
    }
}

/// Path key (`Type.level1.level2`) -> value
pub type OpcuaValues = BTreeMap<String, OpcuaValue>;

/// Check submitted values against the hierarchy
///
/// Each key must resolve to a node; id and type are taken from that node,
/// whatever the submission claimed.
pub fn resolve_values(table: &HierarchyTable, submitted: OpcuaValues) -> Result<OpcuaValues, ValidationError> {
    submitted
        .into_iter()
        .map(|(path_key, entry)| {
            let mut parts = path_key.split('.');
            let object_type = parts.next().unwrap_or_default();
            let levels: Vec<&str> = parts.collect();
            if levels.iter().all(|l| l.is_empty()) {
                return Err(ValidationError::UnknownPath(path_key));
            }

            let node = table
                .resolve_node(object_type, &levels)
                .ok_or_else(|| ValidationError::UnknownPath(path_key.clone()))?;
            Ok((path_key, OpcuaValue::for_node(node, &entry.value)?))
        })
        .collect()
}

/// The complete document written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescription {
    pub asset_type: AssetType,
    pub dcat: DcatRecord,
    #[serde(default)]
    pub opcua: OpcuaValues,
}

impl AssetDescription {
    pub fn from_form(form: &DcatForm, opcua: OpcuaValues, today: NaiveDate) -> Result<Self, ValidationError> {
        Ok(Self {
            asset_type: form.asset_type()?,
            dcat: form.validate(today)?,
            opcua,
        })
    }

    /// Pretty JSON, 2-space indentation
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
