//! DCAT property catalog: class name -> property names

use anyhow::Result;
use polars::prelude::DataFrame;
use serde::Serialize;

use crate::data::string_values;

/// One `Class,Property` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub class: String,
    pub property: String,
}

/// In-memory DCAT catalog, rows kept in file order
#[derive(Debug, Clone, Default)]
pub struct PropertyCatalog {
    entries: Vec<CatalogEntry>,
}

impl PropertyCatalog {
    /// Build from a frame with `Class` and `Property` columns
    ///
    /// Rows with a blank class or property are skipped.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let classes = string_values(df, "Class")?;
        let properties = string_values(df, "Property")?;

        let entries = classes
            .into_iter()
            .zip(properties)
            .filter_map(|(class, property)| Some(CatalogEntry { class: class?, property: property? }))
            .collect();

        Ok(Self { entries })
    }

    /// All properties declared for `class`, in file order
    pub fn properties(&self, class: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.class == class)
            .map(|e| e.property.clone())
            .collect()
    }

    /// Distinct class names in first-appearance order
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !classes.contains(&entry.class) {
                classes.push(entry.class.clone());
            }
        }
        classes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn catalog() -> PropertyCatalog {
        let df = df![
            "Class" => &[Some("Dataset"), Some("Dataset"), Some("Catalog"), None],
            "Property" => &[Some("dcterms:title"), Some("dcterms:issued"), Some("dcat:dataset"), Some("orphan")],
        ]
        .unwrap();
        PropertyCatalog::from_dataframe(&df).unwrap()
    }

    #[test]
    fn test_properties_for_class() {
        let catalog = catalog();

        assert_eq!(catalog.properties("Dataset"), vec!["dcterms:title", "dcterms:issued"]);
        assert_eq!(catalog.properties("Catalog"), vec!["dcat:dataset"]);
        assert!(catalog.properties("Distribution").is_empty());
    }

    #[test]
    fn test_classes_distinct_in_order() {
        let catalog = catalog();

        assert_eq!(catalog.classes(), vec!["Dataset", "Catalog"]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_missing_column_is_error() {
        let df = df!["Class" => &["Dataset"]].unwrap();

        let err = PropertyCatalog::from_dataframe(&df).unwrap_err();

        assert!(err.to_string().contains("Property"));
    }
}
