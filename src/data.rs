//! Data Loading and Management
//!
//! Loads the two lookup tables the form is built on, using Polars:
//! - DCAT property catalog (`Class`, `Property`)
//! - OPC UA robotics object hierarchy (`ObjectType`, `level_1..level_N`, `id`, `type`, `full_name`)
//!
//! Both tables are read once at startup and kept as typed, read-only rows.

use polars::prelude::*;
use anyhow::{Context, Result};
use std::path::Path;

use crate::catalog::PropertyCatalog;
use crate::hierarchy::HierarchyTable;

/// Main data holder for the asset form
#[derive(Debug)]
pub struct CatalogData {
    /// DCAT class -> property names
    pub properties: PropertyCatalog,

    /// OPC UA object hierarchy rows
    pub hierarchy: HierarchyTable,
}

impl CatalogData {
    /// Load both tables from `data_dir`
    pub fn load(data_dir: &Path, dcat_file: &str, opcua_file: &str) -> Result<Self> {
        tracing::info!("Loading lookup tables from {}", data_dir.display());

        let dcat_path = data_dir.join(dcat_file);
        let properties = PropertyCatalog::from_dataframe(&read_csv(&dcat_path)?)
            .with_context(|| format!("Invalid DCAT catalog: {}", dcat_path.display()))?;

        let opcua_path = data_dir.join(opcua_file);
        let hierarchy = HierarchyTable::from_dataframe(&read_csv(&opcua_path)?)
            .with_context(|| format!("Invalid OPC UA hierarchy: {}", opcua_path.display()))?;

        tracing::info!("  DCAT properties: {}", properties.len());
        tracing::info!("  OPC UA nodes: {} ({} levels)", hierarchy.len(), hierarchy.depth());
        tracing::info!("  OPC UA object types: {}", hierarchy.object_types().len());

        Ok(CatalogData { properties, hierarchy })
    }
}

/// Read a CSV file with every column as text
///
/// Schema inference is disabled so sparse level columns and node ids keep
/// their literal cell contents; typed parsing happens per table.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {}", path.display()))
}

/// Whether the frame has a column with this name
pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Text values of a column; blank cells become `None`
pub(crate) fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?;
    let column = column
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", name))?;

    let values = column
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect();

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixtures(dir: &Path) {
        fs::write(
            dir.join("dcat3.csv"),
            "Class,Property\nDataset,dcterms:title\nDataset,dcterms:description\nCatalog,dcat:dataset\n",
        )
        .unwrap();
        fs::write(
            dir.join("opcua.csv"),
            "ObjectType,level_1,level_2,id,type,full_name\n\
             MotionDeviceSystemType,MotionDevices,,5001,Object,MotionDeviceSystemType.MotionDevices\n\
             MotionDeviceSystemType,MotionDevices,Axes,5002,Object,MotionDeviceSystemType.MotionDevices.Axes\n\
             ControllerType,Software,,6001,Object,ControllerType.Software\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let data = CatalogData::load(dir.path(), "dcat3.csv", "opcua.csv").unwrap();

        assert_eq!(data.properties.len(), 3);
        assert_eq!(data.hierarchy.len(), 3);
        assert_eq!(data.hierarchy.depth(), 2);
        assert_eq!(
            data.hierarchy.object_types(),
            &["MotionDeviceSystemType".to_string(), "ControllerType".to_string()]
        );
    }

    #[test]
    fn test_blank_cells_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let df = read_csv(&dir.path().join("opcua.csv")).unwrap();
        let level_2 = string_values(&df, "level_2").unwrap();

        assert_eq!(level_2, vec![None, Some("Axes".to_string()), None]);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();

        let err = CatalogData::load(dir.path(), "nope.csv", "opcua.csv").unwrap_err();

        assert!(format!("{:#}", err).contains("nope.csv"));
    }
}
