//! RoX Semantic Model UI
//!
//! Web form for describing an asset with DCAT cataloging fields and values
//! attached to nodes of an OPC UA robotics hierarchy. Completed descriptions
//! are written as timestamped JSON files.
//!
//! - `data`: CSV loading with Polars
//! - `catalog`, `hierarchy`: the two lookup tables
//! - `search_index`: substring search over hierarchy nodes
//! - `asset`, `store`: the saved JSON document and the output directory
//! - `api_server`, `web`, `session`: the axum server (feature `api`)

pub mod asset;
pub mod catalog;
pub mod config;
pub mod data;
pub mod hierarchy;
pub mod search_index;
pub mod store;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod session;
#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use asset::{AssetDescription, AssetType, DcatForm, OpcuaValue, OpcuaValues, ValidationError};
pub use catalog::PropertyCatalog;
pub use config::ServerConfig;
pub use data::CatalogData;
pub use hierarchy::{HierarchyNode, HierarchyTable, NodeKind, Selection};
pub use search_index::{SearchHit, SearchIndex};
pub use store::{AssetStore, SavedAsset, StoreError};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
