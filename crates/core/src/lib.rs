// Core types for the NoodleSeed MCP server: the catalog and session identities

pub mod catalog;
pub mod types;

pub use catalog::{Catalog, CatalogEntry, CatalogError, ResponseBuilder, ToolOutput};
pub use types::*;
