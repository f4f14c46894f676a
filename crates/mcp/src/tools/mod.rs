// NoodleSeed catalog: tool definitions, argument schemas and dispatch

pub mod dispatcher;
pub mod get_started;
pub mod schema;
pub mod search;

pub use dispatcher::Dispatcher;
pub use get_started::{
    GetStartedTool, GET_STARTED_TOOL_ID, GET_STARTED_TOOL_URI, GET_STARTED_WIDGET_ID,
};
pub use schema::{
    json_schema_object, json_schema_string, json_schema_string_with_default, validate_arguments,
};
pub use search::{SearchTool, SEARCH_TOOL_ID, SEARCH_TOOL_URI, SEARCH_WIDGET_ID};

use noodleseed_core::{Catalog, CatalogEntry, CatalogError};
use std::sync::Arc;

/// Location of the bundled widget assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetAssets {
    pub cdn_url: String,
    pub asset_version: String,
}

impl WidgetAssets {
    pub fn new(cdn_url: impl Into<String>, asset_version: impl Into<String>) -> Self {
        Self {
            cdn_url: cdn_url.into(),
            asset_version: asset_version.into(),
        }
    }

    /// HTML shell that loads one widget's bundle from the CDN
    pub fn markup(&self, widget: &str) -> String {
        let base = self.cdn_url.trim_end_matches('/');
        format!(
            "<div id=\"{widget}-root\"></div>\n\
             <link rel=\"stylesheet\" href=\"{base}/{widget}-{version}.css\">\n\
             <script type=\"module\" src=\"{base}/{widget}-{version}.js\"></script>",
            widget = widget,
            base = base,
            version = self.asset_version,
        )
    }
}

impl Default for WidgetAssets {
    fn default() -> Self {
        Self::new("https://noodleseed.fly.dev/static", "0001")
    }
}

/// Build the NoodleSeed catalog
pub fn noodleseed_catalog(assets: &WidgetAssets) -> Result<Catalog, CatalogError> {
    Catalog::new(vec![
        CatalogEntry::new(
            SEARCH_TOOL_ID,
            SEARCH_TOOL_URI,
            "Search NoodleSeed",
            Arc::new(SearchTool),
        )
        .with_description("Search for NoodleSeed business solutions, pricing plans, and features")
        .with_labels("Searching NoodleSeed...", "Here's what we found")
        .with_markup(assets.markup(SEARCH_WIDGET_ID))
        .with_input_schema(SearchTool::input_schema()),
        CatalogEntry::new(
            GET_STARTED_TOOL_ID,
            GET_STARTED_TOOL_URI,
            "Show NoodleSeed Platform",
            Arc::new(GetStartedTool),
        )
        .with_description(
            "Get started with NoodleSeed - Display interactive platform overview with pricing",
        )
        .with_labels("Loading NoodleSeed platform...", "Here's NoodleSeed's AI platform")
        .with_markup(assets.markup(GET_STARTED_WIDGET_ID))
        .with_input_schema(GetStartedTool::input_schema())
        .with_widget(true),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contains_both_tools() {
        let catalog = noodleseed_catalog(&WidgetAssets::default()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get_by_id("search").unwrap().uri, SEARCH_TOOL_URI);
        assert_eq!(
            catalog.get_by_uri(GET_STARTED_TOOL_URI).unwrap().id,
            GET_STARTED_TOOL_ID
        );
        assert!(catalog.get_by_id(GET_STARTED_TOOL_ID).unwrap().produces_widget);
    }

    #[test]
    fn test_markup_references_versioned_bundle() {
        let markup = WidgetAssets::new("https://cdn.example.com/static/", "0042")
            .markup(GET_STARTED_WIDGET_ID);
        assert!(markup.contains("https://cdn.example.com/static/noodle-seed-platform-0042.css"));
        assert!(markup.contains("https://cdn.example.com/static/noodle-seed-platform-0042.js"));
        assert!(markup.starts_with("<div id=\"noodle-seed-platform-root\"></div>"));
    }

    #[test]
    fn test_each_entry_loads_its_own_widget() {
        let catalog = noodleseed_catalog(&WidgetAssets::default()).unwrap();

        let search = catalog.get_by_id(SEARCH_TOOL_ID).unwrap();
        let platform = catalog.get_by_id(GET_STARTED_TOOL_ID).unwrap();
        assert!(search.markup.contains("noodle-seed-list-root"));
        assert!(platform.markup.contains("noodle-seed-platform-root"));
        assert_ne!(search.markup, platform.markup);
    }
}
