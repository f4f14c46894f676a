// Catalog of invocable entries, indexed by id (tool routing) and by uri (resource routing)

use anyhow::Result;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// MIME type advertised for widget markup
pub const WIDGET_MIME_TYPE: &str = "text/html+skybridge";

/// Output of a response builder, before it is wrapped into a `ToolResult`
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub structured: Value,
}

impl ToolOutput {
    pub fn new(text: impl Into<String>, structured: Value) -> Self {
        Self {
            text: text.into(),
            structured,
        }
    }
}

/// Builds the response for a catalog entry from already-validated arguments
#[async_trait::async_trait]
pub trait ResponseBuilder: Send + Sync {
    async fn build(&self, arguments: Value) -> Result<ToolOutput>;
}

/// One invocable entry: a tool and the widget resource it renders into
#[derive(Clone)]
pub struct CatalogEntry {
    pub id: String,
    pub uri: String,
    pub title: String,
    pub description: String,
    pub invoking: String,
    pub invoked: String,
    pub mime_type: String,
    pub markup: String,
    pub input_schema: Value,
    pub produces_widget: bool,
    builder: Arc<dyn ResponseBuilder>,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        uri: impl Into<String>,
        title: impl Into<String>,
        builder: Arc<dyn ResponseBuilder>,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            uri: uri.into(),
            description: title.clone(),
            title,
            invoking: String::new(),
            invoked: String::new(),
            mime_type: WIDGET_MIME_TYPE.to_string(),
            markup: String::new(),
            input_schema: json!({ "type": "object", "properties": {} }),
            produces_widget: false,
            builder,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Status labels shown by the client while the tool runs and once it is done
    pub fn with_labels(mut self, invoking: impl Into<String>, invoked: impl Into<String>) -> Self {
        self.invoking = invoking.into();
        self.invoked = invoked.into();
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = markup.into();
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_widget(mut self, produces_widget: bool) -> Self {
        self.produces_widget = produces_widget;
        self
    }

    pub fn builder(&self) -> &Arc<dyn ResponseBuilder> {
        &self.builder
    }

    /// Metadata attached to the tool listing, the resource listing and every result
    pub fn presentation_metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("openai/outputTemplate".into(), json!(self.uri));
        meta.insert("openai/toolInvocation/invoking".into(), json!(self.invoking));
        meta.insert("openai/toolInvocation/invoked".into(), json!(self.invoked));
        meta.insert("openai/widgetAccessible".into(), json!(self.produces_widget));
        meta.insert(
            "openai/resultCanProduceWidget".into(),
            json!(self.produces_widget),
        );
        meta.insert(
            "annotations".into(),
            json!({
                "readOnlyHint": true,
                "destructiveHint": false,
                "openWorldHint": false
            }),
        );
        meta
    }

    /// Metadata for a tool result; widget entries embed their markup inline
    pub fn result_metadata(&self) -> Map<String, Value> {
        let mut meta = self.presentation_metadata();
        if self.produces_widget {
            meta.insert(
                "openai.com/widget".into(),
                json!({
                    "type": "resource",
                    "resource": {
                        "uri": self.uri,
                        "mimeType": self.mime_type,
                        "text": self.markup,
                        "title": self.title
                    }
                }),
            );
        }
        meta
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .field("title", &self.title)
            .field("produces_widget", &self.produces_widget)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate catalog id: {0}")]
    DuplicateId(String),

    #[error("Duplicate catalog uri: {0}")]
    DuplicateUri(String),
}

/// Immutable set of catalog entries
///
/// Both indexes point into `entries`, so every entry sits in exactly one slot
/// of each.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_id: HashMap<String, usize>,
    by_uri: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for entry in entries {
            if catalog.by_id.contains_key(&entry.id) {
                return Err(CatalogError::DuplicateId(entry.id));
            }
            if catalog.by_uri.contains_key(&entry.uri) {
                return Err(CatalogError::DuplicateUri(entry.uri));
            }

            let slot = catalog.entries.len();
            catalog.by_id.insert(entry.id.clone(), slot);
            catalog.by_uri.insert(entry.uri.clone(), slot);
            catalog.entries.push(entry);
        }

        Ok(catalog)
    }

    /// Look up an entry by its tool id
    pub fn get_by_id(&self, id: &str) -> Option<&CatalogEntry> {
        self.by_id.get(id).map(|&slot| &self.entries[slot])
    }

    /// Look up an entry by its resource uri
    pub fn get_by_uri(&self, uri: &str) -> Option<&CatalogEntry> {
        self.by_uri.get(uri).map(|&slot| &self.entries[slot])
    }

    /// All entries, in registration order
    pub fn list(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
