// Routes a tool call to its catalog entry and wraps the output

use crate::error::DispatchError;
use crate::tools::validate_arguments;
use noodleseed_core::{Catalog, ToolResult};
use serde_json::Value;
use std::sync::Arc;

/// Stateless dispatcher over a read-only catalog
#[derive(Debug, Clone)]
pub struct Dispatcher {
    catalog: Arc<Catalog>,
}

impl Dispatcher {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Validate `arguments` for `tool_id` and run its response builder
    pub async fn dispatch(&self, tool_id: &str, arguments: Value) -> Result<ToolResult, DispatchError> {
        let Some(entry) = self.catalog.get_by_id(tool_id) else {
            return Err(DispatchError::UnknownTool(tool_id.to_string()));
        };

        let arguments = validate_arguments(&entry.input_schema, arguments)?;

        let output = entry
            .builder()
            .build(arguments)
            .await
            .map_err(|e| DispatchError::Failed {
                tool: entry.id.clone(),
                message: format!("{:#}", e),
            })?;

        tracing::debug!("Dispatched tool {}", entry.id);

        Ok(ToolResult {
            display_text: output.text,
            structured_payload: output.structured,
            presentation_metadata: entry.result_metadata(),
        })
    }
}
