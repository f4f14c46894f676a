// Keyword search over NoodleSeed plans and features

use crate::tools::{json_schema_object, json_schema_string};
use anyhow::{Context, Result};
use noodleseed_core::{ResponseBuilder, ToolOutput};
use serde::Deserialize;
use serde_json::Value;

pub const SEARCH_TOOL_ID: &str = "search";
pub const SEARCH_TOOL_URI: &str = "ui://widget/noodle-seed-list.html";
pub const SEARCH_WIDGET_ID: &str = "noodle-seed-list";

const PRICING_KEYWORDS: &[&str] = &["price", "pricing", "cost"];
const FEATURE_KEYWORDS: &[&str] = &["feature", "tool", "action"];
const CHATGPT_KEYWORDS: &[&str] = &["chatgpt", "app"];

const PRICING_RESULTS: &[&str] = &[
    "• Starter Plan: $299/month - 1 ChatGPT app with 5 custom tools",
    "• Growth Plan: $999/month - 5 ChatGPT apps with unlimited tools",
    "• Enterprise: Custom pricing - Unlimited apps with white-label solution",
];
const FEATURE_RESULTS: &[&str] = &[
    "• Automatic OpenAI submission and approval",
    "• Custom tools and actions for your business",
    "• Enterprise-grade security and compliance",
];
const CHATGPT_RESULTS: &[&str] = &[
    "• Get your business on ChatGPT in minutes",
    "• Reach 800M+ ChatGPT users instantly",
    "• Fully managed hosting and deployment",
];
const FALLBACK_RESULTS: &[&str] = &[
    "• NoodleSeed helps businesses get on ChatGPT with no coding required",
    "• Visit noodleseed.com for more information",
];

pub struct SearchTool;

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

impl SearchTool {
    pub fn input_schema() -> Value {
        json_schema_object(
            serde_json::json!({
                "query": json_schema_string("Search query for business solutions")
            }),
            vec!["query"],
        )
    }

    /// Result lines for a query; groups are matched independently
    pub fn matching_results(query: &str) -> Vec<&'static str> {
        let query = query.to_lowercase();
        let mut results = Vec::new();

        for (keywords, lines) in [
            (PRICING_KEYWORDS, PRICING_RESULTS),
            (FEATURE_KEYWORDS, FEATURE_RESULTS),
            (CHATGPT_KEYWORDS, CHATGPT_RESULTS),
        ] {
            if keywords.iter().any(|k| query.contains(k)) {
                results.extend_from_slice(lines);
            }
        }

        if results.is_empty() {
            results.extend_from_slice(FALLBACK_RESULTS);
        }
        results
    }
}

#[async_trait::async_trait]
impl ResponseBuilder for SearchTool {
    async fn build(&self, arguments: Value) -> Result<ToolOutput> {
        let args: SearchArgs =
            serde_json::from_value(arguments).context("Invalid arguments for search")?;

        let results = Self::matching_results(&args.query);
        let text = format!("Search results for '{}':\n\n{}", args.query, results.join("\n"));

        Ok(ToolOutput::new(
            text,
            serde_json::json!({
                "query": args.query,
                "results": results,
            }),
        ))
    }
}
