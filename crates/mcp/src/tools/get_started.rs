// Platform overview tool, rendered with the platform widget

use crate::tools::{json_schema_object, json_schema_string_with_default};
use anyhow::{Context, Result};
use noodleseed_core::{ResponseBuilder, ToolOutput};
use serde::Deserialize;
use serde_json::{json, Value};

pub const GET_STARTED_TOOL_ID: &str = "get-started";
pub const GET_STARTED_TOOL_URI: &str = "ui://widget/noodle-seed-platform.html";
pub const GET_STARTED_WIDGET_ID: &str = "noodle-seed-platform";

const DEFAULT_BUSINESS_TYPE: &str = "general";

const RESPONSE_TEXT: &str = "Here's NoodleSeed - a no-code platform to build your AI presence \
across ChatGPT. We help businesses reach 800M+ ChatGPT users with custom apps, tools, and \
actions. Explore our three pricing tiers and get your app live in under 48 hours!";

pub struct GetStartedTool;

#[derive(Debug, Deserialize)]
struct GetStartedArgs {
    #[serde(default = "default_business_type")]
    business_type: String,
}

fn default_business_type() -> String {
    DEFAULT_BUSINESS_TYPE.to_string()
}

impl GetStartedTool {
    pub fn input_schema() -> Value {
        json_schema_object(
            json!({
                "business_type": json_schema_string_with_default(
                    "Type of business (e.g., retail, healthcare, real-estate)",
                    DEFAULT_BUSINESS_TYPE,
                )
            }),
            vec![],
        )
    }

    /// Platform overview tailored to a business type
    pub fn overview(business_type: &str) -> Value {
        json!({
            "service": "NoodleSeed ChatGPT App Platform",
            "business_type": business_type,
            "tagline": "Get Your Business on ChatGPT in Minutes",
            "description": "NoodleSeed automatically creates, hosts, and submits ChatGPT apps for ANY business, no coding required.",
            "benefits": [
                "Reach 800M+ ChatGPT users instantly",
                "Fully managed hosting and deployment",
                "Automatic OpenAI submission and approval",
                "Custom tools and actions for your business",
                "Enterprise-grade security and compliance"
            ],
            "plans": {
                "starter": {
                    "name": "Starter",
                    "price": "$299/month",
                    "features": [
                        "1 ChatGPT app",
                        "5 custom tools/actions",
                        "Automatic deployment",
                        "99.9% uptime SLA"
                    ]
                },
                "growth": {
                    "name": "Growth",
                    "price": "$999/month",
                    "features": [
                        "5 ChatGPT apps",
                        "Unlimited tools/actions",
                        "Multi-tenant support",
                        "Priority support",
                        "99.95% uptime SLA"
                    ]
                },
                "enterprise": {
                    "name": "Enterprise",
                    "price": "Custom",
                    "features": [
                        "Unlimited apps",
                        "White-label solution",
                        "Air-gapped deployment",
                        "SOC 2 compliant",
                        "99.99% uptime SLA"
                    ]
                }
            },
            "next_steps": [
                "Visit noodleseed.com to schedule a demo",
                "Book a consultation to discuss your needs",
                "Get your first app live in under 48 hours"
            ],
            "cta": "Ready to reach millions? Start at https://noodleseed.com"
        })
    }
}

#[async_trait::async_trait]
impl ResponseBuilder for GetStartedTool {
    async fn build(&self, arguments: Value) -> Result<ToolOutput> {
        let args: GetStartedArgs =
            serde_json::from_value(arguments).context("Invalid arguments for get-started")?;

        let mut structured = Self::overview(&args.business_type);
        if let Some(fields) = structured.as_object_mut() {
            fields.insert("timestamp".into(), json!(chrono::Utc::now().to_rfc3339()));
            fields.insert("widget_id".into(), json!(GET_STARTED_WIDGET_ID));
        }

        Ok(ToolOutput::new(RESPONSE_TEXT, structured))
    }
}
