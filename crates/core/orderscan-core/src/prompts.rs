//! Prompt templates for the summarizer and the field extractor

use crate::{OrderScanError, Result};
use handlebars::Handlebars;
use serde_json::json;

/// Per-chunk extraction prompt (map pass)
pub const MAP_PROMPT_TEMPLATE: &str = r#"Detailed analysis of text (part {{part}}/{{total}}):

{{chunk}}

Please extract ALL relevant information from this text. Do not omit any important details.
Your goal is to create a complete document containing all significant information from the original text.
Include:
- All facts, data, and statistics
- All important dates and events
- All names and entities mentioned
- All conclusions and recommendations
- Any technical or specific information

Organize the information clearly and structured, but maintain ALL important details.
"#;

/// Consolidation prompt (reduce pass)
pub const REDUCE_PROMPT_TEMPLATE: &str = r#"Based on the detailed analyses below, create a complete and cohesive final document:

{{analyses}}

Your goal is to consolidate all this information into a comprehensive single document.
DO NOT simplify or omit important information.
Organize the content logically and structured, maintaining ALL relevant details.
"#;

/// Structured field extraction prompt
pub const FIELDS_PROMPT_TEMPLATE: &str = r#"Please extract the following fields from the text below. If a field is not found, return "N/A".
Maintain the exact format specified:

Text:
{{text}}

Required fields (FORMAT FIELD: VALUE):
{{#each fields}}
{{this}}:
{{/each}}
"#;

/// Renders prompt templates. Values are inserted verbatim (no HTML escaping).
#[derive(Clone)]
pub struct PromptEngine {
    handlebars: Handlebars<'static>,
}

impl PromptEngine {
    /// Create a new prompt engine
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template with JSON data
    pub fn render(&self, template: &str, data: &serde_json::Value) -> Result<String> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| OrderScanError::template(e.to_string()))
    }

    /// Map-pass prompt for chunk `part` of `total` (1-based)
    pub fn map_prompt(&self, part: usize, total: usize, chunk: &str) -> Result<String> {
        self.render(
            MAP_PROMPT_TEMPLATE,
            &json!({ "part": part, "total": total, "chunk": chunk }),
        )
    }

    /// Reduce-pass prompt over the concatenated chunk analyses
    pub fn reduce_prompt(&self, analyses: &str) -> Result<String> {
        self.render(REDUCE_PROMPT_TEMPLATE, &json!({ "analyses": analyses }))
    }

    /// Field extraction prompt listing `fields` in order
    pub fn fields_prompt(&self, text: &str, fields: &[&str]) -> Result<String> {
        self.render(FIELDS_PROMPT_TEMPLATE, &json!({ "text": text, "fields": fields }))
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}
