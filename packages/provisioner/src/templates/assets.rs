//! Prompts and tool schemas compiled into the binary

use anyhow::{Context, Result};

use crate::provision::agents::ToolSpec;

pub mod prompts {
    pub const LOGS_ASSISTANT: &str = include_str!("../../assets/prompts/logs_assistant.md");
    pub const SQL_AGENT: &str = include_str!("../../assets/prompts/sql_agent.md");
    pub const TWILIO_AGENT: &str = include_str!("../../assets/prompts/twilio_agent.md");
    /// Placeholders: `{product_name}`, `{product_description}`
    pub const PRODUCT_DOCS: &str = include_str!("../../assets/prompts/product_docs.md");
    /// Placeholder: `{data_description}`
    pub const QUIZ_AGENT: &str = include_str!("../../assets/prompts/quiz_agent.md");
    pub const DATA_ANALYSIS: &str = include_str!("../../assets/prompts/data_analysis.md");
    pub const AUDITOR: &str = include_str!("../../assets/prompts/auditor.md");
    pub const CRITIC: &str = include_str!("../../assets/prompts/critic.md");
    pub const REVISER: &str = include_str!("../../assets/prompts/reviser.md");
}

pub mod tools {
    pub const GET_LOGS: &str = include_str!("../../assets/tools/get_logs.json");
    pub const GET_SCHEMA: &str = include_str!("../../assets/tools/get_schema.json");
    pub const EXECUTE_QUERY: &str = include_str!("../../assets/tools/execute_query.json");
    pub const SEND_MESSAGE: &str = include_str!("../../assets/tools/send_message.json");
    pub const LIST_FILES: &str = include_str!("../../assets/tools/list_files.json");
    pub const LOAD_CSV: &str = include_str!("../../assets/tools/load_csv.json");
    pub const GET_COLUMN_INFO: &str = include_str!("../../assets/tools/get_column_info.json");
    pub const EXECUTE_PANDAS_CODE: &str =
        include_str!("../../assets/tools/execute_pandas_code.json");
    pub const SEARCH: &str = include_str!("../../assets/tools/search.json");
    pub const INVOKE_CRITIC: &str = include_str!("../../assets/tools/invoke_critic.json");
    pub const INVOKE_REVISOR: &str = include_str!("../../assets/tools/invoke_revisor.json");
}

/// Parse an embedded tool schema
pub fn tool_spec(raw: &str) -> Result<ToolSpec> {
    serde_json::from_str(raw).context("Embedded tool schema is not valid")
}

/// Replace `{key}` placeholders in a prompt
pub fn fill_prompt(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |prompt, (key, value)| {
        prompt.replace(&format!("{{{}}}", key), value)
    })
}
