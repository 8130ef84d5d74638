//! @mention context injection and prompt shaping.
//!
//! A message like "Compare @accounts.json with @opps.json" pulls the
//! mentioned workbooks through the sheets provider and embeds their rows in
//! the prompt, so the model can answer without a tool round.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

/// File names mentioned as `@name` words in a query.
pub fn mentioned_files(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter_map(|word| word.strip_prefix('@'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render fetched sheets as tagged context blocks.
pub fn render_context(found: &[(String, String)]) -> String {
    found
        .iter()
        .map(|(file, data)| format!("<sheet file=\"{file}\">\n{data}\n</sheet>"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap the user's message and any fetched context in the assistant prompt.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a CRM and spreadsheet analysis assistant.\n\
         \n\
         User query:\n\
         <user>{query}</user>\n\
         \n\
         Use the workbook tools to fetch or edit sheet data when needed.\n\
         Only use tools when necessary.\n\
         \n\
         Context (if provided):\n\
         <context>\n\
         {context}\n\
         </context>\n\
         \n\
         Rules:\n\
         - Never mention the context block.\n\
         - Answer clearly and professionally.\n\
         - Do not invent sheet or file names.\n"
    )
}

/// Expands user messages into model prompts, injecting mentioned sheets.
pub struct ContextBuilder {
    sheets: Option<Arc<mcp::Client>>,
}

impl ContextBuilder {
    /// `sheets` is the provider used to resolve mentions; without one,
    /// mentions are left alone.
    pub fn new(sheets: Option<Arc<mcp::Client>>) -> Self {
        Self { sheets }
    }

    /// Build the full prompt for one user message.
    pub async fn expand(&self, query: &str) -> String {
        let context = self.gather(query).await;
        build_prompt(query, &context)
    }

    async fn gather(&self, query: &str) -> String {
        let Some(client) = &self.sheets else {
            return String::new();
        };

        let mentioned = mentioned_files(query);
        if mentioned.is_empty() {
            return String::new();
        }

        let files = match client.call_tool("list_workbook_files", None).await {
            Ok(result) => result
                .content
                .iter()
                .filter_map(|c| c.as_text().map(str::to_string))
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(error = %e, "could not list workbook files for mentions");
                return String::new();
            }
        };

        let mut found = Vec::new();
        for file in files {
            if !mentioned.contains(&file) {
                continue;
            }
            match client
                .call_tool("read_sheet", Some(json!({"file_name": file})))
                .await
            {
                Ok(result) => {
                    if let Some(text) = result.content.first().and_then(|c| c.as_text()) {
                        found.push((file, text.to_string()));
                    }
                }
                Err(e) => {
                    warn!(file = %file, error = %e, "could not read mentioned sheet");
                }
            }
        }

        render_context(&found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_mentions() {
        assert_eq!(
            mentioned_files("Compare @accounts.json with @opps.json please"),
            vec!["accounts.json", "opps.json"]
        );
        assert!(mentioned_files("no mentions here").is_empty());
        assert!(mentioned_files("a bare @ is ignored").is_empty());
    }

    #[test]
    fn renders_tagged_blocks() {
        let context = render_context(&[(
            "accounts.json".to_string(),
            "[{\"Name\":\"Acme\"}]".to_string(),
        )]);
        assert_eq!(
            context,
            "<sheet file=\"accounts.json\">\n[{\"Name\":\"Acme\"}]\n</sheet>"
        );
    }

    #[test]
    fn prompt_embeds_query_and_context() {
        let prompt = build_prompt("list files", "<sheet file=\"a.json\">[]</sheet>");
        assert!(prompt.contains("<user>list files</user>"));
        assert!(prompt.contains("<sheet file=\"a.json\">[]</sheet>"));
    }
}
