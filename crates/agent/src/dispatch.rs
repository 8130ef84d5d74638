//! Tool dispatch with per-call failure isolation.

use serde_json::Value;
use tracing::warn;

use crate::catalog::ToolCatalog;
use crate::provider::{ProviderSet, ToolProvider};
use crate::turn::{ToolCallOutcome, ToolCallRequest};

/// Execute a batch of tool-call requests.
///
/// One outcome per request, in request order. A failed call never aborts
/// the batch: it becomes an error outcome and the remaining requests still
/// execute. A name the catalog does not route is answered without
/// contacting any provider.
pub async fn dispatch<P: ToolProvider>(
    catalog: &ToolCatalog,
    providers: &ProviderSet<P>,
    requests: Vec<ToolCallRequest>,
) -> Vec<ToolCallOutcome> {
    let mut outcomes = Vec::with_capacity(requests.len());
    for request in requests {
        outcomes.push(dispatch_one(catalog, providers, request).await);
    }
    outcomes
}

async fn dispatch_one<P: ToolProvider>(
    catalog: &ToolCatalog,
    providers: &ProviderSet<P>,
    request: ToolCallRequest,
) -> ToolCallOutcome {
    let provider = catalog
        .resolve(&request.name)
        .and_then(|alias| providers.get(alias).map(|p| (alias, p)));

    let Some((alias, provider)) = provider else {
        warn!(tool = %request.name, "tool not advertised by any provider");
        return ToolCallOutcome::error(
            request.name.clone(),
            format!("tool '{}' not available", request.name),
        );
    };

    match provider
        .call_tool(&request.name, Value::Object(request.arguments))
        .await
    {
        Ok(blocks) => ToolCallOutcome::content(request.name, blocks),
        Err(e) => {
            warn!(tool = %request.name, provider = alias, error = %e, "tool call failed");
            ToolCallOutcome::error(
                request.name.clone(),
                format!("error executing tool '{}': {e}", request.name),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::OutcomePayload;
    use crate::testing::FakeProvider;
    use serde_json::json;
    use std::sync::Arc;

    fn request(name: &str) -> ToolCallRequest {
        ToolCallRequest::new(name, serde_json::Map::new())
    }

    async fn catalog_for(providers: &ProviderSet<FakeProvider>) -> ToolCatalog {
        ToolCatalog::collect(providers).await.unwrap()
    }

    #[tokio::test]
    async fn outcomes_match_requests_in_order() {
        let provider = Arc::new(
            FakeProvider::new()
                .with_tool("list_workbook_files", "", json!({}))
                .with_tool("read_sheet", "", json!({}))
                .with_response("list_workbook_files", vec!["accounts.json"])
                .with_response("read_sheet", vec!["[]"]),
        );
        let providers = ProviderSet::new().register("sheets", provider);
        let catalog = catalog_for(&providers).await;

        let outcomes = dispatch(
            &catalog,
            &providers,
            vec![request("read_sheet"), request("list_workbook_files")],
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].tool_name, "read_sheet");
        assert_eq!(outcomes[1].tool_name, "list_workbook_files");
    }

    #[tokio::test]
    async fn unknown_tool_contacts_no_provider() {
        let provider = Arc::new(FakeProvider::new().with_tool("read_sheet", "", json!({})));
        let providers = ProviderSet::new().register("sheets", provider.clone());
        let catalog = catalog_for(&providers).await;

        let outcomes = dispatch(&catalog, &providers, vec![request("drop_table")]).await;

        assert_eq!(outcomes.len(), 1);
        match &outcomes[0].payload {
            OutcomePayload::Error(message) => assert!(message.contains("drop_table")),
            other => panic!("expected error outcome, got {other:?}"),
        }
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_call_does_not_abort_batch() {
        let provider = Arc::new(
            FakeProvider::new()
                .with_tool("read_sheet", "", json!({}))
                .with_tool("write_cell", "", json!({}))
                .with_failure("read_sheet", "file 'missing.json' not found")
                .with_response("write_cell", vec!["ok"]),
        );
        let providers = ProviderSet::new().register("sheets", provider.clone());
        let catalog = catalog_for(&providers).await;

        let outcomes = dispatch(
            &catalog,
            &providers,
            vec![request("read_sheet"), request("write_cell")],
        )
        .await;

        assert!(outcomes[0].is_error());
        assert_eq!(
            outcomes[1].payload,
            OutcomePayload::Content(vec!["ok".to_string()])
        );
        assert_eq!(provider.call_count(), 2);
    }
}
