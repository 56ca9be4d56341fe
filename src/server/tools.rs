use std::sync::Arc;

use serde::Deserialize;

use rmcp::{Error as McpError, ServerHandler, model::*, schemars, tool};

use crate::gemini::GeminiClient;
use crate::relevance::RelevancePipeline;
use crate::storage::StandardsStore;

/// The MCP service exposing the standards folder.
///
/// Every internal failure is converted into a successful tool response whose
/// text describes the failure. Callers such as LLM agents inspect the text,
/// not protocol status codes, so no error may cross the transport boundary.
#[derive(Clone)]
pub struct Standards {
    store: Arc<StandardsStore>,
    pipeline: Arc<RelevancePipeline<GeminiClient>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadEstandarFileRequest {
    #[schemars(description = "Name of the markdown file (with or without .md extension)")]
    pub filename: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRelevantStandardsRequest {
    #[schemars(description = "User's query or message to find relevant standards")]
    #[serde(rename = "userQuery")]
    pub user_query: String,
}

#[tool(tool_box)]
impl Standards {
    pub fn new(store: Arc<StandardsStore>, pipeline: RelevancePipeline<GeminiClient>) -> Self {
        Self {
            store,
            pipeline: Arc::new(pipeline),
        }
    }

    #[tool(
        name = "read-estandar-file",
        description = "Read the content of a markdown file from the estandares folder"
    )]
    async fn read_estandar_file(
        &self,
        #[tool(aggr)] ReadEstandarFileRequest { filename }: ReadEstandarFileRequest,
    ) -> Result<CallToolResult, McpError> {
        let resolved = self.store.resolve_filename(&filename);

        let text = match self.store.read_document(&resolved) {
            Ok(content) => format!("Content of {resolved}:\n\n{content}"),
            Err(e) => format!("Error reading file: {e}"),
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "search-relevant-standards",
        description = "Search for the most relevant standard files based on user query using Gemini AI"
    )]
    async fn search_relevant_standards(
        &self,
        #[tool(aggr)] SearchRelevantStandardsRequest { user_query }: SearchRelevantStandardsRequest,
    ) -> Result<CallToolResult, McpError> {
        let text = match self.pipeline.search(&user_query).await {
            Ok(text) => text,
            Err(e) => format!("Error searching standards: {e}"),
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool(tool_box)]
impl ServerHandler for Standards {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some("This server provides access to the standard documents in the estandares folder. Use 'read-estandar-file' to read one document by name, or 'search-relevant-standards' to let Gemini pick the documents most relevant to a query.".to_string()),
        }
    }
}
