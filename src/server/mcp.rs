use std::sync::Arc;
use crate::server::{
    AppState, DeletionsArgs, EntitiesArgs, EntityNamesArgs, NamesArgs, ObservationsArgs,
    ProjectArgs, RelationsArgs, SearchArgs,
};
use mcp_sdk_rs::server::{Server, ServerHandler};
use mcp_sdk_rs::types::{
    Tool, ToolResult, ListToolsResult, MessageContent,
    Implementation, ClientCapabilities, ServerCapabilities
};
use mcp_sdk_rs::error::ErrorCode;
use mcp_sdk_rs::transport::stdio::StdioTransport;
use mcp_sdk_rs::error::Error;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Deserialize)]
struct CallToolRequest {
    name: String,
    arguments: Option<Value>,
}

/// MCP front-end: one tool per store operation
#[derive(Clone)]
pub struct McpService {
    state: Arc<AppState>,
}

impl McpService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let (read_tx, read_rx) = mpsc::channel::<String>(32);
        let (write_tx, write_rx) = mpsc::channel::<String>(32);

        // Stdin reader
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if read_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        // Stdout writer
        tokio::spawn(write_lines(tokio::io::stdout(), write_rx));

        let transport = StdioTransport::new(read_rx, write_tx);
        let server = Server::new(Arc::new(transport), Arc::new(self.clone()));
        let result = server.start().await;

        self.state.registry.close_all();
        result?;
        Ok(())
    }

    /// Run one tool against the store selected by its `project` argument
    pub fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, Error> {
        tracing::debug!("tools/call {}", name);
        match name {
            "create_entities" => {
                let args: EntitiesArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                to_value(&store.create_entities(&args.entities).map_err(store_error)?)
            }
            "create_relations" => {
                let args: RelationsArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                to_value(&store.create_relations(&args.relations).map_err(store_error)?)
            }
            "add_observations" => {
                let args: ObservationsArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                to_value(&store.add_observations(&args.observations).map_err(store_error)?)
            }
            "delete_entities" => {
                let args: EntityNamesArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                store.delete_entities(&args.entity_names).map_err(store_error)?;
                Ok(json!("Entities deleted successfully"))
            }
            "delete_observations" => {
                let args: DeletionsArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                store.delete_observations(&args.deletions).map_err(store_error)?;
                Ok(json!("Observations deleted successfully"))
            }
            "delete_relations" => {
                let args: RelationsArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                store.delete_relations(&args.relations).map_err(store_error)?;
                Ok(json!("Relations deleted successfully"))
            }
            "read_graph" => {
                let args: ProjectArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                to_value(&store.read_graph().map_err(store_error)?)
            }
            "search_nodes" => {
                let args: SearchArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                to_value(&store.search_nodes(&args.query).map_err(store_error)?)
            }
            "open_nodes" => {
                let args: NamesArgs = parse_args(arguments)?;
                let store = self.store(args.project.as_deref())?;
                to_value(&store.open_nodes(&args.names).map_err(store_error)?)
            }
            _ => Err(Error::protocol(ErrorCode::MethodNotFound, name.to_string())),
        }
    }

    fn store(&self, project: Option<&str>) -> Result<Arc<crate::KnowledgeGraphStore>, Error> {
        self.state.store_for(project).map_err(store_error)
    }
}

/// Forward outgoing messages one per line; stops once the output is gone
async fn write_lines<W: AsyncWrite + Unpin>(mut out: W, mut rx: mpsc::Receiver<String>) {
    while let Some(msg) = rx.recv().await {
        let written = async {
            out.write_all(msg.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await
        }
        .await;
        if let Err(e) = written {
            tracing::warn!("Failed to write MCP output, stopping writer: {}", e);
            break;
        }
    }
}

fn store_error(e: crate::Error) -> Error {
    match e {
        crate::Error::EntityNotFound(_) => Error::protocol(ErrorCode::InvalidParams, e.to_string()),
        _ => Error::protocol(ErrorCode::InternalError, e.to_string()),
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, Error> {
    serde_json::from_value(arguments).map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
}

/// Text handed back to the client: plain strings as-is, everything else pretty JSON
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Wrap a tool's output for the client. Objects are also passed through as
/// structured content; arrays and strings only travel as text.
fn tool_result(value: Value) -> ToolResult {
    let text = render(&value);
    ToolResult {
        content: vec![MessageContent::Text { text }],
        structured_content: value.is_object().then_some(value),
    }
}

fn project_property() -> Value {
    json!({
        "type": "string",
        "description": "Project directory; its .kgmem/memory.db is used instead of the default database"
    })
}

fn entity_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "description": "The name of the entity" },
            "entityType": { "type": "string", "description": "The type of the entity" },
            "observations": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Observation contents associated with the entity"
            }
        },
        "required": ["name", "entityType", "observations"]
    })
}

fn relation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "from": { "type": "string", "description": "Name of the entity where the relation starts" },
            "to": { "type": "string", "description": "Name of the entity where the relation ends" },
            "relationType": { "type": "string", "description": "The type of the relation" }
        },
        "required": ["from", "to", "relationType"]
    })
}

fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> Result<Tool, Error> {
    let mut properties = properties;
    if let Value::Object(map) = &mut properties {
        map.insert("project".to_string(), project_property());
    }
    Ok(Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::from_value(json!({
            "type": "object",
            "properties": properties,
            "required": required
        })).map_err(|e| Error::protocol(ErrorCode::ParseError, e.to_string()))?,
        annotations: None,
    })
}

pub fn tool_definitions() -> Result<Vec<Tool>, Error> {
    let string_list = json!({ "type": "array", "items": { "type": "string" } });

    Ok(vec![
        tool(
            "create_entities",
            "Create multiple new entities in the knowledge graph. Entities whose name already exists are skipped",
            json!({ "entities": { "type": "array", "items": entity_schema() } }),
            &["entities"],
        )?,
        tool(
            "create_relations",
            "Create multiple new relations between entities. Relations should be in active voice",
            json!({ "relations": { "type": "array", "items": relation_schema() } }),
            &["relations"],
        )?,
        tool(
            "add_observations",
            "Add new observations to existing entities. Fails if any entity does not exist",
            json!({
                "observations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "entityName": { "type": "string" },
                            "contents": string_list.clone()
                        },
                        "required": ["entityName", "contents"]
                    }
                }
            }),
            &["observations"],
        )?,
        tool(
            "delete_entities",
            "Delete entities and their observations and relations",
            json!({ "entityNames": string_list.clone() }),
            &["entityNames"],
        )?,
        tool(
            "delete_observations",
            "Delete specific observations from entities",
            json!({
                "deletions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "entityName": { "type": "string" },
                            "observations": string_list.clone()
                        },
                        "required": ["entityName", "observations"]
                    }
                }
            }),
            &["deletions"],
        )?,
        tool(
            "delete_relations",
            "Delete multiple relations from the knowledge graph",
            json!({ "relations": { "type": "array", "items": relation_schema() } }),
            &["relations"],
        )?,
        tool("read_graph", "Read the entire knowledge graph", json!({}), &[])?,
        tool(
            "search_nodes",
            "Search for entities by name, type or observation content (case-insensitive)",
            json!({ "query": { "type": "string" } }),
            &["query"],
        )?,
        tool(
            "open_nodes",
            "Open specific entities by name, with the relations between them",
            json!({ "names": string_list }),
            &["names"],
        )?,
    ])
}

#[async_trait]
impl ServerHandler for McpService {
    async fn initialize(
        &self,
        _implementation: Implementation,
        _capabilities: ClientCapabilities
    ) -> Result<ServerCapabilities, Error> {
        Ok(ServerCapabilities::default())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        tracing::info!("Shutdown requested, closing {} store(s)", self.state.registry.len());
        self.state.registry.close_all();
        Ok(())
    }

    async fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        match method {
            "tools/list" => {
                let result = ListToolsResult { tools: tool_definitions()?, next_cursor: None };
                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            },
            "tools/call" => {
                let req: CallToolRequest = params.and_then(|v| serde_json::from_value(v).ok())
                    .ok_or(Error::protocol(ErrorCode::InvalidParams, "Missing params"))?;

                let value = self.call_tool(&req.name, req.arguments.unwrap_or_else(|| json!({})))?;

                let result = tool_result(value);

                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            },
            _ => Err(Error::protocol(ErrorCode::MethodNotFound, method.to_string()))
        }
    }
}
