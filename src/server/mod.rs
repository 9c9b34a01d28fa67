use axum::{
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::config::default_database_path_in;
use crate::graph::{Entity, ObservationAddition, ObservationDeletion, Relation};
use crate::storage::{KnowledgeGraphStore, StoreRegistry};

pub mod mcp;
pub mod routes;

/// Server state shared by the MCP and HTTP request layers
pub struct AppState {
    pub registry: Arc<StoreRegistry>,
    pub default_database: PathBuf,
}

impl AppState {
    pub fn new(registry: Arc<StoreRegistry>, default_database: PathBuf) -> Self {
        Self { registry, default_database }
    }

    /// Pick the store for a request: the project's own database when a
    /// project directory is given, the default database otherwise
    pub fn store_for(&self, project: Option<&str>) -> crate::Result<Arc<KnowledgeGraphStore>> {
        let path = match project.map(str::trim) {
            Some(project) if !project.is_empty() => default_database_path_in(Path::new(project)),
            _ => self.default_database.clone(),
        };
        self.registry.get_or_open(&path)
    }
}

// Request payloads, shared by MCP tool arguments and HTTP bodies.

#[derive(Debug, Deserialize)]
pub struct ProjectArgs {
    pub project: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntitiesArgs {
    pub project: Option<String>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
pub struct RelationsArgs {
    pub project: Option<String>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationsArgs {
    pub project: Option<String>,
    pub observations: Vec<ObservationAddition>,
}

#[derive(Debug, Deserialize)]
pub struct DeletionsArgs {
    pub project: Option<String>,
    pub deletions: Vec<ObservationDeletion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityNamesArgs {
    pub project: Option<String>,
    pub entity_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamesArgs {
    pub project: Option<String>,
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub project: Option<String>,
    pub query: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/graph", get(routes::read_graph))
        .route("/search", get(routes::search_nodes))
        .route("/open", post(routes::open_nodes))
        .route("/stats", get(routes::get_stats))
        .route("/entities", post(routes::create_entities))
        .route("/entities/delete", post(routes::delete_entities))
        .route("/relations", post(routes::create_relations))
        .route("/relations/delete", post(routes::delete_relations))
        .route("/observations", post(routes::add_observations))
        .route("/observations/delete", post(routes::delete_observations))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(Arc::clone(&state));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, closing {} store(s)", state.registry.len());
    state.registry.close_all();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
