use axum::{
    extract::{Query, State},
    Json,
    http::StatusCode,
};
use serde::Serialize;
use crate::server::{
    AppState, DeletionsArgs, EntitiesArgs, EntityNamesArgs, NamesArgs, ObservationsArgs,
    ProjectArgs, RelationsArgs, SearchArgs,
};
use crate::graph::{AddedObservations, Entity, GraphStats, KnowledgeGraph, Relation};
use crate::Error;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(e: Error) -> ApiError {
    let status = match e {
        Error::EntityNotFound(_) => StatusCode::NOT_FOUND,
        Error::Closed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

fn deleted(message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": message }))
}

pub async fn read_graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectArgs>,
) -> ApiResult<KnowledgeGraph> {
    let store = state.store_for(params.project.as_deref()).map_err(api_error)?;
    store.read_graph().map(Json).map_err(api_error)
}

pub async fn search_nodes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchArgs>,
) -> ApiResult<KnowledgeGraph> {
    let store = state.store_for(params.project.as_deref()).map_err(api_error)?;
    store.search_nodes(&params.query).map(Json).map_err(api_error)
}

pub async fn open_nodes(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NamesArgs>,
) -> ApiResult<KnowledgeGraph> {
    let store = state.store_for(body.project.as_deref()).map_err(api_error)?;
    store.open_nodes(&body.names).map(Json).map_err(api_error)
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectArgs>,
) -> ApiResult<GraphStats> {
    let store = state.store_for(params.project.as_deref()).map_err(api_error)?;
    store.stats().map(Json).map_err(api_error)
}

pub async fn create_entities(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EntitiesArgs>,
) -> ApiResult<Vec<Entity>> {
    let store = state.store_for(body.project.as_deref()).map_err(api_error)?;
    store.create_entities(&body.entities).map(Json).map_err(api_error)
}

pub async fn delete_entities(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EntityNamesArgs>,
) -> ApiResult<serde_json::Value> {
    let store = state.store_for(body.project.as_deref()).map_err(api_error)?;
    store.delete_entities(&body.entity_names).map_err(api_error)?;
    Ok(deleted("Entities deleted successfully"))
}

pub async fn create_relations(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RelationsArgs>,
) -> ApiResult<Vec<Relation>> {
    let store = state.store_for(body.project.as_deref()).map_err(api_error)?;
    store.create_relations(&body.relations).map(Json).map_err(api_error)
}

pub async fn delete_relations(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RelationsArgs>,
) -> ApiResult<serde_json::Value> {
    let store = state.store_for(body.project.as_deref()).map_err(api_error)?;
    store.delete_relations(&body.relations).map_err(api_error)?;
    Ok(deleted("Relations deleted successfully"))
}

pub async fn add_observations(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ObservationsArgs>,
) -> ApiResult<Vec<AddedObservations>> {
    let store = state.store_for(body.project.as_deref()).map_err(api_error)?;
    store.add_observations(&body.observations).map(Json).map_err(api_error)
}

pub async fn delete_observations(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeletionsArgs>,
) -> ApiResult<serde_json::Value> {
    let store = state.store_for(body.project.as_deref()).map_err(api_error)?;
    store.delete_observations(&body.deletions).map_err(api_error)?;
    Ok(deleted("Observations deleted successfully"))
}
