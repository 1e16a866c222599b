//! Knowledge endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::routes::AppState;
use super::types::AddKnowledgeRequest;
use crate::knowledge::{KnowledgeError, KnowledgeFact};

/// List learned facts, oldest first.
pub async fn list_facts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<KnowledgeFact>>, (StatusCode, String)> {
    state
        .knowledge
        .facts()
        .await
        .map(Json)
        .map_err(knowledge_error)
}

/// Store a fact entered by the user.
pub async fn add_fact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddKnowledgeRequest>,
) -> Result<(StatusCode, Json<KnowledgeFact>), (StatusCode, String)> {
    let fact = state
        .knowledge
        .append(&req.fact)
        .await
        .map_err(knowledge_error)?;
    Ok((StatusCode::CREATED, Json(fact)))
}

/// Delete a fact by id.
pub async fn delete_fact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .knowledge
        .remove(&id)
        .await
        .map_err(knowledge_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn knowledge_error(e: KnowledgeError) -> (StatusCode, String) {
    let status = match &e {
        KnowledgeError::Empty => StatusCode::BAD_REQUEST,
        KnowledgeError::Duplicate => StatusCode::CONFLICT,
        KnowledgeError::NotFound(_) => StatusCode::NOT_FOUND,
        KnowledgeError::Io(_) | KnowledgeError::Corrupt(_) => {
            tracing::error!("Knowledge store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}
