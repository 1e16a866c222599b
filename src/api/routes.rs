//! Router, shared state and the agent endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::knowledge;
use super::types::{
    BrainDumpRequest, ExecuteTaskRequest, ExecuteTaskResponse, HealthResponse, ParseInputRequest,
};
use crate::agent::{Agent, BrainDumpAnalysis, ExecutionContext, ParsedInput, PlanningContext};
use crate::knowledge::{KnowledgeStore, KnowledgeWriter};

/// Shared application state.
pub struct AppState {
    pub agent: Arc<Agent>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub facts: KnowledgeWriter,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks/execute", post(execute_task))
        .route("/api/brain-dump", post(brain_dump))
        .route("/api/parse", post(parse_input))
        .route(
            "/api/knowledge",
            get(knowledge::list_facts).post(knowledge::add_fact),
        )
        .route("/api/knowledge/:id", delete(knowledge::delete_fact))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run the execution loop for one task.
///
/// Always 200: failures are reported in the body, mirroring `Agent::execute`.
async fn execute_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteTaskRequest>,
) -> Json<ExecuteTaskResponse> {
    tracing::info!("Executing task {:?} ({})", req.task.title, req.task.id);

    let report = state
        .agent
        .execute_detailed(ExecutionContext {
            task: &req.task,
            instruction: req.instruction.as_deref(),
            history: &req.history,
            profile: &req.profile,
            location: req.location,
            knowledge: state.knowledge.as_ref(),
        })
        .await;

    if report.truncated {
        tracing::warn!(
            "Task {} stopped after {} tool rounds with calls pending",
            req.task.id,
            report.rounds
        );
    }

    Json(report.into())
}

async fn brain_dump(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BrainDumpRequest>,
) -> Json<BrainDumpAnalysis> {
    let analysis = state
        .agent
        .analyze_brain_dump(
            &req.history,
            PlanningContext {
                profile: &req.profile,
                knowledge: state.knowledge.as_ref(),
                facts: &state.facts,
            },
        )
        .await;
    Json(analysis)
}

async fn parse_input(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ParseInputRequest>,
) -> Json<ParsedInput> {
    let parsed = state
        .agent
        .parse_natural_input(
            &req.input,
            PlanningContext {
                profile: &req.profile,
                knowledge: state.knowledge.as_ref(),
                facts: &state.facts,
            },
        )
        .await;
    Json(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::InMemoryKnowledgeStore;
    use crate::llm::mock::MockLlmClient;
    use crate::llm::{ModelResponse, ToolCall};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(mock: MockLlmClient) -> Router {
        let knowledge: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new());
        let (facts, _task) = KnowledgeWriter::spawn(knowledge.clone());
        let agent = Agent::with_client(Arc::new(mock), "gemini-2.5-flash", 5);
        router(Arc::new(AppState {
            agent: Arc::new(agent),
            knowledge,
            facts,
        }))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let resp = app(MockLlmClient::new())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn execute_runs_tools_and_returns_report() {
        let mut args = serde_json::Map::new();
        args.insert("location".to_string(), json!("Lisbon"));
        let mock = MockLlmClient::new()
            .queue(ModelResponse::from_calls(vec![ToolCall {
                id: "c1".to_string(),
                name: "getCurrentWeather".to_string(),
                arguments: args,
            }]))
            .queue(ModelResponse::from_text("Pack sunglasses."));

        let resp = app(mock)
            .oneshot(post_json(
                "/api/tasks/execute",
                json!({
                    "task": {"id": "t1", "title": "Check Lisbon weather"},
                    "profile": {"name": "Ana", "email": "ana@example.com"}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["result"], "Pack sunglasses.");
        assert_eq!(body["rounds"], 1);
        assert_eq!(body["truncated"], false);
        assert!(body.get("failure").is_none());
    }

    #[tokio::test]
    async fn execute_without_key_reports_failure_in_body() {
        let resp = app(MockLlmClient::without_credentials())
            .oneshot(post_json(
                "/api/tasks/execute",
                json!({"task": {"title": "Anything"}}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["result"], "API Key missing.");
        assert_eq!(body["failure"], "missing_credentials");
    }

    #[tokio::test]
    async fn parse_returns_tasks() {
        let mock = MockLlmClient::new().queue(ModelResponse::from_text(
            r#"{"newTasks":[{"title":"Call mom","estimatedDuration":15,"priority":"MEDIUM","energyCost":"LOW","category":"LIFE","isAiGeneratable":false,"autoExecuteWithAI":false}],"suggestions":"Evening works."}"#,
        ));
        let resp = app(mock)
            .oneshot(post_json("/api/parse", json!({"input": "call mom tonight"})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["newTasks"][0]["title"], "Call mom");
        assert_eq!(body["newTasks"][0]["status"], "PENDING");
        assert_eq!(body["suggestions"], "Evening works.");
    }

    #[tokio::test]
    async fn brain_dump_without_key_uses_fallback() {
        let resp = app(MockLlmClient::without_credentials())
            .oneshot(post_json(
                "/api/brain-dump",
                json!({"history": [{"role": "user", "content": "everything is on fire"}]}),
            ))
            .await
            .unwrap();

        let body = body_json(resp).await;
        assert_eq!(body["strategy"], "API Key Missing");
        assert_eq!(body["isComplete"], true);
    }

    #[tokio::test]
    async fn knowledge_crud_maps_errors() {
        let app = app(MockLlmClient::new());

        let created = app
            .clone()
            .oneshot(post_json("/api/knowledge", json!({"fact": "Prefers mornings"})))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let duplicate = app
            .clone()
            .oneshot(post_json("/api/knowledge", json!({"fact": "prefers MORNINGS"})))
            .await
            .unwrap();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let empty = app
            .clone()
            .oneshot(post_json("/api/knowledge", json!({"fact": "   "})))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let listed = app
            .clone()
            .oneshot(Request::get("/api/knowledge").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let facts = body_json(listed).await;
        assert_eq!(facts.as_array().map(Vec::len), Some(1));
        assert_eq!(facts[0]["fact"], "Prefers mornings");

        let deleted = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/knowledge/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = app
            .oneshot(
                Request::delete(format!("/api/knowledge/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
