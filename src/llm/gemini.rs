//! Gemini `generateContent` REST client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use uuid::Uuid;

use super::{
    Content, GenerateRequest, GroundingMetadata, GroundingSource, LlmClient, LlmError,
    ModelResponse, Part, Role, ToolCall,
};

/// Client for the Gemini REST API.
pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
            client,
        }
    }

    fn generate_url(&self, model: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/v1beta/models/{}:generateContent", base, model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_content(&self, request: &GenerateRequest) -> Result<ModelResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let body = build_request_body(request);

        tracing::debug!(
            model = %request.model,
            turns = request.contents.len(),
            "Calling Gemini generateContent"
        );

        let response = self
            .client
            .post(self.generate_url(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        parse_response(raw)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request conversion
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    system_instruction: Value,
    contents: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

fn build_request_body(request: &GenerateRequest) -> WireRequest {
    let mut tools = Vec::new();
    if request.grounding {
        tools.push(json!({ "googleSearch": {} }));
        tools.push(json!({ "googleMaps": {} }));
    }
    if !request.functions.is_empty() {
        tools.push(json!({ "functionDeclarations": request.functions }));
    }

    let tool_config = request.location.map(|loc| {
        json!({
            "retrievalConfig": {
                "latLng": { "latitude": loc.latitude, "longitude": loc.longitude }
            }
        })
    });

    let generation_config = request.response_schema.as_ref().map(|schema| {
        json!({
            "responseMimeType": "application/json",
            "responseSchema": schema
        })
    });

    WireRequest {
        system_instruction: json!({ "parts": [{ "text": request.system_instruction }] }),
        contents: request.contents.iter().map(content_to_wire).collect(),
        tools,
        tool_config,
        generation_config,
    }
}

fn content_to_wire(content: &Content) -> Value {
    if let Some(raw) = &content.raw {
        return raw.clone();
    }

    let role = match content.role {
        Role::User => "user",
        Role::Model => "model",
        Role::Tool => "function",
    };

    let parts: Vec<Value> = content
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::ToolCall(call) => json!({
                "functionCall": { "id": call.id, "name": call.name, "args": call.arguments }
            }),
            Part::ToolResult(result) => json!({
                "functionResponse": {
                    "id": result.call_id,
                    "name": result.name,
                    "response": { "result": result.result }
                }
            }),
        })
        .collect();

    json!({ "role": role, "parts": parts })
}

// ─────────────────────────────────────────────────────────────────────────────
// Response conversion
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct WireGroundingChunk {
    #[serde(default)]
    web: Option<WireReference>,
    #[serde(default)]
    maps: Option<WireReference>,
}

#[derive(Debug, Deserialize)]
struct WireReference {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Convert a raw `generateContent` response into a [`ModelResponse`].
///
/// Function calls without an id get a fresh UUID, written back into the raw
/// content so the replayed turn and the tool results agree.
fn parse_response(raw: Value) -> Result<ModelResponse, LlmError> {
    let candidate = match raw.get("candidates").and_then(|c| c.get(0)) {
        Some(candidate) => candidate.clone(),
        None => {
            if let Some(reason) = raw
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str())
            {
                return Err(LlmError::Parse(format!("prompt blocked: {}", reason)));
            }
            return Ok(ModelResponse::default());
        }
    };

    let grounding = match candidate.get("groundingMetadata") {
        Some(meta) => {
            let meta: WireGroundingMetadata = serde_json::from_value(meta.clone())
                .map_err(|e| LlmError::Parse(format!("groundingMetadata: {}", e)))?;
            Some(convert_grounding(meta))
        }
        None => None,
    };

    let Some(mut raw_content) = candidate.get("content").cloned() else {
        return Ok(ModelResponse {
            grounding,
            ..Default::default()
        });
    };

    let mut parts = Vec::new();
    let mut texts = Vec::new();
    let mut calls = Vec::new();

    if let Some(wire_parts) = raw_content.get_mut("parts").and_then(|p| p.as_array_mut()) {
        for wire_part in wire_parts.iter_mut() {
            if let Some(text) = wire_part.get("text").and_then(|t| t.as_str()) {
                // Thought summaries are not part of the answer.
                if wire_part.get("thought").and_then(|t| t.as_bool()) != Some(true) {
                    texts.push(text.to_string());
                    parts.push(Part::Text(text.to_string()));
                }
                continue;
            }

            let Some(call_value) = wire_part.get_mut("functionCall") else {
                continue;
            };
            let call: WireFunctionCall = serde_json::from_value(call_value.clone())
                .map_err(|e| LlmError::Parse(format!("functionCall: {}", e)))?;
            let id = match call.id.filter(|id| !id.is_empty()) {
                Some(id) => id,
                None => {
                    let id = Uuid::new_v4().to_string();
                    if let Some(obj) = call_value.as_object_mut() {
                        obj.insert("id".to_string(), Value::String(id.clone()));
                    }
                    id
                }
            };
            let call = ToolCall {
                id,
                name: call.name,
                arguments: call.args.unwrap_or_default(),
            };
            parts.push(Part::ToolCall(call.clone()));
            calls.push(call);
        }
    }

    let text = if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    };

    Ok(ModelResponse {
        content: Some(Content {
            role: Role::Model,
            parts,
            raw: Some(raw_content),
        }),
        text,
        function_calls: calls,
        grounding,
    })
}

fn convert_grounding(meta: WireGroundingMetadata) -> GroundingMetadata {
    let mut sources = Vec::new();
    for chunk in meta.grounding_chunks {
        if let Some(WireReference {
            uri: Some(uri),
            title,
        }) = chunk.web
        {
            sources.push(GroundingSource::Web { title, uri });
        }
        if let Some(WireReference {
            uri: Some(uri),
            title,
        }) = chunk.maps
        {
            sources.push(GroundingSource::Maps { title, uri });
        }
    }
    GroundingMetadata { sources }
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.chars().take(500).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FunctionDeclaration, GeoLocation, ToolResult};

    fn request_with(contents: Vec<Content>) -> GenerateRequest {
        GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            system_instruction: "Be useful.".to_string(),
            contents,
            functions: vec![FunctionDeclaration {
                name: "getCurrentWeather".to_string(),
                description: "Weather".to_string(),
                parameters: json!({"type": "object"}),
            }],
            grounding: true,
            location: None,
            response_schema: None,
        }
    }

    #[test]
    fn generate_url_trims_trailing_slash() {
        let client = GeminiClient::new(
            Some("key".to_string()),
            "https://example.test/",
            Duration::from_secs(5),
        );
        assert_eq!(
            client.generate_url("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let client = GeminiClient::new(Some("  ".to_string()), "https://x", Duration::from_secs(1));
        assert!(!client.has_credentials());
    }

    #[test]
    fn request_body_declares_tools_and_location() {
        let mut request = request_with(vec![Content::user("hi")]);
        request.location = Some(GeoLocation {
            latitude: 52.5,
            longitude: 13.4,
        });
        let body = serde_json::to_value(build_request_body(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be useful.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["tools"][0], json!({"googleSearch": {}}));
        assert_eq!(body["tools"][1], json!({"googleMaps": {}}));
        assert_eq!(
            body["tools"][2]["functionDeclarations"][0]["name"],
            "getCurrentWeather"
        );
        assert_eq!(
            body["toolConfig"]["retrievalConfig"]["latLng"]["latitude"],
            52.5
        );
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn request_body_requests_json_when_schema_given() {
        let mut request = request_with(vec![Content::user("plan")]);
        request.grounding = false;
        request.functions.clear();
        request.response_schema = Some(json!({"type": "OBJECT"}));
        let body = serde_json::to_value(build_request_body(&request)).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("toolConfig").is_none());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn tool_results_are_sent_as_function_responses() {
        let mut result = Map::new();
        result.insert("status".to_string(), json!("success"));
        let turn = Content::tool_results(vec![ToolResult {
            call_id: "call-1".to_string(),
            name: "sendEmail".to_string(),
            result,
        }]);
        let wire = content_to_wire(&turn);

        assert_eq!(wire["role"], "function");
        let response = &wire["parts"][0]["functionResponse"];
        assert_eq!(response["id"], "call-1");
        assert_eq!(response["name"], "sendEmail");
        assert_eq!(response["response"]["result"]["status"], "success");
    }

    #[test]
    fn raw_content_is_replayed_verbatim() {
        let raw = json!({
            "role": "model",
            "parts": [{"functionCall": {"id": "a", "name": "x", "args": {}}, "thoughtSignature": "sig"}]
        });
        let turn = Content {
            role: Role::Model,
            parts: vec![],
            raw: Some(raw.clone()),
        };
        assert_eq!(content_to_wire(&turn), raw);
    }

    #[test]
    fn parse_response_extracts_calls_and_assigns_missing_ids() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Sending now."},
                        {"functionCall": {"name": "sendEmail", "args": {"to": "a@b.c"}}},
                        {"functionCall": {"id": "given", "name": "getCurrentWeather", "args": {"location": "Oslo"}}}
                    ]
                }
            }]
        });
        let response = parse_response(raw).unwrap();

        assert_eq!(response.text.as_deref(), Some("Sending now."));
        assert_eq!(response.function_calls.len(), 2);
        let generated = &response.function_calls[0].id;
        assert!(!generated.is_empty());
        assert_eq!(response.function_calls[1].id, "given");
        assert_eq!(response.function_calls[0].arguments["to"], "a@b.c");

        let content = response.content.unwrap();
        let raw = content.raw.unwrap();
        assert_eq!(raw["parts"][1]["functionCall"]["id"], generated.as_str());
    }

    #[test]
    fn parse_response_skips_thought_parts() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Done."}
                ]}
            }]
        });
        let response = parse_response(raw).unwrap();
        assert_eq!(response.text.as_deref(), Some("Done."));
        assert!(!response.has_pending_calls());
    }

    #[test]
    fn parse_response_reads_grounding_chunks() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Answer"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.test", "title": "A"}},
                        {"maps": {"uri": "https://maps.test/b"}},
                        {"web": {"title": "no uri"}}
                    ]
                }
            }]
        });
        let grounding = parse_response(raw).unwrap().grounding.unwrap();
        assert_eq!(
            grounding.sources,
            vec![
                GroundingSource::Web {
                    title: Some("A".to_string()),
                    uri: "https://a.test".to_string()
                },
                GroundingSource::Maps {
                    title: None,
                    uri: "https://maps.test/b".to_string()
                },
            ]
        );
    }

    #[test]
    fn blocked_prompt_is_a_parse_error() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = parse_response(raw).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn empty_candidates_yield_empty_response() {
        let response = parse_response(json!({"candidates": []})).unwrap();
        assert_eq!(response, ModelResponse::default());
    }

    #[test]
    fn error_message_prefers_structured_body() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(extract_error_message(body), "API key not valid");
        assert_eq!(extract_error_message("plain failure"), "plain failure");
    }
}
