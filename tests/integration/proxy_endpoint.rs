//! Generation endpoint server against a stub chat-completion provider.

use super::test_utils::StubServer;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use persona_sim::config::ProxyConfig;
use persona_sim::generation::{
    FanOutOrchestrator, GenerationClient, HttpGenerationClient, RetryPolicy, VariantSource,
};
use persona_sim::proxy::{router, ProxyState, BATCH_ROUTE, PERSONA_ROUTE};
use persona_sim::types::{BaseCreative, Channel, Persona, Tone};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
enum ProviderReply {
    Content(String),
    PlainText(String),
    Status(u16),
}

struct Provider {
    reply: Mutex<ProviderReply>,
    seen: Mutex<Vec<(Option<String>, Value)>>,
}

impl Provider {
    fn new(reply: ProviderReply) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply),
            seen: Mutex::new(Vec::new()),
        })
    }
}

async fn completions(
    State(provider): State<Arc<Provider>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    provider.seen.lock().push((auth, body));

    let reply = provider.reply.lock().clone();
    match reply {
        ProviderReply::Content(content) => Json(json!({
            "id": "chatcmpl-test",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        }))
        .into_response(),
        ProviderReply::PlainText(text) => (StatusCode::OK, text).into_response(),
        ProviderReply::Status(code) => {
            (StatusCode::from_u16(code).unwrap(), "provider unavailable").into_response()
        }
    }
}

struct Stack {
    provider: Arc<Provider>,
    provider_server: StubServer,
    proxy_server: StubServer,
}

impl Stack {
    async fn start(reply: ProviderReply) -> Self {
        let provider = Provider::new(reply);
        let provider_server = StubServer::start(
            Router::new()
                .route("/v1/chat/completions", post(completions))
                .with_state(provider.clone()),
        )
        .await;

        let config = ProxyConfig {
            api_base: provider_server.url.clone(),
            api_key: Some("sk-test".to_string()),
            upstream_timeout_ms: 2_000,
            ..ProxyConfig::default()
        };
        let state = Arc::new(ProxyState::from_config(&config).unwrap());
        let proxy_server = StubServer::start(router(state)).await;

        Self {
            provider,
            provider_server,
            proxy_server,
        }
    }

    fn persona_url(&self) -> String {
        format!("{}{}", self.proxy_server.url, PERSONA_ROUTE)
    }

    fn batch_url(&self) -> String {
        format!("{}{}", self.proxy_server.url, BATCH_ROUTE)
    }

    async fn stop(self) {
        self.proxy_server.stop().await;
        self.provider_server.stop().await;
    }
}

fn base(channel: Channel) -> BaseCreative {
    BaseCreative {
        brief: "Announce a perk".to_string(),
        channel,
        subject: channel.is_email().then(|| "Welcome".to_string()),
        message: "Faster onboarding".to_string(),
    }
}

fn model_json() -> String {
    json!({ "variants": [
        { "tone": "fun/energetic", "subjects": ["Yay"], "bodies": ["Fun body"] },
        { "tone": "humorous/cheeky", "subjects": ["Heh"], "bodies": ["Cheeky body"] },
        { "tone": "formal/professional", "subjects": ["Dear"], "bodies": ["Formal body"] },
    ]})
    .to_string()
}

#[tokio::test]
async fn test_persona_route_forwards_prompt_and_returns_variants() {
    let stack = Stack::start(ProviderReply::Content(model_json())).await;
    let client = HttpGenerationClient::new(stack.persona_url()).unwrap();

    let body = client
        .request_variants(2, &Persona::new("Premium Peter", "vip"), &base(Channel::Email))
        .await
        .unwrap();
    assert_eq!(body["idx"], 2);
    assert_eq!(body["variants"].as_array().unwrap().len(), 3);

    let seen = stack.provider.seen.lock().clone();
    let (auth, request) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(request["model"], "gpt-4o");
    assert_eq!(request["stream"], false);
    let user = request["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("Persona name: Premium Peter"));
    assert!(user.contains("Subject seed: Welcome"));

    stack.stop().await;
}

#[tokio::test]
async fn test_round_through_proxy_uses_remote_variants() {
    let stack = Stack::start(ProviderReply::Content(model_json())).await;
    let client = HttpGenerationClient::new(stack.persona_url()).unwrap();
    let personas = vec![Persona::new("A", "deal hunter"), Persona::new("B", "tech explorer")];

    let round = FanOutOrchestrator::new(client, RetryPolicy::default())
        .run_generation(&personas, &base(Channel::Email))
        .await;

    assert!(round.warning.is_none());
    let variants = round.results.variants(1).unwrap();
    assert_eq!(variants[2].tone, Tone::FormalProfessional);
    assert_eq!(variants[2].bodies, vec!["Formal body".to_string()]);

    stack.stop().await;
}

#[tokio::test]
async fn test_plain_text_completion_becomes_formal_variant() {
    let stack = Stack::start(ProviderReply::Content("Just some plain copy".to_string())).await;
    let client = HttpGenerationClient::new(stack.persona_url()).unwrap();

    let round = FanOutOrchestrator::new(client, RetryPolicy::default())
        .run_generation(&[Persona::new("A", "")], &base(Channel::Sms))
        .await;

    let variants = round.results.variants(0).unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].tone, Tone::FormalProfessional);
    assert_eq!(variants[0].bodies[0], "Just some plain copy");

    stack.stop().await;
}

#[tokio::test]
async fn test_provider_failure_maps_to_bad_gateway_then_fallback() {
    let stack = Stack::start(ProviderReply::Status(503)).await;

    let response = reqwest::Client::new()
        .post(stack.persona_url())
        .json(&json!({ "idx": 0, "persona": { "name": "A", "description": "" }, "base": base(Channel::Sms) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "idx": 0, "error": "upstream_failed", "status": 503 }));

    let policy = RetryPolicy {
        backoff: Duration::from_millis(10),
        jitter: Duration::ZERO,
        ..RetryPolicy::default()
    };
    let client = HttpGenerationClient::new(stack.persona_url()).unwrap();
    let round = FanOutOrchestrator::new(client, policy)
        .run_generation(&[Persona::new("A", "budget")], &base(Channel::Sms))
        .await;
    assert_eq!(round.results.get(0).unwrap().source, VariantSource::Fallback);
    assert_eq!(round.results.get(0).unwrap().attempts, 2);

    stack.stop().await;
}

#[tokio::test]
async fn test_wrong_method_and_bad_body() {
    let stack = Stack::start(ProviderReply::Content(model_json())).await;
    let http = reqwest::Client::new();

    let response = http.get(stack.persona_url()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 405);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({ "error": "Use POST" }));

    let response = http
        .post(stack.batch_url())
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    stack.stop().await;
}

#[tokio::test]
async fn test_plain_text_provider_body_is_raw_on_batch_route() {
    let stack = Stack::start(ProviderReply::PlainText("Plain copy from a proxy".to_string())).await;
    let http = reqwest::Client::new();

    let response = http
        .post(stack.batch_url())
        .json(&json!({ "personas": [{ "name": "A", "description": "" }], "base": base(Channel::Sms) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "raw": "Plain copy from a proxy" })
    );

    let response = http
        .post(stack.persona_url())
        .json(&json!({ "idx": 0, "persona": { "name": "A", "description": "" }, "base": base(Channel::Sms) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({ "error": "server_error" }));

    stack.stop().await;
}

#[tokio::test]
async fn test_plain_text_provider_body_holding_json_is_passed_through() {
    let stack = Stack::start(ProviderReply::PlainText(model_json())).await;

    let response = reqwest::Client::new()
        .post(stack.batch_url())
        .json(&json!({ "personas": [], "base": base(Channel::Email) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["variants"].as_array().unwrap().len(), 3);

    stack.stop().await;
}
