//! Fan-out rounds against a stub generation endpoint over real HTTP.

use super::test_utils::StubServer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use persona_sim::generation::{
    FanOutOrchestrator, HttpGenerationClient, RetryPolicy, VariantSource, FALLBACK_WARNING,
};
use persona_sim::local::generate_for_persona;
use persona_sim::types::{BaseCreative, Channel, Persona, Tone};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
enum Reply {
    Body(Value),
    Status(u16),
    Hang,
}

#[derive(Default)]
struct Endpoint {
    script: Mutex<HashMap<usize, VecDeque<Reply>>>,
    calls: Mutex<Vec<usize>>,
}

impl Endpoint {
    fn scripted(script: Vec<(usize, Vec<Reply>)>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|(idx, replies)| (idx, replies.into_iter().collect()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls_for(&self, idx: usize) -> usize {
        self.calls.lock().iter().filter(|&&i| i == idx).count()
    }
}

fn variants_body(idx: usize) -> Value {
    json!({ "idx": idx, "variants": [
        { "tone": "fun/energetic", "subjects": ["s"], "bodies": [format!("remote fun {idx}")] },
        { "tone": "humorous/cheeky", "subjects": ["s"], "bodies": [format!("remote cheeky {idx}")] },
        { "tone": "formal/professional", "subjects": ["s"], "bodies": [format!("remote formal {idx}")] },
    ]})
}

async fn handle(State(endpoint): State<Arc<Endpoint>>, Json(body): Json<Value>) -> Response {
    let idx = body["idx"].as_u64().unwrap_or(0) as usize;
    endpoint.calls.lock().push(idx);
    let reply = endpoint
        .script
        .lock()
        .get_mut(&idx)
        .and_then(VecDeque::pop_front)
        .unwrap_or_else(|| Reply::Body(variants_body(idx)));

    match reply {
        Reply::Body(value) => Json(value).into_response(),
        Reply::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "idx": idx, "error": "upstream_failed", "status": code })),
        )
            .into_response(),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(variants_body(idx)).into_response()
        }
    }
}

async fn start(endpoint: Arc<Endpoint>) -> (StubServer, String) {
    let app = Router::new()
        .route("/api/generate-persona", post(handle))
        .with_state(endpoint);
    let server = StubServer::start(app).await;
    let url = format!("{}/api/generate-persona", server.url);
    (server, url)
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        attempt_timeout: Duration::from_millis(400),
        backoff: Duration::from_millis(10),
        jitter: Duration::from_millis(5),
    }
}

fn personas() -> Vec<Persona> {
    vec![
        Persona::new("Value-Seeker Vanessa", "Budget-conscious, hunts deals"),
        Persona::new("Premium Peter", "Frequent buyer, prioritizes convenience"),
        Persona::new("Busy Parent Pat", "Household of five, short on time"),
    ]
}

fn base() -> BaseCreative {
    BaseCreative {
        brief: "Announce a new onboarding perk".to_string(),
        channel: Channel::Email,
        subject: Some("Welcome perk".to_string()),
        message: "We've streamlined your first steps.".to_string(),
    }
}

#[tokio::test]
async fn test_all_personas_generated_remotely() {
    let endpoint = Endpoint::scripted(vec![]);
    let (server, url) = start(endpoint.clone()).await;

    let client = HttpGenerationClient::new(url).unwrap();
    let round = FanOutOrchestrator::new(client, fast_policy())
        .run_generation(&personas(), &base())
        .await;

    assert_eq!(round.results.len(), 3);
    assert!(round.warning.is_none());
    for idx in 0..3 {
        let variants = round.results.variants(idx).unwrap();
        assert_eq!(variants[0].bodies[0], format!("remote fun {idx}"));
        assert_eq!(endpoint.calls_for(idx), 1);
    }
    assert_eq!(*endpoint.calls.lock(), vec![0, 1, 2], "requests are sequential in index order");

    server.stop().await;
}

#[tokio::test]
async fn test_failing_persona_falls_back_alone() {
    let endpoint = Endpoint::scripted(vec![(1, vec![Reply::Status(502), Reply::Status(502)])]);
    let (server, url) = start(endpoint.clone()).await;

    let client = HttpGenerationClient::new(url).unwrap();
    let round = FanOutOrchestrator::new(client, fast_policy())
        .run_generation(&personas(), &base())
        .await;

    assert_eq!(round.warning.as_deref(), Some(FALLBACK_WARNING));
    assert_eq!(round.results.fallback_indices(), vec![1]);
    assert_eq!(
        round.results.variants(1).unwrap(),
        generate_for_persona(&personas()[1], &base()).as_slice()
    );
    assert_eq!(round.results.get(0).unwrap().source, VariantSource::Remote);
    assert_eq!(round.results.get(2).unwrap().source, VariantSource::Remote);
    assert_eq!(endpoint.calls_for(1), 2, "exactly one retry");

    server.stop().await;
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let endpoint = Endpoint::scripted(vec![(0, vec![Reply::Status(500)])]);
    let (server, url) = start(endpoint.clone()).await;

    let client = HttpGenerationClient::new(url).unwrap();
    let round = FanOutOrchestrator::new(client, fast_policy())
        .run_generation(&personas()[..1], &base())
        .await;

    let result = round.results.get(0).unwrap();
    assert_eq!(result.source, VariantSource::Remote);
    assert_eq!(result.attempts, 2);
    assert!(round.warning.is_none());

    server.stop().await;
}

#[tokio::test]
async fn test_slow_endpoint_times_out_into_fallback() {
    let endpoint = Endpoint::scripted(vec![(0, vec![Reply::Hang, Reply::Hang])]);
    let (server, url) = start(endpoint.clone()).await;

    let client = HttpGenerationClient::new(url).unwrap();
    let started = std::time::Instant::now();
    let round = FanOutOrchestrator::new(client, fast_policy())
        .run_generation(&personas()[..2], &base())
        .await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(round.results.get(0).unwrap().source, VariantSource::Fallback);
    assert_eq!(round.results.get(1).unwrap().source, VariantSource::Remote);
    assert!(round.used_fallback());

    server.stop().await;
}

#[tokio::test]
async fn test_raw_and_by_persona_bodies_are_normalized() {
    let endpoint = Endpoint::scripted(vec![
        (0, vec![Reply::Body(json!({ "idx": 0, "raw": "Free-form copy" }))]),
        (
            1,
            vec![Reply::Body(json!({ "byPersona": [
                { "idx": 0, "variants": [{ "tone": "fun/energetic", "bodies": ["wrong"] }] },
                { "idx": 1, "variants": [{ "tone": "humorous/cheeky", "bodies": ["right"] }] },
            ]}))],
        ),
        (2, vec![Reply::Body(json!({ "unexpected": true })), Reply::Body(json!("text"))]),
    ]);
    let (server, url) = start(endpoint).await;

    let client = HttpGenerationClient::new(url).unwrap();
    let round = FanOutOrchestrator::new(client, fast_policy())
        .run_generation(&personas(), &base())
        .await;

    let raw = round.results.variants(0).unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].tone, Tone::FormalProfessional);
    assert_eq!(raw[0].bodies, vec!["Free-form copy".to_string()]);

    let by_persona = round.results.variants(1).unwrap();
    assert_eq!(by_persona[0].bodies, vec!["right".to_string()]);

    assert_eq!(round.results.fallback_indices(), vec![2]);

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_falls_back_for_everyone() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpGenerationClient::new(format!("http://{addr}/api/generate-persona")).unwrap();
    let round = FanOutOrchestrator::new(client, fast_policy())
        .run_generation(&personas(), &base())
        .await;

    assert_eq!(round.results.len(), 3);
    assert_eq!(round.results.fallback_indices(), vec![0, 1, 2]);
}
