//! AWS Lambda handler for underwriting quotes
//!
//! Accepts an applicant profile plus a quote target as JSON and returns the
//! aggregated decision and monthly premium.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use underwriting_engine::{
    ApplicantProfile, DecisionEngine, EngineConfig, EngineSnapshot, Quote, QuoteRequest,
    UnderwritingError,
};

/// Input for the quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteEvent {
    profile: ApplicantProfile,
    request: QuoteRequest,
}

/// Output from the quote endpoint
#[derive(Debug, Serialize)]
struct QuoteResponse {
    #[serde(flatten)]
    quote: Quote,
    execution_time_ms: u64,
}

fn error_response(status: u16, message: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(format!(
            r#"{{"error":{}}}"#,
            serde_json::to_string(message).unwrap_or_else(|_| "\"error\"".to_string())
        )))
        .unwrap()
}

fn json_response(body: &QuoteResponse) -> Response<Body> {
    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Lambda handler function
async fn handler(engine: Arc<DecisionEngine>, event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(200)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)
            .unwrap());
    }

    // Parse request body
    let body_str = match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    };

    let quote_event: QuoteEvent = match serde_json::from_str(&body_str) {
        Ok(r) => r,
        Err(e) => {
            return Ok(error_response(400, &format!("Invalid JSON: {}", e)));
        }
    };

    match engine.quote(&quote_event.profile, &quote_event.request) {
        Ok(quote) => Ok(json_response(&QuoteResponse {
            quote,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })),
        // Rate gaps are a client-visible "rate not available", not a 500
        Err(err @ UnderwritingError::OutOfRange(_)) => Ok(error_response(422, &err.to_string())),
        Err(err) => Ok(error_response(400, &err.to_string())),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    // Load the configuration snapshot once per cold start; every request
    // evaluates against the same immutable data
    let snapshot = EngineSnapshot::load_from_dir(std::path::Path::new("data"))
        .map_err(|e| Error::from(e.to_string()))?;
    let engine = Arc::new(DecisionEngine::new(snapshot, EngineConfig::default()));

    run(service_fn(move |event| {
        let engine = Arc::clone(&engine);
        handler(engine, event)
    }))
    .await
}
