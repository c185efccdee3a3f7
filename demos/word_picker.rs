//! Word Picker - example of the transform-and-reply service.
//!
//! This example demonstrates:
//! - Loading a [`Vocabulary`] and registering it under `word.found`
//! - Configuring the service from `SYNC_MODE` / `CALLBACK_URL`
//! - Plugging in a [`CallbackTransport`] for callback mode
//!
//! # Running
//!
//! ```text
//! RUST_LOG=debug cargo run --example word_picker
//! SYNC_MODE=1 cargo run --example word_picker
//! ```
//!
//! An optional first argument names a JSON word table file.

use std::sync::Arc;

use cloudevent_codec::delivery::{BoxFuture, CallbackTransport};
use cloudevent_codec::handler::InboundRequest;
use cloudevent_codec::vocabulary::{Vocabulary, WORD_FOUND_PREFIX};
use cloudevent_codec::{Codec, EventRecord, Mode, Result, ServiceBuilder, WireMessage};
use http::{StatusCode, Uri};
use tracing_subscriber::EnvFilter;

const DEFAULT_WORDS: &str = r#"{
    "noun": ["frog", "kettle", "lighthouse"],
    "verb": ["leap", "whistle", "ponder"],
    "adjective": ["soggy", "luminous"]
}"#;

/// Prints deliveries instead of sending them.
struct StdoutTransport;

impl CallbackTransport for StdoutTransport {
    fn post(&self, url: Uri, message: WireMessage) -> BoxFuture<'static, Result<StatusCode>> {
        Box::pin(async move {
            println!("POST {}", url);
            for (name, value) in &message.headers {
                println!("  {}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            println!("  {}", String::from_utf8_lossy(&message.body));
            Ok(StatusCode::ACCEPTED)
        })
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let words = match std::env::args().nth(1) {
        Some(path) => Vocabulary::from_path(path)?,
        None => Vocabulary::from_json(DEFAULT_WORDS)?,
    };
    tracing::info!("Loaded {} word categories", words.len());

    let service = ServiceBuilder::from_env()
        .transform(WORD_FOUND_PREFIX, words)
        .transport(Arc::new(StdoutTransport))
        .build()?;

    // One structured and one binary request
    let codec = Codec::new();
    let requests = [
        (Mode::Structured, "word.found.noun"),
        (Mode::Binary, "word.found.verb"),
    ];

    for (mode, event_type) in requests {
        let mut inbound: EventRecord = EventRecord::new(event_type, "/demo");
        let request = InboundRequest::from(codec.encode(&mut inbound, mode)?);

        let reply = service.handle(request).await;
        println!("{:?} request {} -> {}", mode, inbound.id, reply.status);
        if !reply.body.is_empty() {
            println!("  {}", reply.text());
        }
    }

    // Let callback deliveries finish before exiting
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Ok(())
}
