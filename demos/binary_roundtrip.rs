//! Binary Round Trip - example of encoding and decoding by hand.
//!
//! This example demonstrates:
//! - Encoding one event in both modes
//! - Mode detection on the resulting headers
//! - Decoding into a typed payload
//!
//! # Running
//!
//! ```text
//! RUST_LOG=debug cargo run --example binary_roundtrip
//! ```

use cloudevent_codec::{Codec, EventRecord, Mode};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Payload carried by the demo event.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct Word {
    word: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let codec = Codec::builder().emit_extension_headers(true).build();
    let original = EventRecord::new("word.picked.noun", "/demo").with_data(Word {
        word: "frog".to_string(),
    });

    for mode in [Mode::Structured, Mode::Binary] {
        let mut event = original.clone();
        let message = codec.encode(&mut event, mode)?;

        println!("== {:?}", mode);
        for (name, value) in &message.headers {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        println!("{}", String::from_utf8_lossy(&message.body));

        let detected = codec.detect(&message.headers);
        let decoded: EventRecord<Word> = codec.decode(&message.headers, &message.body)?;
        tracing::info!("detected {:?}, decoded id {}", detected, decoded.id);
        println!("decoded payload: {:?}\n", decoded.data);
    }

    Ok(())
}
