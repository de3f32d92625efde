//! Streaming chat completion through callbacks.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY="your-api-key"
//! cargo run --example chat_streaming
//! ```

use std::io::Write;

use openai_v1::{ChatCompletionRequest, ChatMessage, EngineName, OpenAiClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = OpenAiClient::from_env()?;

    // Fails here, before any request, if the engine has no chat endpoint
    let request = ChatCompletionRequest::for_engine(
        EngineName::Gpt4oMini,
        vec![ChatMessage::user("Write a haiku about Rust.")],
    )?
    .with_temperature(0.7);

    let result = client
        .chat()
        .completions()
        .create_streaming(
            request,
            |_, frame| {
                if let Some(text) = frame.content() {
                    print!("{}", text);
                    let _ = std::io::stdout().flush();
                }
            },
            || println!("\n[stream complete]"),
        )
        .await;

    match result {
        Ok(completion) => println!("Finish reason: {:?}", completion.choices.first().and_then(|c| c.finish_reason)),
        Err(e) => eprintln!("Stream failed: {}", e),
    }

    Ok(())
}
