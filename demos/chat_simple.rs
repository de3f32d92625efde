//! Single-shot chat completion and engine listing.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY="your-api-key"
//! RUST_LOG=openai_v1=debug cargo run --example chat_simple
//! ```

use openai_v1::{ChatCompletionRequest, ChatMessage, ChatModel, OpenAiClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = OpenAiClient::from_env()?;

    let engines = client.engines().list().await?;
    println!("=== Engines ({}) ===", engines.data.len());
    for engine in &engines.data {
        let known = engine.name().map_or("unregistered", |_| "registered");
        println!("{} ({})", engine.id, known);
    }

    let request = ChatCompletionRequest::for_model(
        ChatModel::Gpt4Turbo,
        vec![
            ChatMessage::system("You are Yoda from Star Wars."),
            ChatMessage::user("Is Vader good or evil?"),
        ],
    )
    .with_max_tokens(64)
    .with_stop(["\n\n", "###"]);

    println!("\nSending request...");

    match client.chat().completions().create(request).await {
        Ok(completion) => {
            println!("\n=== Response ===");
            if let Some(usage) = &completion.usage {
                println!("Prompt tokens: {}", usage.prompt_tokens);
                println!("Completion tokens: {}", usage.completion_tokens);
            }
            for choice in &completion.choices {
                println!(
                    "Choice {} ({:?}): {}",
                    choice.index,
                    choice.finish_reason,
                    choice.text().unwrap_or_default()
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
