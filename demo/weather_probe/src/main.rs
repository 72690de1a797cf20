use fncall_core::{CallOutcome, ChatMessage, LlmClient, ToolChoice, ToolDefinition};
use serde_json::json;
use tracing::{info, warn};

fn weather_tool() -> ToolDefinition {
    ToolDefinition::function(
        "get_weather",
        "Get the current weather in a given location",
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city and state, e.g. San Francisco, CA"
                },
                "unit": {
                    "type": "string",
                    "enum": ["celsius", "fahrenheit"]
                }
            },
            "required": ["location"]
        }),
    )
}

/// Log an outcome; text streams are drained so the answer shows up in the log
async fn report(
    scenario: &str,
    outcome: Option<CallOutcome>,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        None => warn!(target = "weather_probe", scenario, "call failed (see error above)"),
        Some(CallOutcome::Text(stream)) => {
            let text = stream.collect_text().await?;
            info!(target = "weather_probe", scenario, %text, "text answer");
        }
        Some(CallOutcome::ToolCalls(calls)) => {
            for (index, call) in &calls {
                info!(
                    target = "weather_probe",
                    scenario,
                    index,
                    id = %call.id,
                    name = %call.function.name,
                    arguments = %call.function.arguments,
                    "tool call"
                );
            }
        }
        Some(CallOutcome::Incomplete(partial)) => {
            warn!(target = "weather_probe", scenario, partial = partial.len(), "stream cut off");
        }
        Some(CallOutcome::Completion(completion)) => {
            info!(
                target = "weather_probe",
                scenario,
                text = completion.text().unwrap_or_default(),
                tool_calls = completion.tool_calls().len(),
                "completion"
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,fncall_core=info,weather_probe=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let client = LlmClient::from_env()?;
    info!(
        target = "weather_probe",
        base_url = %client.config().base_url,
        model = %client.config().model,
        "Starting weather probe"
    );

    let messages = vec![
        ChatMessage::system("You are a helpful assistant."),
        ChatMessage::user("What's the weather in Shanghai?"),
    ];
    let tools = [weather_tool()];

    // 1) no tools: expect a text stream
    let outcome = client
        .call_with_function_call(&messages, None, ToolChoice::Auto, true)
        .await;
    report("no_tools", outcome).await?;

    // 2) tools offered, model decides
    let outcome = client
        .call_with_function_call(&messages, Some(&tools[..]), ToolChoice::Auto, true)
        .await;
    report("auto_choice", outcome).await?;

    // 3) forced tool call: expect assembled tool calls
    let outcome = client
        .call_with_function_call(
            &messages,
            Some(&tools[..]),
            ToolChoice::Function("get_weather".to_string()),
            true,
        )
        .await;
    if !matches!(outcome, Some(CallOutcome::ToolCalls(_))) {
        warn!(target = "weather_probe", "forced tool choice did not yield tool calls");
    }
    report("forced_tool", outcome).await?;

    // 4) non-streaming, for comparison
    let outcome = client
        .call_with_function_call(&messages, Some(&tools[..]), ToolChoice::Auto, false)
        .await;
    report("blocking", outcome).await?;

    info!(target = "weather_probe", "All scenarios done");
    Ok(())
}
