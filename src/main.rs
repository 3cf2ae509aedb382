// ABOUTME: Entry point for the ibis binary.
// ABOUTME: Parses CLI arguments, initializes tracing, wires the agent, and starts the HTTP server.

use std::sync::Arc;

use clap::Parser;

use ibis_agent::crew::{CHIEF_QA_ENGINEER_PROMPT, CodingTool, DevCrew, SENIOR_ENGINEER_PROMPT};
use ibis_agent::providers::LEAD_ENGINEER_PROMPT;
use ibis_agent::{ChatAgent, Telemetry, Workflow, all_tool_definitions, create_model_runtime};
use ibis_server::{AppState, ServerConfig, create_router};

/// Conversational coding agent server.
#[derive(Parser, Debug)]
#[command(name = "ibis", version, about)]
struct Args {
    /// Socket address to bind, overriding IBIS_BIND.
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,

    /// LLM provider to use, overriding IBIS_PROVIDER.
    #[arg(long)]
    provider: Option<String>,

    /// Model name, overriding IBIS_MODEL.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ibis=debug,tower_http=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(model) = args.model {
        config.model = Some(model);
    }

    // The lead engineer fronts the chat and may delegate; the crew stages
    // get their own runtimes with stage-specific prompts and no tools.
    let model = config.model.as_deref();
    let lead = create_model_runtime(
        &config.provider,
        model,
        LEAD_ENGINEER_PROMPT,
        all_tool_definitions(),
    )?;
    let engineer =
        create_model_runtime(&config.provider, model, SENIOR_ENGINEER_PROMPT, Vec::new())?;
    let qa =
        create_model_runtime(&config.provider, model, CHIEF_QA_ENGINEER_PROMPT, Vec::new())?;

    let telemetry = Telemetry::new("ibis");
    let workflow = Workflow::new(lead, config.max_steps)
        .with_tool(Arc::new(CodingTool::new(DevCrew::new(engineer, qa))));
    let agent = ChatAgent::new(workflow, telemetry.clone());

    let state = Arc::new(AppState::new(agent, telemetry));
    let router = create_router(state);

    tracing::info!(bind = %config.bind, provider = %config.provider, "ibis starting up");
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
