use anyhow::{anyhow, Context, Result};
use clap::Parser;
use sent_mail_labeler::config::{DEFAULT_AUTHORITY, DEFAULT_GRAPH_BASE_URL};
use sent_mail_labeler::manifest::Manifest;
use sent_mail_labeler::{
    pipeline, DeviceCodeFlow, InteractiveLabeler, MessageFetcher, StaticToken, TerminalConsole,
    TimeWindow, TokenProvider,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Application (client) id registered with the identity provider
    #[arg(long, env = "LABELER_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "LABELER_TENANT", default_value = "common")]
    tenant: String,

    /// Yes/no question shown with every message
    #[arg(long, env = "LABELER_QUESTION")]
    question: String,

    #[arg(long, env = "LABELER_OUTPUT")]
    output: PathBuf,

    /// Start of the sent-date window (RFC 3339 or YYYY-MM-DD, UTC)
    #[arg(long, env = "LABELER_START")]
    start: String,

    /// End of the sent-date window (RFC 3339 or YYYY-MM-DD, UTC)
    #[arg(long, env = "LABELER_END")]
    end: String,

    /// Pre-issued bearer token; skips device-code sign-in
    #[arg(long, env = "LABELER_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[arg(long, env = "LABELER_GRAPH_BASE_URL", default_value = DEFAULT_GRAPH_BASE_URL)]
    graph_base_url: String,

    #[arg(long, env = "LABELER_AUTHORITY", default_value = DEFAULT_AUTHORITY)]
    authority: String,

    /// Write a JSON run summary here after a successful run
    #[arg(long, env = "LABELER_MANIFEST")]
    manifest: Option<PathBuf>,
}

fn token_provider(args: &Args) -> Result<Box<dyn TokenProvider>> {
    if let Some(token) = &args.access_token {
        return Ok(Box::new(StaticToken::new(token.clone())));
    }
    let client_id = args
        .client_id
        .clone()
        .ok_or_else(|| anyhow!("either --client-id or --access-token is required"))?;
    Ok(Box::new(DeviceCodeFlow::new(
        args.authority.clone(),
        args.tenant.clone(),
        client_id,
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Settings may also come from a .env file in the working directory.
    dotenvy::dotenv().ok();

    // stdout belongs to the operator prompt.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,sent_mail_labeler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let started = Instant::now();
    let run_id = Uuid::new_v4();

    let window = TimeWindow::parse(&args.start, &args.end).context("invalid time window")?;
    let query_url = window.sent_items_query(&args.graph_base_url);
    let provider = token_provider(&args)?;
    tracing::info!(%run_id, start = %window.start, end = %window.end, "Starting labelling run");

    let console = TerminalConsole::stdout();
    console
        .ensure_interactive()
        .context("stdout is not a terminal; run without redirecting output")?;
    let mut labeler = InteractiveLabeler::new(console, args.question.clone());
    let stats = pipeline::run(
        provider.as_ref(),
        &MessageFetcher::new(),
        &query_url,
        &mut labeler,
        &args.output,
    )
    .await
    .with_context(|| format!("labelling run into {} failed", args.output.display()))?;

    if let Some(manifest_path) = &args.manifest {
        Manifest::new(
            run_id,
            &args.output,
            window,
            stats.clone(),
            started.elapsed().as_secs_f64(),
        )?
        .write_to(manifest_path)
        .with_context(|| format!("write {}", manifest_path.display()))?;
    }

    println!(
        "OK output={} fetched={} skipped={} written={} positive={} duration_s={:.2}",
        args.output.display(),
        stats.fetched,
        stats.skipped_total(),
        stats.written,
        stats.positive,
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
