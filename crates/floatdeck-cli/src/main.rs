use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use floatdeck_core::{
    AiControls, CapabilityPoller, DashboardConfig, FetchOrchestrator, SessionEngine,
    QUICK_QUESTIONS,
};
use floatdeck_gateway::{Gateway, HttpGateway};
use floatdeck_schema::{CapabilityStatus, ChatMessage, FilterState, MessageSource, Variable};

#[derive(Parser)]
#[command(name = "floatdeck", version, about = "Ocean float telemetry dashboard client")]
struct Cli {
    /// Config root directory (holds floatdeck.yaml and logs/)
    #[arg(long, default_value = "~/.floatdeck")]
    config_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run one refresh cycle and print the result sets")]
    Fetch {
        #[arg(long, default_value = "temperature")]
        variable: Variable,
        #[arg(long, default_value = "2020-03-01")]
        start_date: NaiveDate,
        #[arg(long, default_value = "2020-05-30")]
        end_date: NaiveDate,
        #[arg(long)]
        min_lat: Option<f64>,
        #[arg(long)]
        max_lat: Option<f64>,
        #[arg(long)]
        min_lon: Option<f64>,
        #[arg(long)]
        max_lon: Option<f64>,
    },
    #[command(about = "Interactive chat against the backend")]
    Chat {
        #[arg(long, help = "Request the advanced AI route (capability-gated per message)")]
        advanced: bool,
    },
    #[command(about = "Probe backend AI availability once")]
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Expand ~ to home directory
    if cli.config_root.starts_with("~") {
        if let Some(home) = std::env::var_os("HOME") {
            cli.config_root = PathBuf::from(home).join(
                cli.config_root
                    .strip_prefix("~")
                    .unwrap_or(&cli.config_root),
            );
        }
    }

    let log_dir = cli.config_root.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "floatdeck.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let config = DashboardConfig::load(&cli.config_root.join("floatdeck.yaml"))?;
    tracing::info!(base_url = %config.base_url, "floatdeck client starting");
    let gateway: Arc<HttpGateway> = Arc::new(HttpGateway::with_timeout(
        config.base_url.as_str(),
        config.request_timeout(),
    ));

    match cli.command {
        Commands::Fetch {
            variable,
            start_date,
            end_date,
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } => {
            let filters = FilterState {
                variable,
                start_date,
                end_date,
                min_lat,
                max_lat,
                min_lon,
                max_lon,
                ..FilterState::default()
            };
            run_fetch(gateway, &config, &filters).await
        }
        Commands::Chat { advanced } => run_chat(gateway, &config, advanced).await,
        Commands::Status => {
            match gateway.ai_status().await {
                Ok(status) => println!("ai status: {status}"),
                Err(err) => println!("ai status: unreachable ({err})"),
            }
            Ok(())
        }
    }
}

async fn run_fetch(
    gateway: Arc<HttpGateway>,
    config: &DashboardConfig,
    filters: &FilterState,
) -> Result<()> {
    let orchestrator = FetchOrchestrator::new(
        gateway,
        config.profile_candidates.clone(),
        config.profile_cycle,
    );
    orchestrator.refresh(filters).await.join().await;

    let ts = orchestrator.time_series().await;
    println!(
        "daily {} averages, {} to {}:",
        filters.variable, filters.start_date, filters.end_date
    );
    if ts.data.is_empty() {
        println!("  no data found for these filters");
    } else {
        for point in ts.data.iter().take(10) {
            println!("  {}  {:.3}", point.day, point.avg_value);
        }
        if ts.data.len() > 10 {
            println!("  ... {} points total", ts.data.len());
        }
    }

    let floats = orchestrator.float_map().await;
    println!("map floats: {}", floats.data.len());

    let profile = orchestrator.profile().await;
    if profile.data.is_empty() {
        println!("depth profile: no profile data available");
    } else {
        println!("depth profile: {} points", profile.data.len());
        for point in profile.data.iter().take(5) {
            println!("  {:7.1} dbar  {:5.2} C", point.pressure, point.temperature);
        }
    }

    let catalog = orchestrator.catalog().await;
    println!("catalog floats: {}", catalog.data.len());
    for float in orchestrator.summary().await {
        let position = match (float.avg_lat, float.avg_lon) {
            (Some(lat), Some(lon)) => format!("{lat:.4}, {lon:.4}"),
            _ => "unmapped".to_string(),
        };
        println!(
            "  {}  {}  {} obs  last {}",
            float.float_id,
            position,
            float.total_observations,
            float.last_observation.date_naive()
        );
    }
    Ok(())
}

async fn run_chat(gateway: Arc<HttpGateway>, config: &DashboardConfig, advanced: bool) -> Result<()> {
    let controls = AiControls::new();
    controls.set_advanced_enabled(advanced);

    let cancel = CancellationToken::new();
    let poller = CapabilityPoller::new(gateway.clone(), controls.clone())
        .with_interval(config.poll_interval());
    let poller_handle = poller.spawn(cancel.clone());

    let engine = SessionEngine::new(gateway, controls.clone());
    for message in engine.transcript() {
        print_message(&message);
    }
    println!("quick questions (send with /q <n>, exit with /quit):");
    for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
        println!("  {}. {question}", i + 1);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = engine.transcript().len();
    loop {
        println!("[{}] ask away:", status_label(&controls));
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        match line.as_str() {
            "/quit" | "/exit" => break,
            cmd if cmd.starts_with("/q") => {
                let picked = cmd
                    .trim_start_matches("/q")
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| QUICK_QUESTIONS.get(n.wrapping_sub(1)).copied());
                match picked {
                    Some(question) => {
                        // Populates the buffer only; the empty line below sends.
                        engine.apply_quick_question(question);
                        println!("buffered: {question}");
                        println!("(press enter to send)");
                        continue;
                    }
                    None => {
                        println!("no such quick question");
                        continue;
                    }
                }
            }
            "" => {}
            text => engine.set_input(text),
        }

        engine.send().await;
        for message in engine.transcript().iter().skip(seen) {
            print_message(message);
        }
        seen = engine.transcript().len();
    }

    cancel.cancel();
    let _ = poller_handle.await;
    Ok(())
}

fn status_label(controls: &AiControls) -> &'static str {
    match controls.status() {
        CapabilityStatus::Loaded => "AI ready",
        CapabilityStatus::Checking => "checking AI",
        CapabilityStatus::NotLoaded => "AI loading",
        CapabilityStatus::Error => "database only",
    }
}

fn print_message(message: &ChatMessage) {
    let label = match message.source {
        MessageSource::System => "system",
        MessageSource::Database => "database",
        MessageSource::AdvancedAi => "advanced ai",
        MessageSource::Error => "error",
    };
    match message.role {
        floatdeck_schema::Role::User => println!("you: {}", message.text),
        _ => {
            println!("[{label}] {}", message.text);
            if let Some(sql) = &message.sql {
                println!("    sql: {sql}");
            }
            if let Some(count) = message.record_count {
                println!("    records: {count}");
            }
            if let Some(confidence) = message.confidence {
                println!("    confidence: {}", confidence.as_str());
            }
        }
    }
}
