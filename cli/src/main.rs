use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use consilium_cli::client::{ConsultationClient, LocalClient, RemoteClient};
use consilium_cli::commands::ask::{self, AskOutcome, PollOptions};
use consilium_cli::commands::cli;
use consilium_cli::commands::inspect;
use consilium_cli::http;
use consilium_core::api::{self as core_api, AppConfig, AppContext, CliError};
use consilium_plugins::services::PluginServicesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(args.config.as_deref())?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    dispatch(args.command, cfg).await
}

fn load_config(path: Option<&str>) -> Result<AppConfig, CliError> {
    let loaded = match path {
        Some(p) => core_api::load_from_path(Path::new(p)).map(|mut cfg| {
            core_api::apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
            cfg
        }),
        None => core_api::load_default(),
    };
    loaded.map_err(|e| CliError::Config(e.to_string()))
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 3: result not ready (returned as a normal exit code)
    // 11: config error
    // 12: collaborator wiring failed
    // 20: IO / request error
    // 30: consultation failed (returned as a normal exit code)
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Service(se) => match se {
            core_api::ServiceError::Config(_) => 11,
            core_api::ServiceError::Plugin(_) => 12,
        },
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Registry(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

async fn build_context(cfg: AppConfig) -> Result<AppContext, CliError> {
    Ok(AppContext::new(cfg, Arc::new(PluginServicesFactory)).await?)
}

fn remote_client(server: Option<&str>, cfg: &AppConfig) -> Result<RemoteClient, CliError> {
    let url = server
        .map(str::to_string)
        .unwrap_or_else(|| inspect::default_server_url(&cfg.http_server));
    Ok(RemoteClient::new(&url)?)
}

async fn dispatch(cmd: cli::Commands, cfg: AppConfig) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Serve(serve_args) => {
            let ctx = build_context(cfg).await?;
            http::handle_serve(serve_args, ctx).await?;
            Ok(0)
        }
        cli::Commands::Ask(ask_args) => {
            let client: Box<dyn ConsultationClient> = match ask_args.server.as_deref() {
                Some(url) => Box::new(RemoteClient::new(url)?),
                None => {
                    let ctx = build_context(cfg).await?;
                    // task lifecycle logs come from the event stream in local mode too
                    http::spawn_event_logger(ctx.registry());
                    Box::new(LocalClient::new(ctx))
                }
            };
            run_ask(client.as_ref(), &ask_args).await
        }
        cli::Commands::Status(task_args) => {
            let client = remote_client(task_args.server.as_deref(), &cfg)?;
            inspect::run_status(&client, &task_args.task_id).await
        }
        cli::Commands::Result(task_args) => {
            let client = remote_client(task_args.server.as_deref(), &cfg)?;
            inspect::run_result(&client, &task_args.task_id, task_args.json).await
        }
        cli::Commands::Specialists(list_args) => match list_args.server.as_deref() {
            Some(url) => inspect::run_specialists(&RemoteClient::new(url)?).await,
            None => {
                let client = LocalClient::new(build_context(cfg).await?);
                inspect::run_specialists(&client).await
            }
        },
    }
}

#[tracing::instrument(name = "cli.ask", skip_all)]
async fn run_ask(client: &dyn ConsultationClient, args: &cli::AskArgs) -> Result<i32, CliError> {
    let request = ask::build_request(args);
    let opts = PollOptions {
        interval: Duration::from_millis(args.poll_interval_ms.max(10)),
        show_progress: !args.json && atty::is(atty::Stream::Stderr),
    };

    match ask::drive(client, &request, &opts).await? {
        AskOutcome::Completed { task_id, result } => {
            if args.json {
                let out = serde_json::json!({ "task_id": task_id, "result": result });
                let text = serde_json::to_string_pretty(&out)
                    .map_err(|e| CliError::Command(e.to_string()))?;
                println!("{text}");
            } else {
                println!("{}", ask::render_result(&result));
            }
            Ok(0)
        }
        AskOutcome::Failed { task_id, message } => {
            eprintln!("consultation {task_id} failed: {message}");
            Ok(inspect::EXIT_CONSULTATION_FAILED)
        }
    }
}

fn init_tracing(logging: &core_api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("consilium"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("consilium.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
