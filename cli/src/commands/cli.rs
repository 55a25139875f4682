use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "consilium", version, about = "Multi-specialist legal consultation engine")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to load instead of the default search path.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Bind host; falls back to `[http_server] host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port; falls back to `[http_server] port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AskArgs {
    #[arg(long, short = 'q')]
    pub question: String,

    /// Technical expert id. Repeat for several experts.
    #[arg(long = "expert", action = clap::ArgAction::Append)]
    pub experts: Vec<String>,

    /// Domain counsel id. Repeat for several counsel.
    #[arg(long = "counsel", action = clap::ArgAction::Append)]
    pub counsel: Vec<String>,

    /// Restrict retrieval to these documents.
    #[arg(long = "scope", action = clap::ArgAction::Append)]
    pub scope: Vec<String>,

    /// Send the consultation to a running `consilium serve` instead of running in-process.
    #[arg(long)]
    pub server: Option<String>,

    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TaskArgs {
    pub task_id: String,

    /// Server URL; defaults to the configured `[http_server]` address.
    #[arg(long)]
    pub server: Option<String>,

    /// Print JSON instead of the rendered answer (`result` only).
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SpecialistsArgs {
    /// Query a running server instead of the local catalog.
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Start a consultation and wait for the compiled answer.
    Ask(AskArgs),
    /// Show the status of a task on a running server.
    Status(TaskArgs),
    /// Fetch the result of a task on a running server.
    Result(TaskArgs),
    /// List the specialist catalog.
    Specialists(SpecialistsArgs),
}
