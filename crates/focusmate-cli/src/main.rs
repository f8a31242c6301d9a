use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "focusmate", version, about = "FocusMate Pomodoro timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a focus session
    Start(commands::start::StartArgs),
    /// Saved session settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Session counters
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// List the music catalog
    Tracks {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// About the Pomodoro technique
    Info,
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("FOCUSMATE_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "warn".to_string()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Start(args) => commands::start::run(args),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Tracks { json } => commands::tracks::run(json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Info => commands::info::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
