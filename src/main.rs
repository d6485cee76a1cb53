use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use taskdesk::cli::commands::Cli;
use taskdesk::cli::handlers;
use taskdesk::io::config_io;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "taskdesk.log";

fn main() {
    let cli = Cli::parse();
    let config_path = config_io::resolve_config_path(cli.config.as_deref());
    init_logging(cli.verbose, cli.command.is_none(), &config_path);

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: could not start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        // No subcommand → launch the board
        None => taskdesk::tui::run(&config_path, &rt),
        Some(command) => rt.block_on(handlers::dispatch(command, &config_path, cli.json)),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr for commands. The board owns the terminal, so it logs to
/// a file beside the config instead.
fn init_logging(verbose: u8, board: bool, config_path: &Path) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskdesk={}", default_level)));

    if board {
        let dir = config_path.parent().unwrap_or(Path::new("."));
        let file = std::fs::create_dir_all(dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)));
        if let Ok(file) = file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
