use anyhow::Result;
use clap::{CommandFactory, Parser};
use redub::app::{inspect_subtitles, print_languages, run_dub_command};
use redub::cli::{Cli, Commands, ConfigAction};
use redub::config::Config;
use redub::diagnostics::check_dependencies;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Dub(args) => {
            let config = load_config(cli.config.as_deref())?;
            run_dub_command(config, args, cli.quiet).await?;
        }
        Commands::Languages => {
            let config = load_config(cli.config.as_deref())?;
            print_languages(config.dub.target_language);
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            if !check_dependencies(&config) {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Subtitles { file } => {
            inspect_subtitles(&file)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "redub",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Initialize logging from the verbosity flags.
///
/// `RUST_LOG` takes precedence when set.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/redub/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides()?)
}

/// Handle config subcommands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            println!("{}", toml::to_string_pretty(&config.redacted())?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(|p| p.to_path_buf())
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
