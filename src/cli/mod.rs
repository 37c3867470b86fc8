//! Command-line interface for notifier.

pub mod app;
pub mod commands;

pub use app::{Cli, Commands, ConfigAction, DefaultKey, DefaultsAction, SendArgs, SlackAction};

use crate::config::schema::LoggingConfig;
use crate::config::store::{ChannelConfigStore, ConfigError, ConfigFile};
use crate::notify::outcome::{EXIT_CONFIG, EXIT_GENERAL};
use crate::telemetry::{TracingConfig, TracingGuard, init_tracing};

/// Runs one command and returns the process exit code.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let file = cli
        .config
        .clone()
        .map(ConfigFile::with_path)
        .unwrap_or_default();
    let loaded = file.load();
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let _guard = start_tracing(&logging, cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Send(args) => commands::send::handle_send(args, loaded?, file).await,
        Commands::Toggle {
            email,
            slack,
            webhook,
        } => {
            let mut store = ChannelConfigStore::with_file(loaded?.notifiers, file);
            commands::toggle::handle_toggle(&mut store, email, slack, webhook)?;
            Ok(0)
        }
        Commands::Defaults { action } => {
            commands::defaults::handle_defaults(&file, action)?;
            Ok(0)
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                commands::config::handle_init(&file, force)?;
                Ok(0)
            }
            ConfigAction::Show => {
                commands::config::handle_show(&file, &loaded?)?;
                Ok(0)
            }
            ConfigAction::Validate => commands::config::handle_validate(&file, &loaded?),
        },
        Commands::Slack { action } => {
            commands::slack::handle_slack(action, &loaded?.notifiers.slack).await?;
            Ok(0)
        }
    }
}

/// Exit code for an error that escaped a command.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    let config_failure = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ConfigError>(),
            Some(ConfigError::Read { .. } | ConfigError::Parse { .. })
        )
    });
    if config_failure { EXIT_CONFIG } else { EXIT_GENERAL }
}

fn start_tracing(logging: &LoggingConfig, verbose: bool, json: bool) -> Option<TracingGuard> {
    let config = TracingConfig::from_logging(logging, verbose, json);
    match init_tracing(&config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: {err}; logging to stderr only");
            init_tracing(&TracingConfig {
                log_file: None,
                ..config
            })
            .ok()
        }
    }
}
