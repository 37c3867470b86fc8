use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

/// Send one notification to email, Slack and Slack webhooks at once
#[derive(Parser, Debug)]
#[command(name = "notifier", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Send a notification through every enabled channel
    Send(SendArgs),
    /// Flip channels between enabled and disabled
    Toggle {
        /// Toggle the email channel
        #[arg(long)]
        email: bool,
        /// Toggle the Slack API channel
        #[arg(long)]
        slack: bool,
        /// Toggle the Slack webhook channel
        #[arg(long)]
        webhook: bool,
    },
    /// Manage values used when send flags are omitted
    Defaults {
        #[command(subcommand)]
        action: DefaultsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect the Slack workspace behind the configured token
    Slack {
        #[command(subcommand)]
        action: SlackAction,
    },
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct SendArgs {
    /// Subject of the notification (email subjects are cut to 256 bytes)
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Message body
    #[arg(short, long = "msg")]
    pub message: Option<String>,

    /// File holding the message body, used when --msg is not given
    #[arg(long, value_name = "PATH")]
    pub msg_file: Option<PathBuf>,

    /// Target email addresses
    #[arg(short, long = "email", value_name = "ADDR", num_args = 1..)]
    pub emails: Vec<String>,

    /// File of whitespace-separated email addresses, used when --email is not given
    #[arg(long, value_name = "PATH")]
    pub emails_file: Option<PathBuf>,

    /// Target Slack user or channel IDs
    #[arg(short = 'k', long = "slack", value_name = "ID", num_args = 1..)]
    pub slacks: Vec<String>,

    /// File of whitespace-separated Slack IDs, used when --slack is not given
    #[arg(long, value_name = "PATH")]
    pub slacks_file: Option<PathBuf>,

    /// Post through Slack webhooks; channels are optional overrides
    #[arg(short, long = "webhook", value_name = "CHANNEL", num_args = 0..)]
    pub webhook: Option<Vec<String>>,

    /// Confirm sending; without it nothing is sent
    #[arg(short = 'x', long = "exe")]
    pub execute: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum DefaultsAction {
    /// Set one default value
    Set {
        key: DefaultKey,
        value: String,
    },
    /// Print the current defaults
    Show,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKey {
    Subject,
    Message,
    MessageFile,
    EmailListFile,
    SlackListFile,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize configuration file
    Init {
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Show current configuration with secrets masked
    Show,
    /// Validate configuration
    Validate,
}

#[derive(clap::Subcommand, Debug)]
pub enum SlackAction {
    /// List conversations visible to the token
    Channels,
    /// List workspace members
    Users,
}
