use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::config::schema::Config;
use crate::config::store::ConfigFile;
use crate::config::validation::validate_config;
use crate::notify::outcome::EXIT_CONFIG;

pub fn handle_init(file: &ConfigFile, force: bool) -> anyhow::Result<()> {
    let config_path = file.path();

    if config_path.exists() && !force && !confirm_overwrite(config_path)? {
        println!("Aborted.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
        set_dir_permissions(parent);
    }

    fs::write(config_path, default_config_toml())?;
    set_file_permissions(config_path);

    println!("Config created at {}", config_path.display());
    println!("Enable a channel with: notifier toggle --email");
    Ok(())
}

pub fn handle_show(file: &ConfigFile, config: &Config) -> anyhow::Result<()> {
    let source = if file.exists() {
        file.path().display().to_string()
    } else {
        format!("{} (not found, built-in defaults)", file.path().display())
    };
    println!("# {source}");
    print!("{}", toml::to_string_pretty(&config.redacted())?);
    Ok(())
}

/// Prints every problem; returns the exit code.
pub fn handle_validate(file: &ConfigFile, config: &Config) -> anyhow::Result<i32> {
    let result = validate_config(config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.field, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.field, error.message);
        if let Some(suggestion) = &error.suggestion {
            println!("  hint: {suggestion}");
        }
    }

    if result.is_valid() {
        println!("Config valid: {}", file.path().display());
        Ok(0)
    } else {
        println!(
            "Config invalid: {} error(s) in {}",
            result.errors.len(),
            file.path().display()
        );
        Ok(EXIT_CONFIG)
    }
}

fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    print!(
        "Config already exists at {}. Overwrite? [y/N] ",
        path.display()
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let response = input.trim();
    Ok(response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes"))
}

fn set_dir_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o700)) {
            eprintln!("Warning: failed to set directory permissions: {err}");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

fn set_file_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
            eprintln!("Warning: failed to set config file permissions: {err}");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

pub fn default_config_toml() -> &'static str {
    r#"# notifier configuration file

[logging]
# Log level: trace, debug, info, warn, error
level = "info"
# Emit JSON lines instead of plain text
json = false
# Optional log file; relative paths are placed in the state directory
# file = "notifier.log"

# Used by `notifier send` when flags are omitted
[defaults]
subject = ""
message = ""
# A readable message_file replaces message
# message_file = "/var/log/job/error.log"
# Whitespace-separated recipient lists
# email_list_file = "/etc/notifier/emails"
# slack_list_file = "/etc/notifier/slack"

# SMTP over implicit TLS
[notifiers.email]
type = "email"
enabled = false
account = ""
password = ""
host = ""
port = 465

# Slack Web API (chat.postMessage)
[notifiers.slack]
type = "slack"
enabled = false
token = ""
as_user = false
username = "notifier"
icon_emoji = "bell"
api_url = "https://slack.com/api"

# Slack incoming webhooks
[notifiers.slack_webhook]
type = "slack_webhook"
enabled = false
webhook_urls = []
username = "notifier"
icon_emoji = "bell"
"#
}
