use std::fs;
use std::path::Path;

use tracing::info;

use crate::cli::app::SendArgs;
use crate::config::schema::{Config, DefaultsConfig, read_list_file};
use crate::config::store::{ChannelConfigStore, ConfigFile};
use crate::notify::channel::ChannelKind;
use crate::notify::dispatcher::Dispatcher;
use crate::notify::report::report;
use crate::notify::request::NotificationRequest;

pub async fn handle_send(args: SendArgs, config: Config, file: ConfigFile) -> anyhow::Result<i32> {
    if !args.execute {
        println!("Nothing sent. Confirm with -x/--exe; see `notifier send --help` for options.");
        return Ok(0);
    }

    let request = build_request(&args, &config.defaults);
    info!(
        email = request.recipients(ChannelKind::Email).len(),
        slack = request.recipients(ChannelKind::SlackApi).len(),
        webhook = request.recipients(ChannelKind::SlackWebhook).len(),
        "Dispatching notification"
    );

    let store = ChannelConfigStore::with_file(config.notifiers, file);
    let dispatch = Dispatcher::default().dispatch(request, &store).await;
    let summary = report(&dispatch);
    for line in &summary.lines {
        println!("{line}");
    }
    Ok(summary.exit_code.unwrap_or(0))
}

/// Resolves subject, body and recipients.
///
/// Each value comes from its flag, then its file flag, then the `[defaults]` section.
pub fn build_request(args: &SendArgs, defaults: &DefaultsConfig) -> NotificationRequest {
    let subject = args
        .subject
        .clone()
        .filter(|subject| !subject.is_empty())
        .unwrap_or_else(|| defaults.default_subject());

    let message = args
        .message
        .clone()
        .filter(|message| !message.is_empty())
        .or_else(|| read_message_file(args.msg_file.as_deref()))
        .unwrap_or_else(|| defaults.default_message());

    let emails = pick_list(&args.emails, args.emails_file.as_deref(), || {
        defaults.default_email_list()
    });
    let slacks = pick_list(&args.slacks, args.slacks_file.as_deref(), || {
        defaults.default_slack_list()
    });
    let webhooks = match &args.webhook {
        Some(channels) if channels.is_empty() => vec![String::new()],
        Some(channels) => channels.clone(),
        None => Vec::new(),
    };

    NotificationRequest::builder(subject, message)
        .recipients(ChannelKind::Email, emails)
        .recipients(ChannelKind::SlackApi, slacks)
        .recipients(ChannelKind::SlackWebhook, webhooks)
        .build()
}

fn read_message_file(path: Option<&Path>) -> Option<String> {
    path.and_then(|path| fs::read_to_string(path).ok())
        .filter(|contents| !contents.is_empty())
}

fn pick_list(
    explicit: &[String],
    file: Option<&Path>,
    fallback: impl FnOnce() -> Vec<String>,
) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let from_file = file.map(read_list_file).unwrap_or_default();
    if !from_file.is_empty() {
        return from_file;
    }
    fallback()
}
