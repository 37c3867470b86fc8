use crate::config::store::ChannelConfigStore;
use crate::notify::channel::ChannelKind;

/// Flips each selected channel; with no selection, prints the current states.
pub fn handle_toggle(
    store: &mut ChannelConfigStore,
    email: bool,
    slack: bool,
    webhook: bool,
) -> anyhow::Result<()> {
    let selected: Vec<ChannelKind> = [
        (ChannelKind::Email, email),
        (ChannelKind::SlackApi, slack),
        (ChannelKind::SlackWebhook, webhook),
    ]
    .into_iter()
    .filter_map(|(kind, chosen)| chosen.then_some(kind))
    .collect();

    if selected.is_empty() {
        for kind in ChannelKind::ALL {
            println!("{kind} notifier: {}", state_label(store.is_enabled(kind)));
        }
        println!("Pass --email, --slack or --webhook to toggle a channel.");
        return Ok(());
    }

    for kind in selected {
        let enabled = store.toggle(kind)?;
        println!("{kind} notifier: {}", state_label(enabled));
    }
    Ok(())
}

fn state_label(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
