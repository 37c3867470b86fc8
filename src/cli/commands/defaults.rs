use std::path::PathBuf;

use crate::cli::app::{DefaultKey, DefaultsAction};
use crate::config::schema::DefaultsConfig;
use crate::config::store::ConfigFile;

pub fn handle_defaults(file: &ConfigFile, action: DefaultsAction) -> anyhow::Result<()> {
    match action {
        DefaultsAction::Set { key, value } => {
            file.update(|config| apply_default(&mut config.defaults, key, value))?;
            println!("Default {} updated in {}", key_name(key), file.path().display());
        }
        DefaultsAction::Show => {
            let config = file.load()?;
            print!("{}", toml::to_string_pretty(&config.defaults)?);
        }
    }
    Ok(())
}

/// An empty value clears path settings.
pub fn apply_default(defaults: &mut DefaultsConfig, key: DefaultKey, value: String) {
    let path = (!value.is_empty()).then(|| PathBuf::from(&value));
    match key {
        DefaultKey::Subject => defaults.subject = value,
        DefaultKey::Message => defaults.message = value,
        DefaultKey::MessageFile => defaults.message_file = path,
        DefaultKey::EmailListFile => defaults.email_list_file = path,
        DefaultKey::SlackListFile => defaults.slack_list_file = path,
    }
}

fn key_name(key: DefaultKey) -> &'static str {
    match key {
        DefaultKey::Subject => "subject",
        DefaultKey::Message => "message",
        DefaultKey::MessageFile => "message_file",
        DefaultKey::EmailListFile => "email_list_file",
        DefaultKey::SlackListFile => "slack_list_file",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_updates_only_the_chosen_key() {
        let temp = tempfile::tempdir().unwrap();
        let file = ConfigFile::with_path(temp.path().join("config.toml"));
        file.update(|config| config.notifiers.email.enabled = true).unwrap();

        handle_defaults(
            &file,
            DefaultsAction::Set {
                key: DefaultKey::Subject,
                value: "nightly".to_string(),
            },
        )
        .unwrap();

        let config = file.load().unwrap();
        assert_eq!(config.defaults.subject, "nightly");
        assert!(config.notifiers.email.enabled);
    }

    #[test]
    fn empty_value_clears_path_default() {
        let mut defaults = DefaultsConfig {
            email_list_file: Some(PathBuf::from("/tmp/emails")),
            ..DefaultsConfig::default()
        };

        apply_default(&mut defaults, DefaultKey::EmailListFile, String::new());
        assert_eq!(defaults.email_list_file, None);

        apply_default(&mut defaults, DefaultKey::SlackListFile, "/tmp/slack".to_string());
        assert_eq!(defaults.slack_list_file, Some(PathBuf::from("/tmp/slack")));
    }
}
