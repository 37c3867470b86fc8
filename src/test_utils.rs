use std::sync::Mutex;

/// Serialises tests that mutate process environment variables.
pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());
