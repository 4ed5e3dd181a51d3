use std::sync::Mutex;

/// Serializes tests that read or mutate process environment variables.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());
