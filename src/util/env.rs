//! Environment helpers: one-time dotenv loading and typed getters.
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load `.env` from the working directory once. Safe to call repeatedly.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Optional env var; `None` when unset or blank.
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Optional parsed value; `None` when unset or unparsable.
pub fn env_parse_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env_opt(key).and_then(|s| s.parse().ok())
}
