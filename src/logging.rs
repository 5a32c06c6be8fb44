//! Logger setup for binaries and tests embedding this crate.

use env_logger::{Builder, Env};

/// Install `env_logger` with an `info` default. `RUST_LOG` overrides it.
/// Does nothing if a logger is already installed.
pub fn init() {
    init_with_default("info");
}

/// Same as `init` with a custom default filter.
/// Returns false if a logger was already installed.
pub fn init_with_default(filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        assert!(!init_with_default("debug"));
    }
}
