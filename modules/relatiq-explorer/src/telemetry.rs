use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` adds to the default
/// `relatiq=info` directive. Fails if a subscriber is already installed.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("relatiq=info".parse()?))
        .try_init()
        .map_err(|e| anyhow!("tracing already initialised: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let _ = init_tracing();
        assert!(init_tracing().is_err());
    }
}
