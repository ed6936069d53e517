//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with a default filter such as `"debug"` or
/// `"scene_core=trace"`. `RUST_LOG` still overrides it. Safe to call more
/// than once; later calls are ignored.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_level_tolerates_repeat_calls() {
        init_with_level("debug");
        init_with_level("warn");
        log::info!("still logging after a second init");
    }
}
