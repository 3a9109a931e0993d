//! Logging utilities

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence; `default_level` applies when it is unset.
/// Calling this more than once is harmless, later calls are ignored.
pub fn init(default_level: log::LevelFilter) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.as_str()),
    )
    .try_init();
}

/// Initialize logging for tests, capturing output per test
#[cfg(test)]
pub fn init_for_tests() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}
