use std::env;

use ::log::LevelFilter;
use spin::Once;

/// Environment variable holding `env_logger` style filters, such as `debug`
/// or `cpuid_probe=trace`.
pub const LOG_ENV: &str = "CPUID_PROBE_LOG";

static INIT: Once<()> = Once::new();

fn builder(default: LevelFilter, filters: Option<&str>) -> env_logger::Builder {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(default);
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    builder
}

/// Installs the stderr logger at `default`, unless [`LOG_ENV`] says otherwise.
///
/// Runs once per process. If the host already set a logger, that one keeps
/// receiving our records.
pub fn init_logger_with(default: LevelFilter) {
    INIT.call_once(|| {
        let filters = env::var(LOG_ENV).ok();
        match builder(default, filters.as_deref()).try_init() {
            Ok(()) => ::log::debug!("Logger initialized at {}", ::log::max_level()),
            Err(e) => ::log::debug!("Host logger kept: {}", e),
        }
    });
}

/// Installs the logger only when [`LOG_ENV`] is set, so that loading the
/// library leaves the host free to pick its own.
pub fn init_logger() {
    if env::var_os(LOG_ENV).is_some() {
        init_logger_with(LevelFilter::Off);
    }
}

#[cfg(test)]
mod tests {
    use ::log::{Level, Log, Metadata};

    use super::*;

    fn enabled(logger: &env_logger::Logger, level: Level, target: &str) -> bool {
        logger.enabled(&Metadata::builder().level(level).target(target).build())
    }

    #[test]
    fn default_level_applies_without_filters() {
        let logger = builder(LevelFilter::Info, None).build();
        assert_eq!(logger.filter(), LevelFilter::Info);
        assert!(enabled(&logger, Level::Info, "cpuid_probe::probe"));
        assert!(!enabled(&logger, Level::Debug, "cpuid_probe::probe"));
    }

    #[test]
    fn env_filters_refine_default() {
        // Given
        let filters = Some("cpuid_probe=trace");

        // When
        let logger = builder(LevelFilter::Warn, filters).build();

        // Then
        assert_eq!(logger.filter(), LevelFilter::Trace);
        assert!(enabled(&logger, Level::Trace, "cpuid_probe::cpu_set"));
        assert!(!enabled(&logger, Level::Info, "host"));
        assert!(enabled(&logger, Level::Warn, "host"));
    }

    #[test]
    fn off_stays_silent() {
        let logger = builder(LevelFilter::Off, None).build();
        assert!(!enabled(&logger, Level::Error, "cpuid_probe"));
    }

    #[test]
    fn init_is_idempotent() {
        init_logger();
        init_logger_with(LevelFilter::Warn);
        init_logger_with(LevelFilter::Trace);
    }
}
