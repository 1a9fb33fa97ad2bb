//! Terminal logger setup.

use simplelog::{self, ConfigBuilder, LevelFilter};

use crate::error::{AudiobriefError, Result};

/// Modules to filter out from logging when not in Trace mode.
/// These are typically verbose dependencies that clutter normal log output.
const FILTERED_MODULES: &[&str] = &["reqwest", "hyper", "hyper_util", "rustls", "h2", "tracing"];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger from the CLI verbosity flags.
    ///
    /// When the log level is set to Trace, all logs including dependency logs
    /// are shown. For all other log levels, verbose dependency logs are
    /// filtered out.
    pub fn init(verbosity: u8, quiet: bool) -> Result<()> {
        let level = Self::level_for(verbosity, quiet);
        let apply_filters = Self::should_filter_dependencies(level);
        let log_config = Self::build_log_config(apply_filters);

        simplelog::TermLogger::init(
            level,
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
        .map_err(|e| AudiobriefError::Other(format!("Failed to initialize logger: {}", e)))
    }

    /// Maps `--quiet` and repeated `--verbose` flags to a level filter.
    fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::Error;
        }
        match verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Determines whether dependency logging should be filtered.
    ///
    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Builds a simplelog Config with optional module filtering.
    ///
    /// When `apply_filters` is true, logs from noisy dependencies are suppressed.
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
