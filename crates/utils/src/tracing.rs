use cachectl_core::constants::CACHECTL_LOG_VAR;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use ::tracing::{debug, error, info, warn, Level};

/// Initialize the tracing system
///
/// `CACHECTL_LOG` takes an `EnvFilter` directive and wins over `verbosity`.
/// Without it, verbosity 0 logs info, so each cachetool invocation is shown
/// unless the caller asked for quiet. 1 adds debug and 2+ trace.
/// Output goes to stderr so stdout stays clean for command results.
pub fn init(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = match std::env::var(CACHECTL_LOG_VAR) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive)?,
        _ => EnvFilter::try_new(default_directive(verbosity))?,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(2), "trace");
        assert_eq!(default_directive(9), "trace");
    }

    #[test]
    #[serial]
    fn second_init_reports_error_instead_of_panicking() {
        std::env::remove_var(CACHECTL_LOG_VAR);
        let _ = init(0);
        assert!(init(1).is_err());
    }

    #[test]
    #[serial]
    fn invalid_filter_directive_is_rejected() {
        std::env::set_var(CACHECTL_LOG_VAR, "cachectl=loudest");
        let result = init(0);
        std::env::remove_var(CACHECTL_LOG_VAR);
        assert!(result.is_err());
    }
}
