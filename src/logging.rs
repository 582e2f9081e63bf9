use tracing_subscriber::EnvFilter;

/// Env var that overrides the verbosity flags, in `EnvFilter` syntax.
pub const LOG_ENV: &str = "COSTLENS_LOG";

/// Installs the stderr subscriber. Stdout stays clean for reports.
///
/// `COSTLENS_LOG` wins when set and valid, otherwise `-v` picks the level.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "costlens=warn",
        1 => "costlens=info",
        2 => "costlens=debug",
        _ => "costlens=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(default_directive(0), "costlens=warn");
        assert_eq!(default_directive(2), "costlens=debug");
        assert_eq!(default_directive(9), "costlens=trace");
    }
}
