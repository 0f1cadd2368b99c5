//! Logging setup for apex-linearization executables
//!
//! The library only emits `tracing` events: `debug!` per linearization pass, `trace!`
//! per factor and `warn!` on aborted passes or overwritten values. Installing a
//! subscriber is left to the executable; these helpers install an env-filtered `fmt`
//! subscriber.

use tracing::Level;

/// Install the subscriber with a default INFO level.
///
/// # Example
/// ```no_run
/// use apex_linearization::init_logger;
///
/// init_logger();
/// tracing::info!("linearizing");
/// ```
///
/// `RUST_LOG` overrides the default, e.g.
/// `RUST_LOG=apex_linearization=trace cargo run --example small_example` shows every
/// linearized factor.
pub fn init_logger() -> bool {
    init_logger_with_level(Level::INFO)
}

/// Install the subscriber with `default_level` unless `RUST_LOG` says otherwise.
///
/// Thread names are printed because parallel passes log from rayon workers. Returns
/// `false` when a global subscriber was already installed, in which case nothing changes.
pub fn init_logger_with_level(default_level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
