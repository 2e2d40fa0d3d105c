//! Logging init, in the shape of `rootsignal-editions/src/main.rs`'s
//! `tracing_subscriber::fmt().with_env_filter(...).init()` call.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. `default_directive` is used
/// when `RUST_LOG` is unset, e.g. `"wayreel=info"`.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
