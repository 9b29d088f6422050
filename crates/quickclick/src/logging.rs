//! Tracing subscriber setup for the server binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events pass the default filter.
const CRATES: &[&str] = &[
    "quickclick",
    "quickclick_server",
    "quickclick_transport",
    "quickclick_protocol",
    "quickclick_store",
    "quickclick_timer",
    "quickclick_room",
];

/// Filter directives enabling `level` for every Quickclick crate.
pub fn default_directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise every Quickclick crate logs at
/// `default_level`.
pub fn setup_logger(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_every_crate() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("quickclick=debug,"));
        assert!(directives.contains("quickclick_room=debug"));
        assert_eq!(directives.split(',').count(), CRATES.len());
    }
}
