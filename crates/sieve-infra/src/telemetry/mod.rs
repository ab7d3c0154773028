//! Tracing initialization
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` read from
//! `RUST_LOG` plus either a human-readable or a JSON fmt layer.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, TelemetryConfig};
