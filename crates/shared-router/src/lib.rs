//! Serving shell for service processes: liveness, readiness and metrics
//! endpoints, with readiness computed from the process's dependencies.

pub mod metrics;
mod readiness;
mod server;
pub mod telemetry;

pub use readiness::{Dependencies, DependencyError, ProbeMode, Verdict};
pub use server::{
    ErrorBody, METRICS_PATH, Message, Paths, PathsError, respond, respond_error, router, serve,
};
