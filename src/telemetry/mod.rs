pub mod tracing;

pub use self::tracing::{TracingConfig, TracingError, TracingGuard, build_subscriber, init_tracing};
