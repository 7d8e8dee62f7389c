pub mod fetch;
pub mod telemetry;

pub use fetch::{FetchResult, SourceFetcher, DEFAULT_CONTENT_TYPE};
pub use telemetry::{init_telemetry, shutdown_telemetry};
