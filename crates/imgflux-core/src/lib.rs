pub mod config;
pub mod error;
pub mod operations;
pub mod params;

pub use config::{Config, FetchConfig, LogFormat, WorkerConfig};
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use operations::{FitMode, OperationSet, Position, SizeSpec, TransformDefaults, DEFAULTS};
pub use params::{parse, TransformRequest};
