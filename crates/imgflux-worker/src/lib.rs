pub mod job;
pub mod pool;

pub use job::{TransformJob, WorkerReply};
pub use pool::{JobHandler, TransformExecutor, TransformPool, TransformPoolConfig};
