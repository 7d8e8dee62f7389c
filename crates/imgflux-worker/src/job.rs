use bytes::Bytes;
use imgflux_core::OperationSet;
use imgflux_processing::TransformOutput;

/// Work handed to a transform worker. Owned; nothing is shared with the caller.
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub bytes: Bytes,
    pub operations: OperationSet,
}

impl TransformJob {
    pub fn new(bytes: Bytes, operations: OperationSet) -> Self {
        Self { bytes, operations }
    }
}

/// The single message a worker sends back for a job
#[derive(Debug)]
pub enum WorkerReply {
    Completed(TransformOutput),
    Failed { message: String },
}
