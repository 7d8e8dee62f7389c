pub mod transform;

pub use transform::{TransformResponse, TransformService};
