pub mod favicon;
pub mod transform;
