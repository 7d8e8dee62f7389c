pub mod filters;
pub mod orientation;
pub mod resize;
pub mod transformer;

pub use filters::ImageFilters;
pub use orientation::ImageOrientation;
pub use resize::ImageResize;
pub use transformer::{TransformEngine, TransformOutput};
