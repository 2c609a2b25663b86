mod gallery_errors;
mod validation_errors;

pub use gallery_errors::*;
pub use validation_errors::*;
