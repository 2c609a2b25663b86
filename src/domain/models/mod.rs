pub mod blob;
pub mod naming;

pub use blob::*;
pub use naming::{describe, extract_object_name, generate_blob_name};
