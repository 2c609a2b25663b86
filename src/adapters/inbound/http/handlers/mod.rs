pub mod gallery_handlers;

pub use gallery_handlers::*;
