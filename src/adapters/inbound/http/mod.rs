pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod views;

pub use dto::*;
pub use error::PageError;
pub use handlers::*;
pub use router::*;
