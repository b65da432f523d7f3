pub mod handler;
pub mod model;

pub use handler::{book_ride, share_ride};
