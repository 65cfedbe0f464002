mod admin;
mod catalog;
pub mod dto;
mod reports;
pub mod response;
mod router;
mod session;

pub use router::{AppState, create_router};
