//! # Yatube Shared
//!
//! Wire types of the Yatube API, shared by the server and its clients.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, Paginated};
