//! # Yatube Core
//!
//! The domain layer of the Yatube API: entities, validation, access policy
//! and the resource services built on top of repository ports.
//! This crate has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod service;
pub mod validation;

pub use error::{DomainError, RepoError};
pub use service::{Repositories, Services};
