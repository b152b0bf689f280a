//! Balancer module - HTTP API in front of the sessions manager

pub mod error;
pub mod fingerprint;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, BalancerServer};
