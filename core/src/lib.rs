//! Unicorn Core Library
//! Session correlation and transcoder argument rewriting for the balancer

pub mod config;
pub mod session;
pub mod store;
pub mod balancer;
