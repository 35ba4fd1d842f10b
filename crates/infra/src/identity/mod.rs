//! Identifier scanning with the sidecar cache

pub mod cache;
pub mod scanner;
