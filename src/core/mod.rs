//! Core plumbing: coded error types, fault descriptors, mergeable configuration.

pub mod config;
pub mod errors;
