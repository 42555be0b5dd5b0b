//! Network-facing doubles: an in-memory socket and a canned-fixture cloud
//! API transport.

pub mod cloud;
pub mod socket;
