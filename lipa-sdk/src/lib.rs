#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;
