//! Repository implementations.

#[cfg(feature = "fake")]
pub mod fake;

#[cfg(feature = "onepassword")]
pub mod onepassword;
