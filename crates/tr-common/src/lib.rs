//! Trace Rewind common types and errors.
//!
//! This crate provides foundational types shared across the replay crates:
//! - Process and descriptor identity newtypes
//! - The unified error type

pub mod error;
pub mod id;

pub use error::{Error, Result};
pub use id::{Fd, Pid};
