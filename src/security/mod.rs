//! Security Primitives Module
//!
//! - Scrubbing of kernel bounce buffers after each crossing
//!
//! # Security Properties
//! - Buffers holding user or file data are zeroed on drop
//! - Clearing uses volatile writes so it is never optimized out

pub mod zeroize;

pub use zeroize::{Scrubbed, Zeroize};
