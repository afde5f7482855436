#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Error (common error types)
pub mod error;

/// Revision history (patch chains and replay)
pub mod history;

/// Book and chapter records
pub mod library;

/// Patch primitives (create, parse, apply)
pub mod patch;

/// Document store abstraction
pub mod store;
