//! Storage abstraction and implementations for InternHub.
//!
//! This crate provides a trait-based storage interface for reports, students
//! and notifications, with a JSON document reference implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{ReportFilter, Storage, StorageError, Result};
pub use json_storage::JsonStorage;
