//! Core types for the MediSecure RAG service
//!
//! This crate provides foundational types used across all other crates:
//! - Error types
//! - Case record types shared by ingestion and retrieval

pub mod case;
pub mod error;

pub use case::CaseRecord;
pub use error::{AuthError, Error, Result};
