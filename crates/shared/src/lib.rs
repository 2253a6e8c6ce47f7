//! Shared utilities for the event ticketing backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (hashing, random ticket codes)
//! - Email normalization and validation

pub mod crypto;
pub mod validation;
