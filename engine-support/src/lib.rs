//! # Engine Support
//!
//! Shared utilities for the Engine container crates.
//!
//! This crate provides:
//! - Rendering of resolution chains and type names for diagnostics
//! - "Did you mean?" suggestions over registered identifiers

pub mod rendering;
