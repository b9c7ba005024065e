//! core
//!
//! Core configuration types for tracklink.
//!
//! # Modules
//!
//! - [`config`] - Project and global configuration schema and loading
//!
//! # Design Principles
//!
//! - Schemas are strict and self-describing (unknown fields are rejected)
//! - Missing files mean defaults, malformed files are errors

pub mod config;
