//! # CleanCity Common Library
//!
//! Shared code for the CleanCity services:
//! - Error type
//! - Configuration loading and root folder resolution
//! - Database initialization and schema
//! - Admin token verification

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
