//! Core utilities for droidconf
//!
//! Shared functionality used by the Android resolver and the CLI:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based static build defaults
//! - **Validation**: fluent field validation for configuration values
//! - **Process execution**: running the external build engine
//!
//! # Example
//!
//! ```rust,no_run
//! use droidconf_core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(None, Path::new(".")).expect("invalid droidconf.toml");
//! println!("{}", config.schema.app.application_id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

