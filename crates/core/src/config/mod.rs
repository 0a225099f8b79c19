//! Configuration loading and schema definitions
//!
//! Project-level static defaults read from `droidconf.toml`.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
