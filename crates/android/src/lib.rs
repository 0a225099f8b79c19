//! Android build configuration resolution
//!
//! This crate provides:
//! - Java `.properties` parsing with missing-file fallback
//! - All-or-nothing release signing credentials
//! - Framework-supplied SDK and version settings
//! - Flavor × build type variant composition
//! - The [`ConfigResolver`] producing a [`BuildDescriptor`]
//! - Gradle hand-off of the resolved configuration

#![warn(missing_docs)]

pub mod descriptor;
pub mod engine;
pub mod gradle;
pub mod properties;
pub mod resolver;
pub mod signing;
pub mod variant;

pub use descriptor::BuildDescriptor;
pub use engine::{EngineOverrides, EngineSettings};
pub use properties::PropertiesSource;
pub use resolver::{ConfigResolver, StaticDefaults};
pub use signing::SigningCredentials;
pub use variant::{BuildVariant, VariantSigning};
