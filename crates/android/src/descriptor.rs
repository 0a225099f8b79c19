//! The resolved build descriptor handed to the build engine

use crate::signing::SigningCredentials;
use crate::variant::{BuildVariant, VariantSigning};
use droidconf_core::config::{BuildType, DesugaringConfig, ProductFlavor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Finalized build configuration, built fresh for every invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    /// Kotlin/Java namespace
    pub namespace: String,
    /// Base application id, before variant suffixes
    pub application_id: String,
    /// Compile SDK level
    pub compile_sdk: u32,
    /// Minimum supported SDK level
    pub min_sdk: u32,
    /// Target SDK level
    pub target_sdk: u32,
    /// Pinned NDK version
    pub ndk_version: Option<String>,
    /// Integer version code
    pub version_code: u32,
    /// Base version name, before variant suffixes
    pub version_name: String,
    /// Java source and target compatibility
    pub java_version: u32,
    /// Core library desugaring
    pub desugaring: DesugaringConfig,
    /// Flavor dimensions in declaration order
    pub flavor_dimensions: Vec<String>,
    /// Declared product flavors
    pub flavors: Vec<ProductFlavor>,
    /// Effective build types, implicit ones included
    pub build_types: Vec<BuildType>,
    /// Every composed variant, in composition order
    pub variants: Vec<BuildVariant>,
    /// `None` when no keystore properties file exists
    pub signing: Option<SigningCredentials>,
    /// Directory the key store path is resolved against
    pub project_root: PathBuf,
}

impl BuildDescriptor {
    /// Whether release credentials were resolved
    pub fn is_signed(&self) -> bool {
        self.signing.is_some()
    }

    /// Look up a variant by its Gradle name
    pub fn variant(&self, name: &str) -> Option<&BuildVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Variants that want release signing but have no credentials
    pub fn unsigned_variants(&self) -> impl Iterator<Item = &BuildVariant> {
        self.variants
            .iter()
            .filter(|v| v.signing == VariantSigning::Unsigned)
    }

    /// Absolute key store location, when signing is configured
    pub fn store_file(&self) -> Option<PathBuf> {
        self.signing
            .as_ref()
            .map(|creds| creds.store_file(&self.project_root))
    }

    /// Copy with signing passwords masked
    pub fn redacted(&self) -> Self {
        Self {
            signing: self.signing.as_ref().map(SigningCredentials::redacted),
            ..self.clone()
        }
    }
}
