//! Configuration schema definitions
//!
//! Static build defaults for an Android application. Every field has a
//! default matching a stock Flutter Android app, so an empty
//! `droidconf.toml` (or none at all) is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Application identity
    #[serde(default)]
    pub app: AppConfig,

    /// SDK levels
    #[serde(default)]
    pub sdk: SdkConfig,

    /// Version code and name
    #[serde(default)]
    pub version: VersionConfig,

    /// Java compatibility
    #[serde(default)]
    pub java: JavaConfig,

    /// Core library desugaring
    #[serde(default)]
    pub desugaring: DesugaringConfig,

    /// Override the signing config
    #[serde(default)]
    pub signing: SigningConfig,

    /// Ordered flavor dimensions
    #[serde(default = "default_flavor_dimensions")]
    pub flavor_dimensions: Vec<String>,

    /// Product flavors; defaults to a single `dev` flavor
    #[serde(default = "default_flavors")]
    pub flavors: Vec<ProductFlavor>,

    /// Declared build types, merged by name into the implicit `debug` and
    /// `release` pair
    #[serde(default)]
    pub build_types: Vec<BuildTypeConfig>,
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            sdk: SdkConfig::default(),
            version: VersionConfig::default(),
            java: JavaConfig::default(),
            desugaring: DesugaringConfig::default(),
            signing: SigningConfig::default(),
            flavor_dimensions: default_flavor_dimensions(),
            flavors: default_flavors(),
            build_types: Vec::new(),
        }
    }
}

fn default_flavor_dimensions() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_flavors() -> Vec<ProductFlavor> {
    vec![ProductFlavor {
        name: "dev".to_string(),
        dimension: Some("default".to_string()),
        application_id_suffix: Some(".dev".to_string()),
        version_name_suffix: None,
    }]
}

impl ConfigSchema {
    /// Effective build types: `debug` and `release` first, each overlaid by a
    /// declaration of the same name, then any other declared types in order.
    pub fn resolved_build_types(&self) -> Vec<BuildType> {
        let mut build_types = vec![BuildType::debug(), BuildType::release()];
        for declared in &self.build_types {
            match build_types.iter_mut().find(|b| b.name == declared.name) {
                Some(existing) => declared.apply_to(existing),
                None => {
                    let mut build_type = BuildType::named(&declared.name);
                    declared.apply_to(&mut build_type);
                    build_types.push(build_type);
                }
            }
        }
        build_types
    }
}

/// Application identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Kotlin/Java namespace for generated sources
    #[serde(default = "default_app_id")]
    pub namespace: String,

    /// Base application identifier
    #[serde(default = "default_app_id")]
    pub application_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: default_app_id(),
            application_id: default_app_id(),
        }
    }
}

fn default_app_id() -> String {
    "com.otraku.app".to_string()
}

/// Platform versions normally injected by the framework plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// compileSdk
    #[serde(default = "default_compile_sdk")]
    pub compile: u32,

    /// minSdk
    #[serde(default = "default_min_sdk")]
    pub min: u32,

    /// targetSdk
    #[serde(default = "default_compile_sdk")]
    pub target: u32,

    /// NDK version, left to the framework when unset
    #[serde(default)]
    pub ndk: Option<String>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            compile: default_compile_sdk(),
            min: default_min_sdk(),
            target: default_compile_sdk(),
            ndk: None,
        }
    }
}

fn default_compile_sdk() -> u32 {
    35
}

fn default_min_sdk() -> u32 {
    21
}

/// Version code and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConfig {
    /// versionCode
    #[serde(default = "default_version_code")]
    pub code: u32,

    /// Name
    #[serde(default = "default_version_name")]
    pub name: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            code: default_version_code(),
            name: default_version_name(),
        }
    }
}

fn default_version_code() -> u32 {
    1
}

fn default_version_name() -> String {
    "1.0.0".to_string()
}

/// Java source/target compatibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaConfig {
    /// Java language level
    #[serde(default = "default_java_version")]
    pub version: u32,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            version: default_java_version(),
        }
    }
}

fn default_java_version() -> u32 {
    17
}

/// Core library desugaring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesugaringConfig {
    /// Whether desugaring is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maven coordinate of the desugaring library
    #[serde(default = "default_desugar_dependency")]
    pub dependency: String,
}

impl Default for DesugaringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dependency: default_desugar_dependency(),
        }
    }
}

fn default_desugar_dependency() -> String {
    "com.android.tools:desugar_jdk_libs:2.1.5".to_string()
}

fn default_true() -> bool {
    true
}

/// Where signing credentials come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Keystore properties file, relative to the project root
    #[serde(default = "default_properties_file")]
    pub properties_file: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            properties_file: default_properties_file(),
        }
    }
}

fn default_properties_file() -> String {
    "keystore.properties".to_string()
}

/// A product flavor on one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFlavor {
    /// Flavor name
    pub name: String,

    /// Flavor dimension; may be omitted when only one dimension exists
    #[serde(default)]
    pub dimension: Option<String>,

    /// Appended to the application id
    #[serde(default)]
    pub application_id_suffix: Option<String>,

    /// Appended to the version name
    #[serde(default)]
    pub version_name_suffix: Option<String>,
}

/// Which signing config a build type uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningKind {
    /// The toolchain's debug keystore
    Debug,
    /// Release credentials from the keystore properties file
    Release,
}

/// A resolved build type (debug, release, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildType {
    /// Build type name
    pub name: String,
    /// Whether the APK is debuggable
    pub debuggable: bool,
    /// Whether code shrinking is enabled
    pub minify: bool,
    /// Appended to the application id after any flavor suffixes
    pub application_id_suffix: Option<String>,
    /// Appended to the version name after any flavor suffixes
    pub version_name_suffix: Option<String>,
    /// Signing config this build type uses
    pub signing: SigningKind,
}

/// A `[[build_types]]` entry; unset fields keep the merged-into value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTypeConfig {
    /// Build type name, e.g. `release` or `profile`
    pub name: String,

    /// Override debuggability
    #[serde(default)]
    pub debuggable: Option<bool>,

    /// Override code shrinking
    #[serde(default)]
    pub minify: Option<bool>,

    /// Appended to the application id
    #[serde(default)]
    pub application_id_suffix: Option<String>,

    /// Appended to the version name
    #[serde(default)]
    pub version_name_suffix: Option<String>,

    /// Override the signing config
    #[serde(default)]
    pub signing: Option<SigningKind>,
}

impl BuildTypeConfig {
    fn apply_to(&self, build_type: &mut BuildType) {
        if let Some(debuggable) = self.debuggable {
            build_type.debuggable = debuggable;
        }
        if let Some(minify) = self.minify {
            build_type.minify = minify;
        }
        if self.application_id_suffix.is_some() {
            build_type.application_id_suffix = self.application_id_suffix.clone();
        }
        if self.version_name_suffix.is_some() {
            build_type.version_name_suffix = self.version_name_suffix.clone();
        }
        if let Some(signing) = self.signing {
            build_type.signing = signing;
        }
    }
}

impl BuildType {
    /// A custom build type: not debuggable, not minified, release signing
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            debuggable: false,
            minify: false,
            application_id_suffix: None,
            version_name_suffix: None,
            signing: SigningKind::Release,
        }
    }

    /// The implicit `debug` build type
    pub fn debug() -> Self {
        Self {
            name: "debug".to_string(),
            debuggable: true,
            minify: false,
            application_id_suffix: None,
            version_name_suffix: None,
            signing: SigningKind::Debug,
        }
    }

    /// The implicit `release` build type
    pub fn release() -> Self {
        Self {
            name: "release".to_string(),
            debuggable: false,
            minify: false,
            application_id_suffix: None,
            version_name_suffix: None,
            signing: SigningKind::Release,
        }
    }
}
