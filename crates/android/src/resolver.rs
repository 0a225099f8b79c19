//! Build configuration resolution
//!
//! Merges static defaults with an optional keystore properties file into a
//! [`BuildDescriptor`]. Resolution is pure apart from reading that one file,
//! so identical inputs always give identical descriptors.

use crate::descriptor::BuildDescriptor;
use crate::engine::EngineSettings;
use crate::properties::PropertiesSource;
use crate::signing::SigningCredentials;
use crate::variant::{self, VariantSpec};
use droidconf_core::config::{BuildType, ConfigSchema, DesugaringConfig, ProductFlavor};
use droidconf_core::error::{ErrorCode, Result, ResultExt};
use droidconf_core::validation::Validator;
use std::path::{Path, PathBuf};

/// Highest SDK level accepted by validation
const MAX_SDK_LEVEL: u32 = 100;

/// Static inputs applied to every resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDefaults {
    /// Kotlin/Java namespace
    pub namespace: String,
    /// Base application id
    pub application_id: String,
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
    /// Keystore properties file, relative to the project root
    pub properties_file: String,
    /// SDK levels and version from the build engine
    pub engine: EngineSettings,
}

impl StaticDefaults {
    /// Build from project configuration and engine-supplied settings
    pub fn from_schema(schema: &ConfigSchema, engine: EngineSettings) -> Self {
        Self {
            namespace: schema.app.namespace.clone(),
            application_id: schema.app.application_id.clone(),
            java_version: schema.java.version,
            desugaring: schema.desugaring.clone(),
            flavor_dimensions: schema.flavor_dimensions.clone(),
            flavors: schema.flavors.clone(),
            build_types: schema.resolved_build_types(),
            properties_file: schema.signing.properties_file.clone(),
            engine,
        }
    }

    /// Check identifiers and SDK bounds
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        Validator::new()
            .java_package("app.namespace", &self.namespace)
            .java_package("app.application_id", &self.application_id)
            .range("sdk.compile", engine.compile_sdk, 1, MAX_SDK_LEVEL)
            .range("sdk.min", engine.min_sdk, 1, MAX_SDK_LEVEL)
            .range("sdk.target", engine.target_sdk, 1, MAX_SDK_LEVEL)
            .custom("sdk", || {
                (engine.min_sdk > engine.target_sdk).then(|| {
                    format!(
                        "min ({}) must not exceed target ({})",
                        engine.min_sdk, engine.target_sdk
                    )
                })
            })
            .custom("sdk", || {
                (engine.target_sdk > engine.compile_sdk).then(|| {
                    format!(
                        "target ({}) must not exceed compile ({})",
                        engine.target_sdk, engine.compile_sdk
                    )
                })
            })
            .range("version.code", engine.version_code, 1, u32::MAX)
            .required("version.name", &engine.version_name)
            .warn_if(
                "desugaring.dependency",
                self.desugaring.enabled && self.desugaring.dependency.trim().is_empty(),
                "Desugaring is enabled but no library is configured",
            )
            .validate()
            .to_result(ErrorCode::ConfigValidationError)
    }
}

impl Default for StaticDefaults {
    fn default() -> Self {
        let schema = ConfigSchema::default();
        let engine = EngineSettings::from_schema(&schema);
        Self::from_schema(&schema, engine)
    }
}

/// Produces a [`BuildDescriptor`] from defaults and a keystore properties file
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    defaults: StaticDefaults,
    root: PathBuf,
}

impl ConfigResolver {
    /// Create a resolver rooted at the current directory
    pub fn new(defaults: StaticDefaults) -> Self {
        Self {
            defaults,
            root: PathBuf::from("."),
        }
    }

    /// Set the project root used to locate the key store
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Keystore properties location under the project root
    pub fn properties_path(&self) -> PathBuf {
        self.root.join(&self.defaults.properties_file)
    }

    /// Resolve using the configured keystore properties file
    pub fn resolve_project(&self) -> Result<BuildDescriptor> {
        self.resolve(&self.properties_path())
    }

    /// Resolve against an optional properties file.
    ///
    /// A missing file yields an unsigned descriptor. A file lacking any
    /// signing key is a configuration error.
    pub fn resolve(&self, properties_path: &Path) -> Result<BuildDescriptor> {
        let source = PropertiesSource::try_load(properties_path)?;

        if source.is_none() {
            tracing::info!(
                path = %properties_path.display(),
                "No signing properties found, release variants will be unsigned"
            );
        }

        self.resolve_with(source.as_ref())
            .context(format!("Resolving build configuration from {}", properties_path.display()))
    }

    /// Resolve from an already loaded properties source, without I/O
    pub fn resolve_with(&self, source: Option<&PropertiesSource>) -> Result<BuildDescriptor> {
        let defaults = &self.defaults;
        defaults.validate()?;

        let signing = source.map(SigningCredentials::from_properties).transpose()?;

        let variants = variant::compose(&VariantSpec {
            application_id: &defaults.application_id,
            version_name: &defaults.engine.version_name,
            flavor_dimensions: &defaults.flavor_dimensions,
            flavors: &defaults.flavors,
            build_types: &defaults.build_types,
            has_release_credentials: signing.is_some(),
        })?;

        let engine = &defaults.engine;
        let descriptor = BuildDescriptor {
            namespace: defaults.namespace.clone(),
            application_id: defaults.application_id.clone(),
            compile_sdk: engine.compile_sdk,
            min_sdk: engine.min_sdk,
            target_sdk: engine.target_sdk,
            ndk_version: engine.ndk_version.clone(),
            version_code: engine.version_code,
            version_name: engine.version_name.clone(),
            java_version: defaults.java_version,
            desugaring: defaults.desugaring.clone(),
            flavor_dimensions: defaults.flavor_dimensions.clone(),
            flavors: defaults.flavors.clone(),
            build_types: defaults.build_types.clone(),
            variants,
            signing,
            project_root: self.root.clone(),
        };

        tracing::debug!(
            application_id = %descriptor.application_id,
            variants = descriptor.variants.len(),
            signed = descriptor.is_signed(),
            "Resolved build descriptor"
        );

        Ok(descriptor)
    }
}
