//! Values normally injected by the framework's Gradle plugin
//!
//! The plugin exposes SDK levels and the app version as ambient build
//! script globals. Here they are an explicit struct, seeded from the project
//! config and optionally overlaid from `local.properties` and command-line
//! overrides.

use crate::properties::PropertiesSource;
use droidconf_core::config::ConfigSchema;
use droidconf_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Framework-generated properties file in the Android project root
pub const LOCAL_PROPERTIES: &str = "local.properties";

/// `local.properties` key for the compile SDK level
pub const COMPILE_SDK_KEY: &str = "flutter.compileSdkVersion";
/// `local.properties` key for the minimum SDK level
pub const MIN_SDK_KEY: &str = "flutter.minSdkVersion";
/// `local.properties` key for the target SDK level
pub const TARGET_SDK_KEY: &str = "flutter.targetSdkVersion";
/// `local.properties` key for the NDK version
pub const NDK_VERSION_KEY: &str = "flutter.ndkVersion";
/// `local.properties` key for the version code
pub const VERSION_CODE_KEY: &str = "flutter.versionCode";
/// `local.properties` key for the version name
pub const VERSION_NAME_KEY: &str = "flutter.versionName";

/// SDK levels and version supplied by the build engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
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
    /// User-visible version name
    pub version_name: String,
}

/// Command-line overrides, highest precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOverrides {
    /// `--version-code`
    pub version_code: Option<u32>,
    /// `--version-name`
    pub version_name: Option<String>,
}

impl EngineSettings {
    /// Seed from the project configuration
    pub fn from_schema(schema: &ConfigSchema) -> Self {
        Self {
            compile_sdk: schema.sdk.compile,
            min_sdk: schema.sdk.min,
            target_sdk: schema.sdk.target,
            ndk_version: schema.sdk.ndk.clone(),
            version_code: schema.version.code,
            version_name: schema.version.name.clone(),
        }
    }

    /// Overlay `flutter.*` keys from a `local.properties` source
    pub fn apply_local_properties(&mut self, props: &PropertiesSource) -> Result<()> {
        if let Some(v) = parse_u32(props, COMPILE_SDK_KEY)? {
            self.compile_sdk = v;
        }
        if let Some(v) = parse_u32(props, MIN_SDK_KEY)? {
            self.min_sdk = v;
        }
        if let Some(v) = parse_u32(props, TARGET_SDK_KEY)? {
            self.target_sdk = v;
        }
        if let Some(v) = parse_u32(props, VERSION_CODE_KEY)? {
            self.version_code = v;
        }
        if let Some(v) = props.get(NDK_VERSION_KEY) {
            self.ndk_version = Some(v.trim().to_string());
        }
        if let Some(v) = props.get(VERSION_NAME_KEY) {
            self.version_name = v.trim().to_string();
        }
        Ok(())
    }

    /// Load `local.properties` under `root`, if present, and overlay it
    pub fn apply_local_properties_file(&mut self, root: &Path) -> Result<bool> {
        match PropertiesSource::try_load(&root.join(LOCAL_PROPERTIES))? {
            Some(props) => {
                self.apply_local_properties(&props)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &EngineOverrides) {
        if let Some(code) = overrides.version_code {
            self.version_code = code;
        }
        if let Some(name) = &overrides.version_name {
            self.version_name = name.clone();
        }
    }
}

fn parse_u32(props: &PropertiesSource, key: &str) -> Result<Option<u32>> {
    props
        .get(key)
        .map(|raw| {
            raw.trim().parse::<u32>().map_err(|e| {
                Error::config_parse(format!("{} must be an integer, got '{}'", key, raw))
                    .with_source(e)
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidconf_core::error::ErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_from_schema_defaults() {
        let settings = EngineSettings::from_schema(&ConfigSchema::default());
        assert_eq!(settings.compile_sdk, 35);
        assert_eq!(settings.min_sdk, 21);
        assert_eq!(settings.version_code, 1);
        assert_eq!(settings.ndk_version, None);
    }

    #[test]
    fn test_local_properties_overlay() {
        let mut settings = EngineSettings::from_schema(&ConfigSchema::default());
        let props = PropertiesSource::parse(
            "sdk.dir=/opt/android\nflutter.versionCode=47\nflutter.versionName=2.3.1\nflutter.minSdkVersion= 23\n",
        )
        .unwrap();

        settings.apply_local_properties(&props).unwrap();
        assert_eq!(settings.version_code, 47);
        assert_eq!(settings.version_name, "2.3.1");
        assert_eq!(settings.min_sdk, 23);
        assert_eq!(settings.compile_sdk, 35);
    }

    #[test]
    fn test_non_integer_is_parse_error() {
        let mut settings = EngineSettings::from_schema(&ConfigSchema::default());
        let props = PropertiesSource::parse("flutter.versionCode=forty\n").unwrap();

        let err = settings.apply_local_properties(&props).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.message.contains(VERSION_CODE_KEY));
    }

    #[test]
    fn test_overrides_win() {
        let mut settings = EngineSettings::from_schema(&ConfigSchema::default());
        settings.apply_overrides(&EngineOverrides {
            version_code: Some(900),
            version_name: None,
        });
        assert_eq!(settings.version_code, 900);
        assert_eq!(settings.version_name, "1.0.0");
    }

    #[test]
    fn test_local_properties_file() {
        let dir = TempDir::new().unwrap();
        let mut settings = EngineSettings::from_schema(&ConfigSchema::default());
        assert!(!settings.apply_local_properties_file(dir.path()).unwrap());

        std::fs::write(dir.path().join(LOCAL_PROPERTIES), "flutter.ndkVersion=27.0.12077973\n").unwrap();
        assert!(settings.apply_local_properties_file(dir.path()).unwrap());
        assert_eq!(settings.ndk_version.as_deref(), Some("27.0.12077973"));
    }
}
