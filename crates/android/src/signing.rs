//! Release signing credentials
//!
//! The four `release*` keys of `keystore.properties` are all-or-nothing:
//! a file that provides some of them is a configuration error.

use crate::properties::PropertiesSource;
use droidconf_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Key store path, relative to the project root or absolute
pub const RELEASE_KEY_STORE: &str = "releaseKeyStore";
/// Key store password
pub const RELEASE_STORE_PASSWORD: &str = "releaseStorePassword";
/// Key password
pub const RELEASE_KEY_PASSWORD: &str = "releaseKeyPassword";
/// Key alias
pub const RELEASE_KEY_ALIAS: &str = "releaseKeyAlias";

/// Every key a signing properties file must define
pub const SIGNING_KEYS: [&str; 4] = [
    RELEASE_KEY_STORE,
    RELEASE_STORE_PASSWORD,
    RELEASE_KEY_PASSWORD,
    RELEASE_KEY_ALIAS,
];

const REDACTED: &str = "********";

/// Credentials for the release signing config
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningCredentials {
    /// Key store path exactly as written in the properties file
    pub key_file: String,
    /// Key store password
    pub store_password: String,
    /// Key password
    pub key_password: String,
    /// Key alias inside the store
    pub alias: String,
}

impl SigningCredentials {
    /// Extract credentials from a loaded properties source
    pub fn from_properties(props: &PropertiesSource) -> Result<Self> {
        let missing: Vec<&str> = SIGNING_KEYS
            .iter()
            .copied()
            .filter(|key| !props.contains_key(key))
            .collect();

        if !missing.is_empty() {
            let origin = props
                .origin()
                .map_or_else(|| PathBuf::from("<properties>"), Path::to_path_buf);
            return Err(Error::missing_credentials(origin, &missing));
        }

        let field = |key: &str| props.get(key).unwrap_or_default().to_string();

        Ok(Self {
            key_file: field(RELEASE_KEY_STORE),
            store_password: field(RELEASE_STORE_PASSWORD),
            key_password: field(RELEASE_KEY_PASSWORD),
            alias: field(RELEASE_KEY_ALIAS),
        })
    }

    /// Absolute key store location.
    ///
    /// A relative `key_file` is joined onto the project root, then made
    /// absolute against the current directory. Gradle runs from the project
    /// root, so it must never see a cwd-relative path.
    pub fn store_file(&self, root: &Path) -> PathBuf {
        let key_file = Path::new(&self.key_file);
        if key_file.is_absolute() {
            return key_file.to_path_buf();
        }
        let joined = root.join(key_file);
        std::path::absolute(&joined).unwrap_or(joined)
    }

    /// Copy with both passwords masked, safe to print
    pub fn redacted(&self) -> Self {
        Self {
            key_file: self.key_file.clone(),
            store_password: REDACTED.to_string(),
            key_password: REDACTED.to_string(),
            alias: self.alias.clone(),
        }
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("key_file", &self.key_file)
            .field("store_password", &REDACTED)
            .field("key_password", &REDACTED)
            .field("alias", &self.alias)
            .finish()
    }
}
