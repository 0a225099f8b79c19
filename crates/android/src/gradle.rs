//! Gradle build system integration
//!
//! Hands a resolved [`BuildDescriptor`] to the Gradle wrapper. Version and
//! signing values travel as `android.injected.*` project properties set
//! through `ORG_GRADLE_PROJECT_` environment variables, so passwords never
//! appear on the command line.

use crate::descriptor::BuildDescriptor;
use crate::variant::{capitalize, BuildVariant, VariantSigning};
use droidconf_core::error::{Error, ErrorCode, Result};
use droidconf_core::process::{self, CommandResult};
use std::path::Path;

const ENV_PREFIX: &str = "ORG_GRADLE_PROJECT_";

/// Overrides `versionCode`
pub const INJECTED_VERSION_CODE: &str = "android.injected.version.code";
/// Overrides `versionName`
pub const INJECTED_VERSION_NAME: &str = "android.injected.version.name";
/// Absolute key store path
pub const INJECTED_STORE_FILE: &str = "android.injected.signing.store.file";
/// Key store password
pub const INJECTED_STORE_PASSWORD: &str = "android.injected.signing.store.password";
/// Key alias
pub const INJECTED_KEY_ALIAS: &str = "android.injected.signing.key.alias";
/// Key password
pub const INJECTED_KEY_PASSWORD: &str = "android.injected.signing.key.password";

/// Packaging task family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// APK
    Assemble,
    /// App bundle (AAB)
    Bundle,
}

impl TaskKind {
    fn prefix(self) -> &'static str {
        match self {
            TaskKind::Assemble => "assemble",
            TaskKind::Bundle => "bundle",
        }
    }
}

/// Task name for a variant, e.g. `bundleDevRelease`
pub fn task_name(kind: TaskKind, variant: &BuildVariant) -> String {
    format!("{}{}", kind.prefix(), capitalize(&variant.name))
}

/// Build APK task for a variant
pub fn assemble_task(variant: &BuildVariant) -> String {
    task_name(TaskKind::Assemble, variant)
}

/// Build bundle (AAB) task for a variant
pub fn bundle_task(variant: &BuildVariant) -> String {
    task_name(TaskKind::Bundle, variant)
}

/// Refuse to package a variant that needs release credentials it lacks
pub fn ensure_signed(variant: &BuildVariant) -> Result<()> {
    if variant.is_unsigned() {
        return Err(Error::new(
            ErrorCode::MissingCredential,
            format!("Variant '{}' requires release signing credentials", variant.name),
        )
        .with_suggestion(
            "Create keystore.properties with releaseKeyStore, releaseStorePassword, \
             releaseKeyPassword and releaseKeyAlias, or pass --allow-unsigned",
        ));
    }
    Ok(())
}

/// `android.injected.*` project properties for building `variant`
pub fn injected_properties(descriptor: &BuildDescriptor, variant: &BuildVariant) -> Vec<(String, String)> {
    let mut props = vec![
        (INJECTED_VERSION_CODE.to_string(), descriptor.version_code.to_string()),
        (INJECTED_VERSION_NAME.to_string(), variant.version_name.clone()),
    ];

    if variant.signing == VariantSigning::Release {
        if let (Some(creds), Some(store_file)) = (&descriptor.signing, descriptor.store_file()) {
            props.push((INJECTED_STORE_FILE.to_string(), store_file.display().to_string()));
            props.push((INJECTED_STORE_PASSWORD.to_string(), creds.store_password.clone()));
            props.push((INJECTED_KEY_ALIAS.to_string(), creds.alias.clone()));
            props.push((INJECTED_KEY_PASSWORD.to_string(), creds.key_password.clone()));
        }
    }

    props
}

/// Environment variables carrying project properties to Gradle
pub fn to_gradle_env(props: &[(String, String)]) -> Vec<(String, String)> {
    props
        .iter()
        .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v.clone()))
        .collect()
}

/// Gradle wrapper file name for this platform
pub fn wrapper_name() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    }
}

/// Program to invoke: the project's wrapper, else `gradle` from PATH
pub fn gradle_program(project_dir: &Path) -> Result<String> {
    let wrapper = project_dir.join(wrapper_name());
    if wrapper.is_file() {
        // Absolute, since the child runs with `project_dir` as its cwd
        let wrapper = std::fs::canonicalize(&wrapper)?;
        return Ok(wrapper.display().to_string());
    }
    if process::command_exists("gradle") {
        tracing::warn!(dir = %project_dir.display(), "No Gradle wrapper found, using gradle from PATH");
        return Ok("gradle".to_string());
    }
    Err(Error::command_not_found("gradlew")
        .with_context(format!("No {} in {}", wrapper_name(), project_dir.display())))
}

/// Run a Gradle task, streaming output
pub fn run_task(project_dir: &Path, task: &str, env: &[(String, String)]) -> Result<i32> {
    let program = gradle_program(project_dir)?;
    tracing::info!(task, dir = %project_dir.display(), "Running Gradle task");
    process::run_command_streaming_in_dir(&program, &[task], project_dir, env)
}

/// Run a Gradle task, capturing output
pub fn run_task_captured(project_dir: &Path, task: &str, env: &[(String, String)]) -> Result<CommandResult> {
    let program = gradle_program(project_dir)?;
    tracing::info!(task, dir = %project_dir.display(), "Running Gradle task (captured)");
    process::run_command_in_dir(&program, &[task], project_dir, env)
}

/// Clean build artifacts
pub fn clean(project_dir: &Path) -> Result<CommandResult> {
    run_task_captured(project_dir, "clean", &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertiesSource;
    use crate::resolver::{ConfigResolver, StaticDefaults};
    use tempfile::TempDir;

    fn signed_descriptor(root: &Path) -> BuildDescriptor {
        let props = PropertiesSource::parse(
            "releaseKeyStore=upload.jks\nreleaseStorePassword=sp\nreleaseKeyPassword=kp\nreleaseKeyAlias=upload\n",
        )
        .unwrap();
        ConfigResolver::new(StaticDefaults::default())
            .with_root(root)
            .resolve_with(Some(&props))
            .unwrap()
    }

    fn unsigned_descriptor() -> BuildDescriptor {
        ConfigResolver::new(StaticDefaults::default())
            .resolve_with(None)
            .unwrap()
    }

    #[test]
    fn test_task_names() {
        let descriptor = unsigned_descriptor();
        let release = descriptor.variant("devRelease").unwrap();
        assert_eq!(assemble_task(release), "assembleDevRelease");
        assert_eq!(bundle_task(release), "bundleDevRelease");
    }

    #[test]
    fn test_ensure_signed() {
        let descriptor = unsigned_descriptor();
        assert!(ensure_signed(descriptor.variant("devDebug").unwrap()).is_ok());

        let err = ensure_signed(descriptor.variant("devRelease").unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingCredential);
    }

    #[test]
    fn test_injected_properties_signed_release() {
        let descriptor = signed_descriptor(Path::new("/work/android"));
        let release = descriptor.variant("devRelease").unwrap();
        let props = injected_properties(&descriptor, release);

        let get = |key: &str| props.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        assert_eq!(get(INJECTED_VERSION_CODE), Some("1"));
        assert_eq!(get(INJECTED_KEY_ALIAS), Some("upload"));
        assert_eq!(get(INJECTED_STORE_PASSWORD), Some("sp"));
        assert_eq!(
            get(INJECTED_STORE_FILE),
            Some(Path::new("/work/android").join("upload.jks").display().to_string().as_str())
        );
    }

    #[test]
    fn test_injected_properties_debug_has_no_signing() {
        let descriptor = signed_descriptor(Path::new("."));
        let debug = descriptor.variant("devDebug").unwrap();
        let props = injected_properties(&descriptor, debug);
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_gradle_env_prefix() {
        let env = to_gradle_env(&[("android.injected.version.code".to_string(), "3".to_string())]);
        assert_eq!(env[0].0, "ORG_GRADLE_PROJECT_android.injected.version.code");
        assert_eq!(env[0].1, "3");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_run_task_uses_wrapper_and_env() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let wrapper = dir.path().join("gradlew");
        std::fs::write(
            &wrapper,
            "#!/bin/sh\n[ \"$1\" = assembleDevDebug ] || exit 3\ntr '\\0' '\\n' < /proc/$$/environ | grep -q '^ORG_GRADLE_PROJECT_android.injected.version.code=7$' || exit 4\n",
        )
        .unwrap();
        std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755)).unwrap();

        let env = to_gradle_env(&[(INJECTED_VERSION_CODE.to_string(), "7".to_string())]);
        let code = run_task(dir.path(), "assembleDevDebug", &env).unwrap();
        assert_eq!(code, 0);
    }
}
