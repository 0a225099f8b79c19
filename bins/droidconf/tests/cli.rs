use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const FULL_PROPERTIES: &str = "releaseKeyStore=upload.jks\n\
releaseStorePassword=s3cretStore\n\
releaseKeyPassword=s3cretKey\n\
releaseKeyAlias=upload\n";

fn droidconf(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("droidconf").unwrap();
    cmd.arg("--no-color").arg("--project-dir").arg(project);
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn resolve_without_properties_is_unsigned() {
    let dir = TempDir::new().unwrap();

    let json = json_stdout(droidconf(dir.path()).args(["resolve", "--json"]));
    assert!(json["signing"].is_null());
    assert_eq!(json["application_id"], "com.otraku.app");

    let variants = json["variants"].as_array().unwrap();
    let release = variants.iter().find(|v| v["name"] == "devRelease").unwrap();
    assert_eq!(release["signing"], "unsigned");
    assert_eq!(release["application_id"], "com.otraku.app.dev");
}

#[test]
fn resolve_with_properties_masks_passwords() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keystore.properties"), FULL_PROPERTIES).unwrap();

    droidconf(dir.path())
        .args(["resolve", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key_file\": \"upload.jks\""))
        .stdout(predicate::str::contains("\"alias\": \"upload\""))
        .stdout(predicate::str::contains("s3cret").not());
}

#[test]
fn resolve_reveal_secrets() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keystore.properties"), FULL_PROPERTIES).unwrap();

    let json = json_stdout(droidconf(dir.path()).args(["resolve", "--json", "--reveal-secrets"]));
    assert_eq!(json["signing"]["store_password"], "s3cretStore");
    assert_eq!(json["signing"]["key_password"], "s3cretKey");
}

#[test]
fn resolve_partial_properties_is_config_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("keystore.properties"),
        "releaseKeyStore=upload.jks\nreleaseKeyAlias=upload\n",
    )
    .unwrap();

    droidconf(dir.path())
        .arg("resolve")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3005"))
        .stderr(predicate::str::contains("releaseStorePassword"));
}

#[test]
fn resolve_json_error_report() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keystore.properties"), "releaseKeyStore=\\uXYZW\n").unwrap();

    droidconf(dir.path())
        .args(["resolve", "--json"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("\"code_str\": \"E3002\""));
}

#[test]
fn explicit_properties_path() {
    let dir = TempDir::new().unwrap();
    let elsewhere = dir.path().join("secrets.properties");
    std::fs::write(&elsewhere, FULL_PROPERTIES).unwrap();

    let json = json_stdout(
        droidconf(dir.path())
            .args(["resolve", "--json", "--properties"])
            .arg(&elsewhere),
    );
    assert_eq!(json["signing"]["key_file"], "upload.jks");
}

#[test]
fn local_properties_and_overrides() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("local.properties"),
        "flutter.versionCode=47\nflutter.versionName=2.3.1\n",
    )
    .unwrap();

    let json = json_stdout(droidconf(dir.path()).args(["resolve", "--json"]));
    assert_eq!(json["version_code"], 47);
    assert_eq!(json["version_name"], "2.3.1");

    let json = json_stdout(droidconf(dir.path()).args(["resolve", "--json", "--version-code", "48"]));
    assert_eq!(json["version_code"], 48);

    let json = json_stdout(droidconf(dir.path()).args(["resolve", "--json", "--no-local-properties"]));
    assert_eq!(json["version_code"], 1);
}

#[test]
fn variants_from_project_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("droidconf.toml"),
        r#"
flavor_dimensions = ["tier", "env"]

[[flavors]]
name = "free"
dimension = "tier"

[[flavors]]
name = "paid"
dimension = "tier"

[[flavors]]
name = "staging"
dimension = "env"
application_id_suffix = ".staging"
"#,
    )
    .unwrap();

    let json = json_stdout(droidconf(dir.path()).args(["variants", "--json"]));
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["freeStagingDebug", "freeStagingRelease", "paidStagingDebug", "paidStagingRelease"]
    );
}

#[test]
fn invalid_project_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("droidconf.toml"), "[sdk]\nmin = 34\ntarget = 30\n").unwrap();

    droidconf(dir.path())
        .arg("variants")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3003"));
}

#[test]
fn signing_check_without_file() {
    let dir = TempDir::new().unwrap();

    droidconf(dir.path())
        .arg("signing")
        .assert()
        .success()
        .stderr(predicate::str::contains("unsigned"));
}

#[test]
fn signing_check_reports_missing_key_store() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keystore.properties"), FULL_PROPERTIES).unwrap();

    let json = json_stdout(droidconf(dir.path()).args(["signing", "--json"]));
    assert_eq!(json["complete"], true);
    assert_eq!(json["store_file_exists"], false);

    std::fs::write(dir.path().join("upload.jks"), b"keystore").unwrap();
    let json = json_stdout(droidconf(dir.path()).args(["signing", "--json"]));
    assert_eq!(json["store_file_exists"], true);
}

#[test]
fn tasks_listing() {
    let dir = TempDir::new().unwrap();

    let json = json_stdout(droidconf(dir.path()).args(["tasks", "--json"]));
    let rows = json.as_array().unwrap();
    assert_eq!(rows[1]["assemble"], "assembleDevRelease");
    assert_eq!(rows[1]["bundle"], "bundleDevRelease");
}

#[test]
fn build_unsigned_release_is_refused() {
    let dir = TempDir::new().unwrap();

    droidconf(dir.path())
        .args(["build", "devRelease"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("requires release signing"));
}

#[test]
fn build_unknown_variant() {
    let dir = TempDir::new().unwrap();

    droidconf(dir.path())
        .args(["build", "prodRelease"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("devDebug, devRelease"));
}

#[cfg(target_os = "linux")]
#[test]
fn build_runs_gradle_wrapper_with_injected_signing() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keystore.properties"), FULL_PROPERTIES).unwrap();

    let wrapper = dir.path().join("gradlew");
    std::fs::write(
        &wrapper,
        "#!/bin/sh\n\
         [ \"$1\" = bundleDevRelease ] || exit 5\n\
         tr '\\0' '\\n' < /proc/$$/environ | grep -q '^ORG_GRADLE_PROJECT_android.injected.signing.key.alias=upload$' || exit 6\n\
         echo packaged\n",
    )
    .unwrap();
    std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755)).unwrap();

    droidconf(dir.path())
        .args(["--quiet", "build", "devRelease", "--bundle", "--capture"])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn build_failure_propagates() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let wrapper = dir.path().join("gradlew");
    std::fs::write(&wrapper, "#!/bin/sh\necho broken >&2\nexit 1\n").unwrap();
    std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755)).unwrap();

    droidconf(dir.path())
        .args(["build", "devDebug"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("E8002"));
}

#[cfg(target_os = "linux")]
#[test]
fn build_with_relative_project_dir_passes_absolute_store_file() {
    use std::os::unix::fs::PermissionsExt;

    let parent = TempDir::new().unwrap();
    let project = parent.path().join("android");
    std::fs::create_dir(&project).unwrap();
    std::fs::write(project.join("keystore.properties"), FULL_PROPERTIES).unwrap();
    std::fs::write(project.join("upload.jks"), b"keystore").unwrap();

    let wrapper = project.join("gradlew");
    std::fs::write(
        &wrapper,
        "#!/bin/sh\n\
         store=$(tr '\\0' '\\n' < /proc/$$/environ | sed -n 's/^ORG_GRADLE_PROJECT_android.injected.signing.store.file=//p')\n\
         case \"$store\" in /*) ;; *) exit 6 ;; esac\n\
         [ -f \"$store\" ] || exit 7\n",
    )
    .unwrap();
    std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755)).unwrap();

    Command::cargo_bin("droidconf")
        .unwrap()
        .current_dir(parent.path())
        .args(["--no-color", "--quiet", "-C", "android", "build", "devRelease", "--capture"])
        .assert()
        .success();
}

#[test]
fn declared_build_types_extend_implicit_ones() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("droidconf.toml"),
        r#"
[[build_types]]
name = "release"
version_name_suffix = "-rc"

[[build_types]]
name = "profile"
signing = "debug"
"#,
    )
    .unwrap();

    let json = json_stdout(droidconf(dir.path()).args(["variants", "--json"]));
    let variants = json.as_array().unwrap();
    let names: Vec<&str> = variants.iter().map(|v| v["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["devDebug", "devRelease", "devProfile"]);
    assert_eq!(variants[1]["version_name"], "1.0.0-rc");
    assert_eq!(variants[2]["signing"], "debug");
}
