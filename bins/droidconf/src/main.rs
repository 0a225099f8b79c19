//! droidconf CLI
//!
//! Resolves Android build configuration and release signing, and hands the
//! result to Gradle.

use clap::{Args, Parser, Subcommand};
use droidconf_android::gradle::{self, TaskKind};
use droidconf_android::signing::SigningCredentials;
use droidconf_android::{
    BuildDescriptor, BuildVariant, ConfigResolver, EngineOverrides, EngineSettings,
    PropertiesSource, StaticDefaults, VariantSigning,
};
use droidconf_cli::output::{self, format_count, format_optional, Status};
use droidconf_cli::progress;
use droidconf_core::config::Config;
use droidconf_core::error::{exit_codes, Error, ErrorCode, Result};
use droidconf_telemetry::{TelemetryConfig, Timer};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "droidconf")]
#[command(about = "Resolve Android build configuration and signing for Gradle")]
#[command(version)]
struct Cli {
    /// Config file path (defaults to droidconf.toml in the project dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Android project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct ResolveArgs {
    /// Keystore properties file (defaults to [signing].properties_file)
    #[arg(long)]
    properties: Option<PathBuf>,

    /// Override the version code
    #[arg(long)]
    version_code: Option<u32>,

    /// Override the version name
    #[arg(long)]
    version_name: Option<String>,

    /// Ignore the framework's local.properties
    #[arg(long)]
    no_local_properties: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print the build descriptor
    Resolve {
        #[command(flatten)]
        args: ResolveArgs,
        /// Print signing passwords instead of masking them
        #[arg(long)]
        reveal_secrets: bool,
    },

    /// List composed build variants
    Variants {
        #[command(flatten)]
        args: ResolveArgs,
    },

    /// Check the keystore properties file
    Signing {
        /// Keystore properties file (defaults to [signing].properties_file)
        #[arg(long)]
        properties: Option<PathBuf>,
    },

    /// List Gradle packaging tasks per variant
    Tasks {
        #[command(flatten)]
        args: ResolveArgs,
    },

    /// Package a variant with Gradle
    Build {
        /// Variant name, e.g. devRelease
        variant: String,
        #[command(flatten)]
        args: ResolveArgs,
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
        /// Clean before building
        #[arg(long)]
        clean: bool,
        /// Package release variants even without signing credentials
        #[arg(long)]
        allow_unsigned: bool,
        /// Capture Gradle output behind a spinner instead of streaming it
        #[arg(long)]
        capture: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    output::set_quiet(cli.quiet);

    if let Err(e) = init_logging(&cli) {
        Status::warning(&format!("Logging disabled: {}", e));
    }

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            report_error(&e, cli.json);
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let config = TelemetryConfig {
        json: cli.log_json,
        ..TelemetryConfig::for_verbosity(cli.verbose, cli.quiet)
    };
    droidconf_telemetry::init_with_config(config)
}

fn report_error(error: &Error, json: bool) {
    tracing::debug!(
        code = %error.code,
        session_id = droidconf_telemetry::session_id(),
        "Command failed"
    );
    if json {
        match serde_json::to_string_pretty(&error.to_report()) {
            Ok(report) => println!("{}", report),
            Err(e) => Status::error(&format!("Failed to serialize error: {}", e)),
        }
    }
    Status::error(&error.to_string());
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Resolve {
            args,
            reveal_secrets,
        } => run_resolve(cli, args, *reveal_secrets),
        Commands::Variants { args } => run_variants(cli, args),
        Commands::Signing { properties } => run_signing(cli, properties.as_deref()),
        Commands::Tasks { args } => run_tasks(cli, args),
        Commands::Build {
            variant,
            args,
            bundle,
            clean,
            allow_unsigned,
            capture,
        } => run_build(
            cli,
            args,
            &BuildOptions {
                variant,
                bundle: *bundle,
                clean: *clean,
                allow_unsigned: *allow_unsigned,
                capture: *capture,
            },
        ),
    }
}

fn build_resolver(cli: &Cli, args: &ResolveArgs) -> Result<ConfigResolver> {
    let config = Config::load(cli.config.as_deref(), &cli.project_dir)?;

    let mut engine = EngineSettings::from_schema(&config.schema);
    if !args.no_local_properties && engine.apply_local_properties_file(&cli.project_dir)? {
        tracing::info!("Applied engine settings from local.properties");
    }
    engine.apply_overrides(&EngineOverrides {
        version_code: args.version_code,
        version_name: args.version_name.clone(),
    });

    let defaults = StaticDefaults::from_schema(&config.schema, engine);
    Ok(ConfigResolver::new(defaults).with_root(&cli.project_dir))
}

fn resolve(cli: &Cli, args: &ResolveArgs) -> Result<BuildDescriptor> {
    let resolver = build_resolver(cli, args)?;
    let timer = Timer::start("resolve");
    let descriptor = match &args.properties {
        Some(path) => resolver.resolve(path),
        None => resolver.resolve_project(),
    }?;
    timer.stop();
    Ok(descriptor)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn signing_label(signing: VariantSigning) -> String {
    match signing {
        VariantSigning::Debug => "debug key".dimmed().to_string(),
        VariantSigning::Release => "release key".green().to_string(),
        VariantSigning::Unsigned => "unsigned".yellow().to_string(),
    }
}

fn run_resolve(cli: &Cli, args: &ResolveArgs, reveal_secrets: bool) -> Result<i32> {
    let descriptor = resolve(cli, args)?;

    if cli.json {
        let shown = if reveal_secrets {
            descriptor
        } else {
            descriptor.redacted()
        };
        print_json(&shown)?;
        return Ok(exit_codes::SUCCESS);
    }

    Status::header("Build descriptor");
    Status::field("namespace", &descriptor.namespace);
    Status::field("application id", &descriptor.application_id);
    Status::field(
        "sdk",
        &format!(
            "min {} / target {} / compile {}",
            descriptor.min_sdk, descriptor.target_sdk, descriptor.compile_sdk
        ),
    );
    Status::field("ndk", &format_optional(descriptor.ndk_version.as_deref()));
    Status::field(
        "version",
        &format!("{} ({})", descriptor.version_name, descriptor.version_code),
    );
    Status::field("java", &descriptor.java_version.to_string());
    if descriptor.desugaring.enabled {
        Status::field("desugaring", &descriptor.desugaring.dependency);
    }

    Status::header("Signing");
    match &descriptor.signing {
        Some(creds) => {
            let creds = if reveal_secrets {
                creds.clone()
            } else {
                creds.redacted()
            };
            Status::field("key store", &creds.key_file);
            Status::field("alias", &creds.alias);
            Status::field("store password", &creds.store_password);
            Status::field("key password", &creds.key_password);
        }
        None => Status::info("No signing credentials, release variants are unsigned"),
    }

    print_variant_table(&descriptor.variants);
    Ok(exit_codes::SUCCESS)
}

fn print_variant_table(variants: &[BuildVariant]) {
    if output::is_quiet() {
        return;
    }
    Status::header(&format!(
        "Variants ({})",
        format_count(variants.len(), "variant", "variants")
    ));
    for variant in variants {
        println!(
            "  {:<24} {:<32} {}",
            variant.name.bold(),
            variant.application_id,
            signing_label(variant.signing)
        );
    }
}

fn run_variants(cli: &Cli, args: &ResolveArgs) -> Result<i32> {
    let descriptor = resolve(cli, args)?;

    if cli.json {
        print_json(&descriptor.variants)?;
    } else {
        print_variant_table(&descriptor.variants);
    }

    for variant in descriptor.unsigned_variants() {
        tracing::warn!(variant = %variant.name, "Variant has no release signing credentials");
    }

    Ok(exit_codes::SUCCESS)
}

#[derive(Serialize)]
struct SigningReport {
    properties_file: PathBuf,
    present: bool,
    complete: bool,
    key_file: Option<String>,
    alias: Option<String>,
    store_file: Option<PathBuf>,
    store_file_exists: bool,
}

fn run_signing(cli: &Cli, properties: Option<&Path>) -> Result<i32> {
    let path = match properties {
        Some(path) => path.to_path_buf(),
        None => build_resolver(cli, &ResolveArgs::default())?.properties_path(),
    };

    let report = match PropertiesSource::try_load(&path)? {
        None => SigningReport {
            properties_file: path,
            present: false,
            complete: false,
            key_file: None,
            alias: None,
            store_file: None,
            store_file_exists: false,
        },
        Some(props) => {
            let creds = SigningCredentials::from_properties(&props)?;
            let store_file = creds.store_file(&cli.project_dir);
            SigningReport {
                properties_file: path,
                present: true,
                complete: true,
                store_file_exists: store_file.is_file(),
                store_file: Some(store_file),
                key_file: Some(creds.key_file),
                alias: Some(creds.alias),
            }
        }
    };

    if cli.json {
        print_json(&report)?;
        return Ok(exit_codes::SUCCESS);
    }

    if !report.present {
        Status::warning(&format!(
            "No signing properties at {}, release builds will be unsigned",
            report.properties_file.display()
        ));
        return Ok(exit_codes::SUCCESS);
    }

    Status::success(&format!(
        "Signing properties complete in {}",
        report.properties_file.display()
    ));
    Status::field("alias", report.alias.as_deref().unwrap_or_default());
    if let Some(store_file) = &report.store_file {
        Status::field("key store", &store_file.display().to_string());
        if !report.store_file_exists {
            Status::warning(&format!("Key store not found: {}", store_file.display()));
        }
    }

    Ok(exit_codes::SUCCESS)
}

#[derive(Serialize)]
struct TaskRow<'a> {
    variant: &'a str,
    assemble: String,
    bundle: String,
    signing: VariantSigning,
}

fn run_tasks(cli: &Cli, args: &ResolveArgs) -> Result<i32> {
    let descriptor = resolve(cli, args)?;
    let rows: Vec<TaskRow<'_>> = descriptor
        .variants
        .iter()
        .map(|v| TaskRow {
            variant: &v.name,
            assemble: gradle::task_name(TaskKind::Assemble, v),
            bundle: gradle::task_name(TaskKind::Bundle, v),
            signing: v.signing,
        })
        .collect();

    if cli.json {
        print_json(&rows)?;
        return Ok(exit_codes::SUCCESS);
    }

    if output::is_quiet() {
        return Ok(exit_codes::SUCCESS);
    }
    Status::header("Gradle tasks");
    for row in &rows {
        println!("  {:<28} {:<28} {}", row.assemble, row.bundle, signing_label(row.signing));
    }
    Ok(exit_codes::SUCCESS)
}

struct BuildOptions<'a> {
    variant: &'a str,
    bundle: bool,
    clean: bool,
    allow_unsigned: bool,
    capture: bool,
}

fn run_build(cli: &Cli, args: &ResolveArgs, opts: &BuildOptions<'_>) -> Result<i32> {
    let descriptor = resolve(cli, args)?;

    let variant = descriptor.variant(opts.variant).ok_or_else(|| {
        let known: Vec<&str> = descriptor.variants.iter().map(|v| v.name.as_str()).collect();
        Error::new(
            ErrorCode::InvalidInput,
            format!("Unknown variant: {}", opts.variant),
        )
        .with_suggestion(format!("Choose one of: {}", known.join(", ")))
    })?;

    if opts.allow_unsigned {
        if variant.is_unsigned() {
            Status::warning(&format!("Packaging {} without release signing", variant.name));
        }
    } else {
        gradle::ensure_signed(variant)?;
    }

    let project_dir = &cli.project_dir;

    if opts.clean {
        Status::info("Cleaning...");
        let result = gradle::clean(project_dir)?;
        if !result.success {
            return Err(Error::gradle("Gradle clean failed").with_context(result.stderr));
        }
    }

    let task = if opts.bundle {
        gradle::bundle_task(variant)
    } else {
        gradle::assemble_task(variant)
    };
    let env = gradle::to_gradle_env(&gradle::injected_properties(&descriptor, variant));

    Status::info(&format!("Running {}...", task));
    let timer = Timer::start(task.clone());

    let exit_code = if opts.capture && !cli.quiet {
        let pb = progress::spinner(&format!("Running {}...", task));
        let result = gradle::run_task_captured(project_dir, &task, &env)?;
        if result.success {
            progress::finish_success(&pb, &task);
        } else {
            progress::finish_error(&pb, &task);
            eprintln!("{}", result.combined_output());
        }
        result.exit_code
    } else if opts.capture {
        let result = gradle::run_task_captured(project_dir, &task, &env)?;
        if !result.success {
            eprintln!("{}", result.combined_output());
        }
        result.exit_code
    } else {
        gradle::run_task(project_dir, &task, &env)?
    };

    let elapsed = timer.stop();

    if exit_code != 0 {
        return Err(Error::gradle(format!("{} failed with exit code {}", task, exit_code)));
    }

    Status::success(&format!("{} succeeded in {:.1}s", task, elapsed.as_secs_f32()));
    Ok(exit_codes::SUCCESS)
}
