//! Build variant composition
//!
//! Variants are the Cartesian product of one flavor per dimension and the
//! build types, named and suffixed the way the Android Gradle plugin does.

use droidconf_core::config::{BuildType, ProductFlavor, SigningKind};
use droidconf_core::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Signing state of a composed variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantSigning {
    /// Signed with the toolchain debug key
    Debug,
    /// Signed with the release credentials
    Release,
    /// Wants release signing but no credentials were provided
    Unsigned,
}

/// One flavor combination paired with one build type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVariant {
    /// Gradle variant name, e.g. `devRelease`
    pub name: String,
    /// Flavor names in dimension order
    pub flavors: Vec<String>,
    /// Build type name
    pub build_type: String,
    /// Base id plus flavor and build type suffixes
    pub application_id: String,
    /// Base version name plus suffixes
    pub version_name: String,
    /// Whether the variant is debuggable
    pub debuggable: bool,
    /// Whether code shrinking is enabled
    pub minify: bool,
    /// How this variant is signed
    pub signing: VariantSigning,
}

impl BuildVariant {
    /// Whether this variant needs release credentials it does not have
    pub fn is_unsigned(&self) -> bool {
        self.signing == VariantSigning::Unsigned
    }
}

/// Inputs to variant composition
pub struct VariantSpec<'a> {
    /// Base application id
    pub application_id: &'a str,
    /// Base version name
    pub version_name: &'a str,
    /// Flavor dimensions in declaration order
    pub flavor_dimensions: &'a [String],
    /// Declared product flavors
    pub flavors: &'a [ProductFlavor],
    /// Build types to pair with each flavor combination
    pub build_types: &'a [BuildType],
    /// Whether release credentials were resolved
    pub has_release_credentials: bool,
}

/// Compose every variant
pub fn compose(spec: &VariantSpec<'_>) -> Result<Vec<BuildVariant>> {
    check_unique("build type", spec.build_types.iter().map(|b| b.name.as_str()))?;
    check_unique("flavor", spec.flavors.iter().map(|f| f.name.as_str()))?;
    check_unique("flavor dimension", spec.flavor_dimensions.iter().map(String::as_str))?;

    if spec.build_types.is_empty() {
        return Err(invalid("At least one build type is required"));
    }

    let groups = group_by_dimension(spec.flavor_dimensions, spec.flavors)?;

    let mut combos: Vec<Vec<&ProductFlavor>> = vec![Vec::new()];
    for group in &groups {
        combos = combos
            .iter()
            .flat_map(|combo| {
                group.iter().map(move |flavor| {
                    let mut next = combo.clone();
                    next.push(*flavor);
                    next
                })
            })
            .collect();
    }

    let variants: Vec<BuildVariant> = combos
        .iter()
        .flat_map(|combo| {
            spec.build_types
                .iter()
                .map(move |build_type| build_variant(spec, combo, build_type))
        })
        .collect();

    tracing::debug!(
        dimensions = groups.len(),
        flavors = spec.flavors.len(),
        build_types = spec.build_types.len(),
        variants = variants.len(),
        "Composed build variants"
    );

    Ok(variants)
}

fn build_variant(spec: &VariantSpec<'_>, combo: &[&ProductFlavor], build_type: &BuildType) -> BuildVariant {
    let mut names: Vec<&str> = combo.iter().map(|f| f.name.as_str()).collect();
    names.push(&build_type.name);

    let mut application_id = spec.application_id.to_string();
    let mut version_name = spec.version_name.to_string();
    for flavor in combo {
        push_suffix(&mut application_id, flavor.application_id_suffix.as_deref());
        push_suffix(&mut version_name, flavor.version_name_suffix.as_deref());
    }
    push_suffix(&mut application_id, build_type.application_id_suffix.as_deref());
    push_suffix(&mut version_name, build_type.version_name_suffix.as_deref());

    let signing = match build_type.signing {
        SigningKind::Debug => VariantSigning::Debug,
        SigningKind::Release if spec.has_release_credentials => VariantSigning::Release,
        SigningKind::Release => VariantSigning::Unsigned,
    };

    BuildVariant {
        name: variant_name(&names),
        flavors: combo.iter().map(|f| f.name.clone()).collect(),
        build_type: build_type.name.clone(),
        application_id,
        version_name,
        debuggable: build_type.debuggable,
        minify: build_type.minify,
        signing,
    }
}

/// Join name parts camel-case: `["dev", "release"]` becomes `devRelease`
pub fn variant_name(parts: &[&str]) -> String {
    let mut name = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            name.push_str(part);
        } else {
            name.push_str(&capitalize(part));
        }
    }
    name
}

/// Upper-case the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn push_suffix(base: &mut String, suffix: Option<&str>) {
    if let Some(suffix) = suffix {
        base.push_str(suffix);
    }
}

fn group_by_dimension<'a>(
    dimensions: &[String],
    flavors: &'a [ProductFlavor],
) -> Result<Vec<Vec<&'a ProductFlavor>>> {
    let mut groups: Vec<Vec<&ProductFlavor>> = vec![Vec::new(); dimensions.len()];

    for flavor in flavors {
        let index = match &flavor.dimension {
            Some(dimension) => dimensions.iter().position(|d| d == dimension).ok_or_else(|| {
                invalid(format!(
                    "Flavor '{}' uses undeclared dimension '{}'",
                    flavor.name, dimension
                ))
            })?,
            None if dimensions.len() == 1 => 0,
            None => {
                return Err(invalid(format!(
                    "Flavor '{}' must name one of the dimensions: {}",
                    flavor.name,
                    if dimensions.is_empty() {
                        "(none declared)".to_string()
                    } else {
                        dimensions.join(", ")
                    }
                )));
            }
        };
        groups[index].push(flavor);
    }

    for (dimension, group) in dimensions.iter().zip(&groups) {
        if group.is_empty() {
            tracing::warn!(dimension = %dimension, "Flavor dimension has no flavors, ignoring");
        }
    }

    Ok(groups.into_iter().filter(|g| !g.is_empty()).collect())
}

fn check_unique<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(invalid(format!("A {} has an empty name", what)));
        }
        if !seen.insert(name) {
            return Err(invalid(format!("Duplicate {} '{}'", what, name)));
        }
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorCode::ConfigValidationError, message)
}
