//! YAML parser for catalogs
//!
//! Parses and validates catalog YAML files.
//! Supports both built-in catalogs (by name) and custom YAML files (by path).

use super::builtin;
use super::types::{CatalogDefinition, SourceDefinition};
use crate::error::{Error, Result};
use crate::pagination::PaginationConfig;
use crate::template;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load a catalog definition from a name or file path
///
/// A bare name (no path separators, no `.yaml` extension) is looked up among
/// the built-in catalogs first.
///
/// # Examples
///
/// ```ignore
/// let graph = load_catalog("graph")?;
/// let custom = load_catalog("./my-sources.yaml")?;
/// ```
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CatalogDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = builtin::get_builtin(&path_str) {
            return parse_catalog(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!(
                "Catalog '{}' not found. Built-in catalogs: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin::list_builtin().join(", ")
            ))
        } else {
            Error::config(format!(
                "Failed to read catalog file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    parse_catalog(&content)
}

/// Parse and validate a catalog from a YAML string
pub fn parse_catalog(yaml: &str) -> Result<CatalogDefinition> {
    let def: CatalogDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse catalog YAML: {e}")))?;

    validate_catalog(&def)?;
    Ok(def)
}

/// Validate a catalog definition
pub fn validate_catalog(def: &CatalogDefinition) -> Result<()> {
    if def.name.is_empty() {
        return Err(Error::config("Catalog name cannot be empty"));
    }

    if def.base_url.is_empty() {
        return Err(Error::config("Catalog base_url cannot be empty"));
    }
    url::Url::parse(&def.base_url)
        .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

    if def.sources.is_empty() {
        return Err(Error::config("Catalog must have at least one source"));
    }

    let names: HashSet<_> = def.sources.iter().map(|s| s.name.as_str()).collect();
    if names.len() != def.sources.len() {
        return Err(Error::config("Duplicate source names found"));
    }

    for value in def.params.values().chain(def.headers.values()) {
        template::validate(value)?;
    }

    for source in &def.sources {
        validate_source(source, &names)?;
    }

    Ok(())
}

/// Validate a source definition
fn validate_source(source: &SourceDefinition, names: &HashSet<&str>) -> Result<()> {
    if source.name.is_empty() {
        return Err(Error::config("Source name cannot be empty"));
    }

    if source.path.is_empty() {
        return Err(Error::config(format!(
            "Source '{}' path cannot be empty",
            source.name
        )));
    }

    template::validate(&source.path)?;
    for value in source.params.values() {
        template::validate(value)?;
    }

    if let Some(tree) = &source.tree {
        if source.pagination != PaginationConfig::None {
            return Err(Error::config(format!(
                "Source '{}' is a tree and cannot be paginated",
                source.name
            )));
        }
        if tree.chunk_size == 0 {
            return Err(Error::invalid_value(
                format!("{}.tree.chunk_size", source.name),
                "must be at least 1",
            ));
        }
    }

    if let Some(page_size) = &source.page_size {
        if page_size.param.is_empty() {
            return Err(Error::invalid_value(
                format!("{}.page_size.param", source.name),
                "cannot be empty",
            ));
        }
    }

    let mut child_names = HashSet::new();
    for child in &source.children {
        if !child_names.insert(child.name.as_str()) {
            return Err(Error::config(format!(
                "Source '{}' has duplicate child '{}'",
                source.name, child.name
            )));
        }
        if !names.contains(child.source.as_str()) {
            return Err(Error::config(format!(
                "Child '{}' of source '{}' refers to unknown source '{}'",
                child.name, source.name, child.source
            )));
        }
        if child.key.is_empty() {
            return Err(Error::invalid_value(
                format!("{}.children.{}.key", source.name, child.name),
                "cannot be empty",
            ));
        }
    }

    Ok(())
}
