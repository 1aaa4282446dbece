//! Values handling for nothelm.
//! Loads YAML values files, optionally resolving environment variables inside
//! them, and merges ordered sequences of value mappings.

use crate::constants::{ENV_NAMESPACE, TEMPLATE_SUFFIXES};
use crate::env::EnvSnapshot;
use crate::error::{Error, Result};
use crate::renderer::{MiniJinjaRenderer, TemplateRenderer};
use indexmap::IndexMap;
use log::debug;
use regex::{Captures, Regex};
use serde_json::Value;
use std::path::Path;

/// String keys mapped to arbitrary nested values, in document order.
pub type ValueMap = IndexMap<String, Value>;

/// Returns true when a values file should be loaded with environment interpolation.
pub fn is_interpolated_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| TEMPLATE_SUFFIXES.iter().any(|suffix| n.ends_with(suffix)))
}

/// Loads a values file.
///
/// An empty or `null` document loads as an empty mapping. Files whose name ends
/// with a template suffix have every string value interpolated from `env`.
///
/// # Errors
/// * `Error::IoError` if the file cannot be read
/// * `Error::YamlError` if the document is not valid YAML
/// * `Error::ShapeError` if the document is not a mapping at top level
/// * `Error::ValuesKeyError` if a nested mapping uses a sequence or mapping as key
pub fn load_values<P: AsRef<Path>>(path: P, env: &EnvSnapshot) -> Result<ValueMap> {
    let path = path.as_ref();
    debug!("Loading values from {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let values = parse_values(&content, &path.display().to_string())?;

    if is_interpolated_path(path) {
        debug!("Interpolating environment variables in {}", path.display());
        let renderer = MiniJinjaRenderer::new();
        return Interpolator::new(&renderer, env)?.interpolate_map(&values);
    }

    Ok(values)
}

/// Parses YAML content into a [`ValueMap`]. `origin` names the document in errors.
pub fn parse_values(content: &str, origin: &str) -> Result<ValueMap> {
    if content.trim().is_empty() {
        return Ok(ValueMap::new());
    }

    let document: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|source| Error::YamlError { path: origin.to_string(), source })?;

    if !document.is_mapping() {
        return match document {
            serde_yaml::Value::Null => Ok(ValueMap::new()),
            _ => Err(Error::ShapeError { path: origin.to_string() }),
        };
    }

    // Scalar keys (numbers, booleans) become their string form.
    match serde_json::to_value(&document) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(_) => Err(Error::ShapeError { path: origin.to_string() }),
        Err(source) => Err(Error::ValuesKeyError { path: origin.to_string(), source }),
    }
}

/// Merges value mappings left to right. Later mappings replace earlier values
/// for the same key; nested mappings are not combined.
pub fn merge<'a, I>(mappings: I) -> ValueMap
where
    I: IntoIterator<Item = &'a ValueMap>,
{
    mappings.into_iter().fold(ValueMap::new(), |mut merged, values| {
        merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    })
}

/// Resolves environment references inside values.
///
/// Strings containing `{{` are rendered as templates with the environment
/// available as `nothelm.env.NAME`. Every other string gets `$NAME` and
/// `${NAME}` expansion; references to unset variables are left untouched.
pub struct Interpolator<'a> {
    renderer: &'a dyn TemplateRenderer,
    env: &'a EnvSnapshot,
    context: Value,
    pattern: Regex,
}

impl<'a> Interpolator<'a> {
    pub fn new(renderer: &'a dyn TemplateRenderer, env: &'a EnvSnapshot) -> Result<Self> {
        let context = serde_json::json!({ ENV_NAMESPACE: { "env": env } });
        let pattern = Regex::new(r"\$(\w+|\{([^}]*)\})")?;
        Ok(Self { renderer, env, context, pattern })
    }

    pub fn interpolate_map(&self, values: &ValueMap) -> Result<ValueMap> {
        values
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.interpolate(v)?)))
            .collect()
    }

    /// Processes a value recursively. Mappings and sequences keep their shape,
    /// strings are interpolated, everything else is returned as-is.
    pub fn interpolate(&self, value: &Value) -> Result<Value> {
        match value {
            Value::String(s) => Ok(Value::String(self.interpolate_str(s)?)),
            Value::Array(items) => items
                .iter()
                .map(|item| self.interpolate(item))
                .collect::<Result<_>>()
                .map(Value::Array),
            Value::Object(obj) => obj
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.interpolate(v)?)))
                .collect::<Result<_>>()
                .map(Value::Object),
            _ => Ok(value.clone()),
        }
    }

    pub fn interpolate_str(&self, s: &str) -> Result<String> {
        if s.contains("{{") {
            return self.renderer.render(s, &self.context);
        }
        Ok(self.expand_vars(s))
    }

    fn expand_vars(&self, s: &str) -> String {
        if !s.contains('$') {
            return s.to_string();
        }
        self.pattern
            .replace_all(s, |caps: &Captures| {
                let name = caps.get(2).or_else(|| caps.get(1)).map_or("", |m| m.as_str());
                match self.env.get(name) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
