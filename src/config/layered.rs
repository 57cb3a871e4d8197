//! Three-tier configuration: overrides > defaults > fallbacks.
//!
//! Each registry is an independent JSON tree addressed by dotted keys.
//! `get` returns the value from the highest-priority registry in which the
//! key is present (an explicit `null` counts as present). `merged` overlays
//! the registries with collection-replace semantics.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::defaults::BuiltinFallbacks;
use super::file::{read_document, write_document};
use super::merge::{deep_merge, merge_layers};
use super::{dotpath, ConfigError};

/// One priority tier of the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    Fallbacks,
    Defaults,
    Overrides,
}

impl Registry {
    /// Lookup order, highest priority first
    pub const PRIORITY: [Registry; 3] = [Self::Overrides, Self::Defaults, Self::Fallbacks];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fallbacks => "fallbacks",
            Self::Defaults => "defaults",
            Self::Overrides => "overrides",
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Registry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fallbacks" => Ok(Self::Fallbacks),
            "defaults" => Ok(Self::Defaults),
            "overrides" => Ok(Self::Overrides),
            other => Err(format!("unknown registry: {}", other)),
        }
    }
}

/// Target of `delete` and `save`: one registry, or the merged view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Registry(Registry),
    /// All three registries at once (`delete`) or the merged view (`save`)
    Config,
}

impl From<Registry> for Scope {
    fn from(registry: Registry) -> Self {
        Self::Registry(registry)
    }
}

/// Primitive kinds checked by the typed accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    String,
    Integer,
    Array,
}

impl ValueKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::String => value.is_string(),
            Self::Integer => value.is_i64(),
            Self::Array => value.is_array(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Array => "array",
        }
    }
}

/// Name of the JSON kind of `value`, for error messages
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(key: &str, expected: &'static str, value: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: kind_of(value),
    }
}

/// A file location a registry is saved back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub path: PathBuf,
    pub key: Option<String>,
}

/// Layered key/value configuration
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    fallbacks: Value,
    defaults: Value,
    overrides: Value,
    bindings: BTreeMap<Registry, Binding>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_fallbacks(BuiltinFallbacks::default().to_value())
    }
}

impl LayeredConfig {
    /// Empty configuration with the given fallback tree
    pub fn with_fallbacks(fallbacks: Value) -> Self {
        Self {
            fallbacks,
            defaults: json!({}),
            overrides: json!({}),
            bindings: BTreeMap::new(),
        }
    }

    /// Configuration with nothing in any registry
    pub fn empty() -> Self {
        Self::with_fallbacks(json!({}))
    }

    pub fn registry(&self, registry: Registry) -> &Value {
        match registry {
            Registry::Fallbacks => &self.fallbacks,
            Registry::Defaults => &self.defaults,
            Registry::Overrides => &self.overrides,
        }
    }

    fn registry_mut(&mut self, registry: Registry) -> &mut Value {
        match registry {
            Registry::Fallbacks => &mut self.fallbacks,
            Registry::Defaults => &mut self.defaults,
            Registry::Overrides => &mut self.overrides,
        }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        Registry::PRIORITY
            .iter()
            .find_map(|r| dotpath::get(self.registry(*r), key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Value from the highest-priority registry holding `key`
    pub fn get(&self, key: &str) -> Result<&Value, ConfigError> {
        self.lookup(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Like [`get`](Self::get), but a missing key yields `fallback`
    pub fn get_or(&self, key: &str, fallback: Value) -> Value {
        self.lookup(key).cloned().unwrap_or(fallback)
    }

    /// Like [`get`](Self::get), checking the value's kind
    pub fn get_typed(&self, key: &str, kind: ValueKind) -> Result<&Value, ConfigError> {
        let value = self.get(key)?;
        if kind.matches(value) {
            Ok(value)
        } else {
            Err(mismatch(key, kind.name(), value))
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.get(key)?;
        value.as_bool().ok_or_else(|| mismatch(key, "boolean", value))
    }

    pub fn get_bool_or(&self, key: &str, fallback: bool) -> Result<bool, ConfigError> {
        match self.lookup(key) {
            Some(_) => self.get_bool(key),
            None => Ok(fallback),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        let value = self.get(key)?;
        value.as_str().ok_or_else(|| mismatch(key, "string", value))
    }

    pub fn get_str_or<'a>(&'a self, key: &str, fallback: &'a str) -> Result<&'a str, ConfigError> {
        match self.lookup(key) {
            Some(_) => self.get_str(key),
            None => Ok(fallback),
        }
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ConfigError> {
        let value = self.get(key)?;
        value.as_i64().ok_or_else(|| mismatch(key, "integer", value))
    }

    pub fn get_i64_or(&self, key: &str, fallback: i64) -> Result<i64, ConfigError> {
        match self.lookup(key) {
            Some(_) => self.get_i64(key),
            None => Ok(fallback),
        }
    }

    pub fn get_array(&self, key: &str) -> Result<&Vec<Value>, ConfigError> {
        let value = self.get(key)?;
        value.as_array().ok_or_else(|| mismatch(key, "array", value))
    }

    /// Array of strings at `key`
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        let value = self.get(key)?;
        let items = value
            .as_array()
            .ok_or_else(|| mismatch(key, "array of strings", value))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(String::from)
                    .ok_or_else(|| mismatch(key, "array of strings", item))
            })
            .collect()
    }

    pub fn get_string_list_or(
        &self,
        key: &str,
        fallback: &[&str],
    ) -> Result<Vec<String>, ConfigError> {
        match self.lookup(key) {
            Some(_) => self.get_string_list(key),
            None => Ok(fallback.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Write `value` at `key` in one registry, creating intermediate objects
    pub fn set(&mut self, key: &str, value: Value, registry: Registry) -> Result<(), ConfigError> {
        dotpath::set(self.registry_mut(registry), key, value)
    }

    /// Remove `key` from one registry, or from all three with [`Scope::Config`].
    /// Returns whether anything was removed.
    pub fn delete(&mut self, key: &str, scope: Scope) -> bool {
        match scope {
            Scope::Registry(registry) => dotpath::remove(self.registry_mut(registry), key).is_some(),
            Scope::Config => Registry::PRIORITY
                .iter()
                .fold(false, |removed, r| {
                    dotpath::remove(self.registry_mut(*r), key).is_some() || removed
                }),
        }
    }

    /// Effective configuration: fallbacks, then defaults, then overrides
    pub fn merged(&self) -> Value {
        merge_layers(vec![
            self.fallbacks.clone(),
            self.defaults.clone(),
            self.overrides.clone(),
        ])
    }

    /// Read `path` (optionally the object at `key` inside it) and store it as
    /// `registry`, replacing whatever the registry held.
    pub fn load(&mut self, path: &Path, key: Option<&str>, registry: Registry) -> Result<(), ConfigError> {
        let document = read_document(path)?;
        let payload = match key {
            Some(key) => dotpath::get(&document, key)
                .cloned()
                .ok_or_else(|| ConfigError::KeyNotFound {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                })?,
            None => document,
        };

        if !payload.is_object() {
            return Err(ConfigError::Parse {
                path: path.to_path_buf(),
                message: format!("expected an object, found {}", kind_of(&payload)),
            });
        }

        tracing::debug!(path = %path.display(), %registry, "loaded configuration");
        *self.registry_mut(registry) = payload;
        Ok(())
    }

    /// Write one registry (or the merged view) to `path`.
    ///
    /// With `key`, the payload replaces only the subtree at `key` and the
    /// rest of an existing document is kept. With `merge`, the payload is
    /// overlaid onto what is already there instead of replacing it.
    pub fn save(
        &self,
        scope: Scope,
        path: &Path,
        key: Option<&str>,
        merge: bool,
    ) -> Result<(), ConfigError> {
        let payload = match scope {
            Scope::Registry(registry) => self.registry(registry).clone(),
            Scope::Config => self.merged(),
        };

        let document = match key {
            None if merge => deep_merge(existing_document(path)?, payload),
            None => payload,
            Some(key) => {
                let mut document = existing_document(path)?;
                let subtree = if merge {
                    let current = dotpath::get(&document, key).cloned().unwrap_or(Value::Null);
                    deep_merge(current, payload)
                } else {
                    payload
                };
                dotpath::set(&mut document, key, subtree)?;
                document
            }
        };

        write_document(path, &document)?;
        tracing::debug!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Remember where `registry` is saved back to
    pub fn bind(&mut self, registry: Registry, path: impl Into<PathBuf>, key: Option<&str>) {
        self.bindings.insert(
            registry,
            Binding {
                path: path.into(),
                key: key.map(String::from),
            },
        );
    }

    pub fn binding(&self, registry: Registry) -> Option<&Binding> {
        self.bindings.get(&registry)
    }

    /// Save `registry` to its bound location
    pub fn save_bound(&self, registry: Registry, merge: bool) -> Result<(), ConfigError> {
        let binding = self
            .binding(registry)
            .ok_or(ConfigError::Unbound(registry))?;
        self.save(
            Scope::Registry(registry),
            &binding.path,
            binding.key.as_deref(),
            merge,
        )
    }
}

fn existing_document(path: &Path) -> Result<Value, ConfigError> {
    if path.exists() {
        read_document(path)
    } else {
        Ok(json!({}))
    }
}
