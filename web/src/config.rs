use crate::error::{Error, Result};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// Application configuration: a shared, mutable map of JSON values.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct Config {
  values: Arc<RwLock<Map<String, Value>>>,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_yaml_str(source: &str) -> Result<Self> {
    let values: Map<String, Value> =
      serde_yaml::from_str(source).map_err(|e| Error::ConfigParse(e.to_string()))?;
    Ok(Self::from_map(values))
  }

  pub fn from_json_str(source: &str) -> Result<Self> {
    let values: Map<String, Value> =
      serde_json::from_str(source).map_err(|e| Error::ConfigParse(e.to_string()))?;
    Ok(Self::from_map(values))
  }

  /// Loads a YAML file.
  pub fn from_yaml_file(path: &Path) -> Result<Self> {
    let reader = io::BufReader::new(File::open(path)?);
    let values: Map<String, Value> =
      serde_yaml::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))?;
    tracing::debug!(path = %path.display(), keys = values.len(), "loaded configuration");
    Ok(Self::from_map(values))
  }

  /// Finds `<base_name>.<env>.yaml` or `<base_name>.yaml` in `dir`.
  ///
  /// The environment comes from `environment`, then `APP_ENV`.
  pub fn find_file(dir: &Path, base_name: &str, environment: Option<&str>) -> Result<PathBuf> {
    let environment = environment
      .map(str::to_string)
      .or_else(|| env::var("APP_ENV").ok())
      .filter(|e| !e.is_empty());

    let mut candidates = Vec::new();
    if let Some(environment) = &environment {
      candidates.push(format!(
        "{}.{}.{}",
        base_name, environment, DEFAULT_CONFIG_EXTENSION
      ));
    }
    candidates.push(format!("{}.{}", base_name, DEFAULT_CONFIG_EXTENSION));

    candidates
      .iter()
      .map(|name| dir.join(name))
      .find(|path| path.is_file())
      .ok_or_else(|| {
        Error::ConfigNotFound(format!("searched for {:?} in {:?}", candidates, dir))
      })
  }

  fn from_map(values: Map<String, Value>) -> Self {
    Self {
      values: Arc::new(RwLock::new(values)),
    }
  }

  /// Reads `key` as `T`. A missing key is `Ok(None)`.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let Some(value) = self.values.read().get(key).cloned() else {
      return Ok(None);
    };
    serde_json::from_value(value)
      .map(Some)
      .map_err(|e| Error::ConfigValue {
        key: key.to_string(),
        reason: e.to_string(),
      })
  }

  pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
    Ok(self.get(key)?.unwrap_or(default))
  }

  pub fn insert(&self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
    let key = key.into();
    let value = serde_json::to_value(value).map_err(|e| Error::ConfigValue {
      key: key.clone(),
      reason: e.to_string(),
    })?;
    self.values.write().insert(key, value);
    Ok(())
  }

  /// Copies every entry of `other` into this configuration.
  pub fn update(&self, other: &Config) {
    if Arc::ptr_eq(&self.values, &other.values) {
      return;
    }
    let incoming = other.values.read().clone();
    self.values.write().extend(incoming);
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.read().contains_key(key)
  }

  pub fn keys(&self) -> Vec<String> {
    self.values.read().keys().cloned().collect()
  }

  /// Whether both handles share the same map.
  pub fn ptr_eq(&self, other: &Config) -> bool {
    Arc::ptr_eq(&self.values, &other.values)
  }
}
