//! Option maps passed to the command launcher

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigResult;
use crate::validation::Value;

/// Options understood by [`Context::run`](crate::runner::Context::run) and the launcher.
///
/// Two keys are consumed by the context itself: `allow_overrides` and `workdir`.
/// Everything else is forwarded to the launcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Merge `other` on top of these options.
    pub fn extend(&mut self, other: &Options) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// A copy of these options with `other` merged on top.
    pub fn merged(&self, other: &Options) -> Options {
        let mut merged = self.clone();
        merged.extend(other);
        merged
    }

    /// Truthiness of an option, `default` when absent.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).map_or(default, Value::is_truthy)
    }

    /// Text form of an option, `None` when absent or empty.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::None => None,
            value => Some(value.to_string()).filter(|s| !s.is_empty()),
        }
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get_str(key).map(PathBuf::from)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert a YAML mapping of options.
    pub fn from_yaml(mapping: &serde_yaml::Mapping) -> ConfigResult<Self> {
        let mut options = Options::new();
        for (key, value) in mapping {
            let key = match key {
                serde_yaml::Value::String(s) => s.clone(),
                other => Value::from_yaml(other)?.to_string(),
            };
            options.insert(key, Value::from_yaml(value)?);
        }
        Ok(options)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_prefers_other() {
        let base = Options::new().with("capture", "both").with("quiet", false);
        let top = Options::new().with("quiet", true);

        let merged = base.merged(&top);
        assert_eq!(merged.get("capture"), Some(&Value::from("both")));
        assert_eq!(merged.get("quiet"), Some(&Value::Bool(true)));
        assert_eq!(base.get("quiet"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_get_bool_and_str() {
        let options = Options::new()
            .with("nofail", true)
            .with("title", "")
            .with("workdir", "sub");

        assert!(options.get_bool("nofail", false));
        assert!(options.get_bool("missing", true));
        assert_eq!(options.get_str("title"), None);
        assert_eq!(options.get_path("workdir"), Some(PathBuf::from("sub")));
    }

    #[test]
    fn test_from_yaml() {
        let yaml: serde_yaml::Mapping = serde_yaml::from_str("{capture: stdout, nofail: true}").unwrap();
        let options = Options::from_yaml(&yaml).unwrap();
        assert_eq!(options.get("capture"), Some(&Value::from("stdout")));
        assert_eq!(options.get("nofail"), Some(&Value::Bool(true)));
    }
}
