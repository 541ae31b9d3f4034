//! Environment variable snapshot
//!
//! Configuration is resolved against an explicit snapshot instead of the
//! live process environment, so resolution is a pure function of its inputs.

use std::collections::HashMap;

/// An immutable set of environment variables
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build an environment from explicit pairs (useful for testing)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable; unset and empty are both reported as `""`
    pub fn get(&self, key: &str) -> &str {
        self.vars.get(key).map(String::as_str).unwrap_or("")
    }

    /// Set or replace a variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_is_empty() {
        let env = Environment::from_pairs([("AWS_REGION", "eu-west-1")]);
        assert_eq!(env.get("AWS_REGION"), "eu-west-1");
        assert_eq!(env.get("KMS_REGION"), "");
    }

    #[test]
    fn test_set_overrides() {
        let mut env = Environment::default();
        env.set("BACKUP_PREFIX", "a");
        env.set("BACKUP_PREFIX", "b");
        assert_eq!(env.get("BACKUP_PREFIX"), "b");
    }
}
