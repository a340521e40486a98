// Per-job subprocess environment

use std::collections::BTreeMap;
use std::fmt;

/// Variables that carry the provider token. Values are redacted in `Debug`.
pub const CREDENTIAL_VARS: [&str; 3] = [
    "DIGITALOCEAN_TOKEN",
    "DIGITALOCEAN_ACCESS_TOKEN",
    "TF_VAR_do_token",
];

/// Environment handed to the provisioning tool.
///
/// Built fresh for every job and dropped with it; the process environment is never touched.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnv {
    vars: BTreeMap<String, String>,
}

impl ExecutionEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExecutionEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for ExecutionEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in &self.vars {
            if CREDENTIAL_VARS.contains(&k.as_str()) {
                map.entry(k, &"***");
            } else {
                map.entry(k, v);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token_vars() {
        let env: ExecutionEnv = [("PATH", "/usr/bin"), ("DIGITALOCEAN_TOKEN", "dop_secret")]
            .into_iter()
            .collect();

        let rendered = format!("{:?}", env);
        assert!(rendered.contains("/usr/bin"));
        assert!(!rendered.contains("dop_secret"));
    }
}
