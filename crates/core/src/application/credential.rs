// Credential Injector
// Derives the per-job tool environment from the process environment

use crate::domain::{Credential, ExecutionEnv, CREDENTIAL_VARS};
use std::collections::HashMap;

/// Variables that keep the tool from ever prompting
const AUTOMATION_VARS: [(&str, &str); 2] = [("TF_IN_AUTOMATION", "1"), ("TF_INPUT", "0")];

/// Snapshot of the process environment, optionally restricted to an allowlist.
///
/// Taken once at startup; jobs derive from this snapshot, never from the live
/// process environment.
pub fn capture_base_env(allowlist: Option<&[String]>) -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| allowlist.map_or(true, |allowed| allowed.contains(k)))
        .filter(|(k, _)| !CREDENTIAL_VARS.contains(&k.as_str()))
        .collect()
}

/// Copy `base_env` and add the credential under every name the tool recognizes
pub fn build_env(base_env: &HashMap<String, String>, credential: &Credential) -> ExecutionEnv {
    let mut env: ExecutionEnv = base_env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    for (key, value) in AUTOMATION_VARS {
        env.set(key, value);
    }
    for key in CREDENTIAL_VARS {
        env.set(key, credential.expose());
    }
    env
}
