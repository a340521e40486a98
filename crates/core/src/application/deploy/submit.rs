// Submit Use Case - request validation

use crate::domain::{Credential, IacSource};
use crate::error::{AppError, Result};

pub const MISSING_CODE: &str = "Terraform code is required";
pub const MISSING_CREDENTIAL: &str = "DigitalOcean token is required";

/// Deploy request as received from the outside
/// Not `Debug`: it holds the raw token.
#[derive(Clone, Default)]
pub struct DeployRequest {
    pub iac_source: Option<String>,
    /// Caller-supplied token; falls back to the configured default when blank
    pub credential: Option<String>,
}

impl DeployRequest {
    pub fn new(iac_source: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            iac_source: Some(iac_source.into()),
            credential,
        }
    }
}

/// Check a request before anything is created
///
/// # Errors
/// - AppError::Validation if the source is blank
/// - AppError::Validation if neither the request nor `default_credential` carries a token
pub fn validate_request(
    req: DeployRequest,
    default_credential: Option<&Credential>,
) -> Result<(IacSource, Credential)> {
    let source = req
        .iac_source
        .and_then(IacSource::parse)
        .ok_or_else(|| AppError::Validation(MISSING_CODE.to_string()))?;

    let credential = req
        .credential
        .and_then(Credential::parse)
        .or_else(|| default_credential.cloned())
        .ok_or_else(|| AppError::Validation(MISSING_CREDENTIAL.to_string()))?;

    Ok((source, credential))
}

#[cfg(test)]
#[path = "submit_test.rs"]
mod submit_test;
