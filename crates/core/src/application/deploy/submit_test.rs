//! Unit tests for deploy request validation

use super::*;

#[test]
fn test_validate_missing_code() {
    let req = DeployRequest {
        iac_source: None,
        credential: Some("tok".to_string()),
    };

    let result = validate_request(req, None);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains(MISSING_CODE));
}

#[test]
fn test_validate_blank_code() {
    let req = DeployRequest::new("  \n\t", Some("tok".to_string()));

    let result = validate_request(req, None);
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn test_validate_missing_credential() {
    let req = DeployRequest::new("resource \"x\" {}", None);

    let result = validate_request(req, None);
    assert!(result.unwrap_err().to_string().contains(MISSING_CREDENTIAL));
}

#[test]
fn test_validate_blank_credential_without_default() {
    let req = DeployRequest::new("resource \"x\" {}", Some("   ".to_string()));

    assert!(validate_request(req, None).is_err());
}

#[test]
fn test_validate_falls_back_to_default_credential() {
    let default = Credential::parse("from-env").unwrap();
    let req = DeployRequest::new("resource \"x\" {}", Some("".to_string()));

    let (_, credential) = tokio_test::assert_ok!(validate_request(req, Some(&default)));
    assert_eq!(credential.expose(), "from-env");
}

#[test]
fn test_validate_request_token_wins_over_default() {
    let default = Credential::parse("from-env").unwrap();
    let req = DeployRequest::new("resource \"x\" {}", Some("from-caller".to_string()));

    let (source, credential) = validate_request(req, Some(&default)).unwrap();
    assert_eq!(credential.expose(), "from-caller");
    assert_eq!(source.as_str(), "resource \"x\" {}");
}
