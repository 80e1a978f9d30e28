// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::IntoResponse;
use gemextract::error::ExtractError;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        ExtractError::NotFound("cache_abc".to_string()),
        ExtractError::InvalidRequest("Bad request".to_string()),
        ExtractError::InvalidPricing("negative price".to_string()),
        ExtractError::Config("bad config".to_string()),
        ExtractError::Extraction("upstream failed".to_string()),
        ExtractError::Internal("oops".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_not_found_error() {
    let error = ExtractError::NotFound("cache_abc".to_string());
    assert!(format!("{}", error).contains("cache_abc"));
    assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(error.error_type(), "not_found_error");
}

#[test]
fn test_invalid_pricing_is_client_error() {
    let error = ExtractError::InvalidPricing("price for 'default' must be non-negative".to_string());
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type(), "invalid_request_error");
}

#[test]
fn test_extraction_error_maps_to_bad_gateway() {
    let error = ExtractError::Extraction("Connection refused".to_string());
    assert!(format!("{}", error).contains("Connection refused"));
    assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn test_json_error_conversion() {
    let parse_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error: ExtractError = parse_error.into();
    assert!(matches!(error, ExtractError::Json(_)));
    assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn test_config_error() {
    let error = ExtractError::Config("cache.default_ttl_hours must be non-negative".to_string());
    assert!(format!("{}", error).contains("default_ttl_hours"));
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}
