//! HTTP response assertions.
//!
//! Provides assertion utilities for testing HTTP responses.

use axum_test::TestResponse;
use serde_json::Value;

/// Asserts that the response has the expected status code.
pub fn assert_status(response: &TestResponse, expected: u16) {
    let actual = response.status_code().as_u16();
    assert_eq!(
        actual, expected,
        "Expected status {}, got {}",
        expected, actual
    );
}

/// Asserts that the response carries a header with the expected value.
pub fn assert_header(response: &TestResponse, name: &str, expected: &str) {
    let actual = response
        .maybe_header(name)
        .and_then(|v| v.to_str().ok().map(str::to_string));
    assert_eq!(
        actual.as_deref(),
        Some(expected),
        "Expected header {}: {}",
        name,
        expected
    );
}

/// Asserts that the response does not carry a header.
pub fn assert_no_header(response: &TestResponse, name: &str) {
    assert!(
        response.maybe_header(name).is_none(),
        "Unexpected header {}",
        name
    );
}

/// Asserts a problem body with the expected entity and error key, and the
/// matching failure alert headers.
pub fn assert_problem(response: &TestResponse, entity: &str, error_key: &str) {
    assert_status(response, 400);
    assert_header(response, "content-type", "application/problem+json");

    let body: Value = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["entityName"], entity, "entityName in {}", body);
    assert_eq!(body["errorKey"], error_key, "errorKey in {}", body);
    assert_eq!(body["message"], format!("error.{}", error_key));

    assert_header(response, "x-platesapp-error", &format!("error.{}", error_key));
    assert_header(response, "x-platesapp-params", entity);
}

/// Returns the value of the `X-Total-Count` header.
pub fn total_count(response: &TestResponse) -> u64 {
    response
        .header("x-total-count")
        .to_str()
        .ok()
        .and_then(|v| v.parse().ok())
        .expect("X-Total-Count header")
}

/// Returns the response body as an array.
pub fn body_array(response: &TestResponse) -> Vec<Value> {
    match response.json::<Value>() {
        Value::Array(items) => items,
        other => panic!("Expected a JSON array, got {}", other),
    }
}

/// Returns the `id` of a JSON entity.
pub fn id_of(body: &Value) -> i64 {
    body["id"].as_i64().expect("entity has an id")
}
