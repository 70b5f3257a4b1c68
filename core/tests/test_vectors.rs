//! Verify the users client against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, the request the client must send, a
//! simulated response, and the expected result or error. Comparing parsed
//! JSON (not raw strings) avoids false negatives from formatting.

use std::sync::Arc;

use okta_core::mock::MockTransport;
use okta_core::{
    Client, DataStore, Error, HttpMethod, HttpResponse, Origin, Resource, ResourceType, User,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

const BASE_URL: &str = "https://dev-123.okta.com";

fn client() -> (Arc<MockTransport>, Client) {
    let transport = Arc::new(MockTransport::new(Origin::parse(BASE_URL).unwrap()));
    let client = Client::with_data_store(DataStore::new(transport.clone()));
    (transport, client)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Queue the simulated response. A `null` response leaves the queue empty,
/// so the mock completes without an envelope.
fn simulate(transport: &MockTransport, sim: &Value) {
    if sim.is_null() {
        return;
    }
    transport.push_response(HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str(),
    ));
}

fn check_request(transport: &MockTransport, expected: &Value, name: &str) {
    let calls = transport.calls();
    assert_eq!(calls.len(), 1, "{name}: exactly one transport call");
    let call = &calls[0];
    assert_eq!(call.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(
        call.url,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: url"
    );
    match expected.get("body") {
        Some(body) => {
            let sent: Value = serde_json::from_str(call.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
        None => assert!(call.body.is_none(), "{name}: body should be None"),
    }
}

fn check_error(err: Error, expected: &Value, name: &str) {
    match expected["kind"].as_str().unwrap() {
        "Api" => {
            let api = err.api_error().unwrap_or_else(|| panic!("{name}: expected Api, got {err:?}"));
            assert_eq!(api.status_code() as u64, expected["status"].as_u64().unwrap(), "{name}: status");
            assert_eq!(api.error_code().as_deref(), expected["error_code"].as_str(), "{name}: code");
            assert_eq!(
                api.error_summary().as_deref(),
                expected["error_summary"].as_str(),
                "{name}: summary"
            );
            assert_eq!(api.to_string(), expected["error_summary"].as_str().unwrap(), "{name}: message");
        }
        "Decode" => {
            assert!(
                matches!(err, Error::Decode { status, .. } if status as u64 == expected["status"].as_u64().unwrap()),
                "{name}: expected Decode, got {err:?}"
            );
        }
        "MissingResponse" => {
            assert!(matches!(err, Error::MissingResponse { .. }), "{name}: expected MissingResponse, got {err:?}");
        }
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

fn user_from(value: &Value) -> User {
    let resource: Resource = serde_json::from_value(value.clone()).unwrap();
    User::from_resource(resource)
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_test_vectors() {
    let raw = include_str!("../../test-vectors/get.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (transport, client) = client();
        simulate(&transport, &case["simulated_response"]);

        let result = client
            .users()
            .get_user(case["input_id"].as_str().unwrap(), &CancellationToken::new())
            .await;
        check_request(&transport, &case["expected_request"], name);

        if let Some(expected_error) = case.get("expected_error") {
            check_error(result.unwrap_err(), expected_error, name);
        } else {
            let user = result.unwrap();
            assert_eq!(user.resource().to_value(), case["expected_result"], "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_test_vectors() {
    let raw = include_str!("../../test-vectors/list.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (transport, client) = client();
        simulate(&transport, &case["simulated_response"]);

        let result = client
            .users()
            .list_users(
                case["input_query"].as_str(),
                case["input_limit"].as_u64().map(|n| n as u32),
                &CancellationToken::new(),
            )
            .await;
        check_request(&transport, &case["expected_request"], name);

        if let Some(expected_error) = case.get("expected_error") {
            check_error(result.unwrap_err(), expected_error, name);
        } else {
            let users: Vec<Value> = result.unwrap().iter().map(|u| u.resource().to_value()).collect();
            assert_eq!(Value::Array(users), case["expected_result"], "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_test_vectors() {
    let raw = include_str!("../../test-vectors/create.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (transport, client) = client();
        simulate(&transport, &case["simulated_response"]);

        let input = user_from(&case["input"]);
        let result = client
            .users()
            .create_user(&input, case["input_activate"].as_bool().unwrap(), &CancellationToken::new())
            .await;
        check_request(&transport, &case["expected_request"], name);

        if let Some(expected_error) = case.get("expected_error") {
            check_error(result.unwrap_err(), expected_error, name);
        } else {
            let user = result.unwrap();
            assert_eq!(user.resource().to_value(), case["expected_result"], "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_test_vectors() {
    let raw = include_str!("../../test-vectors/update.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (transport, client) = client();
        simulate(&transport, &case["simulated_response"]);

        let input = user_from(&case["input"]);
        let result = client
            .users()
            .update_user(case["input_id"].as_str().unwrap(), &input, &CancellationToken::new())
            .await;
        check_request(&transport, &case["expected_request"], name);

        if let Some(expected_error) = case.get("expected_error") {
            check_error(result.unwrap_err(), expected_error, name);
        } else {
            let user = result.unwrap();
            assert_eq!(user.resource().to_value(), case["expected_result"], "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_test_vectors() {
    let raw = include_str!("../../test-vectors/delete.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (transport, client) = client();
        simulate(&transport, &case["simulated_response"]);

        let result = client
            .users()
            .delete_user(case["input_id"].as_str().unwrap(), &CancellationToken::new())
            .await;
        check_request(&transport, &case["expected_request"], name);

        if let Some(expected_error) = case.get("expected_error") {
            check_error(result.unwrap_err(), expected_error, name);
        } else {
            assert!(result.is_ok(), "{name}: expected success");
        }
    }
}
