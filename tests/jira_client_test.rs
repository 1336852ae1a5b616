mod common;

use ci_dispatch::jira::auth::JiraCredentials;
use ci_dispatch::jira::types::DEFAULT_ISSUE_FIELDS;
use ci_dispatch::jira::{IssueTracker, JiraClient, TrackerError};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> JiraClient {
    common::install_crypto_provider();
    JiraClient::new(
        &server.uri(),
        JiraCredentials {
            username: "ci@example.com".into(),
            token: "secret".into(),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn fetch_issue_maps_the_rest_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/A-2"))
        .and(query_param("fields", DEFAULT_ISSUE_FIELDS))
        .and(basic_auth("ci@example.com", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10002",
            "key": "A-2",
            "fields": {
                "summary": "Přidat export",
                "issuetype": { "name": "Podúkol", "subtask": true },
                "status": { "name": "Otevřeno", "statusCategory": { "key": "new" } },
                "labels": ["backend"],
                "components": [{ "name": "api" }],
                "parent": { "key": "A-1" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issue = client(&server)
        .fetch_issue("A-2", DEFAULT_ISSUE_FIELDS)
        .await
        .unwrap();

    assert_eq!(issue.key, "A-2");
    assert_eq!(issue.summary, "Přidat export");
    assert!(issue.is_subtask());
    assert_eq!(issue.subtask_parent(), Some("A-1"));
    assert_eq!(issue.status.category, "new");
    assert_eq!(issue.components, vec!["api"]);
}

#[tokio::test]
async fn missing_issue_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/A-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["Issue does not exist or you do not have permission to see it."]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_issue("A-404", DEFAULT_ISSUE_FIELDS)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn server_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/A-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_issue("A-1", DEFAULT_ISSUE_FIELDS)
        .await
        .unwrap_err();
    match err {
        TrackerError::Remote { status, body, .. } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn transitions_are_listed_and_applied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/A-1/transitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transitions": [
                { "id": "5", "name": "Čekání", "to": { "name": "Čekání" } },
                { "id": "9", "name": "Hotovo" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/A-1/transitions"))
        .and(body_json(json!({ "transition": { "id": "9" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let jira = client(&server);
    let transitions = jira.list_transitions("A-1").await.unwrap();
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[1].name, "Hotovo");

    jira.apply_transition("A-1", "9").await.unwrap();
}

#[tokio::test]
async fn rejected_transition_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/A-1/transitions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Transition id '9' is not valid"))
        .mount(&server)
        .await;

    let err = client(&server)
        .apply_transition("A-1", "9")
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::TransitionApply { .. }), "{err}");
}

#[tokio::test]
async fn comments_and_field_edits_use_their_envelopes() {
    let server = MockServer::start().await;
    let doc = json!({ "type": "doc", "version": 1, "content": [] });
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/A-1/comment"))
        .and(body_json(json!({ "body": doc })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "100" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/A-1"))
        .and(body_json(json!({ "fields": { "fixVersions": [{ "name": "1.0.0" }] } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/A-1"))
        .and(body_json(json!({ "update": { "labels": [{ "add": "qa" }] } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let jira = client(&server);
    jira.add_comment("A-1", &doc).await.unwrap();
    jira.update_fields("A-1", &json!({ "fixVersions": [{ "name": "1.0.0" }] }))
        .await
        .unwrap();
    jira.patch_fields("A-1", &json!({ "labels": [{ "add": "qa" }] }))
        .await
        .unwrap();
}

#[tokio::test]
async fn issue_keys_are_encoded_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/A-1%2F..%2Fadmin%23x"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/A%201/transitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "transitions": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let jira = client(&server);
    let err = jira
        .fetch_issue("A-1/../admin#x", DEFAULT_ISSUE_FIELDS)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(jira.list_transitions("A 1").await.unwrap().is_empty());
}

#[test]
fn base_url_must_be_absolute() {
    common::install_crypto_provider();
    let err = JiraClient::new(
        "not a url",
        JiraCredentials {
            username: "ci@example.com".into(),
            token: "secret".into(),
        },
    )
    .err()
    .unwrap();
    assert!(matches!(err, TrackerError::Validation(_)), "{err}");
}
