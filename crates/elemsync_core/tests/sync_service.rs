mod common;

use common::StubClient;
use elemsync_core::adapters::salesforce;
use elemsync_core::{
    AdapterRegistry, BoardColumnsDeployer, CancellationToken, CanonicalInstance, Change,
    DeployOutcome, ElementIndex, Normalizer, RawResponse, SyncConfig, SyncError, SyncService,
    TransportError,
};
use serde_json::json;

fn fast_config() -> SyncConfig {
    SyncConfig::from_json_str(
        r#"{"retry_budget": 2, "backoff": {"initial_delay_ms": 0, "max_delay_ms": 0}}"#,
    )
    .expect("config should parse")
}

fn jira_service(client: StubClient) -> SyncService<StubClient> {
    let definition = AdapterRegistry::builtin()
        .get("jira")
        .expect("jira adapter is built in");
    SyncService::new(client, definition, fast_config())
}

fn ops_board(service: &SyncService<StubClient>) -> CanonicalInstance {
    Normalizer::new(service.definition())
        .normalize(
            "Board",
            &json!({
                "id": 9,
                "name": "Ops",
                "type": "kanban",
                "columnConfig": {"columns": [{"name": "Backlog"}, {"name": "Doing"}]},
            }),
            &service.config().fetch_options(None),
        )
        .expect("board should normalize")
}

#[test]
fn fetch_instance_normalizes_one_record() {
    let service = jira_service(StubClient::always(json!({
        "id": "10001",
        "name": "In Review",
        "self": "https://example.atlassian.net/rest/api/3/status/10001",
    })));

    let status = service
        .fetch_instance("Status", "/rest/api/3/status/10001", None)
        .expect("status should fetch");
    assert_eq!(status.full_name(), "jira.Status.instance.In_Review");
    assert!(status.get("self").is_none());

    let calls = service.client().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "GET");
    assert_eq!(calls[0].path, "/rest/api/3/status/10001");
}

#[test]
fn fetch_collection_normalizes_every_value() {
    let service = jira_service(StubClient::always(json!({
        "maxResults": 50,
        "values": [
            {"id": 1, "name": "Kanban", "type": "kanban",
             "config": {"columnConfig": {"columns": [{"name": "Backlog"}, {"name": "Doing"}]}}},
            {"id": 2, "name": "Scrum", "type": "scrum",
             "config": {"columnConfig": {"columns": [{"name": "To Do"}]}}},
        ],
    })));

    let boards = service
        .fetch_collection("Board", "/rest/agile/1.0/board", None)
        .expect("boards should fetch");
    assert_eq!(boards.len(), 2);
    assert_eq!(
        boards[0].value["columnConfig"]["columns"],
        json!([{"name": "Doing"}])
    );
    assert_eq!(
        boards[1].value["columnConfig"]["columns"],
        json!([{"name": "To Do"}])
    );
}

#[test]
fn fetch_collection_rejects_missing_values_key() {
    let body = json!({"items": []});
    let service = jira_service(StubClient::always(body.clone()));

    let err = service
        .fetch_collection("Board", "/rest/agile/1.0/board", None)
        .expect_err("guard must reject");
    match err {
        SyncError::InvalidRemoteResponse { message, payload } => {
            assert!(message.contains("values"));
            assert_eq!(payload, body);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn fetch_surfaces_transport_errors() {
    let service = jira_service(StubClient::always_result(Err(TransportError::Auth(
        "token expired".to_string(),
    ))));
    let err = service
        .fetch_instance("Status", "/rest/api/3/status/1", None)
        .expect_err("transport failure");
    assert_eq!(
        err,
        SyncError::Transport(TransportError::Auth("token expired".to_string()))
    );

    let service = jira_service(StubClient::always_result(Ok(RawResponse {
        status: 404,
        body: json!({"errorMessages": ["not found"]}),
    })));
    let err = service
        .fetch_instance("Status", "/rest/api/3/status/1", None)
        .expect_err("404 is a transport failure");
    assert!(matches!(
        err,
        SyncError::Transport(TransportError::Status { status: 404, .. })
    ));
}

#[test]
fn fetch_applies_namespace_prefix_from_config() {
    let definition = AdapterRegistry::builtin()
        .get(salesforce::SALESFORCE)
        .expect("salesforce adapter is built in");
    let config = SyncConfig::from_json_str(r#"{"fetch": {"add_namespace_prefix": true}}"#)
        .expect("config should parse");
    let service = SyncService::new(
        StubClient::always(json!({"fullName": "QuoteAdmin"})),
        definition,
        config,
    );

    let permission_set = service
        .fetch_instance("PermissionSet", "/metadata/PermissionSet/QuoteAdmin", Some("SBQQ"))
        .expect("permission set should fetch");
    assert_eq!(permission_set.get_str("fullName"), Some("SBQQ__QuoteAdmin"));
}

#[test]
fn deploy_change_uses_configured_retry_budget() {
    let service = jira_service(StubClient::always(json!({
        "mappedColumns": [{"name": "Backlog"}, {"name": "Wrong"}],
    })));
    let board = ops_board(&service);

    let err = service
        .deploy_change(
            &Change::addition(board),
            &BoardColumnsDeployer::new(),
            &ElementIndex::new(),
            &CancellationToken::new(),
        )
        .expect_err("remote never converges");
    assert!(matches!(err, SyncError::DeployFailed { attempts: 3, .. }));
    assert_eq!(service.client().writes().len(), 3);
}

#[test]
fn deploy_change_converges_through_service() {
    let service = jira_service(StubClient::always(json!({
        "mappedColumns": [{"name": "Backlog"}, {"name": "Doing"}],
    })));
    let board = ops_board(&service);

    let outcome = service
        .deploy_change(
            &Change::addition(board),
            &BoardColumnsDeployer::new(),
            &ElementIndex::new(),
            &CancellationToken::new(),
        )
        .expect("deploy should converge");
    assert_eq!(outcome, DeployOutcome::Converged { attempts: 1 });
}
