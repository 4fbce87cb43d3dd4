//! Tests for engine module

use super::*;
use crate::state::State;
use crate::streams::find;
use crate::test_support::{queue_item, ScriptedClient};
use chrono::TimeZone;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn stream(name: &str) -> &'static StreamDescriptor {
    find(name).unwrap()
}

fn engine(client: ScriptedClient) -> (SyncEngine, Arc<ScriptedClient>) {
    engine_with_state(client, State::new())
}

fn engine_with_state(client: ScriptedClient, state: State) -> (SyncEngine, Arc<ScriptedClient>) {
    let client = Arc::new(client);
    let engine = SyncEngine::new(client.clone(), StateManager::with_state(state));
    (engine, client)
}

fn records(messages: &[Message], name: &str) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream, record, .. } if stream == name => Some(record.clone()),
            _ => None,
        })
        .collect()
}

fn pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_kinds() {
    let now = Utc::now();
    let msg = Message::record("users", json!({"id": 1}), now);
    assert!(msg.is_record());
    assert!(!msg.is_state());
    assert_eq!(msg.stream(), Some("users"));

    let msg = Message::state(json!({}));
    assert!(msg.is_state());
    assert_eq!(msg.stream(), None);

    let msg = Message::schema("users", json!({}), vec![], vec![]);
    assert!(msg.is_schema());
}

// ============================================================================
// SyncConfig / SyncStats Tests
// ============================================================================

#[test]
fn test_sync_config_builder() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let config = SyncConfig::new()
        .with_page_size(25)
        .with_start_date(start)
        .with_device_uuid("D1");

    assert_eq!(config.page_size, 25);
    assert_eq!(config.start_date, Some(start));
    assert_eq!(config.device_uuid.as_deref(), Some("D1"));
    assert_eq!(SyncConfig::default().page_size, 100);
}

#[test]
fn test_sync_stats() {
    let mut stats = SyncStats::new();
    stats.add_records(10);
    stats.add_skipped(2);
    stats.add_pages(3);
    stats.add_stream();
    stats.add_acks(1);
    stats.add_error();
    stats.set_duration(1500);

    assert_eq!(stats.records_synced, 10);
    assert_eq!(stats.records_skipped, 2);
    assert_eq!(stats.pages_fetched, 3);
    assert_eq!(stats.streams_synced, 1);
    assert_eq!(stats.acks_sent, 1);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.duration_ms, 1500);
}

// ============================================================================
// List Stream Tests
// ============================================================================

#[tokio::test]
async fn test_page_number_stream() {
    let client = ScriptedClient::new()
        .records("/users", vec![json!({"id": 1}), json!({"id": 2})])
        .records("/users", vec![json!({"id": 3})]);
    let (mut engine, client) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    let emitted = engine
        .sync_stream(stream("users"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(emitted, 3);
    let ids: Vec<Value> = records(&sink, "users").iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    assert!(sink.last().unwrap().is_state());

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[0].query,
        pairs(&[("page", "1"), ("per_page", "100"), ("sort_by", "id")])
    );
    assert_eq!(requests[2].query[0], ("page".to_string(), "3".to_string()));
    assert_eq!(engine.stats().pages_fetched, 3);
    assert_eq!(engine.stats().records_synced, 3);
}

#[tokio::test]
async fn test_link_stream_follows_next_page() {
    let next = "https://api.getbase.com/v2/tasks?cursor=abc";
    let client = ScriptedClient::new()
        .page(
            "/tasks",
            json!({"items": [{"data": {"id": 1}}], "meta": {"links": {"next_page": next}}}),
        )
        .page(next, json!({"items": [{"data": {"id": 2}}], "meta": {"links": {}}}));
    let (mut engine, client) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("tasks"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(records(&sink, "tasks").len(), 2);
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].query,
        pairs(&[("per_page", "100"), ("sort_by", "updated_at")])
    );
    assert_eq!(requests[1].target, next);
    assert!(requests[1].query.is_empty());
}

#[tokio::test]
async fn test_single_object_stream() {
    let client = ScriptedClient::new().page("/accounts/self", json!({"data": {"id": 9}}));
    let (mut engine, client) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("accounts"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(records(&sink, "accounts"), vec![json!({"id": 9})]);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn test_numeric_fields_coerced() {
    let client = ScriptedClient::new().records(
        "/deals",
        vec![json!({"id": 1, "value": "1500.50"}), json!({"id": 2, "value": "n/a"})],
    );
    let (mut engine, _) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("deals"), true, &[], &mut sink)
        .await
        .unwrap();

    let deals = records(&sink, "deals");
    assert_eq!(deals[0]["value"], json!(1500.5));
    assert_eq!(deals[1]["value"], Value::Null);
}

#[tokio::test]
async fn test_error_propagates() {
    let client = ScriptedClient::new().failing("/users");
    let (mut engine, _) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    let result = engine
        .sync_stream(stream("users"), true, &[], &mut sink)
        .await;

    assert!(matches!(result, Err(Error::HttpStatus { status: 500, .. })));
    assert!(sink.is_empty());
}

// ============================================================================
// Child Stream Tests
// ============================================================================

#[tokio::test]
async fn test_child_records_carry_parent_id() {
    let client = ScriptedClient::new()
        .records("/orders", vec![json!({"id": 42, "discount": "5"})])
        .records(
            "/orders/42/line_items",
            vec![json!({"id": 1, "price": "9.99"}), json!({"id": 2})],
        );
    let (mut engine, _) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    let emitted = engine
        .sync_stream(stream("orders"), true, &[stream("line_items")], &mut sink)
        .await
        .unwrap();

    assert_eq!(emitted, 3);
    assert_eq!(records(&sink, "orders")[0]["discount"], json!(5));

    let items = records(&sink, "line_items");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|r| r["order_id"] == json!(42)));
    assert_eq!(items[0]["price"], json!(9.99));
}

#[tokio::test]
async fn test_parent_traversed_without_emitting() {
    let client = ScriptedClient::new()
        .records("/deals", vec![json!({"id": 7}), json!({"id": 8})])
        .records("/deals/7/associated_contacts", vec![json!({"contact_id": 1})]);
    let (mut engine, client) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(
            stream("deals"),
            false,
            &[stream("associated_contacts")],
            &mut sink,
        )
        .await
        .unwrap();

    assert!(records(&sink, "deals").is_empty());
    assert_eq!(
        records(&sink, "associated_contacts"),
        vec![json!({"contact_id": 1, "deal_id": 7})]
    );

    let targets: Vec<String> = client.requests().into_iter().map(|r| r.target).collect();
    assert!(targets.contains(&"/deals/8/associated_contacts".to_string()));
}

#[tokio::test]
async fn test_child_without_context_yields_nothing() {
    let (mut engine, client) = engine(ScriptedClient::new());
    let mut sink: Vec<Message> = Vec::new();

    let emitted = engine
        .sync_child(stream("line_items"), None, &mut sink)
        .await
        .unwrap();

    assert_eq!(emitted, 0);
    assert!(sink.is_empty());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_parent_without_id_skips_children() {
    let client = ScriptedClient::new().records("/orders", vec![json!({"name": "no id"})]);
    let (mut engine, client) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("orders"), true, &[stream("line_items")], &mut sink)
        .await
        .unwrap();

    assert_eq!(records(&sink, "orders").len(), 1);
    assert!(records(&sink, "line_items").is_empty());
    assert!(client
        .requests()
        .iter()
        .all(|r| r.target == "/orders"));
}

// ============================================================================
// Incremental Tests
// ============================================================================

#[tokio::test]
async fn test_bookmark_filters_and_advances() {
    let mut state = State::new();
    state.set_bookmark("deals", "updated_at", "2024-01-02T00:00:00Z".to_string());
    let client = ScriptedClient::new().records(
        "/deals",
        vec![
            json!({"id": 1, "updated_at": "2024-01-01T00:00:00Z"}),
            json!({"id": 2, "updated_at": "2024-01-05T00:00:00Z"}),
            json!({"id": 3, "updated_at": "2024-01-03T00:00:00Z"}),
            json!({"id": 4}),
        ],
    );
    let (mut engine, _) = engine_with_state(client, state);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("deals"), true, &[], &mut sink)
        .await
        .unwrap();

    let ids: Vec<Value> = records(&sink, "deals").iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(2), json!(3), json!(4)]);
    assert_eq!(engine.stats().records_skipped, 1);
    assert_eq!(
        engine.state().get_bookmark("deals").await.as_deref(),
        Some("2024-01-05T00:00:00Z")
    );

    let Message::State { value } = sink.last().unwrap() else {
        panic!("expected state message");
    };
    assert_eq!(
        value["bookmarks"]["deals"]["replication_key_value"],
        "2024-01-05T00:00:00Z"
    );
}

#[tokio::test]
async fn test_start_date_filters_without_bookmark() {
    let client = ScriptedClient::new().records(
        "/leads",
        vec![
            json!({"id": 1, "updated_at": "2023-06-01T00:00:00Z"}),
            json!({"id": 2, "updated_at": "2024-06-01T00:00:00Z"}),
        ],
    );
    let (engine, _) = engine(client);
    let mut engine = engine.with_config(
        SyncConfig::new().with_start_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
    );
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("leads"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(records(&sink, "leads"), vec![json!({"id": 2, "updated_at": "2024-06-01T00:00:00Z"})]);
}

#[tokio::test]
async fn test_full_refresh_stream_keeps_no_bookmark() {
    let client = ScriptedClient::new().records(
        "/users",
        vec![json!({"id": 1, "updated_at": "2024-01-01T00:00:00Z"})],
    );
    let (mut engine, _) = engine(client);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("users"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(engine.state().get_bookmark("users").await, None);
}

// ============================================================================
// Event Stream Tests
// ============================================================================

#[tokio::test]
async fn test_events_stream() {
    let mut state = State::new();
    state.set_device_uuid("events", "D1".to_string());
    let client = ScriptedClient::new()
        .session(Some("S1"))
        .queue(vec![queue_item(1, "k1"), queue_item(2, "k2")])
        .queue(vec![]);
    let (mut engine, client) = engine_with_state(client, state);
    let mut sink: Vec<Message> = Vec::new();

    let emitted = engine
        .sync_stream(stream("events"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(emitted, 2);
    assert_eq!(records(&sink, "events")[0]["data"]["id"], 1);
    assert_eq!(client.acks(), vec![vec!["k1".to_string(), "k2".to_string()]]);
    assert_eq!(engine.stats().acks_sent, 1);

    let Message::State { value } = sink.last().unwrap() else {
        panic!("expected state message");
    };
    assert_eq!(value["bookmarks"]["events"]["device_uuid"], "D1");
}

#[tokio::test]
async fn test_events_device_from_config() {
    let client = ScriptedClient::new().session(None);
    let (engine, _) = engine(client);
    let mut engine = engine.with_config(SyncConfig::new().with_device_uuid("CFG"));
    let mut sink: Vec<Message> = Vec::new();

    let emitted = engine
        .sync_stream(stream("events"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(emitted, 0);
    assert_eq!(
        engine.state().get_device_uuid("events").await.as_deref(),
        Some("CFG")
    );
}

/// Client that records what the state file held when a session was opened
struct StateFileObserver {
    path: std::path::PathBuf,
    seen: std::sync::Mutex<Option<String>>,
}

#[async_trait::async_trait]
impl ResourceClient for StateFileObserver {
    async fn get_page(&self, _request: &ListRequest) -> Result<crate::api::ListPage> {
        Err(Error::protocol("unexpected list request"))
    }

    async fn start_session(&self, _device_uuid: &str) -> Result<Option<crate::api::SyncSession>> {
        let contents = std::fs::read_to_string(&self.path).unwrap_or_default();
        *self.seen.lock().unwrap() = Some(contents);
        Ok(None)
    }

    async fn fetch_queue(
        &self,
        _device_uuid: &str,
        _session_id: &str,
    ) -> Result<Vec<crate::api::QueueItem>> {
        Ok(Vec::new())
    }

    async fn ack(&self, _device_uuid: &str, _ack_keys: &[String]) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_generated_device_saved_before_session_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let client = Arc::new(StateFileObserver {
        path: path.clone(),
        seen: std::sync::Mutex::new(None),
    });
    let mut engine = SyncEngine::new(client.clone(), StateManager::from_file(&path).unwrap());
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("events"), true, &[], &mut sink)
        .await
        .unwrap();

    let device = engine.state().get_device_uuid("events").await.unwrap();
    let seen = client.seen.lock().unwrap().clone().unwrap();
    let on_disk: Value = serde_json::from_str(&seen).unwrap();
    assert_eq!(on_disk["bookmarks"]["events"]["device_uuid"], device.as_str());

    // Emitted once before the session and once when the stream completes
    assert_eq!(sink.iter().filter(|m| m.is_state()).count(), 2);
}

#[tokio::test]
async fn test_known_device_emits_single_state() {
    let mut state = State::new();
    state.set_device_uuid("events", "D1".to_string());
    let (mut engine, _) = engine_with_state(ScriptedClient::new().session(None), state);
    let mut sink: Vec<Message> = Vec::new();

    engine
        .sync_stream(stream("events"), true, &[], &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.iter().filter(|m| m.is_state()).count(), 1);
}
