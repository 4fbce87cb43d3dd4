//! Tests for output module

use super::*;
use crate::engine::Message;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn lines(buf: &[u8]) -> Vec<Value> {
    String::from_utf8(buf.to_vec())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// ============================================================================
// JsonLinesWriter Tests
// ============================================================================

#[test]
fn test_writes_one_line_per_message() {
    let extracted = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let mut writer = JsonLinesWriter::new(Vec::new());

    writer
        .emit(Message::schema(
            "users",
            json!({"type": "object"}),
            vec!["id".to_string()],
            vec![],
        ))
        .unwrap();
    writer
        .emit(Message::record("users", json!({"id": 1}), extracted))
        .unwrap();
    writer
        .emit(Message::state(json!({"bookmarks": {}})))
        .unwrap();

    assert_eq!(writer.written(), 3);
    let out = lines(&writer.into_inner());

    assert_eq!(
        out[0],
        json!({"type": "SCHEMA", "stream": "users", "schema": {"type": "object"}, "key_properties": ["id"]})
    );
    assert_eq!(
        out[1],
        json!({
            "type": "RECORD",
            "stream": "users",
            "record": {"id": 1},
            "time_extracted": "2024-01-02T03:04:05.000000Z"
        })
    );
    assert_eq!(out[2], json!({"type": "STATE", "value": {"bookmarks": {}}}));
}

#[test]
fn test_bookmark_properties_serialized_when_present() {
    let mut writer = JsonLinesWriter::new(Vec::new());
    writer
        .emit(Message::schema(
            "deals",
            json!({}),
            vec!["id".to_string()],
            vec!["updated_at".to_string()],
        ))
        .unwrap();

    let out = lines(&writer.into_inner());
    assert_eq!(out[0]["bookmark_properties"], json!(["updated_at"]));
}

#[test]
fn test_pretty_format() {
    let mut writer = JsonLinesWriter::with_format(Vec::new(), OutputFormat::Pretty);
    writer.emit(Message::state(json!({"a": 1}))).unwrap();
    writer.flush().unwrap();

    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert!(text.contains("\n  \"type\": \"STATE\""));
}

#[test]
fn test_messages_round_trip() {
    let message = Message::state(json!({"bookmarks": {"events": {"device_uuid": "D1"}}}));
    let text = serde_json::to_string(&message).unwrap();
    let parsed: Message = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, message);
}

#[test]
fn test_vec_sink_collects() {
    let mut sink: Vec<Message> = Vec::new();
    sink.emit(Message::state(json!({}))).unwrap();
    sink.flush().unwrap();
    assert_eq!(sink.len(), 1);
    assert!(sink[0].is_state());
}
