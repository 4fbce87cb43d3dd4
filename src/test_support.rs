//! Scripted `ResourceClient` for unit tests

use crate::api::{decode_queue, ListPage, ListRequest, QueueItem, ResourceClient, SyncSession};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// A call observed by the scripted client
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Get(ListRequest),
    Start { device: String },
    Fetch { device: String, session: String },
    Ack { device: String, keys: Vec<String> },
}

/// Replays canned responses and records every call.
///
/// List targets without a scripted body answer with an empty page.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    pages: Mutex<HashMap<String, VecDeque<Value>>>,
    failing: HashSet<String>,
    sessions: Mutex<VecDeque<Option<String>>>,
    queues: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a response body for `target`
    pub(crate) fn page(self, target: &str, body: Value) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push_back(body);
        self
    }

    /// Queue a list page built from bare records
    pub(crate) fn records(self, target: &str, records: Vec<Value>) -> Self {
        let items: Vec<Value> = records.into_iter().map(|r| json!({"data": r})).collect();
        self.page(target, json!({"items": items}))
    }

    /// Make every request to `target` fail with a 500
    pub(crate) fn failing(mut self, target: &str) -> Self {
        self.failing.insert(target.to_string());
        self
    }

    /// Queue a start-session outcome (`None` = no content)
    pub(crate) fn session(self, id: Option<&str>) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .push_back(id.map(ToString::to_string));
        self
    }

    /// Queue a fetch response with the given items
    pub(crate) fn queue(self, items: Vec<Value>) -> Self {
        self.queues
            .lock()
            .unwrap()
            .push_back(json!({ "items": items }));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn requests(&self) -> Vec<ListRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Get(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn acks(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Ack { keys, .. } => Some(keys),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A queue item carrying `ack_key`
pub(crate) fn queue_item(id: i64, ack_key: &str) -> Value {
    json!({
        "data": {"id": id},
        "meta": {"type": "deal", "sync": {"event_type": "updated", "ack_key": ack_key, "revision": 1}}
    })
}

#[async_trait]
impl ResourceClient for ScriptedClient {
    async fn get_page(&self, request: &ListRequest) -> Result<ListPage> {
        self.record(Call::Get(request.clone()));

        if self.failing.contains(&request.target) {
            return Err(Error::http_status(500, "scripted failure"));
        }

        let body = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&request.target)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| json!({"items": []}));
        ListPage::from_body(body)
    }

    async fn start_session(&self, device_uuid: &str) -> Result<Option<SyncSession>> {
        self.record(Call::Start {
            device: device_uuid.to_string(),
        });
        let id = self.sessions.lock().unwrap().pop_front().flatten();
        Ok(id.map(|id| SyncSession { id }))
    }

    async fn fetch_queue(&self, device_uuid: &str, session_id: &str) -> Result<Vec<QueueItem>> {
        self.record(Call::Fetch {
            device: device_uuid.to_string(),
            session: session_id.to_string(),
        });
        match self.queues.lock().unwrap().pop_front() {
            Some(body) => decode_queue(&body),
            None => Ok(Vec::new()),
        }
    }

    async fn ack(&self, device_uuid: &str, ack_keys: &[String]) -> Result<()> {
        self.record(Call::Ack {
            device: device_uuid.to_string(),
            keys: ack_keys.to_vec(),
        });
        Ok(())
    }
}
