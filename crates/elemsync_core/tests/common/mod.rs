use elemsync_core::{RawResponse, RemoteClient, TransportError};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One request observed by `StubClient`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Remote client stub answering from a queue, then from a fallback.
pub struct StubClient {
    queued: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    fallback: Result<RawResponse, TransportError>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[allow(dead_code)]
impl StubClient {
    /// Answers every call with `body` and status 200.
    pub fn always(body: Value) -> Self {
        Self::always_result(Ok(RawResponse::ok(body)))
    }

    pub fn always_result(result: Result<RawResponse, TransportError>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers with `bodies` in order, then repeats the last one.
    pub fn sequence(bodies: Vec<Value>) -> Self {
        let fallback = bodies
            .last()
            .cloned()
            .map(RawResponse::ok)
            .ok_or_else(|| TransportError::Network("no stubbed response".to_string()));
        Self {
            queued: Mutex::new(bodies.into_iter().map(|body| Ok(RawResponse::ok(body))).collect()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn writes(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method != "GET")
            .collect()
    }

    fn answer(
        &self,
        method: &'static str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        self.queued
            .lock()
            .expect("queue lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl RemoteClient for StubClient {
    fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.answer("GET", path, None)
    }

    fn put(&self, path: &str, body: &Value) -> Result<RawResponse, TransportError> {
        self.answer("PUT", path, Some(body))
    }

    fn post(&self, path: &str, body: &Value) -> Result<RawResponse, TransportError> {
        self.answer("POST", path, Some(body))
    }
}
