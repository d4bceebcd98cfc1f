//! Last-fetch status, one holder per family. An explicitly owned handle
//! rather than a process-wide global, so independent scheduler instances
//! (and tests) each carry their own.

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FetchStatus {
    /// Local time of the most recent poll cycle, None until the first one.
    pub time: Option<NaiveDateTime>,
    pub success: Option<bool>,
    pub message: String,
}

impl Default for FetchStatus {
    fn default() -> Self {
        Self {
            time: None,
            success: None,
            message: "Not fetched yet.".to_string(),
        }
    }
}

/// Shared, overwritten-per-cycle record of the latest poll outcome.
#[derive(Clone, Default)]
pub struct LastFetchStatus {
    inner: Arc<Mutex<FetchStatus>>,
}

impl LastFetchStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, success: bool, message: impl Into<String>) {
        self.record_at(success, message, Local::now().naive_local());
    }

    pub fn record_at(&self, success: bool, message: impl Into<String>, time: NaiveDateTime) {
        let message = message.into();
        let message = if message.is_empty() {
            if success { "Stock updated." } else { "Fetch failed." }.to_string()
        } else {
            message
        };
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = FetchStatus {
            time: Some(time),
            success: Some(success),
            message,
        };
    }

    pub fn get(&self) -> FetchStatus {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
