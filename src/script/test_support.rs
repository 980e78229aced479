use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{HttpCapability, HttpResponse, Recorder, RequestDescriptor};

/// Answers requests with a queue of canned statuses, then with `fallback`.
pub(crate) struct ScriptedHttp {
    statuses: Mutex<VecDeque<u16>>,
    fallback: u16,
    seen: Mutex<Vec<RequestDescriptor>>,
}

impl ScriptedHttp {
    pub(crate) fn new<I>(statuses: I, fallback: u16) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            fallback,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn seen(&self) -> Vec<RequestDescriptor> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpCapability for ScriptedHttp {
    async fn send(&self, request: &RequestDescriptor) -> HttpResponse {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        let status = self
            .statuses
            .lock()
            .ok()
            .and_then(|mut statuses| statuses.pop_front())
            .unwrap_or(self.fallback);
        HttpResponse { status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Recorded {
    Check(String, bool),
    Rate(String, bool),
}

#[derive(Default)]
pub(crate) struct MemoryRecorder {
    entries: Mutex<Vec<Recorded>>,
}

impl MemoryRecorder {
    pub(crate) fn entries(&self) -> Vec<Recorded> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn push(&self, entry: Recorded) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

impl Recorder for MemoryRecorder {
    fn check(&self, name: &str, passed: bool) {
        self.push(Recorded::Check(name.to_owned(), passed));
    }

    fn add_rate(&self, name: &str, value: bool) {
        self.push(Recorded::Rate(name.to_owned(), value));
    }
}
