//! Shared test doubles
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use stackpilot::errors::RelayError;
use stackpilot::forge::api::ForgeApi;
use stackpilot::models::run::{RunConclusion, RunStatus, WorkflowRun};

/// Scripted fake of the forge API.
///
/// Responses are queued per endpoint; when a queue runs down to its last
/// entry that entry keeps repeating, so open-ended loops (discovery retries,
/// session polling) stay deterministic.
pub struct FakeForge {
    dispatch_result: Mutex<Result<(), String>>,
    run_lists: Mutex<VecDeque<Result<Vec<WorkflowRun>, String>>>,
    run_details: Mutex<VecDeque<Result<WorkflowRun, String>>>,
    archives: Mutex<VecDeque<Result<Vec<u8>, String>>>,

    pub dispatched: Mutex<Vec<(String, BTreeMap<String, String>)>>,
    pub dispatch_calls: AtomicU32,
    pub list_calls: AtomicU32,
    pub details_calls: AtomicU32,
    pub archive_calls: AtomicU32,
}

impl FakeForge {
    pub fn new() -> Self {
        Self {
            dispatch_result: Mutex::new(Ok(())),
            run_lists: Mutex::new(VecDeque::new()),
            run_details: Mutex::new(VecDeque::new()),
            archives: Mutex::new(VecDeque::new()),
            dispatched: Mutex::new(Vec::new()),
            dispatch_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
            details_calls: AtomicU32::new(0),
            archive_calls: AtomicU32::new(0),
        }
    }

    pub fn fail_dispatch(&self, message: &str) {
        *self.dispatch_result.lock().unwrap() = Err(message.to_string());
    }

    pub fn push_run_list(&self, result: Result<Vec<WorkflowRun>, &str>) {
        self.run_lists
            .lock()
            .unwrap()
            .push_back(result.map_err(str::to_string));
    }

    pub fn push_run_details(&self, result: Result<WorkflowRun, &str>) {
        self.run_details
            .lock()
            .unwrap()
            .push_back(result.map_err(str::to_string));
    }

    pub fn push_archive(&self, result: Result<Vec<u8>, &str>) {
        self.archives
            .lock()
            .unwrap()
            .push_back(result.map_err(str::to_string));
    }

    fn next<T: Clone>(queue: &Mutex<VecDeque<Result<T, String>>>) -> Result<T, RelayError> {
        let mut queue = queue.lock().unwrap();
        let result = if queue.len() > 1 {
            queue.pop_front().expect("scripted response")
        } else {
            queue.front().cloned().ok_or_else(|| {
                RelayError::ForgeError("no scripted response".to_string())
            })?
        };
        result.map_err(RelayError::ForgeError)
    }
}

#[async_trait]
impl ForgeApi for FakeForge {
    async fn dispatch_workflow(
        &self,
        git_ref: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<(), RelayError> {
        self.dispatch_calls.fetch_add(1, Ordering::SeqCst);
        self.dispatched
            .lock()
            .unwrap()
            .push((git_ref.to_string(), inputs.clone()));
        self.dispatch_result
            .lock()
            .unwrap()
            .clone()
            .map_err(RelayError::ForgeError)
    }

    async fn list_recent_runs(&self, _limit: usize) -> Result<Vec<WorkflowRun>, RelayError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.run_lists)
    }

    async fn run_details(&self, _run_id: u64) -> Result<WorkflowRun, RelayError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.run_details)
    }

    async fn fetch_log_archive(&self, _archive_url: &str) -> Result<Vec<u8>, RelayError> {
        self.archive_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.archives)
    }
}

/// Build a workflow run for scripting
pub fn workflow_run(
    id: u64,
    status: RunStatus,
    conclusion: Option<RunConclusion>,
    logs_url: Option<&str>,
    run_started_at: Option<DateTime<Utc>>,
) -> WorkflowRun {
    WorkflowRun {
        id,
        status,
        conclusion,
        logs_url: logs_url.map(str::to_string),
        run_started_at,
    }
}

/// Build an in-memory zip archive from `(entry name, content)` pairs
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}
