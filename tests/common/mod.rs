//! Common test helpers for integration tests
//!
//! Provides an isolated project directory, a scripted oracle, a scripted
//! knowledge base and an in-memory remote cache store. Every fake counts its
//! calls so tests can assert how often an external service was reached.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use complyscan::cache::RemoteStore;
use complyscan::context::{KnowledgeBase, RetrievedContext};
use complyscan::models::{CostLedger, ModelPricing};
use complyscan::oracle::Oracle;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Scan root in a temporary directory, removed on drop
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    pub fn new(files: Vec<(&str, &str)>) -> Self {
        let project = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        for (name, content) in files {
            project.write_file(name, content);
        }
        project
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.file(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read_file(&self, name: &str) -> String {
        fs::read_to_string(self.file(name)).unwrap()
    }
}

/// Oracle that replays scripted responses
///
/// Responses are consumed in order; once the script runs out the last
/// response is repeated. `None` simulates a transport failure.
pub struct FakeOracle {
    script: Mutex<VecDeque<Option<String>>>,
    last: Mutex<Option<String>>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeOracle {
    pub fn new(responses: Vec<Option<&str>>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(|r| r.map(str::to_string)).collect()),
            last: Mutex::new(None),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always(response: &str) -> Self {
        Self::new(vec![Some(response)])
    }

    pub fn failing() -> Self {
        Self::new(vec![None])
    }

    /// Shared counter that outlives the boxed oracle
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl Oracle for FakeOracle {
    async fn invoke(&self, prompt: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = script.pop_front() {
            *last = next;
        }
        last.clone()
    }

    fn ledger(&self) -> CostLedger {
        let calls = self.calls.load(Ordering::SeqCst) as u64;
        CostLedger {
            calls,
            accumulated_cost: calls as f64 * ModelPricing::DEFAULT.estimate(4000, 400),
        }
    }

    fn model_id(&self) -> &str {
        "fake-oracle"
    }
}

/// Knowledge base returning the same passage for every query, or nothing
pub struct FakeKnowledge {
    text: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeKnowledge {
    pub fn answering(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self {
            text: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl KnowledgeBase for FakeKnowledge {
    async fn retrieve(&self, _query: &str) -> Option<RetrievedContext> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text.as_ref().map(|text| RetrievedContext {
            text: text.clone(),
            sources: vec!["handbook".to_string()],
        })
    }
}

/// Remote cache object held in memory
#[derive(Clone, Default)]
pub struct MemoryRemoteStore {
    pub blob: Arc<Mutex<Option<Vec<u8>>>>,
    pub uploads: Arc<AtomicUsize>,
}

impl MemoryRemoteStore {
    pub fn with_blob(bytes: &[u8]) -> Self {
        let store = Self::default();
        *store.blob.lock().unwrap() = Some(bytes.to_vec());
        store
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.blob.lock().unwrap().clone())
    }

    async fn upload(&self, bytes: Vec<u8>) -> Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        *self.blob.lock().unwrap() = Some(bytes);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

pub const OPEN_SECURITY_GROUP: &str = r#"resource "aws_security_group" "web" {
  name        = "web"
  description = "Public web tier"

  ingress {
    from_port   = 443
    to_port     = 443
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }
}
"#;

pub const PRIVILEGED_POD: &str = "apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
    - name: web
      image: nginx:1.25
      securityContext:
        privileged: true
        runAsUser: 0
";
