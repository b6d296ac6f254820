//! In-memory fakes shared by the orchestration tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

use tfconnect_types::action::{ActionEvent, PropertyBag, TriggerKind};
use tfconnect_types::config::{BridgeConfig, WorkspaceConfig};
use tfconnect_types::error::{EngineError, ReportError};
use tfconnect_types::state::{ActionStatus, ApplyMode};

use crate::engine::EngineDriver;
use crate::orchestration::orchestrator::Orchestrator;
use crate::render::variables::VAR_FILE_NAME;
use crate::report::StatusReporter;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// Temp directory with a bootstrap template, a `bucket` resource
/// template, and an empty workspace root.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub const BOOTSTRAP: &'static str =
        "terraform {\n  backend \"s3\" {\n    key = \"{{ .storage_key }}\"\n  }\n}\n";
    pub const BUCKET_TEMPLATE: &'static str =
        "resource \"aws_s3_bucket\" \"this\" {\n  bucket = var.name\n}\n";

    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.tf"), Self::BOOTSTRAP).unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/bucket.tf"), Self::BUCKET_TEMPLATE).unwrap();
        std::fs::create_dir(dir.path().join("workspaces")).unwrap();
        Self { dir }
    }

    pub fn config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.templates.dir = self.dir.path().join("templates");
        config.templates.bootstrap = self.dir.path().join("main.tf");
        config.workspace = WorkspaceConfig {
            root: Some(self.workspace_root()),
            prefix: "tf-".to_string(),
        };
        config
    }

    pub fn orchestrator<E: EngineDriver>(&self, engine: E) -> Orchestrator<E> {
        Orchestrator::new(engine, &self.config())
    }

    pub fn orchestrator_with<E: EngineDriver>(
        &self,
        engine: E,
        tweak: impl FnOnce(&mut BridgeConfig),
    ) -> Orchestrator<E> {
        let mut config = self.config();
        tweak(&mut config);
        Orchestrator::new(engine, &config)
    }

    pub fn event(&self, trigger: TriggerKind, entity_ref: Option<&str>, payload: Value) -> ActionEvent {
        let payload_properties: PropertyBag = match payload {
            Value::Object(map) => map,
            _ => PropertyBag::new(),
        };
        ActionEvent {
            trigger,
            run_id: "r_1".to_string(),
            entity_ref: entity_ref.map(str::to_string),
            blueprint: "bucket".to_string(),
            entity_properties: PropertyBag::new(),
            payload_properties,
        }
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.dir.path().join("workspaces")
    }

    /// Workspaces still present on disk.
    pub fn workspace_count(&self) -> usize {
        std::fs::read_dir(self.workspace_root()).unwrap().count()
    }
}

// ---------------------------------------------------------------------------
// FakeEngine
// ---------------------------------------------------------------------------

/// Workspace contents observed at the moment of an engine call.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub workdir: PathBuf,
    pub bootstrap: String,
    pub resource: String,
    pub vars: Option<Value>,
    pub mode: Option<ApplyMode>,
}

impl Snapshot {
    fn capture(workdir: &Path, mode: Option<ApplyMode>) -> Self {
        let read = |name: &str| std::fs::read_to_string(workdir.join(name)).unwrap_or_default();
        let vars = std::fs::read(workdir.join(VAR_FILE_NAME))
            .ok()
            .map(|bytes| serde_json::from_slice(&bytes).unwrap());
        Self {
            workdir: workdir.to_path_buf(),
            bootstrap: read("main.tf"),
            resource: read("template.tf"),
            vars,
            mode,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EngineCall {
    Init(Snapshot),
    Apply(Snapshot),
    Show(Snapshot),
}

impl EngineCall {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            EngineCall::Init(s) | EngineCall::Apply(s) | EngineCall::Show(s) => s,
        }
    }
}

/// Engine double that records every call and the workspace it saw.
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    fail_init: Option<String>,
    fail_apply: Option<String>,
    state: Option<Value>,
    delay: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeEngine {
    pub fn failing_init(stderr: &str) -> Self {
        Self {
            fail_init: Some(stderr.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_apply(stderr: &str) -> Self {
        Self {
            fail_apply: Some(stderr.to_string()),
            ..Default::default()
        }
    }

    pub fn with_state(state: Value) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }

    pub fn slow(millis: u64) -> Self {
        Self {
            delay: Some(Duration::from_millis(millis)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_apply(&self) -> Option<Snapshot> {
        self.calls().into_iter().rev().find_map(|c| match c {
            EngineCall::Apply(s) => Some(s),
            _ => None,
        })
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn failure(command: &str, stderr: &str) -> EngineError {
        EngineError::Failed {
            command: command.to_string(),
            exit_code: Some(1),
            stderr: stderr.to_string(),
        }
    }
}

impl EngineDriver for FakeEngine {
    async fn init(&self, workdir: &Path) -> Result<(), EngineError> {
        self.enter(EngineCall::Init(Snapshot::capture(workdir, None))).await;
        match &self.fail_init {
            Some(stderr) => Err(Self::failure("terraform init", stderr)),
            None => Ok(()),
        }
    }

    async fn apply(&self, workdir: &Path, var_file: &Path, mode: ApplyMode) -> Result<(), EngineError> {
        assert!(var_file.starts_with(workdir), "var file must live in the workspace");
        self.enter(EngineCall::Apply(Snapshot::capture(workdir, Some(mode))))
            .await;
        match &self.fail_apply {
            Some(stderr) => Err(Self::failure("terraform apply", stderr)),
            None => Ok(()),
        }
    }

    async fn show(&self, workdir: &Path) -> Result<Value, EngineError> {
        self.enter(EngineCall::Show(Snapshot::capture(workdir, None))).await;
        self.state
            .clone()
            .ok_or_else(|| Self::failure("terraform show", "No state."))
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter double that records every report and can be made to fail.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, ActionStatus)>>,
    fail: bool,
}

impl RecordingReporter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn reports(&self) -> Vec<(String, ActionStatus)> {
        self.reports.lock().unwrap().clone()
    }
}

impl StatusReporter for RecordingReporter {
    async fn report(&self, run_id: &str, status: ActionStatus) -> Result<(), ReportError> {
        self.reports.lock().unwrap().push((run_id.to_string(), status));
        if self.fail {
            Err(ReportError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}
