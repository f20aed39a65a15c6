// run.rs — Read-only snapshots of the CI runs being tracked.
//
// PipelineRuns and TaskRuns carry the same information in slightly
// different places (TaskRuns nest their bindings under `spec.inputs`).
// `TrackedRun` exposes the shared capabilities so the reconciler doesn't
// care which kind it's looking at.
//
// Field names follow the orchestrator's manifest JSON (camelCase), so an
// exported run manifest deserializes directly.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotations;
use crate::error::{ResolveError, StoreError};
use crate::resource::{find_commit, Commit};
use crate::run_state::{conditions_to_state, RunState};

/// Identity and annotations of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,

    pub namespace: String,

    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// Tri-state status of a condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// One entry of a run's condition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,

    #[serde(default)]
    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Observed status of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Kind of an input resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    Git,
    Image,
    Other(String),
}

impl From<String> for ResourceType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "git" => ResourceType::Git,
            "image" => ResourceType::Image,
            _ => ResourceType::Other(s),
        }
    }
}

impl From<ResourceType> for String {
    fn from(t: ResourceType) -> Self {
        match t {
            ResourceType::Git => "git".to_string(),
            ResourceType::Image => "image".to_string(),
            ResourceType::Other(s) => s,
        }
    }
}

/// A named parameter on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceParam {
    pub name: String,
    pub value: String,
}

/// Inline description of an input resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResourceSpec {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    #[serde(default)]
    pub params: Vec<ResourceParam>,
}

impl PipelineResourceSpec {
    /// Value of the first param called `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Binds a resource to a run, either inline or by reference.
///
/// Only inline specs are visible to commit resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBinding {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_spec: Option<PipelineResourceSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_ref: Option<ResourceRef>,
}

/// Reference to a resource defined elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunSpec {
    #[serde(default)]
    pub resources: Vec<ResourceBinding>,
}

/// An execution of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: PipelineRunSpec,

    #[serde(default)]
    pub status: RunStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunInputs {
    #[serde(default)]
    pub resources: Vec<ResourceBinding>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunSpec {
    #[serde(default)]
    pub inputs: TaskRunInputs,
}

/// An execution of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRun {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: TaskRunSpec,

    #[serde(default)]
    pub status: RunStatus,
}

/// What the reconciler needs from a run, whatever its kind.
pub trait TrackedRun {
    fn metadata(&self) -> &ObjectMeta;

    fn conditions(&self) -> &[Condition];

    /// Inline resource specs bound to the run.
    fn resource_specs(&self) -> Vec<&PipelineResourceSpec>;

    fn annotations(&self) -> &HashMap<String, String> {
        &self.metadata().annotations
    }

    fn run_state(&self) -> RunState {
        conditions_to_state(self.conditions())
    }

    fn is_notifiable(&self) -> bool {
        annotations::is_notifiable(self.annotations())
    }

    fn find_commit(&self) -> Result<Commit, ResolveError> {
        find_commit(self.resource_specs())
    }
}

fn inline_specs(bindings: &[ResourceBinding]) -> Vec<&PipelineResourceSpec> {
    bindings
        .iter()
        .filter_map(|b| b.resource_spec.as_ref())
        .collect()
}

impl TrackedRun for PipelineRun {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn conditions(&self) -> &[Condition] {
        &self.status.conditions
    }

    fn resource_specs(&self) -> Vec<&PipelineResourceSpec> {
        inline_specs(&self.spec.resources)
    }
}

impl TrackedRun for TaskRun {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn conditions(&self) -> &[Condition] {
        &self.status.conditions
    }

    fn resource_specs(&self) -> Vec<&PipelineResourceSpec> {
        inline_specs(&self.spec.inputs.resources)
    }
}

/// Which kind of run a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    PipelineRun,
    TaskRun,
}

impl RunKind {
    /// Directory / collection name for this kind.
    pub fn plural(&self) -> &'static str {
        match self {
            RunKind::PipelineRun => "pipelineruns",
            RunKind::TaskRun => "taskruns",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::PipelineRun => write!(f, "pipelinerun"),
            RunKind::TaskRun => write!(f, "taskrun"),
        }
    }
}

/// A run of either kind, as returned by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyRun {
    Pipeline(PipelineRun),
    Task(TaskRun),
}

impl AnyRun {
    pub fn kind(&self) -> RunKind {
        match self {
            AnyRun::Pipeline(_) => RunKind::PipelineRun,
            AnyRun::Task(_) => RunKind::TaskRun,
        }
    }

    fn inner(&self) -> &dyn TrackedRun {
        match self {
            AnyRun::Pipeline(run) => run,
            AnyRun::Task(run) => run,
        }
    }
}

impl TrackedRun for AnyRun {
    fn metadata(&self) -> &ObjectMeta {
        self.inner().metadata()
    }

    fn conditions(&self) -> &[Condition] {
        self.inner().conditions()
    }

    fn resource_specs(&self) -> Vec<&PipelineResourceSpec> {
        self.inner().resource_specs()
    }
}

/// Namespace-qualified identifier of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunRef {
    pub kind: RunKind,
    pub namespace: String,
    pub name: String,
}

impl RunRef {
    pub fn new(kind: RunKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a `namespace/name` pair.
    pub fn parse(kind: RunKind, s: &str) -> Result<Self, StoreError> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(kind, ns, name))
            }
            _ => Err(StoreError::InvalidRunRef(format!(
                "expected <namespace>/<name>, got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for RunRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}
