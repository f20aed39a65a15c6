// store.rs — Where run snapshots are loaded from.
//
// The reconciler only ever reads runs. `FileRunStore` reads manifests
// exported as JSON under `<runs_dir>/<namespace>/<kind-plural>/<name>.json`,
// e.g. `runs/ci/pipelineruns/build-42.json`. `MemoryRunStore` holds runs
// in a map for embedding and tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StoreError;
use crate::run::{AnyRun, PipelineRun, RunKind, RunRef, TaskRun, TrackedRun};

/// Read access to run snapshots.
pub trait RunStore: Send + Sync {
    /// Load a run. `Ok(None)` means it doesn't exist (e.g. was deleted).
    fn load(&self, run_ref: &RunRef) -> Result<Option<AnyRun>, StoreError>;

    /// All runs currently in the store.
    fn list(&self) -> Result<Vec<RunRef>, StoreError>;
}

/// JSON-file backed run store.
pub struct FileRunStore {
    runs_dir: PathBuf,
}

impl FileRunStore {
    pub fn new(runs_dir: impl AsRef<Path>) -> Self {
        Self {
            runs_dir: runs_dir.as_ref().to_path_buf(),
        }
    }

    /// Write a run to its manifest path (creates or overwrites).
    pub fn save(&self, run: &AnyRun) -> Result<(), StoreError> {
        let meta = run.metadata();
        let run_ref = RunRef::new(run.kind(), &meta.namespace, &meta.name);
        let path = self.run_file(&run_ref);
        let dir = path.parent().unwrap_or(&self.runs_dir);
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let json = match run {
            AnyRun::Pipeline(r) => serde_json::to_string_pretty(r),
            AnyRun::Task(r) => serde_json::to_string_pretty(r),
        }
        .map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn run_file(&self, run_ref: &RunRef) -> PathBuf {
        self.runs_dir
            .join(&run_ref.namespace)
            .join(run_ref.kind.plural())
            .join(format!("{}.json", run_ref.name))
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: dir.display().to_string(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            paths.push(entry.map_err(io_err)?.path());
        }
        paths.sort();
        Ok(paths)
    }
}

impl RunStore for FileRunStore {
    fn load(&self, run_ref: &RunRef) -> Result<Option<AnyRun>, StoreError> {
        let path = self.run_file(run_ref);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let parse_err = |source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        };
        let run = match run_ref.kind {
            RunKind::PipelineRun => {
                AnyRun::Pipeline(serde_json::from_str::<PipelineRun>(&json).map_err(parse_err)?)
            }
            RunKind::TaskRun => {
                AnyRun::Task(serde_json::from_str::<TaskRun>(&json).map_err(parse_err)?)
            }
        };
        Ok(Some(run))
    }

    fn list(&self) -> Result<Vec<RunRef>, StoreError> {
        if !self.runs_dir.exists() {
            return Ok(Vec::new());
        }

        let mut refs = Vec::new();
        for ns_dir in self.read_dir(&self.runs_dir)? {
            if !ns_dir.is_dir() {
                continue;
            }
            let Some(namespace) = ns_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            for kind in [RunKind::PipelineRun, RunKind::TaskRun] {
                let kind_dir = ns_dir.join(kind.plural());
                if !kind_dir.is_dir() {
                    continue;
                }
                for path in self.read_dir(&kind_dir)? {
                    if path.extension().is_some_and(|ext| ext == "json") {
                        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                            refs.push(RunRef::new(kind, namespace, name));
                        }
                    }
                }
            }
        }
        Ok(refs)
    }
}

/// In-memory run store.
#[derive(Default)]
pub struct MemoryRunStore {
    runs: Mutex<HashMap<RunRef, AnyRun>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a run, keyed by its kind and metadata.
    pub fn insert(&self, run: AnyRun) {
        let meta = run.metadata();
        let run_ref = RunRef::new(run.kind(), &meta.namespace, &meta.name);
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run_ref, run);
    }

    pub fn remove(&self, run_ref: &RunRef) -> Option<AnyRun> {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(run_ref)
    }
}

impl RunStore for MemoryRunStore {
    fn load(&self, run_ref: &RunRef) -> Result<Option<AnyRun>, StoreError> {
        Ok(self
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(run_ref)
            .cloned())
    }

    fn list(&self) -> Result<Vec<RunRef>, StoreError> {
        let mut refs: Vec<RunRef> = self
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        refs.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        Ok(refs)
    }
}
