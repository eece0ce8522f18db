//! Dataset store and background refresh.
//!
//! The current dataset lives behind `RwLock<Arc<Dataset>>`: readers take the
//! read lock only long enough to clone the `Arc`, the refresh path parses
//! everything off-lock and swaps the reference in one write. A query that
//! grabbed a snapshot keeps its generation alive until it drops the `Arc`,
//! so a concurrent swap never tears its view.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::crypto;
use crate::error::{EngineError, EngineResult};
use crate::models::{Dataset, JobRecord, SalaryRecord};
use crate::parse;
use crate::salary::SalaryIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Empty,
    Loading,
    Ready,
    Refreshing,
    /// No load has ever succeeded; serving empty results in degraded mode.
    Failed,
}

pub struct DatasetStore {
    current: RwLock<Arc<Dataset>>,
    state: RwLock<StoreState>,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Dataset::empty())),
            state: RwLock::new(StoreState::Empty),
        }
    }
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current dataset. Cheap; holds the read lock only for the clone.
    pub fn snapshot(&self) -> Arc<Dataset> {
        self.current.read().expect("dataset lock poisoned").clone()
    }

    pub fn state(&self) -> StoreState {
        *self.state.read().expect("state lock poisoned")
    }

    /// One reload attempt: read, decrypt, parse, validate, swap. On failure
    /// the previous dataset stays current and the error is returned for the
    /// caller to log; query traffic is unaffected either way.
    pub fn refresh(&self, config: &EngineConfig) -> EngineResult<u64> {
        let previous = self.snapshot();
        self.set_state(if previous.generation == 0 {
            StoreState::Loading
        } else {
            StoreState::Refreshing
        });

        match self.load(config, previous.generation + 1) {
            Ok(dataset) => {
                let generation = dataset.generation;
                let jobs = dataset.jobs.len();
                let salaries = dataset.salaries.len();
                *self.current.write().expect("dataset lock poisoned") = Arc::new(dataset);
                self.set_state(StoreState::Ready);
                debug!(generation, jobs, salaries, "dataset published");
                Ok(generation)
            }
            Err(e) => {
                self.set_state(if previous.generation == 0 {
                    StoreState::Failed
                } else {
                    StoreState::Ready
                });
                Err(e)
            }
        }
    }

    /// Publishes a dataset from already-decoded records, for callers that
    /// hold rows in memory rather than files.
    pub fn publish(&self, jobs: Vec<JobRecord>, salaries: &[SalaryRecord]) -> u64 {
        let generation = self.snapshot().generation + 1;
        let dataset = Dataset {
            generation,
            loaded_at: Utc::now(),
            jobs,
            salaries: SalaryIndex::build(salaries),
        };
        *self.current.write().expect("dataset lock poisoned") = Arc::new(dataset);
        self.set_state(StoreState::Ready);
        generation
    }

    fn load(&self, config: &EngineConfig, generation: u64) -> EngineResult<Dataset> {
        let jobs_text = read_source(&config.jobs_path, config)?;
        let jobs = parse::parse_jobs(&jobs_text)?;
        if jobs.is_empty() {
            return Err(EngineError::parse("jobs source has no usable rows"));
        }

        // A missing salary file degrades to no enrichment, not a failed load.
        let salaries = if config.salary_path.exists() {
            let text = read_source(&config.salary_path, config)?;
            parse::parse_salaries(&text)?
        } else {
            debug!(path = %config.salary_path.display(), "salary source missing, skipping enrichment");
            Vec::new()
        };

        Ok(Dataset {
            generation,
            loaded_at: Utc::now(),
            jobs,
            salaries: SalaryIndex::build(&salaries),
        })
    }

    fn set_state(&self, next: StoreState) {
        *self.state.write().expect("state lock poisoned") = next;
    }
}

fn read_source(path: &Path, config: &EngineConfig) -> EngineResult<String> {
    let raw = std::fs::read(path)
        .map_err(|e| EngineError::load(format!("{}: {}", path.display(), e)))?;
    let plain = crypto::decrypt(raw, config.encrypted, config.key.as_deref())?;
    Ok(String::from_utf8_lossy(&plain).into_owned())
}

/// Background timer that reloads the store on a fixed interval. One attempt
/// per tick; failures are logged and the previous dataset keeps serving.
pub struct RefreshScheduler {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn spawn(store: Arc<DatasetStore>, config: EngineConfig) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(config.refresh_minutes.max(1) * 60);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval fires immediately; the caller already did the initial
            // load, so swallow the first tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                match store.refresh(&config) {
                    Ok(generation) => {
                        info!(generation, "dataset refreshed");
                    }
                    Err(e) => {
                        warn!(error = %e, "refresh failed, keeping previous dataset");
                    }
                }
            }
        });
        Self { shutdown, handle }
    }

    /// Stops future ticks. The reload itself is synchronous, so aborting the
    /// task can only land on the timer await, never mid-publish.
    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.handle.abort();
    }
}
