//! Job search and salary enrichment engine.
//!
//! The web layer (or any other caller) feeds this crate delimited job and
//! salary files and gets back ranked, paginated, salary-enriched search
//! results. Datasets are immutable snapshots swapped atomically by a
//! background refresh, so queries never see a half-loaded state.

pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod salary;
pub mod search;
pub mod store;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use models::{
    Dataset, DeltaBadge, FallbackLevel, JobRecord, SalaryEstimate, SalaryRecord, SearchPage,
    SearchResult,
};
pub use search::SearchEngine;
pub use store::{DatasetStore, RefreshScheduler, StoreState};
