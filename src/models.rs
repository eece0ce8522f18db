use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::salary::SalaryIndex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub title_norm: String,
    pub company: String,
    pub city: String,
    pub country: String,      // as it appeared in the source row
    pub country_code: String, // normalized; "??" when unresolvable
    pub posted: Option<NaiveDate>,
    pub url: Option<String>,
    pub snippet: String,
    pub pay_min: Option<i64>,
    pub pay_max: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryRecord {
    pub title_norm: String,
    pub city: Option<String>,         // lowercase; None = not city-scoped
    pub country_code: Option<String>, // None = global row
    pub currency: String,
    pub amount: i64,
    pub sample_size: Option<u32>,
}

/// One fully-loaded snapshot of job and salary data. Never mutated after
/// publication; the store replaces the whole thing on refresh.
#[derive(Debug)]
pub struct Dataset {
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
    pub jobs: Vec<JobRecord>,
    pub salaries: SalaryIndex,
}

impl Dataset {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            loaded_at: Utc::now(),
            jobs: Vec::new(),
            salaries: SalaryIndex::default(),
        }
    }
}

/// Which scope a resolved salary figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLevel {
    City,
    Country,
    Global,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryEstimate {
    pub amount: i64,
    pub currency: String,
    pub level: FallbackLevel,
}

/// Bucketed comparison of a resolved salary against a broader-scope reference
/// for the same title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaBadge {
    MuchBelow,
    Below,
    Near,
    Above,
    MuchAbove,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub job: JobRecord,
    pub salary: Option<SalaryEstimate>, // None = no data at any fallback level
    pub badge: DeltaBadge,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    pub total: usize,
    pub page: i64,
    pub per_page: usize,
    pub pages: usize,
    pub generation: u64,
}
