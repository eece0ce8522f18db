use std::path::PathBuf;

/// Engine configuration. Everything has a default so the engine can come up
/// from a bare environment; tunables (score threshold, badge buckets) live
/// here rather than as literals at call sites.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub jobs_path: PathBuf,
    pub salary_path: PathBuf,
    /// Background reload cadence in minutes.
    pub refresh_minutes: u64,
    /// When set, source files are whole-file encrypted and `key` is required.
    pub encrypted: bool,
    pub key: Option<String>,
    /// Minimum fuzzy score for a job to appear in results at all.
    pub min_score: f64,
    /// Delta badge bucket edges, as fractions of the reference salary.
    pub near_pct: f64,
    pub far_pct: f64,
    /// Hard cap on results per page.
    pub per_page: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jobs_path: PathBuf::from("jobs.csv"),
            salary_path: PathBuf::from("salary.csv"),
            refresh_minutes: 30,
            encrypted: false,
            key: None,
            min_score: 0.55,
            near_pct: 0.05,
            far_pct: 0.15,
            per_page: 100,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            jobs_path: std::env::var("JOBDEX_JOBS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_path),
            salary_path: std::env::var("JOBDEX_SALARY_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.salary_path),
            refresh_minutes: std::env::var("JOBDEX_REFRESH_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_minutes),
            encrypted: std::env::var("JOBDEX_ENCRYPTED")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
            key: std::env::var("JOBDEX_KEY").ok().filter(|k| !k.is_empty()),
            min_score: std::env::var("JOBDEX_MIN_SCORE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_score),
            near_pct: defaults.near_pct,
            far_pct: defaults.far_pct,
            per_page: defaults.per_page,
        }
    }
}
