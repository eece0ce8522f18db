//! Query façade: filter, score, rank, paginate, enrich.

use std::sync::Arc;

use tracing::warn;

use crate::config::EngineConfig;
use crate::matcher;
use crate::models::{Dataset, DeltaBadge, JobRecord, SearchPage, SearchResult};
use crate::normalize::normalize_country;
use crate::parse::parse_salary_query;
use crate::store::{DatasetStore, RefreshScheduler};

pub struct SearchEngine {
    store: Arc<DatasetStore>,
    config: EngineConfig,
}

impl SearchEngine {
    /// Builds the engine and performs the initial synchronous load. A failed
    /// first load leaves the engine serving empty results rather than dying;
    /// the scheduler will retry on its interval.
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(DatasetStore::new());
        if let Err(e) = store.refresh(&config) {
            warn!(error = %e, "initial load failed, starting degraded");
        }
        Self { store, config }
    }

    /// Builds the engine over an existing store without loading anything.
    pub fn with_store(store: Arc<DatasetStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> Arc<DatasetStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawns the background refresh timer for this engine's store.
    pub fn start_refresh(&self) -> RefreshScheduler {
        RefreshScheduler::spawn(self.store.clone(), self.config.clone())
    }

    /// Searches the current dataset. The dataset is snapshotted once up
    /// front, so a refresh swap mid-query is invisible. Bad page numbers
    /// yield an empty page with the true total instead of an error.
    pub fn search(&self, query: &str, country: Option<&str>, page: i64) -> SearchPage {
        let snapshot = self.store.snapshot();

        let (cleaned, floor, ceiling) = parse_salary_query(query);
        let query_norm = crate::normalize::normalize_title(&cleaned);
        let country_code = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(normalize_country);

        let mut ranked: Vec<(f64, &JobRecord)> = snapshot
            .jobs
            .iter()
            .filter(|job| match &country_code {
                Some(code) => &job.country_code == code,
                None => true,
            })
            .filter(|job| self.passes_salary_constraint(&snapshot, job, floor, ceiling))
            .filter_map(|job| {
                let score = matcher::score(&query_norm, &job.title_norm);
                if query_norm.is_empty() || score >= self.config.min_score {
                    Some((score, job))
                } else {
                    None
                }
            })
            .collect();
        ranked.sort_by(matcher::rank_cmp);

        let total = ranked.len();
        let per_page = self.config.per_page.max(1);
        let pages = total.div_ceil(per_page);

        let results = match usize::try_from(page) {
            Ok(p) if p.saturating_mul(per_page) < total => ranked
                [p * per_page..(p * per_page + per_page).min(total)]
                .iter()
                .map(|(score, job)| self.enrich(&snapshot, job, *score))
                .collect(),
            _ => Vec::new(),
        };

        SearchPage {
            results,
            total,
            page,
            per_page,
            pages,
            generation: snapshot.generation,
        }
    }

    /// A job passes a mined salary constraint on its own advertised range, or
    /// on the resolved reference when the posting has none. No range at all
    /// fails a constrained query.
    fn passes_salary_constraint(
        &self,
        snapshot: &Dataset,
        job: &JobRecord,
        floor: Option<i64>,
        ceiling: Option<i64>,
    ) -> bool {
        if floor.is_none() && ceiling.is_none() {
            return true;
        }
        let (min, max) = match (job.pay_min, job.pay_max) {
            (None, None) => {
                match snapshot
                    .salaries
                    .resolve(&job.title_norm, &job.city, &job.country_code)
                {
                    Some(est) => (est.amount, est.amount),
                    None => return false,
                }
            }
            (min, max) => {
                let lo = min.unwrap_or(0);
                (lo, max.unwrap_or(lo))
            }
        };
        if let Some(f) = floor {
            if max < f {
                return false;
            }
        }
        if let Some(c) = ceiling {
            if min > c {
                return false;
            }
        }
        true
    }

    fn enrich(&self, snapshot: &Dataset, job: &JobRecord, score: f64) -> SearchResult {
        let salary = snapshot
            .salaries
            .resolve(&job.title_norm, &job.city, &job.country_code);
        let badge = match &salary {
            Some(est) => snapshot.salaries.delta_badge(
                &job.title_norm,
                est,
                &job.country_code,
                self.config.near_pct,
                self.config.far_pct,
            ),
            None => DeltaBadge::Unavailable,
        };
        SearchResult {
            job: job.clone(),
            salary,
            badge,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FallbackLevel, SalaryRecord};
    use crate::normalize::normalize_title;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn job(id: &str, title: &str, city: &str, country_code: &str, posted: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            title: title.to_string(),
            title_norm: normalize_title(title),
            company: "Acme".to_string(),
            city: city.to_string(),
            country: country_code.to_string(),
            country_code: country_code.to_string(),
            posted: NaiveDate::parse_from_str(posted, "%Y-%m-%d").ok(),
            url: None,
            snippet: title.to_string(),
            pay_min: None,
            pay_max: None,
        }
    }

    fn salary(title: &str, city: Option<&str>, country: Option<&str>, amount: i64) -> SalaryRecord {
        SalaryRecord {
            title_norm: normalize_title(title),
            city: city.map(|c| c.to_lowercase()),
            country_code: country.map(|c| c.to_string()),
            currency: "EUR".to_string(),
            amount,
            sample_size: None,
        }
    }

    fn engine(jobs: Vec<JobRecord>, salaries: &[SalaryRecord]) -> SearchEngine {
        let store = Arc::new(DatasetStore::new());
        store.publish(jobs, salaries);
        SearchEngine::with_store(store, EngineConfig::default())
    }

    #[test]
    fn test_synonym_query_end_to_end() {
        let e = engine(
            vec![
                job("1", "Software Engineer", "Berlin", "DE", "2026-05-01"),
                job("2", "Head of Marketing", "Berlin", "DE", "2026-05-01"),
            ],
            &[],
        );
        let page = e.search("swe", None, 0);
        assert_eq!(page.total, 1);
        assert_eq!(page.results[0].job.id, "1");
        assert!(page.results[0].score >= 0.95);
    }

    #[test]
    fn test_country_filter_is_hard() {
        let e = engine(
            vec![
                job("1", "Engineer", "Berlin", "DE", "2026-05-01"),
                job("2", "Engineer", "Paris", "FR", "2026-05-01"),
            ],
            &[],
        );
        let page = e.search("engineer", Some("Germany"), 0);
        assert_eq!(page.total, 1);
        assert_eq!(page.results[0].job.country_code, "DE");
    }

    #[test]
    fn test_berlin_city_over_country_enrichment() {
        let e = engine(
            vec![job("1", "Software Engineer", "Berlin", "DE", "2026-05-01")],
            &[
                salary("software engineer", Some("Berlin"), Some("DE"), 70_000),
                salary("software engineer", None, Some("DE"), 60_000),
            ],
        );
        let page = e.search("software engineer", None, 0);
        let r = &page.results[0];
        let est = r.salary.as_ref().unwrap();
        assert_eq!(est.amount, 70_000);
        assert_eq!(est.currency, "EUR");
        assert_eq!(est.level, FallbackLevel::City);
        // +16.7% over the 60k country reference
        assert_eq!(r.badge, DeltaBadge::MuchAbove);
    }

    #[test]
    fn test_no_salary_data_is_not_an_error() {
        let e = engine(vec![job("1", "Engineer", "Berlin", "DE", "2026-05-01")], &[]);
        let page = e.search("engineer", None, 0);
        assert_eq!(page.total, 1);
        assert!(page.results[0].salary.is_none());
        assert_eq!(page.results[0].badge, DeltaBadge::Unavailable);
    }

    #[test]
    fn test_pagination_totality() {
        let jobs: Vec<JobRecord> = (0..25)
            .map(|i| job(&format!("{:03}", i), "Engineer", "Berlin", "DE", "2026-05-01"))
            .collect();
        let store = Arc::new(DatasetStore::new());
        store.publish(jobs, &[]);
        let config = EngineConfig {
            per_page: 10,
            ..EngineConfig::default()
        };
        let e = SearchEngine::with_store(store, config);

        let mut seen = HashSet::new();
        let mut collected = 0;
        let first = e.search("engineer", None, 0);
        assert_eq!(first.total, 25);
        assert_eq!(first.pages, 3);
        for p in 0..first.pages {
            let page = e.search("engineer", None, p as i64);
            assert_eq!(page.total, 25);
            collected += page.results.len();
            for r in &page.results {
                assert!(seen.insert(r.job.id.clone()), "duplicate {}", r.job.id);
            }
        }
        assert_eq!(collected, 25);
    }

    #[test]
    fn test_out_of_range_pages_are_empty_not_errors() {
        let e = engine(vec![job("1", "Engineer", "Berlin", "DE", "2026-05-01")], &[]);
        for p in [-1, -100, 1, 99] {
            let page = e.search("engineer", None, p);
            assert!(page.results.is_empty(), "page {} not empty", p);
            assert_eq!(page.total, 1);
        }
    }

    #[test]
    fn test_ranking_tiebreak_by_date_then_id() {
        let e = engine(
            vec![
                job("b", "Engineer", "Berlin", "DE", "2026-01-01"),
                job("a", "Engineer", "Berlin", "DE", "2026-01-01"),
                job("c", "Engineer", "Berlin", "DE", "2026-06-01"),
            ],
            &[],
        );
        let page = e.search("engineer", None, 0);
        let ids: Vec<&str> = page.results.iter().map(|r| r.job.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_salary_constraint_in_query() {
        let mut cheap = job("1", "Engineer", "Berlin", "DE", "2026-05-01");
        cheap.pay_min = Some(40_000);
        cheap.pay_max = Some(55_000);
        let mut rich = job("2", "Engineer", "Berlin", "DE", "2026-05-01");
        rich.pay_min = Some(80_000);
        rich.pay_max = Some(100_000);

        let e = engine(vec![cheap, rich], &[]);
        let page = e.search("engineer >70k", None, 0);
        assert_eq!(page.total, 1);
        assert_eq!(page.results[0].job.id, "2");
    }

    #[test]
    fn test_salary_constraint_uses_reference_when_posting_silent() {
        let e = engine(
            vec![job("1", "Engineer", "Berlin", "DE", "2026-05-01")],
            &[salary("engineer", None, Some("DE"), 60_000)],
        );
        assert_eq!(e.search("engineer >50k", None, 0).total, 1);
        assert_eq!(e.search("engineer >70k", None, 0).total, 0);
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let e = engine(
            vec![
                job("1", "Engineer", "Berlin", "DE", "2026-05-01"),
                job("2", "Florist", "Paris", "FR", "2026-05-01"),
            ],
            &[],
        );
        assert_eq!(e.search("", None, 0).total, 2);
    }

    #[test]
    fn test_empty_store_serves_empty_page() {
        let e = SearchEngine::with_store(Arc::new(DatasetStore::new()), EngineConfig::default());
        let page = e.search("engineer", None, 0);
        assert_eq!(page.total, 0);
        assert_eq!(page.generation, 0);
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_query_snapshot_is_stable_across_publish() {
        let store = Arc::new(DatasetStore::new());
        store.publish(vec![job("1", "Engineer", "Berlin", "DE", "2026-05-01")], &[]);
        let e = SearchEngine::with_store(store.clone(), EngineConfig::default());

        let snap = store.snapshot();
        store.publish(
            vec![
                job("1", "Engineer", "Berlin", "DE", "2026-05-01"),
                job("2", "Engineer", "Paris", "FR", "2026-05-01"),
            ],
            &[],
        );
        // the held snapshot is still generation 1 in full
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.jobs.len(), 1);
        // a new query sees generation 2
        assert_eq!(e.search("engineer", None, 0).generation, 2);
    }
}
