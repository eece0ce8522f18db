//! Salary resolution with city -> country -> global fallback.

use std::collections::HashMap;

use crate::models::{DeltaBadge, FallbackLevel, SalaryEstimate, SalaryRecord};

#[derive(Debug, Clone, PartialEq)]
struct Figure {
    amount: i64,
    currency: String,
}

impl From<&SalaryRecord> for Figure {
    fn from(r: &SalaryRecord) -> Self {
        Self {
            amount: r.amount,
            currency: r.currency.clone(),
        }
    }
}

/// Lookup table over salary rows, keyed by scope. Built once per dataset and
/// immutable afterwards. First row wins on duplicate keys.
#[derive(Debug, Default)]
pub struct SalaryIndex {
    by_city: HashMap<(String, String), Figure>,    // (title_norm, city)
    by_country: HashMap<(String, String), Figure>, // (title_norm, country_code)
    global: HashMap<String, Figure>,               // title_norm
}

impl SalaryIndex {
    pub fn build(records: &[SalaryRecord]) -> Self {
        let mut index = Self::default();
        for r in records {
            let figure = Figure::from(r);
            match (&r.city, &r.country_code) {
                (Some(city), _) => {
                    index
                        .by_city
                        .entry((r.title_norm.clone(), city.clone()))
                        .or_insert(figure);
                }
                (None, Some(country)) => {
                    index
                        .by_country
                        .entry((r.title_norm.clone(), country.clone()))
                        .or_insert(figure);
                }
                (None, None) => {
                    index.global.entry(r.title_norm.clone()).or_insert(figure);
                }
            }
        }
        index
    }

    pub fn len(&self) -> usize {
        self.by_city.len() + self.by_country.len() + self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves an estimate for a title at the narrowest scope with data.
    /// `None` means no data at any level, which is a valid outcome.
    pub fn resolve(&self, title_norm: &str, city: &str, country_code: &str) -> Option<SalaryEstimate> {
        let city_key = (title_norm.to_string(), city.trim().to_lowercase());
        if !city_key.1.is_empty() {
            if let Some(figure) = self.by_city.get(&city_key) {
                return Some(estimate(figure, FallbackLevel::City));
            }
        }
        let country_key = (title_norm.to_string(), country_code.to_string());
        if let Some(figure) = self.by_country.get(&country_key) {
            return Some(estimate(figure, FallbackLevel::Country));
        }
        self.global
            .get(title_norm)
            .map(|figure| estimate(figure, FallbackLevel::Global))
    }

    /// The next-broader-scope figure for the same title, used as the delta
    /// reference. A global estimate has no broader scope.
    fn reference(&self, title_norm: &str, resolved_level: FallbackLevel, country_code: &str) -> Option<Figure> {
        match resolved_level {
            FallbackLevel::City => self
                .by_country
                .get(&(title_norm.to_string(), country_code.to_string()))
                .or_else(|| self.global.get(title_norm))
                .cloned(),
            FallbackLevel::Country => self.global.get(title_norm).cloned(),
            FallbackLevel::Global => None,
        }
    }

    /// Computes the badge for a resolved estimate. Mismatched currencies are
    /// never compared; they yield `Unavailable` instead of a wrong number.
    pub fn delta_badge(
        &self,
        title_norm: &str,
        resolved: &SalaryEstimate,
        country_code: &str,
        near_pct: f64,
        far_pct: f64,
    ) -> DeltaBadge {
        let reference = match self.reference(title_norm, resolved.level, country_code) {
            Some(r) => r,
            None => return DeltaBadge::Unavailable,
        };
        if reference.currency != resolved.currency || reference.amount == 0 {
            return DeltaBadge::Unavailable;
        }
        let delta = (resolved.amount - reference.amount) as f64 / reference.amount as f64;
        if delta < -far_pct {
            DeltaBadge::MuchBelow
        } else if delta < -near_pct {
            DeltaBadge::Below
        } else if delta <= near_pct {
            DeltaBadge::Near
        } else if delta <= far_pct {
            DeltaBadge::Above
        } else {
            DeltaBadge::MuchAbove
        }
    }
}

fn estimate(figure: &Figure, level: FallbackLevel) -> SalaryEstimate {
    SalaryEstimate {
        amount: figure.amount,
        currency: figure.currency.clone(),
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, city: Option<&str>, country: Option<&str>, currency: &str, amount: i64) -> SalaryRecord {
        SalaryRecord {
            title_norm: title.to_string(),
            city: city.map(|c| c.to_string()),
            country_code: country.map(|c| c.to_string()),
            currency: currency.to_string(),
            amount,
            sample_size: None,
        }
    }

    fn berlin_index() -> SalaryIndex {
        SalaryIndex::build(&[
            row("software engineer", Some("berlin"), Some("DE"), "EUR", 70_000),
            row("software engineer", None, Some("DE"), "EUR", 60_000),
            row("software engineer", None, None, "EUR", 65_000),
        ])
    }

    #[test]
    fn test_city_level_wins() {
        let index = berlin_index();
        let est = index.resolve("software engineer", "Berlin", "DE").unwrap();
        assert_eq!(est.amount, 70_000);
        assert_eq!(est.currency, "EUR");
        assert_eq!(est.level, FallbackLevel::City);
    }

    #[test]
    fn test_country_fallback() {
        let index = berlin_index();
        let est = index.resolve("software engineer", "Munich", "DE").unwrap();
        assert_eq!(est.amount, 60_000);
        assert_eq!(est.level, FallbackLevel::Country);
    }

    #[test]
    fn test_country_only_data_never_nodata() {
        let index = SalaryIndex::build(&[row("devops", None, Some("CH"), "CHF", 110_000)]);
        let est = index.resolve("devops", "Zurich", "CH").unwrap();
        assert_eq!(est.level, FallbackLevel::Country);
    }

    #[test]
    fn test_global_fallback() {
        let index = berlin_index();
        let est = index.resolve("software engineer", "Austin", "US").unwrap();
        assert_eq!(est.amount, 65_000);
        assert_eq!(est.level, FallbackLevel::Global);
    }

    #[test]
    fn test_no_data() {
        let index = berlin_index();
        assert!(index.resolve("barista", "Berlin", "DE").is_none());
    }

    #[test]
    fn test_badge_city_above_country() {
        let index = berlin_index();
        let est = index.resolve("software engineer", "berlin", "DE").unwrap();
        // 70k vs 60k reference = +16.7%
        let badge = index.delta_badge("software engineer", &est, "DE", 0.05, 0.15);
        assert_eq!(badge, DeltaBadge::MuchAbove);
    }

    #[test]
    fn test_badge_buckets() {
        let index = SalaryIndex::build(&[
            row("qa", Some("lyon"), Some("FR"), "EUR", 47_000),
            row("qa", None, Some("FR"), "EUR", 50_000),
        ]);
        let est = index.resolve("qa", "Lyon", "FR").unwrap();
        // -6% lands in Below
        assert_eq!(index.delta_badge("qa", &est, "FR", 0.05, 0.15), DeltaBadge::Below);

        let index = SalaryIndex::build(&[
            row("qa", Some("lyon"), Some("FR"), "EUR", 51_000),
            row("qa", None, Some("FR"), "EUR", 50_000),
        ]);
        let est = index.resolve("qa", "Lyon", "FR").unwrap();
        assert_eq!(index.delta_badge("qa", &est, "FR", 0.05, 0.15), DeltaBadge::Near);
    }

    #[test]
    fn test_badge_currency_mismatch_unavailable() {
        let index = SalaryIndex::build(&[
            row("qa", Some("zurich"), Some("CH"), "CHF", 100_000),
            row("qa", None, Some("CH"), "EUR", 80_000),
        ]);
        let est = index.resolve("qa", "Zurich", "CH").unwrap();
        assert_eq!(
            index.delta_badge("qa", &est, "CH", 0.05, 0.15),
            DeltaBadge::Unavailable
        );
    }

    #[test]
    fn test_badge_unavailable_without_reference() {
        let index = SalaryIndex::build(&[row("qa", None, None, "EUR", 50_000)]);
        let est = index.resolve("qa", "", "??").unwrap();
        assert_eq!(est.level, FallbackLevel::Global);
        assert_eq!(
            index.delta_badge("qa", &est, "??", 0.05, 0.15),
            DeltaBadge::Unavailable
        );
    }

    #[test]
    fn test_first_row_wins_on_duplicates() {
        let index = SalaryIndex::build(&[
            row("qa", None, Some("DE"), "EUR", 50_000),
            row("qa", None, Some("DE"), "EUR", 99_000),
        ]);
        let est = index.resolve("qa", "", "DE").unwrap();
        assert_eq!(est.amount, 50_000);
    }
}
