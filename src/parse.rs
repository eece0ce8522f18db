//! Row parsing for the tabular job and salary sources.
//!
//! Sources are field-delimited text with a header row; the delimiter is
//! sniffed from the header. Column names vary across exports, so each field
//! is looked up through a small alias list, the way the upstream feeds
//! actually arrive.

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EngineError, EngineResult};
use crate::models::{JobRecord, SalaryRecord};
use crate::normalize::{extract_country_code, normalize_country, normalize_title, UNKNOWN_COUNTRY};

const DELIMITERS: [char; 4] = ['\t', ',', ';', '|'];

/// Picks the delimiter that occurs most often in the header line.
/// Tab wins ties since the upstream exports default to TSV.
pub fn sniff_delimiter(header: &str) -> char {
    let mut best = '\t';
    let mut best_count = 0;
    for d in DELIMITERS {
        let count = header.matches(d).count();
        if count > best_count {
            best = d;
            best_count = count;
        }
    }
    best
}

/// Splits one row on the delimiter, honoring double quotes: a field wrapped
/// in quotes keeps delimiters inside it literal, `""` is an escaped quote.
/// Quotes that don't open a field are kept as-is.
fn split_row(line: &str, delim: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() {
            in_quotes = true;
        } else if c == delim {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }
    fields.push(field);
    fields
}

struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    fn parse(line: &str, delim: char) -> Self {
        let columns = split_row(line, delim)
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Self { columns }
    }

    fn index(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|a| self.columns.get(*a))
            .copied()
    }

    fn get<'a>(&self, fields: &'a [String], aliases: &[&str]) -> &'a str {
        self.index(aliases)
            .and_then(|i| fields.get(i))
            .map(|f| f.trim())
            .unwrap_or("")
    }
}

/// Parses the jobs source. Rows with neither a title nor a company are
/// skipped; a missing or unmappable header is a parse error.
pub fn parse_jobs(text: &str) -> EngineResult<Vec<JobRecord>> {
    let mut lines = text.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| EngineError::parse("jobs source is empty"))?;
    let delim = sniff_delimiter(header_line);
    let header = Header::parse(header_line, delim);

    if header.index(&["jobtitle", "title"]).is_none() {
        return Err(EngineError::parse("jobs header has no title column"));
    }

    let mut jobs = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(line, delim);

        let title = header.get(&fields, &["jobtitle", "title"]);
        let company = header.get(&fields, &["companyname", "company"]);
        if title.is_empty() && company.is_empty() {
            continue;
        }

        let city = header.get(&fields, &["city"]);
        let country_raw = header.get(&fields, &["country"]);
        let location = {
            let loc = header.get(&fields, &["location"]);
            if !loc.is_empty() {
                loc.to_string()
            } else {
                [city, country_raw]
                    .iter()
                    .filter(|p| !p.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };

        let mut country_code = extract_country_code(&location);
        if country_code == UNKNOWN_COUNTRY && !country_raw.is_empty() {
            country_code = normalize_country(country_raw);
        }

        let date_raw = header.get(&fields, &["createdat", "dateposted", "posted"]);
        let posted = parse_date(date_raw);

        let salary_text = header.get(&fields, &["salary"]);
        let (pay_min, pay_max) = parse_salary_range(salary_text);

        let snippet = {
            let desc = header.get(&fields, &["description", "summary", "normalizedjob"]);
            if desc.is_empty() { title } else { desc }
        };

        let url = header.get(&fields, &["url", "sourceurl", "link"]);
        let id = {
            let raw = header.get(&fields, &["jobid", "id"]);
            if raw.is_empty() {
                (line_no + 1).to_string()
            } else {
                raw.to_string()
            }
        };

        jobs.push(JobRecord {
            id,
            title: title.to_string(),
            title_norm: normalize_title(title),
            company: company.to_string(),
            city: city.to_string(),
            country: country_raw.to_string(),
            country_code,
            posted,
            url: if url.is_empty() { None } else { Some(url.to_string()) },
            snippet: snippet.to_string(),
            pay_min,
            pay_max,
        });
    }
    Ok(jobs)
}

/// Parses the salary reference source. A `*` or empty city/country marks the
/// row as broader-scoped; rows without a title or amount are skipped.
pub fn parse_salaries(text: &str) -> EngineResult<Vec<SalaryRecord>> {
    let mut lines = text.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| EngineError::parse("salary source is empty"))?;
    let delim = sniff_delimiter(header_line);
    let header = Header::parse(header_line, delim);

    let mut out = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(line, delim);

        let title = header.get(&fields, &["jobtitle", "title", "normalizedjob"]);
        if title.is_empty() {
            continue;
        }
        let amount = match parse_money(header.get(&fields, &["mediansalary", "amount", "salary"])) {
            Some(a) => a,
            None => continue,
        };

        let city = scope_field(header.get(&fields, &["city"]));
        let country = scope_field(header.get(&fields, &["country"])).map(|c| normalize_country(&c));

        let currency = header
            .get(&fields, &["currencyticker", "currency"])
            .to_uppercase();
        let sample_size = header
            .get(&fields, &["samplesize", "samples", "count"])
            .parse()
            .ok();

        out.push(SalaryRecord {
            title_norm: normalize_title(title),
            city: city.map(|c| c.to_lowercase()),
            country_code: country,
            currency,
            amount,
            sample_size,
        });
    }
    Ok(out)
}

fn scope_field(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() || t == "*" || t == "-" {
        None
    } else {
        Some(t.to_string())
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Date fields arrive with trailing noise ("2026-05-01T09:00:00", free
    // text); keep the first ten chars, not bytes, so multi-byte input cannot
    // split a char boundary.
    let head: String = raw.chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d").ok()
}

static MONEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\d[\d,.\s]*k?").unwrap());
static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d[\d,.\s]*k?)\s*[-–]\s*(\d[\d,.\s]*k?)").unwrap());
static FLOOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)>\s*=?\s*(\d[\d,.\s]*k?)").unwrap());
static CEIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<\s*=?\s*(\d[\d,.\s]*k?)").unwrap());
static BARE_K_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d[\d,.\s]*k)\b").unwrap());

/// Parses one money figure: `70000`, `70,000`, `70 000`, `70k`.
pub fn parse_money(raw: &str) -> Option<i64> {
    let clean = raw.trim().to_lowercase().replace([',', ' '], "");
    if clean.is_empty() {
        return None;
    }
    let (digits, mult) = match clean.strip_suffix('k') {
        Some(rest) => (rest, 1000),
        None => (clean.as_str(), 1),
    };
    // "70.5" style decimals in salary text are noise; keep the integer part.
    let digits = digits.split('.').next().unwrap_or("");
    digits.parse::<i64>().ok().map(|n| n * mult)
}

/// All money figures in a blob of text, as (min, max-if-more-than-one).
pub fn parse_salary_range(text: &str) -> (Option<i64>, Option<i64>) {
    let nums: Vec<i64> = MONEY_RE
        .find_iter(text)
        .filter_map(|m| parse_money(m.as_str()))
        .collect();
    match nums.len() {
        0 => (None, None),
        1 => (Some(nums[0]), None),
        _ => (nums.iter().min().copied(), nums.iter().max().copied()),
    }
}

/// Mines salary constraints out of a free-text query, returning the cleaned
/// query plus an optional floor and ceiling. Understands `70k-90k`, `>50k`,
/// `<120k` and a bare `90k`.
pub fn parse_salary_query(query: &str) -> (String, Option<i64>, Option<i64>) {
    let q = query.trim();
    if q.is_empty() {
        return (String::new(), None, None);
    }

    if let Some(caps) = RANGE_RE.captures(q) {
        let low = parse_money(&caps[1]);
        let high = parse_money(&caps[2]);
        return (strip_match(q, caps.get(0).unwrap()), low, high);
    }
    if let Some(caps) = FLOOR_RE.captures(q) {
        let floor = parse_money(&caps[1]);
        return (strip_match(q, caps.get(0).unwrap()), floor, None);
    }
    if let Some(caps) = CEIL_RE.captures(q) {
        let ceiling = parse_money(&caps[1]);
        return (strip_match(q, caps.get(0).unwrap()), None, ceiling);
    }
    // Only figures with an explicit k suffix count as bare constraints, so
    // queries like "engineer ii" or "365 platform" survive intact.
    if let Some(caps) = BARE_K_RE.captures(q) {
        let floor = parse_money(&caps[1]);
        return (strip_match(q, caps.get(0).unwrap()), floor, None);
    }
    (q.to_string(), None, None)
}

fn strip_match(q: &str, m: regex::Match) -> String {
    let mut s = String::with_capacity(q.len());
    s.push_str(&q[..m.start()]);
    s.push(' ');
    s.push_str(&q[m.end()..]);
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
