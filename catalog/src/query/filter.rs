//! Multi-clause filter query assembly.
//!
//! Answers "which parents meet criteria C" where C may combine a name regex,
//! an active flag, a minimum count of active children and a time window on
//! child (or own) start times. Sports are filtered by their active events,
//! events by their active selections; the two assemblers are symmetric.
//!
//! Shape: a CTE aggregates parent rows left-joined to active children and
//! keeps those whose child count strictly exceeds the threshold (default 1).
//! A present time window adds a UNION with parents whose start timestamp
//! falls inside `[from, to]` inclusive and which the CTE did not already
//! match, with `threshold` projected as 0.
//!
//! Regexes are not validated here; a malformed pattern surfaces as a
//! database-layer error when the query executes.

use crate::model::{EventFilter, SelectionFilter, SportFilter};
use crate::query::SqlValue;

/// Positional parameter bookkeeping: owns the parameter list and hands out
/// the matching `$n` placeholder on every push.
#[derive(Default)]
struct ParamList {
    values: Vec<SqlValue>,
}

impl ParamList {
    fn push(&mut self, value: impl Into<SqlValue>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }
}

/// Build the sports filter query. Children are the sport's events; the time
/// window matches sports with an event scheduled inside it.
pub fn sports_filter_query(filter: &SportFilter) -> (String, Vec<SqlValue>) {
    let mut params = ParamList::default();

    let mut base = String::from(
        "SELECT s.id, s.name, s.slug, s.active, count(e.id) AS threshold \
         FROM sports s \
         LEFT JOIN events e ON e.sport_id = s.id AND e.active = TRUE",
    );

    let mut predicates = Vec::new();
    if let Some(pattern) = &filter.name_regex {
        predicates.push(format!("s.name ~ {}", params.push(pattern.as_str())));
    }
    if let Some(active) = filter.active {
        predicates.push(format!("s.active = {}", params.push(active)));
    }
    if !predicates.is_empty() {
        base.push_str(" WHERE ");
        base.push_str(&predicates.join(" AND "));
    }

    base.push_str(" GROUP BY s.id");
    base.push_str(&format!(
        " HAVING count(e.id) > {}",
        params.push(filter.threshold.unwrap_or(1))
    ));

    let mut window = Vec::new();
    if let Some(from) = filter.start_time_from {
        window.push(format!("e.scheduled_start >= {}", params.push(from)));
    }
    if let Some(to) = filter.start_time_to {
        window.push(format!("e.scheduled_start <= {}", params.push(to)));
    }

    if window.is_empty() {
        base.push_str(" ORDER BY id");
        return (base, params.values);
    }

    let sql = format!(
        "WITH matched AS ({base}) \
         SELECT id, name, slug, active, threshold FROM matched \
         UNION \
         SELECT s.id, s.name, s.slug, s.active, 0 AS threshold FROM sports s \
         WHERE s.id IN (SELECT e.sport_id FROM events e WHERE {window}) \
         AND s.id NOT IN (SELECT id FROM matched) \
         ORDER BY id",
        window = window.join(" AND "),
    );
    (sql, params.values)
}

/// Build the events filter query. Children are the event's selections; the
/// time window matches the event's own `scheduled_start`.
pub fn events_filter_query(filter: &EventFilter) -> (String, Vec<SqlValue>) {
    let mut params = ParamList::default();

    let mut base = String::from(
        "SELECT e.id, e.name, e.slug, e.active, count(sel.id) AS threshold \
         FROM events e \
         LEFT JOIN selections sel ON sel.event_id = e.id AND sel.active = TRUE",
    );

    let mut predicates = Vec::new();
    if let Some(pattern) = &filter.name_regex {
        predicates.push(format!("e.name ~ {}", params.push(pattern.as_str())));
    }
    if let Some(active) = filter.active {
        predicates.push(format!("e.active = {}", params.push(active)));
    }
    if !predicates.is_empty() {
        base.push_str(" WHERE ");
        base.push_str(&predicates.join(" AND "));
    }

    base.push_str(" GROUP BY e.id");
    base.push_str(&format!(
        " HAVING count(sel.id) > {}",
        params.push(filter.threshold.unwrap_or(1))
    ));

    let mut window = Vec::new();
    if let Some(from) = filter.start_time_from {
        window.push(format!("e.scheduled_start >= {}", params.push(from)));
    }
    if let Some(to) = filter.start_time_to {
        window.push(format!("e.scheduled_start <= {}", params.push(to)));
    }

    if window.is_empty() {
        base.push_str(" ORDER BY id");
        return (base, params.values);
    }

    let sql = format!(
        "WITH matched AS ({base}) \
         SELECT id, name, slug, active, threshold FROM matched \
         UNION \
         SELECT e.id, e.name, e.slug, e.active, 0 AS threshold FROM events e \
         WHERE {window} \
         AND e.id NOT IN (SELECT id FROM matched) \
         ORDER BY id",
        window = window.join(" AND "),
    );
    (sql, params.values)
}

/// Build the flat selections filter: plain predicates, no child aggregation.
pub fn selections_filter_query(filter: &SelectionFilter) -> (String, Vec<SqlValue>) {
    let mut params = ParamList::default();
    let mut sql = String::from("SELECT * FROM selections WHERE 1=1");

    if let Some(pattern) = &filter.name_regex {
        sql.push_str(&format!(" AND name ~ {}", params.push(pattern.as_str())));
    }
    if let Some(active) = filter.active {
        sql.push_str(&format!(" AND active = {}", params.push(active)));
    }

    (sql, params.values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Placeholder count must equal parameter count, numbered contiguously
    /// from $1.
    fn assert_aligned(sql: &str, params: &[SqlValue]) {
        let placeholder = regex::Regex::new(r"\$(\d+)").unwrap();
        let mut numbers: Vec<usize> = placeholder
            .captures_iter(sql)
            .map(|c| c[1].parse().unwrap())
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), params.len(), "query: {sql}");
        assert_eq!(
            numbers,
            (1..=params.len()).collect::<Vec<_>>(),
            "query: {sql}"
        );
    }

    #[test]
    fn empty_criteria_still_applies_default_threshold() {
        let (sql, params) = sports_filter_query(&SportFilter::default());
        assert!(sql.contains("HAVING count(e.id) > $1"));
        assert!(!sql.contains("WHERE"));
        assert_eq!(params, vec![SqlValue::Int(1)]);
        assert_aligned(&sql, &params);
    }

    #[test]
    fn sports_name_and_active_precede_threshold() {
        let filter = SportFilter {
            name_regex: Some("^Foot".into()),
            active: Some(true),
            threshold: Some(3),
            ..Default::default()
        };
        let (sql, params) = sports_filter_query(&filter);
        assert!(sql.contains("WHERE s.name ~ $1 AND s.active = $2"));
        assert!(sql.contains("HAVING count(e.id) > $3"));
        assert_eq!(
            params,
            vec![
                SqlValue::from("^Foot"),
                SqlValue::Bool(true),
                SqlValue::Int(3)
            ]
        );
        assert_aligned(&sql, &params);
    }

    #[test]
    fn sports_window_unions_with_cte() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let filter = SportFilter {
            start_time_from: Some(from),
            start_time_to: Some(to),
            ..Default::default()
        };
        let (sql, params) = sports_filter_query(&filter);
        assert!(sql.starts_with("WITH matched AS ("));
        assert!(sql.contains("UNION"));
        assert!(sql.contains("0 AS threshold"));
        assert!(sql.contains("e.scheduled_start >= $2 AND e.scheduled_start <= $3"));
        assert!(sql.contains("NOT IN (SELECT id FROM matched)"));
        assert_eq!(
            params,
            vec![
                SqlValue::Int(1),
                SqlValue::Timestamp(from),
                SqlValue::Timestamp(to)
            ]
        );
        assert_aligned(&sql, &params);
    }

    #[test]
    fn open_ended_window_binds_only_present_bound() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filter = EventFilter {
            start_time_from: Some(from),
            ..Default::default()
        };
        let (sql, params) = events_filter_query(&filter);
        assert!(sql.contains("e.scheduled_start >= $2"));
        assert!(!sql.contains("<="));
        assert_eq!(params.len(), 2);
        assert_aligned(&sql, &params);
    }

    #[test]
    fn events_full_criteria_ordering() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let filter = EventFilter {
            name_regex: Some("Final".into()),
            active: Some(true),
            threshold: Some(2),
            start_time_from: Some(from),
            start_time_to: Some(to),
        };
        let (sql, params) = events_filter_query(&filter);
        assert_eq!(params.len(), 5);
        assert!(sql.contains("e.name ~ $1"));
        assert!(sql.contains("e.active = $2"));
        assert!(sql.contains("HAVING count(sel.id) > $3"));
        assert!(sql.contains("e.scheduled_start >= $4"));
        assert!(sql.contains("e.scheduled_start <= $5"));
        assert_aligned(&sql, &params);
    }

    #[test]
    fn selections_filter_is_flat() {
        let filter = SelectionFilter {
            name_regex: Some("^Home".into()),
            active: Some(false),
        };
        let (sql, params) = selections_filter_query(&filter);
        assert_eq!(
            sql,
            "SELECT * FROM selections WHERE 1=1 AND name ~ $1 AND active = $2"
        );
        assert_eq!(params.len(), 2);
        assert_aligned(&sql, &params);
    }

    #[test]
    fn selections_empty_criteria() {
        let (sql, params) = selections_filter_query(&SelectionFilter::default());
        assert_eq!(sql, "SELECT * FROM selections WHERE 1=1");
        assert!(params.is_empty());
    }
}
