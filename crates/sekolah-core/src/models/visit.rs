use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row in `visitor_stats`: a page visit, optionally closed with an
/// exit time and a whole-second duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRow {
    pub id: i64,
    pub ip_address: String,
    pub page_visited: String,
    pub visit_time: DateTime<Utc>,
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<i64>,
}
