//! Visitor statistics: page-visit tracking and the admin summary.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ip::IpResolver;
use crate::models::VisitRow;
use crate::store::ContentStore;

/// Sample size for the average-duration figure.
const DURATION_SAMPLE: u32 = 100;
/// A visitor counts as active when their visit started within this window
/// and has not been closed.
const ACTIVE_WINDOW_MINUTES: i64 = 5;

/// Daily totals for the trailing week, oldest day first.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklySeries {
    pub labels: Vec<&'static str>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitorSummary {
    pub today_visitors: u64,
    pub average_duration_secs: i64,
    pub active_visitors: u64,
    pub weekly: WeeklySeries,
}

/// Records visits and exits and builds the summary shown on the admin
/// dashboard.
pub struct VisitorTracker<S, I> {
    store: Arc<S>,
    ip: Arc<I>,
}

impl<S: ContentStore, I: IpResolver> VisitorTracker<S, I> {
    pub fn new(store: Arc<S>, ip: Arc<I>) -> Self {
        Self { store, ip }
    }

    /// Record a page visit for the current visitor. An unresolvable IP is
    /// logged and swallowed; visit tracking must never break the page.
    pub async fn record_visit(&self, page: &str) -> Result<Option<VisitRow>> {
        let ip = match self.ip.resolve().await {
            Ok(ip) if !ip.trim().is_empty() => ip,
            Ok(_) => {
                warn!(page, "ip service returned a blank address, visit not recorded");
                return Ok(None);
            }
            Err(e) => {
                warn!(page, error = %e, "could not resolve visitor ip, visit not recorded");
                return Ok(None);
            }
        };
        let row = self.store.insert_visit(&ip, page).await?;
        debug!(page, visit_id = row.id, "visit recorded");
        Ok(Some(row))
    }

    /// Close the visitor's newest open visit with a whole-second duration.
    /// A no-op when no open visit exists.
    pub async fn record_exit(&self, ip: &str) -> Result<Option<VisitRow>> {
        let Some(mut open) = self.store.latest_open_visit(ip).await? else {
            return Ok(None);
        };
        let now = Utc::now();
        let duration = (now - open.visit_time).num_seconds().max(0);
        self.store.close_visit(open.id, now, duration).await?;
        open.exit_time = Some(now);
        open.duration = Some(duration);
        Ok(Some(open))
    }

    pub async fn summary(&self) -> Result<VisitorSummary> {
        self.summary_at(Utc::now()).await
    }

    /// Summary relative to an explicit clock, so tests do not depend on
    /// wall time.
    pub async fn summary_at(&self, now: DateTime<Utc>) -> Result<VisitorSummary> {
        let today = now.date_naive();
        let today_visitors = self.store.count_visits_on(today).await?;

        let durations = self.store.recent_durations(DURATION_SAMPLE).await?;
        let average_duration_secs = mean_duration(&durations);

        let cutoff = now - Duration::minutes(ACTIVE_WINDOW_MINUTES);
        let active_visitors = self.store.count_active_since(cutoff).await?;

        let mut labels = Vec::with_capacity(7);
        let mut counts = Vec::with_capacity(7);
        for offset in (0..7i64).rev() {
            let day = today - Duration::days(offset);
            labels.push(weekday_label(day.weekday()));
            counts.push(self.store.count_visits_on(day).await?);
        }

        Ok(VisitorSummary {
            today_visitors,
            average_duration_secs,
            active_visitors,
            weekly: WeeklySeries { labels, counts },
        })
    }
}

/// Mean of the samples, rounded to the nearest second. Empty input means
/// no closed visits yet and yields 0.
fn mean_duration(samples: &[i64]) -> i64 {
    if samples.is_empty() {
        return 0;
    }
    let sum: i64 = samples.iter().sum();
    (sum as f64 / samples.len() as f64).round() as i64
}

/// Indonesian short weekday labels, as shown on the dashboard chart.
fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Min",
        Weekday::Mon => "Sen",
        Weekday::Tue => "Sel",
        Weekday::Wed => "Rab",
        Weekday::Thu => "Kam",
        Weekday::Fri => "Jum",
        Weekday::Sat => "Sab",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::StaticIpResolver;
    use crate::store::MockStore;
    use chrono::NaiveDate;

    fn visit(id: i64, ip: &str, time: DateTime<Utc>, duration: Option<i64>) -> VisitRow {
        VisitRow {
            id,
            ip_address: ip.to_string(),
            page_visited: "/".to_string(),
            visit_time: time,
            visit_date: time.date_naive(),
            exit_time: duration.map(|d| time + Duration::seconds(d)),
            duration,
        }
    }

    fn tracker(store: MockStore) -> VisitorTracker<MockStore, StaticIpResolver> {
        VisitorTracker::new(Arc::new(store), Arc::new(StaticIpResolver::new("203.0.113.9")))
    }

    #[test]
    fn test_mean_duration_empty_is_zero() {
        assert_eq!(mean_duration(&[]), 0);
    }

    #[test]
    fn test_mean_duration_rounds() {
        assert_eq!(mean_duration(&[10, 11]), 11); // 10.5 rounds up
        assert_eq!(mean_duration(&[10, 10, 11]), 10);
    }

    #[test]
    fn test_weekday_labels_are_indonesian() {
        assert_eq!(weekday_label(Weekday::Sun), "Min");
        assert_eq!(weekday_label(Weekday::Mon), "Sen");
        assert_eq!(weekday_label(Weekday::Sat), "Sab");
    }

    #[tokio::test]
    async fn test_record_visit_and_exit() {
        let t = tracker(MockStore::new());
        let row = t.record_visit("/agenda").await.unwrap().unwrap();
        assert_eq!(row.ip_address, "203.0.113.9");
        assert!(row.exit_time.is_none());

        let closed = t.record_exit("203.0.113.9").await.unwrap().unwrap();
        assert_eq!(closed.id, row.id);
        assert!(closed.duration.unwrap() >= 0);
        assert!(t.store.visit(row.id).unwrap().exit_time.is_some());
    }

    #[tokio::test]
    async fn test_record_exit_without_open_visit_is_noop() {
        let t = tracker(MockStore::new());
        assert!(t.record_exit("203.0.113.9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_counts_and_weekly_ordering() {
        let store = MockStore::new();
        let now = NaiveDate::from_ymd_opt(2025, 6, 7) // a Saturday
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();

        // Two visits today, one yesterday, one still open and recent.
        store.push_visit(visit(1, "10.0.0.1", now - Duration::hours(2), Some(30)));
        store.push_visit(visit(2, "10.0.0.2", now - Duration::minutes(2), None));
        store.push_visit(visit(3, "10.0.0.3", now - Duration::days(1), Some(90)));

        let t = tracker(store);
        let summary = t.summary_at(now).await.unwrap();

        assert_eq!(summary.today_visitors, 2);
        assert_eq!(summary.average_duration_secs, 60);
        assert_eq!(summary.active_visitors, 1);
        assert_eq!(
            summary.weekly.labels,
            vec!["Min", "Sen", "Sel", "Rab", "Kam", "Jum", "Sab"]
        );
        assert_eq!(summary.weekly.counts, vec![0, 0, 0, 0, 0, 1, 2]);
    }
}
