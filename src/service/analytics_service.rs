// services/analytics_service.rs
//
// Read-only derivations over the record store and audit trail. Everything is
// computed per request from scoped GROUP BY queries; nothing here mutates.
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{complaintdb::ComplaintExt, db::DBClient},
    models::statsmodel::*,
    service::error::ServiceError,
};

pub const TREND_DAYS: usize = 7;
pub const TOP_ENGINEERS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintStats {
    pub total: i64,
    pub resolved: i64,
    pub resolution_rate: f64,
    pub by_status: Vec<StatusCountRow>,
    pub by_priority: Vec<PriorityCountRow>,
    pub by_issue_type: Vec<IssueTypeCountRow>,
    pub avg_resolution_hours: Option<f64>,
    pub min_resolution_hours: Option<f64>,
    pub max_resolution_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineerPerformance {
    pub engineer_id: Uuid,
    pub engineer_name: String,
    pub assigned: i64,
    pub resolved: i64,
    pub resolution_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintDashboard {
    pub by_status: Vec<StatusCountRow>,
    pub by_priority: Vec<PriorityCountRow>,
    pub daily_trend: Vec<DailyCountRow>,
    pub top_engineers: Vec<EngineerPerformance>,
}

/// Expands sparse per-day counts into a fixed window ending `today`. Days
/// with no complaints appear as zero rather than being omitted.
pub fn fill_daily_trend(rows: &[DailyCountRow], today: NaiveDate, days: usize) -> Vec<DailyCountRow> {
    (0..days)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset as i64);
            let count = rows
                .iter()
                .find(|r| r.day == day)
                .map(|r| r.count)
                .unwrap_or(0);
            DailyCountRow { day, count }
        })
        .collect()
}

/// Ranks engineers by resolved/assigned ratio, resolved count breaking ties.
pub fn rank_engineers(rows: Vec<EngineerPerformanceRow>, top_n: usize) -> Vec<EngineerPerformance> {
    let mut ranked: Vec<EngineerPerformance> = rows
        .into_iter()
        .filter(|r| r.assigned_count > 0)
        .map(|r| EngineerPerformance {
            engineer_id: r.engineer_id,
            engineer_name: r.engineer_name,
            assigned: r.assigned_count,
            resolved: r.resolved_count,
            resolution_ratio: r.resolved_count as f64 / r.assigned_count as f64,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.resolution_ratio
            .partial_cmp(&a.resolution_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.resolved.cmp(&a.resolved))
    });
    ranked.truncate(top_n);
    ranked
}

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    db_client: Arc<DBClient>,
}

impl AnalyticsService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn stats(&self, scope: Option<Vec<Uuid>>) -> Result<ComplaintStats, ServiceError> {
        let by_status = self.db_client.count_by_status(scope.clone()).await?;
        let by_priority = self.db_client.count_by_priority(scope.clone()).await?;
        let by_issue_type = self.db_client.count_by_issue_type(scope.clone()).await?;
        let times = self.db_client.resolution_time_stats(scope).await?;

        let resolution_rate = if times.total > 0 {
            times.resolved as f64 / times.total as f64
        } else {
            0.0
        };

        Ok(ComplaintStats {
            total: times.total,
            resolved: times.resolved,
            resolution_rate,
            by_status,
            by_priority,
            by_issue_type,
            avg_resolution_hours: times.avg_hours,
            min_resolution_hours: times.min_hours,
            max_resolution_hours: times.max_hours,
        })
    }

    pub async fn dashboard(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<ComplaintDashboard, ServiceError> {
        let by_status = self.db_client.count_by_status(scope.clone()).await?;
        let by_priority = self.db_client.count_by_priority(scope.clone()).await?;
        let raw_trend = self
            .db_client
            .daily_counts_since(scope.clone(), TREND_DAYS as i32)
            .await?;
        let performance = self.db_client.engineer_performance(scope).await?;

        Ok(ComplaintDashboard {
            by_status,
            by_priority,
            daily_trend: fill_daily_trend(&raw_trend, Utc::now().date_naive(), TREND_DAYS),
            top_engineers: rank_engineers(performance, TOP_ENGINEERS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_is_always_seven_days_with_zero_fill() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let rows = vec![
            DailyCountRow {
                day: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
                count: 3,
            },
            DailyCountRow {
                day: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                count: 1,
            },
        ];

        let trend = fill_daily_trend(&rows, today, TREND_DAYS);
        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].day, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(trend[6].day, today);
        assert_eq!(trend[6].count, 1);
        assert_eq!(trend[4].count, 3);
        assert_eq!(trend[5].count, 0);
        assert_eq!(trend.iter().map(|r| r.count).sum::<i64>(), 4);
    }

    #[test]
    fn trend_over_empty_input_is_all_zeros() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let trend = fill_daily_trend(&[], today, TREND_DAYS);
        assert_eq!(trend.len(), 7);
        assert!(trend.iter().all(|r| r.count == 0));
    }

    #[test]
    fn engineers_rank_by_resolution_ratio() {
        let row = |name: &str, assigned: i64, resolved: i64| EngineerPerformanceRow {
            engineer_id: Uuid::new_v4(),
            engineer_name: name.to_string(),
            assigned_count: assigned,
            resolved_count: resolved,
        };

        let ranked = rank_engineers(
            vec![
                row("half", 10, 5),
                row("perfect", 4, 4),
                row("idle", 0, 0),
                row("most", 20, 18),
            ],
            2,
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].engineer_name, "perfect");
        assert_eq!(ranked[1].engineer_name, "most");
        assert!((ranked[1].resolution_ratio - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn tie_on_ratio_breaks_on_resolved_count() {
        let a = EngineerPerformanceRow {
            engineer_id: Uuid::new_v4(),
            engineer_name: "two-of-two".to_string(),
            assigned_count: 2,
            resolved_count: 2,
        };
        let b = EngineerPerformanceRow {
            engineer_id: Uuid::new_v4(),
            engineer_name: "ten-of-ten".to_string(),
            assigned_count: 10,
            resolved_count: 10,
        };
        let ranked = rank_engineers(vec![a, b], 5);
        assert_eq!(ranked[0].engineer_name, "ten-of-ten");
    }
}
