// src/models/statsmodel.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::complaintmodel::{ComplaintPriority, ComplaintStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusCountRow {
    pub status: ComplaintStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriorityCountRow {
    pub priority: ComplaintPriority,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueTypeCountRow {
    pub issue_type: String,
    pub count: i64,
}

/// Aggregate over resolved tickets only; hour figures are NULL when nothing
/// has been resolved yet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResolutionTimeRow {
    pub total: i64,
    pub resolved: i64,
    pub avg_hours: Option<f64>,
    pub min_hours: Option<f64>,
    pub max_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyCountRow {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EngineerPerformanceRow {
    pub engineer_id: Uuid,
    pub engineer_name: String,
    pub assigned_count: i64,
    pub resolved_count: i64,
}
