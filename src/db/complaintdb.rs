// src/db/complaintdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::complaintmodel::*;
use crate::models::statsmodel::*;
use crate::utils::code_generator::generate_ticket_code;

const TICKET_CODE_ATTEMPTS: u32 = 5;

#[async_trait]
pub trait ComplaintExt {
    /// Inserts the complaint together with its seed history row in one
    /// transaction. The ticket code is regenerated on collision.
    #[allow(clippy::too_many_arguments)]
    async fn create_complaint(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
        issue_type: String,
        phone_number: String,
        complaint_type: ComplaintType,
        priority: ComplaintPriority,
        attachments: Vec<String>,
        parent_complaint_id: Option<Uuid>,
        created_by: Uuid,
    ) -> Result<Complaint, Error>;

    async fn get_complaint(&self, complaint_id: Uuid) -> Result<Option<Complaint>, Error>;

    /// Scoped, paginated listing. `scope = None` means an unscoped read
    /// (super admin); `Some(ids)` restricts to complaints owned by those
    /// customers.
    async fn get_complaints(
        &self,
        scope: Option<Vec<Uuid>>,
        limit: i64,
        offset: i64,
        status: Option<ComplaintStatus>,
        priority: Option<ComplaintPriority>,
        complaint_type: Option<ComplaintType>,
    ) -> Result<Vec<ComplaintWithUser>, Error>;

    async fn get_user_complaints(&self, user_id: Uuid) -> Result<Vec<Complaint>, Error>;

    async fn get_engineer_complaints(
        &self,
        engineer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Complaint>, Error>;

    /// Writes every mutable column from `complaint` and appends `history`,
    /// both inside one transaction, conditional on the row still carrying
    /// `expected_version`. Returns `None` when the version no longer matches
    /// (a concurrent transition won the race) and nothing was written.
    async fn update_complaint_guarded(
        &self,
        complaint: &Complaint,
        expected_version: i32,
        history: NewHistoryEntry,
    ) -> Result<Option<Complaint>, Error>;

    async fn get_status_history(
        &self,
        complaint_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, Error>;

    /// Assignment-tagged entries only, oldest first.
    async fn get_assignment_history(
        &self,
        complaint_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, Error>;

    async fn has_assignment_entry(&self, complaint_id: Uuid) -> Result<bool, Error>;

    async fn delete_complaint(&self, complaint_id: Uuid) -> Result<u64, Error>;

    async fn count_by_status(&self, scope: Option<Vec<Uuid>>) -> Result<Vec<StatusCountRow>, Error>;

    async fn count_by_priority(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<Vec<PriorityCountRow>, Error>;

    async fn count_by_issue_type(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<Vec<IssueTypeCountRow>, Error>;

    async fn resolution_time_stats(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<ResolutionTimeRow, Error>;

    async fn daily_counts_since(
        &self,
        scope: Option<Vec<Uuid>>,
        days: i32,
    ) -> Result<Vec<DailyCountRow>, Error>;

    async fn engineer_performance(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<Vec<EngineerPerformanceRow>, Error>;
}

fn is_ticket_code_collision(err: &Error) -> bool {
    match err {
        Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err
                    .constraint()
                    .map(|c| c.contains("ticket_code"))
                    .unwrap_or(false)
        }
        _ => false,
    }
}

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    complaint_id: Uuid,
    entry: &NewHistoryEntry,
) -> Result<StatusHistoryEntry, Error> {
    sqlx::query_as::<_, StatusHistoryEntry>(
        r#"
        INSERT INTO complaint_status_history
            (complaint_id, status, previous_status, action, remarks, metadata, changed_by, additional_info)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(complaint_id)
    .bind(entry.status)
    .bind(entry.previous_status)
    .bind(entry.action)
    .bind(entry.remarks.as_deref())
    .bind(&entry.metadata)
    .bind(entry.changed_by)
    .bind(entry.additional_info.as_deref())
    .fetch_one(&mut **tx)
    .await
}

#[async_trait]
impl ComplaintExt for DBClient {
    #[allow(clippy::too_many_arguments)]
    async fn create_complaint(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
        issue_type: String,
        phone_number: String,
        complaint_type: ComplaintType,
        priority: ComplaintPriority,
        attachments: Vec<String>,
        parent_complaint_id: Option<Uuid>,
        created_by: Uuid,
    ) -> Result<Complaint, Error> {
        let status = ComplaintStatus::Pending;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let ticket_code = generate_ticket_code(complaint_type);

            let mut tx = self.pool.begin().await?;

            let inserted = sqlx::query_as::<_, Complaint>(
                r#"
                INSERT INTO complaints
                    (ticket_code, title, description, issue_type, user_id, phone_number,
                     complaint_type, priority, status, status_color, attachments,
                     parent_complaint_id, is_recomplaint)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
                "#,
            )
            .bind(&ticket_code)
            .bind(&title)
            .bind(&description)
            .bind(&issue_type)
            .bind(user_id)
            .bind(&phone_number)
            .bind(complaint_type)
            .bind(priority)
            .bind(status)
            .bind(status.color())
            .bind(&attachments)
            .bind(parent_complaint_id)
            .bind(parent_complaint_id.is_some())
            .fetch_one(&mut *tx)
            .await;

            let complaint = match inserted {
                Ok(complaint) => complaint,
                Err(err) if is_ticket_code_collision(&err) && attempt < TICKET_CODE_ATTEMPTS => {
                    tx.rollback().await?;
                    continue;
                }
                Err(err) => return Err(err),
            };

            let entry = NewHistoryEntry {
                status,
                previous_status: None,
                action: HistoryAction::ComplaintCreated,
                remarks: None,
                metadata: serde_json::json!({ "ticket_code": ticket_code }),
                changed_by: Some(created_by),
                additional_info: None,
            };
            insert_history(&mut tx, complaint.id, &entry).await?;

            tx.commit().await?;
            return Ok(complaint);
        }
    }

    async fn get_complaint(&self, complaint_id: Uuid) -> Result<Option<Complaint>, Error> {
        let complaint = sqlx::query_as::<_, Complaint>(
            r#"
            SELECT * FROM complaints WHERE id = $1
            "#,
        )
        .bind(complaint_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(complaint)
    }

    async fn get_complaints(
        &self,
        scope: Option<Vec<Uuid>>,
        limit: i64,
        offset: i64,
        status: Option<ComplaintStatus>,
        priority: Option<ComplaintPriority>,
        complaint_type: Option<ComplaintType>,
    ) -> Result<Vec<ComplaintWithUser>, Error> {
        let complaints = sqlx::query_as::<_, ComplaintWithUser>(
            r#"
            SELECT
                c.*,
                u.name as user_name,
                u.email as user_email
            FROM complaints c
            JOIN users u ON c.user_id = u.id
            WHERE ($1::uuid[] IS NULL OR c.user_id = ANY($1))
              AND ($2::complaint_status IS NULL OR c.status = $2)
              AND ($3::complaint_priority IS NULL OR c.priority = $3)
              AND ($4::complaint_type IS NULL OR c.complaint_type = $4)
            ORDER BY c.created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(scope)
        .bind(status)
        .bind(priority)
        .bind(complaint_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(complaints)
    }

    async fn get_user_complaints(&self, user_id: Uuid) -> Result<Vec<Complaint>, Error> {
        let complaints = sqlx::query_as::<_, Complaint>(
            r#"
            SELECT * FROM complaints
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(complaints)
    }

    async fn get_engineer_complaints(
        &self,
        engineer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Complaint>, Error> {
        let complaints = sqlx::query_as::<_, Complaint>(
            r#"
            SELECT * FROM complaints
            WHERE engineer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(engineer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(complaints)
    }

    async fn update_complaint_guarded(
        &self,
        complaint: &Complaint,
        expected_version: i32,
        history: NewHistoryEntry,
    ) -> Result<Option<Complaint>, Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Complaint>(
            r#"
            UPDATE complaints SET
                status = $1,
                status_color = $2,
                priority = $3,
                engineer_id = $4,
                assigned_by = $5,
                visit_date = $6,
                resolution_date = $7,
                resolved = $8,
                not_resolved_reason = $9,
                resolution_notes = $10,
                remark = $11,
                resolution_attachments = $12,
                otp = $13,
                otp_verified = $14,
                otp_verified_at = $15,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $16 AND version = $17
            RETURNING *
            "#,
        )
        .bind(complaint.status)
        .bind(complaint.status.color())
        .bind(complaint.priority)
        .bind(complaint.engineer_id)
        .bind(complaint.assigned_by)
        .bind(complaint.visit_date)
        .bind(complaint.resolution_date)
        .bind(complaint.resolved)
        .bind(complaint.not_resolved_reason.as_deref())
        .bind(complaint.resolution_notes.as_deref())
        .bind(complaint.remark.as_deref())
        .bind(complaint.resolution_attachments.as_ref())
        .bind(complaint.otp.as_deref())
        .bind(complaint.otp_verified)
        .bind(complaint.otp_verified_at)
        .bind(complaint.id)
        .bind(expected_version)
        .fetch_optional(&mut *tx)
        .await?;

        let updated = match updated {
            Some(updated) => updated,
            None => {
                // Version moved underneath us; nothing was written.
                tx.rollback().await?;
                return Ok(None);
            }
        };

        insert_history(&mut tx, updated.id, &history).await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn get_status_history(
        &self,
        complaint_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, Error> {
        let entries = sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            SELECT * FROM complaint_status_history
            WHERE complaint_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn get_assignment_history(
        &self,
        complaint_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, Error> {
        let entries = sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            SELECT * FROM complaint_status_history
            WHERE complaint_id = $1
              AND action IN ('engineer_assigned', 'engineer_reassigned')
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn has_assignment_entry(&self, complaint_id: Uuid) -> Result<bool, Error> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM complaint_status_history
            WHERE complaint_id = $1
              AND action IN ('engineer_assigned', 'engineer_reassigned')
            LIMIT 1
            "#,
        )
        .bind(complaint_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn delete_complaint(&self, complaint_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM complaints WHERE id = $1
            "#,
        )
        .bind(complaint_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_by_status(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<Vec<StatusCountRow>, Error> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            r#"
            SELECT status, COUNT(*) as count
            FROM complaints
            WHERE ($1::uuid[] IS NULL OR user_id = ANY($1))
            GROUP BY status
            "#,
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_by_priority(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<Vec<PriorityCountRow>, Error> {
        let rows = sqlx::query_as::<_, PriorityCountRow>(
            r#"
            SELECT priority, COUNT(*) as count
            FROM complaints
            WHERE ($1::uuid[] IS NULL OR user_id = ANY($1))
            GROUP BY priority
            "#,
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_by_issue_type(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<Vec<IssueTypeCountRow>, Error> {
        let rows = sqlx::query_as::<_, IssueTypeCountRow>(
            r#"
            SELECT issue_type, COUNT(*) as count
            FROM complaints
            WHERE ($1::uuid[] IS NULL OR user_id = ANY($1))
            GROUP BY issue_type
            "#,
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn resolution_time_stats(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<ResolutionTimeRow, Error> {
        let row = sqlx::query_as::<_, ResolutionTimeRow>(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE resolved AND resolution_date IS NOT NULL) as resolved,
                (AVG(EXTRACT(EPOCH FROM (resolution_date - created_at)) / 3600.0)
                    FILTER (WHERE resolved AND resolution_date IS NOT NULL))::double precision as avg_hours,
                (MIN(EXTRACT(EPOCH FROM (resolution_date - created_at)) / 3600.0)
                    FILTER (WHERE resolved AND resolution_date IS NOT NULL))::double precision as min_hours,
                (MAX(EXTRACT(EPOCH FROM (resolution_date - created_at)) / 3600.0)
                    FILTER (WHERE resolved AND resolution_date IS NOT NULL))::double precision as max_hours
            FROM complaints
            WHERE ($1::uuid[] IS NULL OR user_id = ANY($1))
            "#,
        )
        .bind(scope)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn daily_counts_since(
        &self,
        scope: Option<Vec<Uuid>>,
        days: i32,
    ) -> Result<Vec<DailyCountRow>, Error> {
        let rows = sqlx::query_as::<_, DailyCountRow>(
            r#"
            SELECT created_at::date as day, COUNT(*) as count
            FROM complaints
            WHERE ($1::uuid[] IS NULL OR user_id = ANY($1))
              AND created_at >= CURRENT_DATE - make_interval(days => $2)
            GROUP BY created_at::date
            ORDER BY day ASC
            "#,
        )
        .bind(scope)
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn engineer_performance(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> Result<Vec<EngineerPerformanceRow>, Error> {
        let rows = sqlx::query_as::<_, EngineerPerformanceRow>(
            r#"
            SELECT
                e.id as engineer_id,
                e.name as engineer_name,
                COUNT(c.id) as assigned_count,
                COUNT(c.id) FILTER (WHERE c.resolved) as resolved_count
            FROM complaints c
            JOIN users e ON c.engineer_id = e.id
            WHERE ($1::uuid[] IS NULL OR c.user_id = ANY($1))
            GROUP BY e.id, e.name
            "#,
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
