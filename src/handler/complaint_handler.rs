// src/handler/complaint_handler.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{complaintdb::ComplaintExt, userdb::UserExt},
    dtos::complaintdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::{
        complaintmodel::ComplaintPriority,
        usermodel::{User, UserRole},
    },
    service::policy::{admin_in_scope, authorize, ComplaintAction},
    AppState,
};

pub fn complaint_handler() -> Router {
    Router::new()
        .route("/", get(get_complaints).post(create_complaint))
        .route("/my-complaints", get(get_my_complaints))
        .route("/stats", get(get_stats))
        .route("/complaint-dashboard", get(get_dashboard))
        .route("/reassign", post(reassign_complaint))
        .route("/:complaint_id", get(get_complaint).delete(delete_complaint))
        .route("/:complaint_id/assign", put(assign_engineer))
        .route("/:complaint_id/status", put(update_status))
        .route("/:complaint_id/close", put(close_complaint))
        .route("/:complaint_id/verify-otp", post(verify_otp))
        .route("/:complaint_id/recomplaint", post(create_recomplaint))
        .route("/:complaint_id/status-history", get(get_status_history))
}

/// Tenant boundary for admin-side reads. `None` means unscoped (super
/// admin); `Some(vec![])` means the company has no customers yet and reads
/// must degrade to an explicit empty result, never an unscoped one.
async fn resolve_read_scope(
    app_state: &AppState,
    user: &User,
) -> Result<Option<Vec<Uuid>>, HttpError> {
    match user.role {
        UserRole::SuperAdmin => Ok(None),
        UserRole::Admin => {
            let ids = app_state
                .db_client
                .company_user_ids(user.id)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?;
            Ok(Some(ids))
        }
        _ => Err(HttpError::forbidden(
            "Only administrators can access scoped reads",
        )),
    }
}

fn empty_scope_response() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "message": "no users in company",
        "data": []
    }))
}

/// Single-record variant of the tenant boundary: a company admin may only
/// see tickets owned by customers bound to them.
async fn check_record_scope(
    app_state: &AppState,
    actor: &User,
    owner_id: Uuid,
) -> Result<(), HttpError> {
    if actor.role != UserRole::Admin {
        return Ok(());
    }
    let owner = app_state
        .db_client
        .get_user(Some(owner_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Complaint owner not found"))?;

    if !admin_in_scope(actor, &owner) {
        return Err(HttpError::forbidden(
            "Complaint belongs to another company",
        ));
    }
    Ok(())
}

pub async fn create_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateComplaintDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    authorize(&auth.user, None, ComplaintAction::Create)?;

    let target_user = match body.user_id {
        Some(user_id) if auth.user.role.is_staff() => user_id,
        Some(_) => {
            return Err(HttpError::forbidden(
                "Only staff can file a complaint on behalf of a customer",
            ))
        }
        None => auth.user.id,
    };

    let complaint = app_state
        .complaint_service
        .create_complaint(
            target_user,
            body.title,
            body.description,
            body.issue_type,
            body.phone_number,
            body.complaint_type,
            body.priority.unwrap_or(ComplaintPriority::Medium),
            body.attachments.unwrap_or_default(),
            auth.user.id,
        )
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": complaint
    })))
}

pub async fn get_complaints(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<ComplaintQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    authorize(&auth.user, None, ComplaintAction::ReadScopedAggregates)?;

    let scope = resolve_read_scope(&app_state, &auth.user).await?;
    if matches!(scope.as_deref(), Some([])) {
        return Ok(empty_scope_response().into_response());
    }

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20);
    let offset = ((page - 1) * limit) as i64;
    let limit = limit as i64;

    let complaints = app_state
        .db_client
        .get_complaints(
            scope,
            limit,
            offset,
            params.status,
            params.priority,
            params.complaint_type,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "complaints": complaints,
            "page": page,
            "limit": limit
        }
    }))
    .into_response())
}

pub async fn get_my_complaints(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let complaints = match auth.user.role {
        UserRole::Engineer => app_state
            .db_client
            .get_engineer_complaints(auth.user.id, 100, 0)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?,
        _ => app_state
            .db_client
            .get_user_complaints(auth.user.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?,
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": complaints
    })))
}

pub async fn get_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let complaint = app_state.complaint_service.get_complaint(complaint_id).await?;

    authorize(&auth.user, Some(&complaint), ComplaintAction::View)?;
    check_record_scope(&app_state, &auth.user, complaint.user_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": complaint
    })))
}

pub async fn delete_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let complaint = app_state.complaint_service.get_complaint(complaint_id).await?;

    authorize(&auth.user, Some(&complaint), ComplaintAction::Delete)?;
    check_record_scope(&app_state, &auth.user, complaint.user_id).await?;

    app_state
        .complaint_service
        .delete_complaint(complaint_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Complaint deleted"
    })))
}

pub async fn assign_engineer(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
    Json(body): Json<AssignEngineerDto>,
) -> Result<impl IntoResponse, HttpError> {
    authorize(&auth.user, None, ComplaintAction::Assign)?;

    let complaint = app_state
        .assignment_service
        .assign(complaint_id, body.engineer_id, body.priority, auth.user.id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": complaint
    })))
}

pub async fn reassign_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ReassignComplaintDto>,
) -> Result<impl IntoResponse, HttpError> {
    authorize(&auth.user, None, ComplaintAction::Reassign)?;

    let complaint = app_state
        .assignment_service
        .reassign(body.complaint_id, body.engineer_id, auth.user.id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": complaint
    })))
}

pub async fn update_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
    Json(body): Json<UpdateStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let complaint = app_state.complaint_service.get_complaint(complaint_id).await?;

    authorize(&auth.user, Some(&complaint), ComplaintAction::Transition)?;

    let updated = app_state
        .complaint_service
        .transition(
            complaint,
            body.status,
            body.notes,
            body.remark,
            body.not_resolved_reason,
            auth.user.id,
        )
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}

pub async fn close_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
    Json(body): Json<CloseComplaintDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let complaint = app_state.complaint_service.get_complaint(complaint_id).await?;

    authorize(&auth.user, Some(&complaint), ComplaintAction::Close)?;

    let updated = app_state
        .closure_service
        .close_complaint(
            complaint_id,
            body.resolution_attachments,
            body.notes,
            auth.user.id,
        )
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}

pub async fn verify_otp(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
    Json(body): Json<VerifyOtpDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let complaint = app_state.complaint_service.get_complaint(complaint_id).await?;

    authorize(&auth.user, Some(&complaint), ComplaintAction::VerifyOtp)?;

    let updated = app_state
        .closure_service
        .verify_otp(complaint_id, &body.otp, auth.user.id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}

pub async fn create_recomplaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
    Json(body): Json<RecomplaintDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let parent = app_state.complaint_service.get_complaint(complaint_id).await?;

    // Only the owner or staff may reopen an issue as a new ticket.
    authorize(&auth.user, Some(&parent), ComplaintAction::View)?;
    if !auth.user.role.is_staff() && parent.user_id != auth.user.id {
        return Err(HttpError::forbidden(
            "Only the complaint owner can reopen it",
        ));
    }

    let complaint = app_state
        .complaint_service
        .create_recomplaint(complaint_id, body.description, auth.user.id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": complaint
    })))
}

pub async fn get_status_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let complaint = app_state.complaint_service.get_complaint(complaint_id).await?;

    authorize(&auth.user, Some(&complaint), ComplaintAction::View)?;
    check_record_scope(&app_state, &auth.user, complaint.user_id).await?;

    let history = app_state
        .complaint_service
        .status_history(complaint_id)
        .await?;
    let has_engineer = app_state
        .assignment_service
        .has_engineer_assigned(&complaint)
        .await?;
    let assignments = app_state
        .assignment_service
        .engineer_assignment_history(complaint_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "history": history,
            "has_engineer_assigned": has_engineer,
            "engineer_assignments": assignments
        }
    })))
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    authorize(&auth.user, None, ComplaintAction::ReadScopedAggregates)?;

    let scope = resolve_read_scope(&app_state, &auth.user).await?;
    if matches!(scope.as_deref(), Some([])) {
        return Ok(empty_scope_response().into_response());
    }

    let stats = app_state.analytics_service.stats(scope).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": stats
    }))
    .into_response())
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    authorize(&auth.user, None, ComplaintAction::ReadScopedAggregates)?;

    let scope = resolve_read_scope(&app_state, &auth.user).await?;
    if matches!(scope.as_deref(), Some([])) {
        return Ok(empty_scope_response().into_response());
    }

    let dashboard = app_state.analytics_service.dashboard(scope).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": dashboard
    }))
    .into_response())
}
