//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint: it validates the request
//! DTO, delegates to the lifecycle service, and wraps the result.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    BulkUpdateResponse, CalendarEvent, CalendarQuery, ClassListQuery, ClassListResponse,
    CreateClassRequest, CreateClassResponse, HealthResponse, InstanceDetailsQuery,
    InstanceListQuery, InstanceListResponse, InstancePageQuery, RegenerateResponse,
    UpdateClassRequest, UpdateClassResponse, UpdateClassStatusRequest, UpdateInstanceRequest,
    UpdateInstanceStatusRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{Class, ClassId, ClassInstance, InstanceId};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Class lifecycle
// =============================================================================

/// POST /v1/classes
///
/// Create a class; recurring classes get their instances materialized in
/// the same call.
pub async fn create_class(
    State(state): State<AppState>,
    Json(request): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<CreateClassResponse>), AppError> {
    let new_class = request.into_new_class()?;
    let created = state.service.create_class(new_class).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateClassResponse {
            class: created.class,
            instances: created.instances,
        }),
    ))
}

/// GET /v1/classes
pub async fn list_classes(
    State(state): State<AppState>,
    Query(query): Query<ClassListQuery>,
) -> HandlerResult<ClassListResponse> {
    let page = query.page();
    let filter = query.into_filter()?;
    let (classes, total) = state.service.list_classes(&filter, &page).await?;
    Ok(Json(ClassListResponse {
        classes,
        pagination: super::dto::PaginationDto::new(&page, total),
    }))
}

/// GET /v1/classes/{class_id}
pub async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
) -> HandlerResult<Class> {
    let class = state.service.get_class(class_id).await?;
    Ok(Json(class))
}

/// PUT /v1/classes/{class_id}
///
/// Patch a class. When the patch touches scheduling fields of an active
/// recurring class, future instances are regenerated and returned.
pub async fn update_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Json(request): Json<UpdateClassRequest>,
) -> HandlerResult<UpdateClassResponse> {
    let patch = request.into_patch()?;
    let updated = state.service.update_class(class_id, patch).await?;
    Ok(Json(UpdateClassResponse {
        class: updated.class,
        regenerated: updated.regenerated,
    }))
}

/// PATCH /v1/classes/{class_id}/status
pub async fn update_class_status(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Json(request): Json<UpdateClassStatusRequest>,
) -> HandlerResult<Class> {
    let class = state
        .service
        .update_class_status(class_id, request.status)
        .await?;
    Ok(Json(class))
}

/// DELETE /v1/classes/{class_id}
pub async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
) -> Result<StatusCode, AppError> {
    state.service.delete_class(class_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Instances
// =============================================================================

/// POST /v1/classes/{class_id}/instances/regenerate
///
/// Rebuild the future instances of a recurring class from its current
/// recurrence config, preserving modified instances.
pub async fn regenerate_instances(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
) -> HandlerResult<RegenerateResponse> {
    let instances = state.service.regenerate_instances(class_id).await?;
    let count = instances.len();
    Ok(Json(RegenerateResponse { instances, count }))
}

/// GET /v1/classes/{class_id}/instances
pub async fn instances_for_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Query(query): Query<InstancePageQuery>,
) -> HandlerResult<InstanceListResponse> {
    let page = query.page();
    let (instances, total) = state.service.instances_for_class(class_id, &page).await?;
    Ok(Json(InstanceListResponse {
        instances,
        pagination: super::dto::PaginationDto::new(&page, total),
    }))
}

/// GET /v1/instances
pub async fn list_instances(
    State(state): State<AppState>,
    Query(query): Query<InstanceListQuery>,
) -> HandlerResult<Vec<ClassInstance>> {
    let instances = state.service.list_instances(&query.into_filter()).await?;
    Ok(Json(instances))
}

/// PUT /v1/instances/{instance_id}
pub async fn update_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<InstanceId>,
    Json(request): Json<UpdateInstanceRequest>,
) -> HandlerResult<ClassInstance> {
    let patch = request.into_patch()?;
    let instance = state.service.update_instance(instance_id, patch).await?;
    Ok(Json(instance))
}

/// PATCH /v1/instances/{instance_id}/status
pub async fn update_instance_status(
    State(state): State<AppState>,
    Path(instance_id): Path<InstanceId>,
    Json(request): Json<UpdateInstanceStatusRequest>,
) -> HandlerResult<ClassInstance> {
    let instance = state
        .service
        .update_instance_status(instance_id, request.status)
        .await?;
    Ok(Json(instance))
}

/// PUT /v1/classes/{class_id}/instances/by-details
///
/// Patch a single instance located by scheduled date (and optionally start
/// time) instead of its id.
pub async fn update_instance_by_details(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Query(query): Query<InstanceDetailsQuery>,
    Json(request): Json<UpdateInstanceRequest>,
) -> HandlerResult<ClassInstance> {
    let patch = request.into_patch()?;
    let instance = state
        .service
        .update_instance_by_details(class_id, query.scheduled_date, query.start_time, patch)
        .await?;
    Ok(Json(instance))
}

/// PATCH /v1/classes/{class_id}/instances
///
/// Apply a patch to every instance of a class.
pub async fn update_all_instances(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Json(request): Json<UpdateInstanceRequest>,
) -> HandlerResult<BulkUpdateResponse> {
    let patch = request.into_patch()?;
    let modified = state.service.update_all_instances(class_id, patch).await?;
    Ok(Json(BulkUpdateResponse { modified }))
}

// =============================================================================
// Calendar
// =============================================================================

/// GET /v1/calendar
///
/// Merged chronological view of one-time classes and recurring-class
/// instances within a date range.
pub async fn calendar_view(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> HandlerResult<Vec<CalendarEvent>> {
    query.validate()?;
    let events = state.service.calendar_view(query.from, query.to).await?;
    Ok(Json(events))
}
