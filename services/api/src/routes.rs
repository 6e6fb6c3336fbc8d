//! API service routes
//!
//! Every `/admin` and `/access` route runs behind [`auth_middleware`] and is
//! authorized with the same evaluator the access library hands to clients.

use access::directory::{Envelope, PermissionsDocument};
use access::models::{
    Dashboard, FeaturePermissions, NewStaffMember, RoleKey, StaffId, StaffMember,
};
use access::{AccessEvaluator, GateState, Guard, Identity};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::auth_middleware,
    state::AppState,
};

const MANAGE_STAFF: &str = "manage_staff";
const MANAGE_PERMISSIONS: &str = "manage_permissions";

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/admin/roles", get(get_roles))
        .route("/admin/staff", get(get_staff).post(create_staff))
        .route(
            "/admin/staff/:staff_id",
            put(put_staff).delete(delete_staff),
        )
        .route("/admin/staff/:staff_id/roles", put(update_roles))
        .route(
            "/admin/staff/:staff_id/permissions",
            put(update_feature_permissions),
        )
        .route(
            "/admin/permissions/:staff_id",
            get(get_permissions).put(put_permissions),
        )
        .route("/access/me", get(access_summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Fail with 403 unless `identity` holds `permission`
fn authorize(state: &AppState, identity: &Identity, permission: &str) -> ApiResult<()> {
    if state.store.evaluator_for(identity.clone()).has_permission(permission) {
        Ok(())
    } else {
        warn!("{} lacks {}", identity.email, permission);
        Err(ApiError::Forbidden)
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Role and feature catalog
pub async fn get_roles(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.store.catalog();
    Json(Envelope::new(catalog.as_ref().clone()))
}

/// Staff directory: everything for staff managers, otherwise the caller's own record
pub async fn get_staff(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> impl IntoResponse {
    let evaluator = state.store.evaluator_for(identity);
    let staff: Vec<StaffMember> = if evaluator.has_permission(MANAGE_STAFF) {
        state.store.staff_members()
    } else {
        evaluator.staff_member().cloned().into_iter().collect()
    };

    Json(Envelope::new(staff))
}

/// Add a staff member
pub async fn create_staff(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<NewStaffMember>,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, &identity, MANAGE_STAFF)?;
    let member = state.store.add_staff_member(payload).await?;

    info!("{} added staff member {}", identity.email, member.id);
    Ok((StatusCode::CREATED, Json(Envelope::new(member))))
}

/// Insert or replace a complete staff record
pub async fn put_staff(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(staff_id): Path<StaffId>,
    Json(member): Json<StaffMember>,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, &identity, MANAGE_STAFF)?;
    if member.id != staff_id {
        return Err(ApiError::BadRequest(format!(
            "Body id {} does not match path id {}",
            member.id, staff_id
        )));
    }

    let member = state.store.put_staff_member(member).await?;
    Ok(Json(Envelope::new(member)))
}

/// Remove a staff member
pub async fn delete_staff(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(staff_id): Path<StaffId>,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, &identity, MANAGE_STAFF)?;
    let member = state.store.remove_staff_member(&staff_id).await?;

    info!("{} removed staff member {}", identity.email, staff_id);
    Ok(Json(Envelope::new(member)))
}

/// Body of `PUT /admin/staff/:staff_id/roles`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolesRequest {
    pub assigned_roles: Vec<RoleKey>,
}

/// Replace the assigned roles of a staff member
pub async fn update_roles(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(staff_id): Path<StaffId>,
    Json(payload): Json<UpdateRolesRequest>,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, &identity, MANAGE_STAFF)?;
    let member = state
        .store
        .update_assigned_roles(&staff_id, payload.assigned_roles)
        .await?;

    Ok(Json(Envelope::new(member)))
}

/// Replace the feature permissions of a staff member
pub async fn update_feature_permissions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(staff_id): Path<StaffId>,
    Json(permissions): Json<FeaturePermissions>,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, &identity, MANAGE_STAFF)?;
    let member = state
        .store
        .update_feature_permissions(&staff_id, permissions)
        .await?;

    Ok(Json(Envelope::new(member)))
}

/// Role-assignment document: the caller's own, or any for permission managers
pub async fn get_permissions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(staff_id): Path<StaffId>,
) -> ApiResult<impl IntoResponse> {
    if identity.id != staff_id {
        authorize(&state, &identity, MANAGE_PERMISSIONS)?;
    }

    let role_assignments = state.store.fetch_role_assignments(&staff_id).await?;
    Ok(Json(Envelope::new(PermissionsDocument { role_assignments })))
}

/// Replace a role-assignment document
pub async fn put_permissions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(staff_id): Path<StaffId>,
    Json(document): Json<PermissionsDocument>,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, &identity, MANAGE_PERMISSIONS)?;
    let role_assignments = state
        .store
        .update_role_assignments(&staff_id, document.role_assignments)
        .await?;

    info!("{} updated role assignments of {}", identity.email, staff_id);
    Ok(Json(Envelope::new(PermissionsDocument { role_assignments })))
}

/// Resolved access of the caller
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessSummary {
    pub identity: Identity,
    pub superuser: bool,
    pub assigned_roles: Vec<RoleKey>,
    pub dashboards: BTreeMap<&'static str, GateState>,
    pub features: BTreeMap<String, bool>,
}

/// Per-dashboard gate state and feature flags of the caller
pub async fn access_summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let assignments = state.store.fetch_role_assignments(&identity.id).await?;
    let evaluator = state
        .store
        .evaluator_for(identity.clone())
        .with_role_assignments(assignments);
    let status = state.store.status();

    let dashboards = Dashboard::ALL
        .into_iter()
        .map(|dashboard| {
            let gate = Guard::dashboard(&status, &evaluator, dashboard);
            (dashboard.as_str(), gate.state())
        })
        .collect();

    let features = state
        .store
        .catalog()
        .feature_keys()
        .into_iter()
        .map(|key| {
            let granted = evaluator.feature_flag(&key);
            (key.to_string(), granted)
        })
        .collect();

    let summary = AccessSummary {
        superuser: evaluator.is_superuser(),
        assigned_roles: evaluator
            .staff_member()
            .map(|member| member.assigned_roles.clone())
            .unwrap_or_default(),
        dashboards,
        features,
        identity,
    };

    Ok(Json(Envelope::new(summary)))
}
