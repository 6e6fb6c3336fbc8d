//! End-to-end tests: the access library talking to the API service over HTTP

use access::error::{LoadError, StoreError};
use access::models::{
    AccessLevel, Dashboard, NewStaffMember, RoleAssignment, RoleKey, StaffId, StaffStatus,
};
use access::{
    Catalog, GateState, Guard, HttpDirectory, Identity, InMemoryDirectory, PermissionStore,
};
use api::middleware::{Claims, TokenVerifier};
use api::{AppState, create_router};
use common::error::BackendError;
use common::retry::RetryPolicy;
use jsonwebtoken::{EncodingKey, Header};
use std::time::Duration;
use tokio::net::TcpListener;

const SECRET: &str = "integration-secret";

async fn spawn_service() -> (String, AppState) {
    let store = PermissionStore::new(
        InMemoryDirectory::sample(),
        Catalog::school(),
        RetryPolicy::default(),
    );
    store
        .load(Identity::new("api-service", "api-service@school.local", "admin"))
        .await
        .expect("service store should load");

    let state = AppState::new(store, TokenVerifier::hs256(SECRET));
    let app = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let address = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });

    (format!("http://{}", address), state)
}

fn token(identity: &Identity) -> String {
    let claims = Claims {
        sub: identity.id.to_string(),
        email: identity.email.clone(),
        role: identity.role.clone(),
        exp: chrono::Utc::now().timestamp() as u64 + 3600,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token should encode")
}

fn client_store(base_url: &str, token: Option<String>) -> PermissionStore<HttpDirectory> {
    let directory = HttpDirectory::new(base_url, token, Duration::from_secs(5))
        .expect("client should build");
    let retry = RetryPolicy {
        timeout: Duration::from_secs(5),
        max_retries: 1,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(10),
    };
    PermissionStore::new(directory, Catalog::school(), retry)
}

fn librarian() -> Identity {
    Identity::new("staff-library", "librarian@school.edu", "staff")
}

fn admin() -> Identity {
    Identity::new("staff-admin", "admin@school.edu", "admin")
}

#[tokio::test]
async fn test_health_check() {
    let (base_url, _) = spawn_service().await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base_url))
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("body should be json");

    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_librarian_loads_own_record_and_assignments() {
    let (base_url, _) = spawn_service().await;
    let identity = librarian();
    let store = client_store(&base_url, Some(token(&identity)));

    store.load(identity).await.expect("load should succeed");

    let staff = store.staff_members();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].id, StaffId::from("staff-library"));
    assert_eq!(
        store.snapshot().role_assignments(),
        &[RoleAssignment::new("librarian", AccessLevel::Edit)]
    );

    let status = store.status();
    let evaluator = store.evaluator();
    assert_eq!(
        Guard::dashboard(&status, &evaluator, Dashboard::Library).state(),
        GateState::FullAccess
    );
    assert_eq!(
        Guard::dashboard(&status, &evaluator, Dashboard::Transport).state(),
        GateState::Denied
    );
    assert!(evaluator.has_feature_permission("library.issue_books"));
    assert!(!evaluator.has_feature_permission("inventory.manage_inventory"));
}

#[tokio::test]
async fn test_missing_token_fails_the_load() {
    let (base_url, _) = spawn_service().await;
    let store = client_store(&base_url, None);

    let result = store.load(librarian()).await;

    assert!(matches!(
        result,
        Err(LoadError::Staff(BackendError::Status { status: 401, .. }))
    ));
    assert!(store.error().is_some());
    assert!(!store.evaluator().has_permission("view_library_dashboard"));
}

#[tokio::test]
async fn test_admin_manages_staff_through_the_service() {
    let (base_url, state) = spawn_service().await;
    let identity = admin();
    let store = client_store(&base_url, Some(token(&identity)));
    store.load(identity).await.expect("load should succeed");
    assert_eq!(store.staff_members().len(), 5);

    let added = store
        .add_staff_member(NewStaffMember {
            name: "Tomas Varga".to_string(),
            email: "pe@school.edu".to_string(),
            department: "Sports".to_string(),
            role: "PT Teacher".to_string(),
            assigned_roles: vec![RoleKey::from("pt_teacher")],
            join_date: None,
            status: StaffStatus::Active,
        })
        .await
        .expect("add should succeed");
    assert_eq!(state.store.find_by_email("pe@school.edu"), Some(added.clone()));

    let assignments = vec![RoleAssignment::new("pt_teacher", AccessLevel::Edit)];
    store
        .update_role_assignments(&added.id, assignments.clone())
        .await
        .expect("assignment update should succeed");
    assert_eq!(
        state
            .store
            .fetch_role_assignments(&added.id)
            .await
            .expect("fetch should succeed"),
        assignments
    );

    store
        .remove_staff_member(&added.id)
        .await
        .expect("remove should succeed");
    assert!(state.store.get_staff_member(&added.id).is_none());
    assert!(store.get_staff_member(&added.id).is_none());
}

#[tokio::test]
async fn test_librarian_cannot_change_permissions() {
    let (base_url, state) = spawn_service().await;
    let identity = librarian();
    let store = client_store(&base_url, Some(token(&identity)));
    store.load(identity).await.expect("load should succeed");
    let before = store.snapshot();
    let id = StaffId::from("staff-library");

    let result = store
        .update_assigned_roles(&id, vec![RoleKey::from("admin")])
        .await;

    assert!(matches!(
        result,
        Err(StoreError::Backend(BackendError::Status { status: 403, .. }))
    ));
    assert_eq!(store.snapshot(), before);
    assert_eq!(
        state
            .store
            .get_staff_member(&id)
            .map(|member| member.assigned_roles),
        Some(vec![RoleKey::from("librarian")])
    );

    let other = store
        .fetch_role_assignments(&StaffId::from("staff-events"))
        .await;
    assert!(matches!(
        other,
        Err(LoadError::Permissions {
            source: BackendError::Status { status: 403, .. },
            ..
        })
    ));
}

#[tokio::test]
async fn test_access_summary() {
    let (base_url, _) = spawn_service().await;
    let identity = Identity::new("staff-events", "events@school.edu", "staff");

    let response = reqwest::Client::new()
        .get(format!("{}/access/me", base_url))
        .bearer_auth(token(&identity))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("body should be json");
    let summary = &body["data"];
    assert_eq!(summary["superuser"], false);
    assert_eq!(summary["dashboards"]["events"], "full_access");
    assert_eq!(summary["dashboards"]["soft_skills"], "view_only");
    assert_eq!(summary["dashboards"]["transport"], "denied");
    assert_eq!(summary["features"]["events.manage_events"], true);
    assert_eq!(summary["features"]["transport.manage_routes"], false);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (base_url, _) = spawn_service().await;

    let response = reqwest::Client::new()
        .get(format!("{}/admin/roles", base_url))
        .bearer_auth("not-a-token")
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
