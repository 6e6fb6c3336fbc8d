//! Permission store
//!
//! Holds the authorization state of one session: the staff directory, the
//! static catalog and the session identity's role-assignment document.
//! Readers take an immutable [`PermissionSnapshot`]; every mutation builds a
//! new snapshot and swaps it in only after the backend accepted the change,
//! so a failed mutation leaves the published state untouched.
//!
//! Every `load()` and `clear()` starts a new generation. Results of a load or
//! mutation started under an older generation are discarded.

use common::retry::{RetryPolicy, with_retry};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::directory::StaffDirectory;
use crate::error::{LoadError, StoreError, StoreResult};
use crate::evaluator::Evaluator;
use crate::models::{
    FeatureKey, FeaturePermissions, Identity, NewStaffMember, RoleAssignment, RoleKey, StaffId,
    StaffMember,
};
use crate::validation::{validate_department, validate_email, validate_name};

/// Progress of the last `load()`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Nothing loaded yet, or cleared
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(LoadError),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            LoadStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Whether a completed load was applied to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer `load()` or a `clear()` happened meanwhile
    Discarded,
}

/// Immutable view of the store's authorization data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSnapshot {
    identity: Option<Identity>,
    staff: Vec<StaffMember>,
    role_assignments: Vec<RoleAssignment>,
}

impl PermissionSnapshot {
    pub fn new(
        identity: Option<Identity>,
        staff: Vec<StaffMember>,
        role_assignments: Vec<RoleAssignment>,
    ) -> Self {
        Self {
            identity,
            staff,
            role_assignments,
        }
    }

    /// Identity the snapshot was loaded for
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    pub fn staff_member(&self, staff_id: &StaffId) -> Option<&StaffMember> {
        self.staff.iter().find(|m| &m.id == staff_id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&StaffMember> {
        self.staff.iter().find(|m| m.matches_email(email))
    }

    /// Role-assignment document of the session identity
    pub fn role_assignments(&self) -> &[RoleAssignment] {
        &self.role_assignments
    }

    fn upsert(&mut self, member: StaffMember) {
        match self.staff.iter_mut().find(|m| m.id == member.id) {
            Some(existing) => *existing = member,
            None => self.staff.push(member),
        }
    }

    fn remove(&mut self, staff_id: &StaffId) {
        self.staff.retain(|m| &m.id != staff_id);
    }
}

struct StoreState {
    snapshot: Arc<PermissionSnapshot>,
    status: LoadStatus,
    generation: u64,
}

/// Marks one staff member as having a mutation in flight
struct MutationGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// In-flight key reserving an email address across add and put
fn email_key(email: &str) -> String {
    format!("email:{}", email.trim().to_lowercase())
}

/// Session-scoped authorization state backed by a [`StaffDirectory`]
pub struct PermissionStore<D> {
    directory: D,
    catalog: Arc<Catalog>,
    retry: RetryPolicy,
    state: RwLock<StoreState>,
    in_flight: Mutex<HashSet<String>>,
}

impl<D: StaffDirectory> PermissionStore<D> {
    /// Create an empty store
    pub fn new(directory: D, catalog: Catalog, retry: RetryPolicy) -> Self {
        Self {
            directory,
            catalog: Arc::new(catalog),
            retry,
            state: RwLock::new(StoreState {
                snapshot: Arc::new(PermissionSnapshot::default()),
                status: LoadStatus::Idle,
                generation: 0,
            }),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    pub fn snapshot(&self) -> Arc<PermissionSnapshot> {
        self.read_state().snapshot.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.read_state().status.clone()
    }

    /// Error of the last load, if it failed
    pub fn error(&self) -> Option<LoadError> {
        self.read_state().status.error().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().status.is_loading()
    }

    /// Evaluator for the session identity
    pub fn evaluator(&self) -> Evaluator {
        let snapshot = self.snapshot();
        let identity = snapshot.identity().cloned();
        Evaluator::new(self.catalog.clone(), snapshot, identity)
    }

    /// Evaluator for another identity over the same snapshot
    pub fn evaluator_for(&self, identity: Identity) -> Evaluator {
        Evaluator::new(self.catalog.clone(), self.snapshot(), Some(identity))
    }

    pub fn get_staff_member(&self, staff_id: &StaffId) -> Option<StaffMember> {
        self.snapshot().staff_member(staff_id).cloned()
    }

    pub fn staff_members(&self) -> Vec<StaffMember> {
        self.snapshot().staff().to_vec()
    }

    pub fn find_by_email(&self, email: &str) -> Option<StaffMember> {
        self.snapshot().find_by_email(email).cloned()
    }

    /// Load the staff directory and the role assignments of `identity`
    ///
    /// While the fetch runs the store is `Loading` and answers every query
    /// with the deny-by-default result. A failure is stored on the store and
    /// returned.
    pub async fn load(&self, identity: Identity) -> Result<LoadOutcome, LoadError> {
        let generation = {
            let mut state = self.write_state();
            state.generation += 1;
            state.status = LoadStatus::Loading;
            state.snapshot = Arc::new(PermissionSnapshot::default());
            state.generation
        };
        info!("Loading permissions for {}", identity.email);

        let result = self.fetch(&identity).await;

        let mut state = self.write_state();
        if state.generation != generation {
            debug!("Discarding stale permission load for {}", identity.email);
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(snapshot) => {
                info!(
                    "Loaded {} staff records for {}",
                    snapshot.staff().len(),
                    identity.email
                );
                state.snapshot = Arc::new(snapshot);
                state.status = LoadStatus::Ready;
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                error!("Failed to load permissions for {}: {}", identity.email, e);
                state.status = LoadStatus::Failed(e.clone());
                Err(e)
            }
        }
    }

    async fn fetch(&self, identity: &Identity) -> Result<PermissionSnapshot, LoadError> {
        let staff = with_retry(&self.retry, "fetch staff", || self.directory.fetch_staff())
            .await
            .map_err(LoadError::Staff)?;

        let role_assignments = self.fetch_role_assignments(&identity.id).await?;

        let staff = staff
            .into_iter()
            .map(|member| self.normalize(member))
            .collect();

        Ok(PermissionSnapshot::new(
            Some(identity.clone()),
            staff,
            role_assignments,
        ))
    }

    /// Fetch the role-assignment document of any staff member
    pub async fn fetch_role_assignments(
        &self,
        staff_id: &StaffId,
    ) -> Result<Vec<RoleAssignment>, LoadError> {
        with_retry(&self.retry, "fetch permissions", || {
            self.directory.fetch_role_assignments(staff_id)
        })
        .await
        .map_err(|source| LoadError::Permissions {
            staff_id: staff_id.clone(),
            source,
        })
    }

    /// Drop unknown roles and features from a backend record
    fn normalize(&self, mut member: StaffMember) -> StaffMember {
        let mut seen = HashSet::new();
        member.assigned_roles.retain(|role| {
            if !self.catalog.contains_role(role.as_str()) {
                warn!("Dropping unknown role {} from {}", role, member.id);
                return false;
            }
            seen.insert(role.clone())
        });

        let (permissions, dropped) = self.catalog.normalize_features(&member.permissions);
        for key in dropped {
            warn!("Dropping unknown feature {} from {}", key, member.id);
        }
        member.permissions = permissions;
        member
    }

    /// Reset to the empty state, keeping the catalog
    pub fn clear(&self) {
        let mut state = self.write_state();
        state.generation += 1;
        state.snapshot = Arc::new(PermissionSnapshot::default());
        state.status = LoadStatus::Idle;
        info!("Permission store cleared");
    }

    fn begin(&self, key: String) -> StoreResult<MutationGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(key.clone()) {
            warn!("Rejected concurrent change for {}", key);
            return Err(StoreError::MutationInFlight(key));
        }

        Ok(MutationGuard {
            in_flight: &self.in_flight,
            key,
        })
    }

    fn current(&self) -> (u64, Arc<PermissionSnapshot>) {
        let state = self.read_state();
        (state.generation, state.snapshot.clone())
    }

    fn commit(
        &self,
        generation: u64,
        apply: impl FnOnce(&mut PermissionSnapshot) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut state = self.write_state();
        if state.generation != generation {
            warn!("Discarding change committed after a store reset");
            return Err(StoreError::Superseded);
        }

        let mut next = (*state.snapshot).clone();
        apply(&mut next)?;
        state.snapshot = Arc::new(next);
        Ok(())
    }

    /// Commit `member`, unless another member took its email meanwhile
    fn commit_member(&self, generation: u64, member: &StaffMember) -> StoreResult<()> {
        self.commit(generation, |s| {
            if s.find_by_email(&member.email).is_some_and(|other| other.id != member.id) {
                warn!("Refusing duplicate email {} for {}", member.email, member.id);
                return Err(StoreError::DuplicateEmail(member.email.clone()));
            }
            s.upsert(member.clone());
            Ok(())
        })
    }

    fn mutation_policy(&self) -> RetryPolicy {
        RetryPolicy::once(self.retry.timeout)
    }

    async fn save(&self, member: &StaffMember) -> StoreResult<()> {
        with_retry(&self.mutation_policy(), "save staff", || {
            self.directory.save_staff(member)
        })
        .await?;
        Ok(())
    }

    fn validate_roles(&self, roles: Vec<RoleKey>) -> StoreResult<Vec<RoleKey>> {
        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(roles.len());
        for role in roles {
            if !self.catalog.contains_role(role.as_str()) {
                return Err(StoreError::UnknownRole(role.to_string()));
            }
            if seen.insert(role.clone()) {
                validated.push(role);
            }
        }
        Ok(validated)
    }

    fn validate_features(&self, permissions: &FeaturePermissions) -> StoreResult<FeaturePermissions> {
        for (category, feature, _) in permissions.entries() {
            let known = FeatureKey::new(category, feature)
                .map(|key| self.catalog.contains_feature(&key))
                .unwrap_or(false);
            if !known {
                return Err(StoreError::UnknownFeature(format!("{}.{}", category, feature)));
            }
        }
        Ok(self.catalog.normalize_features(permissions).0)
    }

    fn validate_details(&self, name: &str, email: &str, department: &str) -> StoreResult<()> {
        validate_name(name)
            .and_then(|_| validate_email(email))
            .and_then(|_| validate_department(department))
            .map_err(StoreError::Validation)
    }

    /// Replace the assigned roles of one staff member
    pub async fn update_assigned_roles(
        &self,
        staff_id: &StaffId,
        roles: Vec<RoleKey>,
    ) -> StoreResult<StaffMember> {
        let roles = self.validate_roles(roles)?;
        let _guard = self.begin(staff_id.to_string())?;
        let (generation, snapshot) = self.current();

        let mut member = snapshot
            .staff_member(staff_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(staff_id.clone()))?;
        member.assigned_roles = roles;

        self.save(&member).await?;
        self.commit_member(generation, &member)?;

        info!("Updated roles of {}: {:?}", staff_id, member.assigned_roles);
        Ok(member)
    }

    /// Replace the feature permission map of one staff member
    pub async fn update_feature_permissions(
        &self,
        staff_id: &StaffId,
        permissions: FeaturePermissions,
    ) -> StoreResult<StaffMember> {
        let permissions = self.validate_features(&permissions)?;
        let _guard = self.begin(staff_id.to_string())?;
        let (generation, snapshot) = self.current();

        let mut member = snapshot
            .staff_member(staff_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(staff_id.clone()))?;
        member.permissions = permissions;

        self.save(&member).await?;
        self.commit_member(generation, &member)?;

        info!("Updated feature permissions of {}", staff_id);
        Ok(member)
    }

    /// Add a staff member with every feature flag denied
    pub async fn add_staff_member(&self, data: NewStaffMember) -> StoreResult<StaffMember> {
        self.validate_details(&data.name, &data.email, &data.department)?;
        let assigned_roles = self.validate_roles(data.assigned_roles)?;
        let _guard = self.begin(email_key(&data.email))?;
        let (generation, snapshot) = self.current();

        if snapshot.find_by_email(&data.email).is_some() {
            return Err(StoreError::DuplicateEmail(data.email));
        }

        let member = StaffMember {
            id: StaffId::generate(),
            name: data.name.trim().to_string(),
            email: data.email.trim().to_string(),
            department: data.department.trim().to_string(),
            role: data.role,
            assigned_roles,
            join_date: data
                .join_date
                .unwrap_or_else(|| chrono::Utc::now().date_naive()),
            status: data.status,
            permissions: self.catalog.denied_features(),
        };

        self.save(&member).await?;
        self.commit_member(generation, &member)?;

        info!("Added staff member {} ({})", member.id, member.email);
        Ok(member)
    }

    /// Insert or replace a complete staff record
    pub async fn put_staff_member(&self, member: StaffMember) -> StoreResult<StaffMember> {
        self.validate_details(&member.name, &member.email, &member.department)?;
        let mut member = member;
        member.assigned_roles = self.validate_roles(member.assigned_roles)?;
        member.permissions = self.validate_features(&member.permissions)?;

        let _guard = self.begin(member.id.to_string())?;
        let _email_guard = self.begin(email_key(&member.email))?;
        let (generation, snapshot) = self.current();

        if let Some(other) = snapshot.find_by_email(&member.email) {
            if other.id != member.id {
                return Err(StoreError::DuplicateEmail(member.email));
            }
        }

        self.save(&member).await?;
        self.commit_member(generation, &member)?;

        info!("Saved staff member {}", member.id);
        Ok(member)
    }

    /// Remove a staff member
    pub async fn remove_staff_member(&self, staff_id: &StaffId) -> StoreResult<StaffMember> {
        let _guard = self.begin(staff_id.to_string())?;
        let (generation, snapshot) = self.current();

        let member = snapshot
            .staff_member(staff_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(staff_id.clone()))?;

        with_retry(&self.mutation_policy(), "delete staff", || {
            self.directory.delete_staff(staff_id)
        })
        .await?;
        self.commit(generation, |s| {
            s.remove(staff_id);
            Ok(())
        })?;

        info!("Removed staff member {}", staff_id);
        Ok(member)
    }

    /// Replace the role-assignment document of one staff member
    pub async fn update_role_assignments(
        &self,
        staff_id: &StaffId,
        assignments: Vec<RoleAssignment>,
    ) -> StoreResult<Vec<RoleAssignment>> {
        for assignment in &assignments {
            if !self.catalog.contains_role(assignment.role.as_str()) {
                return Err(StoreError::UnknownRole(assignment.role.to_string()));
            }
        }

        let _guard = self.begin(staff_id.to_string())?;
        let (generation, snapshot) = self.current();

        if snapshot.staff_member(staff_id).is_none() {
            return Err(StoreError::NotFound(staff_id.clone()));
        }

        with_retry(&self.mutation_policy(), "save permissions", || {
            self.directory.save_role_assignments(staff_id, &assignments)
        })
        .await?;

        let is_session = snapshot.identity().is_some_and(|i| &i.id == staff_id);
        self.commit(generation, |s| {
            if is_session {
                s.role_assignments = assignments.clone();
            }
            Ok(())
        })?;

        info!("Updated role assignments of {}", staff_id);
        Ok(assignments)
    }
}
