//! Render and action guards
//!
//! A guard pairs the store's load status with one evaluator answer. Its
//! state moves from `Loading` to one of `Denied`, `ViewOnly` or `FullAccess`
//! and stays there until the store is loaded again.

use serde::Serialize;

use crate::error::LoadError;
use crate::evaluator::{AccessEvaluator, Resource};
use crate::models::{AccessLevel, Dashboard};
use crate::store::LoadStatus;

/// Decision state of a protected surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Loading,
    Denied,
    ViewOnly,
    FullAccess,
}

impl GateState {
    pub fn from_level(level: AccessLevel) -> Self {
        match level {
            AccessLevel::Edit => GateState::FullAccess,
            AccessLevel::View => GateState::ViewOnly,
            AccessLevel::Unauthorized => GateState::Denied,
        }
    }

    pub fn can_edit(&self) -> bool {
        matches!(self, GateState::FullAccess)
    }
}

/// What a guard shows in place of the protected content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    /// Permissions are still loading
    Loading,
    /// Full access
    Content(T),
    /// Content without edit affordances
    ReadOnly(T),
    /// Caller-supplied alternative for denied access
    Fallback(T),
    /// Locked placeholder
    Locked,
    /// Loading failed; carries a user-facing message
    LoadFailed(String),
    /// Nothing at all
    Nothing,
}

/// How a denial without fallback is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeniedDisplay {
    #[default]
    Nothing,
    Locked,
}

/// A gate over one protected surface or action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    state: GateState,
    failure: Option<LoadError>,
    denied: DeniedDisplay,
}

impl Guard {
    /// Build a guard from the load status and a deferred access answer
    ///
    /// The answer is only computed once the store is ready.
    pub fn new(status: &LoadStatus, level: impl FnOnce() -> AccessLevel) -> Self {
        let (state, failure) = match status {
            LoadStatus::Loading => (GateState::Loading, None),
            LoadStatus::Idle => (GateState::Denied, None),
            LoadStatus::Failed(e) => (GateState::Denied, Some(e.clone())),
            LoadStatus::Ready => (GateState::from_level(level()), None),
        };

        Self {
            state,
            failure,
            denied: DeniedDisplay::default(),
        }
    }

    /// Guard a whole dashboard: view-only access renders read-only content
    pub fn dashboard<E: AccessEvaluator + ?Sized>(
        status: &LoadStatus,
        evaluator: &E,
        dashboard: Dashboard,
    ) -> Self {
        Self::new(status, || {
            evaluator.access_level(&Resource::Dashboard(dashboard))
        })
    }

    /// Guard an edit action on a dashboard: view-only access is a denial
    pub fn edit<E: AccessEvaluator + ?Sized>(
        status: &LoadStatus,
        evaluator: &E,
        dashboard: Dashboard,
    ) -> Self {
        Self::new(status, || {
            match evaluator.access_level(&Resource::Dashboard(dashboard)) {
                AccessLevel::Edit => AccessLevel::Edit,
                _ => AccessLevel::Unauthorized,
            }
        })
    }

    /// Guard content behind a `category.feature` flag
    ///
    /// A malformed key is denied unless the caller is a superuser.
    pub fn feature<E: AccessEvaluator + ?Sized>(
        status: &LoadStatus,
        evaluator: &E,
        key: &str,
    ) -> Self {
        Self::new(status, || {
            if evaluator.feature_flag_str(key) {
                AccessLevel::Edit
            } else {
                AccessLevel::Unauthorized
            }
        })
    }

    /// Show a locked placeholder instead of nothing on denial
    pub fn show_locked(mut self) -> Self {
        self.denied = DeniedDisplay::Locked;
        self
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.failure.as_ref()
    }

    /// Whether an edit action may run
    pub fn allows_edit(&self) -> bool {
        self.state.can_edit()
    }

    /// Run `action` only with full access
    pub fn run<T>(&self, action: impl FnOnce() -> T) -> Option<T> {
        self.allows_edit().then(action)
    }

    /// Render `content` according to the gate state
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> Rendered<T> {
        match self.state {
            GateState::Loading => Rendered::Loading,
            GateState::FullAccess => Rendered::Content(content()),
            GateState::ViewOnly => Rendered::ReadOnly(content()),
            GateState::Denied => self.denied(),
        }
    }

    /// Like [`render`](Self::render), with `fallback` shown on denial
    pub fn render_or<T>(
        &self,
        content: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> Rendered<T> {
        match (self.state, &self.failure) {
            (GateState::Denied, None) => Rendered::Fallback(fallback()),
            _ => self.render(content),
        }
    }

    fn denied<T>(&self) -> Rendered<T> {
        if let Some(e) = &self.failure {
            return Rendered::LoadFailed(format!("Could not load permissions: {}", e));
        }
        match self.denied {
            DeniedDisplay::Nothing => Rendered::Nothing,
            DeniedDisplay::Locked => Rendered::Locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::BackendError;

    #[test]
    fn test_loading_never_evaluates() {
        let guard = Guard::new(&LoadStatus::Loading, || {
            panic!("access must not be evaluated while loading")
        });
        assert_eq!(guard.state(), GateState::Loading);
        assert_eq!(guard.render(|| "content"), Rendered::Loading);
    }

    #[test]
    fn test_states_map_to_renderings() {
        let full = Guard::new(&LoadStatus::Ready, || AccessLevel::Edit);
        assert_eq!(full.render(|| 1), Rendered::Content(1));
        assert_eq!(full.run(|| "saved"), Some("saved"));

        let view = Guard::new(&LoadStatus::Ready, || AccessLevel::View);
        assert_eq!(view.render(|| 1), Rendered::ReadOnly(1));
        assert_eq!(view.run(|| "saved"), None);

        let denied = Guard::new(&LoadStatus::Ready, || AccessLevel::Unauthorized);
        assert_eq!(denied.render(|| 1), Rendered::Nothing);
        assert_eq!(denied.clone().show_locked().render(|| 1), Rendered::Locked);
        assert_eq!(denied.render_or(|| 1, || 0), Rendered::Fallback(0));
    }

    #[test]
    fn test_failed_load_surfaces_message() {
        let error = LoadError::Staff(BackendError::Transport("connection refused".into()));
        let guard = Guard::new(&LoadStatus::Failed(error.clone()), || AccessLevel::Edit);

        assert_eq!(guard.state(), GateState::Denied);
        assert_eq!(guard.load_error(), Some(&error));
        assert!(matches!(
            guard.render_or(|| 1, || 0),
            Rendered::LoadFailed(message) if message.contains("connection refused")
        ));
    }
}
