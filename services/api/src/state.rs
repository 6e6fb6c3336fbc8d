//! Application state shared across handlers

use access::{InMemoryDirectory, PermissionStore};
use std::sync::Arc;

use crate::middleware::TokenVerifier;

/// Permission store served by this process
pub type Store = PermissionStore<InMemoryDirectory>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: Store, verifier: TokenVerifier) -> Self {
        Self {
            store: Arc::new(store),
            verifier: Arc::new(verifier),
        }
    }
}
