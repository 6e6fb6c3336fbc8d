//! Role and feature based access control for the school dashboards
//!
//! This crate holds the authorization core shared by every client of the
//! school system:
//!
//! - [`store::PermissionStore`]: session state loaded from a
//!   [`directory::StaffDirectory`], mutated all-or-nothing
//! - [`evaluator::Evaluator`]: synchronous, deny-by-default queries
//! - [`guard::Guard`]: render and action gates built on the evaluator
//!
//! ```rust,no_run
//! use access::{Catalog, Guard, Identity, InMemoryDirectory, PermissionStore};
//! use access::models::Dashboard;
//! use common::retry::RetryPolicy;
//!
//! # async fn run() {
//! let store = PermissionStore::new(
//!     InMemoryDirectory::sample(),
//!     Catalog::school(),
//!     RetryPolicy::default(),
//! );
//! let _ = store
//!     .load(Identity::new("staff-library", "librarian@school.edu", "staff"))
//!     .await;
//!
//! let evaluator = store.evaluator();
//! let gate = Guard::dashboard(&store.status(), &evaluator, Dashboard::Library);
//! println!("library dashboard: {:?}", gate.state());
//! # }
//! ```

pub mod catalog;
pub mod directory;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod models;
pub mod store;
pub mod validation;

pub use catalog::Catalog;
pub use directory::{HttpDirectory, InMemoryDirectory, StaffDirectory};
pub use error::{LoadError, StoreError, StoreResult};
pub use evaluator::{AccessEvaluator, Evaluator, Resource};
pub use guard::{GateState, Guard, Rendered};
pub use models::Identity;
pub use store::{LoadOutcome, LoadStatus, PermissionSnapshot, PermissionStore};
