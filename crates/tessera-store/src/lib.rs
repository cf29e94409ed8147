//! # Tessera Store - Persistence Boundary
//!
//! **Purpose**: Define the persistence contracts the state container relies on,
//! plus a local implementation.
//!
//! - [`EnvironmentStore`]: CRUD over environments, the environment list stream
//!   and the persisted "last used environment" pointer
//! - [`WidgetStore`]: CRUD and position updates over widgets scoped to an
//!   environment
//! - [`CredentialStore`]: save/get/clear the single broker connection config
//!
//! [`LocalStore`] implements all three over in-memory tables, optionally
//! mirrored to a JSON snapshot file. Persisted widgets never carry a live
//! value; that is derived state owned by the container.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Store error types
pub mod error;

/// Local (memory + JSON snapshot) store
pub mod local;

/// Persistence traits
pub mod traits;

use std::sync::Arc;

pub use error::{StoreError, StoreResult};
pub use local::LocalStore;
pub use traits::{CredentialStore, EnvironmentStore, WidgetStore};

/// The set of persistence collaborators handed to the state container.
#[derive(Clone)]
pub struct Stores {
    /// Environment persistence
    pub environments: Arc<dyn EnvironmentStore>,
    /// Widget persistence
    pub widgets: Arc<dyn WidgetStore>,
    /// Credential persistence
    pub credentials: Arc<dyn CredentialStore>,
}

impl Stores {
    /// Use one [`LocalStore`] for every collaborator.
    pub fn local(store: Arc<LocalStore>) -> Self {
        Self {
            environments: store.clone(),
            widgets: store.clone(),
            credentials: store,
        }
    }

    /// Fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::local(Arc::new(LocalStore::in_memory()))
    }
}
