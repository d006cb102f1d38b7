//! Store collaborator for classes and their instances.
//!
//! The engine talks to persistence through the repository traits in
//! [`repository`]; implementations live in [`repositories`]. The in-memory
//! [`LocalRepository`] backs unit tests and local development; a production
//! deployment would add a document-store implementation behind the same
//! traits.

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod models;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
pub use models::{ClassFilter, ClassPatch, InstanceFilter, InstancePatch, Page};
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
pub use repository::{
    ClassRepository, ErrorContext, FullRepository, InstanceRepository, RepositoryError,
    RepositoryResult,
};
