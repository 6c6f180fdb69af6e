//! Repository layer over the document store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for lists and tasks.
//! - Keep SQL details out of the permission, merge and service layers.
//!
//! # Invariants
//! - Repositories validate titles defensively even though services do too.
//! - Repository APIs return semantic errors (`ListNotFound`,
//!   `TaskNotFound`, owner guards) in addition to DB transport errors.

pub mod list_repo;
pub mod task_repo;
