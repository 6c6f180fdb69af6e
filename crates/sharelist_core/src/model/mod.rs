//! Domain model for shared to-do lists.
//!
//! # Responsibility
//! - Define the canonical list/task/member shapes used by core logic.
//! - Own input normalization (emails, titles) and its validation errors.
//!
//! # Invariants
//! - Emails used as keys or in comparisons are always `NormalizedEmail`.
//! - `TodoList::member_emails` is always the key set of `members`.

pub mod list;
pub mod task;
pub mod user;
pub mod validation;
