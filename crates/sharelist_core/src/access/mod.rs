//! Access rules for shared lists.
//!
//! # Responsibility
//! - Decide who may do what on a list, given only the list document and
//!   the caller's normalized email.
//! - Produce the member roster shown on a list page.

pub mod permission;
pub mod roster;
