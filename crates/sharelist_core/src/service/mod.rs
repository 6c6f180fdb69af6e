//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Re-derive permission from `(session email, list members)` before
//!   every mutation.
//! - Keep callers decoupled from storage details.

pub mod error;
pub mod list_service;
pub mod member_service;
pub mod notice;
pub mod task_service;
