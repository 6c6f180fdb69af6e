//! Access merge layer.
//!
//! # Responsibility
//! - Combine the "owned" and "shared with me" live queries into one
//!   deduplicated list set per signed-in user.
//! - Re-subscribe or clear that set when the session changes.

pub mod feed;
pub mod merge;
