//! Member roster derived from a list document.

use crate::model::list::{Role, TodoList};
use crate::model::user::NormalizedEmail;
use serde::Serialize;

/// One row of the member roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    pub email: NormalizedEmail,
    pub role: Role,
    pub is_owner: bool,
}

/// Members of `list`, owner first, then the rest by email.
///
/// The owner is always listed as admin, even when the stored members map
/// says otherwise or lacks the owner entirely.
pub fn member_roster(list: &TodoList) -> Vec<MemberEntry> {
    let mut roster = Vec::with_capacity(list.members.len() + 1);
    roster.push(MemberEntry {
        email: list.owner_email.clone(),
        role: Role::Admin,
        is_owner: true,
    });
    roster.extend(
        list.members
            .iter()
            .filter(|(email, _)| !list.is_owner(email))
            .map(|(email, role)| MemberEntry {
                email: email.clone(),
                role: *role,
                is_owner: false,
            }),
    );
    roster
}
