//! Member management use-case service.
//!
//! # Invariants
//! - Only admins (owner included) may invite, re-role, or remove members.
//! - The owner is never demoted or removed, whoever asks.

use crate::access::permission::{guard_removal, guard_role_change, ListAction, PermissionError};
use crate::access::roster::{member_roster, MemberEntry};
use crate::identity::SessionUser;
use crate::model::list::{ListId, Role};
use crate::model::user::NormalizedEmail;
use crate::repo::list_repo::ListRepository;
use crate::service::error::ServiceResult;
use crate::service::list_service::{authorized_list, load_list_access};
use log::info;

pub struct MemberService<R: ListRepository> {
    repo: R,
}

impl<R: ListRepository> MemberService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Grants `role` to a typed-in email and returns its normalized form.
    pub fn invite_member(
        &self,
        user: &SessionUser,
        list_id: ListId,
        email: &str,
        role: Role,
    ) -> ServiceResult<NormalizedEmail> {
        let email = NormalizedEmail::parse_address(email)?;
        let list = authorized_list(&self.repo, user, list_id, ListAction::InviteMember)?;
        guard_role_change(&list, &email, role)?;
        self.repo.set_member_role(list_id, &email, role)?;
        info!(
            "event=member_invite module=service status=ok list_id={list_id} role={}",
            role.as_str()
        );
        Ok(email)
    }

    /// Changes the role of an existing or new member.
    pub fn change_member_role(
        &self,
        user: &SessionUser,
        list_id: ListId,
        email: &NormalizedEmail,
        role: Role,
    ) -> ServiceResult<()> {
        let list = authorized_list(&self.repo, user, list_id, ListAction::ChangeMemberRole)?;
        guard_role_change(&list, email, role)?;
        self.repo.set_member_role(list_id, email, role)?;
        Ok(())
    }

    /// Removes a member. Removing someone who is not a member succeeds.
    pub fn remove_member(
        &self,
        user: &SessionUser,
        list_id: ListId,
        email: &NormalizedEmail,
    ) -> ServiceResult<()> {
        let list = authorized_list(&self.repo, user, list_id, ListAction::RemoveMember)?;
        guard_removal(&list, email)?;
        self.repo.remove_member(list_id, email)?;
        info!("event=member_remove module=service status=ok list_id={list_id}");
        Ok(())
    }

    /// Member roster, owner first. Any member may read it.
    pub fn roster(&self, user: &SessionUser, list_id: ListId) -> ServiceResult<Vec<MemberEntry>> {
        let (list, access) = load_list_access(&self.repo, user, list_id)?;
        if !access.can_view() {
            return Err(PermissionError::NotVisible.into());
        }
        Ok(member_roster(&list))
    }
}
