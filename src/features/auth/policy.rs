//! Capability table for every write or restricted read in the API.
//!
//! Handlers work out how the caller relates to the target row once, then ask
//! [`authorize`] whether the `(action, relation)` pair is granted. Pairs that are
//! not listed are denied.

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Admin-only areas: user management, report triage, review moderation
    Administer,
    UpdateCategory,
    DeleteCategory,
    UpdateResource,
    DeleteResource,
    ViewUnpublishedReview,
    UpdateReview,
    DeleteReview,
    UpdateGroup,
    DeleteGroup,
    EditChatMessage,
    DeleteChatMessage,
}

impl Action {
    fn denial_message(&self) -> &'static str {
        match self {
            Action::Administer => "Admin access required",
            Action::UpdateCategory => "Only admins can update categories",
            Action::DeleteCategory => "Only admins can delete categories",
            Action::UpdateResource => "You do not have permission to update this resource",
            Action::DeleteResource => "You do not have permission to delete this resource",
            Action::ViewUnpublishedReview => "Review not found or access denied",
            Action::UpdateReview => "You cannot update this review",
            Action::DeleteReview => "You cannot delete this review",
            Action::UpdateGroup | Action::DeleteGroup => "You do not own this group",
            Action::EditChatMessage => "You can only edit your own messages",
            Action::DeleteChatMessage => {
                "You do not have permission to delete this message"
            }
        }
    }
}

/// How the caller relates to the row being acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Owner,
    /// Owns the group that contains the target (chat messages)
    GroupOwner,
    Other,
}

impl Relation {
    pub fn to_owner(user: &AuthenticatedUser, owner_id: Uuid) -> Self {
        if user.user_id == owner_id {
            Relation::Owner
        } else {
            Relation::Other
        }
    }

    /// Authorship wins over group ownership
    pub fn to_message(user: &AuthenticatedUser, author_id: Uuid, group_owner_id: Uuid) -> Self {
        if user.user_id == author_id {
            Relation::Owner
        } else if user.user_id == group_owner_id {
            Relation::GroupOwner
        } else {
            Relation::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    /// Any authenticated caller with this relation
    Allow,
    AdminOnly,
    /// Nobody, admins included
    Deny,
}

const POLICY: &[((Action, Relation), Grant)] = &[
    ((Action::Administer, Relation::Other), Grant::AdminOnly),
    ((Action::UpdateCategory, Relation::Other), Grant::AdminOnly),
    ((Action::DeleteCategory, Relation::Other), Grant::AdminOnly),
    ((Action::UpdateResource, Relation::Owner), Grant::Allow),
    ((Action::UpdateResource, Relation::Other), Grant::AdminOnly),
    ((Action::DeleteResource, Relation::Owner), Grant::Allow),
    ((Action::DeleteResource, Relation::Other), Grant::AdminOnly),
    ((Action::ViewUnpublishedReview, Relation::Owner), Grant::Allow),
    ((Action::ViewUnpublishedReview, Relation::Other), Grant::AdminOnly),
    ((Action::UpdateReview, Relation::Owner), Grant::Allow),
    ((Action::UpdateReview, Relation::Other), Grant::AdminOnly),
    ((Action::DeleteReview, Relation::Owner), Grant::Allow),
    ((Action::DeleteReview, Relation::Other), Grant::AdminOnly),
    ((Action::UpdateGroup, Relation::Owner), Grant::Allow),
    ((Action::UpdateGroup, Relation::Other), Grant::AdminOnly),
    ((Action::DeleteGroup, Relation::Owner), Grant::Allow),
    ((Action::DeleteGroup, Relation::Other), Grant::AdminOnly),
    ((Action::EditChatMessage, Relation::Owner), Grant::Allow),
    ((Action::EditChatMessage, Relation::GroupOwner), Grant::Deny),
    ((Action::EditChatMessage, Relation::Other), Grant::Deny),
    ((Action::DeleteChatMessage, Relation::Owner), Grant::Allow),
    ((Action::DeleteChatMessage, Relation::GroupOwner), Grant::Allow),
    ((Action::DeleteChatMessage, Relation::Other), Grant::AdminOnly),
];

fn grant_for(action: Action, relation: Relation) -> Grant {
    POLICY
        .iter()
        .find(|((a, r), _)| *a == action && *r == relation)
        .map(|(_, grant)| *grant)
        .unwrap_or(Grant::Deny)
}

pub fn is_permitted(user: &AuthenticatedUser, action: Action, relation: Relation) -> bool {
    match grant_for(action, relation) {
        Grant::Allow => true,
        Grant::AdminOnly => user.is_admin(),
        Grant::Deny => false,
    }
}

pub fn authorize(user: &AuthenticatedUser, action: Action, relation: Relation) -> Result<()> {
    if is_permitted(user, action, relation) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %user.user_id,
            ?action,
            ?relation,
            "Policy denied request"
        );
        Err(AppError::Forbidden(action.denial_message().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::now_v7(),
            name: "tester".to_string(),
            role,
        }
    }

    #[test]
    fn test_owner_may_update_and_delete_own_resource() {
        let u = user(Role::User);
        assert!(is_permitted(&u, Action::UpdateResource, Relation::Owner));
        assert!(is_permitted(&u, Action::DeleteResource, Relation::Owner));
        assert!(!is_permitted(&u, Action::UpdateResource, Relation::Other));
    }

    #[test]
    fn test_admin_overrides_ownership_except_chat_edits() {
        let admin = user(Role::Admin);
        assert!(is_permitted(&admin, Action::DeleteResource, Relation::Other));
        assert!(is_permitted(&admin, Action::UpdateGroup, Relation::Other));
        assert!(is_permitted(&admin, Action::DeleteChatMessage, Relation::Other));
        assert!(!is_permitted(&admin, Action::EditChatMessage, Relation::Other));
    }

    #[test]
    fn test_group_owner_may_delete_but_not_edit_messages() {
        let u = user(Role::User);
        assert!(is_permitted(&u, Action::DeleteChatMessage, Relation::GroupOwner));
        assert!(!is_permitted(&u, Action::EditChatMessage, Relation::GroupOwner));
    }

    #[test]
    fn test_category_writes_are_admin_only() {
        let u = user(Role::User);
        let admin = user(Role::Admin);
        for action in [Action::UpdateCategory, Action::DeleteCategory, Action::Administer] {
            assert!(!is_permitted(&u, action, Relation::Other));
            assert!(is_permitted(&admin, action, Relation::Other));
        }
    }

    #[test]
    fn test_unlisted_pairs_are_denied() {
        let admin = user(Role::Admin);
        assert!(!is_permitted(&admin, Action::UpdateCategory, Relation::GroupOwner));
        assert!(authorize(&admin, Action::UpdateResource, Relation::GroupOwner).is_err());
    }

    #[test]
    fn test_relation_prefers_authorship() {
        let u = user(Role::User);
        assert_eq!(Relation::to_message(&u, u.user_id, u.user_id), Relation::Owner);
        assert_eq!(
            Relation::to_message(&u, Uuid::now_v7(), u.user_id),
            Relation::GroupOwner
        );
        assert_eq!(
            Relation::to_message(&u, Uuid::now_v7(), Uuid::now_v7()),
            Relation::Other
        );
        assert_eq!(Relation::to_owner(&u, Uuid::now_v7()), Relation::Other);
    }

    #[test]
    fn test_denial_is_forbidden() {
        let u = user(Role::User);
        let err = authorize(&u, Action::DeleteGroup, Relation::Other).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
