//! File access decisions.
//!
//! Rules, first match wins:
//! 1. the owner may do anything;
//! 2. public files may be viewed and downloaded by anyone, never edited;
//! 3. private files are closed to everyone else;
//! 4. restricted files need a live grant whose level covers the operation.
//!
//! [`evaluate`] is the pure rule set. [`AccessDecider`] adds the single grant
//! lookup and the clock reading that feed it.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::models::{
    FileRecord, Grant, Operation, PermissionLevel, Principal, Visibility,
};
use crate::features::access::stores::GrantStore;
use crate::shared::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// What a stored grant amounts to at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantState {
    NoGrant,
    Expired,
    Active(PermissionLevel),
}

impl GrantState {
    pub fn of(grant: Option<&Grant>, now: DateTime<Utc>) -> Self {
        match grant {
            None => GrantState::NoGrant,
            Some(grant) if grant.is_expired_at(now) => GrantState::Expired,
            Some(grant) => GrantState::Active(grant.permission),
        }
    }
}

/// How the principal stands relative to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Owner,
    Public,
    Private,
    Restricted(GrantState),
}

impl Standing {
    pub fn permits(self, operation: Operation) -> Decision {
        let allowed = match self {
            Standing::Owner => true,
            Standing::Public => matches!(operation, Operation::View | Operation::Download),
            Standing::Private => false,
            Standing::Restricted(GrantState::NoGrant | GrantState::Expired) => false,
            Standing::Restricted(GrantState::Active(granted)) => {
                operation.required_level() <= granted
            }
        };

        Decision::from_bool(allowed)
    }
}

/// Classify the principal without consulting any store.
///
/// Returns `None` when the outcome depends on a grant (restricted file,
/// non-owner principal).
fn standing_without_grant(principal_id: Uuid, file: &FileRecord) -> Option<Standing> {
    if principal_id == file.owner_id {
        return Some(Standing::Owner);
    }

    match file.visibility {
        Visibility::Public => Some(Standing::Public),
        Visibility::Private => Some(Standing::Private),
        Visibility::Restricted => None,
    }
}

/// Pure classification over already-loaded facts.
///
/// A grant for some other `(file, user)` pair never counts.
pub fn classify(
    principal_id: Uuid,
    file: &FileRecord,
    grant: Option<&Grant>,
    now: DateTime<Utc>,
) -> Standing {
    standing_without_grant(principal_id, file).unwrap_or_else(|| {
        let grant = grant.filter(|g| g.file_id == file.id && g.user_id == principal_id);
        Standing::Restricted(GrantState::of(grant, now))
    })
}

/// Pure decision over already-loaded facts
pub fn evaluate(
    principal_id: Uuid,
    file: &FileRecord,
    grant: Option<&Grant>,
    operation: Operation,
    now: DateTime<Utc>,
) -> Decision {
    classify(principal_id, file, grant, now).permits(operation)
}

/// Decides access for one principal and file, reading at most one grant
pub struct AccessDecider {
    grants: Arc<dyn GrantStore>,
    clock: Arc<dyn Clock>,
}

impl AccessDecider {
    pub fn new(grants: Arc<dyn GrantStore>, clock: Arc<dyn Clock>) -> Self {
        Self { grants, clock }
    }

    /// The grant the decision depends on; only restricted files the
    /// principal does not own trigger a lookup.
    async fn grant_for(&self, principal: &Principal, file: &FileRecord) -> Result<Option<Grant>> {
        if standing_without_grant(principal.id, file).is_some() {
            return Ok(None);
        }

        self.grants.find(file.id, principal.id).await
    }

    pub async fn standing(&self, principal: &Principal, file: &FileRecord) -> Result<Standing> {
        let grant = self.grant_for(principal, file).await?;
        Ok(classify(principal.id, file, grant.as_ref(), self.clock.now()))
    }

    pub async fn decide(
        &self,
        principal: &Principal,
        file: &FileRecord,
        operation: Operation,
    ) -> Result<Decision> {
        let grant = self.grant_for(principal, file).await?;
        Ok(evaluate(
            principal.id,
            file,
            grant.as_ref(),
            operation,
            self.clock.now(),
        ))
    }

    /// Every operation the principal may perform, from a single lookup
    pub async fn allowed_operations(
        &self,
        principal: &Principal,
        file: &FileRecord,
    ) -> Result<Vec<Operation>> {
        Ok(Self::operations_for(self.standing(principal, file).await?))
    }

    pub fn operations_for(standing: Standing) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| standing.permits(*op).is_allowed())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::models::UserRole;
    use crate::features::access::stores::MemoryStore;
    use crate::shared::clock::FixedClock;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn file(owner: Uuid, visibility: Visibility) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            owner_id: owner,
            visibility,
            file_size: 10,
            file_type: ".txt".to_string(),
        }
    }

    fn grant(
        file: &FileRecord,
        user: Uuid,
        permission: PermissionLevel,
        expires_at: Option<DateTime<Utc>>,
    ) -> Grant {
        Grant {
            id: Uuid::new_v4(),
            file_id: file.id,
            user_id: user,
            permission,
            granted_by: file.owner_id,
            granted_at: now() - Duration::days(1),
            expires_at,
        }
    }

    fn decisions(
        principal: Uuid,
        file: &FileRecord,
        grant: Option<&Grant>,
        at: DateTime<Utc>,
    ) -> [Decision; 3] {
        Operation::ALL.map(|op| evaluate(principal, file, grant, op, at))
    }

    const ALLOW_ALL: [Decision; 3] = [Decision::Allow, Decision::Allow, Decision::Allow];
    const DENY_ALL: [Decision; 3] = [Decision::Deny, Decision::Deny, Decision::Deny];
    const READ_ONLY: [Decision; 3] = [Decision::Allow, Decision::Allow, Decision::Deny];

    #[test]
    fn test_owner_has_full_access_regardless_of_state() {
        let owner = Uuid::new_v4();
        for visibility in [
            Visibility::Private,
            Visibility::Public,
            Visibility::Restricted,
        ] {
            let f = file(owner, visibility);
            let expired = grant(&f, owner, PermissionLevel::View, Some(now() - Duration::hours(1)));

            assert_eq!(decisions(owner, &f, None, now()), ALLOW_ALL);
            assert_eq!(decisions(owner, &f, Some(&expired), now()), ALLOW_ALL);
        }
    }

    #[test]
    fn test_public_file_is_read_only_for_others() {
        let f = file(Uuid::new_v4(), Visibility::Public);
        let stranger = Uuid::new_v4();

        assert_eq!(decisions(stranger, &f, None, now()), READ_ONLY);

        // An edit grant does not open a public file for editing
        let g = grant(&f, stranger, PermissionLevel::Edit, None);
        assert_eq!(decisions(stranger, &f, Some(&g), now()), READ_ONLY);
    }

    #[test]
    fn test_private_file_ignores_grants() {
        let f = file(Uuid::new_v4(), Visibility::Private);
        let stranger = Uuid::new_v4();
        let g = grant(&f, stranger, PermissionLevel::Edit, None);

        assert_eq!(decisions(stranger, &f, None, now()), DENY_ALL);
        assert_eq!(decisions(stranger, &f, Some(&g), now()), DENY_ALL);
    }

    #[test]
    fn test_restricted_without_grant_denies() {
        let f = file(Uuid::new_v4(), Visibility::Restricted);
        assert_eq!(decisions(Uuid::new_v4(), &f, None, now()), DENY_ALL);
    }

    #[test]
    fn test_restricted_grant_levels() {
        let f = file(Uuid::new_v4(), Visibility::Restricted);
        let user = Uuid::new_v4();

        let view = grant(&f, user, PermissionLevel::View, None);
        assert_eq!(
            decisions(user, &f, Some(&view), now()),
            [Decision::Allow, Decision::Deny, Decision::Deny]
        );

        let download = grant(&f, user, PermissionLevel::Download, None);
        assert_eq!(decisions(user, &f, Some(&download), now()), READ_ONLY);

        let edit = grant(&f, user, PermissionLevel::Edit, None);
        assert_eq!(decisions(user, &f, Some(&edit), now()), ALLOW_ALL);
    }

    #[test]
    fn test_expired_edit_grant_behaves_as_absent() {
        let f = file(Uuid::new_v4(), Visibility::Restricted);
        let user = Uuid::new_v4();
        let g = grant(&f, user, PermissionLevel::Edit, Some(now() - Duration::seconds(1)));

        assert_eq!(decisions(user, &f, Some(&g), now()), DENY_ALL);
    }

    #[test]
    fn test_grant_expiring_exactly_now_is_expired() {
        let f = file(Uuid::new_v4(), Visibility::Restricted);
        let user = Uuid::new_v4();
        let g = grant(&f, user, PermissionLevel::Edit, Some(now()));

        assert_eq!(decisions(user, &f, Some(&g), now()), DENY_ALL);
        assert_eq!(
            decisions(user, &f, Some(&g), now() - Duration::milliseconds(1)),
            ALLOW_ALL
        );
    }

    #[test]
    fn test_grant_for_other_pair_does_not_count() {
        let f = file(Uuid::new_v4(), Visibility::Restricted);
        let holder = Uuid::new_v4();
        let g = grant(&f, holder, PermissionLevel::Edit, None);

        assert_eq!(decisions(Uuid::new_v4(), &f, Some(&g), now()), DENY_ALL);

        let other_file = file(f.owner_id, Visibility::Restricted);
        assert_eq!(decisions(holder, &other_file, Some(&g), now()), DENY_ALL);
    }

    #[test]
    fn test_repeated_evaluation_is_stable() {
        let f = file(Uuid::new_v4(), Visibility::Restricted);
        let user = Uuid::new_v4();
        let g = grant(&f, user, PermissionLevel::Download, Some(now() + Duration::hours(2)));

        let first = decisions(user, &f, Some(&g), now());
        for _ in 0..10 {
            assert_eq!(decisions(user, &f, Some(&g), now()), first);
        }
    }

    #[tokio::test]
    async fn test_decider_reads_grant_only_for_restricted_non_owner() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(now()));
        let decider = AccessDecider::new(store.clone(), clock);

        let owner = store.add_user("owner@example.com", UserRole::User);
        let other = store.add_user("other@example.com", UserRole::User);

        let public = store.add_file(&owner, Visibility::Public);
        let private = store.add_file(&owner, Visibility::Private);
        let restricted = store.add_file(&owner, Visibility::Restricted);

        decider.decide(&other, &public, Operation::View).await.unwrap();
        decider.decide(&other, &private, Operation::View).await.unwrap();
        decider.decide(&owner, &restricted, Operation::Edit).await.unwrap();
        assert_eq!(store.grant_lookups(), 0);

        decider
            .decide(&other, &restricted, Operation::View)
            .await
            .unwrap();
        assert_eq!(store.grant_lookups(), 1);
    }

    #[tokio::test]
    async fn test_decider_follows_injected_clock() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(now()));
        let decider = AccessDecider::new(store.clone(), clock.clone());

        let owner = store.add_user("owner@example.com", UserRole::User);
        let guest = store.add_user("guest@example.com", UserRole::User);
        let f = store.add_file(&owner, Visibility::Restricted);
        store.grant(
            &f,
            &guest,
            PermissionLevel::Download,
            Some(now() + Duration::minutes(30)),
        );

        assert_eq!(
            decider.allowed_operations(&guest, &f).await.unwrap(),
            vec![Operation::View, Operation::Download]
        );

        clock.advance(Duration::minutes(30));
        assert!(decider.allowed_operations(&guest, &f).await.unwrap().is_empty());

        // Re-granting overwrites the stale row
        store.grant(&f, &guest, PermissionLevel::View, None);
        assert_eq!(
            decider.allowed_operations(&guest, &f).await.unwrap(),
            vec![Operation::View]
        );
    }
}
