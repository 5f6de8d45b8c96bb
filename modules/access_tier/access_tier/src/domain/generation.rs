//! Generation-guarded resolver state.
//!
//! Every identity change and every refetch mints a new generation. Async
//! work carries the generation it was started for, and every write back into
//! the state is compared against the current generation first. Anything that
//! does not match is superseded and dropped unread.
//!
//! The state is plain data without I/O so transitions can be tested without a
//! runtime. The service wraps it in a mutex and publishes `snapshot` after each
//! accepted transition.

use access_tier_sdk::{
    AccessSnapshot, AccessTier, Generation, ResolutionPhase, RoleSet, UserId, UserIdentity,
};

/// Which part of the pipeline a refetch repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchScope {
    /// Entitlement, eligibility and display number; roles are reused when
    /// the current identity already has a successfully fetched role set.
    Signals,
    /// Everything, roles included.
    Full,
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Identity unchanged; nothing was minted.
    Unchanged(Generation),
    /// Resolved synchronously (anonymous); snapshot already final.
    Settled(Generation),
    /// A pipeline must be started for this generation.
    Spawn(Work),
}

impl Plan {
    #[must_use]
    pub fn generation(&self) -> Generation {
        match self {
            Self::Unchanged(generation) | Self::Settled(generation) => *generation,
            Self::Spawn(work) => work.generation,
        }
    }
}

/// One pipeline run, tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub generation: Generation,
    pub user: UserId,
    /// `Some` when the role lookup is skipped.
    pub roles: Option<RoleSet>,
}

/// Fully computed outcome of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tier: AccessTier,
    pub roles: RoleSet,
    pub display_number: Option<u32>,
}

#[derive(Debug, Default)]
pub struct ResolverState {
    current: Generation,
    /// `None` until the first identity is observed.
    identity: Option<UserIdentity>,
    phase: ResolutionPhase,
    /// Roles fetched successfully for `identity`; reused by signal refetches.
    known_roles: Option<RoleSet>,
    snapshot: AccessSnapshot,
}

impl ResolverState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Generation {
        self.current
    }

    #[must_use]
    pub fn phase(&self) -> ResolutionPhase {
        self.phase
    }

    #[must_use]
    pub fn snapshot(&self) -> &AccessSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current == generation
    }

    /// Observe an identity reported by the session provider.
    ///
    /// Repeated reports of the same identity are no-ops.
    pub fn observe(&mut self, identity: UserIdentity) -> Plan {
        if self.identity == Some(identity) {
            return Plan::Unchanged(self.current);
        }
        self.identity = Some(identity);
        self.known_roles = None;
        self.start(identity, None)
    }

    /// Restart resolution for the observed identity under a new generation.
    ///
    /// Returns `None` while no identity has ever been observed.
    pub fn restart(&mut self, scope: RefetchScope) -> Option<Plan> {
        let identity = self.identity?;
        let reuse = match scope {
            RefetchScope::Signals => self.known_roles.clone(),
            RefetchScope::Full => None,
        };
        Some(self.start(identity, reuse))
    }

    fn start(&mut self, identity: UserIdentity, roles: Option<RoleSet>) -> Plan {
        let generation = self.mint();
        let Some(user) = identity.user_id() else {
            self.phase = ResolutionPhase::Resolved;
            self.snapshot = AccessSnapshot::anonymous(generation);
            return Plan::Settled(generation);
        };

        self.phase = if roles.is_some() {
            ResolutionPhase::SignalsLoading
        } else {
            ResolutionPhase::RolesLoading
        };
        // Previous tier stays visible until this generation completes.
        self.snapshot.loading = true;
        self.snapshot.phase = self.phase;
        self.snapshot.generation = generation;

        Plan::Spawn(Work {
            generation,
            user,
            roles,
        })
    }

    fn mint(&mut self) -> Generation {
        self.current = self.current.next();
        self.current
    }

    /// Record the settled role lookup of `generation`.
    ///
    /// Returns `false` if the generation was superseded; the caller must stop.
    /// A degraded (failed) lookup is not remembered, so the next signal
    /// refetch asks the role store again.
    pub fn roles_settled(
        &mut self,
        generation: Generation,
        roles: &RoleSet,
        degraded: bool,
    ) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.known_roles = if degraded { None } else { Some(roles.clone()) };
        self.phase = ResolutionPhase::SignalsLoading;
        self.snapshot.phase = self.phase;
        true
    }

    /// Publish the outcome of `generation`.
    ///
    /// Returns `false` (and leaves the state untouched) if superseded.
    pub fn complete(&mut self, generation: Generation, resolution: Resolution) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        let Some(identity) = self.identity else {
            return false;
        };
        self.phase = ResolutionPhase::Resolved;
        self.snapshot = AccessSnapshot {
            identity,
            tier: resolution.tier,
            roles: resolution.roles,
            display_number: resolution.display_number,
            loading: false,
            phase: ResolutionPhase::Resolved,
            generation,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> UserIdentity {
        UserIdentity::authenticated(Uuid::new_v4())
    }

    fn resolution(tier: AccessTier) -> Resolution {
        Resolution {
            tier,
            roles: RoleSet::empty(),
            display_number: None,
        }
    }

    fn spawned(plan: Plan) -> Work {
        match plan {
            Plan::Spawn(work) => work,
            other => panic!("expected spawn, got {other:?}"),
        }
    }

    #[test]
    fn starts_idle() {
        let state = ResolverState::new();
        assert_eq!(state.phase(), ResolutionPhase::Idle);
        assert_eq!(state.current(), Generation::INITIAL);
        assert!(!state.snapshot().loading);
    }

    #[test]
    fn anonymous_settles_synchronously() {
        let mut state = ResolverState::new();
        let plan = state.observe(UserIdentity::Anonymous);
        assert!(matches!(plan, Plan::Settled(_)));
        assert_eq!(state.phase(), ResolutionPhase::Resolved);
        assert_eq!(state.snapshot().tier, AccessTier::None);
        assert!(!state.snapshot().loading);
    }

    #[test]
    fn observe_is_idempotent() {
        let mut state = ResolverState::new();
        let u1 = user();
        let first = state.observe(u1).generation();
        let again = state.observe(u1);
        assert_eq!(again, Plan::Unchanged(first));
        assert_eq!(state.current(), first);
    }

    #[test]
    fn identity_change_keeps_previous_tier_while_loading() {
        let mut state = ResolverState::new();
        let u1 = user();
        let g1 = state.observe(u1).generation();
        assert!(state.complete(g1, resolution(AccessTier::Premium)));

        let work = spawned(state.observe(user()));
        assert_eq!(state.phase(), ResolutionPhase::RolesLoading);
        assert!(state.snapshot().loading);
        assert_eq!(state.snapshot().tier, AccessTier::Premium);
        assert_eq!(state.snapshot().identity, u1);
        assert!(work.roles.is_none());
    }

    #[test]
    fn stale_generation_cannot_write() {
        let mut state = ResolverState::new();
        let g1 = state.observe(user()).generation();
        let u2 = user();
        let g2 = state.observe(u2).generation();
        assert!(g2 > g1);

        assert!(!state.roles_settled(g1, &RoleSet::empty(), false));
        assert!(!state.complete(g1, resolution(AccessTier::Admin)));
        assert_eq!(state.phase(), ResolutionPhase::RolesLoading);

        assert!(state.complete(g2, resolution(AccessTier::Free)));
        assert_eq!(state.snapshot().tier, AccessTier::Free);
        assert_eq!(state.snapshot().identity, u2);
        assert_eq!(state.snapshot().generation, g2);
    }

    #[test]
    fn signal_refetch_reuses_roles_after_success() {
        let mut state = ResolverState::new();
        let g1 = state.observe(user()).generation();
        let admin: RoleSet = ["admin"].into_iter().collect();
        assert!(state.roles_settled(g1, &admin, false));
        assert!(state.complete(g1, resolution(AccessTier::Admin)));

        let work = spawned(state.restart(RefetchScope::Signals).unwrap());
        assert_eq!(work.roles, Some(admin));
        assert_eq!(state.phase(), ResolutionPhase::SignalsLoading);
    }

    #[test]
    fn signal_refetch_refetches_degraded_roles() {
        let mut state = ResolverState::new();
        let g1 = state.observe(user()).generation();
        assert!(state.roles_settled(g1, &RoleSet::empty(), true));
        assert!(state.complete(g1, resolution(AccessTier::None)));

        let work = spawned(state.restart(RefetchScope::Signals).unwrap());
        assert!(work.roles.is_none());
        assert_eq!(state.phase(), ResolutionPhase::RolesLoading);
    }

    #[test]
    fn full_refetch_always_refetches_roles() {
        let mut state = ResolverState::new();
        let g1 = state.observe(user()).generation();
        assert!(state.roles_settled(g1, &RoleSet::empty(), false));

        let work = spawned(state.restart(RefetchScope::Full).unwrap());
        assert!(work.roles.is_none());
    }

    #[test]
    fn restart_without_identity_is_noop() {
        let mut state = ResolverState::new();
        assert!(state.restart(RefetchScope::Signals).is_none());
        assert_eq!(state.current(), Generation::INITIAL);
    }

    #[test]
    fn back_to_back_refetches_leave_only_latest_current() {
        let mut state = ResolverState::new();
        state.observe(user());
        let first = state.restart(RefetchScope::Full).unwrap().generation();
        let second = state.restart(RefetchScope::Full).unwrap().generation();

        assert!(!state.complete(first, resolution(AccessTier::Premium)));
        assert!(state.snapshot().loading);
        assert!(state.complete(second, resolution(AccessTier::Free)));
        assert_eq!(state.snapshot().tier, AccessTier::Free);
    }

    #[test]
    fn anonymous_after_user_discards_user_work() {
        let mut state = ResolverState::new();
        let g1 = state.observe(user()).generation();
        state.observe(UserIdentity::Anonymous);
        assert!(!state.complete(g1, resolution(AccessTier::Admin)));
        assert_eq!(state.snapshot().tier, AccessTier::None);
        assert!(!state.snapshot().loading);
    }
}
