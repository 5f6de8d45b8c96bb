//! Domain models for access tier resolution.
//!
//! These models are transport-agnostic (no serde) and represent the core
//! concepts the resolver works with.

use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

use crate::error::SignalError;

/// Identifier of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(Uuid);

impl UserId {
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity reported by the session provider.
///
/// Anonymous carries no id, so it can never be passed to a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UserIdentity {
    /// No authenticated user.
    #[default]
    Anonymous,
    /// Authenticated user.
    Authenticated(UserId),
}

impl UserIdentity {
    #[must_use]
    pub fn authenticated(id: impl Into<UserId>) -> Self {
        Self::Authenticated(id.into())
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(*id),
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Authenticated(id) => id.fmt(f),
        }
    }
}

/// Role label assigned by the role store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    Moderator,
    User,
    /// Any label the resolver does not interpret.
    Other(String),
}

impl Role {
    /// Parse a role label. Labels are case-sensitive; unknown labels are kept
    /// verbatim as [`Role::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            "user" => Self::User,
            other => Self::Other(other.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::User => "user",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of the roles assigned to one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet {
    roles: BTreeSet<Role>,
}

impl RoleSet {
    /// The empty role set. Also what a failed role lookup degrades to.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }

    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.has_role(&Role::Moderator)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for RoleSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Role::from_label).collect()
    }
}

/// Authoritative access level.
///
/// Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessTier {
    #[default]
    None,
    Free,
    Premium,
    Admin,
}

impl AccessTier {
    /// Any tier other than [`AccessTier::None`] grants access.
    #[must_use]
    pub const fn has_access(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Admins are always treated as at least premium for feature gating.
    #[must_use]
    pub const fn is_premium_view(self) -> bool {
        matches!(self, Self::Premium | Self::Admin)
    }

    #[must_use]
    pub const fn is_free_user(self) -> bool {
        matches!(self, Self::Free)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic id of one resolution attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    /// Generation of a resolver that has never resolved anything.
    pub const INITIAL: Self = Self(0);

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Resolver state machine position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResolutionPhase {
    /// No identity observed yet.
    #[default]
    Idle,
    RolesLoading,
    SignalsLoading,
    Resolved,
}

/// One of the independent inputs consumed by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Roles,
    Entitlement,
    Eligibility,
    DisplayNumber,
}

impl Signal {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Entitlement => "entitlement",
            Self::Eligibility => "eligibility",
            Self::DisplayNumber => "display number",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal the resolver had to degrade, handed to the diagnostics sink.
#[derive(Debug)]
pub struct SignalFailure {
    pub signal: Signal,
    pub generation: Generation,
    pub user: UserId,
    pub error: SignalError,
}

/// Result published by the resolver.
///
/// `tier` and `roles` always belong to the same completed generation. While a
/// newer generation is loading they keep the previous values and `loading` is
/// set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSnapshot {
    pub identity: UserIdentity,
    pub tier: AccessTier,
    pub roles: RoleSet,
    pub display_number: Option<u32>,
    pub loading: bool,
    pub phase: ResolutionPhase,
    /// Generation the snapshot was last written by.
    pub generation: Generation,
}

impl AccessSnapshot {
    /// Result for an anonymous identity.
    #[must_use]
    pub fn anonymous(generation: Generation) -> Self {
        Self {
            identity: UserIdentity::Anonymous,
            tier: AccessTier::None,
            roles: RoleSet::empty(),
            display_number: None,
            loading: false,
            phase: ResolutionPhase::Resolved,
            generation,
        }
    }

    #[must_use]
    pub const fn has_access(&self) -> bool {
        self.tier.has_access()
    }

    #[must_use]
    pub const fn is_premium_view(&self) -> bool {
        self.tier.is_premium_view()
    }

    #[must_use]
    pub const fn is_free_user(&self) -> bool {
        self.tier.is_free_user()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }

    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.roles.is_moderator()
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.has_role(role)
    }
}
