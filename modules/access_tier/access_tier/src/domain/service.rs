//! Access tier resolver service.
//!
//! Owns the generation-guarded state, starts one pipeline per generation on
//! the captured tokio runtime, and publishes snapshots through a `watch`
//! channel. Superseded pipelines are not aborted: their store calls run out
//! (bounded by the configured timeouts) and their results are dropped by the
//! generation check.

use std::sync::Arc;

use access_tier_sdk::{
    AccessSnapshot, DiagnosticsSink, DisplayNumberClient, EligibilityClient,
    EntitlementStoreClient, Generation, RoleSet, RoleStoreClient, Signal, UserId, UserIdentity,
};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, debug, info};

use super::decision::decide_tier;
use super::diagnostics::TracingDiagnostics;
use super::error::DomainError;
use super::generation::{Plan, RefetchScope, Resolution, ResolverState, Work};
use super::signals::{AccessSignals, SignalFetcher, SignalStores};
use crate::config::AccessTierConfig;

/// Resolves the access tier of the current user.
///
/// Cheap to clone; all clones share one state. Dropping the last clone shuts
/// the resolver down.
#[derive(Clone)]
pub struct AccessTierResolver {
    handle: Arc<ResolverHandle>,
}

struct ResolverHandle {
    shared: Arc<Shared>,
    _shutdown_on_drop: DropGuard,
}

struct Shared {
    state: Mutex<ResolverState>,
    published: watch::Sender<AccessSnapshot>,
    fetcher: SignalFetcher,
    runtime: Handle,
    cancel: CancellationToken,
}

impl AccessTierResolver {
    #[must_use]
    pub fn builder() -> AccessTierResolverBuilder {
        AccessTierResolverBuilder::default()
    }

    /// Report the identity currently supplied by the session provider.
    ///
    /// Idempotent: reporting the observed identity again returns the current
    /// generation without starting anything. An anonymous identity is
    /// resolved before this returns and never reaches a store.
    ///
    /// After [`shutdown`](Self::shutdown) the identity is ignored and the
    /// published result stays as it was.
    pub fn resolve(&self, identity: UserIdentity) -> Generation {
        let shared = &self.handle.shared;
        match shared.transition(|state| Some(state.observe(identity))) {
            Some(plan) => self.execute(plan),
            None => shared.state.lock().current(),
        }
    }

    /// Re-run entitlement, eligibility and display number lookups for the
    /// observed identity under a new generation.
    ///
    /// Roles are reused when the identity already has a successfully fetched
    /// role set. A refetch issued while another is in flight supersedes it.
    /// Returns `None` if no identity was ever observed or the resolver is
    /// shut down.
    pub fn refetch(&self) -> Option<Generation> {
        self.restart(RefetchScope::Signals)
    }

    /// Like [`refetch`](Self::refetch), but re-fetches roles as well.
    pub fn refetch_all(&self) -> Option<Generation> {
        self.restart(RefetchScope::Full)
    }

    fn restart(&self, scope: RefetchScope) -> Option<Generation> {
        let plan = self
            .handle
            .shared
            .transition(|state| state.restart(scope))?;
        Some(self.execute(plan))
    }

    /// Current published result.
    #[must_use]
    pub fn snapshot(&self) -> AccessSnapshot {
        self.handle.shared.published.borrow().clone()
    }

    /// Subscribe to published results.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AccessSnapshot> {
        self.handle.shared.published.subscribe()
    }

    /// Wait until the published result is no longer loading.
    ///
    /// Returns immediately once the resolver is shut down.
    pub async fn settled(&self) -> AccessSnapshot {
        let mut rx = self.subscribe();
        let cancel = self.handle.shared.cancel.clone();
        tokio::select! {
            settled = rx.wait_for(|snapshot| !snapshot.loading) => match settled {
                Ok(snapshot) => snapshot.clone(),
                Err(_) => self.snapshot(),
            },
            () = cancel.cancelled() => self.snapshot(),
        }
    }

    /// Stop all in-flight pipelines. Nothing is published afterwards and later
    /// identity reports and refetches are ignored.
    pub fn shutdown(&self) {
        // Under the state lock so no transition can slip in after the check.
        let _state = self.handle.shared.state.lock();
        self.handle.shared.cancel.cancel();
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.handle.shared.cancel.is_cancelled()
    }

    fn execute(&self, plan: Plan) -> Generation {
        match plan {
            Plan::Unchanged(generation) => generation,
            Plan::Settled(generation) => {
                debug!(%generation, "Anonymous identity resolved without store calls");
                generation
            }
            Plan::Spawn(work) => {
                let generation = work.generation;
                let shared = Arc::clone(&self.handle.shared);
                // Pipelines log under the span of whoever reported the identity.
                let pipeline = async move {
                    let cancel = shared.cancel.clone();
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            debug!(%generation, "Resolver shut down, pipeline dropped");
                        }
                        () = shared.run(work) => {}
                    }
                };
                self.handle.shared.runtime.spawn(pipeline.in_current_span());
                generation
            }
        }
    }
}

impl Shared {
    /// Apply a state transition and publish the snapshot under the same lock,
    /// so publications are ordered exactly like transitions.
    ///
    /// Returns `None` without touching the state once shut down.
    fn transition(&self, f: impl FnOnce(&mut ResolverState) -> Option<Plan>) -> Option<Plan> {
        let mut state = self.state.lock();
        if self.cancel.is_cancelled() {
            return None;
        }
        let plan = f(&mut state)?;
        self.published.send_replace(state.snapshot().clone());
        Some(plan)
    }

    /// Guarded write: publishes only if `f` accepted the generation. Nothing
    /// is accepted once shut down.
    fn guarded<R>(&self, f: impl FnOnce(&mut ResolverState) -> Option<R>) -> Option<R> {
        let mut state = self.state.lock();
        if self.cancel.is_cancelled() {
            return None;
        }
        let out = f(&mut state)?;
        self.published.send_replace(state.snapshot().clone());
        Some(out)
    }

    #[tracing::instrument(skip_all, fields(generation = %work.generation, user_id = %work.user))]
    async fn run(&self, work: Work) {
        let Work {
            generation,
            user,
            roles,
        } = work;

        let roles = if let Some(roles) = roles {
            roles
        } else {
            let fetched = self.fetcher.roles(user).await;
            let accepted = self.guarded(|state| {
                if !state.is_current(generation) {
                    return None;
                }
                let roles = self.fetcher.settle(
                    Signal::Roles,
                    generation,
                    user,
                    fetched,
                    RoleSet::empty(),
                );
                state
                    .roles_settled(generation, &roles.value, roles.degraded)
                    .then_some(roles.value)
            });
            let Some(roles) = accepted else {
                debug!("Superseded after role lookup, result discarded");
                return;
            };
            roles
        };

        let signals = self.fetcher.access_signals(user).await;
        let published = self.guarded(|state| {
            if !state.is_current(generation) {
                return None;
            }
            let resolution = self.resolution(generation, user, roles, signals);
            let tier = resolution.tier;
            state.complete(generation, resolution).then_some(tier)
        });

        match published {
            Some(tier) => info!(%tier, "Access tier resolved"),
            None => debug!("Superseded before publish, result discarded"),
        }
    }

    /// Settle the access signals of the current generation and decide the tier.
    fn resolution(
        &self,
        generation: Generation,
        user: UserId,
        roles: RoleSet,
        signals: AccessSignals,
    ) -> Resolution {
        let fetcher = &self.fetcher;
        let entitled =
            fetcher.settle(Signal::Entitlement, generation, user, signals.entitled, false);
        let eligible =
            fetcher.settle(Signal::Eligibility, generation, user, signals.eligible, false);
        let display_number = fetcher.settle(
            Signal::DisplayNumber,
            generation,
            user,
            signals.display_number,
            None,
        );
        Resolution {
            tier: decide_tier(&roles, entitled.value, eligible.value),
            roles,
            display_number: display_number.value,
        }
    }
}

/// Builder for [`AccessTierResolver`].
#[derive(Default)]
pub struct AccessTierResolverBuilder {
    roles: Option<Arc<dyn RoleStoreClient>>,
    entitlements: Option<Arc<dyn EntitlementStoreClient>>,
    eligibility: Option<Arc<dyn EligibilityClient>>,
    display_numbers: Option<Arc<dyn DisplayNumberClient>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    config: AccessTierConfig,
}

impl AccessTierResolverBuilder {
    #[must_use]
    pub fn roles(mut self, store: Arc<dyn RoleStoreClient>) -> Self {
        self.roles = Some(store);
        self
    }

    #[must_use]
    pub fn entitlements(mut self, store: Arc<dyn EntitlementStoreClient>) -> Self {
        self.entitlements = Some(store);
        self
    }

    #[must_use]
    pub fn eligibility(mut self, evaluator: Arc<dyn EligibilityClient>) -> Self {
        self.eligibility = Some(evaluator);
        self
    }

    #[must_use]
    pub fn display_numbers(mut self, lookup: Arc<dyn DisplayNumberClient>) -> Self {
        self.display_numbers = Some(lookup);
        self
    }

    /// Override the default tracing-based diagnostics sink.
    #[must_use]
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    #[must_use]
    pub fn config(mut self, config: AccessTierConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble the resolver on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`DomainError::MissingCollaborator`] if a store was not supplied
    /// - [`DomainError::InvalidConfig`] if the config fails validation
    /// - [`DomainError::RuntimeUnavailable`] if called outside a tokio runtime
    pub fn build(self) -> Result<AccessTierResolver, DomainError> {
        self.config.validate()?;
        let runtime = Handle::try_current()?;

        let stores = SignalStores {
            roles: self.roles.ok_or(DomainError::MissingCollaborator {
                collaborator: "role store",
            })?,
            entitlements: self.entitlements.ok_or(DomainError::MissingCollaborator {
                collaborator: "entitlement store",
            })?,
            eligibility: self.eligibility.ok_or(DomainError::MissingCollaborator {
                collaborator: "eligibility evaluator",
            })?,
            display_numbers: self.display_numbers.ok_or(DomainError::MissingCollaborator {
                collaborator: "display number lookup",
            })?,
        };
        let diagnostics = self.diagnostics.unwrap_or_else(|| {
            Arc::new(TracingDiagnostics::new(self.config.failure_log_throttle))
        });

        let state = ResolverState::new();
        let (published, _) = watch::channel(state.snapshot().clone());
        let cancel = CancellationToken::new();

        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            published,
            fetcher: SignalFetcher::new(stores, diagnostics, &self.config),
            runtime,
            cancel: cancel.clone(),
        });

        Ok(AccessTierResolver {
            handle: Arc::new(ResolverHandle {
                shared,
                _shutdown_on_drop: cancel.drop_guard(),
            }),
        })
    }
}
