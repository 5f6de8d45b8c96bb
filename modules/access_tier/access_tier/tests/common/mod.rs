//! Scripted stores shared by the resolver integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use access_tier::{
    AccessTierConfig, AccessTierResolver, DiagnosticsSink, DisplayNumberClient, EligibilityClient,
    EntitlementStoreClient, Generation, RoleSet, RoleStoreClient, Signal, SignalError,
    SignalFailure, UserId, UserIdentity,
};
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Scripted answer of one store call.
#[derive(Clone)]
pub enum Reply<T> {
    Value(T),
    Fail,
    /// Never answers; only the resolver timeout ends the call.
    Hang,
}

/// Per-user reply queue. The last reply sticks once the queue is drained.
pub struct Script<T> {
    replies: Mutex<HashMap<UserId, VecDeque<Reply<T>>>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone + Default> Script<T> {
    pub fn set(&self, user: UserId, replies: Vec<Reply<T>>) {
        self.replies
            .lock()
            .unwrap()
            .insert(user, replies.into_iter().collect());
    }

    pub fn always(&self, user: UserId, reply: Reply<T>) {
        self.set(user, vec![reply]);
    }

    fn next(&self, user: UserId) -> Reply<T> {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(&user) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(Reply::Value(T::default())),
            None => Reply::Value(T::default()),
        }
    }
}

/// One object implementing all four stores, with call recording and gates.
///
/// A gated `(user, signal)` pair blocks every call until the test adds
/// permits; one permit releases one call, in arrival order.
#[derive(Default)]
pub struct MockStores {
    pub roles: Script<RoleSet>,
    pub entitlement: Script<bool>,
    pub eligibility: Script<bool>,
    pub display_number: Script<Option<u32>>,
    gates: Mutex<HashMap<(UserId, Signal), Arc<Semaphore>>>,
    calls: Mutex<Vec<(UserId, Signal)>>,
}

impl MockStores {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Close the gate for `(user, signal)` and return it.
    pub fn gate(&self, user: UserId, signal: Signal) -> Arc<Semaphore> {
        Arc::clone(
            self.gates
                .lock()
                .unwrap()
                .entry((user, signal))
                .or_insert_with(|| Arc::new(Semaphore::new(0))),
        )
    }

    pub fn calls(&self, signal: Signal) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s)| *s == signal)
            .count()
    }

    pub fn calls_for(&self, user: UserId, signal: Signal) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == (user, signal))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer<T: Clone + Default>(
        &self,
        user: UserId,
        signal: Signal,
        script: &Script<T>,
    ) -> Result<T, SignalError> {
        self.calls.lock().unwrap().push((user, signal));
        let gate = self.gates.lock().unwrap().get(&(user, signal)).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        match script.next(user) {
            Reply::Value(value) => Ok(value),
            Reply::Fail => Err(SignalError::backend(format!("scripted {signal} failure"))),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[async_trait::async_trait]
impl RoleStoreClient for MockStores {
    async fn get_roles(&self, user: &UserId) -> Result<RoleSet, SignalError> {
        self.answer(*user, Signal::Roles, &self.roles).await
    }
}

#[async_trait::async_trait]
impl EntitlementStoreClient for MockStores {
    async fn has_entitlement(&self, user: &UserId) -> Result<bool, SignalError> {
        self.answer(*user, Signal::Entitlement, &self.entitlement)
            .await
    }
}

#[async_trait::async_trait]
impl EligibilityClient for MockStores {
    async fn is_free_tier_eligible(&self, user: &UserId) -> Result<bool, SignalError> {
        self.answer(*user, Signal::Eligibility, &self.eligibility)
            .await
    }
}

#[async_trait::async_trait]
impl DisplayNumberClient for MockStores {
    async fn get_display_number(&self, user: &UserId) -> Result<Option<u32>, SignalError> {
        self.answer(*user, Signal::DisplayNumber, &self.display_number)
            .await
    }
}

/// Diagnostics sink that keeps every report.
#[derive(Default)]
pub struct RecordingDiagnostics {
    reports: Mutex<Vec<(Signal, Generation, bool)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(signal, _, _)| *signal)
            .collect()
    }

    pub fn timeouts(&self) -> Vec<Signal> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, timeout)| *timeout)
            .map(|(signal, _, _)| *signal)
            .collect()
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn report(&self, failure: &SignalFailure) {
        self.reports.lock().unwrap().push((
            failure.signal,
            failure.generation,
            failure.error.is_timeout(),
        ));
    }
}

pub fn new_user() -> (UserId, UserIdentity) {
    let id = UserId::new(Uuid::new_v4());
    (id, UserIdentity::Authenticated(id))
}

pub fn roles(labels: &[&str]) -> RoleSet {
    labels.iter().copied().collect()
}

pub fn build_resolver(
    stores: &Arc<MockStores>,
    diagnostics: &Arc<RecordingDiagnostics>,
) -> AccessTierResolver {
    build_resolver_with(stores, diagnostics, AccessTierConfig::default())
}

pub fn build_resolver_with(
    stores: &Arc<MockStores>,
    diagnostics: &Arc<RecordingDiagnostics>,
    config: AccessTierConfig,
) -> AccessTierResolver {
    AccessTierResolver::builder()
        .roles(stores.clone())
        .entitlements(stores.clone())
        .eligibility(stores.clone())
        .display_numbers(stores.clone())
        .diagnostics(diagnostics.clone())
        .config(config)
        .build()
        .expect("resolver should build inside a runtime")
}

/// Let every runnable task progress. Needs a paused clock so the sleep only
/// completes once the runtime is otherwise idle.
pub async fn drain() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
