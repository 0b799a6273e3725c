use memsub_policy::PolicyEngine;
use memsub_store::Store;

use crate::clock::Clock;
use crate::rng::TokenRng;

/// The memory substrate: a thin façade over the store, policy engine, clock,
/// and RNG. Holds no other mutable state — every call is a request-scoped,
/// transactional operation against its collaborators.
pub struct Engine {
    pub(crate) store: Store,
    pub(crate) policy: PolicyEngine,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) rng: Box<dyn TokenRng>,
}

impl Engine {
    pub fn new(store: Store, policy: PolicyEngine, clock: Box<dyn Clock>, rng: Box<dyn TokenRng>) -> Self {
        Self { store, policy, clock, rng }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }
}
