//! Per-event indexed-field criteria.
//!
//! Each selection names the event it narrows (via the associated `Event`
//! type) and lists acceptable values per indexed field, in declaration
//! order. An empty list matches any value. The proxy translates a
//! selection into backend topic constraints; everything downstream of that
//! is the one generic query/watch mechanism.

use alloy_primitives::{Address, B256};

use fastsettle_core::{
    ContractEvent, ExecutorUpdated, IntentExecuted, SwapTargetsUpdated, TreasuryUpdated,
};

/// A typed selection over one event's indexed fields.
pub trait EventSelection {
    type Event: ContractEvent;

    /// One criteria set per indexed field, declaration order.
    /// Empty set = match-any.
    fn indexed_criteria(&self) -> Vec<Vec<B256>>;
}

fn address_words(addrs: &[Address]) -> Vec<B256> {
    addrs.iter().map(|a| a.into_word()).collect()
}

/// Criteria for `ExecutorUpdated(oldExecutor indexed, newExecutor indexed)`.
#[derive(Debug, Clone, Default)]
pub struct ExecutorUpdatedFilter {
    pub old_executor: Vec<Address>,
    pub new_executor: Vec<Address>,
}

impl EventSelection for ExecutorUpdatedFilter {
    type Event = ExecutorUpdated;

    fn indexed_criteria(&self) -> Vec<Vec<B256>> {
        vec![
            address_words(&self.old_executor),
            address_words(&self.new_executor),
        ]
    }
}

/// Criteria for `IntentExecuted(user, inputToken, outputToken indexed; …)`.
#[derive(Debug, Clone, Default)]
pub struct IntentExecutedFilter {
    pub user: Vec<Address>,
    pub input_token: Vec<Address>,
    pub output_token: Vec<Address>,
}

impl EventSelection for IntentExecutedFilter {
    type Event = IntentExecuted;

    fn indexed_criteria(&self) -> Vec<Vec<B256>> {
        vec![
            address_words(&self.user),
            address_words(&self.input_token),
            address_words(&self.output_token),
        ]
    }
}

/// `SwapTargetsUpdated` has no indexed fields; the selection is the event
/// signature alone.
#[derive(Debug, Clone, Default)]
pub struct SwapTargetsUpdatedFilter;

impl EventSelection for SwapTargetsUpdatedFilter {
    type Event = SwapTargetsUpdated;

    fn indexed_criteria(&self) -> Vec<Vec<B256>> {
        vec![]
    }
}

/// Criteria for `TreasuryUpdated(oldTreasury indexed, newTreasury indexed)`.
#[derive(Debug, Clone, Default)]
pub struct TreasuryUpdatedFilter {
    pub old_treasury: Vec<Address>,
    pub new_treasury: Vec<Address>,
}

impl EventSelection for TreasuryUpdatedFilter {
    type Event = TreasuryUpdated;

    fn indexed_criteria(&self) -> Vec<Vec<B256>> {
        vec![
            address_words(&self.old_treasury),
            address_words(&self.new_treasury),
        ]
    }
}
