//! The bound contract proxy.
//!
//! [`FastSettlement`] owns nothing but the parsed schema, the contract
//! address, and the backend handle. Every method is a mechanical mapping:
//! typed arguments → ABI calldata → backend, or backend logs → typed
//! records. Business constraints (deadlines, nonces, signatures, allowed
//! swap targets) are enforced exclusively by the remote contract.

use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256};
use tokio::sync::mpsc;

use fastsettle_core::{
    decode_revert, ContractEvent, Decoded, EventDecoder, ExecuteOutcome, Intent, RawLog,
    SettlementAbi, SwapCall,
};

use crate::backend::{CallRequest, ChainBackend, LogFilter, TransactionRequest, TxHash};
use crate::error::ClientError;
use crate::filter::EventSelection;
use crate::iter::EventIterator;
use crate::opts::{CallOpts, FilterOpts, TransactOpts, WatchOpts};
use crate::watch::{self, EventWatcher};

/// Proxy for one deployed FastSettlement V3 contract.
pub struct FastSettlement<B> {
    address: Address,
    abi: Arc<SettlementAbi>,
    backend: B,
}

impl<B: ChainBackend> FastSettlement<B> {
    /// Bind the proxy to a deployed contract.
    ///
    /// Parses the embedded schema; a malformed schema is fatal here and
    /// nowhere else.
    pub fn new(address: Address, backend: B) -> Result<Self, ClientError> {
        Ok(Self::with_abi(address, Arc::new(SettlementAbi::parse()?), backend))
    }

    /// Bind with an already-parsed schema (shared across proxies).
    pub fn with_abi(address: Address, abi: Arc<SettlementAbi>, backend: B) -> Self {
        Self { address, abi, backend }
    }

    /// The bound contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The shared schema.
    pub fn abi(&self) -> &Arc<SettlementAbi> {
        &self.abi
    }

    // ─── Call dispatch ───────────────────────────────────────────────────

    /// Encode and submit a state-changing call to any declared method.
    pub async fn transact_raw(
        &self,
        opts: &TransactOpts,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<TxHash, ClientError> {
        let data = self.abi.encode_call(method, args)?;
        tracing::debug!(
            method,
            to = %self.address,
            from = %opts.from,
            value = %opts.value,
            calldata_len = data.len(),
            "submitting transaction"
        );
        self.backend
            .send_transaction(TransactionRequest {
                to: self.address,
                from: opts.from,
                value: opts.value,
                data: Bytes::from(data),
                gas_limit: opts.gas_limit,
                gas_price: opts.gas_price,
                nonce: opts.nonce,
            })
            .await
            .map_err(|err| self.resolve_backend_error(err))
    }

    /// Encode, execute read-only, and decode the declared outputs of any
    /// declared method.
    pub async fn call_raw(
        &self,
        opts: &CallOpts,
        value: U256,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ClientError> {
        let data = self.abi.encode_call(method, args)?;
        tracing::debug!(method, to = %self.address, "read-only call");
        let output = self
            .backend
            .call(CallRequest {
                to: self.address,
                from: opts.from,
                value,
                data: Bytes::from(data),
                block: opts.block,
            })
            .await
            .map_err(|err| self.resolve_backend_error(err))?;
        Ok(self.abi.decode_output(method, &output)?)
    }

    /// Chain rejections carrying revert data are resolved against the
    /// schema so the caller sees the declared error name and arguments;
    /// everything else passes through untouched.
    fn resolve_backend_error(&self, err: crate::backend::BackendError) -> ClientError {
        match err {
            crate::backend::BackendError::Reverted { data } => {
                ClientError::Reverted(decode_revert(&self.abi, &data))
            }
            other => ClientError::Backend(other),
        }
    }

    // ─── Typed method wrappers ───────────────────────────────────────────

    /// `executeWithETH(intent, swapData)` — payable; attach the input
    /// amount via `opts.value`.
    pub async fn execute_with_eth(
        &self,
        opts: &TransactOpts,
        intent: &Intent,
        swap: &SwapCall,
    ) -> Result<TxHash, ClientError> {
        self.transact_raw(
            opts,
            "executeWithETH",
            &[intent.as_sol_value(), swap.as_sol_value()],
        )
        .await
    }

    /// `executeWithPermit(intent, signature, swapData)`.
    pub async fn execute_with_permit(
        &self,
        opts: &TransactOpts,
        intent: &Intent,
        signature: Bytes,
        swap: &SwapCall,
    ) -> Result<TxHash, ClientError> {
        self.transact_raw(
            opts,
            "executeWithPermit",
            &[
                intent.as_sol_value(),
                DynSolValue::Bytes(signature.to_vec()),
                swap.as_sol_value(),
            ],
        )
        .await
    }

    /// `rescueTokens(token, amount)`.
    pub async fn rescue_tokens(
        &self,
        opts: &TransactOpts,
        token: Address,
        amount: U256,
    ) -> Result<TxHash, ClientError> {
        self.transact_raw(
            opts,
            "rescueTokens",
            &[DynSolValue::Address(token), DynSolValue::Uint(amount, 256)],
        )
        .await
    }

    /// `setExecutor(_newExecutor)`.
    pub async fn set_executor(
        &self,
        opts: &TransactOpts,
        new_executor: Address,
    ) -> Result<TxHash, ClientError> {
        self.transact_raw(opts, "setExecutor", &[DynSolValue::Address(new_executor)])
            .await
    }

    /// `setSwapTargets(targets, allowed)`.
    pub async fn set_swap_targets(
        &self,
        opts: &TransactOpts,
        targets: Vec<Address>,
        allowed: Vec<bool>,
    ) -> Result<TxHash, ClientError> {
        self.transact_raw(
            opts,
            "setSwapTargets",
            &[
                DynSolValue::Array(targets.into_iter().map(DynSolValue::Address).collect()),
                DynSolValue::Array(allowed.into_iter().map(DynSolValue::Bool).collect()),
            ],
        )
        .await
    }

    /// `setTreasury(_newTreasury)`.
    pub async fn set_treasury(
        &self,
        opts: &TransactOpts,
        new_treasury: Address,
    ) -> Result<TxHash, ClientError> {
        self.transact_raw(opts, "setTreasury", &[DynSolValue::Address(new_treasury)])
            .await
    }

    /// Simulate `executeWithETH` and decode `(received, surplus)`.
    pub async fn simulate_execute_with_eth(
        &self,
        opts: &CallOpts,
        value: U256,
        intent: &Intent,
        swap: &SwapCall,
    ) -> Result<ExecuteOutcome, ClientError> {
        let values = self
            .call_raw(
                opts,
                value,
                "executeWithETH",
                &[intent.as_sol_value(), swap.as_sol_value()],
            )
            .await?;
        Ok(ExecuteOutcome::from_values(values)?)
    }

    /// Simulate `executeWithPermit` and decode `(received, surplus)`.
    pub async fn simulate_execute_with_permit(
        &self,
        opts: &CallOpts,
        intent: &Intent,
        signature: Bytes,
        swap: &SwapCall,
    ) -> Result<ExecuteOutcome, ClientError> {
        let values = self
            .call_raw(
                opts,
                U256::ZERO,
                "executeWithPermit",
                &[
                    intent.as_sol_value(),
                    DynSolValue::Bytes(signature.to_vec()),
                    swap.as_sol_value(),
                ],
            )
            .await?;
        Ok(ExecuteOutcome::from_values(values)?)
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Decode a single raw log as event `E`.
    pub fn parse_event<E: ContractEvent>(&self, log: RawLog) -> Result<Decoded<E>, ClientError> {
        let decoder = EventDecoder::for_event::<E>(&self.abi)?;
        Ok(decoder.decode_as::<E>(log)?)
    }

    /// Query historical logs matching `selection` and iterate the decoded
    /// records in chain order.
    pub async fn filter_events<S: EventSelection>(
        &self,
        selection: &S,
        opts: &FilterOpts,
    ) -> Result<EventIterator<S::Event>, ClientError> {
        let decoder = EventDecoder::for_event::<S::Event>(&self.abi)?;
        let filter = self.log_filter(selection, &decoder, Some(opts.from_block), opts.to_block);
        tracing::debug!(
            event = <S::Event>::NAME,
            from_block = opts.from_block,
            to_block = ?opts.to_block,
            "querying historical logs"
        );
        let logs = self
            .backend
            .get_logs(&filter)
            .await
            .map_err(|err| self.resolve_backend_error(err))?;
        Ok(EventIterator::new(
            decoder,
            crate::backend::LogSubscription::from_logs(logs),
        ))
    }

    /// Subscribe to future logs matching `selection`, decoding and
    /// forwarding each record to `sink` until failure or cancellation.
    pub async fn watch_events<S: EventSelection>(
        &self,
        selection: &S,
        opts: &WatchOpts,
        sink: mpsc::Sender<Decoded<S::Event>>,
    ) -> Result<EventWatcher, ClientError> {
        let decoder = EventDecoder::for_event::<S::Event>(&self.abi)?;
        let filter = self.log_filter(selection, &decoder, opts.from_block, None);
        tracing::debug!(event = <S::Event>::NAME, "opening log subscription");
        let sub = self
            .backend
            .subscribe_logs(&filter)
            .await
            .map_err(|err| self.resolve_backend_error(err))?;
        Ok(watch::spawn::<S::Event>(decoder, sub, sink))
    }

    fn log_filter<S: EventSelection>(
        &self,
        selection: &S,
        decoder: &EventDecoder,
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> LogFilter {
        let mut topics: Vec<Option<Vec<B256>>> = vec![Some(vec![decoder.signature()])];
        for criteria in selection.indexed_criteria() {
            topics.push(if criteria.is_empty() {
                None
            } else {
                Some(criteria)
            });
        }
        LogFilter {
            address: self.address,
            topics,
            from_block,
            to_block,
        }
    }
}
