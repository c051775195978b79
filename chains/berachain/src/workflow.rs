//! Harvest → check → approve → stake.
//!
//! One [`YieldFarmer::run`] walks the state machine
//! `Idle → Harvesting → Checking → Approving → Staking → Done`.
//! Every vault and every step is isolated: a failure is recorded in the
//! [`WorkflowTrace`], logged, and the run moves on.

use crate::client::ChainClient;
use crate::contracts::{ContractCall, ContractMethod};
use crate::gateway::{ChainRpc, ContractCallGateway};
use crate::pipeline::{SubmitOutcome, TransactionPipeline, TxFailure};
use crate::registry::{format_amount, ContractRegistry, Token, Vault, VAULT_SHARE_DECIMALS};
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{GasConfig, Workflow};
use ethers::signers::Signer;
use ethers::types::{Address, U256};
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, warn};

/// What to do when the approval step did not confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Stake regardless of the approval outcome.
    #[default]
    Optimistic,
    /// Stake only after a confirmed approval or a sufficient existing allowance.
    VerifyBeforeStake,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FarmSettings {
    pub gas: GasConfig,
    /// Balances strictly below this (in base units) are not acted on.
    pub dust_threshold: U256,
    pub approval_policy: ApprovalPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Harvesting,
    Checking,
    Approving { balance: U256 },
    Staking { balance: U256 },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BelowMinimum,
    GasAboveCeiling,
    AllowanceSufficient,
    ApprovalUnconfirmed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::BelowMinimum => "below minimum",
            SkipReason::GasAboveCeiling => "gas price above ceiling",
            SkipReason::AllowanceSufficient => "allowance sufficient",
            SkipReason::ApprovalUnconfirmed => "approval not confirmed",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Success,
    Reverted,
    TimedOut,
    Skipped(SkipReason),
    ConnectionFailure,
}

impl From<&SubmitOutcome> for StepResult {
    fn from(outcome: &SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Confirmed(_) => StepResult::Success,
            SubmitOutcome::AdmissionRejected { .. } => {
                StepResult::Skipped(SkipReason::GasAboveCeiling)
            }
            SubmitOutcome::Failed(TxFailure::Reverted { .. }) => StepResult::Reverted,
            SubmitOutcome::Failed(TxFailure::TimedOut { .. }) => StepResult::TimedOut,
            SubmitOutcome::Failed(TxFailure::Connection { .. }) => StepResult::ConnectionFailure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Harvest { vault: String },
    CheckBalance,
    Approve,
    Stake { amount: U256 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub result: StepResult,
}

/// In-memory record of one run, returned to the caller and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTrace {
    pub records: Vec<StepRecord>,
    pub final_state: WorkflowState,
}

impl Default for WorkflowTrace {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            final_state: WorkflowState::Idle,
        }
    }
}

impl WorkflowTrace {
    fn record(&mut self, step: Step, result: StepResult) {
        self.records.push(StepRecord { step, result });
    }

    pub fn harvest_results(&self) -> Vec<(&str, StepResult)> {
        self.records
            .iter()
            .filter_map(|r| match &r.step {
                Step::Harvest { vault } => Some((vault.as_str(), r.result)),
                _ => None,
            })
            .collect()
    }

    pub fn result_of(&self, wanted: fn(&Step) -> bool) -> Option<StepResult> {
        self.records
            .iter()
            .find(|r| wanted(&r.step))
            .map(|r| r.result)
    }

    pub fn approve_result(&self) -> Option<StepResult> {
        self.result_of(|s| matches!(s, Step::Approve))
    }

    pub fn stake_result(&self) -> Option<StepResult> {
        self.result_of(|s| matches!(s, Step::Stake { .. }))
    }
}

pub struct YieldFarmer<'a, R, S> {
    client: &'a ChainClient<R, S>,
    registry: &'a ContractRegistry,
    pipeline: TransactionPipeline<'a, R, S>,
    settings: FarmSettings,
}

impl<'a, R, S> YieldFarmer<'a, R, S>
where
    R: ChainRpc,
    S: Signer,
{
    pub fn new(
        client: &'a ChainClient<R, S>,
        registry: &'a ContractRegistry,
        pipeline: TransactionPipeline<'a, R, S>,
        settings: FarmSettings,
    ) -> Self {
        Self {
            client,
            registry,
            pipeline,
            settings,
        }
    }

    /// Executes one full harvest/approve/stake cycle.
    pub async fn run(&self) -> WorkflowTrace {
        info!("Starting yield farming process");
        let mut trace = WorkflowTrace::default();
        let mut state = WorkflowState::Harvesting;

        loop {
            trace.final_state = state;
            state = match state {
                WorkflowState::Idle | WorkflowState::Harvesting => {
                    self.harvest_vaults(&mut trace).await;
                    WorkflowState::Checking
                }
                WorkflowState::Checking => match self.check_reward_balance(&mut trace).await {
                    Some(balance) => WorkflowState::Approving { balance },
                    None => WorkflowState::Done,
                },
                WorkflowState::Approving { balance } => {
                    let approval = self.ensure_allowance(&mut trace).await;
                    if self.may_stake_after(approval) {
                        WorkflowState::Staking { balance }
                    } else {
                        warn!("Approval not confirmed, skipping stake this cycle");
                        trace.record(
                            Step::Stake { amount: balance },
                            StepResult::Skipped(SkipReason::ApprovalUnconfirmed),
                        );
                        WorkflowState::Done
                    }
                }
                WorkflowState::Staking { balance } => {
                    self.stake_rewards(balance, &mut trace).await;
                    WorkflowState::Done
                }
                WorkflowState::Done => break,
            };
        }

        trace
    }

    fn may_stake_after(&self, approval: StepResult) -> bool {
        match self.settings.approval_policy {
            ApprovalPolicy::Optimistic => true,
            ApprovalPolicy::VerifyBeforeStake => matches!(
                approval,
                StepResult::Success | StepResult::Skipped(SkipReason::AllowanceSufficient)
            ),
        }
    }

    async fn harvest_vaults(&self, trace: &mut WorkflowTrace) {
        info!(
            "Starting vault harvest process ({} vaults)",
            self.registry.vaults.len()
        );

        for vault in &self.registry.vaults {
            let result = self.harvest_vault(vault).await;
            trace.record(
                Step::Harvest {
                    vault: vault.name.clone(),
                },
                result,
            );
        }
    }

    async fn harvest_vault(&self, vault: &Vault) -> StepResult {
        info!(
            "Harvesting rewards from vault: {} ({:?})",
            vault.name, vault.address
        );

        let stake_balance = match self
            .client
            .rpc()
            .balance_of(vault.address, self.client.address())
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                error!("Failed to check balance for {}: {}", vault.name, e);
                return StepResult::ConnectionFailure;
            }
        };

        let shown = format_amount(stake_balance, VAULT_SHARE_DECIMALS);
        info!("Stake balance for {}: {}", vault.name, shown);

        if stake_balance < self.settings.dust_threshold {
            info!(
                "Skipping harvest for {}: stake balance {} below minimum {}",
                vault.name,
                shown,
                format_amount(self.settings.dust_threshold, VAULT_SHARE_DECIMALS)
            );
            return StepResult::Skipped(SkipReason::BelowMinimum);
        }

        let outcome = self
            .submit(
                ContractCall::new(vault.address, ContractMethod::GetReward),
                self.settings.gas.limit_harvest(),
            )
            .await;
        self.log_outcome(&format!("Harvest {}", vault.name), &outcome);
        StepResult::from(&outcome)
    }

    /// Returns the reward balance when it is worth staking.
    async fn check_reward_balance(&self, trace: &mut WorkflowTrace) -> Option<U256> {
        let token = &self.registry.reward_token;
        let balance = match self
            .client
            .rpc()
            .balance_of(token.address, self.client.address())
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                error!("Failed to read {} balance: {}", token.name, e);
                trace.record(Step::CheckBalance, StepResult::ConnectionFailure);
                return None;
            }
        };

        info!(
            "Current {} balance: {}",
            token.name,
            token.format(balance)
        );

        if balance < self.settings.dust_threshold {
            info!("No significant {} to stake, skipping", token.name);
            trace.record(Step::CheckBalance, StepResult::Skipped(SkipReason::BelowMinimum));
            return None;
        }

        trace.record(Step::CheckBalance, StepResult::Success);
        Some(balance)
    }

    async fn ensure_allowance(&self, trace: &mut WorkflowTrace) -> StepResult {
        let result = self.approve_if_needed().await;
        trace.record(Step::Approve, result);
        result
    }

    async fn approve_if_needed(&self) -> StepResult {
        let token = &self.registry.reward_token;
        let spender = self.registry.staking_vault.address;
        info!(
            "Checking {} allowance for {}",
            token.name, self.registry.staking_vault.name
        );

        let allowance = match self.read_allowance(token, self.client.address(), spender).await {
            Ok(allowance) => allowance,
            Err(result) => return result,
        };
        info!(
            "Current {} allowance: {}",
            token.name,
            token.format(allowance)
        );

        if allowance >= token.one_unit() {
            return StepResult::Skipped(SkipReason::AllowanceSufficient);
        }

        info!(
            "Approving {} for {}",
            self.registry.staking_vault.name, token.name
        );
        let outcome = self
            .submit(
                ContractCall::new(
                    token.address,
                    ContractMethod::Approve {
                        spender,
                        amount: U256::MAX,
                    },
                ),
                self.settings.gas.limit_approve(),
            )
            .await;
        self.log_outcome(&format!("Approve {}", token.name), &outcome);
        StepResult::from(&outcome)
    }

    async fn read_allowance(
        &self,
        token: &Token,
        owner: Address,
        spender: Address,
    ) -> Result<U256, StepResult> {
        let call = ContractCall::new(token.address, ContractMethod::Allowance { owner, spender });
        self.client.rpc().call(&call).await.map_err(|e| {
            error!("Failed to read {} allowance: {}", token.name, e);
            StepResult::ConnectionFailure
        })
    }

    async fn stake_rewards(&self, amount: U256, trace: &mut WorkflowTrace) {
        let token = &self.registry.reward_token;
        info!(
            "Staking {}: Amount={}",
            token.name,
            token.format(amount)
        );

        let outcome = self
            .submit(
                ContractCall::new(
                    self.registry.staking_vault.address,
                    ContractMethod::Stake { amount },
                ),
                self.settings.gas.limit_stake(),
            )
            .await;
        self.log_outcome(&format!("Stake {}", token.name), &outcome);

        let result = StepResult::from(&outcome);
        if result == StepResult::Success {
            info!("Yield farming cycle completed SUCCESS");
        } else {
            error!("Yield farming cycle FAILED during staking");
        }
        trace.record(Step::Stake { amount }, result);
    }

    async fn submit(&self, call: ContractCall, gas_limit: u64) -> SubmitOutcome {
        let data = self.client.rpc().prepare(&call);
        self.pipeline
            .submit(call.to, data, gas_limit, self.settings.gas.ceiling())
            .await
    }

    fn log_outcome(&self, label: &str, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Confirmed(receipt) => info!(
                "{} SUCCESS: {:?} in block {}",
                label,
                receipt.transaction_hash,
                receipt
                    .block_number
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "?".to_string())
            ),
            SubmitOutcome::AdmissionRejected { .. } => {
                warn!("{} skipped: gas price above ceiling", label)
            }
            SubmitOutcome::Failed(failure) => error!("{} FAILED: {}", label, failure),
        }
    }
}

#[async_trait]
impl<'a, R, S> Workflow for YieldFarmer<'a, R, S>
where
    R: ChainRpc,
    S: Signer,
{
    fn name(&self) -> &str {
        "yield_farm"
    }

    async fn run_once(&self) -> Result<()> {
        let trace = self.run().await;
        for record in &trace.records {
            tracing::debug!("{:?} -> {:?}", record.step, record.result);
        }

        let count = |f: fn(&StepResult) -> bool| trace.records.iter().filter(|r| f(&r.result)).count();
        info!(
            "Cycle finished: {} succeeded, {} skipped, {} failed",
            count(|r| *r == StepResult::Success),
            count(|r| matches!(r, StepResult::Skipped(_))),
            count(|r| {
                matches!(
                    r,
                    StepResult::Reverted | StepResult::TimedOut | StepResult::ConnectionFailure
                )
            })
        );
        Ok(())
    }
}
