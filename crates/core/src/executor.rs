//! Liquidation executor.
//!
//! Applies a partial liquidation to one position: writes the reduced amounts,
//! appends the audit transaction and finalizes the liquidation event. A
//! failed step leaves the position with its pre-liquidation amounts.

use dashmap::DashSet;
use monitor_store::{
    NewTransaction, Position, PositionChanges, PositionId, PositionStore, TransactionKind,
    TransactionLedger, TransactionStatus,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::LiquidationConfig;
use crate::error::MonitorError;
use crate::events::{EventDraft, EventLog, LiquidationEvent, TriggerSource};
use crate::health::HealthReport;

/// Fraction of the outstanding debt repaid per liquidation.
pub const CLOSE_FACTOR: f64 = 0.5;

/// Share of the penalty credited to the liquidator.
pub const LIQUIDATOR_REWARD_SHARE: f64 = 0.5;

/// Amounts moved by one partial liquidation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidationPlan {
    /// Debt repaid (debt asset units)
    pub liquidation_amount: f64,
    /// Collateral equivalent of the repaid debt
    pub collateral_to_seize: f64,
    pub penalty: f64,
    pub liquidator_reward: f64,
    /// collateral_to_seize + penalty
    pub total_seized: f64,
    pub new_debt: f64,
    /// Never negative
    pub new_collateral: f64,
}

impl LiquidationPlan {
    /// Compute the plan from current amounts and prices.
    pub fn compute(
        debt_amount: f64,
        collateral_amount: f64,
        debt_price: f64,
        collateral_price: f64,
        penalty_rate: f64,
    ) -> Self {
        let liquidation_amount = (debt_amount * CLOSE_FACTOR).min(debt_amount);
        let collateral_to_seize = liquidation_amount * debt_price / collateral_price;
        let penalty = collateral_to_seize * penalty_rate;
        let liquidator_reward = penalty * LIQUIDATOR_REWARD_SHARE;
        let total_seized = collateral_to_seize + penalty;

        Self {
            liquidation_amount,
            collateral_to_seize,
            penalty,
            liquidator_reward,
            total_seized,
            new_debt: debt_amount - liquidation_amount,
            new_collateral: (collateral_amount - total_seized).max(0.0),
        }
    }

    /// Whether the seizure wiped out the remaining collateral.
    pub fn is_clamped(&self, collateral_amount: f64) -> bool {
        self.total_seized > collateral_amount
    }
}

/// Marks a position as being liquidated until dropped.
struct InFlightGuard<'a> {
    in_flight: &'a DashSet<PositionId>,
    position_id: PositionId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.position_id);
    }
}

/// Executes liquidations against the position store and ledger.
pub struct LiquidationExecutor {
    positions: Arc<dyn PositionStore>,
    ledger: Arc<dyn TransactionLedger>,
    events: Arc<EventLog>,
    /// Positions with a liquidation currently being applied
    in_flight: DashSet<PositionId>,
}

impl LiquidationExecutor {
    pub fn new(
        positions: Arc<dyn PositionStore>,
        ledger: Arc<dyn TransactionLedger>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            positions,
            ledger,
            events,
            in_flight: DashSet::new(),
        }
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    /// Whether a liquidation of `position_id` is being applied right now.
    pub fn is_in_flight(&self, position_id: PositionId) -> bool {
        self.in_flight.contains(&position_id)
    }

    fn claim(&self, position_id: PositionId) -> Result<InFlightGuard<'_>, MonitorError> {
        if !self.in_flight.insert(position_id) {
            return Err(MonitorError::InProgress(position_id));
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            position_id,
        })
    }

    /// Liquidate `position`, which `report` classified as liquidatable.
    ///
    /// Returns the finalized event; a failed mutation yields `Ok` with a
    /// `failed` event. `Err` means no event was created: the position is
    /// already being liquidated, it changed since it was evaluated, or it
    /// could not be read.
    #[instrument(skip_all, fields(position = position.id, source = %source))]
    pub async fn execute(
        &self,
        position: &Position,
        report: &HealthReport,
        config: &LiquidationConfig,
        source: TriggerSource,
    ) -> Result<LiquidationEvent, MonitorError> {
        let id = position.id;
        if !report.is_liquidatable() {
            return Err(MonitorError::NotLiquidatable(id, "health factor above threshold"));
        }
        let (collateral_asset_id, collateral_amount) = position
            .collateral()
            .ok_or(MonitorError::NotLiquidatable(id, "no collateral"))?;

        let _guard = self.claim(id)?;

        // Amounts must still match what the evaluator saw.
        let current = self
            .positions
            .get_position(id)
            .await
            .map_err(|err| MonitorError::from_position_lookup(id, err))?;
        if current.debt_amount != position.debt_amount
            || current.collateral_amount != position.collateral_amount
        {
            debug!(position = id, "Position changed since evaluation");
            return Err(MonitorError::NotLiquidatable(id, "position changed since evaluation"));
        }

        let plan = LiquidationPlan::compute(
            position.debt_amount,
            collateral_amount,
            report.debt_price,
            report.collateral_price,
            config.liquidation_penalty,
        );
        if plan.is_clamped(collateral_amount) {
            warn!(
                position = id,
                collateral = collateral_amount,
                seized = plan.total_seized,
                "Seizure exceeds collateral, clamping to zero"
            );
        }

        let event = self.events.open(EventDraft {
            position_id: id,
            user_id: position.user_id,
            debt_asset_id: position.debt_asset_id,
            collateral_asset_id,
            health_factor: report.health_factor,
            liquidated_debt: plan.liquidation_amount,
            collateral_seized: plan.total_seized,
            penalty: plan.penalty,
            liquidator_reward: plan.liquidator_reward,
            source,
        });

        info!(
            event = event.id,
            position = id,
            user = position.user_id,
            hf = report.health_factor,
            repay = plan.liquidation_amount,
            seize = plan.total_seized,
            "Liquidating position"
        );

        let changes = PositionChanges::amounts(plan.new_debt, plan.new_collateral);
        if let Err(err) = self.positions.update_position(id, changes).await {
            error!(event = event.id, position = id, error = %err, "Position update failed");
            return Ok(self.fail(event, format!("position update failed: {}", err)));
        }

        let tx = NewTransaction {
            kind: TransactionKind::Liquidation,
            user_id: position.user_id,
            asset_id: position.debt_asset_id,
            amount: plan.liquidation_amount,
            from_asset_id: Some(position.debt_asset_id),
            to_asset_id: Some(collateral_asset_id),
            status: TransactionStatus::Completed,
        };

        match self.ledger.record_transaction(tx).await {
            Ok(tx) => {
                let completed = self.events.complete(event.id, tx.id).unwrap_or(event);
                info!(
                    event = completed.id,
                    position = id,
                    tx = tx.id,
                    new_debt = plan.new_debt,
                    new_collateral = plan.new_collateral,
                    "Liquidation completed"
                );
                Ok(completed)
            }
            Err(err) => {
                error!(event = event.id, position = id, error = %err, "Ledger write failed, restoring position");

                let restore = PositionChanges::amounts(position.debt_amount, collateral_amount);
                if let Err(restore_err) = self.positions.update_position(id, restore).await {
                    error!(
                        event = event.id,
                        position = id,
                        error = %restore_err,
                        debt = position.debt_amount,
                        collateral = collateral_amount,
                        "Failed to restore position after ledger failure"
                    );
                }

                Ok(self.fail(event, format!("ledger write failed: {}", err)))
            }
        }
    }

    fn fail(&self, event: LiquidationEvent, reason: String) -> LiquidationEvent {
        let id = event.id;
        match self.events.fail(id, reason) {
            Some(failed) => failed,
            None => {
                warn!(event = id, "Failed event missing from log");
                event
            }
        }
    }
}
