use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// States of one checkout attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Collecting,
    Validating,
    Pricing,
    AwaitingPayment,
    Persisting,
    ClearingCart,
    Confirmed,
    Failed,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Collecting => "collecting",
            CheckoutState::Validating => "validating",
            CheckoutState::Pricing => "pricing",
            CheckoutState::AwaitingPayment => "awaiting_payment",
            CheckoutState::Persisting => "persisting",
            CheckoutState::ClearingCart => "clearing_cart",
            CheckoutState::Confirmed => "confirmed",
            CheckoutState::Failed => "failed",
        }
    }

    /// `Confirmed` and `Failed` end an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Confirmed | CheckoutState::Failed)
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service for checking checkout state transitions
pub struct CheckoutStateMachine;

impl CheckoutStateMachine {
    /// Check if a state transition is valid
    ///
    /// # Valid Transitions
    /// - Collecting → Validating
    /// - Validating → Pricing, Failed
    /// - Pricing → AwaitingPayment, Persisting
    /// - AwaitingPayment → Persisting, Failed
    /// - Persisting → ClearingCart, Failed
    /// - ClearingCart → Confirmed
    /// - Confirmed, Failed → (terminal)
    pub fn is_valid_transition(from: CheckoutState, to: CheckoutState) -> bool {
        use CheckoutState::*;

        matches!(
            (from, to),
            (Collecting, Validating)
                | (Validating, Pricing)
                | (Validating, Failed)
                | (Pricing, AwaitingPayment)
                | (Pricing, Persisting)
                | (AwaitingPayment, Persisting)
                | (AwaitingPayment, Failed)
                | (Persisting, ClearingCart)
                | (Persisting, Failed)
                | (ClearingCart, Confirmed)
        )
    }

    /// Attempt to transition from one state to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: CheckoutState, to: CheckoutState) -> Result<CheckoutState, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid checkout transition from {} to {}", from, to))
        }
    }
}

/// Records every state an attempt passes through
#[derive(Debug, Clone)]
pub struct CheckoutTrail {
    states: Vec<CheckoutState>,
}

impl CheckoutTrail {
    pub fn new() -> Self {
        Self {
            states: vec![CheckoutState::Collecting],
        }
    }

    pub fn current(&self) -> CheckoutState {
        self.states
            .last()
            .copied()
            .unwrap_or(CheckoutState::Collecting)
    }

    /// Move to `next`, refusing transitions the machine does not allow
    pub fn advance(&mut self, next: CheckoutState) -> Result<CheckoutState, String> {
        let state = CheckoutStateMachine::transition(self.current(), next)?;
        tracing::debug!(from = %self.current(), to = %state, "Checkout transition");
        self.states.push(state);
        Ok(state)
    }

    pub fn states(&self) -> &[CheckoutState] {
        &self.states
    }
}

impl Default for CheckoutTrail {
    fn default() -> Self {
        Self::new()
    }
}
