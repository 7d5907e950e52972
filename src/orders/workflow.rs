// Checkout workflow
//
// Drives one checkout attempt through the state machine:
// Collecting → Validating → Pricing → (AwaitingPayment) → Persisting →
// ClearingCart → Confirmed, or Failed from Validating, AwaitingPayment
// and Persisting.
//
// Gateway attempts are parked in memory between the request that creates
// the payment order and the request that reports the widget's outcome.
// An attempt whose payment was captured but whose order could not be saved
// is parked again so the save alone can be retried.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::auth::AuthenticatedUser;
use crate::cart::CartStore;
use crate::orders::{
    idempotency_key, CheckoutError, CheckoutRequest, CheckoutResponse, CheckoutState,
    CheckoutTrail, InFlightGuard, InFlightTicket, NewOrder, OrderConfirmation, OrderLineItem,
    OrderRepository, PaymentMode, PaymentReport, PendingPayment,
};
use crate::payment::{GatewayOrder, PaymentGateway};
use crate::pricing::{CouponTable, PricingBreakdown, PricingEngine};

/// Everything frozen once pricing is done
#[derive(Debug, Clone)]
struct CheckoutContext {
    owner: String,
    owner_name: String,
    line_items: Vec<OrderLineItem>,
    pricing: PricingBreakdown,
    payment_mode: PaymentMode,
    phone: String,
    address: String,
}

/// Unpaid attempts are swept after this long when no payment timeout is set
pub const ABANDONED_ATTEMPT_HORIZON: Duration = Duration::from_secs(24 * 60 * 60);

/// A gateway attempt waiting for the payment widget
#[derive(Debug)]
struct PendingAttempt {
    context: CheckoutContext,
    gateway_order: GatewayOrder,
    trail: CheckoutTrail,
    started: Instant,
    ticket: InFlightTicket,
    /// Verified payment id whose order still has to be saved
    captured_payment: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutWorkflow {
    cart: CartStore,
    orders: OrderRepository,
    payments: Arc<PaymentGateway>,
    coupons: Arc<CouponTable>,
    guard: InFlightGuard,
    pending: Arc<Mutex<HashMap<Uuid, PendingAttempt>>>,
    payment_timeout: Option<Duration>,
    abandon_after: Duration,
}

impl CheckoutWorkflow {
    pub fn new(
        cart: CartStore,
        orders: OrderRepository,
        payments: Arc<PaymentGateway>,
        coupons: Arc<CouponTable>,
        payment_timeout: Option<Duration>,
    ) -> Self {
        Self {
            cart,
            orders,
            payments,
            coupons,
            guard: InFlightGuard::new(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            payment_timeout,
            abandon_after: ABANDONED_ATTEMPT_HORIZON,
        }
    }

    /// Start a checkout attempt for the caller's current cart.
    ///
    /// Cash on delivery runs straight through to `confirmed`. Gateway
    /// payments stop at `awaiting_payment` and return the payment order
    /// the widget must be opened with.
    pub async fn start(
        &self,
        user: &AuthenticatedUser,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, CheckoutError> {
        self.prune_expired().await;

        let owner = user.email.as_str();
        let mut trail = CheckoutTrail::new();

        let items = self.cart.refresh(owner).await?;

        advance(&mut trail, CheckoutState::Validating)?;

        let mut errors = match request.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if items.is_empty() {
            errors.add("cart", ValidationError::new("empty"));
        }
        if !errors.errors().is_empty() {
            advance(&mut trail, CheckoutState::Failed)?;
            info!(owner, "Checkout failed validation");
            return Err(CheckoutError::Validation(errors));
        }

        let subtotal = PricingEngine::calculate_subtotal(&items);
        let coupon = match request
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => match self.coupons.resolve(code, subtotal) {
                Ok(coupon) => Some(coupon),
                Err(rejection) => {
                    advance(&mut trail, CheckoutState::Failed)?;
                    return Err(rejection.into());
                }
            },
            None => None,
        };

        let ticket = self
            .guard
            .acquire(idempotency_key(owner, &items, Utc::now()))
            .ok_or(CheckoutError::DuplicateSubmission)?;

        advance(&mut trail, CheckoutState::Pricing)?;
        let pricing = PricingEngine::compute_pricing(&items, coupon.as_ref());

        let context = CheckoutContext {
            owner: owner.to_string(),
            owner_name: request.address.full_name.trim().to_string(),
            line_items: items.iter().map(OrderLineItem::from).collect(),
            pricing,
            payment_mode: request.payment_mode,
            phone: request.address.normalized_phone(),
            address: request.address.flattened(),
        };

        match context.payment_mode {
            PaymentMode::CashOnDelivery => {
                let result = self.finalize(&context, &mut trail, None).await;
                drop(ticket);
                result
            }
            PaymentMode::Gateway => self.await_payment(context, trail, ticket).await,
        }
    }

    /// Resume a gateway attempt after the widget reported success.
    ///
    /// If the payment was already verified on an earlier call and only the
    /// order save failed, the save is retried without verifying again.
    pub async fn complete_payment(
        &self,
        user: &AuthenticatedUser,
        attempt_id: Uuid,
        report: PaymentReport,
    ) -> Result<CheckoutResponse, CheckoutError> {
        let attempt = self.take_attempt(user, attempt_id).await?;
        let PendingAttempt {
            context,
            gateway_order,
            mut trail,
            started,
            ticket,
            captured_payment,
        } = attempt;

        let payment_id = match captured_payment {
            Some(payment_id) => {
                info!(
                    owner = %context.owner,
                    %attempt_id,
                    payment_id = %payment_id,
                    "Retrying order save for a captured payment"
                );
                payment_id
            }
            None => {
                if self.is_expired(started) {
                    advance(&mut trail, CheckoutState::Failed)?;
                    warn!(owner = %context.owner, %attempt_id, "Payment reported after the deadline");
                    return Err(CheckoutError::PaymentCancelled);
                }

                let verified = self.payments.verify_payment_signature(
                    &gateway_order.id,
                    &report.payment_id,
                    &report.signature,
                );
                match verified {
                    Ok(true) => {}
                    Ok(false) => {
                        advance(&mut trail, CheckoutState::Failed)?;
                        warn!(
                            owner = %context.owner,
                            %attempt_id,
                            gateway_order_id = %gateway_order.id,
                            "Payment could not be verified"
                        );
                        return Err(CheckoutError::PaymentUnverified);
                    }
                    Err(err) => {
                        advance(&mut trail, CheckoutState::Failed)?;
                        return Err(err.into());
                    }
                }
                report.payment_id
            }
        };

        let resume_trail = trail.clone();
        let outcome = self
            .finalize(&context, &mut trail, Some(payment_id.clone()))
            .await;
        match outcome {
            Err(err @ CheckoutError::OrderSaveFailed(_)) => {
                warn!(
                    owner = %context.owner,
                    %attempt_id,
                    payment_id = %payment_id,
                    "Captured payment kept for a retried save"
                );
                self.pending.lock().await.insert(
                    attempt_id,
                    PendingAttempt {
                        context,
                        gateway_order,
                        trail: resume_trail,
                        started,
                        ticket,
                        captured_payment: Some(payment_id),
                    },
                );
                Err(err)
            }
            result => result,
        }
    }

    /// Close a gateway attempt the customer dismissed.
    ///
    /// An attempt whose payment was already captured cannot be cancelled.
    pub async fn cancel_payment(
        &self,
        user: &AuthenticatedUser,
        attempt_id: Uuid,
    ) -> Result<CheckoutResponse, CheckoutError> {
        let mut attempt = self.take_attempt(user, attempt_id).await?;
        if attempt.captured_payment.is_some() {
            self.pending.lock().await.insert(attempt_id, attempt);
            return Err(CheckoutError::PaymentCaptured(attempt_id));
        }
        advance(&mut attempt.trail, CheckoutState::Failed)?;
        info!(owner = %attempt.context.owner, %attempt_id, "Payment cancelled");
        Err(CheckoutError::PaymentCancelled)
    }

    /// Number of gateway attempts waiting for the widget
    pub async fn pending_attempts(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn await_payment(
        &self,
        context: CheckoutContext,
        mut trail: CheckoutTrail,
        ticket: InFlightTicket,
    ) -> Result<CheckoutResponse, CheckoutError> {
        advance(&mut trail, CheckoutState::AwaitingPayment)?;

        let attempt_id = Uuid::new_v4();
        let receipt = format!("rcpt_{}", attempt_id.simple());
        let gateway_order = match self
            .payments
            .create_payment_order(
                context.pricing.total_in_subunits(),
                self.payments.currency(),
                &receipt,
            )
            .await
        {
            Ok(order) => order,
            Err(err) => {
                advance(&mut trail, CheckoutState::Failed)?;
                return Err(err.into());
            }
        };

        let response = CheckoutResponse {
            status: CheckoutState::AwaitingPayment,
            confirmation: None,
            payment: Some(PendingPayment {
                attempt_id,
                gateway_order: gateway_order.clone(),
                key_id: self.payments.key_id().to_string(),
                pricing: context.pricing.clone(),
            }),
            trail: trail.states().to_vec(),
        };

        let owner = context.owner.clone();
        let gateway_order_id = gateway_order.id.clone();
        let amount = gateway_order.amount;

        let mut pending = self.pending.lock().await;
        pending.insert(
            attempt_id,
            PendingAttempt {
                context,
                gateway_order,
                trail,
                started: Instant::now(),
                ticket,
                captured_payment: None,
            },
        );
        info!(
            owner = %owner,
            %attempt_id,
            gateway_order_id = %gateway_order_id,
            amount,
            pending = pending.len(),
            "Awaiting payment"
        );

        Ok(response)
    }

    /// Persist the order, then clear the cart.
    ///
    /// A failed save leaves the cart untouched. A failed clear is logged
    /// and the attempt still confirms.
    async fn finalize(
        &self,
        context: &CheckoutContext,
        trail: &mut CheckoutTrail,
        payment_reference: Option<String>,
    ) -> Result<CheckoutResponse, CheckoutError> {
        advance(trail, CheckoutState::Persisting)?;

        let new_order = NewOrder {
            owner_email: context.owner.clone(),
            owner_name: context.owner_name.clone(),
            line_items: context.line_items.clone(),
            pricing: context.pricing.clone(),
            payment_mode: context.payment_mode,
            payment_reference,
            phone: context.phone.clone(),
            delivery_address: context.address.clone(),
            placed_at: Utc::now(),
        };

        let order = match self.orders.create(&new_order).await {
            Ok(order) => order,
            Err(err) => {
                advance(trail, CheckoutState::Failed)?;
                error!(
                    owner = %context.owner,
                    error_code = "order_save_failed",
                    error = %err,
                    "Order could not be saved, cart kept"
                );
                return Err(CheckoutError::OrderSaveFailed(err));
            }
        };

        advance(trail, CheckoutState::ClearingCart)?;
        if let Err(err) = self.cart.clear_all(&context.owner).await {
            warn!(
                owner = %context.owner,
                order_id = %order.id,
                error_code = "cart_clear_failed",
                error = %err,
                "Order saved but the cart could not be cleared"
            );
        }

        advance(trail, CheckoutState::Confirmed)?;

        info!(
            owner = %context.owner,
            order_id = %order.id,
            total = %order.total,
            payment_mode = %order.payment_mode,
            "Checkout confirmed"
        );

        Ok(CheckoutResponse {
            status: CheckoutState::Confirmed,
            confirmation: Some(OrderConfirmation {
                order_id: order.id.clone(),
                total: order.total,
                payment_mode: order.payment_mode,
                address: order.delivery_address.clone(),
                order,
            }),
            payment: None,
            trail: trail.states().to_vec(),
        })
    }

    /// Remove the caller's pending attempt, or report it missing
    async fn take_attempt(
        &self,
        user: &AuthenticatedUser,
        attempt_id: Uuid,
    ) -> Result<PendingAttempt, CheckoutError> {
        let mut pending = self.pending.lock().await;
        let owned = pending
            .get(&attempt_id)
            .is_some_and(|attempt| attempt.context.owner == user.email);
        if !owned {
            return Err(CheckoutError::AttemptNotFound(attempt_id));
        }
        pending
            .remove(&attempt_id)
            .ok_or(CheckoutError::AttemptNotFound(attempt_id))
    }

    fn is_expired(&self, started: Instant) -> bool {
        self.payment_timeout
            .is_some_and(|timeout| started.elapsed() >= timeout)
    }

    /// Drop unpaid attempts past the payment deadline, or past the
    /// abandonment horizon when there is no deadline, releasing their keys.
    /// Captured payments are never dropped.
    async fn prune_expired(&self) {
        let horizon = self.payment_timeout.unwrap_or(self.abandon_after);
        let mut pending = self.pending.lock().await;
        let before = pending.len();
        pending.retain(|_, attempt| {
            attempt.captured_payment.is_some() || attempt.started.elapsed() < horizon
        });
        let pruned = before - pending.len();
        if pruned > 0 {
            info!(pruned, pending = pending.len(), "Expired payment attempts dropped");
        }
    }
}

fn advance(trail: &mut CheckoutTrail, next: CheckoutState) -> Result<(), CheckoutError> {
    trail
        .advance(next)
        .map(|_| ())
        .map_err(CheckoutError::InvalidTransition)
}
