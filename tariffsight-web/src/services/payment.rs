//! Payment gateway boundary
//!
//! Payment capture is an external collaborator; the service only needs a
//! confirm-payment seam. The stub gateway stands in until a hosted
//! processor integration lands.

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::models::PlanId;

/// Payment failure surfaced to the subscription flow
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider error: {0}")]
    Provider(String),
}

/// Receipt returned by a successful capture
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    /// Provider-side reference for reconciliation
    pub reference: Uuid,
    /// Amount actually charged, currency-formatted
    pub amount: String,
}

/// Seam to the hosted payment processor
pub trait PaymentGateway: Send + Sync {
    /// Capture the given amount for a plan purchase
    fn confirm_payment<'a>(
        &'a self,
        plan: PlanId,
        amount: &'a str,
        email: &'a str,
    ) -> BoxFuture<'a, Result<PaymentReceipt, PaymentError>>;
}

/// Gateway stub: always captures successfully
pub struct StubGateway;

impl PaymentGateway for StubGateway {
    fn confirm_payment<'a>(
        &'a self,
        plan: PlanId,
        amount: &'a str,
        email: &'a str,
    ) -> BoxFuture<'a, Result<PaymentReceipt, PaymentError>> {
        Box::pin(async move {
            tracing::info!(plan = plan.as_str(), %amount, %email, "Stub gateway captured payment");
            Ok(PaymentReceipt {
                reference: Uuid::new_v4(),
                amount: amount.to_string(),
            })
        })
    }
}

/// Gateway that declines every capture; test-only failure injection
pub struct DecliningGateway;

impl PaymentGateway for DecliningGateway {
    fn confirm_payment<'a>(
        &'a self,
        _plan: PlanId,
        _amount: &'a str,
        _email: &'a str,
    ) -> BoxFuture<'a, Result<PaymentReceipt, PaymentError>> {
        Box::pin(async move { Err(PaymentError::Declined("card declined".to_string())) })
    }
}
