//! Domain models for tariffsight-web

pub mod analysis;
pub mod plan;
pub mod user;

pub use analysis::{AnalysisRecord, ClassificationResult, Invoice};
pub use plan::Plan;
pub use user::{
    Discount, Permission, PlanId, Role, SubscriptionStatus, UserRecord, VerificationChannel,
    FREE_TIER_CREDITS, UNLIMITED_CREDITS,
};
