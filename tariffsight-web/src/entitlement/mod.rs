//! Entitlement engine
//!
//! Pure decision logic over the user record and the plan catalog. This
//! module answers three questions for the rest of the service: can the
//! user run an analysis right now, which result sections are visible or
//! locked, and what price applies to a plan selection.
//!
//! No function here performs I/O. Orchestration code (`services::*`)
//! invokes these decisions and persists the outcome through the atomic
//! operations in `db::users`.

pub mod access;
pub mod credits;
pub mod pricing;
pub mod visibility;

pub use access::{can_analyze, AccessDecision, DenyReason};
pub use credits::{consume_credit, grant_verification_credit};
pub use pricing::{price_for, DisplayPrice};
pub use visibility::{visibility, ResultSection, UpgradeTarget, Visibility};
