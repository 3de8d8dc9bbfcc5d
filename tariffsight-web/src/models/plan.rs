//! Plan catalog entry

use serde::{Deserialize, Serialize};

use super::user::PlanId;

/// One subscription tier in the catalog
///
/// Plans are static configuration (admin-editable), not user data. The
/// `popular` flag is display-only and never affects entitlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Nominal price as a currency-formatted string, e.g. "2.499 TL"
    pub price: String,
    /// Credit allotment granted on purchase; -1 means unlimited
    pub credits: i64,
    pub features: Vec<String>,
    pub popular: bool,
    pub sort_order: i64,
}
