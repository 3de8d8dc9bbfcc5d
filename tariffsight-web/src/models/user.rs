//! User/entitlement record and its supporting enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default credit allotment for the free tier
pub const FREE_TIER_CREDITS: i64 = 3;

/// Sentinel credit value meaning "unlimited usage"
pub const UNLIMITED_CREDITS: i64 = -1;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// Fine-grained admin capabilities, checked per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManagePlans,
    ManageContent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    /// Capabilities granted to this role
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::User => &[],
            Role::Admin => &[
                Permission::ManageUsers,
                Permission::ManagePlans,
                Permission::ManageContent,
            ],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Subscription tier
///
/// Feature locking is tier-relative: `starter` is the entry paid tier,
/// `pro` and `enterprise` are upper tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanId {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl PlanId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Free => "free",
            PlanId::Starter => "starter",
            PlanId::Pro => "pro",
            PlanId::Enterprise => "enterprise",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "starter" => PlanId::Starter,
            "pro" => PlanId::Pro,
            "enterprise" => PlanId::Enterprise,
            _ => PlanId::Free,
        }
    }

    /// Strict parse for request input; unknown ids are rejected rather
    /// than defaulted (defaulting is only safe when reading our own rows)
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(PlanId::Free),
            "starter" => Some(PlanId::Starter),
            "pro" => Some(PlanId::Pro),
            "enterprise" => Some(PlanId::Enterprise),
            _ => None,
        }
    }

    /// Tier ordering used for relative feature locks
    pub fn rank(&self) -> u8 {
        match self {
            PlanId::Free => 0,
            PlanId::Starter => 1,
            PlanId::Pro => 2,
            PlanId::Enterprise => 3,
        }
    }

    /// True for tiers above the entry paid tier
    pub fn is_upper_tier(&self) -> bool {
        self.rank() > PlanId::Starter.rank()
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "cancelled" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Active,
        }
    }
}

/// Verification channel for bonus credit grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationChannel {
    Email,
    Phone,
}

/// Retention discount attached to a user record
///
/// Affects the price of the *next* plan purchase only. Expiry must be
/// checked against the clock at the point of use; `active` alone is not
/// sufficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub active: bool,
    /// Fraction taken off the nominal price, must satisfy 0 < rate < 1
    pub rate: f64,
    pub ends_at: DateTime<Utc>,
}

impl Discount {
    /// Whether the discount may be applied right now
    pub fn applies_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.rate > 0.0 && self.rate < 1.0 && now < self.ends_at
    }
}

/// The authoritative per-identity entitlement record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub plan_id: PlanId,
    /// Credits remaining; -1 means unlimited
    pub credits: i64,
    pub subscription_status: SubscriptionStatus,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub discount: Option<Discount>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn has_unlimited_credits(&self) -> bool {
        self.credits == UNLIMITED_CREDITS
    }

    pub fn is_verified(&self, channel: VerificationChannel) -> bool {
        match channel {
            VerificationChannel::Email => self.email_verified,
            VerificationChannel::Phone => self.phone_verified,
        }
    }
}
