//! Result section visibility and feature locking

use serde::Serialize;

use crate::models::{PlanId, UserRecord};

/// Sections of an analysis result that the presentation layer renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSection {
    /// The tariff code itself; always visible, even to guests
    BasicClassification,
    /// Tax and required-document breakdown; any authenticated user
    TaxesAndDocuments,
    /// Market price comparison; upper tiers only
    MarketPriceAnalysis,
    /// Supplier outreach email draft; upper tiers only
    SupplierEmailDraft,
}

impl ResultSection {
    pub const ALL: [ResultSection; 4] = [
        ResultSection::BasicClassification,
        ResultSection::TaxesAndDocuments,
        ResultSection::MarketPriceAnalysis,
        ResultSection::SupplierEmailDraft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSection::BasicClassification => "basic_classification",
            ResultSection::TaxesAndDocuments => "taxes_and_documents",
            ResultSection::MarketPriceAnalysis => "market_price_analysis",
            ResultSection::SupplierEmailDraft => "supplier_email_draft",
        }
    }
}

/// What a locked section resolves to
///
/// A guest lock always resolves to a login prompt; an
/// authenticated-but-insufficient-tier lock always resolves to an
/// upgrade prompt. The two are never conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "target", content = "plan")]
pub enum UpgradeTarget {
    Login,
    Upgrade(PlanId),
}

/// Whether a section is rendered or shown locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "locked_behind")]
pub enum Visibility {
    Visible,
    Locked(UpgradeTarget),
}

/// Resolve section visibility for a user (or guest when `None`)
pub fn visibility(user: Option<&UserRecord>, section: ResultSection) -> Visibility {
    match section {
        ResultSection::BasicClassification => Visibility::Visible,

        ResultSection::TaxesAndDocuments => match user {
            Some(_) => Visibility::Visible,
            None => Visibility::Locked(UpgradeTarget::Login),
        },

        ResultSection::MarketPriceAnalysis | ResultSection::SupplierEmailDraft => match user {
            None => Visibility::Locked(UpgradeTarget::Login),
            Some(u) if u.plan_id.is_upper_tier() => Visibility::Visible,
            Some(_) => Visibility::Locked(UpgradeTarget::Upgrade(PlanId::Pro)),
        },
    }
}
