//! Classification results, analysis history and invoice records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured result returned by the external classifier
///
/// Treated as opaque except for the tariff code and tax list, which are
/// validated before a result is accepted (and a credit charged).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    /// Customs tariff (HS/GTIP) code assigned to the product
    pub tariff_code: String,
    #[serde(default)]
    pub tariff_description: String,
    /// Applicable tax descriptors, e.g. "Customs duty: 12%"
    pub taxes: Vec<String>,
    /// Required import document descriptors
    #[serde(default)]
    pub documents: Vec<String>,
    /// Price range observed in the source market
    #[serde(default)]
    pub source_price_range: Option<String>,
    /// Price range observed in the destination market
    #[serde(default)]
    pub destination_price_range: Option<String>,
    /// Draft outreach email to a supplier
    #[serde(default)]
    pub supplier_email: Option<String>,
    /// Model confidence, 0-100
    #[serde(default)]
    pub confidence: f64,
}

/// Immutable history record created once per successful classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Wrap a validated classification result for the owning user
    pub fn new(email: &str, result: ClassificationResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            result,
            created_at: Utc::now(),
        }
    }
}

/// Immutable billing record created once per successful payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub email: String,
    pub plan_name: String,
    /// Charged amount as a currency-formatted string
    pub amount: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
