//! Plan pricing with retention discounts
//!
//! Prices live in the catalog as localized currency strings (thousands
//! separated with '.', e.g. "2.499 TL"). Discount math happens on a
//! parsed `Decimal` and the result is reformatted in the same style. A
//! price string that fails to parse falls back to the nominal price
//! unchanged: a malformed catalog entry must never panic and must never
//! charge zero.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Plan, UserRecord};

/// Price as shown to (and charged from) the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayPrice {
    /// The effective price string
    pub current: String,
    /// The nominal price, present only when a discount applied ("was/now")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was: Option<String>,
}

/// Compute the price of a plan for a user (or guest)
///
/// The discount applies only while it is active, in-range (0 < rate < 1)
/// AND unexpired at `now`; the stored `active` flag alone is not
/// trusted. Discounted amounts are floored to an integer unit.
pub fn price_for(plan: &Plan, user: Option<&UserRecord>, now: DateTime<Utc>) -> DisplayPrice {
    let nominal = DisplayPrice {
        current: plan.price.clone(),
        was: None,
    };

    let Some(discount) = user.and_then(|u| u.discount.as_ref()) else {
        return nominal;
    };
    if !discount.applies_at(now) {
        return nominal;
    }

    let Some((amount, suffix)) = split_price(&plan.price) else {
        return nominal;
    };
    let Ok(rate) = Decimal::try_from(discount.rate) else {
        return nominal;
    };

    let discounted = (amount * (Decimal::ONE - rate)).floor();
    let Some(units) = discounted.to_i64() else {
        return nominal;
    };

    let current = if suffix.is_empty() {
        format_amount(units)
    } else {
        format!("{} {}", format_amount(units), suffix)
    };

    DisplayPrice {
        current,
        was: Some(plan.price.clone()),
    }
}

/// Split a localized price string into a numeric amount and its suffix
///
/// "2.499 TL" parses as 2499 with suffix "TL": '.' is a thousands
/// separator and ',' a decimal mark. Returns None when no leading
/// numeric token exists.
fn split_price(raw: &str) -> Option<(Decimal, String)> {
    let trimmed = raw.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(trimmed.len());
    let (num, suffix) = trimmed.split_at(end);
    if num.is_empty() {
        return None;
    }

    let normalized = num.replace('.', "").replace(',', ".");
    let amount = normalized.parse::<Decimal>().ok()?;
    Some((amount, suffix.trim().to_string()))
}

/// Format an integer amount with '.' thousands grouping
fn format_amount(units: i64) -> String {
    let digits = units.to_string();
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(*c);
    }
    out
}
