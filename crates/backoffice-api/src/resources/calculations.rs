//! Ad-campaign ROI calculations, owned by the principal who created them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use backoffice_core::{PrincipalId, RecordId};
use backoffice_storage::{Entity, Patch};

use crate::resource::{Ownership, ResourceSpec, SaveContext};
use crate::{ApiError, Result};

/// Field referencing the owning principal.
pub const OWNER_FIELD: &str = "user_id";

/// A stored calculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Calculation {
    /// Record identifier.
    pub id: RecordId,
    /// Owning principal.
    pub user_id: PrincipalId,
    /// Money spent on ads.
    pub ad_spend: f64,
    /// Ad cost per conversion.
    pub cost_per_result: f64,
    /// Unit price of the product.
    #[serde(default)]
    pub product_price: f64,
    /// Revenue per conversion.
    pub average_order_value: f64,
    /// `total_profit / ad_spend * 100`.
    #[serde(default)]
    pub roi_percentage: f64,
    /// `ad_spend / cost_per_result * average_order_value`.
    #[serde(default)]
    pub total_revenue: f64,
    /// `total_revenue - ad_spend`.
    #[serde(default)]
    pub total_profit: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Entity for Calculation {
    const KIND: &'static str = "Calculation";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Derived campaign figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Expected revenue.
    pub total_revenue: f64,
    /// Revenue minus spend.
    pub total_profit: f64,
    /// Profit as a percentage of spend.
    pub roi_percentage: f64,
}

/// Compute the derived figures. `ad_spend` and `cost_per_result` must be positive.
pub fn compute_metrics(ad_spend: f64, cost_per_result: f64, average_order_value: f64) -> Metrics {
    let results = ad_spend / cost_per_result;
    let total_revenue = results * average_order_value;
    let total_profit = total_revenue - ad_spend;
    Metrics {
        total_revenue: round2(total_revenue),
        total_profit: round2(total_profit),
        roi_percentage: round2(total_profit / ad_spend * 100.0),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The `calculations` resource.
pub fn spec() -> ResourceSpec<Calculation> {
    ResourceSpec::new("calculations", Ownership::Relation(OWNER_FIELD))
        .with_crud_permissions("calculate")
        .with_pre_save(derive_metrics)
}

fn derive_metrics(payload: &mut Patch, ctx: &SaveContext<'_, Calculation>) -> Result<()> {
    let existing = ctx.existing;
    let ad_spend = input(payload, "ad_spend", existing.map(|c| c.ad_spend))?;
    let cost_per_result = input(payload, "cost_per_result", existing.map(|c| c.cost_per_result))?;
    let average_order_value = input(
        payload,
        "average_order_value",
        existing.map(|c| c.average_order_value),
    )?;

    if ad_spend <= 0.0 {
        return Err(ApiError::validation("ad_spend must be greater than zero"));
    }
    if cost_per_result <= 0.0 {
        return Err(ApiError::validation("cost_per_result must be greater than zero"));
    }
    if average_order_value < 0.0 {
        return Err(ApiError::validation("average_order_value must not be negative"));
    }

    let product_price = match payload.get("product_price") {
        None | Some(Value::Null) => existing.map(|c| c.product_price).unwrap_or(0.0),
        Some(v) => as_number(v).ok_or_else(|| ApiError::validation("product_price must be a number"))?,
    };

    let metrics = compute_metrics(ad_spend, cost_per_result, average_order_value);
    for (field, value) in [
        ("ad_spend", ad_spend),
        ("cost_per_result", cost_per_result),
        ("average_order_value", average_order_value),
        ("product_price", product_price),
        ("total_revenue", metrics.total_revenue),
        ("total_profit", metrics.total_profit),
        ("roi_percentage", metrics.roi_percentage),
    ] {
        let number = Number::from_f64(value)
            .ok_or_else(|| ApiError::validation(format!("{field} is not a finite number")))?;
        payload.insert(field.to_string(), Value::Number(number));
    }
    Ok(())
}

fn input(payload: &Patch, field: &str, fallback: Option<f64>) -> Result<f64> {
    match payload.get(field) {
        Some(v) => {
            as_number(v).ok_or_else(|| ApiError::validation(format!("{field} must be a number")))
        }
        None => fallback.ok_or_else(|| ApiError::validation(format!("{field} is required"))),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}
