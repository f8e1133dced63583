//! Dashboard aggregates.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::{Value, json};

use backoffice_acl::{Action, BasePermission, Scope, resolve_scope};
use backoffice_storage::{Order, Predicate};

use crate::context::AppContext;
use crate::extract::Caller;
use crate::resources::calculations::{Calculation, OWNER_FIELD};
use crate::{ApiError, Result};

/// Key figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Scope the figures were computed under.
    pub scope: Scope,
    /// Number of visible calculations.
    pub calculation_count: usize,
    /// Mean ROI percentage; zero without calculations.
    pub average_roi: f64,
    /// Calculations with a negative ROI.
    pub critical_count: usize,
    /// Registered accounts.
    pub total_principals: usize,
    /// `average_roi + 50`, clamped to `0..=100`.
    pub roi_score: f64,
    /// One-line assessment of the average ROI.
    pub roi_alert: String,
}

impl DashboardSummary {
    /// Aggregate `calculations`.
    pub fn compute(calculations: &[Calculation], total_principals: usize, scope: Scope) -> Self {
        let calculation_count = calculations.len();
        let average_roi = if calculations.is_empty() {
            0.0
        } else {
            calculations.iter().map(|c| c.roi_percentage).sum::<f64>() / calculation_count as f64
        };
        let critical_count = calculations
            .iter()
            .filter(|c| c.roi_percentage < 0.0)
            .count();
        let roi_alert = if average_roi < 0.0 {
            format!("Average ROI is negative ({average_roi:.1}%). Optimize campaigns.")
        } else {
            format!("Average ROI is healthy ({average_roi:.1}%). Consider scaling.")
        };

        Self {
            scope,
            calculation_count,
            average_roi,
            critical_count,
            total_principals,
            roi_score: (average_roi + 50.0).clamp(0.0, 100.0),
            roi_alert,
        }
    }
}

/// `GET /dashboard/summary`, authorized with `dashboard:read`.
///
/// Under `own` scope only the caller's calculations are aggregated.
pub async fn summary(State(ctx): State<AppContext>, Caller(caller): Caller) -> Result<Json<Value>> {
    let base = BasePermission::new("dashboard", Action::Read);
    let scope = resolve_scope(&caller.permissions, Some(&base)).map_err(|e| {
        log::warn!("{} denied dashboard summary: {e}", caller.id);
        ApiError::from(e)
    })?;

    let filter = match scope {
        Scope::Any => Predicate::All,
        Scope::Own => Predicate::owned_by(OWNER_FIELD, caller.id),
    };
    let calculations = ctx.repos.calculations.find(&filter, Order::NewestFirst).await?;
    let total_principals = ctx.repos.users.count(&Predicate::All).await?;

    let summary = DashboardSummary::compute(&calculations, total_principals, scope);
    Ok(Json(json!({ "data": summary })))
}
