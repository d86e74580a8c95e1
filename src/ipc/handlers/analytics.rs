use serde_json::json;

use crate::analytics;
use crate::ipc::error::{api_failure, ok};
use crate::ipc::helpers::require_role;
use crate::ipc::types::{AppState, Request};
use crate::session::Role;

/// Performance histogram for the dashboard: fixed percentage bands, the
/// derived y-axis gridlines, and relative slice sizes for the compact
/// overview widget. Students without any recorded percentage stay out of
/// the buckets but are still reported in the totals.
fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(refusal) =
        require_role(req, state.session.role(), &[Role::Admin, Role::Teacher])
    {
        return refusal;
    }

    match state.api.performance_summary() {
        Ok(summary) => {
            let buckets =
                analytics::bucket_percentages(summary.iter().map(|row| row.percentage));
            let ticks = analytics::y_axis_ticks(&buckets);
            let slices = analytics::relative_slice_percents(&buckets);
            let counted: usize = buckets.iter().map(|b| b.count).sum();
            ok(
                &req.id,
                json!({
                    "buckets": buckets,
                    "yAxisTicks": ticks,
                    "slicePercents": slices,
                    "totalStudents": summary.len(),
                    "countedStudents": counted,
                }),
            )
        }
        Err(e) => api_failure(&req.id, &e, "Unable to load analytics right now."),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
