use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::views::AnalyticsSummary;
use crate::workflows::enquiry::{
    EnquiryQuery, EnquiryRepository, EnquiryService, MarkerStore, NotificationSink,
};
use crate::workflows::http::error_response;
use crate::workflows::visit::{VisitRepository, VisitService};

/// Both collections the dashboard reads from.
pub struct AnalyticsState<V, R, M, N> {
    pub visits: Arc<VisitService<V>>,
    pub enquiries: Arc<EnquiryService<R, M, N>>,
}

impl<V, R, M, N> Clone for AnalyticsState<V, R, M, N> {
    fn clone(&self) -> Self {
        Self {
            visits: self.visits.clone(),
            enquiries: self.enquiries.clone(),
        }
    }
}

pub fn analytics_router<V, R, M, N>(state: AnalyticsState<V, R, M, N>) -> Router
where
    V: VisitRepository + 'static,
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/analytics", get(summary_handler::<V, R, M, N>))
        .with_state(state)
}

async fn summary_handler<V, R, M, N>(State(state): State<AnalyticsState<V, R, M, N>>) -> Response
where
    V: VisitRepository + 'static,
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let visits = match state.visits.list() {
        Ok(visits) => visits,
        Err(error) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    };
    let enquiries = match state.enquiries.list(&EnquiryQuery::default()) {
        Ok(enquiries) => enquiries,
        Err(error) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    };

    let today = state.enquiries.now().date_naive();
    let summary = AnalyticsSummary::build(&visits, &enquiries, today);
    (StatusCode::OK, axum::Json(summary)).into_response()
}
