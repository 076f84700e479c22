//! Request handlers for the submission endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRef, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use super::client_ip::{ClientIp, TrustedProxies};
use super::error::{rate_limit_headers, ApiError};
use crate::ratelimit::rules::{CALLBACK_REQUESTS, INQUIRIES, REVIEWS};
use crate::ratelimit::{Decision, EndpointRules, RateLimitKey, RateLimiterBackend};
use crate::records::{
    CallbackSubmission, InquirySubmission, NewNotification, RecordStore, ReviewQuery,
    ReviewSubmission,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Counter store guarding the write endpoints
    pub limiter: Arc<dyn RateLimiterBackend>,
    /// Where submissions are written
    pub store: Arc<dyn RecordStore>,
    /// Per-endpoint quotas
    pub rules: Arc<EndpointRules>,
    /// Recipient of admin notifications
    pub admin_email: String,
    /// Proxies whose forwarding headers name the client
    pub trusted_proxies: TrustedProxies,
}

impl FromRef<AppState> for TrustedProxies {
    fn from_ref(state: &AppState) -> Self {
        state.trusted_proxies.clone()
    }
}

impl AppState {
    /// Run the admission check for `client` on `endpoint`.
    ///
    /// Must happen before the body is even parsed, so that malformed
    /// submissions count against the quota too.
    async fn admit(&self, client: &ClientIp, endpoint: &str) -> Result<Decision, ApiError> {
        let key = RateLimitKey::new(&client.0, endpoint)?;
        let quota = self.rules.quota_for(endpoint)?;
        let decision = self.limiter.check(&key.to_string_key(), quota).await?;

        if !decision.ok {
            let retry_after_secs = decision.retry_after_secs(self.limiter.now_ms());
            warn!(
                key = %key,
                retry_after_secs = retry_after_secs,
                "Submission rejected by rate limiter"
            );
            return Err(ApiError::RateLimited {
                decision,
                retry_after_secs,
            });
        }

        debug!(key = %key, remaining = decision.remaining, "Submission admitted");
        Ok(decision)
    }

    async fn notify(&self, notification: NewNotification) {
        if let Err(e) = self.store.enqueue_notification(notification).await {
            warn!(error = %e, "Failed to queue admin notification");
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

/// `POST /api/reviews`
#[instrument(skip(state, client, body), fields(client = %client))]
pub async fn create_review(
    State(state): State<AppState>,
    client: ClientIp,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let decision = state.admit(&client, REVIEWS).await?;
    let submission: ReviewSubmission = parse_body(&body)?;
    let review = state.store.insert_review(submission.validate()?).await?;

    info!(review_id = %review.id, "Review submitted for approval");
    state
        .notify(NewNotification::for_review(&review, &state.admin_email))
        .await;

    Ok((
        StatusCode::CREATED,
        rate_limit_headers(&decision),
        Json(json!({
            "message": "Review submitted successfully and is pending approval",
            "review": review,
        })),
    ))
}

/// `GET /api/reviews`
///
/// A store failure degrades to an empty list so pages embedding reviews
/// still render.
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> impl IntoResponse {
    let filter = query.into_filter();
    match state.store.list_reviews(&filter).await {
        Ok(reviews) => Json(json!({ "reviews": reviews })),
        Err(e) => {
            error!(error = %e, "Error fetching reviews");
            Json(json!({ "reviews": [] }))
        }
    }
}

/// `POST /api/inquiries`
#[instrument(skip(state, client, body), fields(client = %client))]
pub async fn create_inquiry(
    State(state): State<AppState>,
    client: ClientIp,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let decision = state.admit(&client, INQUIRIES).await?;
    let submission: InquirySubmission = parse_body(&body)?;
    let inquiry = state.store.insert_inquiry(submission.validate()?).await?;

    info!(inquiry_id = %inquiry.id, "Inquiry received");
    state
        .notify(NewNotification::for_inquiry(&inquiry, &state.admin_email))
        .await;

    Ok((
        StatusCode::CREATED,
        rate_limit_headers(&decision),
        Json(json!({
            "message": "Inquiry received. Our team will be in touch shortly",
            "inquiry": inquiry,
        })),
    ))
}

/// `POST /api/callback-requests`
#[instrument(skip(state, client, body), fields(client = %client))]
pub async fn create_callback_request(
    State(state): State<AppState>,
    client: ClientIp,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let decision = state.admit(&client, CALLBACK_REQUESTS).await?;
    let submission: CallbackSubmission = parse_body(&body)?;
    let request = state
        .store
        .insert_callback_request(submission.validate()?)
        .await?;

    info!(callback_id = %request.id, "Callback requested");
    state
        .notify(NewNotification::for_callback(&request, &state.admin_email))
        .await;

    Ok((
        StatusCode::CREATED,
        rate_limit_headers(&decision),
        Json(json!({
            "message": "Thanks! A safari expert will call you within 24 hours",
            "callback_request": request,
        })),
    ))
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
