//! Public endpoints: posting, the filtered feed, and reporting posts.
use crate::api::{observe, State};
use crate::datastore::{NewPost, Post};
use crate::metrics;
use crate::twoface::{ExternalError, Fallible, Require, TfError};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Latitude/longitude as clients send them: a number, a numeric string, or nothing.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    /// Infinities and NaN count as no coordinate.
    fn value(self) -> Option<f64> {
        let value = match self {
            Coordinate::Number(n) => Some(n),
            Coordinate::Text(s) => s.trim().parse().ok(),
        };
        value.filter(|v: &f64| v.is_finite())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct WritePostBody {
    pub text: Option<String>,
    pub author: Option<String>,
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    pub partition: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct CreatedPost {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct WriteReportBody {
    pub post_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReport {
    pub report_id: String,
}

/// Empty strings count as missing.
fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

// Create a post, flagging it straight away if it trips the spam detector
pub async fn write_post(
    state: web::Data<State>,
    req: HttpRequest,
    body: web::Json<WritePostBody>,
) -> Fallible<HttpResponse> {
    observe("write_post", move || async move {
        let body = body.into_inner();
        let text = non_empty(body.text).require(ExternalError::MISSING_TEXT)?;

        let ip = client_ip(&req);
        if state.limiter.is_enabled() && state.limiter.is_limited(&ip) {
            return Err(TfError::user(ExternalError::RATE_LIMITED));
        }

        let flag_reason = state.spam.check_post(&text, body.author.as_deref());
        let new_post = NewPost::new(
            text,
            body.author,
            body.latitude.and_then(Coordinate::value),
            body.longitude.and_then(Coordinate::value),
            body.partition,
        );
        let post = state.posts.create_post(new_post).await;

        // The post exists now, so nothing below may fail the request.
        if let Some(reason) = &flag_reason {
            if state.ledger.flags.flag(&post.id, reason) {
                metrics::POSTS_FLAGGED.inc();
                info!(post_id = %post.id, reason = %reason, "flagged new post as spam");
            }
        }
        if state.limiter.is_enabled() {
            state.limiter.record(&ip);
        }

        Ok(HttpResponse::Created().json(CreatedPost {
            id: post.id,
            flagged: flag_reason.as_ref().map(|_| true),
            reason: flag_reason,
        }))
    })
    .await
}

// The public feed: every post without an active flag
pub async fn list_posts(state: web::Data<State>) -> Fallible<web::Json<Vec<Post>>> {
    observe("list_posts", move || async move {
        let hidden = state.ledger.flags.active_post_ids();
        let posts = state
            .posts
            .list_posts()
            .await
            .into_iter()
            .filter(|post| !hidden.contains(&post.id))
            .collect();
        Ok(web::Json(posts))
    })
    .await
}

pub async fn write_report(
    state: web::Data<State>,
    body: web::Json<WriteReportBody>,
) -> Fallible<HttpResponse> {
    observe("write_report", move || async move {
        let body = body.into_inner();
        let (post_id, reason) = match (non_empty(body.post_id), non_empty(body.reason)) {
            (Some(post_id), Some(reason)) => (post_id, reason),
            _ => return Err(TfError::user(ExternalError::MISSING_REPORT_FIELDS)),
        };
        let report_id = state.ledger.reports.file(&post_id, &reason)?;
        info!(report_id = %report_id, post_id = %post_id, "filed report");
        Ok(HttpResponse::Created().json(CreatedReport { report_id }))
    })
    .await
}

/// Who is posting, for the rate limiter. Proxy headers win over the socket address.
pub fn client_ip(req: &HttpRequest) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    };
    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_owned();
        }
    }
    if let Some(ip) = header("x-client-ip").or_else(|| header("cf-connecting-ip")) {
        return ip;
    }
    match req.peer_addr() {
        Some(addr) => addr.ip().to_string(),
        None => {
            warn!("couldn't determine client IP");
            "unknown".to_owned()
        }
    }
}
