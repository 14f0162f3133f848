use crate::datastore::Posts;
use crate::ledger::Ledger;
use crate::metrics;
use crate::ratelimit::RateLimiter;
use crate::spam::SpamDetector;
use crate::twoface::{Describe, ExternalError, Fallible, TfError};
use actix_web::web;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

pub mod admin;
pub mod userfacing;

/// Everything the handlers share. Built once in `main`.
#[derive(Clone)]
pub struct State {
    pub posts: Posts,
    pub ledger: Arc<Ledger>,
    pub spam: Arc<SpamDetector>,
    pub limiter: Arc<RateLimiter>,
    pub admin: AdminSecret,
    /// Whether GET /posts/all needs the admin secret like the other moderation reads.
    pub protect_all_posts: bool,
}

/// Route every endpoint. Public and moderation routes share paths (e.g. /reports), so they
/// have to be registered together. JSON bodies are capped at `max_body_size` bytes.
pub fn configure(max_body_size: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config(max_body_size))
            .app_data(query_config());
        routes(cfg);
    }
}

/// Unreadable bodies get the usual JSON error body instead of actix's plain text.
fn json_config(max_body_size: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_body_size)
        .error_handler(|err, _req| err.describe(ExternalError::INVALID_BODY).into())
}

/// The only query string any route reads is the admin secret, so a query that won't parse
/// (e.g. a repeated `adminPassword`) is a failed login.
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        err.describe(ExternalError::UNAUTHORIZED).into()
    })
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/posts")
            .route(web::post().to(userfacing::write_post))
            .route(web::get().to(userfacing::list_posts)),
    )
    .service(web::resource("/posts/all").route(web::get().to(admin::list_all_posts)))
    .service(
        web::resource("/reports")
            .route(web::post().to(userfacing::write_report))
            .route(web::get().to(admin::list_reports)),
    )
    .service(web::resource("/reports/{report_id}").route(web::delete().to(admin::delete_report)))
    .service(web::resource("/flagged").route(web::get().to(admin::list_flagged)))
    .service(
        web::resource("/flagged/{post_id}").route(web::delete().to(admin::delete_flagged)),
    )
    .service(
        web::resource("/flagged/{post_id}/restore")
            .route(web::put().to(admin::restore_flagged)),
    );
}

/// The shared secret every moderation endpoint checks.
#[derive(Clone)]
pub struct AdminSecret(Arc<str>);

/// `?adminPassword=...`
#[derive(Deserialize, Debug, Default)]
pub struct AdminQuery {
    #[serde(rename = "adminPassword")]
    pub admin_password: Option<String>,
}

impl AdminSecret {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }

    /// Exact match only. A missing password never matches.
    pub fn check(&self, query: &AdminQuery) -> Fallible<()> {
        match &query.admin_password {
            Some(provided) if provided.as_str() == &*self.0 => Ok(()),
            _ => Err(TfError::user(ExternalError::UNAUTHORIZED)),
        }
    }
}

/// Execute the closure, then log its operational metrics, e.g. time taken, whether it returned Ok/Err, etc.
async fn observe<F, Fut, R>(name: &'static str, f: F) -> Fallible<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Fallible<R>>,
{
    let start = Instant::now();
    let return_val = f().await;
    let duration = start.elapsed();
    metrics::HANDLER_SECS
        .with_label_values(&[name])
        .observe(duration.as_secs_f64());
    metrics::RESPONSES
        .with_label_values(&[name, variant_name(&return_val)])
        .inc();
    return_val
}

fn variant_name<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "err"
    }
}
