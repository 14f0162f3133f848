mod api;
mod config;
mod datastore;
mod ids;
mod ledger;
mod metrics;
mod ratelimit;
mod records;
mod spam;
mod twoface;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate guard;
#[macro_use]
extern crate diesel;

use crate::config::Config;
use crate::datastore::{
    memory::MemoryStore,
    postgres::{self, PostgresStore},
    structs::sample_posts,
    PostStore, Posts,
};
use crate::ledger::Ledger;
use crate::ratelimit::{RateLimiter, RATE_LIMITS_FILE};
use crate::spam::SpamDetector;
use actix_service::Service;
use actix_web::{dev::ServiceResponse, middleware, web, App, HttpServer};
use futures::future::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};

#[allow(clippy::cognitive_complexity)]
fn main() {
    let args: Vec<_> = std::env::args().collect();
    guard!(let [_, config_file_path, ..] = &args[..] else {
        eprintln!("First argument should be path to config file");
        return
    });
    let seed = args.get(2).map(|cmd| cmd == "seed").unwrap_or(false);

    let config = match Config::from_file(config_file_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Set up logger output
    let subscriber_builder = tracing_subscriber::fmt().with_max_level(Level::DEBUG);
    if config.human_logs {
        subscriber_builder.init();
    } else {
        subscriber_builder.json().init();
    }

    info!("starting geoboard");

    let mut sys = actix_rt::System::new("geoboard");

    let fallback = if config.seed_fallback_posts {
        MemoryStore::with_posts(sample_posts())
    } else {
        MemoryStore::default()
    };

    // Build the remote table client, if one is configured
    let posts = match postgres::Dsn::new(&config) {
        Some(dsn) => {
            let db = PostgresStore::new(
                dsn,
                &config.table_name,
                config.db_pool_size,
                Duration::from_secs(config.db_connection_timeout),
            )
            .expect("couldn't build the remote table pool");
            prometheus::register(Box::new(db.clone())).expect("couldn't register table metrics");
            info!(table = &config.table_name[..], "using remote post table");
            let remote: Arc<dyn PostStore> = Arc::new(db);
            Posts::new(Some(remote), fallback)
        }
        None => {
            warn!("no table connection string configured, posts live in memory only");
            Posts::fallback_only(fallback)
        }
    };

    if seed {
        let seeding = posts.clone();
        match sys.block_on(async move { seeding.seed_remote().await }) {
            Ok(inserted) => info!(inserted, "seeded remote table"),
            Err(e) => {
                error!("{:#}", e.internal);
                std::process::exit(1);
            }
        }
        return;
    }

    let keywords = config
        .load_spam_keywords()
        .expect("couldn't load spam keywords");
    let spam = SpamDetector::new(keywords);
    if spam.is_empty() {
        warn!("no spam keywords configured, nothing will be flagged automatically");
    }
    if config.uses_default_admin_password() {
        warn!("admin password is the default. Set ADMIN_PASSWORD before exposing this server.");
    }
    if config.rate_limit_enabled {
        info!("rate limiting is enabled");
    }

    let ledger = Arc::new(Ledger::open(&config.data_dir));
    let limiter = Arc::new(RateLimiter::open(
        config.data_dir.join(RATE_LIMITS_FILE),
        config.rate_limit_enabled,
    ));
    let state = api::State {
        posts,
        ledger: Arc::clone(&ledger),
        spam: Arc::new(spam),
        limiter: Arc::clone(&limiter),
        admin: api::AdminSecret::new(&config.admin_password),
        protect_all_posts: config.protect_all_posts,
    };

    // Start the API server
    info!(
        addr = &config.listen_address[..],
        "starting post board API server"
    );
    let max_body_size = config.max_body_size;
    HttpServer::new(move || {
        App::new()
            // Middleware for Prometheus
            .wrap_fn(|request, srv| srv.call(request).map(increment_response_metrics))
            .data(state.clone())
            // enable logger
            .wrap(middleware::Logger::default())
            .configure(api::configure(max_body_size))
    })
    .bind(config.listen_address.clone())
    .expect("couldn't start post board HTTP server")
    .run();

    // Start the metrics server
    info!(
        addr = &config.metrics_address[..],
        "starting metrics server"
    );
    HttpServer::new(|| {
        App::new().service(
            web::scope("/metrics")
                .service(web::resource("/").route(web::get().to(metrics::endpoint::gather)))
                .service(web::resource("").route(web::get().to(metrics::endpoint::gather))),
        )
    })
    .bind(config.metrics_address.clone())
    .expect("couldn't start metrics server")
    .run();

    sys.run().expect("actix runtime terminated");

    info!("shutting down, flushing moderation records");
    if let Err(e) = ledger.flush().and_then(|_| limiter.flush()) {
        error!("{:#}", e.internal);
    }
}

/// If response is OK, increment the metrics for HTTP statuses.
fn increment_response_metrics<E, B>(
    response: Result<ServiceResponse<B>, E>,
) -> Result<ServiceResponse<B>, E> {
    match response {
        Ok(response) => {
            metrics::HTTP_RESPONSES
                .with_label_values(&[response.status().as_str()])
                .inc();
            Ok(response)
        }
        other => other,
    }
}
