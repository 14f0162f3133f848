mod errors;
pub mod post_store;
use crate::config::Config;
use crate::datastore::tables::TableSql;
use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, Pool},
};
use prometheus::{
    core::{Collector, Desc},
    proto::MetricFamily,
    IntGauge, Opts,
};
use std::sync::Arc;
use std::time::Duration;

pub struct Dsn {
    secret: String,
}

impl Dsn {
    /// None when the deployment has no remote table configured.
    pub fn new(config: &Config) -> Option<Self> {
        config
            .table_connection_string
            .as_ref()
            .map(|secret| Dsn {
                secret: secret.clone(),
            })
    }
}

impl From<Dsn> for String {
    fn from(dsn: Dsn) -> String {
        dsn.secret
    }
}

/// An implementation of datastore::PostStore backed by a Postgres table
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool<ConnectionManager<PgConnection>>,
    sql: Arc<TableSql>,
    idle_conns: IntGauge,
    conns: IntGauge,
}

impl PostgresStore {
    /// The pool is built without connecting, so an unreachable database only shows up when a
    /// request tries to use it.
    pub fn new(
        dsn: Dsn,
        table_name: &str,
        max_pool_size: u32,
        conn_timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let manager = ConnectionManager::<PgConnection>::new(dsn);
        let pool = Pool::builder()
            .max_size(max_pool_size)
            .min_idle(Some(0))
            .connection_timeout(conn_timeout)
            .build_unchecked(manager);
        let idle_conns = IntGauge::with_opts(Opts::new(
            "geoboard_table_connections_idle",
            "How many remote table connections are currently idle",
        ))?;
        let conns = IntGauge::with_opts(Opts::new(
            "geoboard_table_connections",
            "How many remote table connections are open",
        ))?;
        Ok(Self {
            pool,
            sql: Arc::new(TableSql::new(table_name)),
            idle_conns,
            conns,
        })
    }
}

impl Collector for PostgresStore {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.idle_conns.desc();
        descs.extend(self.conns.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.idle_conns
            .set(self.pool.state().idle_connections as i64);
        self.conns.set(self.pool.state().connections as i64);
        let mut metrics = self.idle_conns.collect();
        metrics.extend(self.conns.collect());
        metrics
    }
}
