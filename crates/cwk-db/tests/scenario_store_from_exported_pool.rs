//! `cwk_db::PgPool` is the pool type `PgStore` is built from, so callers
//! (daemon, CLI) never name sqlx themselves.
//!
//! Runs without a database: the pool is lazy and never connects.

use std::time::Duration;

use cwk_db::{PgPool, PgStore};

#[tokio::test]
async fn store_wraps_the_exported_pool_type() {
    let pool: PgPool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy("postgres://cwk@localhost:5432/cwk")
        .unwrap();

    let store = PgStore::new(pool).with_lock_timeout(Duration::from_millis(250));
    let held: &PgPool = store.pool();
    assert_eq!(held.size(), 0);
}
