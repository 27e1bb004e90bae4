//! Store handle lifecycle against in-memory SurrealDB.

use procura_db::DbManager;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn ping_then_close() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let manager = DbManager::from_client(db);
    procura_db::run_migrations(manager.client()).await.unwrap();
    manager.ping().await.unwrap();

    let spare = manager.clone();
    spare.ping().await.unwrap();
    drop(spare);

    manager.close().await.unwrap();
}
