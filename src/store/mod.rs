//! Graph store: statement boundary, session pool, SQLite backend

mod engine;
mod pool;
mod row;
mod sqlite;

pub use engine::{GraphEngine, OpenGraph, Statement, StoreError, StoreResult};
pub use pool::{Session, SessionPool, DEFAULT_POOL_SIZE};
pub use row::{EdgeRecord, Field, NodeRecord, Properties, Row, Value};
pub use sqlite::SqliteGraph;
