/// Database layer
///
/// Connection pool management for the PostgreSQL store. Queries live in
/// [`crate::store::postgres`]; schema management is out of scope.

pub mod pool;
