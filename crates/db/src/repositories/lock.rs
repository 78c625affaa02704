//! Row locking for balance reads.

use sea_orm::{ConnectionTrait, DbBackend, QuerySelect};

/// Adds `FOR UPDATE` to `select` when locking is enabled and the backend
/// supports it.
///
/// SQLite serializes writers on its own and has no row locks.
pub(crate) fn for_update<S, C>(select: S, conn: &C, row_locking: bool) -> S
where
    S: QuerySelect,
    C: ConnectionTrait,
{
    if row_locking && conn.get_database_backend() != DbBackend::Sqlite {
        select.lock_exclusive()
    } else {
        select
    }
}
