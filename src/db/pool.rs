use deadpool_diesel::{
    Runtime,
    sqlite::{BuildError, Hook, HookError, Manager, Pool},
};
use diesel::connection::SimpleConnection;

use crate::DbPool;

/// Writers wait on each other instead of failing with `SQLITE_BUSY`, and
/// `ON DELETE CASCADE` is only honoured with foreign keys switched on.
const CONNECTION_PRAGMAS: &str =
    "PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;";

pub fn build_pool(database_url: &str, max_size: Option<usize>) -> Result<DbPool, BuildError> {
    let manager = Manager::new(database_url, Runtime::Tokio1);
    let mut builder = Pool::builder(manager).post_create(Hook::async_fn(|conn, _| {
        Box::pin(async move {
            conn.interact(|conn| conn.batch_execute(CONNECTION_PRAGMAS))
                .await
                .map_err(|e| HookError::message(e.to_string()))?
                .map_err(|e| HookError::message(e.to_string()))
        })
    }));
    if let Some(max_size) = max_size {
        builder = builder.max_size(max_size);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use diesel::{
        RunQueryDsl,
        sql_types::{Integer, Text},
    };

    use super::*;
    use crate::testing::TempDatabase;

    #[derive(diesel::QueryableByName)]
    struct BusyTimeout {
        #[diesel(sql_type = Integer)]
        timeout: i32,
    }

    #[derive(diesel::QueryableByName)]
    struct ForeignKeys {
        #[diesel(sql_type = Integer)]
        foreign_keys: i32,
    }

    #[derive(diesel::QueryableByName)]
    struct JournalMode {
        #[diesel(sql_type = Text)]
        journal_mode: String,
    }

    #[tokio::test]
    async fn connections_are_configured_on_checkout() {
        let db = TempDatabase::new();
        let pool = build_pool(db.url(), Some(2)).unwrap();
        let conn = pool.get().await.unwrap();

        let (timeout, foreign_keys, journal) = conn
            .interact(|conn| {
                let timeout = diesel::sql_query("PRAGMA busy_timeout").get_result::<BusyTimeout>(conn)?;
                let foreign_keys =
                    diesel::sql_query("PRAGMA foreign_keys").get_result::<ForeignKeys>(conn)?;
                let journal =
                    diesel::sql_query("PRAGMA journal_mode").get_result::<JournalMode>(conn)?;
                diesel::QueryResult::Ok((
                    timeout.timeout,
                    foreign_keys.foreign_keys,
                    journal.journal_mode,
                ))
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(timeout, 5000);
        assert_eq!(foreign_keys, 1);
        assert_eq!(journal.to_lowercase(), "wal");
    }
}
