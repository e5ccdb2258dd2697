mod migration;
mod models;
mod pool;
mod schema;

pub use migration::{MIGRATIONS, run_migrations};
pub use pool::build_pool;
pub use models::{
    AuthSecretRecord, Document, Folder, NewDocument, NewFolder, NewUser, RefreshTokenRecord,
    SecretKind, User, UserView,
};
pub use schema::{auth_secrets, documents, folders, refresh_tokens, users};

use crate::{DbPool, Error, auth::hash_password, config::Admin};

/// Creates the configured admin account unless its login id is already taken.
pub async fn seed_admin(pool: &DbPool, admin: &Admin) -> Result<(), Error> {
    if !admin.is_enabled() {
        return Ok(());
    }
    let login_id = admin.login_id.trim().to_owned();
    let conn = pool.get().await?;
    if User::find_by_login_id(&conn, &login_id).await?.is_some() {
        debug!("admin account {} already exists", login_id);
        return Ok(());
    }

    let password = admin.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    let name = match admin.name.trim() {
        "" => "Admin",
        name => name,
    };
    let user = User::create(&conn, NewUser::new(name, login_id, password_hash, "admin")).await?;
    info!("created admin account {}", user.login_id);
    Ok(())
}

/// Pool over `database_url` with the schema migrated through its first connection.
#[cfg(test)]
pub async fn migrated_pool(database_url: &str, max_size: usize) -> DbPool {
    use diesel_migrations::MigrationHarness;

    let pool = build_pool(database_url, Some(max_size)).unwrap();
    let conn = pool.get().await.unwrap();
    conn.interact(|conn| conn.run_pending_migrations(MIGRATIONS).map(|_| ()))
        .await
        .unwrap()
        .unwrap();
    pool
}

#[cfg(test)]
pub async fn test_pool() -> DbPool {
    // A single connection, otherwise every checkout sees its own empty database.
    migrated_pool(":memory:", 1).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = test_pool().await;
        let admin = Admin {
            login_id: "root@drive.local".into(),
            password: "correct horse".into(),
            name: String::new(),
        };

        seed_admin(&pool, &admin).await.unwrap();
        seed_admin(&pool, &admin).await.unwrap();

        let conn = pool.get().await.unwrap();
        let user = User::find_by_login_id(&conn, "root@drive.local")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, "admin");
        assert_eq!(user.name, "Admin");
        assert!(crate::auth::verify_password("correct horse", &user.password_hash));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_their_drive() {
        let pool = test_pool().await;
        let conn = pool.get().await.unwrap();
        let user = User::create(&conn, NewUser::new("Eve", "e@b.com", "hash".to_owned(), "user"))
            .await
            .unwrap();
        let folder = Folder::create(&conn, NewFolder::new(user.id, "Docs", None))
            .await
            .unwrap();
        Document::create(
            &conn,
            NewDocument::new(user.id, "a.txt", "k/a.txt", None, Some(folder.id)),
        )
        .await
        .unwrap();

        User::delete(&conn, user.id).await.unwrap();

        assert!(Folder::find(&conn, user.id, folder.id).await.unwrap().is_none());
        assert!(Document::in_folder(&conn, user.id, Some(folder.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_admin_is_skipped() {
        let pool = test_pool().await;
        seed_admin(&pool, &Admin::default()).await.unwrap();

        let conn = pool.get().await.unwrap();
        assert!(User::find_by_login_id(&conn, "").await.unwrap().is_none());
    }
}
