use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use super::{auth_secrets, documents, folders, refresh_tokens, users};
use crate::{DbConn, DbPool, Error, util::random_urlsafe_string};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub login_id: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    name: String,
    login_id: String,
    password_hash: String,
    role: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        login_id: impl Into<String>,
        password_hash: String,
        role: impl Into<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            name: name.into(),
            login_id: login_id.into(),
            password_hash,
            role: role.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outward shape of a user. `email` is the login id.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.login_id.clone(),
            role: None,
        }
    }

    pub fn profile(&self) -> UserView {
        UserView {
            role: Some(self.role.clone()),
            ..self.view()
        }
    }

    pub async fn find_by_login_id(conn: &DbConn, login_id: &str) -> Result<Option<User>, Error> {
        let login_id = login_id.to_owned();
        conn.interact(move |conn| {
            users::table
                .filter(users::login_id.eq(login_id))
                .select(User::as_select())
                .first(conn)
                .optional()
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn find_by_id(conn: &DbConn, id: i32) -> Result<Option<User>, Error> {
        conn.interact(move |conn| {
            users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn create(conn: &DbConn, user: NewUser) -> Result<User, Error> {
        conn.interact(|conn| {
            diesel::insert_into(users::table)
                .values(user)
                .returning(User::as_returning())
                .get_result(conn)
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn update_name(conn: &DbConn, id: i32, name: String) -> Result<Option<User>, Error> {
        conn.interact(move |conn| {
            diesel::update(users::table.find(id))
                .set((
                    users::name.eq(name),
                    users::updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()
        })
        .await?
        .map_err(|e| e.into())
    }

    #[cfg(test)]
    pub async fn delete(conn: &DbConn, id: i32) -> Result<usize, Error> {
        conn.interact(move |conn| diesel::delete(users::table.find(id)).execute(conn))
            .await?
            .map_err(|e| e.into())
    }
}

#[derive(Debug, Serialize, Queryable, Selectable)]
#[diesel(table_name = folders)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    #[serde(skip)]
    pub owner_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = folders)]
pub struct NewFolder {
    name: String,
    parent_id: Option<i32>,
    owner_id: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl NewFolder {
    pub fn new(owner_id: i32, name: impl Into<String>, parent_id: Option<i32>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            name: name.into(),
            parent_id,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Folder {
    pub async fn create(conn: &DbConn, folder: NewFolder) -> Result<Folder, Error> {
        conn.interact(|conn| {
            diesel::insert_into(folders::table)
                .values(folder)
                .returning(Folder::as_returning())
                .get_result(conn)
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn find(conn: &DbConn, owner_id: i32, id: i32) -> Result<Option<Folder>, Error> {
        conn.interact(move |conn| {
            folders::table
                .filter(folders::id.eq(id))
                .filter(folders::owner_id.eq(owner_id))
                .select(Folder::as_select())
                .first(conn)
                .optional()
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn rename(
        conn: &DbConn,
        owner_id: i32,
        id: i32,
        name: String,
    ) -> Result<Option<Folder>, Error> {
        conn.interact(move |conn| {
            diesel::update(
                folders::table
                    .filter(folders::id.eq(id))
                    .filter(folders::owner_id.eq(owner_id)),
            )
            .set((
                folders::name.eq(name),
                folders::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(Folder::as_returning())
            .get_result(conn)
            .optional()
        })
        .await?
        .map_err(|e| e.into())
    }

    /// Folders directly below `parent`, or the root level when `parent` is `None`.
    pub async fn children(
        conn: &DbConn,
        owner_id: i32,
        parent: Option<i32>,
    ) -> Result<Vec<Folder>, Error> {
        conn.interact(move |conn| {
            let query = folders::table
                .filter(folders::owner_id.eq(owner_id))
                .into_boxed();
            let query = match parent {
                Some(parent) => query.filter(folders::parent_id.eq(parent)),
                None => query.filter(folders::parent_id.is_null()),
            };
            query
                .select(Folder::as_select())
                .order((folders::name.asc(), folders::id.asc()))
                .load(conn)
        })
        .await?
        .map_err(|e| e.into())
    }
}

#[derive(Debug, Serialize, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i32,
    pub name: String,
    #[serde(rename = "key")]
    pub doc_key: String,
    #[serde(rename = "url")]
    pub doc_url: Option<String>,
    pub folder_id: Option<i32>,
    #[serde(skip)]
    pub owner_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocument {
    name: String,
    doc_key: String,
    doc_url: Option<String>,
    folder_id: Option<i32>,
    owner_id: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl NewDocument {
    pub fn new(
        owner_id: i32,
        name: impl Into<String>,
        doc_key: impl Into<String>,
        doc_url: Option<String>,
        folder_id: Option<i32>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            name: name.into(),
            doc_key: doc_key.into(),
            doc_url,
            folder_id,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document {
    pub async fn create(conn: &DbConn, document: NewDocument) -> Result<Document, Error> {
        conn.interact(|conn| {
            diesel::insert_into(documents::table)
                .values(document)
                .returning(Document::as_returning())
                .get_result(conn)
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn in_folder(
        conn: &DbConn,
        owner_id: i32,
        folder: Option<i32>,
    ) -> Result<Vec<Document>, Error> {
        conn.interact(move |conn| {
            let query = documents::table
                .filter(documents::owner_id.eq(owner_id))
                .into_boxed();
            let query = match folder {
                Some(folder) => query.filter(documents::folder_id.eq(folder)),
                None => query.filter(documents::folder_id.is_null()),
            };
            query
                .select(Document::as_select())
                .order((documents::name.asc(), documents::id.asc()))
                .load(conn)
        })
        .await?
        .map_err(|e| e.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Access,
    Refresh,
}

impl SecretKind {
    fn as_str(self) -> &'static str {
        match self {
            SecretKind::Access => "access",
            SecretKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = auth_secrets)]
pub struct AuthSecretRecord {
    pub kind: String,
    pub secret: String,
    pub created_at: NaiveDateTime,
}

impl AuthSecretRecord {
    pub async fn get(conn: &DbConn, kind: SecretKind) -> Result<Option<Self>, Error> {
        let kind = kind.as_str();
        conn.interact(move |conn| {
            auth_secrets::table
                .find(kind)
                .select(AuthSecretRecord::as_select())
                .first(conn)
                .optional()
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn insert(conn: &DbConn, secret: AuthSecretRecord) -> Result<(), Error> {
        conn.interact(|conn| {
            diesel::insert_into(auth_secrets::table)
                .values(secret)
                .execute(conn)
        })
        .await??;
        Ok(())
    }

    pub async fn load_or_create(pool: &DbPool, kind: SecretKind) -> Result<String, Error> {
        let conn = pool.get().await?;

        if let Some(existing) = Self::get(&conn, kind).await? {
            return Ok(existing.secret);
        }

        let secret = random_urlsafe_string(64);
        let record = AuthSecretRecord {
            kind: kind.as_str().to_owned(),
            secret: secret.clone(),
            created_at: Utc::now().naive_utc(),
        };

        Self::insert(&conn, record).await?;
        info!("generated {} token signing secret", kind.as_str());
        Ok(secret)
    }
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshTokenRecord {
    pub fingerprint: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl RefreshTokenRecord {
    pub async fn insert(conn: &DbConn, token: RefreshTokenRecord) -> Result<(), Error> {
        conn.interact(|conn| {
            diesel::insert_into(refresh_tokens::table)
                .values(token)
                .execute(conn)
        })
        .await??;
        Ok(())
    }

    pub async fn exists(conn: &DbConn, fingerprint: &str) -> Result<bool, Error> {
        let fingerprint = fingerprint.to_owned();
        conn.interact(move |conn| {
            diesel::select(diesel::dsl::exists(
                refresh_tokens::table.filter(refresh_tokens::fingerprint.eq(fingerprint)),
            ))
            .get_result(conn)
        })
        .await?
        .map_err(|e| e.into())
    }

    /// Returns the number of rows removed, so callers can tell who won a race.
    pub async fn delete(conn: &DbConn, fingerprint: &str) -> Result<usize, Error> {
        let fingerprint = fingerprint.to_owned();
        conn.interact(move |conn| {
            diesel::delete(
                refresh_tokens::table.filter(refresh_tokens::fingerprint.eq(fingerprint)),
            )
            .execute(conn)
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn delete_expired(conn: &DbConn, now: NaiveDateTime) -> Result<usize, Error> {
        conn.interact(move |conn| {
            diesel::delete(refresh_tokens::table.filter(refresh_tokens::expires_at.le(now)))
                .execute(conn)
        })
        .await?
        .map_err(|e| e.into())
    }
}
