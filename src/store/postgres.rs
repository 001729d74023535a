//! Postgres user store.
//!
//! Expects a table of the form:
//! ```sql
//! CREATE TABLE users (
//!     id       UUID PRIMARY KEY,
//!     email    TEXT NOT NULL UNIQUE,
//!     password TEXT NOT NULL
//! );
//! ```

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use uuid::Uuid;

use crate::config::validation::is_identifier;
use crate::config::DatabaseConfig;
use crate::store::{StoreError, User, UserStore};

const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct PgUsers {
    pool: PgPool,
    find_by_id: String,
    find_by_email: String,
    insert: String,
}

impl PgUsers {
    /// Store backed by `pool`, reading and writing `table`.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, StoreError> {
        if !is_identifier(table) {
            return Err(StoreError::InvalidTable(table.to_string()));
        }

        Ok(Self {
            pool,
            find_by_id: format!(r#"SELECT id, email, password FROM "{table}" WHERE id = $1"#),
            find_by_email: format!(r#"SELECT id, email, password FROM "{table}" WHERE email = $1"#),
            insert: format!(r#"INSERT INTO "{table}" (id, email, password) VALUES ($1, $2, $3)"#),
        })
    }

    /// Build a store whose pool connects on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_lazy_with(connect_options(config));

        tracing::info!(host = %config.host, database = %config.name, table = %config.users_table, "User store configured");

        Self::new(pool, &config.users_table)
    }
}

/// Driver options for `config`. Credentials are passed as-is, never through a URL.
fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .username(&config.username)
        .database(&config.name)
        .ssl_mode(PgSslMode::Disable);

    if config.password.is_empty() {
        options
    } else {
        options.password(&config.password)
    }
}

impl UserStore for PgUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&self.find_by_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&self.find_by_email)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(&self.insert)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate(user.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database(password: &str) -> DatabaseConfig {
        DatabaseConfig {
            host: "db.internal".into(),
            username: "svc".into(),
            password: password.into(),
            name: "app".into(),
            users_table: "users".into(),
        }
    }

    #[test]
    fn test_connect_options_keep_special_characters() {
        let options = connect_options(&database("p@ss/w#rd:?%"));
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_username(), "svc");
        assert_eq!(options.get_database(), Some("app"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Disable));
    }

    #[tokio::test]
    async fn test_connect_lazy_with_special_password() {
        let store = PgUsers::connect_lazy(&database("p@ss/w#rd")).unwrap();
        assert!(store.find_by_id.contains(r#"FROM "users""#));
    }

    #[tokio::test]
    async fn test_rejects_invalid_table() {
        let pool = PgPoolOptions::new().connect_lazy_with(connect_options(&database("")));
        let err = PgUsers::new(pool, "users; DROP TABLE users").unwrap_err();
        assert!(matches!(err, StoreError::InvalidTable(_)));
    }

    #[tokio::test]
    async fn test_queries_use_table() {
        let pool = PgPoolOptions::new().connect_lazy_with(connect_options(&database("")));
        let store = PgUsers::new(pool, "admin").unwrap();
        assert!(store.find_by_email.contains(r#"FROM "admin""#));
        assert!(store.insert.starts_with(r#"INSERT INTO "admin""#));
    }
}
