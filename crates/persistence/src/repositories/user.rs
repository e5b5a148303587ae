//! User repository for database operations.
//!
//! Mutations take a closure that describes the activity log entry for the
//! affected row; the change and its log row commit together.

use domain::models::{NewLogEntry, RoleBreakdown, UserRole};
use shared::validation::like_pattern;
use sqlx::{PgPool, Row};

use crate::entities::{UserEntity, UserSummaryEntity};
use crate::metrics::QueryTimer;
use crate::repositories::LogRepository;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, ministry_id, created_at, last_login, updated_at";

/// Values for a new account. The email is stored lower-cased.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: UserRole,
    pub ministry_id: Option<i64>,
}

/// Editable account fields.
#[derive(Debug, Clone)]
pub struct UserChanges<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub role: UserRole,
    pub ministry_id: Option<i64>,
}

/// Predicates for user lists. `None` omits the predicate.
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub role: Option<String>,
    pub ministry_id: Option<i64>,
    pub search: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for the users table.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a user by email address (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = $1", USER_COLUMNS);
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a user only if they belong to the given ministry.
    pub async fn find_in_ministry(
        &self,
        id: i64,
        ministry_id: i64,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_in_ministry");
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND ministry_id = $2",
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .bind(ministry_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Whether another account already uses this email.
    pub async fn email_exists(
        &self,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(email) = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(normalize_email(email))
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
    }

    /// List users with their ministry name, newest first.
    pub async fn list(&self, filter: &UserListFilter) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.ministry_id, m.name AS ministry_name,
                   u.created_at, u.last_login
            FROM users u
            LEFT JOIN ministries m ON m.id = u.ministry_id
            WHERE ($1::TEXT IS NULL OR u.role = $1)
              AND ($2::BIGINT IS NULL OR u.ministry_id = $2)
              AND ($3::TEXT IS NULL OR u.name ILIKE $3 OR u.email ILIKE $3)
            ORDER BY u.created_at DESC, u.id DESC
            "#,
        )
        .bind(&filter.role)
        .bind(filter.ministry_id)
        .bind(filter.search.as_deref().map(like_pattern))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// User counts by role, optionally within one ministry.
    pub async fn count_by_role(
        &self,
        ministry_id: Option<i64>,
    ) -> Result<RoleBreakdown, sqlx::Error> {
        let timer = QueryTimer::new("count_users_by_role");
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE role = 'user') AS users,
                COUNT(*) FILTER (WHERE role = 'admin') AS admins,
                COUNT(*) FILTER (WHERE role = 'super_admin') AS super_admins
            FROM users
            WHERE $1::BIGINT IS NULL OR ministry_id = $1
            "#,
        )
        .bind(ministry_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok(RoleBreakdown {
            user: row.get::<i64, _>("users"),
            admin: row.get::<i64, _>("admins"),
            super_admin: row.get::<i64, _>("super_admins"),
        })
    }

    /// Create an account together with its log entry.
    pub async fn create<F>(&self, new_user: NewUser<'_>, log: F) -> Result<UserEntity, sqlx::Error>
    where
        F: FnOnce(&UserEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("create_user");
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, ministry_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(new_user.name.trim())
            .bind(normalize_email(new_user.email))
            .bind(new_user.password_hash)
            .bind(new_user.role.as_str())
            .bind(new_user.ministry_id)
            .fetch_one(&mut *tx)
            .await?;

        LogRepository::append(&mut tx, &log(&user)).await?;

        tx.commit().await?;
        timer.record();
        Ok(user)
    }

    /// Update an account. With `scope_ministry_id` the row must belong to that
    /// ministry; `None` is returned when no row matched.
    pub async fn update<F>(
        &self,
        id: i64,
        scope_ministry_id: Option<i64>,
        changes: UserChanges<'_>,
        log: F,
    ) -> Result<Option<UserEntity>, sqlx::Error>
    where
        F: FnOnce(&UserEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("update_user");
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE users
            SET name = $1, email = $2, role = $3, ministry_id = $4, updated_at = NOW()
            WHERE id = $5 AND ($6::BIGINT IS NULL OR ministry_id = $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(changes.name.trim())
            .bind(normalize_email(changes.email))
            .bind(changes.role.as_str())
            .bind(changes.ministry_id)
            .bind(id)
            .bind(scope_ministry_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        LogRepository::append(&mut tx, &log(&user)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(user))
    }

    /// Update own name and email.
    pub async fn update_profile<F>(
        &self,
        id: i64,
        name: &str,
        email: &str,
        log: F,
    ) -> Result<Option<UserEntity>, sqlx::Error>
    where
        F: FnOnce(&UserEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("update_user_profile");
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE users
            SET name = $1, email = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(name.trim())
            .bind(normalize_email(email))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        LogRepository::append(&mut tx, &log(&user)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(user))
    }

    /// Replace a password hash, scoped like [`UserRepository::update`].
    pub async fn update_password<F>(
        &self,
        id: i64,
        scope_ministry_id: Option<i64>,
        password_hash: &str,
        log: F,
    ) -> Result<Option<UserEntity>, sqlx::Error>
    where
        F: FnOnce(&UserEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("update_user_password");
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2 AND ($3::BIGINT IS NULL OR ministry_id = $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(password_hash)
            .bind(id)
            .bind(scope_ministry_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        LogRepository::append(&mut tx, &log(&user)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(user))
    }

    /// Delete an account, scoped like [`UserRepository::update`].
    ///
    /// The row is locked and logged before it is removed, so an actor deleting
    /// their own account still leaves a log row carrying their name.
    pub async fn delete<F>(
        &self,
        id: i64,
        scope_ministry_id: Option<i64>,
        log: F,
    ) -> Result<Option<UserEntity>, sqlx::Error>
    where
        F: FnOnce(&UserEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("delete_user");
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM users
            WHERE id = $1 AND ($2::BIGINT IS NULL OR ministry_id = $2)
            FOR UPDATE
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .bind(scope_ministry_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        LogRepository::append(&mut tx, &log(&user)).await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(user))
    }

    /// Stamp a successful login.
    pub async fn update_last_login(&self, id: i64) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("update_user_last_login");
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(())
    }

    /// Whether any super admin account exists.
    pub async fn super_admin_exists(&self) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'super_admin')",
        )
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Gov.Example "), "jane@gov.example");
    }

    #[test]
    fn test_list_filter_default_is_unfiltered() {
        let filter = UserListFilter::default();
        assert!(filter.role.is_none());
        assert!(filter.ministry_id.is_none());
        assert!(filter.search.is_none());
    }
}
