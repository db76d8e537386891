// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

// Todo usuário sai daqui com o flag do almacén (JOIN), usado pelo WarehouseScope
const USER_COLUMNS: &str = r#"
    u.id, u.email, u.name, u.password_hash, u.role, u.warehouse_id,
    w.is_cedis AS warehouse_is_cedis,
    u.created_at, u.updated_at
"#;

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (login, fora de qualquer transação)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN warehouses w ON w.id = u.warehouse_id WHERE u.email = $1"
        );
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID (auth_guard)
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN warehouses w ON w.id = u.warehouse_id WHERE u.id = $1"
        );
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN warehouses w ON w.id = u.warehouse_id ORDER BY u.name ASC"
        );
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(executor).await?;
        Ok(users)
    }

    /// Serializa os registros até o commit; só um cadastro por vez conta os usuários.
    pub async fn lock_registrations<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('users.register'))")
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    // Cria um novo usuário no banco de dados
    // Com tratamento de erro específico para e-mails duplicados.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        name: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH u AS (
                INSERT INTO users (email, name, password_hash, role)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u LEFT JOIN warehouses w ON w.id = u.warehouse_id
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.constraint() == Some("users_email_key") => {
                    AppError::EmailAlreadyExists
                }
                _ => e.into(),
            })
    }

    /// Campos `None` ficam como estão.
    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        role: Option<UserRole>,
        warehouse_id: Option<Uuid>,
        name: Option<&str>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH u AS (
                UPDATE users SET
                    role = COALESCE($2, role),
                    warehouse_id = COALESCE($3, warehouse_id),
                    name = COALESCE($4, name),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u LEFT JOIN warehouses w ON w.id = u.warehouse_id
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .bind(warehouse_id)
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }
}
