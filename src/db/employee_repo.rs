// src/db/employee_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::employee::Employee};

#[derive(Clone, Default)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        surname: &str,
        email: Option<&str>,
        warehouse_id: Uuid,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (name, surname, email, warehouse_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(surname)
        .bind(email)
        .bind(warehouse_id)
        .fetch_one(executor)
        .await?;
        Ok(employee)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(employee)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        warehouse_id: Option<Uuid>,
        include_inactive: bool,
    ) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT * FROM employees
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2 OR is_active)
            ORDER BY surname ASC, name ASC
            "#,
        )
        .bind(warehouse_id)
        .bind(include_inactive)
        .fetch_all(executor)
        .await?;
        Ok(employees)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        surname: Option<&str>,
        email: Option<&str>,
        warehouse_id: Option<Uuid>,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET
                name = COALESCE($2, name),
                surname = COALESCE($3, surname),
                email = COALESCE($4, email),
                warehouse_id = COALESCE($5, warehouse_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(surname)
        .bind(email)
        .bind(warehouse_id)
        .fetch_optional(executor)
        .await?;
        Ok(employee)
    }

    // Baixa lógica: o histórico de retiradas continua apontando para o empleado
    pub async fn deactivate<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            "UPDATE employees SET is_active = false, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(employee)
    }

    /// Kits e ordens de retirada ainda abertos do empleado.
    pub async fn count_open_assignments<'e, E>(&self, executor: E, id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let open = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM kits WHERE employee_id = $1 AND NOT is_complete)
              + (SELECT COUNT(*) FROM withdraw_orders WHERE employee_id = $1 AND NOT is_complete)
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(open)
    }
}
