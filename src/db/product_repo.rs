// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::product::Product};

#[derive(Clone, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        barcode: &str,
        name: &str,
        description: Option<&str>,
        category: Option<&str>,
        unit_cost: Decimal,
        max_uses: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (barcode, name, description, category, unit_cost, max_uses)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(barcode)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(unit_cost)
        .bind(max_uses)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.constraint() == Some("products_barcode_key") => {
                AppError::BarcodeAlreadyExists(barcode.to_string())
            }
            _ => e.into(),
        })
    }

    pub async fn find_by_barcode<'e, E>(
        &self,
        executor: E,
        barcode: &str,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = $1")
            .bind(barcode)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn find_many<'e, E>(&self, executor: E, barcodes: &[String]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = ANY($1)")
            .bind(barcodes)
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    // Busca por nome ou barcode (ILIKE)
    pub async fn list<'e, E>(&self, executor: E, search: Option<&str>) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE $1::text IS NULL OR name ILIKE $1 OR barcode ILIKE $1
            ORDER BY name ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        barcode: &str,
        name: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        unit_cost: Option<Decimal>,
        max_uses: Option<i32>,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                unit_cost = COALESCE($5, unit_cost),
                max_uses = COALESCE($6, max_uses),
                updated_at = NOW()
            WHERE barcode = $1
            RETURNING *
            "#,
        )
        .bind(barcode)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(unit_cost)
        .bind(max_uses)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }
}
