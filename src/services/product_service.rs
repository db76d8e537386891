// src/services/product_service.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, db::ProductRepository, models::product::Product};

#[derive(Clone)]
pub struct ProductService {
    product_repo: ProductRepository,
}

impl ProductService {
    pub fn new(product_repo: ProductRepository) -> Self {
        Self { product_repo }
    }

    pub async fn create_product<'e, E>(
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
        let product = self
            .product_repo
            .create(executor, barcode.trim(), name, description, category, unit_cost, max_uses)
            .await?;
        tracing::info!("📦 Produto cadastrado: {} ({})", product.name, product.barcode);
        Ok(product)
    }

    pub async fn get_product<'e, E>(&self, executor: E, barcode: &str) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.product_repo
            .find_by_barcode(executor, barcode)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("product {}", barcode)))
    }

    pub async fn list_products<'e, E>(&self, executor: E, search: Option<&str>) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.product_repo.list(executor, search).await
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        barcode: &str,
        name: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        unit_cost: Option<Decimal>,
        max_uses: Option<i32>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.product_repo
            .update(executor, barcode, name, description, category, unit_cost, max_uses)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("product {}", barcode)))
    }
}
