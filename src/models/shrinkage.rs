// src/models/shrinkage.rs

// Merma: perdas de inventário (dano, consumo, desaparecimento, faltantes de transferência).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "shrinkage_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShrinkageReason {
    Damaged,
    Expired,
    Consumed,
    Lost,
    MissingTransfer,
}

impl ShrinkageReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ShrinkageReason::Damaged => "DAMAGED",
            ShrinkageReason::Expired => "EXPIRED",
            ShrinkageReason::Consumed => "CONSUMED",
            ShrinkageReason::Lost => "LOST",
            ShrinkageReason::MissingTransfer => "MISSING_TRANSFER",
        }
    }

    /// MISSING_TRANSFER só nasce da conciliação de uma transferência.
    pub fn is_manual(self) -> bool {
        self != ShrinkageReason::MissingTransfer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShrinkageEvent {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub barcode: String,
    pub product_stock_id: Option<Uuid>,
    pub transfer_id: Option<Uuid>,
    pub reason: ShrinkageReason,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub unit_cost: Decimal,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Dados para inserir um evento (manual, exclusão de unidade ou conciliação).
#[derive(Debug, Clone)]
pub struct NewShrinkageEvent<'a> {
    pub warehouse_id: Uuid,
    pub barcode: &'a str,
    pub product_stock_id: Option<Uuid>,
    pub transfer_id: Option<Uuid>,
    pub reason: ShrinkageReason,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub notes: Option<&'a str>,
    pub recorded_by: Option<Uuid>,
}

// Linha do relatório (JOIN com almacén e produto)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShrinkageReportRow {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub barcode: String,
    pub product_name: String,
    pub reason: ShrinkageReason,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShrinkageBucket {
    pub key: String,
    pub label: String,
    pub quantity: i64,
    #[schema(value_type = f64)]
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShrinkageSummary {
    pub total_quantity: i64,
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
    pub by_reason: Vec<ShrinkageBucket>,
    pub by_warehouse: Vec<ShrinkageBucket>,
    pub by_product: Vec<ShrinkageBucket>,
}

// Quantos produtos entram no ranking
pub const TOP_PRODUCTS: usize = 10;

fn into_sorted(map: HashMap<String, ShrinkageBucket>) -> Vec<ShrinkageBucket> {
    let mut buckets: Vec<ShrinkageBucket> = map.into_values().collect();
    buckets.sort_by(|a, b| b.cost.cmp(&a.cost).then_with(|| a.key.cmp(&b.key)));
    buckets
}

fn add_to(map: &mut HashMap<String, ShrinkageBucket>, key: String, label: &str, qty: i64, cost: Decimal) {
    let bucket = map.entry(key.clone()).or_insert_with(|| ShrinkageBucket {
        key,
        label: label.to_string(),
        quantity: 0,
        cost: Decimal::ZERO,
    });
    bucket.quantity += qty;
    bucket.cost += cost;
}

/// Agrega as linhas do relatório. Custo = quantidade × custo unitário congelado no evento.
pub fn summarize(rows: &[ShrinkageReportRow]) -> ShrinkageSummary {
    let mut by_reason = HashMap::new();
    let mut by_warehouse = HashMap::new();
    let mut by_product = HashMap::new();
    let mut total_quantity = 0i64;
    let mut total_cost = Decimal::ZERO;

    for row in rows {
        let qty = i64::from(row.quantity);
        let cost = Decimal::from(row.quantity) * row.unit_cost;
        total_quantity += qty;
        total_cost += cost;

        let reason = row.reason.as_str();
        add_to(&mut by_reason, reason.to_string(), reason, qty, cost);
        add_to(&mut by_warehouse, row.warehouse_id.to_string(), &row.warehouse_name, qty, cost);
        add_to(&mut by_product, row.barcode.clone(), &row.product_name, qty, cost);
    }

    let mut by_product = into_sorted(by_product);
    by_product.truncate(TOP_PRODUCTS);

    ShrinkageSummary {
        total_quantity,
        total_cost,
        by_reason: into_sorted(by_reason),
        by_warehouse: into_sorted(by_warehouse),
        by_product,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(wh: Uuid, barcode: &str, reason: ShrinkageReason, qty: i32, cost: i64) -> ShrinkageReportRow {
        ShrinkageReportRow {
            warehouse_id: wh,
            warehouse_name: "Sucursal".into(),
            barcode: barcode.into(),
            product_name: format!("Producto {}", barcode),
            reason,
            quantity: qty,
            unit_cost: Decimal::new(cost, 0),
        }
    }

    #[test]
    fn empty_report_is_zero() {
        let s = summarize(&[]);
        assert_eq!(s.total_quantity, 0);
        assert_eq!(s.total_cost, Decimal::ZERO);
        assert!(s.by_reason.is_empty() && s.by_warehouse.is_empty() && s.by_product.is_empty());
    }

    #[test]
    fn totals_and_buckets_agree() {
        let wh1 = Uuid::new_v4();
        let wh2 = Uuid::new_v4();
        let rows = vec![
            row(wh1, "A", ShrinkageReason::Damaged, 2, 10),
            row(wh1, "B", ShrinkageReason::MissingTransfer, 3, 50),
            row(wh2, "A", ShrinkageReason::Damaged, 1, 10),
        ];
        let s = summarize(&rows);

        assert_eq!(s.total_quantity, 6);
        assert_eq!(s.total_cost, Decimal::new(180, 0));

        // maior custo primeiro
        assert_eq!(s.by_reason[0].key, "MISSING_TRANSFER");
        assert_eq!(s.by_reason[0].cost, Decimal::new(150, 0));
        assert_eq!(s.by_reason[1].quantity, 3);

        let product_a = s.by_product.iter().find(|b| b.key == "A").unwrap();
        assert_eq!(product_a.quantity, 3);
        assert_eq!(product_a.label, "Producto A");

        for buckets in [&s.by_reason, &s.by_warehouse, &s.by_product] {
            let q: i64 = buckets.iter().map(|b| b.quantity).sum();
            let c: Decimal = buckets.iter().map(|b| b.cost).sum();
            assert_eq!(q, s.total_quantity);
            assert_eq!(c, s.total_cost);
        }
    }

    #[test]
    fn ties_are_ordered_by_key() {
        let wh = Uuid::new_v4();
        let s = summarize(&[
            row(wh, "Z", ShrinkageReason::Lost, 1, 5),
            row(wh, "M", ShrinkageReason::Lost, 1, 5),
        ]);
        let keys: Vec<&str> = s.by_product.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["M", "Z"]);
    }

    #[test]
    fn product_ranking_is_capped() {
        let wh = Uuid::new_v4();
        let rows: Vec<_> = (0..15)
            .map(|i| row(wh, &format!("P{:02}", i), ShrinkageReason::Expired, 1, i))
            .collect();
        let s = summarize(&rows);
        assert_eq!(s.by_product.len(), TOP_PRODUCTS);
        assert_eq!(s.by_product[0].key, "P14");
        // o total continua a contar todos
        assert_eq!(s.total_quantity, 15);
    }

    #[test]
    fn missing_transfer_is_not_manual() {
        assert!(!ShrinkageReason::MissingTransfer.is_manual());
        assert!(ShrinkageReason::Damaged.is_manual());
    }
}
