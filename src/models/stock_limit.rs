// src/models/stock_limit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;

// QUANTITY: conta unidades disponíveis. USAGE: soma os usos restantes dessas unidades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_limit_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitType {
    Quantity,
    Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLimit {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub barcode: String,
    pub limit_type: LimitType,
    pub min_value: i32,
    pub max_value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn ensure_range(min_value: i32, max_value: i32) -> Result<(), AppError> {
    if min_value < 0 || max_value < min_value {
        return Err(AppError::InvalidLimitRange { min: min_value, max: max_value });
    }
    Ok(())
}

// --- Avaliação para o dashboard ---

// Nível atual de um limite (calculado no SQL, ver DashboardRepository)
#[derive(Debug, Clone, FromRow)]
pub struct LimitLevel {
    pub limit_id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub barcode: String,
    pub product_name: String,
    pub limit_type: LimitType,
    pub min_value: i32,
    pub max_value: i32,
    pub available_units: i64,
    pub remaining_uses: i64,
}

impl LimitLevel {
    pub fn current(&self) -> i64 {
        match self.limit_type {
            LimitType::Quantity => self.available_units,
            LimitType::Usage => self.remaining_uses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitStatus {
    Low,
    Over,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub limit_id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub barcode: String,
    pub product_name: String,
    pub limit_type: LimitType,
    pub min_value: i32,
    pub max_value: i32,
    pub current: i64,
    pub status: LimitStatus,
    // Só para LOW: quanto falta para o mínimo
    pub deficit: i64,
}

/// Filtra os limites violados e ordena: LOW primeiro, maior déficit, barcode.
pub fn evaluate(levels: Vec<LimitLevel>) -> Vec<LowStockEntry> {
    let mut entries: Vec<LowStockEntry> = levels
        .into_iter()
        .filter_map(|level| {
            let current = level.current();
            let (status, deficit) = if current < i64::from(level.min_value) {
                (LimitStatus::Low, i64::from(level.min_value) - current)
            } else if current > i64::from(level.max_value) {
                (LimitStatus::Over, 0)
            } else {
                return None;
            };

            Some(LowStockEntry {
                limit_id: level.limit_id,
                warehouse_id: level.warehouse_id,
                warehouse_name: level.warehouse_name,
                barcode: level.barcode,
                product_name: level.product_name,
                limit_type: level.limit_type,
                min_value: level.min_value,
                max_value: level.max_value,
                current,
                status,
                deficit,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        let rank = |s: LimitStatus| if s == LimitStatus::Low { 0 } else { 1 };
        rank(a.status)
            .cmp(&rank(b.status))
            .then_with(|| b.deficit.cmp(&a.deficit))
            .then_with(|| a.barcode.cmp(&b.barcode))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(barcode: &str, kind: LimitType, min: i32, max: i32, units: i64, uses: i64) -> LimitLevel {
        LimitLevel {
            limit_id: Uuid::new_v4(),
            warehouse_id: Uuid::nil(),
            warehouse_name: "Sucursal".into(),
            barcode: barcode.into(),
            product_name: barcode.into(),
            limit_type: kind,
            min_value: min,
            max_value: max,
            available_units: units,
            remaining_uses: uses,
        }
    }

    #[test]
    fn within_range_is_omitted() {
        assert!(evaluate(vec![level("A", LimitType::Quantity, 2, 10, 5, 0)]).is_empty());
        // bordas inclusivas
        assert!(evaluate(vec![level("A", LimitType::Quantity, 2, 10, 2, 0)]).is_empty());
        assert!(evaluate(vec![level("A", LimitType::Quantity, 2, 10, 10, 0)]).is_empty());
    }

    #[test]
    fn usage_limits_read_remaining_uses() {
        let out = evaluate(vec![level("A", LimitType::Usage, 50, 100, 10, 30)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].current, 30);
        assert_eq!(out[0].deficit, 20);
        assert_eq!(out[0].status, LimitStatus::Low);
    }

    #[test]
    fn ordering_low_first_then_deficit_then_barcode() {
        let out = evaluate(vec![
            level("OVER", LimitType::Quantity, 0, 1, 5, 0),
            level("B", LimitType::Quantity, 5, 10, 4, 0),
            level("C", LimitType::Quantity, 10, 20, 1, 0),
            level("A", LimitType::Quantity, 5, 10, 4, 0),
        ]);
        let order: Vec<&str> = out.iter().map(|e| e.barcode.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B", "OVER"]);
        assert_eq!(out[3].status, LimitStatus::Over);
        assert_eq!(out[3].deficit, 0);
    }

    #[test]
    fn range_validation() {
        assert!(ensure_range(0, 0).is_ok());
        assert!(ensure_range(3, 10).is_ok());
        assert!(matches!(ensure_range(5, 4), Err(AppError::InvalidLimitRange { min: 5, max: 4 })));
        assert!(ensure_range(-1, 4).is_err());
    }
}
