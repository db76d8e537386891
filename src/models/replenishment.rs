// src/models/replenishment.rs

// Pedidos: um almacén solicita reposição ao CEDIS, que atende com uma transferência.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "replenishment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplenishmentStatus {
    Pending,
    Sent,
    PartiallyReceived,
    Completed,
    Cancelled,
}

impl ReplenishmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplenishmentStatus::Pending => "PENDING",
            ReplenishmentStatus::Sent => "SENT",
            ReplenishmentStatus::PartiallyReceived => "PARTIALLY_RECEIVED",
            ReplenishmentStatus::Completed => "COMPLETED",
            ReplenishmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Só o recebimento total preenche `completed_at`; um parcial deixa o pedido aberto.
    pub fn stamps_completion(self) -> bool {
        self == ReplenishmentStatus::Completed
    }

    pub fn ensure_pending(self, to: ReplenishmentStatus) -> Result<(), AppError> {
        if self == ReplenishmentStatus::Pending {
            Ok(())
        } else {
            Err(AppError::InvalidStatusTransition {
                entity: "replenishment_order",
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishmentOrder {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub cedis_warehouse_id: Uuid,
    pub status: ReplenishmentStatus,
    pub transfer_id: Option<Uuid>,
    pub notes: Option<String>,
    pub requested_by: Option<Uuid>,
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishmentDetail {
    pub id: Uuid,
    pub order_id: Uuid,
    pub barcode: String,
    pub quantity: i32,
    pub sent_quantity: i32,
    pub received_quantity: i32,
}

impl ReplenishmentDetail {
    pub fn outstanding(&self) -> i32 {
        (self.quantity - self.received_quantity).max(0)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishmentOrderWithDetails {
    #[serde(flatten)]
    pub order: ReplenishmentOrder,
    pub details: Vec<ReplenishmentDetail>,
}

/// Estado após a conclusão da transferência vinculada.
pub fn status_after_receipt(details: &[ReplenishmentDetail]) -> ReplenishmentStatus {
    if details.iter().all(|d| d.received_quantity >= d.quantity) {
        ReplenishmentStatus::Completed
    } else {
        ReplenishmentStatus::PartiallyReceived
    }
}

pub fn outstanding_quantity(details: &[ReplenishmentDetail]) -> i64 {
    details.iter().map(|d| i64::from(d.outstanding())).sum()
}

pub fn ensure_distinct_barcodes<'a, I>(barcodes: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for b in barcodes {
        if !seen.insert(b) {
            return Err(AppError::DuplicateBarcode(b.to_string()));
        }
    }
    Ok(())
}

/// Conta as unidades enviadas por barcode e confere contra o pedido.
/// `unit_barcodes` = barcode de cada unidade separada pelo CEDIS.
pub fn plan_fulfillment(
    details: &[ReplenishmentDetail],
    unit_barcodes: &[&str],
) -> Result<BTreeMap<String, i32>, AppError> {
    let mut sent: BTreeMap<String, i32> = BTreeMap::new();
    for barcode in unit_barcodes {
        let detail = details
            .iter()
            .find(|d| d.barcode == *barcode)
            .ok_or_else(|| AppError::BarcodeNotInOrder(barcode.to_string()))?;

        let count = sent.entry(detail.barcode.clone()).or_insert(0);
        *count += 1;
        if *count > detail.quantity {
            return Err(AppError::QuantityExceedsRequested(detail.barcode.clone()));
        }
    }
    Ok(sent)
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnfulfilledOrder {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub status: ReplenishmentStatus,
    pub created_at: DateTime<Utc>,
    pub outstanding_quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(barcode: &str, qty: i32, received: i32) -> ReplenishmentDetail {
        ReplenishmentDetail {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            barcode: barcode.into(),
            quantity: qty,
            sent_quantity: 0,
            received_quantity: received,
        }
    }

    #[test]
    fn fully_received_order_completes() {
        let details = vec![detail("A", 2, 2), detail("B", 1, 1)];
        assert_eq!(status_after_receipt(&details), ReplenishmentStatus::Completed);
        assert_eq!(outstanding_quantity(&details), 0);
    }

    #[test]
    fn short_receipt_is_partial() {
        let details = vec![detail("A", 5, 3), detail("B", 1, 1)];
        assert_eq!(status_after_receipt(&details), ReplenishmentStatus::PartiallyReceived);
        assert_eq!(outstanding_quantity(&details), 2);
    }

    #[test]
    fn outstanding_never_goes_negative() {
        assert_eq!(detail("A", 1, 3).outstanding(), 0);
    }

    #[test]
    fn fulfillment_counts_per_barcode() {
        let details = vec![detail("A", 2, 0), detail("B", 1, 0)];
        let sent = plan_fulfillment(&details, &["A", "B", "A"]).unwrap();
        assert_eq!(sent.get("A"), Some(&2));
        assert_eq!(sent.get("B"), Some(&1));
    }

    #[test]
    fn fulfillment_rejects_extra_units() {
        let details = vec![detail("A", 1, 0)];
        let err = plan_fulfillment(&details, &["A", "A"]).unwrap_err();
        assert!(matches!(err, AppError::QuantityExceedsRequested(b) if b == "A"));
    }

    #[test]
    fn fulfillment_rejects_unknown_barcode() {
        let details = vec![detail("A", 1, 0)];
        let err = plan_fulfillment(&details, &["C"]).unwrap_err();
        assert!(matches!(err, AppError::BarcodeNotInOrder(b) if b == "C"));
    }

    #[test]
    fn duplicate_barcodes_in_request() {
        assert!(ensure_distinct_barcodes(["A", "B"]).is_ok());
        assert!(matches!(
            ensure_distinct_barcodes(["A", "B", "A"]),
            Err(AppError::DuplicateBarcode(b)) if b == "A"
        ));
    }

    #[test]
    fn only_pending_orders_move() {
        assert!(ReplenishmentStatus::Pending.ensure_pending(ReplenishmentStatus::Sent).is_ok());
        assert!(ReplenishmentStatus::Sent.ensure_pending(ReplenishmentStatus::Cancelled).is_err());
    }

    #[test]
    fn only_full_receipt_stamps_completion() {
        assert!(ReplenishmentStatus::Completed.stamps_completion());
        assert!(!ReplenishmentStatus::PartiallyReceived.stamps_completion());
        assert!(!ReplenishmentStatus::Cancelled.stamps_completion());
    }
}
