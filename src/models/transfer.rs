// src/models/transfer.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transfer_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    InTransit,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::InTransit => "IN_TRANSIT",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_become(self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (TransferStatus::Pending, TransferStatus::InTransit)
                | (TransferStatus::Pending, TransferStatus::Cancelled)
                | (TransferStatus::InTransit, TransferStatus::Completed)
        )
    }

    pub fn ensure_can_become(self, next: TransferStatus) -> Result<(), AppError> {
        if self.can_become(next) {
            Ok(())
        } else {
            Err(AppError::InvalidStatusTransition {
                entity: "transfer",
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseTransfer {
    pub id: Uuid,
    pub source_warehouse_id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub status: TransferStatus,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetail {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub product_stock_id: Uuid,
    pub barcode: String,
    pub is_received: bool,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferWithDetails {
    #[serde(flatten)]
    pub transfer: WarehouseTransfer,
    pub details: Vec<TransferDetail>,
}

// --- Conciliação ---
// Para cada barcode: enviado = recebido + faltante. O faltante vira merma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationLine {
    pub barcode: String,
    pub sent: i32,
    pub received: i32,
    pub missing: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferReconciliation {
    #[serde(flatten)]
    pub transfer: WarehouseTransfer,
    pub lines: Vec<ReconciliationLine>,
    pub total_missing: i32,
}

/// Agrupa os detalhes por barcode (ordem alfabética, determinística).
pub fn reconcile(details: &[TransferDetail]) -> Vec<ReconciliationLine> {
    let mut by_barcode: BTreeMap<&str, (i32, i32)> = BTreeMap::new();
    for d in details {
        let entry = by_barcode.entry(d.barcode.as_str()).or_default();
        entry.0 += 1;
        if d.is_received {
            entry.1 += 1;
        }
    }

    by_barcode
        .into_iter()
        .map(|(barcode, (sent, received))| ReconciliationLine {
            barcode: barcode.to_string(),
            sent,
            received,
            missing: sent - received,
        })
        .collect()
}

/// Quantidades recebidas por barcode, usadas para atualizar o pedido de reposição vinculado.
pub fn received_by_barcode(lines: &[ReconciliationLine]) -> BTreeMap<String, i32> {
    lines.iter().map(|l| (l.barcode.clone(), l.received)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(barcode: &str, received: bool) -> TransferDetail {
        TransferDetail {
            id: Uuid::new_v4(),
            transfer_id: Uuid::nil(),
            product_stock_id: Uuid::new_v4(),
            barcode: barcode.into(),
            is_received: received,
            received_at: None,
        }
    }

    #[test]
    fn lines_balance_per_barcode() {
        let details = vec![
            detail("B", true),
            detail("A", true),
            detail("A", false),
            detail("B", true),
            detail("A", false),
        ];
        let lines = reconcile(&details);
        assert_eq!(
            lines,
            vec![
                ReconciliationLine { barcode: "A".into(), sent: 3, received: 1, missing: 2 },
                ReconciliationLine { barcode: "B".into(), sent: 2, received: 2, missing: 0 },
            ]
        );
        for l in &lines {
            assert_eq!(l.received + l.missing, l.sent);
        }
        let total_missing: i32 = lines.iter().map(|l| l.missing).sum();
        let unreceived = details.iter().filter(|d| !d.is_received).count() as i32;
        assert_eq!(total_missing, unreceived);
    }

    #[test]
    fn empty_transfer_has_no_lines() {
        assert!(reconcile(&[]).is_empty());
    }

    #[test]
    fn received_map_feeds_replenishment() {
        let lines = reconcile(&[detail("A", true), detail("A", false)]);
        let map = received_by_barcode(&lines);
        assert_eq!(map.get("A"), Some(&1));
    }

    #[test]
    fn status_machine() {
        use TransferStatus::*;
        assert!(Pending.can_become(InTransit));
        assert!(Pending.can_become(Cancelled));
        assert!(InTransit.can_become(Completed));
        assert!(!InTransit.can_become(Cancelled));
        assert!(!Completed.can_become(InTransit));
        assert!(!Pending.can_become(Completed));
    }

    #[test]
    fn invalid_status_change_names_both_states() {
        let err = TransferStatus::Completed
            .ensure_can_become(TransferStatus::Cancelled)
            .unwrap_err();
        match err {
            AppError::InvalidStatusTransition { entity, from, to } => {
                assert_eq!(entity, "transfer");
                assert_eq!(from, "COMPLETED");
                assert_eq!(to, "CANCELLED");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
