// src/models/product_stock.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;
use crate::models::shrinkage::ShrinkageReason;

// --- 1. Estado derivado de uma unidade física ---
// O banco guarda flags booleanas; o estado é sempre derivado delas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    Available,
    InUse,
    InKit,
    Empty,
    Deleted,
}

/// Conjunto de flags persistidas em `product_stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockFlags {
    pub is_being_used: bool,
    pub is_empty: bool,
    pub is_deleted: bool,
    pub is_kit: bool,
}

impl StockState {
    pub fn from_flags(flags: StockFlags) -> Self {
        if flags.is_deleted {
            StockState::Deleted
        } else if flags.is_empty {
            StockState::Empty
        } else if flags.is_kit && flags.is_being_used {
            StockState::InKit
        } else if flags.is_being_used {
            StockState::InUse
        } else {
            StockState::Available
        }
    }

    /// Flags canônicas do estado (o que gravamos no UPDATE).
    pub fn flags(self) -> StockFlags {
        let (is_being_used, is_empty, is_deleted, is_kit) = match self {
            StockState::Available => (false, false, false, false),
            StockState::InUse => (true, false, false, false),
            StockState::InKit => (true, false, false, true),
            StockState::Empty => (false, true, false, false),
            StockState::Deleted => (false, false, true, false),
        };
        StockFlags { is_being_used, is_empty, is_deleted, is_kit }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockState::Available => "available",
            StockState::InUse => "in_use",
            StockState::InKit => "in_kit",
            StockState::Empty => "empty",
            StockState::Deleted => "deleted",
        }
    }
}

// --- 2. Ações que movem uma unidade ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAction {
    CheckOut,
    AssignToKit,
    Return { mark_empty: bool },
    MarkEmpty,
    RecordUsage,
    Transfer,
    Delete,
}

impl StockAction {
    pub fn as_str(self) -> &'static str {
        match self {
            StockAction::CheckOut => "check_out",
            StockAction::AssignToKit => "assign_to_kit",
            StockAction::Return { .. } => "return",
            StockAction::MarkEmpty => "mark_empty",
            StockAction::RecordUsage => "record_usage",
            StockAction::Transfer => "transfer",
            StockAction::Delete => "delete",
        }
    }

    /// Ações proibidas enquanto a unidade está numa transferência PENDING/IN_TRANSIT.
    /// A unidade segue Available na origem e tem de chegar Available no destino.
    pub fn blocked_by_open_transfer(self) -> bool {
        !matches!(self, StockAction::Return { .. })
    }
}

/// Tabela de transições. `None` = transição proibida.
pub fn next_state(from: StockState, action: StockAction) -> Option<StockState> {
    use StockAction as A;
    use StockState as S;

    match (from, action) {
        (S::Available, A::CheckOut) => Some(S::InUse),
        (S::Available, A::AssignToKit) => Some(S::InKit),
        (S::InUse | S::InKit, A::Return { mark_empty: true }) => Some(S::Empty),
        (S::InUse | S::InKit, A::Return { mark_empty: false }) => Some(S::Available),
        (S::Available, A::MarkEmpty) => Some(S::Empty),
        (S::Available, A::RecordUsage) => Some(S::Available),
        (S::Available, A::Transfer) => Some(S::Available),
        (S::Available | S::Empty, A::Delete) => Some(S::Deleted),
        _ => None,
    }
}

// --- 3. Unidade física ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    pub id: Uuid,

    #[schema(example = "7501031311309")]
    pub barcode: String,

    pub warehouse_id: Uuid,
    pub number_of_uses: i32,
    pub first_used_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub last_used_by: Option<Uuid>,
    pub is_being_used: bool,
    pub is_empty: bool,
    pub is_deleted: bool,
    pub is_kit: bool,
    pub deleted_reason: Option<ShrinkageReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductStock {
    pub fn flags(&self) -> StockFlags {
        StockFlags {
            is_being_used: self.is_being_used,
            is_empty: self.is_empty,
            is_deleted: self.is_deleted,
            is_kit: self.is_kit,
        }
    }

    pub fn state(&self) -> StockState {
        StockState::from_flags(self.flags())
    }

    /// Valida a ação e devolve o estado de destino.
    pub fn transition(&self, action: StockAction) -> Result<StockState, AppError> {
        let from = self.state();
        next_state(from, action).ok_or(AppError::InvalidStockTransition {
            stock_id: self.id,
            state: from,
            action: action.as_str(),
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStockView {
    #[serde(flatten)]
    pub stock: ProductStock,
    pub state: StockState,
}

impl From<ProductStock> for ProductStockView {
    fn from(stock: ProductStock) -> Self {
        let state = stock.state();
        Self { stock, state }
    }
}

/// Rejeita listas com ids repetidos (a mesma unidade duas vezes num kit, por exemplo).
pub fn ensure_distinct(ids: &[Uuid]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(AppError::DuplicateStockUnit(*id));
        }
    }
    Ok(())
}

/// Checagem de lote antes de um kit, retirada ou transferência:
/// toda unidade pedida existe, está no almacén e aceita a ação.
pub fn ensure_batch_ready(
    units: &[ProductStock],
    requested: &[Uuid],
    warehouse_id: Uuid,
    action: StockAction,
) -> Result<(), AppError> {
    ensure_distinct(requested)?;

    for id in requested {
        let unit = units
            .iter()
            .find(|u| u.id == *id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("product_stock {}", id)))?;

        if unit.warehouse_id != warehouse_id {
            return Err(AppError::StockNotInWarehouse(unit.id));
        }
        unit.transition(action)?;
    }
    Ok(())
}

/// Depois de um uso registrado: a unidade esgotou?
pub fn usage_exhausted(number_of_uses: i32, max_uses: i32) -> bool {
    number_of_uses >= max_uses.max(1)
}

// --- 4. Histórico (livro-razão de cada unidade) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_movement_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementKind {
    Created,
    CheckedOut,
    Returned,
    MarkedEmpty,
    UsageRecorded,
    Deleted,
    KitAssigned,
    KitReturned,
    TransferShipped,
    TransferReceived,
    TransferMissing,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_stock_id: Uuid,
    pub kind: StockMovementKind,
    pub warehouse_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn unit_in(warehouse_id: Uuid, state: StockState) -> ProductStock {
        let flags = state.flags();
        ProductStock {
            id: Uuid::new_v4(),
            barcode: "7501031311309".into(),
            warehouse_id,
            number_of_uses: 0,
            first_used_at: None,
            last_used_at: None,
            last_used_by: None,
            is_being_used: flags.is_being_used,
            is_empty: flags.is_empty,
            is_deleted: flags.is_deleted,
            is_kit: flags.is_kit,
            deleted_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn flags_round_trip_for_every_state() {
        for state in [
            StockState::Available,
            StockState::InUse,
            StockState::InKit,
            StockState::Empty,
            StockState::Deleted,
        ] {
            assert_eq!(StockState::from_flags(state.flags()), state);
        }
    }

    #[test]
    fn deleted_flag_wins_over_everything() {
        let flags = StockFlags { is_being_used: false, is_empty: true, is_deleted: true, is_kit: false };
        assert_eq!(StockState::from_flags(flags), StockState::Deleted);
    }

    #[test]
    fn kit_flag_without_use_reads_as_available() {
        let flags = StockFlags { is_being_used: false, is_empty: false, is_deleted: false, is_kit: true };
        assert_eq!(StockState::from_flags(flags), StockState::Available);
    }

    #[test]
    fn no_state_is_both_in_use_and_deleted() {
        for state in [StockState::InUse, StockState::InKit, StockState::Deleted] {
            let f = state.flags();
            assert!(!(f.is_being_used && f.is_deleted));
        }
    }

    #[test]
    fn checkout_and_return_cycle() {
        let in_use = next_state(StockState::Available, StockAction::CheckOut).unwrap();
        assert_eq!(in_use, StockState::InUse);
        assert_eq!(
            next_state(in_use, StockAction::Return { mark_empty: false }),
            Some(StockState::Available)
        );
        assert_eq!(
            next_state(in_use, StockAction::Return { mark_empty: true }),
            Some(StockState::Empty)
        );
    }

    #[test]
    fn in_use_units_cannot_be_deleted_or_reassigned() {
        for state in [StockState::InUse, StockState::InKit] {
            assert_eq!(next_state(state, StockAction::Delete), None);
            assert_eq!(next_state(state, StockAction::CheckOut), None);
            assert_eq!(next_state(state, StockAction::AssignToKit), None);
            assert_eq!(next_state(state, StockAction::Transfer), None);
        }
    }

    #[test]
    fn deleted_is_terminal() {
        for action in [
            StockAction::CheckOut,
            StockAction::AssignToKit,
            StockAction::Return { mark_empty: false },
            StockAction::MarkEmpty,
            StockAction::RecordUsage,
            StockAction::Transfer,
            StockAction::Delete,
        ] {
            assert_eq!(next_state(StockState::Deleted, action), None);
        }
    }

    #[test]
    fn empty_units_can_only_be_deleted() {
        assert_eq!(next_state(StockState::Empty, StockAction::Delete), Some(StockState::Deleted));
        assert_eq!(next_state(StockState::Empty, StockAction::CheckOut), None);
        assert_eq!(next_state(StockState::Empty, StockAction::MarkEmpty), None);
    }

    #[test]
    fn transition_error_carries_state_and_action() {
        let unit = unit_in(Uuid::new_v4(), StockState::InKit);
        match unit.transition(StockAction::Delete) {
            Err(AppError::InvalidStockTransition { stock_id, state, action }) => {
                assert_eq!(stock_id, unit.id);
                assert_eq!(state, StockState::InKit);
                assert_eq!(action, "delete");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn batch_rejects_duplicates() {
        let id = Uuid::new_v4();
        assert!(matches!(ensure_distinct(&[id, id]), Err(AppError::DuplicateStockUnit(d)) if d == id));
    }

    #[test]
    fn batch_rejects_unit_from_other_warehouse() {
        let wh = Uuid::new_v4();
        let unit = unit_in(Uuid::new_v4(), StockState::Available);
        let err = ensure_batch_ready(&[unit.clone()], &[unit.id], wh, StockAction::CheckOut).unwrap_err();
        assert!(matches!(err, AppError::StockNotInWarehouse(id) if id == unit.id));
    }

    #[test]
    fn batch_rejects_missing_unit() {
        let err = ensure_batch_ready(&[], &[Uuid::new_v4()], Uuid::new_v4(), StockAction::CheckOut)
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }

    #[test]
    fn batch_rejects_unit_already_in_use() {
        let wh = Uuid::new_v4();
        let free = unit_in(wh, StockState::Available);
        let busy = unit_in(wh, StockState::InUse);
        let err = ensure_batch_ready(
            &[free.clone(), busy.clone()],
            &[free.id, busy.id],
            wh,
            StockAction::AssignToKit,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidStockTransition { stock_id, .. } if stock_id == busy.id));
    }

    #[test]
    fn batch_accepts_available_units() {
        let wh = Uuid::new_v4();
        let a = unit_in(wh, StockState::Available);
        let b = unit_in(wh, StockState::Available);
        assert!(ensure_batch_ready(&[a.clone(), b.clone()], &[a.id, b.id], wh, StockAction::CheckOut).is_ok());
    }

    #[test]
    fn units_in_open_transfer_only_accept_returns() {
        // esvaziar ou usar na origem deixaria a unidade impossível de receber no destino
        assert!(StockAction::MarkEmpty.blocked_by_open_transfer());
        assert!(StockAction::RecordUsage.blocked_by_open_transfer());
        assert!(StockAction::Delete.blocked_by_open_transfer());
        assert!(StockAction::CheckOut.blocked_by_open_transfer());
        assert!(StockAction::AssignToKit.blocked_by_open_transfer());
        assert!(StockAction::Transfer.blocked_by_open_transfer());
        assert!(!StockAction::Return { mark_empty: true }.blocked_by_open_transfer());
    }

    #[test]
    fn usage_exhaustion_uses_product_max() {
        assert!(!usage_exhausted(3, 4));
        assert!(usage_exhausted(4, 4));
        // max_uses inválido conta como 1
        assert!(usage_exhausted(1, 0));
    }

    #[test]
    fn view_serializes_derived_state() {
        let view = ProductStockView::from(unit_in(Uuid::new_v4(), StockState::InKit));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "in_kit");
        assert_eq!(json["isKit"], true);
    }
}
