use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::product_stock::StockState;

// Erro de domínio. Cada variante vira uma chave de tradução + status HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Papel insuficiente")]
    InsufficientRole,

    #[error("Almacén fora do escopo do usuário: {0}")]
    WarehouseScopeDenied(Uuid),

    #[error("Usuário sem almacén atribuído")]
    NoWarehouseAssigned,

    #[error("Cabeçalho x-warehouse-id inválido")]
    InvalidWarehouseHeader,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Código de almacén já existe: {0}")]
    WarehouseCodeAlreadyExists(String),

    #[error("Barcode já existe: {0}")]
    BarcodeAlreadyExists(String),

    #[error("Limite já existe para o barcode {0}")]
    StockLimitAlreadyExists(String),

    #[error("Almacén {0} já tem gabinete")]
    CabinetAlreadyExists(Uuid),

    #[error("CEDIS {0} não tem gabinete")]
    CedisHasNoCabinet(Uuid),

    #[error("Almacén inativo: {0}")]
    WarehouseInactive(Uuid),

    #[error("Transição inválida da unidade {stock_id} ({state:?} -> {action})")]
    InvalidStockTransition {
        stock_id: Uuid,
        state: StockState,
        action: &'static str,
    },

    #[error("Unidade {0} mudou durante a operação")]
    StockChangedConcurrently(Uuid),

    #[error("Unidade {0} não está no almacén")]
    StockNotInWarehouse(Uuid),

    #[error("Unidade repetida: {0}")]
    DuplicateStockUnit(Uuid),

    #[error("Barcode repetido: {0}")]
    DuplicateBarcode(String),

    #[error("Unidade {0} está numa transferência aberta")]
    UnitInOpenTransfer(Uuid),

    #[error("Empleado inativo: {0}")]
    EmployeeInactive(Uuid),

    #[error("Empleado {0} pertence a outro almacén")]
    EmployeeWarehouseMismatch(Uuid),

    #[error("Empleado {0} tem kits ou retiradas abertos")]
    EmployeeHasOpenAssignments(Uuid),

    #[error("Unidade {stock_id} não pertence a {owner_id}")]
    NotPartOfAssignment { owner_id: Uuid, stock_id: Uuid },

    #[error("Unidade {stock_id} não pertence à transferência {transfer_id}")]
    NotPartOfTransfer { transfer_id: Uuid, stock_id: Uuid },

    #[error("Unidade {0} já devolvida")]
    AlreadyReturned(Uuid),

    #[error("Unidade {0} já recebida")]
    AlreadyReceived(Uuid),

    #[error("{0} já está completo")]
    AssignmentAlreadyComplete(Uuid),

    #[error("Transição inválida de {entity}: {from} -> {to}")]
    InvalidStatusTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Origem e destino iguais")]
    SameWarehouseTransfer,

    #[error("O almacén solicitante não pode ser CEDIS")]
    RequesterIsCedis,

    #[error("A origem do pedido precisa ser CEDIS")]
    SourceNotCedis,

    #[error("Barcode {0} não está no pedido")]
    BarcodeNotInOrder(String),

    #[error("Quantidade enviada excede o pedido para {0}")]
    QuantityExceedsRequested(String),

    #[error("Motivo reservado para conciliação")]
    ReservedShrinkageReason,

    #[error("Faixa de limite inválida: {min}..{max}")]
    InvalidLimitRange { min: i32, max: i32 },

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que efetivamente sai pela API (já traduzido)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Classificação das violações do Postgres pelo nome da constraint
fn classify_database_error(e: &sqlx::Error) -> (StatusCode, &'static str) {
    match e {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "errors.not_found"),
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            (StatusCode::CONFLICT, "errors.conflict")
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            (StatusCode::BAD_REQUEST, "errors.reference_not_found")
        }
        sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
            (StatusCode::CONFLICT, "errors.constraint_violation")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "errors.internal"),
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            ValidationError(_) | InvalidWarehouseHeader => StatusCode::BAD_REQUEST,
            EmailAlreadyExists => StatusCode::CONFLICT,
            InvalidCredentials | InvalidToken => StatusCode::UNAUTHORIZED,
            UserNotFound | ResourceNotFound(_) => StatusCode::NOT_FOUND,
            InsufficientRole | WarehouseScopeDenied(_) | NoWarehouseAssigned => StatusCode::FORBIDDEN,

            WarehouseCodeAlreadyExists(_)
            | BarcodeAlreadyExists(_)
            | StockLimitAlreadyExists(_)
            | CabinetAlreadyExists(_)
            | InvalidStockTransition { .. }
            | StockChangedConcurrently(_)
            | UnitInOpenTransfer(_)
            | EmployeeHasOpenAssignments(_)
            | AlreadyReceived(_)
            | AssignmentAlreadyComplete(_)
            | InvalidStatusTransition { .. } => StatusCode::CONFLICT,

            CedisHasNoCabinet(_)
            | WarehouseInactive(_)
            | StockNotInWarehouse(_)
            | DuplicateStockUnit(_)
            | DuplicateBarcode(_)
            | EmployeeInactive(_)
            | EmployeeWarehouseMismatch(_)
            | NotPartOfAssignment { .. }
            | AlreadyReturned(_)
            | NotPartOfTransfer { .. }
            | SameWarehouseTransfer
            | RequesterIsCedis
            | SourceNotCedis
            | BarcodeNotInOrder(_)
            | QuantityExceedsRequested(_)
            | ReservedShrinkageReason
            | InvalidLimitRange { .. } => StatusCode::BAD_REQUEST,

            DatabaseError(e) => classify_database_error(e).0,
            InternalServerError(_) | BcryptError(_) | JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave no catálogo de mensagens (locales/*.json).
    pub fn key(&self) -> &'static str {
        use AppError::*;
        match self {
            ValidationError(_) => "errors.validation",
            EmailAlreadyExists => "errors.email_already_exists",
            InvalidCredentials => "errors.invalid_credentials",
            InvalidToken => "errors.invalid_token",
            UserNotFound => "errors.user_not_found",
            InsufficientRole => "errors.insufficient_role",
            WarehouseScopeDenied(_) => "errors.warehouse_scope_denied",
            NoWarehouseAssigned => "errors.no_warehouse_assigned",
            InvalidWarehouseHeader => "errors.invalid_warehouse_header",
            ResourceNotFound(_) => "errors.resource_not_found",
            WarehouseCodeAlreadyExists(_) => "errors.warehouse_code_exists",
            BarcodeAlreadyExists(_) => "errors.barcode_exists",
            StockLimitAlreadyExists(_) => "errors.stock_limit_exists",
            CabinetAlreadyExists(_) => "errors.cabinet_exists",
            CedisHasNoCabinet(_) => "errors.cedis_has_no_cabinet",
            WarehouseInactive(_) => "errors.warehouse_inactive",
            InvalidStockTransition { .. } => "errors.invalid_stock_transition",
            StockChangedConcurrently(_) => "errors.stock_changed_concurrently",
            StockNotInWarehouse(_) => "errors.stock_not_in_warehouse",
            DuplicateStockUnit(_) => "errors.duplicate_stock_unit",
            DuplicateBarcode(_) => "errors.duplicate_barcode",
            UnitInOpenTransfer(_) => "errors.unit_in_open_transfer",
            EmployeeInactive(_) => "errors.employee_inactive",
            EmployeeWarehouseMismatch(_) => "errors.employee_warehouse_mismatch",
            EmployeeHasOpenAssignments(_) => "errors.employee_has_open_assignments",
            NotPartOfAssignment { .. } => "errors.not_part_of_assignment",
            NotPartOfTransfer { .. } => "errors.not_part_of_transfer",
            AlreadyReturned(_) => "errors.already_returned",
            AlreadyReceived(_) => "errors.already_received",
            AssignmentAlreadyComplete(_) => "errors.assignment_complete",
            InvalidStatusTransition { .. } => "errors.invalid_status_transition",
            SameWarehouseTransfer => "errors.same_warehouse_transfer",
            RequesterIsCedis => "errors.requester_is_cedis",
            SourceNotCedis => "errors.source_not_cedis",
            BarcodeNotInOrder(_) => "errors.barcode_not_in_order",
            QuantityExceedsRequested(_) => "errors.quantity_exceeds_requested",
            ReservedShrinkageReason => "errors.reserved_shrinkage_reason",
            InvalidLimitRange { .. } => "errors.invalid_limit_range",
            DatabaseError(e) => classify_database_error(e).1,
            InternalServerError(_) | BcryptError(_) | JwtError(_) => "errors.internal",
        }
    }

    /// Valores interpolados na mensagem traduzida ({id}, {barcode}, ...).
    pub fn params(&self) -> Vec<(&'static str, String)> {
        use AppError::*;
        match self {
            WarehouseScopeDenied(id)
            | CabinetAlreadyExists(id)
            | CedisHasNoCabinet(id)
            | WarehouseInactive(id)
            | StockChangedConcurrently(id)
            | StockNotInWarehouse(id)
            | DuplicateStockUnit(id)
            | UnitInOpenTransfer(id)
            | EmployeeInactive(id)
            | EmployeeWarehouseMismatch(id)
            | EmployeeHasOpenAssignments(id)
            | AlreadyReturned(id)
            | AlreadyReceived(id)
            | AssignmentAlreadyComplete(id) => vec![("id", id.to_string())],

            ResourceNotFound(what) => vec![("resource", what.clone())],
            WarehouseCodeAlreadyExists(code) => vec![("code", code.clone())],

            BarcodeAlreadyExists(b)
            | StockLimitAlreadyExists(b)
            | DuplicateBarcode(b)
            | BarcodeNotInOrder(b)
            | QuantityExceedsRequested(b) => vec![("barcode", b.clone())],

            InvalidStockTransition { stock_id, state, action } => vec![
                ("id", stock_id.to_string()),
                ("state", state.as_str().to_string()),
                ("action", action.to_string()),
            ],
            NotPartOfAssignment { owner_id, stock_id } => {
                vec![("owner", owner_id.to_string()), ("id", stock_id.to_string())]
            }
            NotPartOfTransfer { transfer_id, stock_id } => {
                vec![("owner", transfer_id.to_string()), ("id", stock_id.to_string())]
            }
            InvalidStatusTransition { entity, from, to } => vec![
                ("entity", entity.to_string()),
                ("from", from.clone()),
                ("to", to.clone()),
            ],
            InvalidLimitRange { min, max } => vec![("min", min.to_string()), ("max", max.to_string())],
            DatabaseError(sqlx::Error::Database(db_err)) => {
                vec![("constraint", db_err.constraint().unwrap_or_default().to_string())]
            }
            _ => Vec::new(),
        }
    }

    /// Converte o erro de domínio na resposta localizada.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        if let AppError::ValidationError(errors) = self {
            let mut details: HashMap<String, Vec<String>> = HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                        let params: Vec<(&str, String)> = e
                            .params
                            .iter()
                            .filter(|(name, _)| name.as_ref() != "value")
                            .map(|(name, value)| {
                                let text = match value {
                                    Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                };
                                (name.as_ref(), text)
                            })
                            .collect();
                        store.translate(&locale.0, &format!("validation.{}", key), &params)
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            return ApiError {
                status,
                error: store.translate(&locale.0, self.key(), &[]),
                details: Some(json!(details)),
            };
        }

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let params = self.params();
        ApiError {
            status,
            error: store.translate(&locale.0, self.key(), &params),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn store() -> I18nStore {
        I18nStore::load_embedded().unwrap()
    }

    #[test]
    fn domain_errors_map_to_expected_status() {
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InsufficientRole.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::ResourceNotFound("kit".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::AlreadyReturned(Uuid::nil()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::AssignmentAlreadyComplete(Uuid::nil()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::SameWarehouseTransfer.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_is_translated_and_interpolated() {
        let err = AppError::InvalidStockTransition {
            stock_id: Uuid::nil(),
            state: StockState::InKit,
            action: "delete",
        };
        let api = err.to_api_error(&Locale("es".into()), &store());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert!(api.error.contains("in_kit"), "{}", api.error);
        assert!(api.error.contains(&Uuid::nil().to_string()));
        assert!(!api.error.contains('{'));
    }

    #[test]
    fn every_error_key_exists_in_every_locale() {
        let samples = vec![
            AppError::EmailAlreadyExists,
            AppError::InvalidCredentials,
            AppError::InvalidToken,
            AppError::UserNotFound,
            AppError::InsufficientRole,
            AppError::WarehouseScopeDenied(Uuid::nil()),
            AppError::NoWarehouseAssigned,
            AppError::InvalidWarehouseHeader,
            AppError::ResourceNotFound("x".into()),
            AppError::WarehouseCodeAlreadyExists("x".into()),
            AppError::BarcodeAlreadyExists("x".into()),
            AppError::StockLimitAlreadyExists("x".into()),
            AppError::CabinetAlreadyExists(Uuid::nil()),
            AppError::CedisHasNoCabinet(Uuid::nil()),
            AppError::WarehouseInactive(Uuid::nil()),
            AppError::InvalidStockTransition { stock_id: Uuid::nil(), state: StockState::Empty, action: "x" },
            AppError::StockChangedConcurrently(Uuid::nil()),
            AppError::StockNotInWarehouse(Uuid::nil()),
            AppError::DuplicateStockUnit(Uuid::nil()),
            AppError::DuplicateBarcode("x".into()),
            AppError::UnitInOpenTransfer(Uuid::nil()),
            AppError::EmployeeInactive(Uuid::nil()),
            AppError::EmployeeWarehouseMismatch(Uuid::nil()),
            AppError::EmployeeHasOpenAssignments(Uuid::nil()),
            AppError::NotPartOfAssignment { owner_id: Uuid::nil(), stock_id: Uuid::nil() },
            AppError::NotPartOfTransfer { transfer_id: Uuid::nil(), stock_id: Uuid::nil() },
            AppError::AlreadyReturned(Uuid::nil()),
            AppError::AlreadyReceived(Uuid::nil()),
            AppError::AssignmentAlreadyComplete(Uuid::nil()),
            AppError::InvalidStatusTransition { entity: "transfer", from: "A".into(), to: "B".into() },
            AppError::SameWarehouseTransfer,
            AppError::RequesterIsCedis,
            AppError::SourceNotCedis,
            AppError::BarcodeNotInOrder("x".into()),
            AppError::QuantityExceedsRequested("x".into()),
            AppError::ReservedShrinkageReason,
            AppError::InvalidLimitRange { min: 2, max: 1 },
            AppError::DatabaseError(sqlx::Error::RowNotFound),
            AppError::InternalServerError(anyhow::anyhow!("boom")),
        ];

        let store = store();
        for lang in ["en", "es", "pt"] {
            for err in &samples {
                assert!(store.has_key(lang, err.key()), "{} missing in {}", err.key(), lang);
            }
        }
        for key in ["errors.validation", "errors.conflict", "errors.reference_not_found", "errors.constraint_violation"] {
            for lang in ["en", "es", "pt"] {
                assert!(store.has_key(lang, key), "{} missing in {}", key, lang);
            }
        }
    }

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "required"))]
        name: String,
        #[validate(range(min = 1, max = 500, message = "quantity_range"))]
        quantity: i32,
    }

    #[test]
    fn validation_errors_list_every_field() {
        let errors = Sample { name: String::new(), quantity: 0 }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);

        let details = api.details.unwrap();
        assert!(details["name"][0].as_str().unwrap().len() > 0);
        let qty = details["quantity"][0].as_str().unwrap();
        assert!(qty.contains("500"), "{}", qty);
    }
}
