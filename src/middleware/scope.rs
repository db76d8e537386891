// src/middleware/scope.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// O nome do nosso cabeçalho HTTP customizado
pub const WAREHOUSE_ID_HEADER: &str = "x-warehouse-id";

// Quais almacenes a requisição enxerga.
// Admin e usuários do CEDIS podem ver tudo (Global) ou escolher um almacén;
// os demais ficam presos ao próprio almacén.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseScope {
    Global,
    Warehouse(Uuid),
}

impl WarehouseScope {
    pub fn resolve(user: &User, requested: Option<Uuid>) -> Result<Self, AppError> {
        if user.is_admin() || user.is_assigned_to_cedis() {
            return Ok(requested.map_or(WarehouseScope::Global, WarehouseScope::Warehouse));
        }

        let own = user.warehouse_id.ok_or(AppError::NoWarehouseAssigned)?;
        match requested {
            Some(other) if other != own => Err(AppError::WarehouseScopeDenied(other)),
            _ => Ok(WarehouseScope::Warehouse(own)),
        }
    }

    /// Aplica o filtro `warehouseId` da query string sobre o escopo.
    pub fn narrow(self, filter: Option<Uuid>) -> Result<Self, AppError> {
        match (self, filter) {
            (scope, None) => Ok(scope),
            (WarehouseScope::Global, Some(id)) => Ok(WarehouseScope::Warehouse(id)),
            (WarehouseScope::Warehouse(own), Some(id)) if own == id => Ok(self),
            (WarehouseScope::Warehouse(_), Some(id)) => Err(AppError::WarehouseScopeDenied(id)),
        }
    }

    pub fn ensure_allows(self, warehouse_id: Uuid) -> Result<(), AppError> {
        match self {
            WarehouseScope::Global => Ok(()),
            WarehouseScope::Warehouse(own) if own == warehouse_id => Ok(()),
            WarehouseScope::Warehouse(_) => Err(AppError::WarehouseScopeDenied(warehouse_id)),
        }
    }

    /// Transferências e pedidos envolvem dois almacenes; basta enxergar um deles.
    pub fn ensure_allows_either(self, a: Uuid, b: Uuid) -> Result<(), AppError> {
        self.ensure_allows(a).or_else(|_| self.ensure_allows(b))
    }

    /// `None` = todos os almacenes.
    pub fn warehouse_id(self) -> Option<Uuid> {
        match self {
            WarehouseScope::Global => None,
            WarehouseScope::Warehouse(id) => Some(id),
        }
    }
}

fn requested_warehouse(parts: &Parts) -> Result<Option<Uuid>, AppError> {
    let Some(value) = parts.headers.get(WAREHOUSE_ID_HEADER) else {
        return Ok(None);
    };
    let raw = value.to_str().map_err(|_| AppError::InvalidWarehouseHeader)?;
    Uuid::parse_str(raw.trim())
        .map(Some)
        .map_err(|_| AppError::InvalidWarehouseHeader)
}

impl<S> FromRequestParts<S> for WarehouseScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        let user = parts
            .extensions
            .get::<User>()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        requested_warehouse(parts)
            .and_then(|requested| WarehouseScope::resolve(user, requested))
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use axum::http::Request;
    use chrono::Utc;

    fn user(role: UserRole, warehouse_id: Option<Uuid>, cedis: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "x@almacen.mx".into(),
            name: "X".into(),
            password_hash: String::new(),
            role,
            warehouse_id,
            warehouse_is_cedis: warehouse_id.map(|_| cedis),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_is_global_unless_a_warehouse_is_picked() {
        let admin = user(UserRole::Admin, None, false);
        let wh = Uuid::new_v4();
        assert_eq!(WarehouseScope::resolve(&admin, None).unwrap(), WarehouseScope::Global);
        assert_eq!(
            WarehouseScope::resolve(&admin, Some(wh)).unwrap(),
            WarehouseScope::Warehouse(wh)
        );
    }

    #[test]
    fn cedis_staff_see_every_warehouse() {
        let staff = user(UserRole::Operator, Some(Uuid::new_v4()), true);
        assert_eq!(WarehouseScope::resolve(&staff, None).unwrap(), WarehouseScope::Global);
        let other = Uuid::new_v4();
        assert_eq!(
            WarehouseScope::resolve(&staff, Some(other)).unwrap(),
            WarehouseScope::Warehouse(other)
        );
    }

    #[test]
    fn branch_user_is_pinned() {
        let own = Uuid::new_v4();
        let encargado = user(UserRole::Encargado, Some(own), false);
        assert_eq!(
            WarehouseScope::resolve(&encargado, None).unwrap(),
            WarehouseScope::Warehouse(own)
        );
        assert_eq!(
            WarehouseScope::resolve(&encargado, Some(own)).unwrap(),
            WarehouseScope::Warehouse(own)
        );

        let other = Uuid::new_v4();
        assert!(matches!(
            WarehouseScope::resolve(&encargado, Some(other)),
            Err(AppError::WarehouseScopeDenied(id)) if id == other
        ));
    }

    #[test]
    fn user_without_warehouse_is_rejected() {
        let operator = user(UserRole::Operator, None, false);
        assert!(matches!(
            WarehouseScope::resolve(&operator, None),
            Err(AppError::NoWarehouseAssigned)
        ));
    }

    #[test]
    fn narrow_and_allow() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(WarehouseScope::Global.narrow(Some(a)).unwrap(), WarehouseScope::Warehouse(a));
        assert_eq!(WarehouseScope::Global.narrow(None).unwrap(), WarehouseScope::Global);
        assert_eq!(WarehouseScope::Warehouse(a).narrow(Some(a)).unwrap(), WarehouseScope::Warehouse(a));
        assert!(WarehouseScope::Warehouse(a).narrow(Some(b)).is_err());

        assert!(WarehouseScope::Global.ensure_allows(b).is_ok());
        assert!(WarehouseScope::Warehouse(a).ensure_allows(a).is_ok());
        assert!(matches!(
            WarehouseScope::Warehouse(a).ensure_allows(b),
            Err(AppError::WarehouseScopeDenied(id)) if id == b
        ));
        assert_eq!(WarehouseScope::Global.warehouse_id(), None);

        assert!(WarehouseScope::Warehouse(a).ensure_allows_either(b, a).is_ok());
        assert!(matches!(
            WarehouseScope::Warehouse(a).ensure_allows_either(b, b),
            Err(AppError::WarehouseScopeDenied(id)) if id == b
        ));
    }

    #[test]
    fn header_must_be_a_uuid() {
        let (parts, _) = Request::builder()
            .header(WAREHOUSE_ID_HEADER, "sucursal-1")
            .body(())
            .unwrap()
            .into_parts();
        assert!(matches!(requested_warehouse(&parts), Err(AppError::InvalidWarehouseHeader)));

        let id = Uuid::new_v4();
        let (parts, _) = Request::builder()
            .header(WAREHOUSE_ID_HEADER, id.to_string())
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(requested_warehouse(&parts).unwrap(), Some(id));
    }
}
