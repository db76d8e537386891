// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{User, UserRole},
};

/// 1. O Trait que define um grupo de papéis
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];

    fn permits(role: UserRole) -> bool {
        Self::allowed().contains(&role)
    }
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        // A. Usuário colocado pelo auth_guard
        let user = parts
            .extensions
            .get::<User>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Confere o papel
        if !T::permits(user.role) {
            tracing::warn!("⛔ Usuário {} ({:?}) barrado por papel", user.id, user.role);
            return Err(AppError::InsufficientRole.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS GRUPOS (TIPOS)
// ---

pub struct Admin;
impl RoleDef for Admin {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin] }
}

// Gerente de almacén (o admin também passa)
pub struct Encargado;
impl RoleDef for Encargado {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Encargado] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_group_is_exclusive() {
        assert!(Admin::permits(UserRole::Admin));
        assert!(!Admin::permits(UserRole::Encargado));
        assert!(!Admin::permits(UserRole::Operator));
    }

    #[test]
    fn encargado_group_includes_admin() {
        assert!(Encargado::permits(UserRole::Admin));
        assert!(Encargado::permits(UserRole::Encargado));
        assert!(!Encargado::permits(UserRole::Operator));
    }
}
