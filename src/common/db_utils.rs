use sqlx::{pool::PoolConnection, Postgres};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;

// ---
// Helper de auditoria: a conexão carrega quem está agindo
// ---
/// Adquire uma conexão da pool e grava `app.user_id` na sessão.
/// O default de `stock_movements.user_id` lê esse valor.
pub(crate) async fn get_audited_connection(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<PoolConnection<Postgres>, AppError> {
    // 1. Adquire conexão
    let mut conn = app_state.db_pool.acquire().await?;

    // 2. Define User ID (nível de sessão: a conexão volta à pool e o próximo uso sobrescreve)
    sqlx::query("SELECT set_config('app.user_id', $1, false)")
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}
