//! Registrar lookups

use crate::core_types::RegistrarId;
use crate::db::OperationContext;

/// Resolve a registrar handle case-insensitively
pub async fn get_registrar_id_by_handle(
    ctx: &mut OperationContext,
    handle: &str,
) -> Result<Option<RegistrarId>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM registrar WHERE UPPER(handle) = UPPER($1)")
        .bind(handle)
        .fetch_optional(ctx.conn())
        .await
}
