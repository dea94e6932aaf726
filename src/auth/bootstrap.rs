use sqlx::PgPool;

use crate::auth::password;
use crate::db;
use crate::models::Role;

pub const SUPER_ADMIN_USERNAME: &str = "admin";

/// Create the `admin` super admin when none exists. Returns whether one was
/// created. The new login must change its password on first use.
pub async fn ensure_super_admin(pool: &PgPool, initial_password: &str) -> Result<bool, String> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| format!("Failed to open transaction: {e}"))?;

    // Serializes concurrent bootstraps from several instances.
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await
        .map_err(|e| format!("Failed to take bootstrap lock: {e}"))?;

    let existing = db::admin_users::count_by_role(&mut *tx, Role::SuperAdmin)
        .await
        .map_err(|e| format!("Failed to count super admins: {e}"))?;
    if existing > 0 {
        return Ok(false);
    }

    let hash = password::hash(initial_password)?;
    db::admin_users::create(&mut *tx, SUPER_ADMIN_USERNAME, &hash, Role::SuperAdmin, None)
        .await
        .map_err(|e| format!("Failed to create super admin: {e}"))?;

    tx.commit()
        .await
        .map_err(|e| format!("Failed to commit bootstrap: {e}"))?;

    tracing::warn!("Created super admin '{SUPER_ADMIN_USERNAME}'; change its password on first login");
    Ok(true)
}
