// ==================== RESET TOKEN CLEANUP ====================
// Remove de hora em hora os tokens de redefinição de senha já usados
// ou expirados.

use crate::database::{MongoDB, RESET_TOKENS};
use mongodb::bson::{doc, Document};
use tokio::time::{interval, Duration};

const CLEANUP_INTERVAL_SECS: u64 = 3600;

pub fn stale_tokens_filter(now: i64) -> Document {
    doc! {
        "$or": [
            { "used": true },
            { "expires_at": { "$lte": now } },
        ]
    }
}

async fn purge_stale_tokens(db: &MongoDB) -> Result<u64, mongodb::error::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = db
        .collection::<Document>(RESET_TOKENS)
        .delete_many(stale_tokens_filter(now))
        .await?;
    Ok(result.deleted_count)
}

/// Inicia o job de limpeza em background (primeiro tick imediato)
pub async fn start_reset_token_cleanup(db: MongoDB) {
    log::info!("🧹 Starting reset token cleanup (runs every hour)");

    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match purge_stale_tokens(&db).await {
                Ok(0) => log::debug!("🧹 No stale reset tokens"),
                Ok(count) => log::info!("🧹 Removed {} stale reset tokens", count),
                Err(e) => log::error!("❌ Reset token cleanup failed: {}", e),
            }
        }
    });
}
