// src/common/db_utils.rs

use std::future::Future;
use std::time::Duration;

use crate::common::error::AppError;

// ---
// Helper de timeout: toda chamada ao armazenamento tem prazo.
// ---
/// Executa uma operação do armazenamento com limite de tempo. Uma única tentativa:
/// se estourar o prazo, devolve `StoreTimeout` e o chamador decide o que mostrar.
pub(crate) async fn within_store_timeout<T, F>(limit: Duration, operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("⏱️ Armazenamento não respondeu em {:?}", limit);
            Err(AppError::StoreTimeout)
        }
    }
}
