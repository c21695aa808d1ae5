use chrono::{DateTime, Utc};
use exam_core::model::{AttemptId, ExamResult, ResultId};

use super::SqliteRepository;
use super::mapping::{encode_payload, map_cached_row, series_id_to_i64};
use crate::repository::{CachedResult, ResultCache, StorageError};

const SLOT: &str = "most_recent";

#[async_trait::async_trait]
impl ResultCache for SqliteRepository {
    async fn store_latest(
        &self,
        result: &ExamResult,
        cached_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = encode_payload(result)?;

        sqlx::query(
            r"
                INSERT INTO latest_result (
                    slot, result_id, series_id, score, level, payload, attempt_id, cached_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)
                ON CONFLICT(slot) DO UPDATE SET
                    result_id = excluded.result_id,
                    series_id = excluded.series_id,
                    score = excluded.score,
                    level = excluded.level,
                    payload = excluded.payload,
                    attempt_id = NULL,
                    cached_at = excluded.cached_at
            ",
        )
        .bind(SLOT)
        .bind(result.id().to_string())
        .bind(series_id_to_i64(result.series_id())?)
        .bind(i64::from(result.score()))
        .bind(result.level().as_str())
        .bind(payload)
        .bind(cached_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn latest(&self) -> Result<Option<CachedResult>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT result_id, payload, attempt_id, cached_at
                FROM latest_result
                WHERE slot = ?1
            ",
        )
        .bind(SLOT)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_cached_row).transpose()
    }

    async fn mark_submitted(
        &self,
        result_id: ResultId,
        attempt_id: &AttemptId,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE latest_result
                SET attempt_id = ?1
                WHERE slot = ?2 AND result_id = ?3
            ",
        )
        .bind(attempt_id.as_str())
        .bind(SLOT)
        .bind(result_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM latest_result WHERE slot = ?1")
            .bind(SLOT)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
