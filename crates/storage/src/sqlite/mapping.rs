use exam_core::model::{AttemptId, ExamResult, ResultId, SeriesId};
use sqlx::Row;

use crate::repository::{CachedResult, ResultRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn series_id_to_i64(id: SeriesId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("series_id overflow".into()))
}

pub(crate) fn encode_payload(result: &ExamResult) -> Result<String, StorageError> {
    serde_json::to_string(&ResultRecord::from_result(result)).map_err(ser)
}

pub(crate) fn decode_payload(payload: &str) -> Result<ExamResult, StorageError> {
    let record: ResultRecord = serde_json::from_str(payload).map_err(ser)?;
    Ok(record.into_result()?)
}

pub(crate) fn map_cached_row(row: &sqlx::sqlite::SqliteRow) -> Result<CachedResult, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    let result = decode_payload(&payload)?;

    let result_id: String = row.try_get("result_id").map_err(ser)?;
    let result_id: ResultId = result_id.parse().map_err(ser)?;
    if result_id != result.id() {
        return Err(StorageError::Serialization(format!(
            "result_id column {result_id} does not match payload {}",
            result.id()
        )));
    }

    let attempt_id = row
        .try_get::<Option<String>, _>("attempt_id")
        .map_err(ser)?
        .map(AttemptId::new);
    let cached_at = row.try_get("cached_at").map_err(ser)?;

    Ok(CachedResult {
        result,
        attempt_id,
        cached_at,
    })
}
