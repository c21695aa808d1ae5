use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::exam_api::ExamApi;
use crate::results_service::ResultsService;
use crate::sessions::ExamRunService;

/// Assembles app-facing services over one storage backend and API client.
#[derive(Clone)]
pub struct AppServices {
    exam_run: Arc<ExamRunService>,
    results: Arc<ResultsService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, api: Arc<dyn ExamApi>) -> Self {
        let exam_run = Arc::new(ExamRunService::new(
            clock,
            api,
            Arc::clone(&storage.results),
        ));
        let results = Arc::new(ResultsService::new(Arc::clone(&storage.results)));
        Self { exam_run, results }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        api: Arc<dyn ExamApi>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, api))
    }

    #[must_use]
    pub fn exam_run(&self) -> Arc<ExamRunService> {
        Arc::clone(&self.exam_run)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}
