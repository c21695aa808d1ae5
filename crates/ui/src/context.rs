use std::sync::Arc;

use exam_core::model::SeriesId;
use services::{Clock, ExamRunService, ResultsService};

pub trait UiApp: Send + Sync {
    /// Series offered on the home screen, if one was configured at launch.
    fn default_series_id(&self) -> Option<SeriesId>;

    fn exam_run(&self) -> Arc<ExamRunService>;
    fn results(&self) -> Arc<ResultsService>;
}

#[derive(Clone)]
pub struct AppContext {
    default_series_id: Option<SeriesId>,

    exam_run: Arc<ExamRunService>,
    results: Arc<ResultsService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            default_series_id: app.default_series_id(),
            exam_run: app.exam_run(),
            results: app.results(),
        }
    }

    #[must_use]
    pub fn default_series_id(&self) -> Option<SeriesId> {
        self.default_series_id
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.exam_run.clock()
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

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
