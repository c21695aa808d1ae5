use std::sync::Arc;

use async_trait::async_trait;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use exam_core::model::{AttemptId, ExamPaper, ModuleKind, QuestionDraft, SeriesId};
use exam_core::time::fixed_now;
use services::exam_api::{AttemptSubmission, GradingRequest};
use services::{ApiError, Clock, ExamApi, ExamRunService, ResultsService};
use storage::repository::{ResultCache, Storage};

use crate::context::{UiApp, build_app_context};
use crate::views::{ExamView, HomeView, ResultsView};

/// Serves a two-question reading paper and accepts every submission.
pub struct StaticExamApi;

#[async_trait]
impl ExamApi for StaticExamApi {
    async fn fetch_exam(&self, series_id: SeriesId) -> Result<ExamPaper, ApiError> {
        let questions = (1..=2)
            .map(|id| {
                QuestionDraft {
                    id,
                    prompt: format!("Prompt {id}"),
                    choices: Some(vec!["vrai".into(), "faux".into()]),
                    correct_choice: Some(0),
                    media_url: None,
                    points: 10,
                }
                .validate()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExamPaper {
            series_id,
            module_kind: ModuleKind::Reading,
            questions,
            allotted_seconds: 90,
        })
    }

    async fn grade(&self, _request: &GradingRequest) -> Result<u32, ApiError> {
        Err(ApiError::Disabled)
    }

    async fn submit_attempt(&self, _submission: &AttemptSubmission) -> Result<AttemptId, ApiError> {
        Ok(AttemptId::new("smoke-1"))
    }
}

#[derive(Clone)]
struct TestApp {
    exam_run: Arc<ExamRunService>,
    results: Arc<ResultsService>,
}

impl UiApp for TestApp {
    fn default_series_id(&self) -> Option<SeriesId> {
        Some(SeriesId::new(3))
    }

    fn exam_run(&self) -> Arc<ExamRunService> {
        Arc::clone(&self.exam_run)
    }

    fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Results,
    Exam(u64),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Results => rsx! { ResultsView {} },
        ViewKind::Exam(series_id) => rsx! { ExamView { series_id } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub storage: Storage,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn setup_view_harness(view: ViewKind) -> ViewHarness {
    setup_view_harness_with_cache(view, Storage::in_memory())
}

pub fn setup_view_harness_with_cache(view: ViewKind, storage: Storage) -> ViewHarness {
    let clock = Clock::fixed(fixed_now());
    let cache: Arc<dyn ResultCache> = Arc::clone(&storage.results);
    let exam_run = Arc::new(ExamRunService::new(
        clock,
        Arc::new(StaticExamApi),
        Arc::clone(&cache),
    ));
    let results = Arc::new(ResultsService::new(cache));

    let app = Arc::new(TestApp { exam_run, results });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness { dom, storage }
}
