use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{BandVm, ResultsVm, map_results};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RetryState {
    Idle,
    Sending,
    Failed,
}

#[component]
pub fn ResultsView() -> Element {
    let ctx = use_context::<AppContext>();
    let results = ctx.results();
    let exam_run = ctx.exam_run();
    let retry_state = use_signal(|| RetryState::Idle);

    let results_for_resource = results.clone();
    let resource = use_resource(move || {
        let results = results_for_resource.clone();
        async move {
            results.latest().await.map_err(|_| ViewError::Unknown)
        }
    });
    let state = view_state_from_resource(resource);

    let on_retry = use_callback(move |()| {
        let exam_run = exam_run.clone();
        let mut retry_state = retry_state;
        let mut resource = resource;
        let Some(Ok(Some(overview))) = resource.value().read().clone() else {
            return;
        };
        spawn(async move {
            retry_state.set(RetryState::Sending);
            match exam_run.retry_submission(&overview.result).await {
                Ok(_) => {
                    retry_state.set(RetryState::Idle);
                    resource.restart();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "retrying submission failed");
                    retry_state.set(RetryState::Failed);
                }
            }
        });
    });

    let on_clear = use_callback(move |()| {
        let results = results.clone();
        let mut resource = resource;
        spawn(async move {
            if results.clear().await.is_ok() {
                resource.restart();
            }
        });
    });

    rsx! {
        div { class: "page results-page",
            header { class: "view-header",
                h2 { class: "view-title", "Last result" }
            }
            div { class: "view-divider" }
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| {
                            let mut resource = resource;
                            resource.restart();
                        },
                        "Retry"
                    }
                },
                ViewState::Ready(None) => rsx! {
                    p { "No exam taken yet." }
                    Link { to: Route::Home {}, "Start an exam" }
                },
                ViewState::Ready(Some(overview)) => {
                    let vm = map_results(&overview);
                    rsx! {
                        ResultDetail {
                            vm,
                            retry_state: retry_state(),
                            on_retry,
                            on_clear,
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn ResultDetail(
    vm: ResultsVm,
    retry_state: RetryState,
    on_retry: Callback<()>,
    on_clear: Callback<()>,
) -> Element {
    let sending = retry_state == RetryState::Sending;
    rsx! {
        section { class: "result-detail",
            p { class: "result-series", "{vm.series_label} · {vm.module_label}" }
            div { class: "result-score",
                span { class: "score-value", "{vm.score_label}" }
                span { class: "score-level", "{vm.level_label}" }
            }
            if let Some(correct) = vm.correct_label.as_ref() {
                p { class: "result-correct", "{correct}" }
            }
            p { class: "result-time", "Time used: {vm.time_used_label}" }
            p { class: "result-finished", "Finished {vm.finished_at_str}" }
            div { class: "result-bands",
                BandGauge { title: "Accuracy", band: vm.accuracy.clone() }
                BandGauge { title: "Time management", band: vm.time.clone() }
            }
            div { class: "result-submission",
                p { "{vm.submission_label}" }
                if retry_state == RetryState::Failed {
                    p { class: "result-submission-error",
                        "Submission failed again. Your result is still saved here."
                    }
                }
                if !vm.submitted {
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: sending,
                        onclick: move |_| on_retry.call(()),
                        if sending { "Sending..." } else { "Retry submission" }
                    }
                }
            }
            div { class: "result-actions",
                Link { to: Route::Home {}, "Back to Home" }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| on_clear.call(()),
                    "Clear result"
                }
            }
        }
    }
}

#[component]
fn BandGauge(title: &'static str, band: BandVm) -> Element {
    rsx! {
        div { class: "band {band.class}",
            p { class: "band-title", "{title}" }
            p { class: "band-label", "{band.label}" }
            progress { max: "100", value: "{band.score}" }
        }
    }
}
