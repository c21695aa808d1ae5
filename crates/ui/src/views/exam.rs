use std::time::Duration;

use dioxus::prelude::*;
use dioxus_router::use_navigator;

use exam_core::model::{AnswerValue, FinishedAttempt, ModuleKind, SeriesId};
use services::{ExamRunError, Ticker};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ExamIntent, ExamOutcome, ExamVm, NavItemVm, QuestionVm, start_exam};

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq, Eq)]
enum FinalizeState {
    Idle,
    Finalizing,
    /// Grading failed; the attempt is kept so it can be sent again.
    Failed(FinishedAttempt, ViewError),
}

#[component]
pub fn ExamView(series_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let series_id = SeriesId::new(series_id);
    let exam_run = ctx.exam_run();
    let clock = ctx.clock();

    let vm = use_signal(|| None::<ExamVm>);
    let error = use_signal(|| None::<ViewError>);
    let finalize_state = use_signal(|| FinalizeState::Idle);

    let exam_run_for_resource = exam_run.clone();
    let resource = use_resource(move || {
        let exam_run = exam_run_for_resource.clone();
        let mut vm = vm;
        async move {
            let started = start_exam(&exam_run, series_id).await?;
            vm.set(Some(started));
            Ok::<_, ViewError>(())
        }
    });
    let state = view_state_from_resource(resource);

    let finalize = use_callback(move |attempt: FinishedAttempt| {
        let exam_run = exam_run.clone();
        let mut finalize_state = finalize_state;
        spawn(async move {
            finalize_state.set(FinalizeState::Finalizing);
            match exam_run.finalize(attempt.clone()).await {
                Ok(_) => {
                    finalize_state.set(FinalizeState::Idle);
                    navigator.push(Route::Results {});
                }
                Err(err) => {
                    tracing::warn!(error = %err, "finalizing exam failed");
                    let view_error = match err {
                        ExamRunError::Grading(_) => ViewError::GradingFailed,
                        _ => ViewError::Unknown,
                    };
                    finalize_state.set(FinalizeState::Failed(attempt, view_error));
                }
            }
        });
    });

    // Countdown: one tick per second until the session finishes or the view unmounts.
    use_future(move || {
        let mut vm = vm;
        async move {
            let (mut ticker, handle) = Ticker::spawn(TICK_PERIOD);
            let mut attached = false;
            while ticker.tick().await.is_some() {
                let outcome = {
                    let mut guard = vm.write();
                    let Some(vm) = guard.as_mut() else {
                        continue;
                    };
                    if !attached {
                        vm.attach_ticker(handle.clone());
                        attached = true;
                    }
                    vm.on_tick(clock.now())
                };
                if let ExamOutcome::Finished(attempt) = outcome {
                    finalize.call(attempt);
                }
            }
        }
    });

    let dispatch_intent = use_callback(move |intent: ExamIntent| {
        let mut vm = vm;
        let mut error = error;
        let result = match vm.write().as_mut() {
            Some(vm) => vm.apply(intent, clock.now()),
            None => return,
        };
        match result {
            Ok(ExamOutcome::Continue) => error.set(None),
            Ok(ExamOutcome::Finished(attempt)) => {
                error.set(None);
                finalize.call(attempt);
            }
            Err(err) => {
                tracing::debug!(error = %err, "exam intent rejected");
                error.set(Some(ViewError::Unknown));
            }
        }
    });

    let vm_guard = vm.read();
    let timer_label = vm_guard.as_ref().map(ExamVm::remaining_label);
    let running_out = vm_guard.as_ref().is_some_and(ExamVm::is_running_out);
    let progress_label = vm_guard.as_ref().map(ExamVm::progress_label);
    let question = vm_guard.as_ref().map(ExamVm::current);
    let navigator_items = vm_guard.as_ref().map(ExamVm::navigator).unwrap_or_default();
    let module_kind = vm_guard.as_ref().map(ExamVm::module_kind);
    let is_first = vm_guard.as_ref().is_none_or(ExamVm::is_first);
    let is_last = vm_guard.as_ref().is_none_or(ExamVm::is_last);
    let finished = vm_guard.as_ref().is_some_and(ExamVm::is_finished);
    drop(vm_guard);

    let finalize_view = finalize_state();
    let timer_class = if running_out { "exam-timer exam-timer-low" } else { "exam-timer" };

    rsx! {
        div { class: "page exam-page",
            header { class: "view-header",
                h2 { class: "view-title", "Series {series_id}" }
                if let Some(label) = timer_label {
                    span { class: "{timer_class}", "{label}" }
                }
            }
            div { class: "view-divider" }
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading exam..." }
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
                ViewState::Ready(()) => {
                    match finalize_view {
                        FinalizeState::Finalizing => rsx! {
                            p { class: "exam-finalizing", "Scoring your answers..." }
                        },
                        FinalizeState::Failed(attempt, err) => rsx! {
                            div { class: "exam-finalize-error",
                                p { "{err.message()}" }
                                button {
                                    class: "btn btn-primary",
                                    r#type: "button",
                                    onclick: move |_| finalize.call(attempt.clone()),
                                    "Try again"
                                }
                            }
                        },
                        FinalizeState::Idle => rsx! {
                            if let Some(progress) = progress_label {
                                p { class: "exam-progress", "{progress}" }
                            }
                            if let Some(err) = error() {
                                p { class: "exam-error", "{err.message()}" }
                            }
                            if let (Some(question), Some(kind)) = (question, module_kind) {
                                QuestionPanel { question, kind, finished, on_intent: dispatch_intent }
                            }
                            QuestionNavigator { items: navigator_items, on_intent: dispatch_intent }
                            div { class: "exam-controls",
                                button {
                                    class: "btn btn-secondary",
                                    r#type: "button",
                                    disabled: is_first || finished,
                                    onclick: move |_| dispatch_intent.call(ExamIntent::Previous),
                                    "Previous"
                                }
                                button {
                                    class: "btn btn-secondary",
                                    r#type: "button",
                                    disabled: is_last || finished,
                                    onclick: move |_| dispatch_intent.call(ExamIntent::Next),
                                    "Next"
                                }
                                button {
                                    class: "btn btn-primary",
                                    r#type: "button",
                                    disabled: finished,
                                    onclick: move |_| dispatch_intent.call(ExamIntent::Finish),
                                    "Finish exam"
                                }
                            }
                        },
                    }
                }
            }
        }
    }
}

#[component]
fn QuestionPanel(
    question: QuestionVm,
    kind: ModuleKind,
    finished: bool,
    on_intent: Callback<ExamIntent>,
) -> Element {
    let flag_label = if question.flagged { "Unflag" } else { "Flag for review" };
    let free_response = kind.is_free_response();
    let placeholder = match kind {
        ModuleKind::Speaking => "Link to your recording",
        _ => "Write your answer here",
    };
    let response = question.response.clone();

    rsx! {
        article { class: "exam-question",
            p { class: "exam-question-number", "{question.number_label}" }
            if let Some(url) = question.media_url.as_ref() {
                audio { controls: true, src: "{url}" }
            }
            p { class: "exam-question-prompt", "{question.prompt}" }
            if free_response {
                textarea {
                    class: "exam-response",
                    placeholder: "{placeholder}",
                    disabled: finished,
                    value: "{response}",
                    oninput: move |evt| on_intent.call(ExamIntent::response(kind, evt.value())),
                }
            } else {
                ul { class: "exam-choices",
                    for choice in question.choices.clone() {
                        li { key: "{choice.index}",
                            button {
                                class: choice_class(choice.selected),
                                r#type: "button",
                                disabled: finished,
                                onclick: move |_| {
                                    on_intent.call(ExamIntent::Answer(AnswerValue::Choice(choice.index)));
                                },
                                "{choice.label}"
                            }
                        }
                    }
                }
            }
            button {
                class: "btn btn-ghost",
                r#type: "button",
                disabled: finished,
                onclick: move |_| on_intent.call(ExamIntent::ToggleFlag),
                "{flag_label}"
            }
        }
    }
}

#[component]
fn QuestionNavigator(items: Vec<NavItemVm>, on_intent: Callback<ExamIntent>) -> Element {
    rsx! {
        nav { class: "exam-navigator",
            for item in items {
                button {
                    key: "{item.index}",
                    class: nav_class(item),
                    r#type: "button",
                    onclick: move |_| on_intent.call(ExamIntent::GoTo(item.index)),
                    {(item.index + 1).to_string()}
                }
            }
        }
    }
}

fn choice_class(selected: bool) -> &'static str {
    if selected { "choice choice-selected" } else { "choice" }
}

fn nav_class(item: NavItemVm) -> &'static str {
    match (item.current, item.answered, item.flagged) {
        (true, _, _) => "nav-item nav-current",
        (false, _, true) => "nav-item nav-flagged",
        (false, true, false) => "nav-item nav-answered",
        (false, false, false) => "nav-item",
    }
}
