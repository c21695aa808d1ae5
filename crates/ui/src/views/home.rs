use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ResultsVm, map_results};

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let results = ctx.results();
    let mut series_input = use_signal(|| {
        ctx.default_series_id()
            .map(|id| id.value().to_string())
            .unwrap_or_default()
    });

    let resource = use_resource(move || {
        let results = results.clone();
        async move {
            let latest = results.latest().await.map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(latest.as_ref().map(map_results))
        }
    });
    let state = view_state_from_resource(resource);

    let parsed_series = series_input().trim().parse::<u64>().ok();

    rsx! {
        div { class: "page home-page",
            header { class: "view-header",
                h2 { class: "view-title", "Home" }
                p { class: "view-subtitle", "Pick a series and start a timed exam." }
            }
            div { class: "view-divider" }
            div { class: "start-exam",
                label { r#for: "series-id", "Series" }
                input {
                    id: "series-id",
                    r#type: "number",
                    min: "1",
                    value: "{series_input}",
                    oninput: move |evt| series_input.set(evt.value()),
                }
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: parsed_series.is_none(),
                    onclick: move |_| {
                        if let Some(series_id) = parsed_series {
                            navigator.push(Route::Exam { series_id });
                        }
                    },
                    "Start exam"
                }
            }
            section { class: "latest-result",
                h3 { "Last result" }
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
                    },
                    ViewState::Ready(Some(vm)) => rsx! {
                        LatestResultCard { vm }
                    },
                }
            }
        }
    }
}

#[component]
fn LatestResultCard(vm: ResultsVm) -> Element {
    rsx! {
        div { class: "result-card",
            p { class: "result-card-title", "{vm.series_label} · {vm.module_label}" }
            p { "Score: {vm.score_label} ({vm.level_label})" }
            p { class: "result-card-meta", "{vm.finished_at_str}" }
            Link { to: Route::Results {}, "View details" }
        }
    }
}
