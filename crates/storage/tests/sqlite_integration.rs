use chrono::Duration;
use exam_core::model::{
    AnswerValue, AttemptId, ExamResult, FinishedAttempt, FlagSet, Level, ModuleKind,
    QuestionDraft, QuestionId, SeriesId,
};
use exam_core::time::fixed_now;
use storage::repository::{ResultCache, StorageError};
use storage::sqlite::SqliteRepository;

fn build_result(series: u64, correct: &[u64]) -> ExamResult {
    let questions = (1..=4)
        .map(|id| {
            QuestionDraft {
                id,
                prompt: format!("Q{id}"),
                choices: Some(vec!["a".into(), "b".into(), "c".into()]),
                correct_choice: Some(2),
                media_url: Some(format!("https://cdn.example.com/audio/{id}.mp3")),
                points: 10,
            }
            .validate()
            .unwrap()
        })
        .collect();
    let answers = correct
        .iter()
        .map(|id| (QuestionId::new(*id), AnswerValue::Choice(2)))
        .collect();
    ExamResult::score_choices(FinishedAttempt {
        series_id: SeriesId::new(series),
        module_kind: ModuleKind::Listening,
        questions,
        answers,
        flags: FlagSet::new(),
        elapsed_seconds: 1_500,
        allotted_seconds: 2_400,
        started_at: fixed_now(),
        finished_at: fixed_now() + Duration::seconds(1_500),
        timed_out: false,
    })
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_keeps_result_intact() {
    let repo = connect("memdb_results_roundtrip").await;
    let result = build_result(11, &[1, 2, 3]);

    repo.store_latest(&result, fixed_now()).await.unwrap();

    let cached = repo.latest().await.unwrap().expect("cached result");
    assert_eq!(cached.result, result);
    assert_eq!(cached.result.level(), Level::C2);
    assert_eq!(cached.attempt_id, None);
    assert_eq!(cached.cached_at, fixed_now());
}

#[tokio::test]
async fn sqlite_overwrites_single_slot_and_tracks_submission() {
    let repo = connect("memdb_results_overwrite").await;
    let first = build_result(1, &[1]);
    let second = build_result(2, &[1, 2]);

    repo.store_latest(&first, fixed_now()).await.unwrap();
    repo.mark_submitted(first.id(), &AttemptId::new("att-1"))
        .await
        .unwrap();
    repo.store_latest(&second, fixed_now()).await.unwrap();

    let cached = repo.latest().await.unwrap().unwrap();
    assert_eq!(cached.result.series_id(), SeriesId::new(2));
    assert_eq!(cached.attempt_id, None);

    let err = repo
        .mark_submitted(first.id(), &AttemptId::new("att-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    repo.mark_submitted(second.id(), &AttemptId::new("att-2"))
        .await
        .unwrap();
    let cached = repo.latest().await.unwrap().unwrap();
    assert_eq!(cached.attempt_id, Some(AttemptId::new("att-2")));
}

#[tokio::test]
async fn sqlite_clear_and_migrate_are_idempotent() {
    let repo = connect("memdb_results_clear").await;
    repo.migrate().await.expect("second migrate");

    assert!(repo.latest().await.unwrap().is_none());
    repo.store_latest(&build_result(3, &[]), fixed_now())
        .await
        .unwrap();
    repo.clear().await.unwrap();
    assert!(repo.latest().await.unwrap().is_none());
}
