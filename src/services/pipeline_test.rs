use super::*;
use crate::state::test_helpers::{MockLlm, RecordingCleaner, RecordingCombiner, RecordingPlotter, harness, harness_with};
use std::sync::Arc;

fn upload(state: &crate::state::AppState, name: &str) -> SavedUpload {
    let raw_path = state.workspace.raw_upload_path(name);
    let cleaned_path = state.workspace.cleaned_path_for(&raw_path);
    SavedUpload { original_name: name.to_string(), raw_path, cleaned_path }
}

fn years(tags: &[&str]) -> Vec<String> {
    tags.iter().map(ToString::to_string).collect()
}

// =========================================================================
// pair_years
// =========================================================================

#[test]
fn pair_years_aligns_by_index() {
    let h = harness(None);
    let uploads = vec![upload(&h.state, "a.csv"), upload(&h.state, "b.csv")];
    let files = pair_years(uploads, &years(&["2020", "2021"]));
    assert_eq!(files[0].year.as_deref(), Some("2020"));
    assert_eq!(files[1].year.as_deref(), Some("2021"));
}

#[test]
fn pair_years_short_array_does_not_crash() {
    let h = harness(None);
    let uploads = vec![upload(&h.state, "plain.csv"), upload(&h.state, "also-plain.csv")];
    let files = pair_years(uploads, &years(&["2020"]));
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].year.as_deref(), Some("2020"));
    assert_eq!(files[1].year, None);
}

#[test]
fn pair_years_guesses_from_filename_when_missing() {
    let h = harness(None);
    let uploads = vec![upload(&h.state, "x.csv"), upload(&h.state, "crops_2019.csv")];
    let files = pair_years(uploads, &years(&["2020"]));
    assert_eq!(files[1].year.as_deref(), Some("2019"));
}

#[test]
fn pair_years_blank_tag_falls_back() {
    let h = harness(None);
    let uploads = vec![upload(&h.state, "report_2018.csv")];
    let files = pair_years(uploads, &years(&["  "]));
    assert_eq!(files[0].year.as_deref(), Some("2018"));
}

// =========================================================================
// run
// =========================================================================

#[tokio::test]
async fn run_cleans_in_order_then_combines() {
    let h = harness(None);
    let uploads = vec![upload(&h.state, "a.csv"), upload(&h.state, "b.csv")];
    let files = pair_years(uploads, &years(&["2020", "2021"]));

    let insights = run(&h.state, &files).await.unwrap();
    assert!(insights.is_none()); // no LLM configured

    let cleans = h.cleaner.calls.lock().unwrap();
    assert_eq!(cleans.len(), 2);
    assert_eq!(cleans[0].0, files[0].raw_path);
    assert_eq!(cleans[0].2.as_deref(), Some("2020"));
    assert_eq!(cleans[1].0, files[1].raw_path);

    let combines = h.combiner.calls.lock().unwrap();
    assert_eq!(combines.len(), 1);
    assert_eq!(combines[0], vec![files[0].cleaned_path.clone(), files[1].cleaned_path.clone()]);
    assert!(h.state.workspace.combined_path().exists());
}

#[tokio::test]
async fn run_aborts_on_first_clean_failure() {
    let h = harness_with(
        None,
        RecordingCleaner::failing_at(0),
        RecordingCombiner::new(),
        RecordingPlotter::new(),
    );
    let uploads = vec![upload(&h.state, "bad.csv"), upload(&h.state, "never-reached.csv")];
    let files = pair_years(uploads, &[]);

    let err = run(&h.state, &files).await.unwrap_err();
    match err {
        PipelineError::CleanFailed { file, .. } => assert!(file.contains("bad.csv")),
        other => panic!("expected CleanFailed, got {other:?}"),
    }

    // Second file never cleaned, combine never attempted.
    assert_eq!(h.cleaner.calls.lock().unwrap().len(), 1);
    assert!(h.combiner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn run_surfaces_combine_failure() {
    let h = harness_with(None, RecordingCleaner::new(), RecordingCombiner::failing(), RecordingPlotter::new());
    let files = pair_years(vec![upload(&h.state, "a.csv")], &years(&["2020"]));
    let err = run(&h.state, &files).await.unwrap_err();
    assert!(matches!(err, PipelineError::CombineFailed(_)));
}

#[tokio::test]
async fn run_returns_insights_when_llm_configured() {
    let h = harness(Some(Arc::new(MockLlm::new(&["Executive summary."]))));
    let files = pair_years(vec![upload(&h.state, "a.csv")], &years(&["2020"]));
    let insights = run(&h.state, &files).await.unwrap();
    assert_eq!(insights.as_deref(), Some("Executive summary."));
}

#[tokio::test]
async fn insights_failure_is_non_fatal() {
    let h = harness(Some(Arc::new(MockLlm::erroring())));
    let files = pair_years(vec![upload(&h.state, "a.csv")], &years(&["2020"]));
    let insights = run(&h.state, &files).await.unwrap();
    assert!(insights.is_none());
}

#[tokio::test]
async fn run_logs_pipeline_stages() {
    let h = harness(None);
    let files = pair_years(vec![upload(&h.state, "a.csv")], &years(&["2020"]));
    run(&h.state, &files).await.unwrap();

    let log = std::fs::read_to_string(h.state.workspace.log_path()).unwrap();
    assert!(log.contains("Cleaning raw_"));
    assert!(log.contains("(Year: 2020)"));
    assert!(log.contains("Combining cleaned files..."));
}
