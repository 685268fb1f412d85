use super::*;
use crate::state::test_helpers::{MockLlm, harness};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

fn llm(replies: &[&str]) -> Arc<dyn LlmChat> {
    Arc::new(MockLlm::new(replies))
}

// =========================================================================
// strip_code_fence
// =========================================================================

#[test]
fn fence_strip_is_noop_without_fence() {
    assert_eq!(strip_code_fence(r#"{"a":1}"#), r#"{"a":1}"#);
}

#[test]
fn fence_strip_removes_json_tagged_fence() {
    let raw = "```json\n{\"chart_type\":\"bar\",\"columns\":[\"a\"],\"title\":\"T\"}\n```";
    assert_eq!(strip_code_fence(raw), r#"{"chart_type":"bar","columns":["a"],"title":"T"}"#);
}

#[test]
fn fence_strip_removes_untagged_fence() {
    let raw = "```\n{\"a\":1}\n```";
    assert_eq!(strip_code_fence(raw), r#"{"a":1}"#);
}

#[test]
fn fence_strip_preserves_backticks_inside_payload() {
    let raw = "```json\n{\"chart_type\":\"bar\",\"columns\":[\"a\"],\"title\":\"use ```code``` wisely\"}\n```";
    let stripped = strip_code_fence(raw);
    assert!(stripped.contains("use ```code``` wisely"));
    let spec: PlotSpec = serde_json::from_str(&stripped).unwrap();
    assert_eq!(spec.title, "use ```code``` wisely");
}

// =========================================================================
// resolve_spec
// =========================================================================

#[tokio::test]
async fn fenced_and_unfenced_replies_parse_identically() {
    let unfenced = r#"{"chart_type":"bar","columns":["region"],"title":"Regions"}"#;
    let fenced = format!("```json\n{unfenced}\n```");

    let a = resolve_spec(&llm(&[unfenced]), "chart", &headers(&["region"]))
        .await
        .unwrap();
    let b = resolve_spec(&llm(&[&fenced]), "chart", &headers(&["region"]))
        .await
        .unwrap();

    assert_eq!(a.chart_type, b.chart_type);
    assert_eq!(a.columns, b.columns);
    assert_eq!(a.title, b.title);
    assert_eq!(a.chart_type, ChartType::Bar);
}

#[tokio::test]
async fn non_json_reply_is_spec_parse_error() {
    let err = resolve_spec(&llm(&["sorry, I can't do that"]), "chart", &headers(&["a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, PlotError::SpecParse(_)));
}

#[tokio::test]
async fn unknown_chart_type_is_rejected_at_parse() {
    let reply = r#"{"chart_type":"pictogram","columns":["a"],"title":"T"}"#;
    let err = resolve_spec(&llm(&[reply]), "chart", &headers(&["a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, PlotError::SpecParse(_)));
}

#[tokio::test]
async fn missing_title_defaults_to_empty() {
    let reply = r#"{"chart_type":"scatter","columns":["x","y"]}"#;
    let spec = resolve_spec(&llm(&[reply]), "chart", &headers(&["x", "y"]))
        .await
        .unwrap();
    assert!(spec.title.is_empty());
    assert_eq!(spec.display_title(), "Plot of x vs y");
}

#[tokio::test]
async fn prompt_lists_dataset_headers() {
    let mock = Arc::new(MockLlm::new(&[r#"{"chart_type":"bar","columns":["region"]}"#]));
    let as_trait: Arc<dyn LlmChat> = mock.clone();
    resolve_spec(&as_trait, "chart", &headers(&["region", "value"]))
        .await
        .unwrap();

    let requests = mock.requests.lock().unwrap();
    let (_, messages) = &requests[0];
    assert!(messages[0].content.contains("[region, value]"));
    assert!(messages[0].content.contains("stacked_area"));
}

// =========================================================================
// validate_spec
// =========================================================================

#[test]
fn valid_columns_pass() {
    let spec = PlotSpec { chart_type: ChartType::Line, columns: headers(&["a", "b"]), title: "T".into() };
    assert!(validate_spec(&spec, &headers(&["a", "b", "c"])).is_ok());
}

#[test]
fn unknown_column_is_invalid_spec() {
    let spec = PlotSpec { chart_type: ChartType::Line, columns: headers(&["nope"]), title: String::new() };
    let err = validate_spec(&spec, &headers(&["a"])).unwrap_err();
    assert!(matches!(err, PlotError::InvalidSpec(msg) if msg.contains("nope")));
}

#[test]
fn empty_columns_is_invalid_spec() {
    let spec = PlotSpec { chart_type: ChartType::Pie, columns: Vec::new(), title: String::new() };
    assert!(matches!(validate_spec(&spec, &headers(&["a"])).unwrap_err(), PlotError::InvalidSpec(_)));
}

// =========================================================================
// render
// =========================================================================

#[tokio::test]
async fn render_invokes_plotter_and_returns_image_url() {
    let h = harness(None);
    let dataset = Dataset::parse("region,value\nnorth,10\n");
    let spec = PlotSpec { chart_type: ChartType::Bar, columns: headers(&["region", "value"]), title: String::new() };

    let url = render(&(h.plotter.clone() as Arc<dyn Plotter>), &h.state.workspace, &dataset, &spec)
        .await
        .unwrap();

    assert!(url.starts_with("/images/plot_"));
    assert!(url.ends_with(".png"));

    let calls = h.plotter.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (out, chart_type, columns, title, rows_json) = &calls[0];
    assert!(out.starts_with(h.state.workspace.images_dir()));
    assert_eq!(chart_type, "bar");
    assert_eq!(columns, &headers(&["region", "value"]));
    assert_eq!(title, "Plot of region vs value");
    assert!(rows_json.contains("north"));
}

#[tokio::test]
async fn render_surfaces_plotter_failure() {
    use crate::state::test_helpers::{RecordingCleaner, RecordingCombiner, RecordingPlotter, harness_with};
    let h = harness_with(None, RecordingCleaner::new(), RecordingCombiner::new(), RecordingPlotter::failing());
    let dataset = Dataset::parse("a\n1\n");
    let spec = PlotSpec { chart_type: ChartType::Line, columns: headers(&["a"]), title: "T".into() };

    let err = render(&(h.plotter.clone() as Arc<dyn Plotter>), &h.state.workspace, &dataset, &spec)
        .await
        .unwrap_err();
    assert!(matches!(err, PlotError::Tool(_)));
}

#[test]
fn chart_type_round_trips_snake_case() {
    let json = serde_json::to_string(&ChartType::StackedArea).unwrap();
    assert_eq!(json, "\"stacked_area\"");
    let back: ChartType = serde_json::from_str("\"hbar\"").unwrap();
    assert_eq!(back, ChartType::Hbar);
    assert_eq!(ChartType::StackedArea.as_str(), "stacked_area");
}
