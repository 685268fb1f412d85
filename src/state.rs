//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! workspace, run log, and tool capabilities are explicit handles rather
//! than process-wide singletons, so tests run each case against its own
//! temp directory and fakes. `dataset_gate` serializes dataset replacement
//! against readers: the upload pipeline holds the write half while cleaning
//! and combining, chat/insights/download hold the read half while reading,
//! so a chat call never observes a half-written combined file.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::llm::LlmChat;
use crate::tools::{Cleaner, Combiner, Plotter};
use crate::workspace::{RunLog, Workspace};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<Workspace>,
    pub run_log: Arc<RunLog>,
    /// Optional LLM client. `None` if `GROQ_API_KEY` is not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    pub cleaner: Arc<dyn Cleaner>,
    pub combiner: Arc<dyn Combiner>,
    pub plotter: Arc<dyn Plotter>,
    /// Writers replace the dataset files, readers consume them.
    pub dataset_gate: Arc<RwLock<()>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        workspace: Arc<Workspace>,
        run_log: Arc<RunLog>,
        llm: Option<Arc<dyn LlmChat>>,
        cleaner: Arc<dyn Cleaner>,
        combiner: Arc<dyn Combiner>,
        plotter: Arc<dyn Plotter>,
    ) -> Self {
        Self { workspace, run_log, llm, cleaner, combiner, plotter, dataset_gate: Arc::new(RwLock::new(())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use crate::llm::LlmChat;
    use crate::llm::types::Message;
    use std::sync::Arc;

    #[tokio::test]
    async fn mock_llm_pops_replies_in_order() {
        let llm = MockLlm::new(&["first", "second"]);
        let a = llm.chat(16, "", &[Message::user("x")]).await.unwrap();
        let b = llm.chat(16, "", &[Message::user("y")]).await.unwrap();
        assert_eq!(a.text, "first");
        assert_eq!(b.text, "second");
        assert_eq!(llm.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn harness_builds_isolated_workspace() {
        let h = harness(Some(Arc::new(MockLlm::new(&[]))));
        assert!(h.state.workspace.combined_path().starts_with(h.dir.path()));
        assert_eq!(h.plotter.call_count(), 0);
    }
}
