//! Load-and-rasterize pipeline
//!
//! Opens the configured document, records its page count and rasterizes every
//! page in order into PNG data URIs. Pages are rendered one at a time: page
//! N + 1 is requested only after page N has completed.
//!
//! The pipeline checks its [`CancellationToken`] every time it resumes from an
//! await. Once the token is cancelled nothing further is written to the
//! [`ViewerState`] and no further page is requested; a render already in
//! flight completes and its result is dropped.

use crate::cancel::CancellationToken;
use crate::config::FlipbookConfig;
use crate::viewer::{PageImage, ViewerState};
use flipbook_engine::{
    encode_png_data_uri, DocumentHandle, EngineError, OpenRequest, RasterEngine, RenderRequest,
};

/// How a load ended.
///
/// An empty document and a failed load look the same to the viewer (ready,
/// zero pages); the outcome tells them apart for the host.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The engine cannot rasterize in this execution context; nothing was
    /// opened and the state is untouched.
    Unavailable,
    /// The viewer already finished loading; nothing ran.
    AlreadyLoaded,
    /// The token was cancelled; state was left as the last live step wrote it.
    Cancelled,
    Loaded { pages: usize },
    Failed(EngineError),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

enum Pipeline {
    Done(usize),
    Cancelled,
}

pub async fn load_book<E: RasterEngine>(
    engine: &mut E,
    config: &FlipbookConfig,
    token: &CancellationToken,
    state: &mut ViewerState,
) -> LoadOutcome {
    if token.is_cancelled() {
        return LoadOutcome::Cancelled;
    }

    // Resource locations are resolved lazily by the engine, so they have to be
    // in place before availability is known and before the first open.
    if let Err(err) = engine.configure(&config.resources()) {
        return fail(err, config, state);
    }

    if !engine.is_available() {
        tracing::debug!("no rasterization context available, skipping load");
        return LoadOutcome::Unavailable;
    }

    let mut handle = None;
    let result = run_pipeline(engine, config, token, state, &mut handle).await;

    if let Some(handle) = handle {
        if let Err(err) = engine.close(handle) {
            tracing::debug!(error = %err, "failed to close document");
        }
    }

    match result {
        Ok(Pipeline::Done(pages)) => LoadOutcome::Loaded { pages },
        Ok(Pipeline::Cancelled) => {
            tracing::debug!("load cancelled");
            LoadOutcome::Cancelled
        }
        Err(_) if token.is_cancelled() => LoadOutcome::Cancelled,
        Err(err) => fail(err, config, state),
    }
}

fn fail(err: EngineError, config: &FlipbookConfig, state: &mut ViewerState) -> LoadOutcome {
    tracing::error!(error = %err, document = %config.document_url, "error loading document");
    state.reset_after_failure();
    LoadOutcome::Failed(err)
}

async fn run_pipeline<E: RasterEngine>(
    engine: &mut E,
    config: &FlipbookConfig,
    token: &CancellationToken,
    state: &mut ViewerState,
    handle: &mut Option<DocumentHandle>,
) -> Result<Pipeline, EngineError> {
    let request = OpenRequest::new(config.source()).with_cmap_dir(config.cmap_dir.clone());
    let document = engine.open(request).await?;
    *handle = Some(document);

    if token.is_cancelled() {
        return Ok(Pipeline::Cancelled);
    }

    let total = engine.page_count(document)?;
    state.set_total_pages(total as usize);

    let mut pages = Vec::with_capacity(total as usize);

    for page_index in 0..total {
        if token.is_cancelled() {
            return Ok(Pipeline::Cancelled);
        }

        let image = engine
            .render_page(document, RenderRequest { page_index, scale: config.render_scale })
            .await?;

        if token.is_cancelled() {
            return Ok(Pipeline::Cancelled);
        }

        let data_uri = encode_png_data_uri(&image)?;
        tracing::debug!(page = page_index + 1, total, "rasterized page");

        pages.push(PageImage {
            page_number: page_index + 1,
            width: image.width(),
            height: image.height(),
            data_uri,
        });
    }

    if token.is_cancelled() {
        return Ok(Pipeline::Cancelled);
    }

    let count = pages.len();
    state.publish_pages(pages);
    tracing::info!(pages = count, document = %config.document_url, "document ready");

    Ok(Pipeline::Done(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineEvent, Gate, GatePoint, ScriptedEngine};
    use flipbook_engine::PNG_DATA_URI_PREFIX;

    fn config() -> FlipbookConfig {
        FlipbookConfig::new("/static/brochure.pdf")
    }

    async fn load(engine: &mut ScriptedEngine) -> (LoadOutcome, ViewerState) {
        let mut state = ViewerState::new();
        let token = CancellationToken::new();
        let outcome = load_book(engine, &config(), &token, &mut state).await;
        (outcome, state)
    }

    #[tokio::test]
    async fn loads_every_page_in_order() {
        for page_count in 0..6 {
            let mut engine = ScriptedEngine::with_pages(page_count);
            let (outcome, state) = load(&mut engine).await;

            assert!(matches!(outcome, LoadOutcome::Loaded { pages } if pages == page_count as usize));
            assert!(!state.is_loading());
            assert_eq!(state.total_pages(), page_count as usize);

            let numbers: Vec<u32> = state.pages().iter().map(|page| page.page_number).collect();
            assert_eq!(numbers, (1..=page_count).collect::<Vec<_>>());
            assert_eq!(engine.rendered_pages(), (0..page_count).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn pages_are_png_data_uris_at_render_scale() {
        let mut engine = ScriptedEngine::with_pages(2);
        let (_, state) = load(&mut engine).await;

        for page in state.pages() {
            assert!(page.data_uri.starts_with(PNG_DATA_URI_PREFIX));
            assert_eq!((page.width, page.height), (16, 32));
        }
    }

    #[tokio::test]
    async fn configures_before_opening_and_closes_at_the_end() {
        let mut engine = ScriptedEngine::with_pages(2);
        load(&mut engine).await;

        assert_eq!(
            engine.events(),
            vec![
                EngineEvent::Configure,
                EngineEvent::Open,
                EngineEvent::Render(0),
                EngineEvent::Render(1),
                EngineEvent::Close,
            ]
        );
    }

    #[tokio::test]
    async fn unavailable_engine_leaves_state_untouched() {
        let mut engine = ScriptedEngine::with_pages(3).unavailable();
        let (outcome, state) = load(&mut engine).await;

        assert!(matches!(outcome, LoadOutcome::Unavailable));
        assert_eq!(state, ViewerState::new());
        assert_eq!(engine.events(), vec![EngineEvent::Configure], "nothing is opened");
    }

    #[tokio::test]
    async fn configure_failure_ends_in_empty_ready_state() {
        let mut engine = ScriptedEngine::with_pages(3).failing_configure();
        let (outcome, state) = load(&mut engine).await;

        assert!(matches!(outcome, LoadOutcome::Failed(EngineError::Backend(_))));
        assert!(!state.is_loading());
        assert_eq!(state.total_pages(), 0);
        assert_eq!(engine.events(), vec![EngineEvent::Configure]);
    }

    #[tokio::test]
    async fn open_failure_ends_in_empty_ready_state() {
        let mut engine = ScriptedEngine::with_pages(3).failing_open();
        let (outcome, state) = load(&mut engine).await;

        assert!(matches!(outcome, LoadOutcome::Failed(EngineError::Fetch(_))));
        assert!(!state.is_loading());
        assert_eq!(state.total_pages(), 0);
        assert!(state.pages().is_empty());
    }

    #[tokio::test]
    async fn render_failure_discards_partial_pages() {
        let mut engine = ScriptedEngine::with_pages(4).failing_render(2);
        let (outcome, state) = load(&mut engine).await;

        assert!(matches!(outcome, LoadOutcome::Failed(EngineError::Backend(_))));
        assert!(!state.is_loading());
        assert_eq!(state.total_pages(), 0);
        assert!(state.pages().is_empty());
        assert_eq!(engine.rendered_pages(), vec![0, 1, 2]);
        assert_eq!(engine.events().last(), Some(&EngineEvent::Close));
    }

    #[tokio::test]
    async fn cancel_during_render_stops_loop_and_discards_result() {
        let gate = Gate::default();
        let mut engine = ScriptedEngine::with_pages(3).gated(GatePoint::Render(1), gate.clone());
        let mut state = ViewerState::new();
        let token = CancellationToken::new();
        let unmount = token.clone();
        let config = config();

        let (outcome, ()) = tokio::join!(load_book(&mut engine, &config, &token, &mut state), async {
            gate.started.notified().await;
            unmount.cancel();
            gate.release.notify_one();
        });

        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert!(state.is_loading(), "cancelled load must not clear the loading flag");
        assert!(state.pages().is_empty());
        assert_eq!(state.total_pages(), 3, "page count was published before unmount");
        assert_eq!(engine.rendered_pages(), vec![0, 1]);
    }

    #[tokio::test]
    async fn cancel_during_open_publishes_nothing() {
        let gate = Gate::default();
        let mut engine = ScriptedEngine::with_pages(3).gated(GatePoint::Open, gate.clone());
        let mut state = ViewerState::new();
        let token = CancellationToken::new();
        let guard = token.drop_guard();
        let config = config();

        let (outcome, ()) = tokio::join!(load_book(&mut engine, &config, &token, &mut state), async {
            gate.started.notified().await;
            drop(guard);
            gate.release.notify_one();
        });

        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert_eq!(state, ViewerState::new());
        assert!(engine.rendered_pages().is_empty());
    }

    #[tokio::test]
    async fn failure_after_cancel_is_discarded_too() {
        let gate = Gate::default();
        let mut engine = ScriptedEngine::with_pages(3)
            .failing_render(1)
            .gated(GatePoint::Render(1), gate.clone());
        let mut state = ViewerState::new();
        let token = CancellationToken::new();
        let unmount = token.clone();
        let config = config();

        let (outcome, ()) = tokio::join!(load_book(&mut engine, &config, &token, &mut state), async {
            gate.started.notified().await;
            unmount.cancel();
            gate.release.notify_one();
        });

        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert!(state.is_loading());
        assert_eq!(state.total_pages(), 3);
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_the_engine() {
        let mut engine = ScriptedEngine::with_pages(3);
        let mut state = ViewerState::new();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = load_book(&mut engine, &config(), &token, &mut state).await;

        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert!(engine.events().is_empty());
        assert_eq!(state, ViewerState::new());
    }
}
