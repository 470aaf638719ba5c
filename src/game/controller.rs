use std::{path::Path, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    canvas::{self, DrawingSurface, Point, ToolKind},
    classifier::Classifier,
    settings::GameSettings,
};

use super::{
    events::{EndReason, EventSink, GameEvent, ScoreOutcome},
    prompts::PromptCatalog,
    scoring::{fallback_score, score_classification, ComplexityEstimator, RandomComplexity},
    state::{EndedRound, RoundState, TickOutcome},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Ticker {
    fn stop(self) {
        self.cancel.cancel();
    }
}

/// A round that has left the Active state, with everything captured under the lock.
struct ClosedRound {
    ended: EndedRound,
    png: Result<Vec<u8>>,
    style_bonus: u32,
    state: RoundState,
}

/// Round state, canvas and the ticker guarding them share one lock so that a
/// tick can never observe a half-applied transition.
struct GameSession {
    round: RoundState,
    surface: DrawingSurface,
    ticker: Option<Ticker>,
}

#[derive(Clone)]
pub struct GameController {
    session: Arc<Mutex<GameSession>>,
    scoring_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    classifier: Arc<dyn Classifier>,
    complexity: Arc<dyn ComplexityEstimator>,
    prompts: Arc<PromptCatalog>,
    events: Arc<dyn EventSink>,
    tick_interval: Duration,
    next_prompt_delay: Duration,
}

impl GameController {
    pub fn new(
        settings: &GameSettings,
        prompts: PromptCatalog,
        classifier: Arc<dyn Classifier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let session_id = Uuid::new_v4().to_string();
        log_info!("game session {session_id} created");

        Self {
            session: Arc::new(Mutex::new(GameSession {
                round: RoundState::new(session_id),
                surface: DrawingSurface::new(
                    settings.canvas_width,
                    settings.canvas_height,
                    settings.background_color,
                ),
                ticker: None,
            })),
            scoring_tasks: Arc::new(Mutex::new(Vec::new())),
            classifier,
            complexity: Arc::new(RandomComplexity),
            prompts: Arc::new(prompts),
            events,
            tick_interval: Duration::from_secs(1),
            next_prompt_delay: Duration::from_millis(settings.next_prompt_delay_ms),
        }
    }

    /// Replaces the placeholder complexity bonus.
    pub fn with_complexity(mut self, complexity: Arc<dyn ComplexityEstimator>) -> Self {
        self.complexity = complexity;
        self
    }

    pub async fn snapshot(&self) -> RoundState {
        self.session.lock().await.round.clone()
    }

    pub async fn start_round(&self) -> Option<RoundState> {
        self.begin_round(None).await
    }

    /// Ends the active round and, after the configured delay, starts the next
    /// one a level higher. No-op unless a round is active.
    pub async fn next_prompt(&self) -> Option<RoundState> {
        let ended = self.finish_round(EndReason::NextPrompt).await?;
        time::sleep(self.next_prompt_delay).await;
        self.begin_round(Some(ended.round_id)).await
    }

    pub async fn end_round(&self) -> Option<EndedRound> {
        self.finish_round(EndReason::Manual).await
    }

    pub async fn pause_game(&self) -> Option<RoundState> {
        let state = {
            let mut session = self.session.lock().await;
            if !session.round.pause() {
                log_warn!("pause ignored: round is {:?}", session.round.status);
                return None;
            }
            if let Some(ticker) = session.ticker.take() {
                ticker.stop();
            }
            session.round.clone()
        };

        log_info!("round {} paused at {}s", state.round_id, state.time_remaining_secs);
        self.events.emit(GameEvent::RoundPaused {
            state: state.clone(),
        });
        Some(state)
    }

    /// Continues a paused round on the same clock.
    pub async fn resume_game(&self) -> Option<RoundState> {
        let state = {
            let mut session = self.session.lock().await;
            if !session.round.resume() {
                log_warn!("resume ignored: round is {:?}", session.round.status);
                return None;
            }
            self.spawn_ticker(&mut session);
            session.round.clone()
        };

        log_info!("round {} resumed at {}s", state.round_id, state.time_remaining_secs);
        self.events.emit(GameEvent::RoundResumed {
            state: state.clone(),
        });
        Some(state)
    }

    /// Waits for every classification submitted so far to be scored.
    pub async fn wait_for_scoring(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = self.scoring_tasks.lock().await.drain(..).collect();
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(err) = handle.await {
                    log_error!("scoring task failed: {err}");
                }
            }
        }
    }

    /// Stops the ticker and abandons in-flight scoring.
    pub async fn shutdown(&self) {
        if let Some(ticker) = self.session.lock().await.ticker.take() {
            ticker.cancel.cancel();
            ticker.handle.abort();
        }
        for handle in self.scoring_tasks.lock().await.drain(..) {
            handle.abort();
        }
    }

    pub async fn start_stroke(&self, point: Point) {
        self.session.lock().await.surface.start_stroke(point);
    }

    pub async fn extend_stroke(&self, point: Point) {
        self.session.lock().await.surface.extend_stroke(point);
    }

    pub async fn end_stroke(&self) {
        self.session.lock().await.surface.end_stroke();
    }

    pub async fn clear_canvas(&self) {
        self.session.lock().await.surface.clear();
    }

    pub async fn set_tool(&self, kind: ToolKind) {
        self.session.lock().await.surface.set_tool(kind);
    }

    pub async fn set_color(&self, color: [u8; 3]) {
        self.session.lock().await.surface.set_color(color);
    }

    pub async fn set_brush_width(&self, width_px: u32) {
        self.session.lock().await.surface.set_brush_width(width_px);
    }

    pub async fn export_raster(&self) -> Result<Vec<u8>> {
        self.session.lock().await.surface.export_raster()
    }

    /// Writes the current drawing into `dir`, named after the level and the
    /// most recent predicted style.
    pub async fn save_drawing(&self, dir: &Path) -> Result<PathBuf> {
        let (png, file_name) = {
            let session = self.session.lock().await;
            let file_name = canvas::download_filename(
                session.round.level,
                session.round.last_prediction.as_deref(),
            );
            (session.surface.export_raster()?, file_name)
        };
        canvas::save_png(dir, &file_name, &png)
    }

    /// `after_round` is set by `next_prompt`: the level-up start only happens
    /// if nothing else started a round during the delay.
    async fn begin_round(&self, after_round: Option<u64>) -> Option<RoundState> {
        let state = {
            let mut session = self.session.lock().await;
            if let Some(round_id) = after_round {
                if session.round.round_id != round_id {
                    log_info!("skipping level-up: round {} already started", session.round.round_id);
                    return None;
                }
            }

            let prompt = self.prompts.pick();
            if !session.round.begin_round(prompt, after_round.is_some(), Utc::now()) {
                log_warn!("start ignored: round is {:?}", session.round.status);
                return None;
            }
            session.surface.clear();
            self.spawn_ticker(&mut session);
            session.round.clone()
        };

        log_info!(
            "round {} started (level {}): {}",
            state.round_id,
            state.level,
            state.current_prompt
        );
        self.events.emit(GameEvent::RoundStarted {
            state: state.clone(),
        });
        Some(state)
    }

    /// Single exit point for a round. The Active → Ended transition happens
    /// under the session lock, so of several racing callers (manual end,
    /// timer expiry) exactly one proceeds to scoring.
    async fn finish_round(&self, reason: EndReason) -> Option<EndedRound> {
        let closed = {
            let mut session = self.session.lock().await;
            let Some(closed) = self.close_round(&mut session) else {
                log_debug!("end ignored ({reason:?}): round is {:?}", session.round.status);
                return None;
            };
            closed
        };
        Some(self.submit_round(closed, reason).await)
    }

    /// Locked half of ending a round: transition, stop the ticker, capture the raster.
    fn close_round(&self, session: &mut GameSession) -> Option<ClosedRound> {
        let ended = session.round.finish()?;
        if let Some(ticker) = session.ticker.take() {
            ticker.stop();
        }
        session.surface.end_stroke();
        Some(ClosedRound {
            ended,
            png: session.surface.export_raster(),
            style_bonus: self.complexity.estimate(session.surface.pixels()),
            state: session.round.clone(),
        })
    }

    async fn submit_round(&self, closed: ClosedRound, reason: EndReason) -> EndedRound {
        let ClosedRound {
            ended,
            png,
            style_bonus,
            state,
        } = closed;

        log_info!(
            "round {} ended ({reason:?}) with {}s left",
            ended.round_id,
            ended.time_remaining_secs
        );
        self.events.emit(GameEvent::RoundEnded { state, reason });

        let controller = self.clone();
        let round = ended.clone();
        let handle = tokio::spawn(async move {
            controller.score_round(round, png, style_bonus).await;
        });
        {
            let mut tasks = self.scoring_tasks.lock().await;
            tasks.retain(|task| !task.is_finished());
            tasks.push(handle);
        }

        ended
    }

    async fn score_round(
        &self,
        ended: EndedRound,
        png: Result<Vec<u8>>,
        style_bonus: u32,
    ) -> ScoreOutcome {
        let file_name = format!("round-{}.png", ended.round_id);
        let classification = match png {
            Ok(png) => self.classifier.classify(png, &file_name).await,
            Err(err) => Err(err),
        };

        let (delta, breakdown, predicted_style, confidence, suggestions, message) =
            match classification {
                Ok(result) => {
                    let breakdown =
                        score_classification(&result, ended.time_remaining_secs, style_bonus);
                    let message = result.message.clone().unwrap_or_else(|| {
                        format!(
                            "Looks like {} ({:.0}% confidence)",
                            result.predicted_style,
                            result.confidence() * 100.0
                        )
                    });
                    (
                        breakdown.total(),
                        Some(breakdown),
                        Some(result.predicted_style.clone()),
                        Some(result.confidence()),
                        result.suggestions,
                        message,
                    )
                }
                Err(err) => {
                    log_warn!("classification for round {} failed: {err:#}", ended.round_id);
                    let delta = fallback_score();
                    (
                        delta,
                        None,
                        None,
                        None,
                        Vec::new(),
                        format!("Great drawing! You earned {delta} points."),
                    )
                }
            };

        let outcome = {
            let mut session = self.session.lock().await;
            session.round.apply_score(delta, predicted_style.clone());
            ScoreOutcome {
                round_id: ended.round_id,
                delta,
                breakdown,
                total: session.round.score,
                predicted_style,
                confidence,
                suggestions,
                message,
            }
        };

        log_info!(
            "round {} scored +{} (total {})",
            outcome.round_id,
            outcome.delta,
            outcome.total
        );
        self.events.emit(GameEvent::ScoreAwarded(outcome.clone()));
        outcome
    }

    fn spawn_ticker(&self, session: &mut GameSession) {
        if let Some(previous) = session.ticker.take() {
            previous.stop();
        }

        let cancel = CancellationToken::new();
        let controller = self.clone();
        let round_id = session.round.round_id;
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            controller.run_ticker(round_id, token).await;
        });

        session.ticker = Some(Ticker { handle, cancel });
    }

    /// Re-arms a one-second delay after every tick rather than running on a
    /// fixed period. Cancellation is always checked under the session lock.
    async fn run_ticker(&self, round_id: u64, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = time::sleep(self.tick_interval) => {}
                _ = cancel.cancelled() => break,
            }

            let (outcome, state, closed) = {
                let mut session = self.session.lock().await;
                if cancel.is_cancelled() || session.round.round_id != round_id {
                    break;
                }
                let outcome = session.round.tick();
                // Reaching zero ends the round in the same critical section,
                // so nothing can pause it at 0s.
                let closed = match outcome {
                    TickOutcome::Expired => self.close_round(&mut session),
                    _ => None,
                };
                (outcome, session.round.clone(), closed)
            };

            match outcome {
                TickOutcome::Ignored => break,
                TickOutcome::Ticked => {
                    self.events.emit(GameEvent::Tick { state });
                }
                TickOutcome::Expired => {
                    self.events.emit(GameEvent::Tick { state });
                    log_debug!("round {round_id} ran out of time");
                    if let Some(closed) = closed {
                        self.submit_round(closed, EndReason::TimeUp).await;
                    }
                    break;
                }
            }
        }
    }
}
