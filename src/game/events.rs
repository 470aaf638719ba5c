use log::{debug, info};
use serde::Serialize;
use tokio::sync::mpsc;

use super::{scoring::ScoreBreakdown, state::RoundState};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    Manual,
    TimeUp,
    NextPrompt,
}

/// Result of folding one classification (or its fallback) into the score.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub round_id: u64,
    pub delta: u32,
    /// `None` when the fallback score was awarded.
    pub breakdown: Option<ScoreBreakdown>,
    pub total: u64,
    pub predicted_style: Option<String>,
    pub confidence: Option<f64>,
    pub suggestions: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    RoundStarted { state: RoundState },
    Tick { state: RoundState },
    RoundPaused { state: RoundState },
    RoundResumed { state: RoundState },
    RoundEnded { state: RoundState, reason: EndReason },
    ScoreAwarded(ScoreOutcome),
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::RoundStarted { .. } => "round-started",
            GameEvent::Tick { .. } => "round-tick",
            GameEvent::RoundPaused { .. } => "round-paused",
            GameEvent::RoundResumed { .. } => "round-resumed",
            GameEvent::RoundEnded { .. } => "round-ended",
            GameEvent::ScoreAwarded(_) => "score-awarded",
        }
    }
}

/// Receives controller notifications on behalf of the UI layer.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GameEvent);
}

/// Forwards events into an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: GameEvent) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}

/// Logs each event; ticks are only logged at debug level.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: GameEvent) {
        match &event {
            GameEvent::Tick { state } => debug!(
                "{}: {}s left ({:.0}%)",
                event.name(),
                state.time_remaining_secs,
                state.progress_percent
            ),
            GameEvent::ScoreAwarded(outcome) => info!(
                "{}: round {} +{} (total {}) {}",
                event.name(),
                outcome.round_id,
                outcome.delta,
                outcome.total,
                outcome.message
            ),
            GameEvent::RoundStarted { state }
            | GameEvent::RoundPaused { state }
            | GameEvent::RoundResumed { state } => info!(
                "{}: round {} level {} \"{}\"",
                event.name(),
                state.round_id,
                state.level,
                state.current_prompt
            ),
            GameEvent::RoundEnded { state, reason } => info!(
                "{}: round {} ({reason:?}) with {}s left",
                event.name(),
                state.round_id,
                state.time_remaining_secs
            ),
        }
    }
}
