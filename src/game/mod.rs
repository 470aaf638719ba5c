pub mod controller;
pub mod events;
pub mod prompts;
pub mod scoring;
pub mod state;

pub use controller::GameController;
pub use events::{ChannelSink, EndReason, EventSink, GameEvent, LogSink, ScoreOutcome};
pub use prompts::PromptCatalog;
pub use state::{EndedRound, RoundState, RoundStatus};
