use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ROUND_SECONDS: u32 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoundStatus {
    Idle,
    Active,
    Paused,
    Ended,
}

impl Default for RoundStatus {
    fn default() -> Self {
        RoundStatus::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The round was not running; nothing changed.
    Ignored,
    Ticked,
    /// The clock just reached zero. The round is still active until it is ended.
    Expired,
}

/// Snapshot of a round taken at the moment it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedRound {
    pub round_id: u64,
    pub level: u32,
    pub time_remaining_secs: u32,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundState {
    pub session_id: String,
    /// Sequence number of the current (or last) round; 0 before the first round.
    pub round_id: u64,
    pub status: RoundStatus,
    pub is_active: bool,
    pub level: u32,
    pub score: u64,
    pub time_remaining_secs: u32,
    pub progress_percent: f64,
    pub current_prompt: String,
    pub started_at: Option<DateTime<Utc>>,
    pub last_prediction: Option<String>,
}

impl RoundState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            round_id: 0,
            status: RoundStatus::Idle,
            is_active: false,
            level: 1,
            score: 0,
            time_remaining_secs: ROUND_SECONDS,
            progress_percent: 0.0,
            current_prompt: String::new(),
            started_at: None,
            last_prediction: None,
        }
    }

    pub fn can_start(&self) -> bool {
        matches!(self.status, RoundStatus::Idle | RoundStatus::Ended)
    }

    /// Idle/Ended → Active with a full clock. `level_up` advances the level first.
    pub fn begin_round(&mut self, prompt: String, level_up: bool, now: DateTime<Utc>) -> bool {
        if !self.can_start() {
            return false;
        }

        if level_up {
            self.level = self.level.saturating_add(1);
        }
        self.round_id += 1;
        self.time_remaining_secs = ROUND_SECONDS;
        self.progress_percent = 0.0;
        self.current_prompt = prompt;
        self.started_at = Some(now);
        self.set_status(RoundStatus::Active);
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.status != RoundStatus::Active || self.time_remaining_secs == 0 {
            return TickOutcome::Ignored;
        }

        self.time_remaining_secs -= 1;
        self.progress_percent = progress_percent(self.time_remaining_secs);
        if self.time_remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.status != RoundStatus::Active {
            return false;
        }
        self.set_status(RoundStatus::Paused);
        true
    }

    /// Paused → Active, keeping the remaining time.
    pub fn resume(&mut self) -> bool {
        if self.status != RoundStatus::Paused {
            return false;
        }
        self.set_status(RoundStatus::Active);
        true
    }

    /// Active → Ended. Returns `None` for any other status, which makes a
    /// second end request for the same round a no-op.
    pub fn finish(&mut self) -> Option<EndedRound> {
        if self.status != RoundStatus::Active {
            return None;
        }
        self.set_status(RoundStatus::Ended);
        Some(EndedRound {
            round_id: self.round_id,
            level: self.level,
            time_remaining_secs: self.time_remaining_secs,
            prompt: self.current_prompt.clone(),
        })
    }

    pub fn apply_score(&mut self, delta: u32, predicted_style: Option<String>) {
        self.score = self.score.saturating_add(delta as u64);
        if predicted_style.is_some() {
            self.last_prediction = predicted_style;
        }
    }

    fn set_status(&mut self, status: RoundStatus) {
        self.status = status;
        self.is_active = status == RoundStatus::Active;
    }
}

/// `(60 - remaining) / 60 * 100`.
pub fn progress_percent(time_remaining_secs: u32) -> f64 {
    let remaining = time_remaining_secs.min(ROUND_SECONDS);
    (ROUND_SECONDS - remaining) as f64 / ROUND_SECONDS as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_round() -> RoundState {
        let mut state = RoundState::new("test".into());
        assert!(state.begin_round("Draw a cat".into(), false, Utc::now()));
        state
    }

    #[test]
    fn begin_round_resets_clock_and_progress() {
        let mut state = active_round();
        for _ in 0..42 {
            state.tick();
        }
        state.finish();

        assert!(state.begin_round("Draw a dog".into(), false, Utc::now()));
        assert_eq!(state.time_remaining_secs, ROUND_SECONDS);
        assert_eq!(state.progress_percent, 0.0);
        assert_eq!(state.round_id, 2);
        assert_eq!(state.level, 1);
        assert!(state.is_active);
    }

    #[test]
    fn begin_round_rejected_while_active_or_paused() {
        let mut state = active_round();
        assert!(!state.begin_round("again".into(), false, Utc::now()));

        state.pause();
        assert!(!state.begin_round("again".into(), true, Utc::now()));
        assert_eq!(state.round_id, 1);
        assert_eq!(state.level, 1);
    }

    #[test]
    fn tick_counts_down_by_one_until_expiry() {
        let mut state = active_round();
        let mut previous = state.time_remaining_secs;

        for _ in 0..(ROUND_SECONDS - 1) {
            assert_eq!(state.tick(), TickOutcome::Ticked);
            assert_eq!(state.time_remaining_secs, previous - 1);
            previous = state.time_remaining_secs;
        }

        assert_eq!(state.tick(), TickOutcome::Expired);
        assert_eq!(state.time_remaining_secs, 0);
        assert_eq!(state.progress_percent, 100.0);
        assert_eq!(state.tick(), TickOutcome::Ignored);
        assert_eq!(state.time_remaining_secs, 0);
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut state = active_round();
        for _ in 0..15 {
            state.tick();
        }
        assert_eq!(state.progress_percent, 25.0);
        assert_eq!(progress_percent(0), 100.0);
    }

    #[test]
    fn finish_only_once() {
        let mut state = active_round();
        for _ in 0..45 {
            state.tick();
        }

        let ended = state.finish().expect("first finish ends the round");
        assert_eq!(ended.time_remaining_secs, 15);
        assert_eq!(ended.round_id, 1);
        assert!(state.finish().is_none());
        assert_eq!(state.status, RoundStatus::Ended);
    }

    #[test]
    fn pause_keeps_clock_and_blocks_ticks() {
        let mut state = active_round();
        state.tick();
        assert!(state.pause());
        assert!(!state.pause());
        assert_eq!(state.tick(), TickOutcome::Ignored);
        assert!(state.finish().is_none());

        assert!(state.resume());
        assert_eq!(state.time_remaining_secs, ROUND_SECONDS - 1);
        assert!(!state.resume());
    }

    #[test]
    fn apply_score_keeps_last_prediction_on_fallback() {
        let mut state = active_round();
        state.apply_score(90, Some("warli".into()));
        state.apply_score(40, None);

        assert_eq!(state.score, 130);
        assert_eq!(state.last_prediction.as_deref(), Some("warli"));
    }
}
