//! Intent engine — cloud position + mood + session into a trade decision.
//!
//! Confidence starts at 0.5, takes the mood's additive adjustment, then the
//! session's multiplicative one, then small boosts for a recent direction
//! flip or a clean cloud breakout, and is clamped to [0, 1]. A weekend
//! always forces confidence to zero — no boost can revive it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Candle;
use crate::mood::{self, Breakout, CloudPosition, Mood, MoodReport};
use crate::session::{self, Session, SessionInfo};

/// Minimum confidence for a trade to be taken.
pub const TRADE_THRESHOLD: f64 = 0.6;

/// Directional bias of the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    BullishBias,
    BearishBias,
    Neutral,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::BullishBias => "bullish_bias",
            Bias::BearishBias => "bearish_bias",
            Bias::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mood flags carried alongside the decision for logging and exit logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodContext {
    pub recent_tk_cross: bool,
    pub cloud_breakout: Breakout,
    pub entered_cloud: Option<bool>,
    pub prior_mood: Option<Mood>,
}

impl From<&MoodReport> for MoodContext {
    fn from(report: &MoodReport) -> Self {
        Self {
            recent_tk_cross: report.recent_tk_cross,
            cloud_breakout: report.cloud_breakout,
            entered_cloud: report.entered_cloud,
            prior_mood: report.prior_mood,
        }
    }
}

/// The full intent bundle for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub bias: Bias,
    pub confidence: f64,
    pub should_trade: bool,
    pub mood: Mood,
    pub session: SessionInfo,
    pub context: MoodContext,
}

/// Evaluate directional intent for a candle series against cloud boundaries.
///
/// `at` feeds the session oracle; pass the latest candle's timestamp when
/// replaying history, `Utc::now()` when observing live. An empty series
/// yields a neutral, zero-confidence intent.
pub fn evaluate_intent(
    candles: &[Candle],
    cloud_top: f64,
    cloud_bottom: f64,
    at: DateTime<Utc>,
) -> Intent {
    let session = session::session_at(at);
    let report = mood::market_mood(candles, cloud_top, cloud_bottom);
    let context = MoodContext::from(&report);

    let Some(latest) = candles.last() else {
        return Intent {
            bias: Bias::Neutral,
            confidence: 0.0,
            should_trade: false,
            mood: report.mood,
            session,
            context,
        };
    };

    let bias = match mood::cloud_position(latest.close, cloud_top, cloud_bottom) {
        CloudPosition::Above => Bias::BullishBias,
        CloudPosition::Below => Bias::BearishBias,
        CloudPosition::Inside => Bias::Neutral,
    };

    let mut confidence: f64 = 0.5;

    match report.mood {
        Mood::Soaring | Mood::Plunging => confidence += 0.25,
        Mood::ClimbingFromValley | Mood::SlippingFromHeights => confidence += 0.10,
        Mood::Foggy => confidence = 0.0,
        Mood::Wandering => confidence -= 0.05,
        _ => {}
    }

    match session.session {
        Session::Weekend => confidence = 0.0,
        Session::Holiday => confidence *= 0.5,
        Session::FridayClose => confidence *= 0.7,
        _ => {}
    }

    if report.recent_tk_cross {
        confidence += 0.05;
    }
    if report.cloud_breakout.occurred() {
        confidence += 0.05;
    }

    // The weekend reset is absolute: signal boosts must not revive it.
    if session.session == Session::Weekend {
        confidence = 0.0;
    }

    confidence = confidence.clamp(0.0, 1.0);
    let should_trade = confidence >= TRADE_THRESHOLD;

    Intent {
        bias,
        confidence,
        should_trade,
        mood: report.mood,
        session,
        context,
    }
}
