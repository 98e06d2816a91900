//! Weather report — a qualitative glance at the Ichimoku lines.
//!
//! Five short labels summarize the latest bar: sky (close vs cloud), cloud
//! texture (span thickness), wind (span-A slope), freedom (chikou vs the
//! bar 26 back), momentum (tenkan vs kijun). Undefined inputs degrade to
//! the Unknown variants rather than erroring. The glance feeds the unified
//! decision log; nothing downstream branches on it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Candle;
use crate::ichimoku::{IchimokuLines, DISPLACEMENT};

/// Span thickness below which the cloud counts as fragile.
const THIN_CLOUD_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sky {
    Clear,
    Cloudy,
    Stormy,
    Unknown,
}

impl fmt::Display for Sky {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sky::Clear => "Clear skies",
            Sky::Cloudy => "Cloudy",
            Sky::Stormy => "Stormy",
            Sky::Unknown => "Unknown (insufficient cloud)",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudTexture {
    Thick,
    Thin,
    Unknown,
}

impl fmt::Display for CloudTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloudTexture::Thick => "Thick and stable cloud",
            CloudTexture::Thin => "Thin and fragile cloud",
            CloudTexture::Unknown => "Unknown thickness",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wind {
    Tailwinds,
    Headwinds,
    Unknown,
}

impl fmt::Display for Wind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Wind::Tailwinds => "Favorable tailwinds",
            Wind::Headwinds => "Unfavorable headwinds",
            Wind::Unknown => "Unknown wind",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freedom {
    ClearAbove,
    ClearBelow,
    Tangled,
    Unknown,
}

impl fmt::Display for Freedom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Freedom::ClearAbove => "Path is clear above",
            Freedom::ClearBelow => "Path is clear below",
            Freedom::Tangled => "Path is tangled in the forest",
            Freedom::Unknown => "Unknown path",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Momentum {
    Quick,
    Sluggish,
    Unknown,
}

impl fmt::Display for Momentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Momentum::Quick => "Quick favorable winds",
            Momentum::Sluggish => "Slack and sluggish sails",
            Momentum::Unknown => "Unknown momentum",
        })
    }
}

/// The five-label glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherGlance {
    pub sky: Sky,
    pub cloud: CloudTexture,
    pub wind: Wind,
    pub freedom: Freedom,
    pub momentum: Momentum,
}

/// Assess the weather at the latest bar of a candle series.
pub fn assess_weather(candles: &[Candle], lines: &IchimokuLines) -> WeatherGlance {
    let Some(latest_index) = candles.len().checked_sub(1) else {
        return WeatherGlance {
            sky: Sky::Unknown,
            cloud: CloudTexture::Unknown,
            wind: Wind::Unknown,
            freedom: Freedom::Unknown,
            momentum: Momentum::Unknown,
        };
    };
    let latest_close = candles[latest_index].close;

    let span_a = lines.senkou_a.get(&latest_index).copied();
    let span_b = lines.senkou_b.get(&latest_index).copied();

    let sky = match (span_a, span_b) {
        (Some(a), Some(b)) => {
            if latest_close > a.max(b) {
                Sky::Clear
            } else if latest_close < a.min(b) {
                Sky::Stormy
            } else {
                Sky::Cloudy
            }
        }
        _ => Sky::Unknown,
    };

    let cloud = match (span_a, span_b) {
        (Some(a), Some(b)) => {
            if (a - b).abs() > THIN_CLOUD_THRESHOLD {
                CloudTexture::Thick
            } else {
                CloudTexture::Thin
            }
        }
        _ => CloudTexture::Unknown,
    };

    let wind = match (span_a, latest_index.checked_sub(1)) {
        (Some(a), Some(prev_index)) => match lines.senkou_a.get(&prev_index) {
            Some(&prev_a) => {
                if a > prev_a {
                    Wind::Tailwinds
                } else {
                    Wind::Headwinds
                }
            }
            None => Wind::Unknown,
        },
        _ => Wind::Unknown,
    };

    let freedom = if latest_index >= DISPLACEMENT {
        let back_index = latest_index - DISPLACEMENT;
        match lines.chikou_at(back_index) {
            Some(chikou_price) => {
                let back = &candles[back_index];
                if chikou_price > back.high {
                    Freedom::ClearAbove
                } else if chikou_price < back.low {
                    Freedom::ClearBelow
                } else {
                    Freedom::Tangled
                }
            }
            None => Freedom::Unknown,
        }
    } else {
        Freedom::Unknown
    };

    let momentum = match (lines.tenkan[latest_index], lines.kijun[latest_index]) {
        (Some(t), Some(k)) => {
            if t > k {
                Momentum::Quick
            } else {
                Momentum::Sluggish
            }
        }
        _ => Momentum::Unknown,
    };

    WeatherGlance {
        sky,
        cloud,
        wind,
        freedom,
        momentum,
    }
}
