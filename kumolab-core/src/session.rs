//! Session oracle — UTC timestamp to trading-session descriptor.
//!
//! A pure, total function of the timestamp; price data never enters here.
//! Precedence: weekend, then Friday wind-down (>= 20:00 UTC), then fixed-date
//! holidays, then the session windows:
//! Tokyo [00:00, 08:00), London [07:00, 16:00), New York [13:00, 22:00).

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-date market holidays (month, day, name).
const FIXED_HOLIDAYS: [(u32, u32, &str); 4] = [
    (1, 1, "New Year's Day"),
    (7, 4, "US Independence Day"),
    (12, 25, "Christmas Day"),
    (12, 31, "New Year's Eve"),
];

/// Named trading session (or closure state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Session {
    Tokyo,
    London,
    NewYork,
    Overlap,
    OffHours,
    Weekend,
    FridayClose,
    Holiday,
}

impl Session {
    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Tokyo => "Tokyo",
            Session::London => "London",
            Session::NewYork => "New York",
            Session::Overlap => "Overlap",
            Session::OffHours => "Off-hours",
            Session::Weekend => "Weekend",
            Session::FridayClose => "Friday Close",
            Session::Holiday => "Holiday",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected volatility tier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    None,
    Low,
    LowToModerate,
    High,
    VeryHigh,
    Decreasing,
}

impl Volatility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Volatility::None => "None",
            Volatility::Low => "Low",
            Volatility::LowToModerate => "Low to moderate",
            Volatility::High => "High",
            Volatility::VeryHigh => "Very high",
            Volatility::Decreasing => "Decreasing",
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session descriptor: name, mood label, volatility tier, advisory text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session: Session,
    pub mood_label: String,
    pub volatility: Volatility,
    pub advisory: String,
}

impl SessionInfo {
    fn fixed(session: Session, mood: &str, volatility: Volatility, advisory: &str) -> Self {
        Self {
            session,
            mood_label: mood.to_string(),
            volatility,
            advisory: advisory.to_string(),
        }
    }
}

/// Describe the trading session for a UTC timestamp.
///
/// Callers wanting "now" pass `Utc::now()` explicitly; the oracle never
/// reads the clock itself.
pub fn session_at(at: DateTime<Utc>) -> SessionInfo {
    let weekday = at.weekday();

    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        return SessionInfo::fixed(
            Session::Weekend,
            "Silent and closed",
            Volatility::None,
            "Markets are closed over the weekend. Reflection time.",
        );
    }

    if weekday == Weekday::Fri && at.hour() >= 20 {
        return SessionInfo::fixed(
            Session::FridayClose,
            "Winding down",
            Volatility::Decreasing,
            "Liquidity fades. Spreads widen. Avoid new positions.",
        );
    }

    if let Some(name) = holiday_name(at.month(), at.day()) {
        return SessionInfo {
            session: Session::Holiday,
            mood_label: "Muted and irregular".to_string(),
            volatility: Volatility::Low,
            advisory: format!("Observed holiday: {name}. Expect limited activity."),
        };
    }

    let hour = at.hour();
    let mut active: Vec<&'static str> = Vec::new();
    if hour < 8 {
        active.push("Tokyo");
    }
    if (7..16).contains(&hour) {
        active.push("London");
    }
    if (13..22).contains(&hour) {
        active.push("New York");
    }

    match active.as_slice() {
        ["Tokyo"] => SessionInfo::fixed(
            Session::Tokyo,
            "Cautious and contemplative",
            Volatility::LowToModerate,
            "Yen activity tends to dominate. Thinner liquidity.",
        ),
        ["London"] => SessionInfo::fixed(
            Session::London,
            "Decisive and trending",
            Volatility::High,
            "European majors dominate. Strong directional moves possible.",
        ),
        ["New York"] => SessionInfo::fixed(
            Session::NewYork,
            "Reactive and volatile",
            Volatility::High,
            "Often driven by US news. Reversals are common.",
        ),
        [] => SessionInfo::fixed(
            Session::OffHours,
            "Quiet and still",
            Volatility::Low,
            "Markets are open but subdued. Await clearer signals.",
        ),
        names => SessionInfo {
            session: Session::Overlap,
            mood_label: "Energetic and turbulent".to_string(),
            volatility: Volatility::VeryHigh,
            advisory: format!("{} sessions overlap. Peak trading hours.", names.join(" & ")),
        },
    }
}

fn holiday_name(month: u32, day: u32) -> Option<&'static str> {
    FIXED_HOLIDAYS
        .iter()
        .find(|&&(m, d, _)| m == month && d == day)
        .map(|&(_, _, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn saturday_is_weekend() {
        // 2024-03-09 is a Saturday.
        let info = session_at(at(2024, 3, 9, 12, 0));
        assert_eq!(info.session, Session::Weekend);
        assert_eq!(info.volatility, Volatility::None);
    }

    #[test]
    fn weekend_beats_holiday() {
        // 2022-01-01 is a Saturday and a fixed holiday.
        let info = session_at(at(2022, 1, 1, 12, 0));
        assert_eq!(info.session, Session::Weekend);
    }

    #[test]
    fn friday_evening_is_friday_close() {
        // 2024-03-08 is a Friday.
        let info = session_at(at(2024, 3, 8, 20, 30));
        assert_eq!(info.session, Session::FridayClose);
        assert_eq!(info.volatility, Volatility::Decreasing);
    }

    #[test]
    fn friday_before_cutoff_is_not_friday_close() {
        let info = session_at(at(2024, 3, 8, 19, 59));
        assert_eq!(info.session, Session::NewYork);
    }

    #[test]
    fn weekday_holiday_detected_with_name() {
        // 2024-01-01 is a Monday.
        let info = session_at(at(2024, 1, 1, 10, 0));
        assert_eq!(info.session, Session::Holiday);
        assert!(info.advisory.contains("New Year's Day"));
        assert_eq!(info.volatility, Volatility::Low);
    }

    #[test]
    fn tokyo_alone_in_early_hours() {
        // 2024-03-06 is a Wednesday.
        let info = session_at(at(2024, 3, 6, 3, 0));
        assert_eq!(info.session, Session::Tokyo);
        assert_eq!(info.volatility, Volatility::LowToModerate);
    }

    #[test]
    fn london_alone_mid_morning() {
        let info = session_at(at(2024, 3, 6, 10, 0));
        assert_eq!(info.session, Session::London);
        assert_eq!(info.volatility, Volatility::High);
    }

    #[test]
    fn new_york_alone_in_evening() {
        let info = session_at(at(2024, 3, 6, 17, 0));
        assert_eq!(info.session, Session::NewYork);
    }

    #[test]
    fn tokyo_london_overlap() {
        let info = session_at(at(2024, 3, 6, 7, 30));
        assert_eq!(info.session, Session::Overlap);
        assert_eq!(info.volatility, Volatility::VeryHigh);
        assert!(info.advisory.contains("Tokyo & London"));
    }

    #[test]
    fn london_new_york_overlap() {
        let info = session_at(at(2024, 3, 6, 14, 0));
        assert_eq!(info.session, Session::Overlap);
        assert!(info.advisory.contains("London & New York"));
    }

    #[test]
    fn late_evening_is_off_hours() {
        let info = session_at(at(2024, 3, 6, 23, 0));
        assert_eq!(info.session, Session::OffHours);
        assert_eq!(info.volatility, Volatility::Low);
    }
}
