use chrono::{DateTime, Datelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::models::delivery::{EligibilityReason, EligibilityResult};
use crate::models::warehouse::Warehouse;

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn weekday_abbr(day: Weekday) -> &'static str {
    &weekday_name(day)[..3]
}

/// First operating day strictly after `today`, looking at most a week ahead.
/// An empty schedule means every day, so that is always tomorrow.
pub fn next_operating_day(operating_days: &[Weekday], today: Weekday) -> Weekday {
    let mut day = today;
    for _ in 0..7 {
        day = day.succ();
        if operating_days.is_empty() || operating_days.contains(&day) {
            return day;
        }
    }
    today.succ()
}

pub fn is_currently_open(warehouse: &Warehouse, now: DateTime<Utc>, timezone: Tz) -> EligibilityResult {
    if !warehouse.is_delivery_enabled {
        let human_message = warehouse.disabled_message.clone().unwrap_or_else(|| {
            format!("{} is not accepting delivery orders right now", warehouse.name)
        });
        return EligibilityResult {
            is_delivering: false,
            reason: EligibilityReason::Disabled,
            human_message,
            short_message: "Delivery unavailable".to_string(),
            next_open_day: None,
            next_open_time: None,
        };
    }

    if warehouse.is_24x7 {
        return EligibilityResult {
            is_delivering: true,
            reason: EligibilityReason::Open24x7,
            human_message: "Delivering 24x7".to_string(),
            short_message: "Open 24x7".to_string(),
            next_open_day: None,
            next_open_time: None,
        };
    }

    let local = now.with_timezone(&timezone);
    let today = local.weekday();
    let current = local.format("%H:%M").to_string();
    let hours = &warehouse.operating_hours;
    let days = &warehouse.operating_days;

    if !days.is_empty() && !days.contains(&today) {
        let next = next_operating_day(days, today);
        return reopening(EligibilityReason::ClosedToday, "Closed today", next, &hours.start);
    }

    // Zero-padded HH:MM compares the same lexically and numerically.
    if current < hours.start {
        EligibilityResult {
            is_delivering: false,
            reason: EligibilityReason::BeforeOpening,
            human_message: format!("Opens today at {}", hours.start),
            short_message: format!("Opens {}", hours.start),
            next_open_day: Some(weekday_name(today).to_string()),
            next_open_time: Some(hours.start.clone()),
        }
    } else if current > hours.end {
        let next = next_operating_day(days, today);
        reopening(
            EligibilityReason::AfterClosing,
            "Closed for the day",
            next,
            &hours.start,
        )
    } else {
        EligibilityResult {
            is_delivering: true,
            reason: EligibilityReason::OpenNow,
            human_message: format!("Open now, delivering until {}", hours.end),
            short_message: "Open now".to_string(),
            next_open_day: None,
            next_open_time: None,
        }
    }
}

fn reopening(reason: EligibilityReason, lead: &str, day: Weekday, start: &str) -> EligibilityResult {
    EligibilityResult {
        is_delivering: false,
        reason,
        human_message: format!("{lead}. Opens {} at {start}", weekday_name(day)),
        short_message: format!("Opens {} {start}", weekday_abbr(day)),
        next_open_day: Some(weekday_name(day).to_string()),
        next_open_time: Some(start.to_string()),
    }
}
