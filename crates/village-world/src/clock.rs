//! World clock advancement.
//!
//! `advance_time` is the sole mutator of [`village_types::Clock`]; every
//! other clock field (`current_day`, `season`) is derived from it so
//! there is exactly one place that can get the arithmetic wrong.

use village_types::{Clock, Season};

use crate::error::WorldError;

/// Days in one season cycle. Four seasons to a year, 30 days to a season.
pub const DAYS_PER_SEASON: u64 = 30;

/// Advance the clock by `minutes` real-simulation minutes.
///
/// Rolls `current_hour` forward, carrying into `current_day` (and thus
/// `season`) on every 24-hour rollover. `current_tick` is incremented by
/// exactly one regardless of `minutes`, since one call to this function
/// is defined to be one tick.
pub fn advance_time(clock: &mut Clock, minutes: f64) -> Result<(), WorldError> {
    clock.current_tick = clock
        .current_tick
        .checked_add(1)
        .ok_or(WorldError::ClockOverflow)?;

    let mut hour = clock.current_hour + minutes / 60.0;
    let mut days_elapsed: u64 = 0;
    while hour >= 24.0 {
        hour -= 24.0;
        days_elapsed = days_elapsed
            .checked_add(1)
            .ok_or(WorldError::ClockOverflow)?;
    }
    clock.current_hour = hour;

    if days_elapsed > 0 {
        clock.current_day = clock
            .current_day
            .checked_add(days_elapsed)
            .ok_or(WorldError::ClockOverflow)?;
    }

    clock.season = Season::from_day(clock.current_day.saturating_sub(1), DAYS_PER_SEASON);
    Ok(())
}

/// Whether `hour` falls in the wake window `[6.0, 6.5)`.
#[must_use]
pub fn in_wake_window(hour: f64) -> bool {
    (6.0..6.5).contains(&hour)
}

/// Whether `hour` falls in the sleep window (`>= 22.0` or `< 6.0`).
#[must_use]
pub fn in_sleep_window(hour: f64) -> bool {
    !(6.0..22.0).contains(&hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_clock() -> Clock {
        Clock {
            current_tick: 0,
            current_day: 1,
            current_hour: 6.0,
            season: Season::Spring,
            weather: String::from("clear"),
        }
    }

    #[test]
    fn advance_time_increments_tick_exactly_once() {
        let mut clock = seed_clock();
        advance_time(&mut clock, 30.0).expect("advance");
        assert_eq!(clock.current_tick, 1);
    }

    #[test]
    fn advance_time_rolls_hour_into_day() {
        let mut clock = seed_clock();
        clock.current_hour = 23.5;
        advance_time(&mut clock, 60.0).expect("advance");
        assert_eq!(clock.current_day, 2);
        assert!((clock.current_hour - 0.5).abs() < 1e-9);
    }

    #[test]
    fn season_cycles_after_season_length_days() {
        let mut clock = seed_clock();
        clock.current_day = DAYS_PER_SEASON;
        clock.current_hour = 23.9;
        advance_time(&mut clock, 30.0).expect("advance");
        assert_eq!(clock.current_day, DAYS_PER_SEASON + 1);
        assert_eq!(clock.season, Season::Summer);
    }

    #[test]
    fn wake_and_sleep_windows_do_not_overlap() {
        assert!(in_wake_window(6.2));
        assert!(!in_sleep_window(6.2));
        assert!(in_sleep_window(23.0));
        assert!(in_sleep_window(2.0));
        assert!(!in_wake_window(12.0));
        assert!(!in_sleep_window(12.0));
    }
}
