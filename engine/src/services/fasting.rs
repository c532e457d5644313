use calorie_tracker_shared::{FastingPhase, FastingStatus, Profile};
use chrono::NaiveTime;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

pub struct FastingService;

impl FastingService {
    /// Phase at `now` for the profile's fasting window, `None` when no
    /// window is set. The window runs from start to end and spans
    /// midnight when end <= start.
    pub fn status(profile: &Profile, now: NaiveTime) -> Option<FastingStatus> {
        let (start, end) = (profile.fasting_start?, profile.fasting_end?);

        let fasting = if start < end {
            now >= start && now < end
        } else {
            now >= start || now < end
        };
        let (phase, boundary) = if fasting {
            (FastingPhase::Fasting, end)
        } else {
            (FastingPhase::Eating, start)
        };

        Some(FastingStatus {
            phase,
            minutes_until_change: Self::minutes_until(now, boundary),
            window_start: start,
            window_end: end,
        })
    }

    /// Whole minutes until the next occurrence of `target`, rounded up
    fn minutes_until(now: NaiveTime, target: NaiveTime) -> i64 {
        let mut seconds = (target - now).num_seconds();
        if seconds <= 0 {
            seconds += SECONDS_PER_DAY;
        }
        (seconds + 59) / 60
    }
}
