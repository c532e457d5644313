//! Trend insights over a trailing window of days

use super::{SummaryService, WeightService};
use calorie_tracker_shared::validation::MAX_INSIGHT_DAYS;
use calorie_tracker_shared::{Insights, MovingAveragePoint, User, WeightSample};
use chrono::{Duration, NaiveDate};

/// Samples averaged by the weight moving average
pub const MOVING_AVERAGE_SAMPLES: usize = 7;

pub struct InsightsService;

impl InsightsService {
    /// Insights for the `days` days ending at `end` (inclusive)
    ///
    /// `days` is clamped to `1..=MAX_INSIGHT_DAYS`; the window stops at the
    /// earliest representable date.
    pub fn insights(user: &User, end: NaiveDate, days: u32) -> Insights {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days.clamp(1, MAX_INSIGHT_DAYS)) - 1))
            .unwrap_or(NaiveDate::MIN);
        let days = u32::try_from((end - start).num_days() + 1).unwrap_or(MAX_INSIGHT_DAYS);

        let mut days_logged = 0u32;
        let mut deficit_sum = 0.0;
        let mut net_sum = 0.0;
        for offset in 0..i64::from(days) {
            let energy = SummaryService::day_energy(user, start + Duration::days(offset));
            if energy.logged {
                days_logged += 1;
                deficit_sum += energy.deficit();
                net_sum += energy.intake - energy.exercise_burn;
            }
        }
        let average = |sum: f64| (days_logged > 0).then(|| sum / f64::from(days_logged));

        let samples: Vec<WeightSample> = user
            .weights
            .iter()
            .filter(|w| w.date >= start && w.date <= end)
            .cloned()
            .collect();
        let (weight_change, weight_change_pct) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => {
                let change = last.weight_kg - first.weight_kg;
                (Some(change), Some(change / first.weight_kg * 100.0))
            }
            _ => (None, None),
        };

        let moving_average = WeightService::moving_average_series(&samples, MOVING_AVERAGE_SAMPLES)
            .into_iter()
            .map(|(date, weight_kg)| MovingAveragePoint { date, weight_kg })
            .collect();

        Insights {
            start,
            end,
            days,
            days_logged,
            average_deficit: average(deficit_sum),
            average_net: average(net_sum),
            weight_change,
            weight_change_pct,
            moving_average,
        }
    }
}
