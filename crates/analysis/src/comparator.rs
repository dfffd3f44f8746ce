//! Lap Comparator (C7, spec §4.7).

use model::channel::names;
use model::{CornerAttribution, CornerDelta, CornerSegment, Diagnosis, NamedSegment, NormalisedLap, TheoreticalBest};

const BRAKING_SEARCH_LOOKBACK_M: i64 = 200;
const BRAKE_DETECTED_THRESHOLD: f64 = 0.1;
const THROTTLE_DETECTED_THRESHOLD: f64 = 0.9;

/// Per-corner delta between `candidate` and `reference` for one named
/// segment, both sharing the reference lap's segmentation.
pub fn compare_corner(candidate: &NormalisedLap, reference: &NormalisedLap, named: &NamedSegment) -> CornerDelta {
    let seg = &named.segment;

    let cand_brake = candidate.channels.get_floats(names::BRAKE).unwrap_or_default();
    let ref_brake = reference.channels.get_floats(names::BRAKE).unwrap_or_default();
    let cand_throttle = candidate.channels.get_floats(names::THROTTLE).unwrap_or_default();
    let ref_throttle = reference.channels.get_floats(names::THROTTLE).unwrap_or_default();
    let cand_speed = candidate.channels.get_floats(names::SPEED).unwrap_or_default();
    let ref_speed = reference.channels.get_floats(names::SPEED).unwrap_or_default();
    let cand_session_time = candidate.channels.get_floats(names::SESSION_TIME).unwrap_or_default();
    let ref_session_time = reference.channels.get_floats(names::SESSION_TIME).unwrap_or_default();

    let braking_point_delta_m = match (
        first_crossing(&cand_brake, (seg.entry_m - BRAKING_SEARCH_LOOKBACK_M).max(0), BRAKE_DETECTED_THRESHOLD),
        first_crossing(&ref_brake, (seg.entry_m - BRAKING_SEARCH_LOOKBACK_M).max(0), BRAKE_DETECTED_THRESHOLD),
    ) {
        (Some(c), Some(r)) => Some((c - r) as f64),
        _ => None,
    };

    let throttle_application_delta_m = match (
        first_crossing(&cand_throttle, seg.apex_m, THROTTLE_DETECTED_THRESHOLD),
        first_crossing(&ref_throttle, seg.apex_m, THROTTLE_DETECTED_THRESHOLD),
    ) {
        (Some(c), Some(r)) => Some((c - r) as f64),
        _ => None,
    };

    let cand_min_speed = min_in_range(&cand_speed, seg.entry_m, seg.exit_m);
    let ref_min_speed = min_in_range(&ref_speed, seg.entry_m, seg.exit_m);
    let min_speed_delta = cand_min_speed - ref_min_speed;

    let time_delta_s = match (
        interval_delta(&cand_session_time, seg.entry_m, seg.exit_m),
        interval_delta(&ref_session_time, seg.entry_m, seg.exit_m),
    ) {
        (Some(c), Some(r)) if c >= 0.0 && r >= 0.0 => Some(c - r),
        _ => None,
    };

    let lap_position_percent = if reference.grid_len() > 1 {
        seg.apex_m as f64 / (reference.grid_len() - 1) as f64 * 100.0
    } else {
        0.0
    };

    CornerDelta {
        corner_name: named.corner_name.clone(),
        corner_number: named.corner_number,
        entry_m: seg.entry_m,
        apex_m: seg.apex_m,
        exit_m: seg.exit_m,
        braking_point_delta_m,
        min_speed_delta,
        throttle_application_delta_m,
        time_delta_s,
        lap_position_percent,
    }
}

/// First index at or after `start_m` where `series >= threshold`.
fn first_crossing(series: &[f64], start_m: i64, threshold: f64) -> Option<i64> {
    let start = start_m.max(0) as usize;
    series.get(start..)?.iter().position(|&v| v >= threshold).map(|p| (p + start) as i64)
}

fn min_in_range(series: &[f64], entry_m: i64, exit_m: i64) -> f64 {
    let start = entry_m.max(0) as usize;
    let end = (exit_m as usize).min(series.len().saturating_sub(1));
    if start > end {
        return 0.0;
    }
    series[start..=end].iter().cloned().fold(f64::INFINITY, f64::min)
}

fn interval_delta(series: &[f64], entry_m: i64, exit_m: i64) -> Option<f64> {
    let entry = entry_m.max(0) as usize;
    let exit = exit_m.max(0) as usize;
    if exit >= series.len() || entry >= series.len() {
        return None;
    }
    Some(series[exit] - series[entry])
}

/// Sum of per-corner minima across `laps`, straights taken from the actual
/// fastest lap (spec §4.7).
pub fn theoretical_best(laps: &[NormalisedLap], segments: &[CornerSegment]) -> TheoreticalBest {
    let actual_best_idx = laps
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.lap_time_s.partial_cmp(&b.1.lap_time_s).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let actual_best = &laps[actual_best_idx];
    let actual_best_time_s = actual_best.lap_time_s;

    let mut per_corner = Vec::new();
    let mut sum_minima = 0.0;
    let mut sum_best_lap_corner_times = 0.0;

    for (seg_idx, seg) in segments.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;
        for (li, lap) in laps.iter().enumerate() {
            if let Some(t) = corner_time(lap, seg) {
                if best.map_or(true, |(_, bt)| t < bt) {
                    best = Some((li, t));
                }
            }
        }
        if let Some((li, t)) = best {
            sum_minima += t;
            per_corner.push(CornerAttribution {
                corner_number: (seg_idx + 1) as u32,
                best_lap_number: laps[li].lap_number,
                best_corner_time_s: t,
            });
        }
        if let Some(t) = corner_time(actual_best, seg) {
            sum_best_lap_corner_times += t;
        }
    }

    // Straights must come from the same clock as the corner minima
    // (cumulative `SessionTime`, spec §4.7, §9) rather than the official
    // `lap_time_s`/`LapCurrentLapTime` — mixing the two clocks would make
    // `theoretical_time_s` an apples-to-oranges sum.
    let reference_total_s = total_session_time(actual_best).unwrap_or(actual_best_time_s);
    let straight_time = (reference_total_s - sum_best_lap_corner_times).max(0.0);
    let theoretical_time_s = sum_minima + straight_time;

    TheoreticalBest { actual_best_time_s, theoretical_time_s, per_corner }
}

fn corner_time(lap: &NormalisedLap, seg: &CornerSegment) -> Option<f64> {
    let session_time = lap.channels.get_floats(names::SESSION_TIME).ok()?;
    interval_delta(&session_time, seg.entry_m, seg.exit_m).filter(|dt| *dt >= 0.0)
}

/// Total elapsed `SessionTime` across `lap`'s grid, the same clock
/// `corner_time` draws its per-corner intervals from.
fn total_session_time(lap: &NormalisedLap) -> Option<f64> {
    let session_time = lap.channels.get_floats(names::SESSION_TIME).ok()?;
    Some(session_time.last()? - session_time.first()?)
}

/// Diagnosis tag for a priority corner, per the rules in spec §4.7. Brake
/// peak and post-exit speed context come from `candidate`/`reference`
/// directly since `CornerDelta` doesn't carry them.
pub fn diagnose(candidate: &NormalisedLap, reference: &NormalisedLap, delta: &CornerDelta) -> Diagnosis {
    if let Some(bpd) = delta.braking_point_delta_m {
        if bpd > 5.0 && delta.min_speed_delta < -2.0 {
            return Diagnosis::LateBrakeOverSlow;
        }
        let cand_brake = candidate.channels.get_floats(names::BRAKE).unwrap_or_default();
        let peak_brake = max_in_range(&cand_brake, delta.entry_m, delta.exit_m);
        if bpd < -5.0 && peak_brake < 0.3 {
            return Diagnosis::EarlyLift;
        }
        if delta.min_speed_delta < -3.0 && (-5.0..=5.0).contains(&bpd) {
            return Diagnosis::TightLine;
        }
    }

    if let Some(tad) = delta.throttle_application_delta_m {
        if tad < -10.0 {
            let cand_speed = candidate.channels.get_floats(names::SPEED).unwrap_or_default();
            let ref_speed = reference.channels.get_floats(names::SPEED).unwrap_or_default();
            let probe = delta.exit_m + 100;
            if let (Some(&c), Some(&r)) = (cand_speed.get(probe as usize), ref_speed.get(probe as usize)) {
                if c < r {
                    return Diagnosis::EarlyThrottleLossOfDrive;
                }
            }
        }
    }

    Diagnosis::Other
}

fn max_in_range(series: &[f64], entry_m: i64, exit_m: i64) -> f64 {
    let start = entry_m.max(0) as usize;
    let end = (exit_m as usize).min(series.len().saturating_sub(1));
    if start > end {
        return 0.0;
    }
    series[start..=end].iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ChannelTable, ChannelValues, CornerType};

    fn lap_with(speed: Vec<f64>, brake: Vec<f64>, throttle: Vec<f64>, session_time: Vec<f64>, lap_time_s: f64) -> NormalisedLap {
        let n = speed.len();
        let mut t = ChannelTable::new(n);
        t.insert(names::SPEED, ChannelValues::Float(speed));
        t.insert(names::BRAKE, ChannelValues::Float(brake));
        t.insert(names::THROTTLE, ChannelValues::Float(throttle));
        t.insert(names::SESSION_TIME, ChannelValues::Float(session_time));
        NormalisedLap { lap_number: 1, lap_time_s, channels: t }
    }

    fn segment(entry: i64, apex: i64, exit: i64) -> CornerSegment {
        CornerSegment { index: 1, entry_m: entry, apex_m: apex, exit_m: exit, apex_speed: 30.0, corner_type: CornerType::Unknown }
    }

    #[test]
    fn identical_laps_have_zero_time_delta() {
        let n = 300;
        let speed = vec![40.0; n];
        let brake = vec![0.0; n];
        let throttle = vec![1.0; n];
        let session_time: Vec<f64> = (0..n).map(|i| i as f64 * 0.05).collect();
        let reference = lap_with(speed.clone(), brake.clone(), throttle.clone(), session_time.clone(), 15.0);
        let candidate = lap_with(speed, brake, throttle, session_time, 15.0);
        let named = NamedSegment { segment: segment(100, 150, 200), corner_name: None, corner_number: None };
        let delta = compare_corner(&candidate, &reference, &named);
        assert_eq!(delta.time_delta_s, Some(0.0));
        assert_eq!(delta.min_speed_delta, 0.0);
    }

    #[test]
    fn negative_interval_is_reported_as_none() {
        let n = 300;
        let speed = vec![40.0; n];
        let brake = vec![0.0; n];
        let throttle = vec![1.0; n];
        let mut session_time: Vec<f64> = (0..n).map(|i| i as f64 * 0.05).collect();
        // Make the candidate's elapsed time within the segment negative.
        session_time[200] = session_time[100] - 1.0;
        let reference = lap_with(speed.clone(), brake.clone(), throttle.clone(), (0..n).map(|i| i as f64 * 0.05).collect(), 15.0);
        let candidate = lap_with(speed, brake, throttle, session_time, 15.0);
        let named = NamedSegment { segment: segment(100, 150, 200), corner_name: None, corner_number: None };
        let delta = compare_corner(&candidate, &reference, &named);
        assert_eq!(delta.time_delta_s, None);
    }

    #[test]
    fn theoretical_best_uses_session_time_not_lap_current_lap_time() {
        // lap_time_s (LapCurrentLapTime) is deliberately out of sync with
        // SessionTime's span — theoretical_time_s must be derived entirely
        // from SessionTime, so it should land near 15.0 (the SessionTime
        // span), not near the bogus 999.0 lap_time_s.
        let n = 300;
        let brake = vec![0.0; n];
        let throttle = vec![1.0; n];
        let session_time: Vec<f64> = (0..n).map(|i| i as f64 * 0.05).collect();
        let lap = lap_with(vec![40.0; n], brake, throttle, session_time.clone(), 999.0);
        let segments = vec![segment(100, 150, 200)];
        let tb = theoretical_best(&[lap], &segments);
        let expected_total = session_time[n - 1] - session_time[0];
        assert!((tb.theoretical_time_s - expected_total).abs() < 1e-6, "{} vs {expected_total}", tb.theoretical_time_s);
    }

    #[test]
    fn theoretical_best_never_exceeds_fastest_lap() {
        let n = 300;
        let brake = vec![0.0; n];
        let throttle = vec![1.0; n];
        let fast_time: Vec<f64> = (0..n).map(|i| i as f64 * 0.05).collect();
        let slow_time: Vec<f64> = (0..n).map(|i| i as f64 * 0.06).collect();
        let fast = lap_with(vec![40.0; n], brake.clone(), throttle.clone(), fast_time.clone(), fast_time[n - 1]);
        let slow = lap_with(vec![35.0; n], brake, throttle, slow_time.clone(), slow_time[n - 1]);
        let segments = vec![segment(100, 150, 200)];
        let tb = theoretical_best(&[fast, slow], &segments);
        assert!(tb.theoretical_time_s <= tb.actual_best_time_s + 1e-6);
    }
}
