//! Distance Normaliser (C3, spec §4.3).

use model::channel::names;
use model::{ChannelTable, ChannelType, ChannelValues, NormalisedLap, RawLap, RejectionReason};

const STATIONARY_SPEED_MPS: f64 = 0.1;
const COVERAGE_FRACTION: f64 = 0.90;
const JUMP_SPEED_THRESHOLD_MPS: f64 = 1.0;

/// Resamples `raw` onto a uniform 1-metre distance grid `[0, 1, ..., floor(track_length_m)]`,
/// or reports why it could not be normalised.
pub fn normalise_lap(raw: &RawLap, track_length_m: f64) -> std::result::Result<NormalisedLap, RejectionReason> {
    let n = raw.channels.len;
    if n == 0 {
        return Err(RejectionReason::TooShort);
    }

    if channel_floats(&raw.channels, names::ON_PIT_ROAD).iter().any(|v| *v != 0.0) {
        return Err(RejectionReason::PitLap);
    }

    let lap_time_s = channel_floats(&raw.channels, names::LAP_CURRENT_LAP_TIME)
        .last()
        .copied()
        .unwrap_or(0.0);

    let speed = channel_floats(&raw.channels, names::SPEED);
    let mut trimmed_end = n;
    while trimmed_end > 0 && speed[trimmed_end - 1] < STATIONARY_SPEED_MPS {
        trimmed_end -= 1;
    }
    if trimmed_end < 2 {
        return Err(RejectionReason::TooShort);
    }

    let distance = channel_floats(&raw.channels, names::LAP_DIST);
    let distance = &distance[..trimmed_end];
    let speed = &speed[..trimmed_end];

    let max_d = distance.iter().cloned().fold(f64::MIN, f64::max);
    let min_d = distance.iter().cloned().fold(f64::MAX, f64::min);
    if (max_d - min_d) < COVERAGE_FRACTION * track_length_m {
        return Err(RejectionReason::InsufficientCoverage);
    }

    for i in 1..trimmed_end {
        if distance[i] < distance[i - 1] && speed[i] > JUMP_SPEED_THRESHOLD_MPS {
            return Err(RejectionReason::DistanceJump);
        }
    }

    let mut dedup_distance: Vec<f64> = Vec::with_capacity(trimmed_end);
    let mut dedup_index: Vec<usize> = Vec::with_capacity(trimmed_end);
    for i in 0..trimmed_end {
        if let Some(&last_d) = dedup_distance.last() {
            if distance[i] == last_d {
                let last = dedup_index.len() - 1;
                dedup_index[last] = i;
                continue;
            }
        }
        dedup_distance.push(distance[i]);
        dedup_index.push(i);
    }
    if dedup_distance.len() < 2 {
        return Err(RejectionReason::TooShort);
    }

    let trimmed = raw.channels.slice(0, trimmed_end);
    let grid_len = track_length_m.floor() as usize + 1;

    let mut out = ChannelTable::new(grid_len);
    for (name, values) in &trimmed.channels {
        let resampled = resample_channel(values, &dedup_distance, &dedup_index, grid_len);
        out.insert(name.clone(), resampled);
    }

    Ok(NormalisedLap { lap_number: raw.lap_number, lap_time_s, channels: out })
}

fn channel_floats(channels: &ChannelTable, name: &str) -> Vec<f64> {
    channels.get_floats(name).unwrap_or_default()
}

/// Linearly interpolates continuous channels onto the grid; nearest-neighbour
/// for discrete (bool/int) channels (spec §4.3 step 7).
fn resample_channel(values: &ChannelValues, dedup_distance: &[f64], dedup_index: &[usize], grid_len: usize) -> ChannelValues {
    let source = values.as_floats();
    let discrete = values.dtype() != ChannelType::Float;

    let mut out_floats = Vec::with_capacity(grid_len);
    for g in 0..grid_len {
        let d = g as f64;
        out_floats.push(sample_at(&source, dedup_distance, dedup_index, d, discrete));
    }

    match values {
        ChannelValues::Bool(_) => ChannelValues::Bool(out_floats.iter().map(|v| *v != 0.0).collect()),
        ChannelValues::Int(_) => ChannelValues::Int(out_floats.iter().map(|v| v.round() as i64).collect()),
        ChannelValues::Float(_) => ChannelValues::Float(out_floats),
    }
}

/// Samples the channel at grid distance `d`. Within the lap's recorded
/// `LapDist` range this interpolates/nearest-neighbours between bracketing
/// samples; outside it (the grid can run past `LapDist`'s actual coverage —
/// only 90% of the track is required, see `normalise_lap`) continuous
/// channels are extrapolated along the edge segment's slope rather than
/// clamped, so a monotonic channel like `SessionTime` stays strictly
/// increasing across the whole grid instead of flattening at the tail.
fn sample_at(source: &[f64], dedup_distance: &[f64], dedup_index: &[usize], d: f64, discrete: bool) -> f64 {
    let last = dedup_distance.len() - 1;
    if d <= dedup_distance[0] {
        if discrete {
            return source[dedup_index[0]];
        }
        return extrapolate(source, dedup_distance, dedup_index, 0, 1, d);
    }
    if d >= dedup_distance[last] {
        if discrete {
            return source[dedup_index[last]];
        }
        return extrapolate(source, dedup_distance, dedup_index, last - 1, last, d);
    }

    let bracket = dedup_distance.partition_point(|&x| x <= d).saturating_sub(1).min(last - 1);
    let (d0, d1) = (dedup_distance[bracket], dedup_distance[bracket + 1]);
    let (i0, i1) = (dedup_index[bracket], dedup_index[bracket + 1]);
    let (v0, v1) = (source[i0], source[i1]);

    if discrete {
        let t = if d1 > d0 { (d - d0) / (d1 - d0) } else { 0.0 };
        if t < 0.5 { v0 } else { v1 }
    } else {
        if d1 > d0 {
            v0 + (d - d0) / (d1 - d0) * (v1 - v0)
        } else {
            v0
        }
    }
}

/// Linear extrapolation beyond the bracket `[i0, i1]` using its slope,
/// `dedup_distance.len() >= 2` is guaranteed by `normalise_lap` before this
/// is reached, so `i0 != i1` always holds.
fn extrapolate(source: &[f64], dedup_distance: &[f64], dedup_index: &[usize], i0: usize, i1: usize, d: f64) -> f64 {
    let (d0, d1) = (dedup_distance[i0], dedup_distance[i1]);
    let (v0, v1) = (source[dedup_index[i0]], source[dedup_index[i1]]);
    if d1 > d0 {
        v0 + (d - d0) / (d1 - d0) * (v1 - v0)
    } else {
        v0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::channel::names;

    fn build_raw_lap(distances: &[f64], speeds: &[f64], session_time: &[f64]) -> RawLap {
        let n = distances.len();
        let mut t = ChannelTable::new(n);
        t.insert(names::LAP_DIST, ChannelValues::Float(distances.to_vec()));
        t.insert(names::SPEED, ChannelValues::Float(speeds.to_vec()));
        t.insert(names::SESSION_TIME, ChannelValues::Float(session_time.to_vec()));
        t.insert(names::LAP_CURRENT_LAP_TIME, ChannelValues::Float(session_time.to_vec()));
        t.insert(names::ON_PIT_ROAD, ChannelValues::Bool(vec![false; n]));
        t.insert(names::GEAR, ChannelValues::Int(vec![3; n]));
        RawLap { lap_number: 1, channels: t }
    }

    #[test]
    fn produces_grid_covering_track_length() {
        let distances: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let speeds = vec![30.0; 101];
        let session_time: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
        let raw = build_raw_lap(&distances, &speeds, &session_time);
        let lap = normalise_lap(&raw, 100.0).unwrap();
        assert_eq!(lap.grid_len(), 101);
        let st = lap.channels.get_floats(names::SESSION_TIME).unwrap();
        assert!(st.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn pit_lap_is_rejected() {
        let distances: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let speeds = vec![30.0; 101];
        let session_time: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
        let mut raw = build_raw_lap(&distances, &speeds, &session_time);
        raw.channels.insert(names::ON_PIT_ROAD, ChannelValues::Bool({
            let mut v = vec![false; 101];
            v[50] = true;
            v
        }));
        assert_eq!(normalise_lap(&raw, 100.0), Err(RejectionReason::PitLap));
    }

    #[test]
    fn insufficient_coverage_is_rejected() {
        let distances: Vec<f64> = (0..=20).map(|i| i as f64).collect();
        let speeds = vec![30.0; 21];
        let session_time: Vec<f64> = (0..=20).map(|i| i as f64 * 0.1).collect();
        let raw = build_raw_lap(&distances, &speeds, &session_time);
        assert_eq!(normalise_lap(&raw, 100.0), Err(RejectionReason::InsufficientCoverage));
    }

    #[test]
    fn trailing_stationary_samples_are_trimmed() {
        let mut distances: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let mut speeds = vec![30.0; 101];
        let mut session_time: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
        for _ in 0..10 {
            distances.push(100.0);
            speeds.push(0.0);
            session_time.push(*session_time.last().unwrap() + 0.1);
        }
        let raw = build_raw_lap(&distances, &speeds, &session_time);
        let lap = normalise_lap(&raw, 100.0).unwrap();
        assert_eq!(lap.grid_len(), 101);
    }

    #[test]
    fn lap_time_is_final_sample_not_maximum() {
        // Lap channel increments ~30 samples before LapCurrentLapTime resets:
        // the tail of this RawLap holds a declining value from the next lap,
        // but the final sample is what must be reported.
        let distances: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let speeds = vec![30.0; 101];
        let session_time: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
        let mut raw = build_raw_lap(&distances, &speeds, &session_time);
        let mut lap_time = session_time.clone();
        lap_time[100] = 0.05; // next lap's current-lap-time already ticking
        raw.channels.insert(names::LAP_CURRENT_LAP_TIME, ChannelValues::Float(lap_time));
        let lap = normalise_lap(&raw, 100.0).unwrap();
        assert_eq!(lap.lap_time_s, 0.05);
    }

    /// A lap whose recorded `LapDist` only reaches 90% of the track (the
    /// minimum this passes `COVERAGE_FRACTION`) must still produce a
    /// strictly increasing `SessionTime` across the grid tail that falls
    /// beyond that recorded range.
    #[test]
    fn session_time_stays_monotonic_past_recorded_coverage() {
        let track_length_m = 6213.0;
        let covered = 5592usize;
        let distances: Vec<f64> = (0..=covered).map(|i| i as f64).collect();
        let speeds = vec![50.0; covered + 1];
        let session_time: Vec<f64> = (0..=covered).map(|i| i as f64 * 0.02).collect();
        let raw = build_raw_lap(&distances, &speeds, &session_time);
        let lap = normalise_lap(&raw, track_length_m).unwrap();
        assert_eq!(lap.grid_len(), track_length_m.floor() as usize + 1);
        let st = lap.channels.get_floats(names::SESSION_TIME).unwrap();
        assert!(st.windows(2).all(|w| w[1] > w[0]), "SessionTime must stay strictly increasing past recorded LapDist coverage");
    }

    /// Re-normalising an already-normalised lap is a fixed point (spec §8):
    /// the grid channel already sits on integer-metre points, so feeding it
    /// back through `normalise_lap` as a `RawLap` must reproduce every
    /// channel within a 1e-3 bound (spec §8).
    #[test]
    fn renormalising_a_normalised_lap_is_a_fixed_point() {
        let distances: Vec<f64> = (0..=200).map(|i| i as f64).collect();
        let speeds: Vec<f64> = (0..=200).map(|i| 30.0 + (i as f64 * 0.37).sin() * 10.0).collect();
        let session_time: Vec<f64> = (0..=200).map(|i| i as f64 * 0.1).collect();
        let raw = build_raw_lap(&distances, &speeds, &session_time);
        let once = normalise_lap(&raw, 200.0).unwrap();

        let reraw = RawLap { lap_number: once.lap_number, channels: once.channels.clone() };
        let twice = normalise_lap(&reraw, 200.0).unwrap();

        let once_speed = once.channels.get_floats(names::SPEED).unwrap();
        let twice_speed = twice.channels.get_floats(names::SPEED).unwrap();
        assert_eq!(once_speed.len(), twice_speed.len());
        for (a, b) in once_speed.iter().zip(&twice_speed) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
        assert!((once.lap_time_s - twice.lap_time_s).abs() < 1e-3);
    }
}

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;
    use model::channel::names;

    fn raw_lap_from(distances: Vec<f64>, speeds: Vec<f64>) -> RawLap {
        let n = distances.len();
        let session_time: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let mut t = ChannelTable::new(n);
        t.insert(names::LAP_DIST, ChannelValues::Float(distances));
        t.insert(names::SPEED, ChannelValues::Float(speeds));
        t.insert(names::SESSION_TIME, ChannelValues::Float(session_time.clone()));
        t.insert(names::LAP_CURRENT_LAP_TIME, ChannelValues::Float(session_time));
        t.insert(names::ON_PIT_ROAD, ChannelValues::Bool(vec![false; n]));
        RawLap { lap_number: 7, channels: t }
    }

    proptest! {
        /// Any lap whose distance series strictly covers the track at a
        /// cruising speed resamples onto exactly `[0, 1, ..., floor(track_length_m)]`
        /// with strictly increasing `SessionTime` (spec §8).
        #[test]
        fn normalised_grid_always_spans_track_length(
            track_length_m in 50.0f64..500.0,
            n in 60usize..400,
        ) {
            let distances: Vec<f64> = (0..n).map(|i| i as f64 * track_length_m / (n - 1) as f64).collect();
            let speeds = vec![25.0; n];
            let raw = raw_lap_from(distances, speeds);

            let lap = normalise_lap(&raw, track_length_m).unwrap();
            let expected_len = track_length_m.floor() as usize + 1;
            prop_assert_eq!(lap.grid_len(), expected_len);

            let session_time = lap.channels.get_floats(names::SESSION_TIME).unwrap();
            prop_assert!(session_time.windows(2).all(|w| w[1] > w[0]));
        }
    }
}
