//! Corner Detector (C4, spec §4.4).

use model::channel::names;
use model::{CornerSegment, CornerType, NormalisedLap, PresetConfig};

const SG_WINDOW: usize = 21;
const SG_ORDER: usize = 3;
const ENTRY_WALK_BOUND_M: usize = 250;
const EXIT_SUSTAIN_M: usize = 20;
const MIN_SEGMENT_SPAN_M: i64 = 40;
const STEERING_REVERSAL_DEG: f64 = 120.0;
const DERIVATIVE_EPSILON: f64 = 0.01;

/// Segments `lap` into `CornerSegment`s per `config`'s thresholds.
pub fn detect_corners(lap: &NormalisedLap, config: PresetConfig) -> Vec<CornerSegment> {
    let speed = lap.channels.get_floats(names::SPEED).unwrap_or_default();
    if speed.len() < SG_WINDOW {
        return Vec::new();
    }
    let brake = lap.channels.get_floats(names::BRAKE).unwrap_or_default();
    let throttle = lap.channels.get_floats(names::THROTTLE).unwrap_or_default();
    let steering = lap.channels.get_floats(names::STEERING_WHEEL_ANGLE).unwrap_or_default();

    let smoothed = savitzky_golay_smooth(&speed, SG_WINDOW, SG_ORDER);

    let apexes = find_apex_candidates(&smoothed, config.apex_speed_ceiling, config.min_corner_speed_drop);

    let mut raw_segments: Vec<RawSegment> = apexes
        .iter()
        .map(|&apex| {
            let entry = find_entry(&smoothed, &brake, apex, config.brake_threshold, ENTRY_WALK_BOUND_M);
            let exit = find_exit(&smoothed, &throttle, apex, config.throttle_threshold, EXIT_SUSTAIN_M);
            debug_assert!(entry < apex && apex < exit, "entry_m < apex_m < exit_m must hold: {entry} < {apex} < {exit}");
            RawSegment { entry, apex, exit, merged: false }
        })
        .collect();

    raw_segments.sort_by_key(|s| s.entry);
    let merged = merge_adjacent(raw_segments, &smoothed, config.merge_gap_m as i64);
    let filtered = filter_false_positives(merged, &smoothed, config.min_corner_speed_drop);

    filtered
        .into_iter()
        .enumerate()
        .map(|(i, seg)| {
            let corner_type =
                if seg.merged { CornerType::Chicane } else { classify(&seg, &smoothed, &brake, &steering) };
            CornerSegment {
                index: (i + 1) as u32,
                entry_m: seg.entry as i64,
                apex_m: seg.apex as i64,
                exit_m: seg.exit as i64,
                apex_speed: smoothed[seg.apex],
                corner_type,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct RawSegment {
    entry: usize,
    apex: usize,
    exit: usize,
    merged: bool,
}

fn find_apex_candidates(smoothed: &[f64], apex_speed_ceiling: f64, min_corner_speed_drop: f64) -> Vec<usize> {
    let n = smoothed.len();
    let mut apexes = Vec::new();
    for i in 1..n.saturating_sub(1) {
        let is_local_min = smoothed[i] <= smoothed[i - 1] && smoothed[i] <= smoothed[i + 1] && (smoothed[i] < smoothed[i - 1] || smoothed[i] < smoothed[i + 1]);
        if !is_local_min || smoothed[i] >= apex_speed_ceiling {
            continue;
        }
        let peak_before = local_max_before(smoothed, i);
        if peak_before - smoothed[i] >= min_corner_speed_drop {
            apexes.push(i);
        }
    }
    apexes
}

fn local_max_before(s: &[f64], i: usize) -> f64 {
    let mut j = i;
    while j > 0 && s[j - 1] >= s[j] {
        j -= 1;
    }
    s[j]
}

/// Walks backward from just before `apex`, so the result is always strictly
/// less than `apex` (entry_m < apex_m).
fn find_entry(smoothed: &[f64], brake: &[f64], apex: usize, brake_threshold: f64, bound_m: usize) -> usize {
    let floor = apex.saturating_sub(bound_m.max(1));
    let mut k = apex - 1;
    while k > floor {
        if brake.get(k).copied().unwrap_or(0.0) >= brake_threshold {
            return k;
        }
        if k > 0 {
            let derivative = smoothed[k] - smoothed[k - 1];
            if derivative > DERIVATIVE_EPSILON {
                return k;
            }
        }
        k -= 1;
    }
    floor
}

/// Walks forward from just after `apex`, so the result is always strictly
/// greater than `apex` (apex_m < exit_m). `find_apex_candidates` only ever
/// yields apexes in `1..n-1`, so `apex + 1` is always a valid index.
fn find_exit(smoothed: &[f64], throttle: &[f64], apex: usize, throttle_threshold: f64, sustain_m: usize) -> usize {
    let n = smoothed.len();
    let mut k = apex + 1;
    while k + 1 < n {
        if throttle.get(k).copied().unwrap_or(0.0) >= throttle_threshold {
            let end = (k + sustain_m).min(n - 1);
            if end > k && smoothed[k..=end].windows(2).all(|w| w[1] >= w[0]) {
                return k;
            }
        }
        k += 1;
    }
    n - 1
}

fn merge_adjacent(mut segments: Vec<RawSegment>, smoothed: &[f64], merge_gap_m: i64) -> Vec<RawSegment> {
    if segments.len() < 2 {
        return segments;
    }
    let mut merged: Vec<RawSegment> = Vec::with_capacity(segments.len());
    segments.sort_by_key(|s| s.entry);
    let mut current = segments[0];
    for next in segments.into_iter().skip(1) {
        let gap = next.entry as i64 - current.exit as i64;
        if gap <= merge_gap_m {
            let apex = if smoothed[current.apex] <= smoothed[next.apex] { current.apex } else { next.apex };
            current = RawSegment { entry: current.entry, apex, exit: next.exit, merged: true };
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}

fn filter_false_positives(segments: Vec<RawSegment>, smoothed: &[f64], min_corner_speed_drop: f64) -> Vec<RawSegment> {
    segments
        .into_iter()
        .filter(|s| {
            let drop = smoothed[s.entry] - smoothed[s.apex];
            let span = s.exit as i64 - s.entry as i64;
            drop >= min_corner_speed_drop && span >= MIN_SEGMENT_SPAN_M
        })
        .collect()
}

fn classify(seg: &RawSegment, smoothed: &[f64], brake: &[f64], steering: &[f64]) -> CornerType {
    let apex_speed = smoothed[seg.apex];
    let speed_drop = smoothed[seg.entry] - apex_speed;
    let span = (seg.exit - seg.entry) as i64;
    let peak_brake = brake[seg.entry..=seg.exit.min(brake.len().saturating_sub(1))].iter().cloned().fold(0.0, f64::max);
    let steering_reversal_deg = cumulative_steering_reversal_deg(&steering[seg.entry..=seg.exit.min(steering.len().saturating_sub(1))]);

    if apex_speed < 20.0 && steering_reversal_deg > STEERING_REVERSAL_DEG {
        CornerType::Hairpin
    } else if apex_speed > 40.0 && peak_brake < 0.2 {
        CornerType::Sweeper
    } else if peak_brake > 0.8 && speed_drop > 25.0 {
        CornerType::HeavyBraking
    } else if span < 80 && speed_drop < 6.0 {
        CornerType::Kink
    } else {
        CornerType::Unknown
    }
}

/// Sum of absolute steering changes across the segment, in degrees, taken as
/// a proxy for net direction reversal (spec §4.4 rule 7).
fn cumulative_steering_reversal_deg(steering_rad: &[f64]) -> f64 {
    steering_rad.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>().to_degrees()
}

/// Savitzky-Golay smoothing with a fixed window/order, clamped at the edges
/// (points within half the window of either end keep their raw value).
fn savitzky_golay_smooth(y: &[f64], window: usize, order: usize) -> Vec<f64> {
    let half = window / 2;
    let coefficients = savitzky_golay_coefficients(half, order);
    let n = y.len();
    let mut out = y.to_vec();
    for i in half..n.saturating_sub(half) {
        let mut acc = 0.0;
        for (offset, c) in coefficients.iter().enumerate() {
            acc += c * y[i - half + offset];
        }
        out[i] = acc;
    }
    out
}

/// Central-point smoothing coefficients for a degree-`order` polynomial
/// least-squares fit over a `2*half+1`-point window, via the normal
/// equations solved by Gauss-Jordan elimination.
fn savitzky_golay_coefficients(half: usize, order: usize) -> Vec<f64> {
    let window = 2 * half + 1;
    let basis = order + 1;

    // Design matrix A[point][power] = (point - half)^power.
    let mut a = vec![vec![0.0; basis]; window];
    for p in 0..window {
        let x = p as f64 - half as f64;
        let mut power = 1.0;
        for j in 0..basis {
            a[p][j] = power;
            power *= x;
        }
    }

    // Normal matrix ata = A^T A (basis x basis).
    let mut ata = vec![vec![0.0; basis]; basis];
    for i in 0..basis {
        for j in 0..basis {
            ata[i][j] = (0..window).map(|p| a[p][i] * a[p][j]).sum();
        }
    }

    let ata_inv = invert_square_matrix(ata);

    // Coefficient for window point p is row 0 of (A^T A)^-1 A^T, i.e. the
    // weight contributing to the constant term (the fitted value at x=0).
    (0..window)
        .map(|p| (0..basis).map(|j| ata_inv[0][j] * a[p][j]).sum())
        .collect()
}

/// Gauss-Jordan elimination. `m` is assumed square and non-singular — true
/// for the Vandermonde-derived normal matrix at these fixed window/order
/// sizes.
fn invert_square_matrix(mut m: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let n = m.len();
    let mut inv = vec![vec![0.0; n]; n];
    for i in 0..n {
        inv[i][i] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| m[a][col].abs().partial_cmp(&m[b][col].abs()).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(col);
        m.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = m[col][col];
        for v in m[col].iter_mut() {
            *v /= pivot;
        }
        for v in inv[col].iter_mut() {
            *v /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                m[row][k] -= factor * m[col][k];
                inv[row][k] -= factor * inv[col][k];
            }
        }
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ChannelTable, ChannelValues};

    fn synthetic_lap(speed: Vec<f64>, brake: Vec<f64>, throttle: Vec<f64>) -> NormalisedLap {
        let n = speed.len();
        let mut t = ChannelTable::new(n);
        t.insert(names::SPEED, ChannelValues::Float(speed));
        t.insert(names::BRAKE, ChannelValues::Float(brake));
        t.insert(names::THROTTLE, ChannelValues::Float(throttle));
        t.insert(names::STEERING_WHEEL_ANGLE, ChannelValues::Float(vec![0.0; n]));
        NormalisedLap { lap_number: 1, lap_time_s: 90.0, channels: t }
    }

    #[test]
    fn flat_speed_trace_has_no_corners() {
        let speed = vec![50.0; 500];
        let brake = vec![0.0; 500];
        let throttle = vec![1.0; 500];
        let lap = synthetic_lap(speed, brake, throttle);
        let segments = detect_corners(&lap, model::Preset::Road.config());
        assert!(segments.is_empty());
    }

    #[test]
    fn single_braking_zone_is_detected() {
        let n = 500;
        let mut speed = vec![60.0; n];
        let mut brake = vec![0.0; n];
        let mut throttle = vec![1.0; n];
        for i in 150..250 {
            let t = (i - 150) as f64 / 100.0;
            speed[i] = 60.0 - 40.0 * (1.0 - (t - 0.5).abs() * 2.0).max(0.0);
        }
        for i in 120..200 {
            speed[i] = speed[i].min(60.0 - (i as f64 - 120.0) * 0.5);
            brake[i] = 0.3;
            throttle[i] = 0.0;
        }
        for i in 200..260 {
            throttle[i] = 1.0;
        }
        let apex = (150..250).min_by(|&a, &b| speed[a].partial_cmp(&speed[b]).unwrap()).unwrap();
        let min_speed = speed[apex];
        assert!(min_speed < 60.0 - 3.0);

        let lap = synthetic_lap(speed, brake, throttle);
        let segments = detect_corners(&lap, model::Preset::Road.config());
        assert!(!segments.is_empty());
        let first = &segments[0];
        assert!(first.entry_m < first.apex_m);
        assert!(first.apex_m < first.exit_m);
    }

    #[test]
    fn merge_adjacent_joins_segments_within_gap_and_marks_them_merged() {
        let smoothed = vec![50.0; 400];
        let a = RawSegment { entry: 100, apex: 110, exit: 120, merged: false };
        let b = RawSegment { entry: 140, apex: 150, exit: 160, merged: false };

        let merged = merge_adjacent(vec![a, b], &smoothed, 30);

        assert_eq!(merged.len(), 1);
        assert!(merged[0].merged);
        assert_eq!(merged[0].entry, 100);
        assert_eq!(merged[0].exit, 160);
    }

    #[test]
    fn merge_adjacent_leaves_distant_segments_separate_and_unmerged() {
        let smoothed = vec![50.0; 400];
        let a = RawSegment { entry: 100, apex: 110, exit: 120, merged: false };
        let b = RawSegment { entry: 200, apex: 210, exit: 220, merged: false };

        let merged = merge_adjacent(vec![a, b], &smoothed, 30);

        assert_eq!(merged.len(), 2);
        assert!(!merged[0].merged);
        assert!(!merged[1].merged);
    }

    #[test]
    fn find_exit_never_returns_the_apex_itself() {
        // Throttle is already above threshold and speed already rising at
        // the apex sample — find_exit must still walk forward at least one
        // point rather than returning `apex` unchanged.
        let smoothed = vec![40.0, 35.0, 30.0, 32.0, 34.0, 36.0, 38.0, 40.0, 40.0, 40.0];
        let throttle = vec![1.0; 10];
        let apex = 2;
        let exit = find_exit(&smoothed, &throttle, apex, 0.9, 3);
        assert!(exit > apex, "exit ({exit}) must be strictly after apex ({apex})");
    }

    #[test]
    fn find_entry_never_returns_the_apex_itself() {
        let smoothed = vec![40.0, 35.0, 30.0, 32.0, 34.0, 36.0, 38.0];
        let brake = vec![1.0; 7];
        let apex = 2;
        let entry = find_entry(&smoothed, &brake, apex, 0.1, 250);
        assert!(entry < apex, "entry ({entry}) must be strictly before apex ({apex})");
    }

    #[test]
    fn savitzky_golay_preserves_a_straight_line() {
        let y: Vec<f64> = (0..100).map(|i| i as f64 * 2.0 + 5.0).collect();
        let smoothed = savitzky_golay_smooth(&y, 21, 3);
        for i in 15..85 {
            assert!((smoothed[i] - y[i]).abs() < 1e-6, "index {i}: {} vs {}", smoothed[i], y[i]);
        }
    }
}
