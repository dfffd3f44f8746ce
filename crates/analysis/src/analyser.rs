//! Analyser (C8, spec §4.8): orchestrates C1-C7 for one capture file.

use model::channel::names;
use model::{
    AnalysisError, CoachingPayload, ConsistencyFinding, ConsistencyThresholds, NormalisedLap, Preset, Result,
};
use tokio_util::sync::CancellationToken;
use track_store::{match_corners, LandmarksDataset, TrackStore};
use tracing::{debug, info, warn};

use crate::comparator::{compare_corner, diagnose, theoretical_best};
use crate::detector::detect_corners;
use crate::normaliser::normalise_lap;
use crate::splitter::split_laps;

/// Every channel the pipeline reads from the decoded capture (spec §3).
pub const REQUIRED_CHANNELS: &[&str] = &[
    names::SPEED,
    names::THROTTLE,
    names::BRAKE,
    names::STEERING_WHEEL_ANGLE,
    names::LAT,
    names::LON,
    names::ALT,
    names::LAP,
    names::LAP_CURRENT_LAP_TIME,
    names::LAP_DIST,
    names::LAP_DIST_PCT,
    names::SESSION_TIME,
    names::SESSION_TICK,
    names::RPM,
    names::GEAR,
    names::PLAYER_TRACK_SURFACE,
    names::PLAYER_CAR_MY_INCIDENT_COUNT,
    names::ON_PIT_ROAD,
];

/// Laps slower than `PACE_FILTER_MULTIPLIER` times the session's fastest
/// surviving lap are treated as disrupted and excluded (spec §4.8).
const PACE_FILTER_MULTIPLIER: f64 = 1.10;
const PRIORITY_CORNER_COUNT: usize = 3;

/// End-to-end entry point: decoded capture bytes in, `CoachingPayload` out
/// (spec §6). `preset` forces a corner-detector preset; omit to derive it
/// from the track's persisted `track_type` (defaulting to `road`, §9).
pub fn analyse(
    capture_bytes: &[u8],
    track_store: &TrackStore,
    preset: Option<Preset>,
    thresholds: ConsistencyThresholds,
    cancel: &CancellationToken,
) -> Result<CoachingPayload> {
    let capture = capture_format::parse_capture(capture_bytes, REQUIRED_CHANNELS)?;
    check_cancelled(cancel)?;

    let raw_laps = split_laps(&capture.channels)?;
    debug!(raw_laps = raw_laps.len(), "split capture into raw laps");

    let mut survivors: Vec<NormalisedLap> = Vec::new();
    for raw in &raw_laps {
        match normalise_lap(raw, capture.session.track_length_m) {
            Ok(lap) => survivors.push(lap),
            Err(reason) => debug!(lap_number = raw.lap_number, %reason, "rejected raw lap"),
        }
    }
    check_cancelled(cancel)?;

    if survivors.is_empty() {
        return Err(AnalysisError::NoUsableLap("no lap survived normalisation".into()));
    }
    let session_min_time = survivors.iter().map(|l| l.lap_time_s).fold(f64::INFINITY, f64::min);
    survivors.retain(|l| l.lap_time_s <= session_min_time * PACE_FILTER_MULTIPLIER);

    if survivors.len() < 2 {
        return Err(AnalysisError::NoUsableLap(format!(
            "{} lap(s) survived normalisation and the pace filter, need at least 2",
            survivors.len()
        )));
    }

    let reference_idx = survivors
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.lap_time_s.partial_cmp(&b.1.lap_time_s).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let candidate_idx = median_index_by_time(&survivors, reference_idx);

    let reference = &survivors[reference_idx];
    let candidate = &survivors[candidate_idx];

    let track_id = capture.session.track_id.clone();
    let effective_preset = preset.unwrap_or_else(|| {
        match track_store.get_track(&track_id) {
            Ok(Some(track)) => Preset::from_track_type(Some(track.track_type)),
            Ok(None) => Preset::from_track_type(None),
            Err(e) => {
                warn!(error = %e, "track store unavailable while selecting preset, defaulting to road");
                Preset::from_track_type(None)
            }
        }
    });

    let segments = detect_corners(reference, effective_preset.config());
    check_cancelled(cancel)?;
    info!(segments = segments.len(), preset = ?effective_preset, "detected corner segments on reference lap");

    ensure_track_named(track_store, &track_id);
    let records = track_store.list_corners(&track_id).unwrap_or_else(|e| {
        warn!(error = %e, "track store read failed, segments remain unnamed");
        Vec::new()
    });
    let named_segments = match_corners(&segments, &records);

    let mut deltas = Vec::with_capacity(named_segments.len());
    for named in &named_segments {
        check_cancelled(cancel)?;
        deltas.push(compare_corner(candidate, reference, named));
    }

    let all_segments: Vec<_> = segments.clone();
    let theoretical = theoretical_best(&survivors, &all_segments);

    let mut ranked: Vec<usize> = (0..deltas.len()).collect();
    ranked.sort_by(|&a, &b| {
        let ta = deltas[a].time_delta_s.map(f64::abs).unwrap_or(0.0);
        let tb = deltas[b].time_delta_s.map(f64::abs).unwrap_or(0.0);
        tb.partial_cmp(&ta).unwrap_or(std::cmp::Ordering::Equal)
    });

    let priority_corners = ranked
        .into_iter()
        .filter(|&i| deltas[i].time_delta_s.is_some())
        .take(PRIORITY_CORNER_COUNT)
        .map(|i| {
            let delta = deltas[i].clone();
            let corner_number = delta.corner_number.unwrap_or(named_segments[i].segment.index);
            model::PriorityCorner {
                corner_name: delta.corner_name.clone(),
                corner_number,
                time_lost_s: delta.time_delta_s.unwrap_or(0.0),
                diagnosis: diagnose(candidate, reference, &delta),
                delta,
            }
        })
        .collect();

    let consistency = consistency_findings(&survivors, &all_segments, &named_segments, reference_idx, thresholds);

    Ok(CoachingPayload {
        session: capture.session,
        reference_lap_time_s: reference.lap_time_s,
        theoretical_best: theoretical,
        priority_corners,
        consistency,
        reference_segments: named_segments,
    })
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(AnalysisError::Cancelled)
    } else {
        Ok(())
    }
}

/// Seeds named corners from the built-in landmarks dataset if the track has
/// none yet. Never fatal: logged and skipped on failure (spec §4.5, §7).
fn ensure_track_named(track_store: &TrackStore, track_id: &str) {
    match track_store.has_named_corners(track_id) {
        Ok(true) => {}
        Ok(false) => {
            let dataset = LandmarksDataset::built_in();
            if let Err(e) = track_store.seed_track_if_needed(track_id, &dataset) {
                warn!(error = %e, track_id, "landmarks seeding failed, proceeding without named corners");
            }
        }
        Err(e) => warn!(error = %e, track_id, "could not check named-corner state"),
    }
}

/// Index of the survivor whose lap time is the median of the set, excluding
/// `reference_idx` when the set size is even so candidate != reference.
fn median_index_by_time(laps: &[NormalisedLap], reference_idx: usize) -> usize {
    let mut order: Vec<usize> = (0..laps.len()).filter(|&i| i != reference_idx).collect();
    if order.is_empty() {
        return reference_idx;
    }
    order.sort_by(|&a, &b| laps[a].lap_time_s.partial_cmp(&laps[b].lap_time_s).unwrap_or(std::cmp::Ordering::Equal));
    order[order.len() / 2]
}

fn consistency_findings(
    laps: &[NormalisedLap],
    segments: &[model::CornerSegment],
    named_segments: &[model::NamedSegment],
    reference_idx: usize,
    thresholds: ConsistencyThresholds,
) -> Vec<ConsistencyFinding> {
    let reference = &laps[reference_idx];
    let mut findings = Vec::with_capacity(segments.len());

    for (seg_idx, seg) in segments.iter().enumerate() {
        let times: Vec<f64> = laps
            .iter()
            .filter_map(|lap| corner_interval_time(lap, seg))
            .collect();
        if times.len() < 2 {
            continue;
        }
        let reference_time = corner_interval_time(reference, seg).unwrap_or(0.0);

        let mean = times.iter().sum::<f64>() / times.len() as f64;
        let variance = times.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>() / times.len() as f64;
        let std_dev_s = variance.sqrt();
        let mean_delta_s = mean - reference_time;

        let consistency_issue = std_dev_s > thresholds.std_dev_s;
        let technique_issue = !consistency_issue && mean_delta_s > thresholds.mean_delta_s;

        findings.push(ConsistencyFinding {
            corner_number: named_segments[seg_idx].corner_number.unwrap_or(seg.index),
            corner_name: named_segments[seg_idx].corner_name.clone(),
            std_dev_s,
            mean_delta_s,
            consistency_issue,
            technique_issue,
        });
    }
    findings
}

fn corner_interval_time(lap: &NormalisedLap, seg: &model::CornerSegment) -> Option<f64> {
    let session_time = lap.channels.get_floats(names::SESSION_TIME).ok()?;
    let entry = seg.entry_m.max(0) as usize;
    let exit = seg.exit_m.max(0) as usize;
    if exit >= session_time.len() || entry >= session_time.len() {
        return None;
    }
    let dt = session_time[exit] - session_time[entry];
    (dt >= 0.0).then_some(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_format::test_support::CaptureBuilder;

    #[test]
    fn single_lap_capture_is_no_usable_lap() {
        let bytes = CaptureBuilder::new().build();
        let store = TrackStore::in_memory().unwrap();
        let cancel = CancellationToken::new();
        let result = analyse(&bytes, &store, None, ConsistencyThresholds::default(), &cancel);
        assert!(matches!(result, Err(AnalysisError::NoUsableLap(_))));
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let bytes = CaptureBuilder::new().build();
        let store = TrackStore::in_memory().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = analyse(&bytes, &store, None, ConsistencyThresholds::default(), &cancel);
        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }
}
