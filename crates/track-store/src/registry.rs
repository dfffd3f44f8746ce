//! Corner Registry (C6, spec §4.6): matches detected `CornerSegment`s
//! against persisted `CornerRecord`s for a track.

use model::{CornerRecord, CornerSegment, NamedSegment};

/// Apex must fall within this many metres of a record's span to match by
/// proximity when no interval overlap exists (spec §4.6).
const APEX_PROXIMITY_TOLERANCE_M: i64 = 50;

/// Matches each `segment` against at most one `record`, preferring the
/// record with the largest interval overlap; falls back to apex proximity
/// when no record overlaps at all. Matching is greedy longest-overlap-first
/// so a record already claimed by a better-overlapping segment cannot be
/// reused by a worse one (spec §4.6 invariant: each segment and each record
/// matches at most once).
pub fn match_corners(segments: &[CornerSegment], records: &[CornerRecord]) -> Vec<NamedSegment> {
    let mut candidates: Vec<(usize, usize, i64)> = Vec::new();
    for (si, seg) in segments.iter().enumerate() {
        for (ri, rec) in records.iter().enumerate() {
            let overlap = interval_overlap(seg.entry_m, seg.exit_m, rec.distance_start_m as i64, rec.distance_end_m as i64);
            if overlap > 0 {
                candidates.push((si, ri, overlap));
            }
        }
    }
    candidates.sort_by(|a, b| b.2.cmp(&a.2));

    let mut segment_taken = vec![false; segments.len()];
    let mut record_taken = vec![false; records.len()];
    let mut matched_record_for: Vec<Option<usize>> = vec![None; segments.len()];

    for (si, ri, _) in candidates {
        if segment_taken[si] || record_taken[ri] {
            continue;
        }
        segment_taken[si] = true;
        record_taken[ri] = true;
        matched_record_for[si] = Some(ri);
    }

    // Apex-proximity fallback for segments that found no overlapping record.
    let mut proximity: Vec<(usize, usize, i64)> = Vec::new();
    for (si, seg) in segments.iter().enumerate() {
        if segment_taken[si] {
            continue;
        }
        for (ri, rec) in records.iter().enumerate() {
            if record_taken[ri] {
                continue;
            }
            let apex_distance = apex_distance_to_span(seg.apex_m, rec.distance_start_m as i64, rec.distance_end_m as i64);
            if apex_distance <= APEX_PROXIMITY_TOLERANCE_M {
                proximity.push((si, ri, apex_distance));
            }
        }
    }
    proximity.sort_by_key(|(_, _, d)| *d);
    for (si, ri, _) in proximity {
        if segment_taken[si] || record_taken[ri] {
            continue;
        }
        segment_taken[si] = true;
        record_taken[ri] = true;
        matched_record_for[si] = Some(ri);
    }

    segments
        .iter()
        .enumerate()
        .map(|(si, seg)| {
            let matched = matched_record_for[si].map(|ri| &records[ri]);
            NamedSegment {
                segment: seg.clone(),
                corner_name: matched.map(|r| r.name.clone()),
                corner_number: matched.map(|r| r.number),
            }
        })
        .collect()
}

fn interval_overlap(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> i64 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0)
}

fn apex_distance_to_span(apex: i64, start: i64, end: i64) -> i64 {
    if apex < start {
        start - apex
    } else if apex > end {
        apex - end
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::CornerType;

    fn seg(index: u32, entry_m: i64, apex_m: i64, exit_m: i64) -> CornerSegment {
        CornerSegment { index, entry_m, apex_m, exit_m, apex_speed: 40.0, corner_type: CornerType::Unknown }
    }

    fn rec(number: u32, name: &str, start: f64, end: f64) -> CornerRecord {
        CornerRecord {
            track_id: "219".into(),
            number,
            name: name.to_string(),
            distance_start_m: start,
            distance_end_m: end,
            corner_type: CornerType::Unknown,
            notes: String::new(),
        }
    }

    #[test]
    fn overlapping_segment_matches_its_record() {
        let segments = vec![seg(1, 2100, 2200, 2300)];
        let records = vec![rec(2, "McPhillamy Park", 2150.0, 2320.0)];
        let named = match_corners(&segments, &records);
        assert_eq!(named[0].corner_name.as_deref(), Some("McPhillamy Park"));
        assert_eq!(named[0].corner_number, Some(2));
    }

    #[test]
    fn no_overlap_and_no_proximity_stays_unnamed() {
        let segments = vec![seg(1, 100, 150, 200)];
        let records = vec![rec(1, "Far Away", 5000.0, 5200.0)];
        let named = match_corners(&segments, &records);
        assert!(named[0].corner_name.is_none());
    }

    #[test]
    fn apex_proximity_fallback_within_tolerance() {
        let segments = vec![seg(1, 900, 1000, 1100)];
        let records = vec![rec(1, "Turn 1", 1120.0, 1200.0)];
        let named = match_corners(&segments, &records);
        assert_eq!(named[0].corner_name.as_deref(), Some("Turn 1"));
    }

    #[test]
    fn apex_proximity_outside_tolerance_stays_unnamed() {
        let segments = vec![seg(1, 900, 1000, 1100)];
        let records = vec![rec(1, "Turn 1", 1200.0, 1300.0)];
        let named = match_corners(&segments, &records);
        assert!(named[0].corner_name.is_none());
    }

    #[test]
    fn each_record_matches_at_most_once_longest_overlap_wins() {
        let segments = vec![seg(1, 1000, 1100, 1300), seg(2, 1050, 1150, 1250)];
        let records = vec![rec(1, "Hairpin", 1000.0, 1300.0)];
        let named = match_corners(&segments, &records);
        let named_count = named.iter().filter(|n| n.corner_name.is_some()).count();
        assert_eq!(named_count, 1);
        // segment 1 has the larger overlap (full 300m vs 200m) and should win it
        assert_eq!(named[0].corner_name.as_deref(), Some("Hairpin"));
        assert!(named[1].corner_name.is_none());
    }
}
