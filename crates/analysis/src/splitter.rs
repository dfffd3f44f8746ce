//! Lap Splitter (C2, spec §4.2).

use model::channel::names;
use model::{ChannelValues, RawLap, Result};

/// Slices `channels` into contiguous `RawLap`s keyed by the `Lap` channel.
/// A break occurs at any index `i` where `Lap[i] != Lap[i-1]`. The first
/// and last laps (out-lap/in-lap) are retained; excluding them is a policy
/// of the Analyser (C8), not this splitter.
pub fn split_laps(channels: &model::ChannelTable) -> Result<Vec<RawLap>> {
    let lap_channel = channels.get(names::LAP)?;
    let lap_ints: Vec<i64> = match lap_channel {
        ChannelValues::Int(v) => v.clone(),
        other => other.as_floats().iter().map(|f| f.round() as i64).collect(),
    };

    let mut laps = Vec::new();
    if lap_ints.is_empty() {
        return Ok(laps);
    }

    let mut start = 0;
    for i in 1..lap_ints.len() {
        if lap_ints[i] != lap_ints[i - 1] {
            laps.push(RawLap { lap_number: lap_ints[start], channels: channels.slice(start, i) });
            start = i;
        }
    }
    laps.push(RawLap { lap_number: lap_ints[start], channels: channels.slice(start, lap_ints.len()) });
    Ok(laps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ChannelTable;

    fn table_with_laps(lap_values: &[i64]) -> ChannelTable {
        let mut t = ChannelTable::new(lap_values.len());
        t.insert(names::LAP, ChannelValues::Int(lap_values.to_vec()));
        t
    }

    #[test]
    fn splits_on_lap_value_changes() {
        let t = table_with_laps(&[0, 0, 0, 1, 1, 2, 2, 2]);
        let laps = split_laps(&t).unwrap();
        assert_eq!(laps.len(), 3);
        assert_eq!(laps[0].lap_number, 0);
        assert_eq!(laps[0].channels.len, 3);
        assert_eq!(laps[1].lap_number, 1);
        assert_eq!(laps[1].channels.len, 2);
        assert_eq!(laps[2].lap_number, 2);
        assert_eq!(laps[2].channels.len, 3);
    }

    #[test]
    fn single_lap_capture_yields_one_raw_lap() {
        let t = table_with_laps(&[5, 5, 5, 5]);
        let laps = split_laps(&t).unwrap();
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].lap_number, 5);
    }

    #[test]
    fn missing_lap_channel_is_reported() {
        let t = ChannelTable::new(3);
        assert!(split_laps(&t).is_err());
    }
}
