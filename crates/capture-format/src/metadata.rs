use model::{AnalysisError, Result, SessionMeta};
use serde::Deserialize;

/// Session metadata document: textual, UTF-8, structured with nested
/// sections (spec §4.1, §6). Mirrors the YAML session-info blob real sim
/// telemetry captures embed, parsed with the same `serde_yaml_ng` stack
/// `pitwall`'s `SessionInfo::parse` uses for iRacing's equivalent document.
#[derive(Debug, Deserialize)]
struct MetadataDoc {
    #[serde(rename = "WeekendInfo")]
    weekend_info: WeekendInfo,
    #[serde(rename = "DriverInfo")]
    driver_info: DriverInfo,
}

#[derive(Debug, Deserialize)]
struct WeekendInfo {
    #[serde(rename = "TrackID")]
    track_id: String,
    #[serde(rename = "TrackDisplayName")]
    track_display_name: String,
    #[serde(rename = "TrackLengthKm")]
    track_length_km: f64,
}

#[derive(Debug, Deserialize)]
struct DriverInfo {
    #[serde(rename = "DriverCarIdx")]
    driver_car_idx: usize,
    #[serde(rename = "Drivers")]
    drivers: Vec<DriverEntry>,
}

#[derive(Debug, Deserialize)]
struct DriverEntry {
    #[serde(rename = "UserID")]
    user_id: String,
    #[serde(rename = "UserName")]
    user_name: String,
    #[serde(rename = "CarID")]
    car_id: String,
    #[serde(rename = "CarScreenName")]
    car_screen_name: String,
}

/// Parses the textual metadata document and the header's tick rate into a
/// `SessionMeta` (track name/id/length in metres, car name/id, driver
/// name/id, sample frequency — spec §4.1).
pub fn parse_metadata(bytes: &[u8], tick_rate_hz: f64) -> Result<SessionMeta> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AnalysisError::MalformedCapture(format!("metadata document not UTF-8: {e}")))?;
    let doc: MetadataDoc = serde_yaml_ng::from_str(text)
        .map_err(|e| AnalysisError::MalformedCapture(format!("metadata document parse error: {e}")))?;

    let driver = doc
        .driver_info
        .drivers
        .get(doc.driver_info.driver_car_idx)
        .ok_or_else(|| AnalysisError::MalformedCapture("DriverCarIdx out of range".into()))?;

    Ok(SessionMeta {
        track_id: doc.weekend_info.track_id,
        track_name: doc.weekend_info.track_display_name,
        track_length_m: doc.weekend_info.track_length_km * 1000.0,
        car_id: driver.car_id.clone(),
        car_name: driver.car_screen_name.clone(),
        driver_id: driver.user_id.clone(),
        driver_name: driver.user_name.clone(),
        sample_hz: tick_rate_hz,
    })
}
