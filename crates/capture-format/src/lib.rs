//! Binary decoder for vendor telemetry capture files (C1, spec §4.1, §6).
//!
//! Four regions in order: a 112-byte fixed header, a 32-byte disk
//! sub-header, a textual session-metadata document, and channel descriptor
//! records followed by the sample matrix.

pub mod descriptor;
pub mod header;
pub mod metadata;
pub mod parser;

pub use header::{CaptureHeader, CHANNEL_DESCRIPTOR_LEN, HEADER_LEN, SUB_HEADER_LEN};
pub use parser::{parse_capture, CaptureParser};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod tests {
    use model::channel::names;
    use model::{AnalysisError, ChannelValues};

    use super::*;
    use crate::test_support::CaptureBuilder;

    #[test]
    fn round_trips_session_metadata() {
        let bytes = CaptureBuilder::new().build();
        let cap = parse_capture(&bytes, &[names::SPEED]).unwrap();
        assert_eq!(cap.session.track_id, "219");
        assert_eq!(cap.session.track_name, "Mount Panorama Circuit");
        assert_eq!(cap.session.track_length_m, 6213.0);
        assert_eq!(cap.session.sample_hz, 60.0);
    }

    #[test]
    fn decoding_same_channel_twice_is_identical() {
        let bytes = CaptureBuilder::new().build();
        let parser = CaptureParser::open(&bytes).unwrap();
        let a = parser.decode_channel(names::SPEED).unwrap();
        let b = parser.decode_channel(names::SPEED).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn decodes_bool_int_and_float_channels() {
        let bytes = CaptureBuilder::new().build();
        let parser = CaptureParser::open(&bytes).unwrap();

        match parser.decode_channel(names::ON_PIT_ROAD).unwrap() {
            ChannelValues::Bool(v) => assert_eq!(v.len(), 5),
            other => panic!("expected bool channel, got {other:?}"),
        }
        match parser.decode_channel(names::LAP).unwrap() {
            ChannelValues::Int(v) => assert_eq!(v, vec![0, 0, 0, 1, 1]),
            other => panic!("expected int channel, got {other:?}"),
        }
        match parser.decode_channel(names::SPEED).unwrap() {
            ChannelValues::Float(v) => assert_eq!(v.len(), 5),
            other => panic!("expected float channel, got {other:?}"),
        }
    }

    #[test]
    fn missing_channel_is_reported() {
        let bytes = CaptureBuilder::new().build();
        let err = parse_capture(&bytes, &["NotAChannel"]).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingChannel(name) if name == "NotAChannel"));
    }

    #[test]
    fn truncated_file_is_malformed() {
        let bytes = CaptureBuilder::new().build();
        let err = parse_capture(&bytes[..64], &[names::SPEED]).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedCapture(_)));
    }

    #[test]
    fn unsupported_type_code_is_reported() {
        let bytes = CaptureBuilder::new().with_bad_type_code().build();
        let err = parse_capture(&bytes, &[names::SPEED]).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedChannelType { .. }));
    }
}
