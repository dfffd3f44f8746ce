//! Synthesises minimal, valid capture byte buffers for unit tests across
//! the workspace (enabled via the `test-support` feature).

use byteorder::{LittleEndian, WriteBytesExt};

use crate::header::{CHANNEL_DESCRIPTOR_LEN, HEADER_LEN, SUB_HEADER_LEN};

const METADATA_YAML: &str = r#"
WeekendInfo:
  TrackID: "219"
  TrackDisplayName: Mount Panorama Circuit
  TrackLengthKm: 6.213
DriverInfo:
  DriverCarIdx: 0
  Drivers:
    - UserID: "123"
      UserName: Test Driver
      CarID: "45"
      CarScreenName: Test Car
"#;

enum Column {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    Bool(Vec<bool>),
}

impl Column {
    fn type_code(&self) -> u32 {
        match self {
            Column::Bool(_) => 1,
            Column::I32(_) => 2,
            Column::F32(_) => 4,
            Column::F64(_) => 8, // unsupported placeholder, never emitted as-is
        }
    }

    fn size(&self) -> usize {
        match self {
            Column::Bool(_) => 1,
            Column::I32(_) => 4,
            Column::F32(_) => 4,
            Column::F64(_) => 8,
        }
    }

    fn write_row(&self, row: &mut [u8], i: usize, offset: usize) {
        match self {
            Column::Bool(v) => row[offset] = v[i] as u8,
            Column::I32(v) => row[offset..offset + 4].copy_from_slice(&v[i].to_le_bytes()),
            Column::F32(v) => row[offset..offset + 4].copy_from_slice(&v[i].to_le_bytes()),
            Column::F64(v) => row[offset..offset + 8].copy_from_slice(&v[i].to_le_bytes()),
        }
    }
}

struct Field {
    name: &'static str,
    column: Column,
}

pub struct CaptureBuilder {
    bad_type_code: bool,
}

impl CaptureBuilder {
    pub fn new() -> Self {
        Self { bad_type_code: false }
    }

    pub fn with_bad_type_code(mut self) -> Self {
        self.bad_type_code = true;
        self
    }

    /// Five samples, laps `[0, 0, 0, 1, 1]`, covering every channel name
    /// the pipeline requires (spec §3). Most non-speed channels carry flat
    /// placeholder data — callers that need a richer trace should decode
    /// and overwrite the channels they care about.
    pub fn build(self) -> Vec<u8> {
        use model::channel::names;

        let speeds = vec![50.0f32, 55.0, 60.0, 52.0, 58.0];
        let laps = vec![0i32, 0, 0, 1, 1];
        let n = speeds.len();

        let mut fields = vec![
            Field { name: names::SPEED, column: Column::F32(speeds) },
            Field { name: names::THROTTLE, column: Column::F32(vec![0.5; n]) },
            Field { name: names::BRAKE, column: Column::F32(vec![0.0; n]) },
            Field { name: names::STEERING_WHEEL_ANGLE, column: Column::F32(vec![0.0; n]) },
            Field { name: names::LAT, column: Column::F32(vec![0.0; n]) },
            Field { name: names::LON, column: Column::F32(vec![0.0; n]) },
            Field { name: names::ALT, column: Column::F32(vec![0.0; n]) },
            Field { name: names::LAP, column: Column::I32(laps) },
            Field { name: names::LAP_CURRENT_LAP_TIME, column: Column::F32((0..n as i32).map(|i| i as f32 * 0.1).collect()) },
            Field { name: names::LAP_DIST, column: Column::F32((0..n as i32).map(|i| i as f32 * 10.0).collect()) },
            Field { name: names::LAP_DIST_PCT, column: Column::F32(vec![0.0; n]) },
            Field { name: names::SESSION_TIME, column: Column::F32((0..n as i32).map(|i| i as f32 * 0.1).collect()) },
            Field { name: names::SESSION_TICK, column: Column::I32((0..n as i32).collect()) },
            Field { name: names::RPM, column: Column::F32(vec![5000.0; n]) },
            Field { name: names::GEAR, column: Column::I32(vec![3; n]) },
            Field { name: names::PLAYER_TRACK_SURFACE, column: Column::I32(vec![0; n]) },
            Field { name: names::PLAYER_CAR_MY_INCIDENT_COUNT, column: Column::I32(vec![0; n]) },
            Field { name: names::ON_PIT_ROAD, column: Column::Bool(vec![false; n]) },
        ];

        let mut offset = 0usize;
        let offsets: Vec<usize> = fields
            .iter()
            .map(|f| {
                let o = offset;
                offset += f.column.size();
                o
            })
            .collect();
        let row_width = offset;

        let metadata = METADATA_YAML.as_bytes();
        let metadata_offset = (HEADER_LEN + SUB_HEADER_LEN) as u32;
        let metadata_length = metadata.len() as u32;
        let descriptor_table_offset = metadata_offset as usize + metadata_length as usize;
        let descriptors_len = fields.len() * CHANNEL_DESCRIPTOR_LEN;
        let sample_matrix_offset = (descriptor_table_offset + descriptors_len) as u32;
        let num_samples = n as u32;

        let mut buf = Vec::new();

        buf.extend_from_slice(b"RCAP");
        buf.write_u32::<LittleEndian>(1).unwrap();
        buf.write_u32::<LittleEndian>(fields.len() as u32).unwrap();
        buf.write_u32::<LittleEndian>(metadata_offset).unwrap();
        buf.write_u32::<LittleEndian>(metadata_length).unwrap();
        buf.write_u32::<LittleEndian>(sample_matrix_offset).unwrap();
        buf.write_u32::<LittleEndian>(row_width as u32).unwrap();
        buf.write_u32::<LittleEndian>(num_samples).unwrap();
        buf.write_u32::<LittleEndian>(60).unwrap();
        buf.resize(HEADER_LEN, 0);

        buf.resize(HEADER_LEN + SUB_HEADER_LEN, 0);

        buf.extend_from_slice(metadata);

        for (f, &field_offset) in fields.iter().zip(&offsets) {
            let start = buf.len();
            let mut type_code = f.column.type_code();
            if f.column.type_code() == 8 {
                type_code = 5; // double, spec §6 code 5
            }
            if self.bad_type_code && f.name == names::SPEED {
                type_code = 99;
            }
            buf.write_u32::<LittleEndian>(type_code).unwrap();
            buf.write_u32::<LittleEndian>(field_offset as u32).unwrap();
            buf.write_u32::<LittleEndian>(1).unwrap(); // count
            let mut name_buf = [0u8; 60];
            name_buf[..f.name.len()].copy_from_slice(f.name.as_bytes());
            buf.extend_from_slice(&name_buf);
            buf.extend_from_slice(&[0u8; 32]); // unit
            buf.extend_from_slice(&[0u8; 40]); // description
            debug_assert_eq!(buf.len() - start, CHANNEL_DESCRIPTOR_LEN);
        }

        for i in 0..n {
            let mut row = vec![0u8; row_width];
            for (f, &field_offset) in fields.iter_mut().zip(&offsets) {
                f.column.write_row(&mut row, i, field_offset);
            }
            buf.extend_from_slice(&row);
        }
        let _ = &mut fields; // rows already written above via iter_mut borrow

        buf
    }
}
