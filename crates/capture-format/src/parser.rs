use std::collections::HashMap;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use model::{AnalysisError, Capture, ChannelTable, ChannelType, ChannelValues, Result};
use tracing::{debug, trace};

use crate::descriptor::{self, ChannelDescriptor};
use crate::header::{CaptureHeader, CHANNEL_DESCRIPTOR_LEN};
use crate::metadata;

/// Parsed capture file, channels decoded lazily on request.
///
/// Holds a borrow of the raw bytes so decoding a channel is one
/// `chunks_exact(stride)` pass over its column — no per-sample re-scan of
/// the file (spec §4.1).
pub struct CaptureParser<'a> {
    bytes: &'a [u8],
    header: CaptureHeader,
    descriptors: HashMap<String, ChannelDescriptor>,
}

impl<'a> CaptureParser<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let header = CaptureHeader::parse(bytes)?;
        debug!(
            num_channels = header.num_channels,
            num_samples = header.num_samples,
            sample_size_bytes = header.sample_size_bytes,
            "parsed capture header"
        );

        let table_offset = header.descriptor_table_offset();
        let mut descriptors = HashMap::with_capacity(header.num_channels as usize);
        for i in 0..header.num_channels as usize {
            let start = table_offset + i * CHANNEL_DESCRIPTOR_LEN;
            let end = start + CHANNEL_DESCRIPTOR_LEN;
            let desc = descriptor::parse_descriptor(&bytes[start..end])?;
            let size = descriptor::primitive_size(desc.type_code as u32).unwrap_or(0);
            if desc.offset + size > header.sample_size_bytes as usize {
                return Err(AnalysisError::MalformedCapture(format!(
                    "channel `{}` offset {} + size {} exceeds row width {}",
                    desc.name, desc.offset, size, header.sample_size_bytes
                )));
            }
            trace!(channel = %desc.name, offset = desc.offset, "channel descriptor");
            descriptors.insert(desc.name.clone(), desc);
        }

        Ok(Self { bytes, header, descriptors })
    }

    pub fn num_samples(&self) -> usize {
        self.header.num_samples as usize
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn session_meta(&self) -> Result<model::SessionMeta> {
        let start = self.header.metadata_offset as usize;
        let end = start + self.header.metadata_length as usize;
        metadata::parse_metadata(&self.bytes[start..end], self.header.tick_rate as f64)
    }

    /// Decodes one channel's full column by computing its base offset and
    /// row stride once, then slicing the sample matrix with that stride —
    /// a vectorised pass instead of a per-sample loop over the whole file.
    pub fn decode_channel(&self, name: &str) -> Result<ChannelValues> {
        let desc = self
            .descriptors
            .get(name)
            .ok_or_else(|| AnalysisError::MissingChannel(name.to_string()))?;

        let stride = self.header.sample_size_bytes as usize;
        let n = self.num_samples();
        let matrix = &self.bytes[self.header.sample_matrix_offset as usize
            ..self.header.sample_matrix_offset as usize + n * stride];

        let values = match desc.dtype {
            ChannelType::Bool => {
                let mut out = Vec::with_capacity(n);
                for row in matrix.chunks_exact(stride) {
                    let off = desc.offset;
                    out.push(row[off] != 0);
                }
                ChannelValues::Bool(out)
            }
            ChannelType::Int => {
                let mut out = Vec::with_capacity(n);
                for row in matrix.chunks_exact(stride) {
                    let off = desc.offset;
                    let v = Cursor::new(&row[off..off + 4]).read_i32::<LittleEndian>().map_err(|e| {
                        AnalysisError::MalformedCapture(format!("channel `{name}` int read: {e}"))
                    })?;
                    out.push(v as i64);
                }
                ChannelValues::Int(out)
            }
            ChannelType::Float => {
                if desc.type_code == 5 {
                    let mut out = Vec::with_capacity(n);
                    for row in matrix.chunks_exact(stride) {
                        let off = desc.offset;
                        let v = Cursor::new(&row[off..off + 8]).read_f64::<LittleEndian>().map_err(|e| {
                            AnalysisError::MalformedCapture(format!("channel `{name}` f64 read: {e}"))
                        })?;
                        out.push(v);
                    }
                    ChannelValues::Float(out)
                } else {
                    let mut out = Vec::with_capacity(n);
                    for row in matrix.chunks_exact(stride) {
                        let off = desc.offset;
                        let v = Cursor::new(&row[off..off + 4]).read_f32::<LittleEndian>().map_err(|e| {
                            AnalysisError::MalformedCapture(format!("channel `{name}` f32 read: {e}"))
                        })?;
                        out.push(v as f64);
                    }
                    ChannelValues::Float(out)
                }
            }
        };

        Ok(values)
    }

    /// Materialises exactly the requested channels into a `ChannelTable`.
    pub fn decode_channels(&self, names: &[&str]) -> Result<ChannelTable> {
        let mut table = ChannelTable::new(self.num_samples());
        for &name in names {
            table.insert(name, self.decode_channel(name)?);
        }
        Ok(table)
    }
}

/// Decodes a capture, materialising only `required_channels` (spec §4.1,
/// §6). Fails with `MalformedCapture` on any inconsistent offset/length,
/// `UnsupportedChannelType` on an unknown descriptor type code, or
/// `MissingChannel` if a required channel has no descriptor.
pub fn parse_capture(bytes: &[u8], required_channels: &[&str]) -> Result<Capture> {
    let parser = CaptureParser::open(bytes)?;
    let session = parser.session_meta()?;
    let channels = parser.decode_channels(required_channels)?;
    Ok(Capture { session, channels })
}
