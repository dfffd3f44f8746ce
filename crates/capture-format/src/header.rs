use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use model::{AnalysisError, Result};

/// Fixed 112-byte header, little-endian (spec §4.1, §6).
pub const HEADER_LEN: usize = 112;
/// Fixed 32-byte disk sub-header that follows it.
pub const SUB_HEADER_LEN: usize = 32;
/// Each channel descriptor record is 144 bytes.
pub const CHANNEL_DESCRIPTOR_LEN: usize = 144;

const MAGIC: &[u8; 4] = b"RCAP";

#[derive(Debug, Clone, Copy)]
pub struct CaptureHeader {
    pub version: u32,
    pub num_channels: u32,
    pub metadata_offset: u32,
    pub metadata_length: u32,
    pub sample_matrix_offset: u32,
    pub sample_size_bytes: u32,
    pub num_samples: u32,
    pub tick_rate: u32,
}

impl CaptureHeader {
    /// Parses and validates the fixed header against the overall file size.
    /// Fails with `MalformedCapture` rather than panicking on any
    /// out-of-bounds offset or length (spec §4.1 "defensively").
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN + SUB_HEADER_LEN {
            return Err(AnalysisError::MalformedCapture(format!(
                "file too small for header: {} bytes",
                bytes.len()
            )));
        }

        let mut c = Cursor::new(&bytes[..HEADER_LEN]);
        let mut magic = [0u8; 4];
        c.read_exact(&mut magic).map_err(header_io_err)?;
        if &magic != MAGIC {
            return Err(AnalysisError::MalformedCapture("bad magic".into()));
        }

        let version = c.read_u32::<LittleEndian>().map_err(header_io_err)?;
        let num_channels = c.read_u32::<LittleEndian>().map_err(header_io_err)?;
        let metadata_offset = c.read_u32::<LittleEndian>().map_err(header_io_err)?;
        let metadata_length = c.read_u32::<LittleEndian>().map_err(header_io_err)?;
        let sample_matrix_offset = c.read_u32::<LittleEndian>().map_err(header_io_err)?;
        let sample_size_bytes = c.read_u32::<LittleEndian>().map_err(header_io_err)?;
        let num_samples = c.read_u32::<LittleEndian>().map_err(header_io_err)?;
        let tick_rate = c.read_u32::<LittleEndian>().map_err(header_io_err)?;

        let header = CaptureHeader {
            version,
            num_channels,
            metadata_offset,
            metadata_length,
            sample_matrix_offset,
            sample_size_bytes,
            num_samples,
            tick_rate,
        };
        header.validate(bytes.len())?;
        Ok(header)
    }

    fn validate(&self, file_len: usize) -> Result<()> {
        let meta_end = self.metadata_offset as usize + self.metadata_length as usize;
        if meta_end > file_len {
            return Err(AnalysisError::MalformedCapture(format!(
                "metadata document [{}, {}) exceeds file length {}",
                self.metadata_offset, meta_end, file_len
            )));
        }

        let descriptors_len = self.num_channels as usize * CHANNEL_DESCRIPTOR_LEN;
        let descriptors_end = self.descriptor_table_offset() + descriptors_len;
        if descriptors_end > file_len {
            return Err(AnalysisError::MalformedCapture(format!(
                "{} channel descriptors exceed file length {}",
                self.num_channels, file_len
            )));
        }

        let matrix_len = self.num_samples as usize * self.sample_size_bytes as usize;
        let matrix_end = self.sample_matrix_offset as usize + matrix_len;
        if matrix_end > file_len {
            return Err(AnalysisError::MalformedCapture(format!(
                "sample matrix [{}, {}) exceeds file length {}",
                self.sample_matrix_offset, matrix_end, file_len
            )));
        }

        Ok(())
    }

    /// The channel descriptor table immediately follows the metadata
    /// document (spec §4.1 region order: header, sub-header, metadata,
    /// descriptors, sample matrix).
    pub fn descriptor_table_offset(&self) -> usize {
        self.metadata_offset as usize + self.metadata_length as usize
    }
}

fn header_io_err(e: std::io::Error) -> AnalysisError {
    AnalysisError::MalformedCapture(format!("truncated header: {e}"))
}
