use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use model::{AnalysisError, ChannelType, Result, Unit};

use crate::header::CHANNEL_DESCRIPTOR_LEN;

/// One 144-byte channel descriptor record (spec §4.1, §6).
///
/// Layout: `type_code: u32`, `offset: u32` (byte offset within a sample
/// row), `count: u32` (array arity, always 1 for the scalar channels this
/// format carries), `name: [u8; 60]`, `unit: [u8; 32]`, `description:
/// [u8; 40]`.
#[derive(Debug, Clone)]
pub struct ChannelDescriptor {
    pub name: String,
    pub dtype: ChannelType,
    pub unit: Unit,
    pub offset: usize,
    pub type_code: u16,
}

fn unit_from_str(s: &str) -> Unit {
    match s {
        "m" => Unit::Meters,
        "m/s" => Unit::MetersPerSecond,
        "s" => Unit::Seconds,
        "rad" => Unit::Radians,
        "deg" => Unit::Degrees,
        "rpm" => Unit::Rpm,
        "bool" => Unit::Boolean,
        "count" | "" => Unit::Count,
        _ => Unit::Ratio,
    }
}

const NAME_LEN: usize = 60;
const UNIT_LEN: usize = 32;
const DESC_LEN: usize = 40;

fn type_from_code(code: u32) -> Option<(ChannelType, usize)> {
    match code {
        1 => Some((ChannelType::Bool, 1)),
        2 => Some((ChannelType::Int, 4)),
        3 => Some((ChannelType::Int, 4)), // bitfield decodes as an int channel
        4 => Some((ChannelType::Float, 4)),
        5 => Some((ChannelType::Float, 8)),
        _ => None,
    }
}

pub fn primitive_size(type_code: u32) -> Option<usize> {
    type_from_code(type_code).map(|(_, size)| size)
}

fn read_fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

pub fn parse_descriptor(bytes: &[u8]) -> Result<ChannelDescriptor> {
    if bytes.len() < CHANNEL_DESCRIPTOR_LEN {
        return Err(AnalysisError::MalformedCapture("truncated channel descriptor".into()));
    }

    let mut c = Cursor::new(bytes);
    let type_code = c
        .read_u32::<LittleEndian>()
        .map_err(|e| AnalysisError::MalformedCapture(format!("descriptor type: {e}")))?;
    let offset = c
        .read_u32::<LittleEndian>()
        .map_err(|e| AnalysisError::MalformedCapture(format!("descriptor offset: {e}")))?;
    let _count = c
        .read_u32::<LittleEndian>()
        .map_err(|e| AnalysisError::MalformedCapture(format!("descriptor count: {e}")))?;

    let name_start = 12;
    let unit_start = name_start + NAME_LEN;
    let desc_start = unit_start + UNIT_LEN;
    let desc_end = desc_start + DESC_LEN;
    debug_assert_eq!(desc_end, CHANNEL_DESCRIPTOR_LEN);

    let name = read_fixed_str(&bytes[name_start..unit_start]);
    let unit = unit_from_str(&read_fixed_str(&bytes[unit_start..desc_start]));

    let (dtype, _size) = type_from_code(type_code).ok_or_else(|| AnalysisError::UnsupportedChannelType {
        channel: name.clone(),
        code: type_code as u16,
    })?;

    Ok(ChannelDescriptor { name, dtype, unit, offset: offset as usize, type_code: type_code as u16 })
}
