//! Reader for the Galactic/GRAMS SPC binary spectroscopy format.
//!
//! Supports the new-format little-endian layout (version byte 0x4B): a
//! 512-byte main header followed by an optional global x array and one or
//! more subfiles, each carrying a 32-byte subheader and a y trace. Y values
//! are IEEE floats when the exponent is -128 and fixed-point integers
//! otherwise. Old-format (0x4D) and big-endian (0x4C) files are rejected.

use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

/// 16-bit y values (scaled by `2^(exp-16)`).
pub const TSPREC: u8 = 0x01;
/// File holds more than one subfile.
pub const TMULTI: u8 = 0x04;
/// Each subfile carries its own x array.
pub const TXYXYS: u8 = 0x40;
/// A global x array follows the main header.
pub const TXVALS: u8 = 0x80;

const HEADER_LEN: usize = 512;
const SUBHEADER_LEN: usize = 32;

const VERSION_NEW_LSB: u8 = 0x4B;
// 0x4C marks new-format big-endian files and 0x4D the old format; both are
// rejected by `parse`.
const VERSION_OLD: u8 = 0x4D;

/// Y values stored as IEEE f32 rather than fixed-point integers.
const EXPONENT_FLOAT: i8 = -128;

#[derive(Debug, Error)]
pub enum SpcError {
    #[error("file too short for an SPC header ({0} bytes, need {HEADER_LEN})")]
    TooShort(usize),
    #[error("unsupported SPC version byte 0x{0:02X}; only new-format little-endian files are supported")]
    UnsupportedVersion(u8),
    #[error("header declares {points} points per trace, more than the file can hold")]
    ImpossiblePointCount { points: u32 },
    #[error("truncated SPC data: {0}")]
    Truncated(#[from] std::io::Error),
}

/// Main header fields the conversion pipeline needs.
#[derive(Debug, Clone)]
pub struct SpcHeader {
    pub flags: u8,
    pub version: u8,
    pub experiment: u8,
    pub exponent: i8,
    pub num_points: u32,
    pub first_x: f64,
    pub last_x: f64,
    pub num_subfiles: u32,
    pub x_unit: u8,
    pub y_unit: u8,
    pub z_unit: u8,
}

impl SpcHeader {
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// One subfile: a y trace plus its z position and, for TXYXYS files, its
/// own x array.
#[derive(Debug, Clone)]
pub struct SubFile {
    pub index: u16,
    pub z_start: f32,
    pub x: Option<Vec<f64>>,
    pub y: Vec<f64>,
}

/// A parsed SPC file.
#[derive(Debug, Clone)]
pub struct SpcFile {
    pub header: SpcHeader,
    /// Global x array when TXVALS is set (and TXYXYS is not).
    pub x: Option<Vec<f64>>,
    pub subfiles: Vec<SubFile>,
}

impl SpcFile {
    /// X values shared by all subfiles: the explicit global array when
    /// present, otherwise evenly spaced between `first_x` and `last_x`.
    pub fn shared_x(&self) -> Option<Vec<f64>> {
        if self.header.has_flag(TXYXYS) {
            return None;
        }
        match &self.x {
            Some(x) => Some(x.clone()),
            None => Some(evenly_spaced(
                self.header.first_x,
                self.header.last_x,
                self.header.num_points as usize,
            )),
        }
    }
}

/// Parse an SPC file from raw bytes.
pub fn parse(data: &[u8]) -> Result<SpcFile, SpcError> {
    if data.len() < HEADER_LEN {
        return Err(SpcError::TooShort(data.len()));
    }

    let mut cur = Cursor::new(data);
    let header = read_header(&mut cur)?;

    if header.version != VERSION_NEW_LSB {
        return Err(SpcError::UnsupportedVersion(header.version));
    }

    // For TXYXYS files the trace length lives in each subheader and is
    // checked there instead.
    let y_width = if header.has_flag(TSPREC) { 2 } else { 4 };
    if !header.has_flag(TXYXYS) && header.num_points as usize * y_width > data.len() {
        return Err(SpcError::ImpossiblePointCount {
            points: header.num_points,
        });
    }

    cur.seek(SeekFrom::Start(HEADER_LEN as u64))?;

    // Global x array precedes the subfiles unless each subfile carries its own.
    let global_x = if header.has_flag(TXVALS) && !header.has_flag(TXYXYS) {
        Some(read_f32_array(&mut cur, header.num_points as usize)?)
    } else {
        None
    };

    let num_subfiles = if header.has_flag(TMULTI) {
        header.num_subfiles.max(1)
    } else {
        1
    };

    let mut subfiles = Vec::with_capacity(num_subfiles as usize);
    for _ in 0..num_subfiles {
        subfiles.push(read_subfile(&mut cur, &header)?);
    }

    Ok(SpcFile {
        header,
        x: global_x,
        subfiles,
    })
}

fn read_header(cur: &mut Cursor<&[u8]>) -> Result<SpcHeader, SpcError> {
    let flags = cur.read_u8()?;
    let version = cur.read_u8()?;
    let experiment = cur.read_u8()?;
    let exponent = cur.read_i8()?;
    let num_points = cur.read_u32::<LittleEndian>()?;
    let first_x = cur.read_f64::<LittleEndian>()?;
    let last_x = cur.read_f64::<LittleEndian>()?;
    let num_subfiles = cur.read_u32::<LittleEndian>()?;
    let x_unit = cur.read_u8()?;
    let y_unit = cur.read_u8()?;
    let z_unit = cur.read_u8()?;
    // fpost, fdate, resolution, source, comment and axis-label text occupy
    // the rest of the 512-byte header and are not needed for conversion.

    Ok(SpcHeader {
        flags,
        version,
        experiment,
        exponent,
        num_points,
        first_x,
        last_x,
        num_subfiles,
        x_unit,
        y_unit,
        z_unit,
    })
}

fn read_subfile(cur: &mut Cursor<&[u8]>, header: &SpcHeader) -> Result<SubFile, SpcError> {
    let _sub_flags = cur.read_u8()?;
    let sub_exponent = cur.read_i8()?;
    let index = cur.read_u16::<LittleEndian>()?;
    let z_start = cur.read_f32::<LittleEndian>()?;
    let _z_next = cur.read_f32::<LittleEndian>()?;
    let _noise = cur.read_f32::<LittleEndian>()?;
    let sub_points = cur.read_u32::<LittleEndian>()?;
    let _scans = cur.read_u32::<LittleEndian>()?;
    let _w_level = cur.read_f32::<LittleEndian>()?;
    cur.seek(SeekFrom::Current((SUBHEADER_LEN - 28) as i64))?;

    let num_points = if header.has_flag(TXYXYS) {
        sub_points
    } else {
        header.num_points
    } as usize;

    let remaining = cur.get_ref().len().saturating_sub(cur.position() as usize);
    let y_width = if header.has_flag(TSPREC) { 2 } else { 4 };
    if num_points * y_width > remaining {
        return Err(SpcError::ImpossiblePointCount {
            points: num_points as u32,
        });
    }

    let x = if header.has_flag(TXYXYS) {
        Some(read_f32_array(cur, num_points)?)
    } else {
        None
    };

    // Multifile traces may override the file-level exponent per subfile.
    let exponent = if header.has_flag(TMULTI) && sub_exponent != 0 {
        sub_exponent
    } else {
        header.exponent
    };

    let y = read_y_values(cur, num_points, exponent, header.has_flag(TSPREC))?;

    Ok(SubFile {
        index,
        z_start,
        x,
        y,
    })
}

fn read_y_values(
    cur: &mut Cursor<&[u8]>,
    num_points: usize,
    exponent: i8,
    half_precision: bool,
) -> Result<Vec<f64>, SpcError> {
    let mut y = Vec::with_capacity(num_points);
    if exponent == EXPONENT_FLOAT {
        for _ in 0..num_points {
            y.push(cur.read_f32::<LittleEndian>()? as f64);
        }
    } else if half_precision {
        let scale = (exponent as f64 - 16.0).exp2();
        for _ in 0..num_points {
            y.push(cur.read_i16::<LittleEndian>()? as f64 * scale);
        }
    } else {
        let scale = (exponent as f64 - 32.0).exp2();
        for _ in 0..num_points {
            y.push(cur.read_i32::<LittleEndian>()? as f64 * scale);
        }
    }
    Ok(y)
}

fn read_f32_array(cur: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<f64>, SpcError> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(cur.read_f32::<LittleEndian>()? as f64);
    }
    Ok(out)
}

/// Evenly spaced x axis between `first` and `last`, inclusive.
pub fn evenly_spaced(first: f64, last: f64, num_points: usize) -> Vec<f64> {
    match num_points {
        0 => Vec::new(),
        1 => vec![first],
        n => {
            let step = (last - first) / (n - 1) as f64;
            (0..n).map(|i| first + step * i as f64).collect()
        }
    }
}
