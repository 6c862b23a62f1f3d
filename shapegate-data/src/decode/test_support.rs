//! Byte-level fixture builders for shapefile tests.
//!
//! The helpers emit the smallest well-formed files the `shapefile` and
//! `dbase` readers accept: point shapefiles, single-column character tables,
//! and stored (uncompressed) zip archives.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SHP_FILE_CODE: i32 = 9994;
const SHP_VERSION: i32 = 1000;
const SHP_HEADER_LEN: usize = 100;
const SHAPE_NULL: i32 = 0;
const SHAPE_POINT: i32 = 1;

const DBF_HEADER_LEN: usize = 32;
const DBF_FIELD_LEN: usize = 32;

/// Build a point `.shp` file; `None` entries become null shape records.
pub fn point_shp(points: &[Option<(f64, f64)>]) -> Vec<u8> {
    let mut records = Vec::new();
    for (index, point) in points.iter().enumerate() {
        let content = match point {
            Some((x, y)) => {
                let mut content = SHAPE_POINT.to_le_bytes().to_vec();
                content.extend_from_slice(&x.to_le_bytes());
                content.extend_from_slice(&y.to_le_bytes());
                content
            }
            None => SHAPE_NULL.to_le_bytes().to_vec(),
        };
        records.extend_from_slice(&word_count(index + 1).to_be_bytes());
        records.extend_from_slice(&words(content.len()).to_be_bytes());
        records.extend_from_slice(&content);
    }

    let (min, max) = bounds(points);
    let mut shp = Vec::with_capacity(SHP_HEADER_LEN + records.len());
    shp.extend_from_slice(&SHP_FILE_CODE.to_be_bytes());
    shp.extend_from_slice(&[0; 20]);
    shp.extend_from_slice(&words(SHP_HEADER_LEN + records.len()).to_be_bytes());
    shp.extend_from_slice(&SHP_VERSION.to_le_bytes());
    shp.extend_from_slice(&SHAPE_POINT.to_le_bytes());
    for value in [min.0, min.1, max.0, max.1, 0.0, 0.0, 0.0, 0.0] {
        shp.extend_from_slice(&f64::to_le_bytes(value));
    }
    shp.extend_from_slice(&records);
    shp
}

fn bounds(points: &[Option<(f64, f64)>]) -> ((f64, f64), (f64, f64)) {
    points.iter().flatten().fold(
        ((f64::INFINITY, f64::INFINITY), (f64::NEG_INFINITY, f64::NEG_INFINITY)),
        |(min, max), &(x, y)| ((min.0.min(x), min.1.min(y)), (max.0.max(x), max.1.max(y))),
    )
}

fn words(bytes: usize) -> i32 {
    word_count(bytes / 2)
}

fn word_count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Build a `.dbf` table with one character column named `field`.
pub fn text_dbf(field: &str, values: &[&str]) -> Vec<u8> {
    let width = values.iter().map(|value| value.len()).max().unwrap_or(1).max(1);
    let width_byte = u8::try_from(width).unwrap_or(u8::MAX);
    let count = u32::try_from(values.len()).unwrap_or(u32::MAX);
    let header_len = u16::try_from(DBF_HEADER_LEN + DBF_FIELD_LEN + 1).unwrap_or(u16::MAX);
    let record_len = u16::from(width_byte) + 1;

    let mut dbf = vec![0x03, 124, 1, 1];
    dbf.extend_from_slice(&count.to_le_bytes());
    dbf.extend_from_slice(&header_len.to_le_bytes());
    dbf.extend_from_slice(&record_len.to_le_bytes());
    dbf.extend_from_slice(&[0; 20]);

    let mut name = [0_u8; 11];
    for (slot, byte) in name.iter_mut().zip(field.bytes().take(10)) {
        *slot = byte;
    }
    dbf.extend_from_slice(&name);
    dbf.push(b'C');
    dbf.extend_from_slice(&[0; 4]);
    dbf.push(width_byte);
    dbf.push(0);
    dbf.extend_from_slice(&[0; 14]);
    dbf.push(0x0D);

    for value in values {
        dbf.push(b' ');
        dbf.extend_from_slice(format!("{value:<width$}").as_bytes());
    }
    dbf.push(0x1A);
    dbf
}

/// Build a stored zip archive from `(name, bytes)` entries, in order.
pub fn zip_entries(entries: &[(&str, &[u8])]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}
