use crate::{
    reader::ByteReader,
    values::{read_urational, URational},
};

use super::{
    ifd::{TagDirectory, TagEntry},
    tags::ExifTag,
};

const FORMAT_URATIONAL: u16 = 5;

/// Degrees, minutes, seconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) struct LatLng(pub URational, pub URational, pub URational);

impl LatLng {
    /// `d + m/60 + s/3600`, or `None` if any denominator is zero.
    pub fn to_degrees(&self) -> Option<f64> {
        let d = self.0.to_float()?;
        let m = self.1.to_float()?;
        let s = self.2.to_float()?;
        Some(d + m / 60.0 + s / 3600.0)
    }
}

impl From<[(u32, u32); 3]> for LatLng {
    fn from(value: [(u32, u32); 3]) -> Self {
        let [d, m, s] = value.map(URational::from);
        Self(d, m, s)
    }
}

/// Reads latitude/longitude from a decoded GPS directory.
///
/// Returns `Ok(None)` unless both coordinates are present and decodable.
/// 'S' and 'W' references make the coordinate negative.
pub(crate) fn parse_position(
    reader: &ByteReader,
    origin: usize,
    dir: &TagDirectory,
) -> crate::Result<Option<(f64, f64)>> {
    let lat = coordinate(reader, origin, dir, ExifTag::GPSLatitude, ExifTag::GPSLatitudeRef)?;
    let lng = coordinate(
        reader,
        origin,
        dir,
        ExifTag::GPSLongitude,
        ExifTag::GPSLongitudeRef,
    )?;

    if lat.is_none() != lng.is_none() {
        tracing::debug!(?lat, ?lng, "incomplete gps position; ignored");
    }
    Ok(lat.zip(lng))
}

fn coordinate(
    reader: &ByteReader,
    origin: usize,
    dir: &TagDirectory,
    tag: ExifTag,
    ref_tag: ExifTag,
) -> crate::Result<Option<f64>> {
    let Some(entry) = dir.get(tag) else {
        return Ok(None);
    };
    let Some(latlng) = read_latlng(reader, origin, entry)? else {
        return Ok(None);
    };
    let Some(degrees) = latlng.to_degrees() else {
        tracing::debug!(%tag, ?latlng, "zero denominator in gps coordinate");
        return Ok(None);
    };

    let reference = dir
        .get(ref_tag)
        .map(|e| reader.text_at(e.data_pos(origin), e.components_num as usize))
        .unwrap_or_default();

    Ok(Some(match reference.trim() {
        "S" | "W" => -degrees,
        _ => degrees,
    }))
}

fn read_latlng(
    reader: &ByteReader,
    origin: usize,
    entry: &TagEntry,
) -> crate::Result<Option<LatLng>> {
    if entry.data_format != FORMAT_URATIONAL || entry.components_num < 3 {
        return Ok(None);
    }
    let Some(pos) = entry.offset_pos(origin) else {
        return Ok(None);
    };

    Ok(Some(LatLng(
        read_urational(reader, pos)?,
        read_urational(reader, pos + 8)?,
        read_urational(reader, pos + 16)?,
    )))
}
