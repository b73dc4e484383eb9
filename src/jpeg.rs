use nom::{
    bytes::complete::tag,
    number::{self, Endianness},
    sequence::tuple,
};

use crate::{exif::check_exif_header, reader::ByteReader, Error};

const EXIF_HEADER_SIZE: usize = 6;

/// Checks the SOI marker `[0xFF, 0xD8]` at the start of `input`.
pub(crate) fn check_jpeg(input: &[u8]) -> crate::Result<()> {
    let (_, (_, code)) = tuple((tag([0xFF]), number::complete::u8))(input)
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| Error::UnrecognizedFileFormat)?;

    // SOI has no payload
    if code != MarkerCode::Soi.code() {
        return Err(Error::UnrecognizedFileFormat);
    }
    Ok(())
}

/// Walks the marker segments of a JPEG file and returns the absolute
/// position of the TIFF data (the byte order mark) inside the Exif APP1
/// segment.
///
/// Stray bytes between segments are skipped one at a time. The search
/// stops at SOS, since entropy-coded data follows it; an APP1 segment
/// without the Exif header ends the search as well.
#[tracing::instrument(skip_all)]
pub(crate) fn find_exif_tiff(input: &[u8]) -> crate::Result<usize> {
    check_jpeg(input)?;

    // segment lengths are always big-endian
    let reader = ByteReader::new(input, Endianness::Big);
    let mut pos = 2;

    while pos < input.len() {
        if reader.u8_at(pos)? != 0xFF {
            pos += 1;
            continue;
        }

        let code = reader.u8_at(pos + 1)?;
        tracing::debug!(pos, "Got segment: 0x{:02x}", code);

        if code == 0xFF {
            // fill byte
            pos += 1;
            continue;
        }
        if code == MarkerCode::Soi.code() || code == MarkerCode::Eoi.code() {
            pos += 2;
            continue;
        }
        if code == MarkerCode::Sos.code() {
            return Err(Error::ExifNotFound);
        }

        // size contains the two bytes of `size` itself
        let size = reader.u16_at(pos + 2)? as usize;
        if code == MarkerCode::App1.code() {
            if size < EXIF_HEADER_SIZE + 2 {
                return Err("APP1 segment is too small".into());
            }
            let header = reader.bytes_at(pos + 4, EXIF_HEADER_SIZE)?;
            if !check_exif_header(header) {
                tracing::debug!(pos, "APP1 segment without Exif header");
                return Err(Error::ExifNotFound);
            }
            return Ok(pos + 4 + EXIF_HEADER_SIZE);
        }

        pos += 2 + size;
    }

    Err(Error::ExifNotFound)
}

/// A marker code is a byte following 0xFF that indicates the kind of marker.
enum MarkerCode {
    // Start of Image
    Soi = 0xD8,

    // APP1 marker
    App1 = 0xE1,

    // Start of Scan
    Sos = 0xDA,

    // End of Image
    Eoi = 0xD9,
}

impl MarkerCode {
    fn code(self) -> u8 {
        self as u8
    }
}
