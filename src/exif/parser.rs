use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::map,
    number::{
        complete::{u16, u32},
        Endianness,
    },
    sequence::tuple,
    IResult,
};

use crate::{
    metadata::{
        camera_name, format_aperture, format_date, format_exposure_bias, format_focal_length,
        format_shutter_speed, DecodedMetadata,
    },
    reader::ByteReader,
    values::{read_irational, read_urational, IRational, URational},
    Error,
};

use super::{
    gps::parse_position,
    ifd::{parse_directory, TagDirectory, TagEntry},
    tags::ExifTag,
};

const EXIF_IDENT: &str = "Exif\0\0";

// DateTimeOriginal is a fixed 20-byte string
const DATE_TEXT_SIZE: usize = 20;

const FORMAT_U16: u16 = 3;
const FORMAT_U32: u16 = 4;
const FORMAT_URATIONAL: u16 = 5;
const FORMAT_IRATIONAL: u16 = 10;
const FORMAT_IFD: u16 = 13;

/// TIFF Header
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TiffHeader {
    pub endian: Endianness,
    pub ifd0_offset: u32,
}

impl TiffHeader {
    /// Parses the byte order mark, the magic number (not verified) and the
    /// IFD0 offset.
    pub fn parse(input: &[u8]) -> IResult<&[u8], TiffHeader> {
        let (remain, endian) = TiffHeader::parse_endian(input)?;
        let (remain, (_, offset)) = tuple((u16(endian), u32(endian)))(remain)?;

        let header = Self {
            endian,
            ifd0_offset: offset,
        };

        Ok((remain, header))
    }

    fn parse_endian(input: &[u8]) -> IResult<&[u8], Endianness> {
        map(alt((tag("MM"), tag("II"))), |endian_marker| {
            if endian_marker == b"MM" {
                Endianness::Big
            } else {
                Endianness::Little
            }
        })(input)
    }
}

/// Checks the six-byte `"Exif\0\0"` identifier at the start of `data`.
pub(crate) fn check_exif_header(data: &[u8]) -> bool {
    tag::<_, _, nom::error::Error<_>>(EXIF_IDENT)(data).is_ok()
}

/// Decodes the TIFF structure whose byte order mark is at absolute
/// position `origin` of `input`. All offsets stored in the structure are
/// relative to `origin`.
#[tracing::instrument(skip(input))]
pub(crate) fn decode_tiff(input: &[u8], origin: usize) -> crate::Result<DecodedMetadata> {
    let tiff = input.get(origin..).ok_or(Error::OutOfRange {
        offset: origin,
        len: 0,
        size: input.len(),
    })?;
    let (_, header) = TiffHeader::parse(tiff)?;
    tracing::debug!(?header, "Got TIFF header");

    let extractor = Extractor {
        reader: ByteReader::new(input, header.endian),
        origin,
    };

    let ifd0 = parse_directory(
        &extractor.reader,
        origin,
        origin.saturating_add(header.ifd0_offset as usize),
    )?;
    log_partial("ifd0", &ifd0);

    let mut meta = DecodedMetadata {
        camera: camera_name(
            extractor.text(&ifd0, ExifTag::Make, None).as_deref(),
            extractor.text(&ifd0, ExifTag::Model, None).as_deref(),
        ),
        ..Default::default()
    };

    if let Some(exif) = extractor.sub_ifd(&ifd0, ExifTag::ExifOffset) {
        extractor.exif_fields(&exif, &mut meta)?;
    }

    if let Some(gps) = extractor.sub_ifd(&ifd0, ExifTag::GPSInfo) {
        if let Some((lat, lng)) = parse_position(&extractor.reader, origin, &gps)? {
            meta.latitude = Some(lat);
            meta.longitude = Some(lng);
        }
    }

    Ok(meta)
}

fn log_partial(name: &str, dir: &TagDirectory) {
    if !dir.is_complete() {
        tracing::debug!(
            name,
            read = dir.len(),
            declared = dir.declared(),
            "partial ifd; using the entries read"
        );
    }
}

struct Extractor<'a> {
    reader: ByteReader<'a>,
    origin: usize,
}

impl Extractor<'_> {
    fn exif_fields(&self, dir: &TagDirectory, meta: &mut DecodedMetadata) -> crate::Result<()> {
        meta.date_taken = self
            .text(dir, ExifTag::DateTimeOriginal, Some(DATE_TEXT_SIZE))
            .map(|s| format_date(&s));
        meta.shutter_speed = self
            .urational(dir, ExifTag::ExposureTime)?
            .and_then(format_shutter_speed);
        meta.aperture = self
            .urational(dir, ExifTag::FNumber)?
            .and_then(format_aperture);
        meta.iso = self.uint(dir, ExifTag::ISOSpeedRatings)?;
        meta.focal_length = self
            .urational(dir, ExifTag::FocalLength)?
            .and_then(format_focal_length);
        meta.focal_length_35mm = self
            .uint(dir, ExifTag::FocalLengthIn35mmFilm)?
            .filter(|v| *v > 0);
        meta.exposure_bias = self
            .irational(dir, ExifTag::ExposureBiasValue)?
            .and_then(format_exposure_bias);
        meta.lens = self.text(dir, ExifTag::LensModel, None);
        Ok(())
    }

    /// Decodes the directory a pointer tag refers to. Pointers must be a
    /// non-zero inline LONG (or IFD); a directory that can't be read is
    /// treated as missing.
    fn sub_ifd(&self, dir: &TagDirectory, tag: ExifTag) -> Option<TagDirectory> {
        let entry = dir.get(tag)?;
        if entry.data_format != FORMAT_U32 && entry.data_format != FORMAT_IFD {
            tracing::debug!(%tag, ?entry, "unexpected pointer format");
            return None;
        }
        let offset = entry.inline().filter(|v| *v != 0)?;

        let pos = self.origin.saturating_add(offset as usize);
        match parse_directory(&self.reader, self.origin, pos) {
            Ok(sub) => {
                log_partial(&tag.to_string(), &sub);
                Some(sub)
            }
            Err(e) => {
                tracing::debug!(%tag, pos, ?e, "invalid sub-ifd location");
                None
            }
        }
    }

    /// Text value, trimmed; empty strings are absent.
    fn text(&self, dir: &TagDirectory, tag: ExifTag, max_len: Option<usize>) -> Option<String> {
        let entry = dir.get(tag)?;
        let pos = self.value_pos(entry)?;
        let len = max_len.unwrap_or(entry.components_num as usize);

        let s = self.reader.text_at(pos, len);
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_owned())
    }

    /// SHORT or LONG; for multi-valued entries the first element.
    fn uint(&self, dir: &TagDirectory, tag: ExifTag) -> crate::Result<Option<u32>> {
        let Some(entry) = dir.get(tag) else {
            return Ok(None);
        };
        if let Some(v) = entry.inline() {
            return Ok(Some(v));
        }
        let Some(pos) = entry.offset_pos(self.origin) else {
            return Ok(None);
        };
        match entry.data_format {
            FORMAT_U16 => Ok(Some(self.reader.u16_at(pos)? as u32)),
            FORMAT_U32 => Ok(Some(self.reader.u32_at(pos)?)),
            _ => Ok(None),
        }
    }

    fn urational(&self, dir: &TagDirectory, tag: ExifTag) -> crate::Result<Option<URational>> {
        match self.rational_pos(dir, tag, FORMAT_URATIONAL) {
            Some(pos) => Ok(Some(read_urational(&self.reader, pos)?)),
            None => Ok(None),
        }
    }

    fn irational(&self, dir: &TagDirectory, tag: ExifTag) -> crate::Result<Option<IRational>> {
        match self.rational_pos(dir, tag, FORMAT_IRATIONAL) {
            Some(pos) => Ok(Some(read_irational(&self.reader, pos)?)),
            None => Ok(None),
        }
    }

    // rationals are 8 bytes, so they are never inline
    fn rational_pos(&self, dir: &TagDirectory, tag: ExifTag, data_format: u16) -> Option<usize> {
        let entry = dir.get(tag)?;
        if entry.data_format != data_format {
            tracing::debug!(%tag, ?entry, "unexpected rational format");
            return None;
        }
        entry.offset_pos(self.origin)
    }

    fn value_pos(&self, entry: &TagEntry) -> Option<usize> {
        entry
            .offset_pos(self.origin)
            .or_else(|| entry.inline().map(|_| entry.slot))
    }
}
