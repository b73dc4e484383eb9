use std::path::Path;

use crate::{jpeg, metadata::DecodedMetadata};

pub(crate) use parser::check_exif_header;

mod gps;
mod ifd;
mod parser;
pub(crate) mod tags;

/// Decodes the camera metadata embedded in a JPEG file.
///
/// Returns `None` when `bytes` isn't a JPEG, carries no Exif segment, or
/// the segment is malformed. Absence of metadata is a normal state for a
/// photo, so the reason is only logged (at `debug` level); use
/// [`try_decode`] to get it.
///
/// Never panics, whatever the input.
///
/// ```rust
/// assert_eq!(photo_meta::decode(b"GIF89a"), None);
/// ```
pub fn decode(bytes: &[u8]) -> Option<DecodedMetadata> {
    match try_decode(bytes) {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::debug!(error = %e, "no camera metadata");
            None
        }
    }
}

/// Like [`decode`], but reports why no metadata could be decoded.
///
/// - [`Error::UnrecognizedFileFormat`](crate::Error::UnrecognizedFileFormat):
///   not a JPEG.
/// - [`Error::ExifNotFound`](crate::Error::ExifNotFound): no Exif segment
///   before the image data.
/// - [`Error::OutOfRange`](crate::Error::OutOfRange) /
///   [`Error::ParseFailed`](crate::Error::ParseFailed): truncated or
///   malformed segment.
#[tracing::instrument(skip_all)]
pub fn try_decode(bytes: &[u8]) -> crate::Result<DecodedMetadata> {
    let origin = jpeg::find_exif_tiff(bytes)?;
    parser::decode_tiff(bytes, origin)
}

/// Reads the file at `path` and decodes it, see [`decode`].
///
/// Only I/O errors are reported; a file without metadata gives `Ok(None)`.
pub fn read_metadata_file(path: impl AsRef<Path>) -> crate::Result<Option<DecodedMetadata>> {
    let bytes = std::fs::read(path)?;
    Ok(decode(&bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use nom::number::Endianness;
    use rand::Rng;
    use test_case::test_case;

    use super::tags::ExifTag;
    use super::*;
    use crate::testkit::{app0, image_tail, jpeg_with_exif, IfdBuilder, Value};
    use crate::Error;

    fn full_sample(endian: Endianness) -> Vec<u8> {
        let exif = IfdBuilder::new(endian)
            .entry(ExifTag::ExposureTime, Value::Rational(1, 250))
            .entry(ExifTag::FNumber, Value::Rational(28, 10))
            .entry(ExifTag::ISOSpeedRatings, Value::Short(160))
            .entry(
                ExifTag::DateTimeOriginal,
                Value::Ascii("2023:07:09 20:36:33"),
            )
            .entry(ExifTag::ExposureBiasValue, Value::SRational(2, 3))
            .entry(ExifTag::FocalLength, Value::Rational(230, 10))
            .entry(ExifTag::FocalLengthIn35mmFilm, Value::Short(35))
            .entry(ExifTag::LensModel, Value::Ascii("XF23mmF2 R WR"));
        let gps = IfdBuilder::new(endian)
            .entry(ExifTag::GPSLatitudeRef, Value::Ascii("N"))
            .entry(
                ExifTag::GPSLatitude,
                Value::Rationals(vec![(40, 1), (42, 1), (4626, 100)]),
            )
            .entry(ExifTag::GPSLongitudeRef, Value::Ascii("W"))
            .entry(
                ExifTag::GPSLongitude,
                Value::Rationals(vec![(74, 1), (0, 1), (2160, 100)]),
            );

        IfdBuilder::new(endian)
            .entry(ExifTag::Make, Value::Ascii("FUJIFILM"))
            .entry(ExifTag::Model, Value::Ascii("X100V"))
            .entry(ExifTag::ExifOffset, Value::Ifd(exif))
            .entry(ExifTag::GPSInfo, Value::Ifd(gps))
            .build_jpeg()
    }

    #[test_case(Endianness::Big)]
    #[test_case(Endianness::Little)]
    fn decode_all_fields(endian: Endianness) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let buf = full_sample(endian);
        let meta = decode(&buf).unwrap();

        assert_eq!(meta.date_taken.as_deref(), Some("Jul 9, 2023"));
        assert_eq!(meta.camera.as_deref(), Some("FUJIFILM X100V"));
        assert_eq!(meta.lens.as_deref(), Some("XF23mmF2 R WR"));
        assert_eq!(meta.focal_length.as_deref(), Some("23mm"));
        assert_eq!(meta.focal_length_35mm, Some(35));
        assert_eq!(meta.aperture.as_deref(), Some("f/2.8"));
        assert_eq!(meta.shutter_speed.as_deref(), Some("1/250s"));
        assert_eq!(meta.iso, Some(160));
        assert_eq!(meta.exposure_bias.as_deref(), Some("+0.7 EV"));

        let lat = meta.latitude.unwrap();
        let lng = meta.longitude.unwrap();
        assert!((lat - 40.71285).abs() < 1e-6, "{lat}");
        assert!((lng + 74.006).abs() < 1e-6, "{lng}");
    }

    #[test]
    fn deterministic() {
        let buf = full_sample(Endianness::Little);
        let copy = buf.clone();
        assert_eq!(decode(&buf), decode(&buf));
        assert_eq!(buf, copy);
    }

    #[test_case(b"")]
    #[test_case(b"GIF89a")]
    #[test_case(b"\x89PNG\r\n\x1a\n")]
    #[test_case(b"\xff")]
    fn not_jpeg(data: &[u8]) {
        assert_eq!(decode(data), None);
        assert!(matches!(
            try_decode(data),
            Err(Error::UnrecognizedFileFormat)
        ));
    }

    #[test]
    fn jpeg_without_exif() {
        let mut buf = vec![0xff, 0xd8];
        buf.extend(app0());
        buf.extend(image_tail());
        assert_eq!(decode(&buf), None);
        assert!(matches!(try_decode(&buf), Err(Error::ExifNotFound)));
    }

    #[test]
    fn unknown_byte_order() {
        let buf = jpeg_with_exif(b"XX\0\x2a\0\0\0\x08\0\0");
        assert_eq!(decode(&buf), None);
    }

    #[test]
    fn empty_ifd0() {
        let buf = jpeg_with_exif(b"MM\0\x2a\0\0\0\x08\0\0");
        let meta = decode(&buf).unwrap();
        assert!(meta.is_empty());
    }

    #[test]
    fn missing_denominators() {
        let exif = IfdBuilder::new(Endianness::Big)
            .entry(ExifTag::ExposureTime, Value::Rational(1, 0))
            .entry(ExifTag::FNumber, Value::Rational(28, 0))
            .entry(ExifTag::FocalLength, Value::Rational(0, 0))
            .entry(ExifTag::ExposureBiasValue, Value::SRational(0, 1))
            .entry(ExifTag::ISOSpeedRatings, Value::Short(100));
        let gps = IfdBuilder::new(Endianness::Big)
            .entry(
                ExifTag::GPSLatitude,
                Value::Rationals(vec![(40, 0), (0, 1), (0, 1)]),
            )
            .entry(
                ExifTag::GPSLongitude,
                Value::Rationals(vec![(74, 1), (0, 1), (0, 1)]),
            );
        let buf = IfdBuilder::new(Endianness::Big)
            .entry(ExifTag::ExifOffset, Value::Ifd(exif))
            .entry(ExifTag::GPSInfo, Value::Ifd(gps))
            .build_jpeg();

        assert_eq!(
            decode(&buf).unwrap(),
            DecodedMetadata {
                iso: Some(100),
                ..Default::default()
            }
        );
    }

    #[test]
    fn every_truncation() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let buf = full_sample(Endianness::Big);
        let full = decode(&buf).unwrap();
        for len in 0..buf.len() {
            if let Some(meta) = decode(&buf[..len]) {
                // a cut inside a text value shortens it, nothing else
                // appears that isn't in the full result
                assert!(meta.iso.is_none() || meta.iso == full.iso);
                assert!(meta.latitude.is_none() || meta.latitude == full.latitude);
            }
        }
    }

    #[test]
    fn random_garbage() {
        let mut rng = rand::thread_rng();
        for _ in 0..2000 {
            let len = rng.gen_range(0..512);
            let mut buf = vec![0u8; len];
            rng.fill(&mut buf[..]);
            let _ = decode(&buf);

            // same, but behind a valid signature and Exif header
            let mut jpeg = jpeg_with_exif(&buf);
            let _ = decode(&jpeg);

            // corrupt a few bytes of a well-formed file
            jpeg = full_sample(Endianness::Little);
            for _ in 0..4 {
                let i = rng.gen_range(0..jpeg.len());
                jpeg[i] = rng.gen();
            }
            let _ = decode(&jpeg);
        }
    }

    #[test]
    fn read_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&full_sample(Endianness::Big)).unwrap();

        let meta = read_metadata_file(f.path()).unwrap().unwrap();
        assert_eq!(meta.camera.as_deref(), Some("FUJIFILM X100V"));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"not a photo").unwrap();
        assert_eq!(read_metadata_file(f.path()).unwrap(), None);

        assert!(matches!(
            read_metadata_file("./no/such/photo.jpg"),
            Err(Error::Io(_))
        ));
    }
}
