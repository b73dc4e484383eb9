//! Exif tags read by the decoder, see
//! https://exiftool.org/TagNames/EXIF.html and
//! https://exiftool.org/TagNames/GPS.html

use std::fmt::Display;

/// Tags the decoder extracts. Codes are only unique within their own
/// directory: the GPS tags live in the GPS sub-IFD and reuse small numbers.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) enum ExifTag {
    // ifd0
    Make = 0x010f,
    Model = 0x0110,
    ExifOffset = 0x8769,
    GPSInfo = 0x8825,

    // exif sub-ifd
    ExposureTime = 0x829a,
    FNumber = 0x829d,
    ISOSpeedRatings = 0x8827,
    DateTimeOriginal = 0x9003,
    ExposureBiasValue = 0x9204,
    FocalLength = 0x920a,
    FocalLengthIn35mmFilm = 0xa405,
    LensModel = 0xa434,

    // gps sub-ifd
    GPSLatitudeRef = 0x0001,
    GPSLatitude = 0x0002,
    GPSLongitudeRef = 0x0003,
    GPSLongitude = 0x0004,
}

impl ExifTag {
    pub const fn code(self) -> u16 {
        self as u16
    }
}

impl Display for ExifTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}(0x{:04x})", self.code())
    }
}
