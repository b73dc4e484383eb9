use std::{fmt::Display, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::values::{IRational, Rational, URational};

/// Display-ready camera metadata of one photo.
///
/// Every field is independently optional: `None` means the tag was not
/// present (or held no usable value), never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodedMetadata {
    /// Capture date, e.g. `"Jul 9, 2023"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,

    /// Camera make and model, e.g. `"FUJIFILM X100V"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,

    /// Actual focal length, e.g. `"23mm"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,

    /// 35mm-equivalent focal length in mm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length_35mm: Option<u32>,

    /// e.g. `"f/2.8"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,

    /// e.g. `"1/250s"` or `"2s"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,

    /// e.g. `"+0.7 EV"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_bias: Option<String>,

    /// Decimal degrees, negative in the southern hemisphere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Decimal degrees, negative west of Greenwich.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl DecodedMetadata {
    /// True if nothing at all was decoded, i.e. there is no camera info to
    /// show.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Both coordinates, if the photo carries a GPS position.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// Label/value pairs of the present fields, in display order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        let mut push = |label, value: Option<String>| {
            if let Some(v) = value {
                fields.push((label, v));
            }
        };

        push("Date", self.date_taken.clone());
        push("Camera", self.camera.clone());
        push("Lens", self.lens.clone());
        push("Focal length", self.focal_length.clone());
        push(
            "35mm equivalent",
            self.focal_length_35mm.map(|v| format!("{v}mm")),
        );
        push("Aperture", self.aperture.clone());
        push("Shutter speed", self.shutter_speed.clone());
        push("ISO", self.iso.map(|v| format!("ISO {v}")));
        push("Exposure bias", self.exposure_bias.clone());
        push(
            "Position",
            self.position()
                .map(|(lat, lng)| format!("{lat:.5}, {lng:.5}")),
        );
        fields
    }
}

impl Display for DecodedMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("No camera info available");
        }
        let lines = self
            .fields()
            .into_iter()
            .map(|(label, value)| format!("{label:<16}{value}"))
            .collect::<Vec<_>>();
        f.write_str(&lines.join("\n"))
    }
}

static EXIF_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}):(\d{2}):(\d{2})\s+(\d{2}):(\d{2}):(\d{2})")
        .expect("exif date regex should compile")
});

/// Reformats the first `YYYY:MM:DD HH:MM:SS` found in `s` as a short
/// en-US date (`"Jul 9, 2023"`). Anything else is returned unchanged.
///
/// Impossible dates (`2023:13:40`) are kept verbatim rather than rolled
/// over into the following month or year.
pub(crate) fn format_date(s: &str) -> String {
    let Some(caps) = EXIF_DATE.captures(s) else {
        return s.to_owned();
    };
    let ymd = (
        caps[1].parse::<i32>(),
        caps[2].parse::<u32>(),
        caps[3].parse::<u32>(),
    );
    match ymd {
        (Ok(year), Ok(month), Ok(day)) => NaiveDate::from_ymd_opt(year, month, day)
            .map(|d| d.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| s.to_owned()),
        _ => s.to_owned(),
    }
}

pub(crate) fn format_shutter_speed(v: URational) -> Option<String> {
    let Rational(num, den) = v;
    if num == 0 || den == 0 {
        return None;
    }
    if num >= den {
        Some(format!("{}s", num as f64 / den as f64))
    } else {
        Some(format!("1/{}s", (den as f64 / num as f64).round()))
    }
}

/// `num / den` with one decimal, ties rounded up (`5/4` is `"1.3"`).
fn one_decimal(num: u64, den: u64) -> String {
    let tenths = (num * 20 + den) / (2 * den);
    format!("{}.{}", tenths / 10, tenths % 10)
}

pub(crate) fn format_aperture(v: URational) -> Option<String> {
    let Rational(num, den) = v;
    if num == 0 || den == 0 {
        return None;
    }
    Some(format!("f/{}", one_decimal(num.into(), den.into())))
}

pub(crate) fn format_focal_length(v: URational) -> Option<String> {
    v.to_float()
        .filter(|f| *f > 0.0)
        .map(|f| format!("{}mm", f.round()))
}

/// Signed EV with one decimal; ties round away from zero.
pub(crate) fn format_exposure_bias(v: IRational) -> Option<String> {
    let Rational(num, den) = v;
    if num == 0 || den == 0 {
        return None;
    }
    let sign = if (num < 0) == (den < 0) { "+" } else { "-" };
    let ev = one_decimal(num.unsigned_abs().into(), den.unsigned_abs().into());
    Some(format!("{sign}{ev} EV"))
}

/// Model alone if it already names the make (`"Canon"` + `"Canon EOS R5"`),
/// otherwise `"make model"`.
pub(crate) fn camera_name(make: Option<&str>, model: Option<&str>) -> Option<String> {
    if make.is_none() && model.is_none() {
        return None;
    }
    let make = make.unwrap_or_default().trim();
    let model = model.unwrap_or_default().trim();

    let name = if model.starts_with(make) {
        model.to_owned()
    } else {
        format!("{make} {model}").trim().to_owned()
    };
    (!name.is_empty()).then_some(name)
}
