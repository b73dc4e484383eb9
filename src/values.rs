use std::fmt::Display;

use crate::reader::ByteReader;

pub type URational = Rational<u32>;
pub type IRational = Rational<i32>;

/// A numerator/denominator pair as stored in Exif RATIONAL/SRATIONAL
/// values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Rational<T>(pub T, pub T);

impl<T> Rational<T>
where
    T: Copy + Into<f64> + PartialEq + Default,
{
    /// Returns `None` when the denominator is zero.
    pub fn to_float(&self) -> Option<f64> {
        if self.1 == T::default() {
            None
        } else {
            Some(self.0.into() / self.1.into())
        }
    }
}

impl<T> From<(T, T)> for Rational<T>
where
    T: Copy,
{
    fn from(value: (T, T)) -> Self {
        Self(value.0, value.1)
    }
}

impl<T: Display> Display for Rational<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

pub(crate) fn read_urational(reader: &ByteReader, offset: usize) -> crate::Result<URational> {
    let numerator = reader.u32_at(offset)?;
    let denominator = reader.u32_at(offset.saturating_add(4))?;
    Ok(Rational(numerator, denominator))
}

pub(crate) fn read_irational(reader: &ByteReader, offset: usize) -> crate::Result<IRational> {
    let numerator = reader.i32_at(offset)?;
    let denominator = reader.i32_at(offset.saturating_add(4))?;
    Ok(Rational(numerator, denominator))
}
