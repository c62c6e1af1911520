use std::fmt;

/// Signed 24.8 fixed-point number as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(i32);

impl Fixed {
    const SCALE: f64 = 256.0;

    pub const ZERO: Fixed = Fixed(0);

    /// Wrap a raw wire value.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_mul(256))
    }

    /// Integer part, truncated toward zero.
    pub const fn to_int(self) -> i32 {
        self.0 / 256
    }

    /// Nearest representable value; saturates outside the 24-bit range.
    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::SCALE).round() as i32)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / Self::SCALE
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl From<f64> for Fixed {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Fixed> for f64 {
    fn from(value: Fixed) -> Self {
        value.to_f64()
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
