use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of stored units per loyalty point. Amounts are kept to two decimal places.
pub const POINTS_SCALE: i64 = 100;

//--------------------------------------       Points         ---------------------------------------------------------
/// A loyalty point amount, stored as a whole number of hundredths of a point.
///
/// On the wire (JSON) points are plain numbers, e.g. `729.98`. In the database they are integers (`72998`).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in points: {0}")]
pub struct PointsConversionError(String);

impl Points {
    pub const ZERO: Points = Points(0);

    /// Creates an amount from a raw count of hundredths of a point.
    pub fn from_hundredths(value: i64) -> Self {
        Self(value)
    }

    /// Creates an amount of whole points.
    pub fn from_points(points: i64) -> Self {
        Self(points * POINTS_SCALE)
    }

    /// Converts a decimal number into points, rounding to the nearest hundredth.
    pub fn try_from_f64(value: f64) -> Result<Self, PointsConversionError> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        let scaled = (value * POINTS_SCALE as f64).round();
        if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(PointsConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as i64))
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / POINTS_SCALE as f64
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = POINTS_SCALE.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

impl FromStr for Points {
    type Err = PointsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|e| PointsConversionError(format!("{s}: {e}")))?;
        Self::try_from_f64(value)
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from_f64(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Points::from_points(500).to_string(), "500.00");
        assert_eq!(Points::from_hundredths(72998).to_string(), "729.98");
        assert_eq!(Points::from_hundredths(5).to_string(), "0.05");
        assert_eq!(Points::from_hundredths(-150).to_string(), "-1.50");
    }

    #[test]
    fn arithmetic() {
        let mut a = Points::from_points(50);
        a += Points::from_hundredths(25);
        assert_eq!(a, Points::from_hundredths(5025));
        a -= Points::from_points(100);
        assert!(a.is_negative());
        assert_eq!(-a, Points::from_hundredths(4975));
        let total: Points = [1, 2, 3].into_iter().map(Points::from_points).sum();
        assert_eq!(total, Points::from_points(6));
    }

    #[test]
    fn rounding_from_decimals() {
        assert_eq!(Points::try_from_f64(729.98).unwrap(), Points::from_hundredths(72998));
        assert_eq!(Points::try_from_f64(0.005).unwrap(), Points::from_hundredths(1));
        assert!(Points::try_from_f64(f64::NAN).is_err());
        assert!(Points::try_from_f64(f64::INFINITY).is_err());
        assert_eq!("12.5".parse::<Points>().unwrap(), Points::from_hundredths(1250));
        assert!("twelve".parse::<Points>().is_err());
    }

    #[test]
    fn json_numbers() {
        let p: Points = serde_json::from_str("500").unwrap();
        assert_eq!(p, Points::from_points(500));
        let p: Points = serde_json::from_str("729.98").unwrap();
        assert_eq!(p, Points::from_hundredths(72998));
        assert_eq!(serde_json::to_string(&Points::from_hundredths(72998)).unwrap(), "729.98");
        assert!(serde_json::from_str::<Points>("\"500\"").is_err());
    }
}
