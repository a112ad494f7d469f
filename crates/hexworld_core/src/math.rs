//! Fixed-point math utilities for deterministic classification and movement.
//!
//! Elevation, moisture, thresholds and movement costs are all fixed-point so
//! that two worlds built from the same inputs classify and move identically
//! on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for all world quantities.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// One half, used for road movement.
pub const HALF: Fixed = Fixed::from_bits(1 << 31);

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for hand-edited fixed-point values.
///
/// Config files carry decimals (`0.66`), not raw bits. The value is rounded
/// to the nearest representable fixed-point number once, at load time.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half() {
        assert_eq!(HALF, Fixed::from_num(0.5));
        assert_eq!(HALF + HALF, Fixed::ONE);
    }

    #[test]
    fn test_decimal_conversion_determinism() {
        // Same decimal must land on the same bits every time
        let a = Fixed::from_num(0.66);
        let b = Fixed::from_num(0.66);
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(Fixed::from_num(0.6) < Fixed::from_num(0.66));
    }
}
