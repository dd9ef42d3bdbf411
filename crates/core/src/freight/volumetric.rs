use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::product::Product;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DimensionError {
    #[error("{field} must be greater than zero, got {value}")]
    InvalidDimension { field: &'static str, value: Decimal },
    #[error("package volume {length} x {width} x {height} is out of range")]
    VolumeOverflow { length: Decimal, width: Decimal, height: Decimal },
}

/// Computes dimensional and chargeable weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumetricWeightEngine {
    default_divisor_metric: Decimal,
    default_divisor_imperial: Decimal,
}

impl Default for VolumetricWeightEngine {
    fn default() -> Self {
        Self::new(Decimal::from(5000), Decimal::from(139))
    }
}

impl VolumetricWeightEngine {
    pub fn new(default_divisor_metric: Decimal, default_divisor_imperial: Decimal) -> Self {
        Self { default_divisor_metric, default_divisor_imperial }
    }

    pub fn divisor_for(&self, product: &Product) -> Decimal {
        product.dim_factor.unwrap_or(if product.dimension_unit.is_metric() {
            self.default_divisor_metric
        } else {
            self.default_divisor_imperial
        })
    }

    /// `ceil(l * w * h / divisor)`.
    pub fn dimensional_weight(
        &self,
        length: Decimal,
        width: Decimal,
        height: Decimal,
        divisor: Decimal,
    ) -> Result<Decimal, DimensionError> {
        for (field, value) in
            [("length", length), ("width", width), ("height", height), ("divisor", divisor)]
        {
            if value <= Decimal::ZERO {
                return Err(DimensionError::InvalidDimension { field, value });
            }
        }

        length
            .checked_mul(width)
            .and_then(|area| area.checked_mul(height))
            .and_then(|volume| volume.checked_div(divisor))
            .map(|weight| weight.ceil())
            .ok_or(DimensionError::VolumeOverflow { length, width, height })
    }
}

pub fn chargeable_weight(actual: Decimal, dimensional: Decimal) -> Decimal {
    actual.max(dimensional)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{chargeable_weight, DimensionError, VolumetricWeightEngine};

    #[test]
    fn dimensional_weight_rounds_up() {
        let engine = VolumetricWeightEngine::default();
        let weight = engine
            .dimensional_weight(
                Decimal::from(30),
                Decimal::from(20),
                Decimal::from(10),
                Decimal::from(5000),
            )
            .expect("valid dimensions");
        // 6000 / 5000 = 1.2
        assert_eq!(weight, Decimal::from(2));
    }

    #[test]
    fn non_positive_side_is_rejected() {
        let engine = VolumetricWeightEngine::default();
        let error = engine
            .dimensional_weight(Decimal::ZERO, Decimal::ONE, Decimal::ONE, Decimal::from(139))
            .expect_err("zero length must fail");
        assert_eq!(error, DimensionError::InvalidDimension { field: "length", value: Decimal::ZERO });
    }

    #[test]
    fn oversized_volume_is_an_error() {
        let engine = VolumetricWeightEngine::default();
        let side = Decimal::from(10_000_000_000_000_i64);
        let error = engine
            .dimensional_weight(side, side, side, Decimal::from(139))
            .expect_err("1e39 cubic inches cannot be represented");
        assert_eq!(error, DimensionError::VolumeOverflow { length: side, width: side, height: side });
    }

    #[test]
    fn chargeable_weight_is_the_larger_of_the_two() {
        let cases = [(1, 5), (5, 1), (3, 3), (0, 0)];
        for (actual, dimensional) in cases {
            let actual = Decimal::from(actual);
            let dimensional = Decimal::from(dimensional);
            let chargeable = chargeable_weight(actual, dimensional);
            assert!(chargeable >= actual && chargeable >= dimensional);
            assert_eq!(chargeable, actual.max(dimensional));
        }
    }
}
