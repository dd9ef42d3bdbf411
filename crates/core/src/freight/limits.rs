use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::units::{convert, Rounding, UnitError};
use crate::domain::package::PackageAttributes;
use crate::domain::units::Unit;

/// Carrier acceptance limits, always expressed in pounds and inches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageLimits {
    pub max_weight_lb: Decimal,
    pub max_length_in: Decimal,
    pub max_length_girth_in: Decimal,
}

impl Default for PackageLimits {
    fn default() -> Self {
        Self {
            max_weight_lb: Decimal::from(150),
            max_length_in: Decimal::from(108),
            max_length_girth_in: Decimal::from(165),
        }
    }
}

impl PackageLimits {
    /// Human-readable reasons the package cannot ship, in weight, length,
    /// length-plus-girth order. Empty when the package is within limits.
    pub fn violations(&self, attributes: &PackageAttributes) -> Result<Vec<String>, UnitError> {
        let to_in = |value: Decimal| {
            convert(value, attributes.dimension_unit.into(), Unit::In, Rounding::HalfUp)
        };
        let weight = convert(attributes.weight, attributes.weight_unit.into(), Unit::Lb, Rounding::HalfUp)?;
        let length = to_in(attributes.length)?;
        let girth = length + Decimal::TWO * (to_in(attributes.width)? + to_in(attributes.height)?);

        let mut reasons = Vec::new();
        if weight > self.max_weight_lb {
            reasons.push(format!(
                "weight {weight} lb exceeds the {} lb limit",
                self.max_weight_lb
            ));
        }
        if length > self.max_length_in {
            reasons.push(format!(
                "longest side {length} in exceeds the {} in limit",
                self.max_length_in
            ));
        }
        if girth > self.max_length_girth_in {
            reasons.push(format!(
                "length plus girth {girth} in exceeds the {} in limit",
                self.max_length_girth_in
            ));
        }

        Ok(reasons)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::PackageLimits;
    use crate::domain::package::PackageAttributes;
    use crate::domain::units::{DimensionUnit, WeightUnit};

    fn package(weight: Decimal, length: i64, width: i64, height: i64) -> PackageAttributes {
        PackageAttributes {
            weight,
            weight_unit: WeightUnit::Lb,
            length: Decimal::from(length),
            width: Decimal::from(width),
            height: Decimal::from(height),
            dimension_unit: DimensionUnit::In,
            is_residential: false,
            remote_area_level: 0,
        }
    }

    #[test]
    fn girth_violation_is_reported() {
        let reasons = PackageLimits::default()
            .violations(&package(Decimal::from(20), 120, 20, 20))
            .expect("imperial units convert");

        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].starts_with("longest side 120 in"));
        // 120 + 2 * (20 + 20) = 200
        assert_eq!(reasons[1], "length plus girth 200 in exceeds the 165 in limit");
    }

    #[test]
    fn package_at_limits_is_authorized() {
        // 108 + 2 * (14 + 14) = 164
        let reasons = PackageLimits::default()
            .violations(&package(Decimal::from(150), 108, 14, 14))
            .expect("imperial units convert");
        assert!(reasons.is_empty());
    }

    #[test]
    fn metric_packages_are_checked_in_pounds() {
        let mut heavy = package(Decimal::from(70), 50, 40, 30);
        heavy.weight_unit = WeightUnit::Kg;
        heavy.dimension_unit = DimensionUnit::Cm;

        let reasons = PackageLimits::default().violations(&heavy).expect("metric units convert");
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].starts_with("weight 154.32 lb"));
    }
}
