use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeightUnit {
    Kg,
    Lb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DimensionUnit {
    Cm,
    In,
}

/// Any unit the converter understands. Mass and length units never convert
/// into one another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    Kg,
    Lb,
    Cm,
    In,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitKind {
    Mass,
    Length,
}

impl Unit {
    pub fn kind(self) -> UnitKind {
        match self {
            Self::Kg | Self::Lb => UnitKind::Mass,
            Self::Cm | Self::In => UnitKind::Length,
        }
    }
}

impl DimensionUnit {
    pub fn is_metric(self) -> bool {
        matches!(self, Self::Cm)
    }
}

impl From<WeightUnit> for Unit {
    fn from(value: WeightUnit) -> Self {
        match value {
            WeightUnit::Kg => Self::Kg,
            WeightUnit::Lb => Self::Lb,
        }
    }
}

impl From<DimensionUnit> for Unit {
    fn from(value: DimensionUnit) -> Self {
        match value {
            DimensionUnit::Cm => Self::Cm,
            DimensionUnit::In => Self::In,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Kg => "KG",
            Self::Lb => "LB",
            Self::Cm => "CM",
            Self::In => "IN",
        };
        f.write_str(label)
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Unit::from(*self).fmt(f)
    }
}

impl fmt::Display for DimensionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Unit::from(*self).fmt(f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit `{0}`")]
pub struct UnknownUnit(pub String);

impl FromStr for WeightUnit {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kg" | "kgs" => Ok(Self::Kg),
            "lb" | "lbs" => Ok(Self::Lb),
            other => Err(UnknownUnit(other.to_string())),
        }
    }
}

impl FromStr for DimensionUnit {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cm" => Ok(Self::Cm),
            "in" | "inch" | "inches" => Ok(Self::In),
            other => Err(UnknownUnit(other.to_string())),
        }
    }
}
