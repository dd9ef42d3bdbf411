pub mod fuel;
pub mod money;
pub mod package;
pub mod product;
pub mod rate;
pub mod result;
pub mod surcharge;
pub mod units;
pub mod zone;
