pub mod config;
pub mod domain;
pub mod errors;
pub mod freight;

pub use domain::package::{PackageAttributes, PackageRequest};
pub use domain::product::{Product, ProductId};
pub use domain::result::{Diagnostic, Diagnostics, PricedResult};
pub use domain::zone::ZoneId;
pub use errors::{ApplicationError, InterfaceError, PricingError};
pub use freight::{run_batch, BatchCancellation, FreightSources, PricingOrchestrator};
