use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::money::ChargeOverflow;
use crate::domain::product::ProductId;
use crate::freight::cache::SnapshotError;
use crate::freight::rate_table::RateTableError;
use crate::freight::sources::SourceError;

/// Terminal pricing failures. Anything recoverable is reported as a
/// diagnostic on the result instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("invalid input: {field} {message}")]
    InvalidInput { field: &'static str, message: String },
    #[error("product {0} was not found")]
    ProductNotFound(ProductId),
    #[error("product {product_id} is not available on {date}")]
    ProductUnavailable { product_id: ProductId, date: NaiveDate },
    #[error("product {product_id} has no weight bands configured")]
    NoWeightBand { product_id: ProductId },
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl PricingError {
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput { field, message: message.into() }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::ProductNotFound(_) => "product_not_found",
            Self::ProductUnavailable { .. } => "product_unavailable",
            Self::NoWeightBand { .. } => "no_weight_band",
            Self::Source(_) => "source_unavailable",
        }
    }
}

impl From<RateTableError> for PricingError {
    fn from(value: RateTableError) -> Self {
        match value {
            RateTableError::NoWeightBand { product_id } => Self::NoWeightBand { product_id },
            RateTableError::Unit(error) => Self::Source(SourceError::Decode(error.to_string())),
            RateTableError::Overflow(error) => error.into(),
        }
    }
}

impl From<ChargeOverflow> for PricingError {
    fn from(value: ChargeOverflow) -> Self {
        Self::invalid_input("weight", value.to_string())
    }
}

impl From<SnapshotError> for PricingError {
    fn from(value: SnapshotError) -> Self {
        match value {
            SnapshotError::NotFound(product_id) => Self::ProductNotFound(product_id),
            SnapshotError::Source(error) => Self::Source(error),
            SnapshotError::RateTable(error) => error.into(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { code: &'static str, message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { code: &'static str, message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { code: &'static str, message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { code: &'static str, message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested shipping product does not exist.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. }
            | Self::NotFound { code, .. }
            | Self::ServiceUnavailable { code, .. }
            | Self::Internal { code, .. } => code,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl PricingError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        ApplicationError::from(self).into_interface(correlation_id)
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = || "unassigned".to_owned();
        match value {
            ApplicationError::Pricing(error) => {
                let code = error.code();
                let message = error.to_string();
                match error {
                    PricingError::InvalidInput { .. } | PricingError::ProductUnavailable { .. } => {
                        Self::BadRequest { code, message, correlation_id: unassigned() }
                    }
                    PricingError::ProductNotFound(_) => {
                        Self::NotFound { code, message, correlation_id: unassigned() }
                    }
                    PricingError::Source(_) => {
                        Self::ServiceUnavailable { code, message, correlation_id: unassigned() }
                    }
                    PricingError::NoWeightBand { .. } => {
                        Self::Internal { code, message, correlation_id: unassigned() }
                    }
                }
            }
            ApplicationError::Persistence(message) => Self::ServiceUnavailable {
                code: "persistence",
                message,
                correlation_id: unassigned(),
            },
            ApplicationError::Configuration(message) => {
                Self::Internal { code: "configuration", message, correlation_id: unassigned() }
            }
        }
    }
}
