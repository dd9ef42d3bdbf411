use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelRate {
    pub id: String,
    pub provider: String,
    pub rate_pct: Decimal,
    pub effective_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl FuelRate {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_date <= date
            && self.expiration_date.map_or(true, |expiration| date <= expiration)
    }
}
