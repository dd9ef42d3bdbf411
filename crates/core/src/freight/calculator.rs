use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::base::BaseFreightCalculator;
use super::cache::{ProductSnapshot, RateCache};
use super::fuel::{FuelRateResolution, FuelRateResolver};
use super::fuel_surcharge::FuelSurchargeCalculator;
use super::sources::FreightSources;
use super::surcharge::SurchargeEngine;
use super::units::{convert, Rounding, UnitError};
use super::volumetric::{chargeable_weight, VolumetricWeightEngine};
use super::zone::{ZoneResolution, ZoneResolver};
use super::zone_key::normalize_zone_key;
use crate::config::{CacheConfig, PricingConfig};
use crate::domain::money::{round_money, ChargeOverflow};
use crate::domain::package::{order_sides, PackageAttributes, PackageRequest};
use crate::domain::product::ProductId;
use crate::domain::result::{Diagnostic, Diagnostics, FuelRateSource, PricedResult, ZoneSource};
use crate::domain::units::{DimensionUnit, WeightUnit};
use crate::errors::PricingError;

/// Zone and fuel rate already resolved for one calculation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingContext {
    pub calculation_date: NaiveDate,
    pub zone: ZoneResolution,
    pub fuel: FuelRateResolution,
}

/// Single entry point for pricing a package.
///
/// Owns the three read-through caches; they are shared by every calculation
/// (and every batch worker) that goes through this orchestrator.
pub struct PricingOrchestrator {
    rates: Arc<RateCache>,
    zones: Arc<ZoneResolver>,
    fuel_rates: Arc<FuelRateResolver>,
    config: PricingConfig,
    volumetric: VolumetricWeightEngine,
    base: BaseFreightCalculator,
    fuel_surcharge: FuelSurchargeCalculator,
    surcharges: SurchargeEngine,
}

impl PricingOrchestrator {
    pub fn new(
        rates: Arc<RateCache>,
        zones: Arc<ZoneResolver>,
        fuel_rates: Arc<FuelRateResolver>,
        config: PricingConfig,
    ) -> Self {
        Self {
            rates,
            zones,
            fuel_rates,
            volumetric: VolumetricWeightEngine::new(
                config.default_dim_divisor_metric,
                config.default_dim_divisor_imperial,
            ),
            base: BaseFreightCalculator,
            fuel_surcharge: FuelSurchargeCalculator::new(config.minimum_fuel_fee),
            surcharges: SurchargeEngine,
            config,
        }
    }

    /// Builds the caches over `sources` from configuration.
    pub fn from_sources(sources: FreightSources, pricing: PricingConfig, cache: &CacheConfig) -> Self {
        let zones = ZoneResolver::new(sources.zones.clone(), pricing.default_zone, cache.zone_ttl());
        let fuel_rates = FuelRateResolver::new(
            sources.fuel_rates.clone(),
            pricing.default_fuel_rate_pct,
            cache.fuel_ttl(),
        );
        Self::new(Arc::new(RateCache::new(sources)), Arc::new(zones), Arc::new(fuel_rates), pricing)
    }

    pub fn rate_cache(&self) -> &RateCache {
        &self.rates
    }

    pub fn zone_resolver(&self) -> &ZoneResolver {
        &self.zones
    }

    pub fn fuel_rate_resolver(&self) -> &FuelRateResolver {
        &self.fuel_rates
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub async fn calculate(&self, request: &PackageRequest) -> Result<PricedResult, PricingError> {
        let product_id = validate_request(request, self.config.strict_input)?;
        let calculation_date = request.calculation_date.unwrap_or_else(|| Utc::now().date_naive());

        let snapshot = self.rates.snapshot(&product_id).await?;
        if !snapshot.product.is_available_on(calculation_date) {
            return Err(PricingError::ProductUnavailable { product_id, date: calculation_date });
        }

        let zone_override = request
            .zone_override
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .map(|label| {
                normalize_zone_key(label).ok_or_else(|| {
                    PricingError::invalid_input("zoneOverride", format!("`{label}` is not a zone"))
                })
            })
            .transpose()?;

        let zone_lookup = async {
            match zone_override {
                Some(zone) => {
                    ZoneResolution { zone, source: ZoneSource::Override, fallback_reason: None }
                }
                None => self.zones.resolve(&request.origin_postal, &request.dest_postal).await,
            }
        };
        let (zone, fuel) = tokio::join!(
            zone_lookup,
            self.fuel_rates.resolve(&snapshot.product.provider, calculation_date)
        );

        let context = PricingContext { calculation_date, zone, fuel };
        self.price_snapshot(&snapshot, request, &context)
    }

    /// The synchronous pricing chain over an already loaded snapshot.
    pub fn price_snapshot(
        &self,
        snapshot: &ProductSnapshot,
        request: &PackageRequest,
        context: &PricingContext,
    ) -> Result<PricedResult, PricingError> {
        let product = &snapshot.product;
        let mut reasons = Vec::new();

        let (weight_unit, dimension_unit) = (product.weight_unit, product.dimension_unit);
        let measured = self.measure(request, weight_unit, dimension_unit, &mut reasons);
        let attributes = measured.express(weight_unit, dimension_unit, Rounding::Ceiling)?;
        // Limits apply to the measurements as sent, before billing rounds them up.
        let declared = measured.express(WeightUnit::Lb, DimensionUnit::In, Rounding::HalfUp)?;

        let divisor = self.volumetric.divisor_for(product);
        let volumetric_native = self
            .volumetric
            .dimensional_weight(attributes.length, attributes.width, attributes.height, divisor)
            .map_err(|error| PricingError::invalid_input("dimensions", error.to_string()))?;
        let volumetric_unit =
            if product.dimension_unit.is_metric() { WeightUnit::Kg } else { WeightUnit::Lb };
        let volumetric_weight = convert(
            volumetric_native,
            volumetric_unit.into(),
            product.weight_unit.into(),
            Rounding::Ceiling,
        )
        .map_err(conversion_error("dimensions", "dimensionUnit"))?;
        let chargeable = chargeable_weight(attributes.weight, volumetric_weight);

        let zone = context.zone.zone;
        if context.zone.source == ZoneSource::Default {
            reasons.push(Diagnostic::ZoneDefaulted {
                origin: request.origin_postal.clone(),
                destination: request.dest_postal.clone(),
                reason: context.zone.fallback_reason.clone().unwrap_or_default(),
            });
        }
        if context.fuel.source == FuelRateSource::Default {
            reasons.push(Diagnostic::FuelRateDefaulted {
                provider: product.provider.clone(),
                date: context.calculation_date,
            });
        }

        let base = self.base.calculate(&snapshot.rate_table, chargeable, zone)?;
        reasons.extend(base.diagnostic.clone());

        let fuel = self.fuel_surcharge.calculate(base.amount, context.fuel.rate_pct)?;
        let surcharges = self.surcharges.evaluate(
            &snapshot.surcharges,
            &attributes,
            zone,
            context.calculation_date,
        );
        reasons.extend(snapshot.surcharges.rejected.iter().map(|rejected| {
            Diagnostic::InvalidSurchargeCondition {
                surcharge_id: rejected.surcharge_id.clone(),
                condition: rejected.condition.clone(),
                message: rejected.message.clone(),
            }
        }));
        if !snapshot.rate_table.dropped_keys().is_empty() {
            reasons.push(Diagnostic::ZoneKeysDropped {
                keys: snapshot.rate_table.dropped_keys().to_vec(),
            });
        }

        let surcharge_total: Decimal = surcharges.iter().map(|line| line.amount).sum();
        let total_charge = base
            .amount
            .checked_add(fuel.amount)
            .and_then(|subtotal| subtotal.checked_add(surcharge_total))
            .map(round_money)
            .ok_or(ChargeOverflow)?;

        let unauthorized_reasons = self
            .config
            .limits
            .violations(&declared)
            .map_err(conversion_error("dimensions", "dimensionUnit"))?;

        debug!(
            event_name = "freight.price.calculated",
            product_id = %product.id,
            zone = %zone,
            chargeable_weight = %chargeable,
            total_charge = %total_charge,
            diagnostics = reasons.len(),
            "package priced"
        );

        Ok(PricedResult {
            product_id: product.id.clone(),
            calculation_date: context.calculation_date,
            weight_unit: product.weight_unit,
            chargeable_weight: chargeable,
            volumetric_weight,
            zone,
            base_charge: base.amount,
            fuel_rate_pct: fuel.rate_pct,
            fuel_surcharge: fuel.amount,
            surcharges,
            total_charge,
            currency: product.currency.clone(),
            unauthorized_reasons,
            diagnostics: Diagnostics {
                reasons,
                matched_band_weight: Some(base.band_weight),
                zone_key_used: Some(base.zone_key),
                zone_source: context.zone.source,
                fuel_rate_source: context.fuel.source,
                fuel_rate_id: context.fuel.fuel_rate_id.clone(),
            },
        })
    }

    /// Request measurements with placeholders applied, each paired with the
    /// unit it was given in. Placeholders are in the product's own units.
    fn measure(
        &self,
        request: &PackageRequest,
        weight_unit: WeightUnit,
        dimension_unit: DimensionUnit,
        reasons: &mut Vec<Diagnostic>,
    ) -> Measurements {
        let mut placeholder = |field: &str, supplied: Option<Decimal>, value: Decimal| {
            supplied.unwrap_or_else(|| {
                warn!(
                    event_name = "freight.input.placeholder_applied",
                    product_id = %request.product_id,
                    field = field,
                    value = %value,
                    "missing measurement replaced by placeholder"
                );
                reasons.push(Diagnostic::PlaceholderApplied { field: field.to_string(), value });
                value
            })
        };

        let weight = placeholder("weight", request.weight, self.config.placeholder_weight);
        let length = placeholder("length", request.length, self.config.placeholder_dimension);
        let width = placeholder("width", request.width, self.config.placeholder_dimension);
        let height = placeholder("height", request.height, self.config.placeholder_dimension);

        let from_weight = request.weight.and(request.weight_unit).unwrap_or(weight_unit);
        let from_dimension = request.dimension_unit.unwrap_or(dimension_unit);
        let side = |supplied: Option<Decimal>, value: Decimal| {
            (value, if supplied.is_some() { from_dimension } else { dimension_unit })
        };

        Measurements {
            weight: (weight, from_weight),
            sides: [
                side(request.length, length),
                side(request.width, width),
                side(request.height, height),
            ],
            is_residential: request.is_residential,
            remote_area_level: request.remote_area_level,
        }
    }
}

/// Package measurements as received, before any unit conversion.
struct Measurements {
    weight: (Decimal, WeightUnit),
    sides: [(Decimal, DimensionUnit); 3],
    is_residential: bool,
    remote_area_level: u8,
}

impl Measurements {
    /// The package in the given units with sides ordered longest first.
    fn express(
        &self,
        weight_unit: WeightUnit,
        dimension_unit: DimensionUnit,
        rounding: Rounding,
    ) -> Result<PackageAttributes, PricingError> {
        let (weight, from) = self.weight;
        let weight = convert(weight, from.into(), weight_unit.into(), rounding)
            .map_err(conversion_error("weight", "weightUnit"))?;

        let mut sides = [Decimal::ZERO; 3];
        for (converted, (value, from)) in sides.iter_mut().zip(self.sides) {
            *converted = convert(value, from.into(), dimension_unit.into(), rounding)
                .map_err(conversion_error("dimensions", "dimensionUnit"))?;
        }
        let (length, width, height) = order_sides(sides[0], sides[1], sides[2]);

        Ok(PackageAttributes {
            weight,
            weight_unit,
            length,
            width,
            height,
            dimension_unit,
            is_residential: self.is_residential,
            remote_area_level: self.remote_area_level,
        })
    }
}

/// Overflow blames the measurement, anything else the unit.
fn conversion_error(
    value_field: &'static str,
    unit_field: &'static str,
) -> impl Fn(UnitError) -> PricingError {
    move |error| {
        let field =
            if matches!(error, UnitError::Overflow { .. }) { value_field } else { unit_field };
        PricingError::invalid_input(field, error.to_string())
    }
}

/// Structural checks that need no product data.
fn validate_request(request: &PackageRequest, strict_input: bool) -> Result<ProductId, PricingError> {
    let product_id = request.product_id.trim();
    if product_id.is_empty() {
        return Err(PricingError::invalid_input("productId", "is required"));
    }

    let measurements = [
        ("weight", request.weight),
        ("length", request.length),
        ("width", request.width),
        ("height", request.height),
    ];
    for (field, value) in measurements {
        match value {
            Some(value) if value <= Decimal::ZERO => {
                return Err(PricingError::invalid_input(
                    field,
                    format!("must be greater than zero, got {value}"),
                ));
            }
            None if strict_input => {
                return Err(PricingError::invalid_input(field, "is required"));
            }
            _ => {}
        }
    }

    Ok(ProductId(product_id.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::PricingOrchestrator;
    use crate::config::{CacheConfig, PricingConfig};
    use crate::domain::package::PackageRequest;
    use crate::domain::result::{Diagnostic, FuelRateSource, ZoneSource};
    use crate::domain::surcharge::Surcharge;
    use crate::domain::units::{DimensionUnit, WeightUnit};
    use crate::domain::zone::ZoneId;
    use crate::errors::PricingError;
    use crate::freight::test_support::{day, ground, ground_store, step_band, FakeStore};
    use crate::freight::zone::ZoneTable;

    fn cache_config() -> CacheConfig {
        CacheConfig { zone_ttl_secs: 300, fuel_ttl_secs: 0 }
    }

    fn orchestrator(store: &Arc<FakeStore>, pricing: PricingConfig) -> PricingOrchestrator {
        PricingOrchestrator::from_sources(store.sources(), pricing, &cache_config())
    }

    fn request(weight: i64) -> PackageRequest {
        PackageRequest {
            product_id: "ground".to_string(),
            weight: Some(Decimal::from(weight)),
            weight_unit: Some(WeightUnit::Kg),
            origin_postal: "10001".to_string(),
            dest_postal: "94105".to_string(),
            calculation_date: Some(day(3, 1)),
            ..PackageRequest::default()
        }
    }

    #[tokio::test]
    async fn three_kilograms_price_in_the_five_kilogram_band() {
        let store = ground_store().await;
        let result = orchestrator(&store, PricingConfig::default())
            .calculate(&request(3))
            .await
            .expect("priced");

        assert_eq!(result.base_charge.to_string(), "20.00");
        assert_eq!(result.fuel_surcharge.to_string(), "1.95");
        assert_eq!(result.total_charge.to_string(), "21.95");
        assert_eq!(result.chargeable_weight, Decimal::from(3));
        assert_eq!(result.zone, ZoneId(1));
        assert_eq!(result.diagnostics.matched_band_weight, Some(Decimal::from(5)));
        assert_eq!(result.diagnostics.zone_key_used.as_deref(), Some("zone1"));
        assert_eq!(result.diagnostics.zone_source, ZoneSource::Resolved);
        assert_eq!(result.diagnostics.fuel_rate_source, FuelRateSource::Configured);
        assert!(result.is_authorized());

        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["baseCharge"], "20.00");
        assert_eq!(json["zone"], "ZONE1");
    }

    #[tokio::test]
    async fn unpriced_zone_yields_zero_fuel_and_a_diagnostic() {
        let store = ground_store().await;
        store.surcharges.write().await.insert(
            ground(),
            vec![Surcharge {
                id: "residential".to_string(),
                surcharge_type: "RESIDENTIAL".to_string(),
                sub_type: None,
                name: "Residential delivery".to_string(),
                condition: "residential".to_string(),
                fees: BTreeMap::from([("default".to_string(), Decimal::new(450, 2))]),
                display_order: 1,
            }],
        );
        let orchestrator = orchestrator(&store, PricingConfig::default());

        let mut package = request(3);
        package.zone_override = Some("Zone 7".to_string());
        package.is_residential = true;
        let result = orchestrator.calculate(&package).await.expect("priced");

        assert_eq!(result.zone, ZoneId(7));
        assert_eq!(result.diagnostics.zone_source, ZoneSource::Override);
        assert_eq!(result.base_charge.to_string(), "0.00");
        assert_eq!(result.fuel_surcharge.to_string(), "0.00");
        assert_eq!(result.total_charge.to_string(), "4.50");
        assert!(result.has_diagnostic(|reason| matches!(
            reason,
            Diagnostic::RateNotConfigured { zone: ZoneId(7), .. }
        )));
    }

    #[tokio::test]
    async fn oversized_package_reports_length_plus_girth() {
        let store = ground_store().await;
        store.products.write().await[0].dimension_unit = DimensionUnit::In;
        let mut package = request(3);
        package.length = Some(Decimal::from(20));
        package.width = Some(Decimal::from(120));
        package.height = Some(Decimal::from(20));
        package.dimension_unit = Some(DimensionUnit::In);

        let result = orchestrator(&store, PricingConfig::default())
            .calculate(&package)
            .await
            .expect("priced");

        assert!(!result.is_authorized());
        assert!(result
            .unauthorized_reasons
            .iter()
            .any(|reason| reason == "length plus girth 200 in exceeds the 165 in limit"));
        assert!(result
            .unauthorized_reasons
            .iter()
            .any(|reason| reason.starts_with("longest side 120")));
    }

    #[tokio::test]
    async fn imperial_package_at_limits_is_authorized_on_a_metric_product() {
        let store = ground_store().await;
        let orchestrator = orchestrator(&store, PricingConfig::default());
        let mut package = request(150);
        package.weight_unit = Some(WeightUnit::Lb);
        package.length = Some(Decimal::from(108));
        package.width = Some(Decimal::from(10));
        package.height = Some(Decimal::from(10));
        package.dimension_unit = Some(DimensionUnit::In);

        let result = orchestrator.calculate(&package).await.expect("priced");
        // Billing still rounds up: 150 lb -> 69 kg, 108 in -> 275 cm.
        assert_eq!(result.chargeable_weight, Decimal::from(69));
        assert!(result.unauthorized_reasons.is_empty(), "{:?}", result.unauthorized_reasons);

        package.weight = Some(Decimal::from(151));
        package.length = Some(Decimal::new(1081, 1));
        let result = orchestrator.calculate(&package).await.expect("priced");
        assert_eq!(
            result.unauthorized_reasons,
            vec![
                "weight 151 lb exceeds the 150 lb limit".to_string(),
                "longest side 108.1 in exceeds the 108 in limit".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn out_of_range_dimensions_are_invalid_input() {
        let store = ground_store().await;
        let side = Some(Decimal::from(10_000_000_000_000_i64));
        let mut package = request(3);
        package.length = side;
        package.width = side;
        package.height = side;
        package.dimension_unit = Some(DimensionUnit::In);

        let result = orchestrator(&store, PricingConfig::default()).calculate(&package).await;
        assert!(matches!(result, Err(PricingError::InvalidInput { field: "dimensions", .. })));

        let mut heavy = request(3);
        heavy.weight = Some(Decimal::MAX);
        let result = orchestrator(&store, PricingConfig::default()).calculate(&heavy).await;
        assert!(matches!(result, Err(PricingError::InvalidInput { field: "weight", .. })));
    }

    #[tokio::test]
    async fn pounds_round_up_before_band_lookup() {
        let store = ground_store().await;
        let mut package = request(1);
        package.weight_unit = Some(WeightUnit::Lb);

        let result = orchestrator(&store, PricingConfig::default())
            .calculate(&package)
            .await
            .expect("priced");

        assert_eq!(result.chargeable_weight, Decimal::ONE);
        assert_eq!(result.base_charge.to_string(), "10.00");
    }

    #[tokio::test]
    async fn volumetric_weight_can_drive_the_band() {
        let store = ground_store().await;
        let mut package = request(1);
        package.length = Some(Decimal::from(30));
        package.width = Some(Decimal::from(20));
        package.height = Some(Decimal::from(20));
        package.dimension_unit = Some(DimensionUnit::Cm);

        let result = orchestrator(&store, PricingConfig::default())
            .calculate(&package)
            .await
            .expect("priced");

        // 12000 / 5000 = 2.4 -> 3 kg
        assert_eq!(result.volumetric_weight, Decimal::from(3));
        assert_eq!(result.chargeable_weight, Decimal::from(3));
        assert_eq!(result.base_charge.to_string(), "20.00");
    }

    #[tokio::test]
    async fn missing_measurements_use_placeholders_unless_strict() {
        let store = ground_store().await;
        let package = PackageRequest {
            product_id: "ground".to_string(),
            calculation_date: Some(day(3, 1)),
            ..PackageRequest::default()
        };

        let lenient = orchestrator(&store, PricingConfig::default())
            .calculate(&package)
            .await
            .expect("priced");
        assert_eq!(lenient.chargeable_weight, Decimal::ONE);
        let placeholders = lenient
            .diagnostics
            .reasons
            .iter()
            .filter(|reason| matches!(reason, Diagnostic::PlaceholderApplied { .. }))
            .count();
        assert_eq!(placeholders, 4);

        let strict = PricingConfig { strict_input: true, ..PricingConfig::default() };
        let error = orchestrator(&store, strict).calculate(&package).await;
        assert_eq!(error, Err(PricingError::invalid_input("weight", "is required")));
    }

    #[tokio::test]
    async fn structurally_invalid_input_is_terminal() {
        let store = ground_store().await;
        let orchestrator = orchestrator(&store, PricingConfig::default());

        let mut blank = request(3);
        blank.product_id = "  ".to_string();
        assert!(matches!(
            orchestrator.calculate(&blank).await,
            Err(PricingError::InvalidInput { field: "productId", .. })
        ));

        let negative = request(-2);
        assert!(matches!(
            orchestrator.calculate(&negative).await,
            Err(PricingError::InvalidInput { field: "weight", .. })
        ));

        let mut bad_zone = request(3);
        bad_zone.zone_override = Some("somewhere".to_string());
        assert!(matches!(
            orchestrator.calculate(&bad_zone).await,
            Err(PricingError::InvalidInput { field: "zoneOverride", .. })
        ));
    }

    #[tokio::test]
    async fn unknown_and_unavailable_products_are_terminal() {
        let store = ground_store().await;
        let orchestrator = orchestrator(&store, PricingConfig::default());

        let mut missing = request(3);
        missing.product_id = "express".to_string();
        assert!(matches!(
            orchestrator.calculate(&missing).await,
            Err(PricingError::ProductNotFound(_))
        ));

        let mut early = request(3);
        early.calculation_date = Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 1).expect("date"));
        assert!(matches!(
            orchestrator.calculate(&early).await,
            Err(PricingError::ProductUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn product_without_bands_is_no_weight_band() {
        let store = ground_store().await;
        store.bands.write().await.clear();

        let result = orchestrator(&store, PricingConfig::default()).calculate(&request(3)).await;
        assert!(matches!(result, Err(PricingError::NoWeightBand { .. })));
    }

    #[tokio::test]
    async fn missing_zone_and_fuel_rate_degrade_to_defaults() {
        let store = ground_store().await;
        *store.zones.write().await = ZoneTable::default();
        store.fuel_rates.write().await.clear();
        let pricing = PricingConfig {
            default_zone: ZoneId(1),
            default_fuel_rate_pct: Decimal::from(10),
            ..PricingConfig::default()
        };

        let result = orchestrator(&store, pricing).calculate(&request(3)).await.expect("priced");

        assert_eq!(result.zone, ZoneId(1));
        assert_eq!(result.fuel_surcharge.to_string(), "2.00");
        assert!(result.has_diagnostic(|reason| matches!(reason, Diagnostic::ZoneDefaulted { .. })));
        assert!(result.has_diagnostic(|reason| matches!(reason, Diagnostic::FuelRateDefaulted { .. })));
    }

    #[tokio::test]
    async fn rate_edits_apply_after_invalidation() {
        let store = ground_store().await;
        let orchestrator = orchestrator(&store, PricingConfig::default());

        let before = orchestrator.calculate(&request(3)).await.expect("priced");
        store
            .bands
            .write()
            .await
            .insert(ground(), vec![step_band(5, &[("zone1", 35)])]);

        let cached = orchestrator.calculate(&request(3)).await.expect("priced");
        assert_eq!(cached.base_charge, before.base_charge);
        assert_eq!(store.band_reads(), 1);

        orchestrator.rate_cache().invalidate(&ground()).await;
        let after = orchestrator.calculate(&request(3)).await.expect("priced");
        assert_eq!(after.base_charge.to_string(), "35.00");
        assert_eq!(store.band_reads(), 2);
    }
}
