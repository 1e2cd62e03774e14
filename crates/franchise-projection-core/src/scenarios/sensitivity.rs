use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::scenarios::scenario::ScenarioShifts;
use crate::ProjectionResult;

const PERCENT: Decimal = dec!(100);

/// Allowed range and granularity of one slider, in percent (or percentage
/// points for COGS).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderBounds {
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

pub const REVENUE_SLIDER: SliderBounds = SliderBounds {
    min: dec!(-50),
    max: dec!(50),
    step: dec!(1),
};

pub const COGS_SLIDER: SliderBounds = SliderBounds {
    min: dec!(-10),
    max: dec!(10),
    step: dec!(0.5),
};

pub const LABOR_SLIDER: SliderBounds = SliderBounds {
    min: dec!(-30),
    max: dec!(30),
    step: dec!(1),
};

pub const MARKETING_SLIDER: SliderBounds = SliderBounds {
    min: dec!(-50),
    max: dec!(50),
    step: dec!(1),
};

pub const FACILITIES_SLIDER: SliderBounds = SliderBounds {
    min: dec!(-30),
    max: dec!(30),
    step: dec!(1),
};

impl SliderBounds {
    /// Reject values outside `[min, max]` or off the step grid.
    pub fn validate(&self, field: &str, value: Decimal) -> ProjectionResult<()> {
        if value < self.min || value > self.max {
            return Err(ProjectionError::InvalidInput {
                field: field.into(),
                reason: format!("Must be between {} and {} (got {value})", self.min, self.max),
            });
        }
        if !((value - self.min) % self.step).is_zero() {
            return Err(ProjectionError::InvalidInput {
                field: field.into(),
                reason: format!("Must be a multiple of {} (got {value})", self.step),
            });
        }
        Ok(())
    }
}

/// The five what-if sliders. Revenue, labor, marketing and facilities are
/// percent changes; COGS is a percentage-point change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityKnobs {
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub labor: Decimal,
    pub marketing: Decimal,
    pub facilities: Decimal,
}

impl SensitivityKnobs {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Validate every knob against its slider and convert to fractional shifts.
    pub fn to_shifts(&self) -> ProjectionResult<ScenarioShifts> {
        REVENUE_SLIDER.validate("sensitivity.revenue", self.revenue)?;
        COGS_SLIDER.validate("sensitivity.cogs", self.cogs)?;
        LABOR_SLIDER.validate("sensitivity.labor", self.labor)?;
        MARKETING_SLIDER.validate("sensitivity.marketing", self.marketing)?;
        FACILITIES_SLIDER.validate("sensitivity.facilities", self.facilities)?;

        Ok(ScenarioShifts {
            revenue_pct: self.revenue / PERCENT,
            cogs_pp: self.cogs / PERCENT,
            labor_pct: self.labor / PERCENT,
            marketing_pct: self.marketing / PERCENT,
            facilities_pct: self.facilities / PERCENT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knobs_convert_to_fractions() {
        let knobs = SensitivityKnobs {
            revenue: dec!(-15),
            cogs: dec!(2.5),
            labor: dec!(5),
            marketing: dec!(10),
            facilities: dec!(-30),
        };
        let shifts = knobs.to_shifts().unwrap();
        assert_eq!(shifts.revenue_pct, dec!(-0.15));
        assert_eq!(shifts.cogs_pp, dec!(0.025));
        assert_eq!(shifts.facilities_pct, dec!(-0.30));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let knobs = SensitivityKnobs {
            revenue: dec!(51),
            ..Default::default()
        };
        match knobs.to_shifts().unwrap_err() {
            ProjectionError::InvalidInput { field, .. } => {
                assert_eq!(field, "sensitivity.revenue");
            }
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_off_step_rejected() {
        let knobs = SensitivityKnobs {
            cogs: dec!(0.25),
            ..Default::default()
        };
        match knobs.to_shifts().unwrap_err() {
            ProjectionError::InvalidInput { field, reason } => {
                assert_eq!(field, "sensitivity.cogs");
                assert!(reason.contains("multiple"));
            }
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_bounds_inclusive() {
        assert!(LABOR_SLIDER.validate("labor", dec!(-30)).is_ok());
        assert!(LABOR_SLIDER.validate("labor", dec!(30)).is_ok());
        assert!(COGS_SLIDER.validate("cogs", dec!(-9.5)).is_ok());
    }

    #[test]
    fn test_neutral() {
        assert!(SensitivityKnobs::default().is_neutral());
    }
}
