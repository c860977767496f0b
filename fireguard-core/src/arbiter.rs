//! Alert Arbitration Across All Channels
//!
//! ## Overview
//!
//! The arbiter folds the last smoke, gas and environment readings into one
//! ordered [`AlertLevel`]. It is a pure function of an [`AlertInputs`]
//! snapshot: no state, no clock, no I/O.
//!
//! ## Rule Table
//!
//! Rules are tried in order and the first match wins. Order is the policy:
//! an explosive atmosphere outranks every fire pattern, a confirmed fire
//! outranks the cooking exception, and the cooking exception outranks the
//! indicator count.
//!
//! | # | Level            | Condition |
//! |---|------------------|-----------|
//! | 1 | `EXPLOSIVE`      | gas EXPLOSIVE |
//! | 2 | `GAS_CRITICAL`   | gas CRITICAL ∧ (smoke detected ∨ T > 45 °C) |
//! | 3 | `FIRE_CONFIRMED` | smoke CRITICAL ∧ T > 60 °C ∧ ΔP < −5 hPa |
//! | 4 | `FIRE_SUSPECTED` | env FIRE_SUSPECTED/RAPID_TEMP_RISE ∧ (smoke detected ∨ smoke > 300 ppm) |
//! | 5 | `COOKING`        | smoke detected ∧ RH > 75 % ∧ T < 35 °C ∧ gas not detected |
//! | 6 | `WARNING`        | ≥ 3 indicators |
//! | 7 | `CAUTION`        | 2 indicators |
//! | 8 | `ANOMALY`        | 1 indicator |
//! | – | `NORMAL`         | otherwise |
//!
//! Indicators: smoke detected, gas detected, T > 40 °C, ΔP < −3 hPa.
//!
//! COOKING is reachable only through rule 5. Steam from a pot raises
//! humidity and trips the smoke element without heating the room; counting
//! would call that an ANOMALY, so the exception sits above the count.
//!
//! ## Example
//!
//! ```rust
//! use fireguard_core::{AlertArbiter, AlertInputs, AlertLevel, GasState};
//!
//! let inputs = AlertInputs { gas: GasState::Explosive, ..AlertInputs::default() };
//! assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Explosive);
//! ```

use crate::{
    channels::{EnvironmentReading, EnvironmentState, GasReading, GasState, SmokeReading, SmokeState},
    constants::thresholds::{
        COOKING_HUMIDITY_PCT, COOKING_MAX_TEMP_C, FIRE_CONFIRMED_PRESSURE_DELTA_HPA,
        FIRE_CONFIRMED_TEMP_C, FIRE_SUSPECTED_SMOKE_PPM, GAS_CRITICAL_TEMP_C,
        INDICATOR_PRESSURE_DELTA_HPA, INDICATOR_TEMP_C,
    },
};

/// Global alert level, ascending severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlertLevel {
    /// Nothing of note
    #[default]
    Normal,
    /// Cooking vapor; reported, never alarmed
    Cooking,
    /// One indicator present
    Anomaly,
    /// Two indicators
    Caution,
    /// Three or more indicators
    Warning,
    /// Smoke with a fire pattern in the room
    FireSuspected,
    /// Dense smoke with heat and a pressure drop
    FireConfirmed,
    /// Methane at the critical threshold with smoke or heat
    GasCritical,
    /// Methane at the explosive threshold; overrides everything
    Explosive,
}

impl AlertLevel {
    /// Stable upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Cooking => "COOKING",
            Self::Anomaly => "ANOMALY",
            Self::Caution => "CAUTION",
            Self::Warning => "WARNING",
            Self::FireSuspected => "FIRE_SUSPECTED",
            Self::FireConfirmed => "FIRE_CONFIRMED",
            Self::GasCritical => "GAS_CRITICAL",
            Self::Explosive => "EXPLOSIVE",
        }
    }

    /// How urgently a dispatcher should notify
    pub fn notification(&self) -> NotificationPriority {
        match self {
            Self::Normal => NotificationPriority::None,
            Self::Cooking | Self::Anomaly | Self::Caution => NotificationPriority::Informational,
            Self::Warning => NotificationPriority::Moderate,
            Self::FireSuspected => NotificationPriority::Urgent,
            Self::FireConfirmed | Self::GasCritical | Self::Explosive => NotificationPriority::Emergency,
        }
    }

    /// False for NORMAL and COOKING
    pub fn is_alarming(&self) -> bool {
        !matches!(self, Self::Normal | Self::Cooking)
    }
}

impl core::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification urgency attached to each level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NotificationPriority {
    /// Nothing to send
    None,
    /// Log or show, no push
    Informational,
    /// Push notification
    Moderate,
    /// Push and repeat until acknowledged
    Urgent,
    /// Sound the alarm and notify everyone
    Emergency,
}

/// Everything the rules look at, taken from the channels' last readings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertInputs {
    /// Methane state
    pub gas: GasState,
    /// Smoke state
    pub smoke: SmokeState,
    /// Smoke concentration estimate
    pub smoke_ppm: i32,
    /// Environment classification
    pub environment: EnvironmentState,
    /// Fused room temperature (°C)
    pub temperature_c: f32,
    /// `None` without a hygrometer
    pub humidity_pct: Option<f32>,
    /// Pressure relative to baseline (hPa)
    pub pressure_delta: f32,
}

impl AlertInputs {
    /// Gather the inputs from one tick's readings
    pub fn from_readings(smoke: &SmokeReading, gas: &GasReading, environment: &EnvironmentReading) -> Self {
        Self {
            gas: gas.state,
            smoke: smoke.state,
            smoke_ppm: smoke.ppm,
            environment: environment.state,
            temperature_c: environment.temperature_c,
            humidity_pct: environment.humidity_pct,
            pressure_delta: environment.pressure_delta,
        }
    }

    fn smoke_detected(&self) -> bool {
        matches!(self.smoke, SmokeState::Detected | SmokeState::Critical)
    }

    /// Smoke detected, gas detected, T > 40 °C, ΔP < −3 hPa
    pub fn indicator_count(&self) -> usize {
        [
            self.smoke_detected(),
            self.gas.is_detected(),
            self.temperature_c > INDICATOR_TEMP_C,
            self.pressure_delta < INDICATOR_PRESSURE_DELTA_HPA,
        ]
        .iter()
        .filter(|&&hit| hit)
        .count()
    }
}

/// One row of the arbitration table
#[derive(Clone, Copy)]
pub struct AlertRule {
    /// Stable rule name for logs
    pub name: &'static str,
    /// Level produced when the rule matches
    pub level: AlertLevel,
    /// Predicate over the inputs
    pub matches: fn(&AlertInputs) -> bool,
}

fn explosive(i: &AlertInputs) -> bool {
    i.gas.is_explosive()
}

fn gas_critical(i: &AlertInputs) -> bool {
    i.gas == GasState::Critical && (i.smoke_detected() || i.temperature_c > GAS_CRITICAL_TEMP_C)
}

fn fire_confirmed(i: &AlertInputs) -> bool {
    i.smoke == SmokeState::Critical
        && i.temperature_c > FIRE_CONFIRMED_TEMP_C
        && i.pressure_delta < FIRE_CONFIRMED_PRESSURE_DELTA_HPA
}

fn fire_suspected(i: &AlertInputs) -> bool {
    matches!(i.environment, EnvironmentState::FireSuspected | EnvironmentState::RapidTempRise)
        && (i.smoke_detected() || i.smoke_ppm > FIRE_SUSPECTED_SMOKE_PPM)
}

fn cooking(i: &AlertInputs) -> bool {
    i.smoke_detected()
        && i.humidity_pct.map_or(false, |h| h > COOKING_HUMIDITY_PCT)
        && i.temperature_c < COOKING_MAX_TEMP_C
        && !i.gas.is_detected()
}

fn three_or_more_indicators(i: &AlertInputs) -> bool {
    i.indicator_count() >= 3
}

fn two_indicators(i: &AlertInputs) -> bool {
    i.indicator_count() == 2
}

fn one_indicator(i: &AlertInputs) -> bool {
    i.indicator_count() == 1
}

static RULES: [AlertRule; 8] = [
    AlertRule { name: "gas_explosive", level: AlertLevel::Explosive, matches: explosive },
    AlertRule { name: "gas_critical", level: AlertLevel::GasCritical, matches: gas_critical },
    AlertRule { name: "fire_confirmed", level: AlertLevel::FireConfirmed, matches: fire_confirmed },
    AlertRule { name: "fire_suspected", level: AlertLevel::FireSuspected, matches: fire_suspected },
    AlertRule { name: "cooking", level: AlertLevel::Cooking, matches: cooking },
    AlertRule { name: "indicators_3", level: AlertLevel::Warning, matches: three_or_more_indicators },
    AlertRule { name: "indicators_2", level: AlertLevel::Caution, matches: two_indicators },
    AlertRule { name: "indicators_1", level: AlertLevel::Anomaly, matches: one_indicator },
];

/// Stateless evaluator over the rule table
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertArbiter;

impl AlertArbiter {
    /// The global level for a snapshot
    pub fn evaluate(inputs: &AlertInputs) -> AlertLevel {
        Self::matching_rule(inputs).map_or(AlertLevel::Normal, |rule| rule.level)
    }

    /// The first rule that fires, `None` meaning NORMAL
    pub fn matching_rule(inputs: &AlertInputs) -> Option<&'static AlertRule> {
        RULES.iter().find(|rule| (rule.matches)(inputs))
    }

    /// The table in evaluation order
    pub fn rules() -> &'static [AlertRule] {
        &RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> AlertInputs {
        AlertInputs {
            gas: GasState::Normal,
            smoke: SmokeState::Normal,
            smoke_ppm: 50,
            environment: EnvironmentState::Normal,
            temperature_c: 22.0,
            humidity_pct: Some(45.0),
            pressure_delta: 0.0,
        }
    }

    #[test]
    fn all_normal_is_normal() {
        assert_eq!(AlertArbiter::evaluate(&calm()), AlertLevel::Normal);
        assert!(AlertArbiter::matching_rule(&calm()).is_none());
        assert_eq!(AlertArbiter::evaluate(&AlertInputs::default()), AlertLevel::Normal);
    }

    #[test]
    fn explosive_overrides_everything() {
        let inputs = AlertInputs {
            gas: GasState::Explosive,
            smoke: SmokeState::Critical,
            environment: EnvironmentState::FireSuspected,
            temperature_c: 70.0,
            pressure_delta: -8.0,
            ..calm()
        };
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Explosive);
    }

    #[test]
    fn gas_critical_needs_smoke_or_heat() {
        let mut inputs = AlertInputs { gas: GasState::Critical, ..calm() };
        // Gas alone is one indicator
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Anomaly);

        inputs.temperature_c = 46.0;
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::GasCritical);

        inputs.temperature_c = 22.0;
        inputs.smoke = SmokeState::Detected;
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::GasCritical);
    }

    #[test]
    fn fire_confirmed_without_gas() {
        let inputs = AlertInputs {
            smoke: SmokeState::Critical,
            temperature_c: 65.0,
            pressure_delta: -6.0,
            ..calm()
        };
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::FireConfirmed);
        assert_eq!(AlertArbiter::matching_rule(&inputs).map(|r| r.name), Some("fire_confirmed"));
    }

    #[test]
    fn fire_confirmed_boundaries_are_strict() {
        let inputs = AlertInputs {
            smoke: SmokeState::Critical,
            temperature_c: 60.0,
            pressure_delta: -6.0,
            ..calm()
        };
        // Falls through to the count: smoke, T > 40, ΔP < −3
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Warning);
    }

    #[test]
    fn fire_suspected_by_ppm_alone() {
        let inputs = AlertInputs {
            environment: EnvironmentState::RapidTempRise,
            smoke_ppm: 301,
            ..calm()
        };
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::FireSuspected);

        let inputs = AlertInputs { smoke_ppm: 300, ..inputs };
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Normal);
    }

    #[test]
    fn cooking_is_not_anomaly() {
        let inputs = AlertInputs {
            smoke: SmokeState::Detected,
            humidity_pct: Some(80.0),
            temperature_c: 30.0,
            ..calm()
        };
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Cooking);
        assert!(!AlertLevel::Cooking.is_alarming());
    }

    #[test]
    fn cooking_exception_is_literal() {
        let base = AlertInputs {
            smoke: SmokeState::Detected,
            humidity_pct: Some(80.0),
            temperature_c: 30.0,
            ..calm()
        };

        // Gas present: no exception
        let with_gas = AlertInputs { gas: GasState::Detected, ..base };
        assert_eq!(AlertArbiter::evaluate(&with_gas), AlertLevel::Caution);

        // Humidity exactly 75 is not above it
        let drier = AlertInputs { humidity_pct: Some(75.0), ..base };
        assert_eq!(AlertArbiter::evaluate(&drier), AlertLevel::Anomaly);

        // No hygrometer, no exception
        let blind = AlertInputs { humidity_pct: None, ..base };
        assert_eq!(AlertArbiter::evaluate(&blind), AlertLevel::Anomaly);

        let hot = AlertInputs { temperature_c: 35.0, ..base };
        assert_eq!(AlertArbiter::evaluate(&hot), AlertLevel::Anomaly);
    }

    #[test]
    fn counting_rules() {
        let one = AlertInputs { pressure_delta: -3.5, ..calm() };
        assert_eq!(AlertArbiter::evaluate(&one), AlertLevel::Anomaly);

        let two = AlertInputs { temperature_c: 41.0, ..one };
        assert_eq!(AlertArbiter::evaluate(&two), AlertLevel::Caution);

        let three = AlertInputs { gas: GasState::Detected, ..two };
        assert_eq!(AlertArbiter::evaluate(&three), AlertLevel::Warning);

        let four = AlertInputs { smoke: SmokeState::Detected, ..three };
        assert_eq!(four.indicator_count(), 4);
        assert_eq!(AlertArbiter::evaluate(&four), AlertLevel::Warning);
    }

    #[test]
    fn error_and_warmup_states_are_not_indicators() {
        let inputs = AlertInputs {
            gas: GasState::Error,
            smoke: SmokeState::Initializing,
            ..calm()
        };
        assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Normal);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(AlertLevel::Normal < AlertLevel::Cooking);
        assert!(AlertLevel::Cooking < AlertLevel::Anomaly);
        assert!(AlertLevel::Warning < AlertLevel::FireSuspected);
        assert!(AlertLevel::GasCritical < AlertLevel::Explosive);
    }

    #[test]
    fn notification_contract() {
        assert_eq!(AlertLevel::Normal.notification(), NotificationPriority::None);
        assert_eq!(AlertLevel::Cooking.notification(), NotificationPriority::Informational);
        assert_eq!(AlertLevel::Warning.notification(), NotificationPriority::Moderate);
        assert_eq!(AlertLevel::FireSuspected.notification(), NotificationPriority::Urgent);
        assert_eq!(AlertLevel::FireConfirmed.notification(), NotificationPriority::Emergency);
        assert_eq!(AlertLevel::GasCritical.notification(), NotificationPriority::Emergency);
        assert_eq!(AlertLevel::Explosive.notification(), NotificationPriority::Emergency);
        assert!(AlertLevel::Anomaly.is_alarming());
    }

    #[test]
    fn rule_table_order() {
        let names: Vec<&str> = AlertArbiter::rules().iter().map(|r| r.name).collect();
        assert_eq!(names[0], "gas_explosive");
        assert_eq!(names[4], "cooking");
        assert_eq!(AlertArbiter::rules().len(), 8);
    }
}
