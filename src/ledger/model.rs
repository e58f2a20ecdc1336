use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::CoreError;

const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Totals below this distance from zero collapse to zero after a removal,
/// so floating drift cannot leave a ledger with negative consumed values.
const NEGATIVE_DRIFT_EPSILON: f64 = 1e-6;

/// Calendar-day key in `YYYY-MM-DD` form. One ledger exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(Date);

impl DayKey {
    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn days_before(&self, days: i64) -> Self {
        Self(self.0.saturating_sub(Duration::days(days)))
    }
}

impl FromStr for DayKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s.trim(), DAY_FORMAT)
            .map(Self)
            .map_err(|_| CoreError::validation(format!("Invalid date '{s}', expected YYYY-MM-DD")))
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Clamps a macro value to a finite non-negative number. NaN, infinities and
/// negatives all coerce to zero rather than propagating into stored state.
pub fn coerce_macro(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// One value per tracked macro. Used for goals, consumed totals and
/// per-entry arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl Macros {
    pub const fn new(calories: f64, protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fats,
        }
    }

    pub fn default_goals() -> Self {
        Self::new(2000.0, 150.0, 250.0, 65.0)
    }

    pub fn sanitized(self) -> Self {
        Self {
            calories: coerce_macro(self.calories),
            protein: coerce_macro(self.protein),
            carbs: coerce_macro(self.carbs),
            fats: coerce_macro(self.fats),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.calories == 0.0 && self.protein == 0.0 && self.carbs == 0.0 && self.fats == 0.0
    }

    pub fn scale(self, ratio: f64) -> Self {
        Self {
            calories: self.calories * ratio,
            protein: self.protein * ratio,
            carbs: self.carbs * ratio,
            fats: self.fats * ratio,
        }
    }

    pub fn add(&mut self, other: &Macros) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.carbs += other.carbs;
        self.fats += other.fats;
    }

    pub fn subtract_clamped(&mut self, other: &Macros) {
        self.calories = clamp_drift(self.calories - other.calories);
        self.protein = clamp_drift(self.protein - other.protein);
        self.carbs = clamp_drift(self.carbs - other.carbs);
        self.fats = clamp_drift(self.fats - other.fats);
    }

    /// Whole-number rendering for summary displays.
    pub fn rounded(self) -> Self {
        Self {
            calories: self.calories.round(),
            protein: self.protein.round(),
            carbs: self.carbs.round(),
            fats: self.fats.round(),
        }
    }
}

fn clamp_drift(value: f64) -> f64 {
    if value < 0.0 && value > -NEGATIVE_DRIFT_EPSILON {
        0.0
    } else {
        value
    }
}

/// Whether entry base values are per-100-unit references (weight in grams)
/// or fixed servings (unit quantity). One mode per deployment; weight is the
/// canonical default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    Weight,
    Quantity,
}

impl Default for ScalingMode {
    fn default() -> Self {
        Self::Weight
    }
}

impl ScalingMode {
    pub fn scale_unit(self) -> f64 {
        match self {
            Self::Weight => 100.0,
            Self::Quantity => 1.0,
        }
    }

    pub fn default_amount(self) -> f64 {
        match self {
            Self::Weight => 100.0,
            Self::Quantity => 1.0,
        }
    }
}

/// One logged food item. Stores effective (already scaled) macro values;
/// immutable once created except for deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub quantity_or_weight: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl FoodEntry {
    pub fn macros(&self) -> Macros {
        Macros::new(self.calories, self.protein, self.carbs, self.fats)
    }
}

/// Per-day aggregate: goals, derived consumed totals and the entry list.
/// Invariant: each consumed macro equals the sum of that macro over entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLedger {
    pub date: DayKey,
    #[serde(default = "Macros::default_goals")]
    pub goals: Macros,
    #[serde(default)]
    pub consumed: Macros,
    #[serde(default)]
    pub entries: Vec<FoodEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl DailyLedger {
    pub fn new(date: DayKey, goals: Macros, now: OffsetDateTime) -> Self {
        Self {
            date,
            goals,
            consumed: Macros::default(),
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_key_parses_and_formats_round_trip() {
        let key: DayKey = "2025-03-07".parse().expect("valid key");
        assert_eq!(key.to_string(), "2025-03-07");
    }

    #[test]
    fn day_key_rejects_garbage() {
        assert!("not-a-date".parse::<DayKey>().is_err());
        assert!("2025-13-40".parse::<DayKey>().is_err());
        assert!("".parse::<DayKey>().is_err());
    }

    #[test]
    fn day_key_window_arithmetic_crosses_months() {
        let key: DayKey = "2025-03-02".parse().expect("valid key");
        assert_eq!(key.days_before(6).to_string(), "2025-02-24");
    }

    #[test]
    fn coerce_macro_zeroes_bad_input() {
        assert_eq!(coerce_macro(-5.0), 0.0);
        assert_eq!(coerce_macro(f64::NAN), 0.0);
        assert_eq!(coerce_macro(f64::INFINITY), 0.0);
        assert_eq!(coerce_macro(12.5), 12.5);
    }

    #[test]
    fn subtract_clamps_float_drift_to_zero() {
        let mut totals = Macros::default();
        let a = Macros::new(0.1, 0.0, 0.0, 0.0);
        let b = Macros::new(0.2, 0.0, 0.0, 0.0);
        totals.add(&a);
        totals.add(&b);
        totals.subtract_clamped(&b);
        totals.subtract_clamped(&a);
        assert_eq!(totals.calories, 0.0);
    }

    #[test]
    fn ledger_serializes_with_camel_case_wire_names() {
        let now = OffsetDateTime::now_utc();
        let ledger = DailyLedger::new("2025-01-01".parse().expect("key"), Macros::default_goals(), now);
        let value = serde_json::to_value(&ledger).expect("serialize");
        assert_eq!(value["date"], "2025-01-01");
        assert_eq!(value["goals"]["calories"], 2000.0);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
