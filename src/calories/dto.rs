use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Number;

use super::estimator::round2;
use crate::{error::FieldError, validation::Validate};

pub const SOURCE: &str = "USDA FoodData Central";
pub const MAX_SERVINGS: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct CalorieRequest {
    pub dish_name: String,
    #[serde(deserialize_with = "whole_number")]
    pub servings: i64,
}

const NOT_AN_INTEGER: &str = "Input should be a valid integer";

/// Integers, or floats with no fractional part such as `2.0`. Integers too
/// large for `i64` saturate so the range check reports them.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let n = Number::deserialize(deserializer).map_err(|_| D::Error::custom(NOT_AN_INTEGER))?;
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.as_u64().is_some() {
        return Ok(i64::MAX);
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err(D::Error::custom(NOT_AN_INTEGER)),
    }
}

impl Validate for CalorieRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.dish_name.is_empty() {
            errors.push(FieldError::new("dish_name", "Dish name should not be empty"));
        }
        if !(1..=MAX_SERVINGS).contains(&self.servings) {
            errors.push(FieldError::new("servings", "Invalid Servings"));
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalorieResponse {
    /// Description of the matched food, not the name the client sent.
    pub dish_name: String,
    pub servings: i64,
    pub calories_per_serving: f64,
    pub total_calories: f64,
    pub source: &'static str,
}

impl CalorieResponse {
    pub fn scaled(description: String, calories_per_serving: f64, servings: i64) -> Self {
        Self {
            dish_name: description,
            servings,
            calories_per_serving,
            total_calories: round2(calories_per_serving * servings as f64),
            source: SOURCE,
        }
    }
}
