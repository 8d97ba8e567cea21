use serde::{Deserialize, Serialize};

/// A food record as returned by the FoodData Central search endpoint.
/// Only the fields the estimator reads are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCandidate {
    #[serde(default)]
    pub fdc_id: Option<u64>,
    pub description: String,
    #[serde(default)]
    pub serving_size: Option<f64>,
    #[serde(default)]
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    #[serde(default)]
    pub nutrient_id: Option<i64>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl FoodNutrient {
    pub fn new(nutrient_id: i64, value: f64) -> Self {
        Self {
            nutrient_id: Some(nutrient_id),
            value: Some(value),
        }
    }
}
