use super::food::FoodCandidate;

const DEFAULT_SERVING_GRAMS: f64 = 100.0;

// Atwater factors, kcal per gram
const PROTEIN_KCAL_PER_G: f64 = 4.0;
const CARBOHYDRATE_KCAL_PER_G: f64 = 4.0;
const FAT_KCAL_PER_G: f64 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientKind {
    Energy,
    Protein,
    Fat,
    Carbohydrate,
}

impl NutrientKind {
    /// FoodData Central nutrient ids the estimator understands.
    pub fn from_nutrient_id(id: i64) -> Option<Self> {
        match id {
            1008 => Some(Self::Energy),
            1003 => Some(Self::Protein),
            1004 => Some(Self::Fat),
            1005 => Some(Self::Carbohydrate),
            _ => None,
        }
    }
}

/// Tracked nutrient amounts for one food; anything not reported is 0.0.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NutrientSnapshot {
    pub energy: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrate: f64,
}

impl NutrientSnapshot {
    pub fn from_candidate(food: &FoodCandidate) -> Self {
        let mut snapshot = Self::default();
        for nutrient in &food.food_nutrients {
            let Some(kind) = nutrient.nutrient_id.and_then(NutrientKind::from_nutrient_id) else {
                continue;
            };
            let value = nutrient.value.unwrap_or(0.0);
            // later entries for the same id overwrite earlier ones
            match kind {
                NutrientKind::Energy => snapshot.energy = value,
                NutrientKind::Protein => snapshot.protein = value,
                NutrientKind::Fat => snapshot.fat = value,
                NutrientKind::Carbohydrate => snapshot.carbohydrate = value,
            }
        }
        snapshot
    }

    pub fn atwater_kcal(&self) -> f64 {
        self.protein * PROTEIN_KCAL_PER_G
            + self.carbohydrate * CARBOHYDRATE_KCAL_PER_G
            + self.fat * FAT_KCAL_PER_G
    }
}

/// Serving size in grams. Missing size means 100, missing unit means grams,
/// and only "kg" is converted; every other unit is taken as grams.
pub fn serving_size_grams(food: &FoodCandidate) -> f64 {
    let size = food
        .serving_size
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SERVING_GRAMS);
    match food.serving_size_unit.as_deref() {
        Some("kg") => size * 1000.0,
        _ => size,
    }
}

/// Calories for a 100g-normalized serving of `food`.
///
/// Reported energy wins when it is non-zero; otherwise the macronutrients are
/// converted with Atwater factors. Both the scale factor and the result are
/// rounded to two decimals, in that order.
pub fn calories_per_serving(food: &FoodCandidate) -> f64 {
    let scale = round2(DEFAULT_SERVING_GRAMS / serving_size_grams(food));
    let nutrients = NutrientSnapshot::from_candidate(food);
    if nutrients.energy != 0.0 {
        return round2(nutrients.energy * scale);
    }
    round2(nutrients.atwater_kcal() * scale)
}

/// Rounds to two decimal places using the exact decimal expansion of `x`,
/// so 2.675 becomes 2.67 rather than 2.68.
pub fn round2(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    format!("{x:.2}").parse().unwrap_or(x)
}
