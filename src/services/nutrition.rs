// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food search against USDA FoodData Central, with a small built-in table
//! used when no key is configured or the API is unavailable.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

const PAGE_SIZE: u32 = 10;
const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodSource {
    Usda,
    Sample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodItem {
    pub name: String,
    pub brand: Option<String>,
    pub serving: String,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    /// 1-10, absent when macros are missing
    pub health_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodSearch {
    pub query: String,
    pub source: FoodSource,
    pub foods: Vec<FoodItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    ProteinDesc,
    CaloriesAsc,
    CaloriesDesc,
}

/// Simple 1-10 score: rewards protein and fiber, penalises sugar.
pub fn health_score(
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    fiber: Option<f64>,
    sugar: Option<f64>,
) -> Option<f64> {
    let (protein, carbs, fat) = (protein?, carbs?, fat?);
    let fiber = fiber.unwrap_or(0.0);
    let sugar = sugar.unwrap_or(0.0);
    let mut score = 5.0;

    if protein > 10.0 {
        score += 1.5;
    } else if protein > 5.0 {
        score += 0.5;
    }
    if fiber > 5.0 {
        score += 1.5;
    } else if fiber > 2.0 {
        score += 0.5;
    }
    if sugar > 20.0 {
        score -= 2.0;
    } else if sugar > 10.0 {
        score -= 1.0;
    }
    let total = protein + carbs + fat;
    if total > 0.0 && (0.2..=0.4).contains(&(protein / total)) {
        score += 1.0;
    }

    Some(((score * 10.0_f64).round() / 10.0).clamp(1.0, 10.0))
}

struct SampleFood {
    name: &'static str,
    serving: &'static str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    sugar: f64,
}

const SAMPLE_FOODS: [SampleFood; 8] = [
    SampleFood { name: "chicken rice", serving: "1 plate (350g)", calories: 607.0, protein: 25.0, carbs: 86.0, fat: 15.0, fiber: 2.0, sugar: 3.0 },
    SampleFood { name: "banana", serving: "1 medium (118g)", calories: 105.0, protein: 1.3, carbs: 27.0, fat: 0.4, fiber: 3.1, sugar: 14.0 },
    SampleFood { name: "apple", serving: "1 medium (182g)", calories: 95.0, protein: 0.5, carbs: 25.0, fat: 0.3, fiber: 4.4, sugar: 19.0 },
    SampleFood { name: "white rice", serving: "1 cup cooked (158g)", calories: 204.0, protein: 4.2, carbs: 45.0, fat: 0.4, fiber: 0.6, sugar: 0.1 },
    SampleFood { name: "grilled chicken breast", serving: "100g", calories: 165.0, protein: 31.0, carbs: 0.0, fat: 3.6, fiber: 0.0, sugar: 0.0 },
    SampleFood { name: "salmon", serving: "100g", calories: 206.0, protein: 22.0, carbs: 0.0, fat: 13.0, fiber: 0.0, sugar: 0.0 },
    SampleFood { name: "broccoli", serving: "1 cup chopped (156g)", calories: 55.0, protein: 3.7, carbs: 11.0, fat: 0.6, fiber: 5.1, sugar: 2.2 },
    SampleFood { name: "egg", serving: "1 large (50g)", calories: 72.0, protein: 6.0, carbs: 0.4, fat: 5.0, fiber: 0.0, sugar: 0.2 },
];

/// Case-insensitive substring search over the built-in table.
pub fn sample_search(query: &str) -> Vec<FoodItem> {
    let needle = query.trim().to_lowercase();
    SAMPLE_FOODS
        .iter()
        .filter(|f| f.name.contains(&needle))
        .map(|f| FoodItem {
            name: f.name.to_string(),
            brand: None,
            serving: f.serving.to_string(),
            calories: Some(f.calories),
            protein: Some(f.protein),
            carbs: Some(f.carbs),
            fat: Some(f.fat),
            fiber: Some(f.fiber),
            sugar: Some(f.sugar),
            health_score: health_score(Some(f.protein), Some(f.carbs), Some(f.fat), Some(f.fiber), Some(f.sugar)),
        })
        .collect()
}

pub fn sort_foods(foods: &mut [FoodItem], order: SortOrder) {
    let key = |v: Option<f64>| v.unwrap_or(0.0);
    let cmp = |a: f64, b: f64| a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    match order {
        SortOrder::Relevance => {}
        SortOrder::ProteinDesc => foods.sort_by(|a, b| cmp(key(b.protein), key(a.protein))),
        SortOrder::CaloriesAsc => foods.sort_by(|a, b| cmp(key(a.calories), key(b.calories))),
        SortOrder::CaloriesDesc => foods.sort_by(|a, b| cmp(key(b.calories), key(a.calories))),
    }
}

// ─── USDA wire format ────────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<UsdaFood>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaFood {
    description: Option<String>,
    brand_owner: Option<String>,
    serving_size: Option<f64>,
    serving_unit: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<UsdaNutrient>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaNutrient {
    #[serde(default)]
    nutrient_name: String,
    value: Option<f64>,
}

impl UsdaFood {
    /// First nutrient whose name contains `name`, case-insensitively.
    fn nutrient(&self, name: &str) -> Option<f64> {
        let name = name.to_lowercase();
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_name.to_lowercase().contains(&name))
            .map(|n| n.value.unwrap_or(0.0))
    }

    fn into_item(self) -> FoodItem {
        let calories = self
            .nutrient("Energy")
            .or_else(|| self.nutrient("Energy (Atwater General Factors)"));
        let protein = self.nutrient("Protein");
        let carbs = self
            .nutrient("Carbohydrate, by difference")
            .or_else(|| self.nutrient("Carbohydrate"));
        let fat = self.nutrient("Total lipid (fat)").or_else(|| self.nutrient("Fat"));
        let fiber = self.nutrient("Fiber, total dietary");
        let sugar = self.nutrient("Sugars, total including NLEA");

        FoodItem {
            name: self.description.unwrap_or_else(|| "Unknown Food".to_string()),
            brand: self.brand_owner.filter(|b| !b.is_empty()),
            serving: format!(
                "{} {}",
                self.serving_size.unwrap_or(100.0),
                self.serving_unit.as_deref().unwrap_or("g")
            ),
            calories,
            protein,
            carbs,
            fat,
            fiber,
            sugar,
            health_score: health_score(protein, carbs, fat, fiber, sugar),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("USDA API returned {0}")]
    Status(u16),
}

/// USDA FoodData Central client.
#[derive(Clone)]
pub struct NutritionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NutritionClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn search(&self, query: &str, order: SortOrder) -> FoodSearch {
        let (mut foods, source) = match self.api_key.as_deref() {
            Some(key) => match self.usda_search(key, query).await {
                Ok(foods) => (foods, FoodSource::Usda),
                Err(e) => {
                    tracing::warn!(error = %e, query, "Food search failed, using sample table");
                    (sample_search(query), FoodSource::Sample)
                }
            },
            None => (sample_search(query), FoodSource::Sample),
        };
        sort_foods(&mut foods, order);
        FoodSearch {
            query: query.to_string(),
            source,
            foods,
        }
    }

    async fn usda_search(&self, api_key: &str, query: &str) -> Result<Vec<FoodItem>, UpstreamError> {
        let page_size = PAGE_SIZE.to_string();
        let response = self
            .http
            .get(format!("{}/fdc/v1/foods/search", self.base_url))
            .query(&[
                ("api_key", api_key),
                ("query", query),
                ("pageSize", page_size.as_str()),
            ])
            .timeout(TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.foods.into_iter().map(UsdaFood::into_item).collect())
    }
}
