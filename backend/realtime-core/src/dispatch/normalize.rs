//! Shape normalization for progress and recommendation payloads.

use crate::events::{GeneralProgressInfo, ProgressInfo, RecipeSummary, RecommendationResult};
use crate::protocol::messages::{
    GeneralProgress, RawRecipe, RawRecommendationResult, WireProgress,
};

use serde_json::Value;

const DEFAULT_DIFFICULTY: &str = "medium";
const MAX_PERCENT: f64 = 100.0;

/// Fold a partial progress frame over the previous state of the same track.
///
/// Missing fields inherit from `previous`. A missing percentage is derived from the
/// steps when `total_steps > 0`.
pub fn merge_progress(previous: Option<&ProgressInfo>, wire: WireProgress) -> ProgressInfo {
    let current_step = wire
        .current_step
        .or(previous.map(|p| p.current_step))
        .unwrap_or(0);
    let total_steps = wire
        .total_steps
        .or(previous.map(|p| p.total_steps))
        .unwrap_or(0);

    let percentage = match wire.percentage {
        Some(percentage) => percentage,
        None if total_steps > 0 => f64::from(current_step) / f64::from(total_steps) * MAX_PERCENT,
        None => previous.map(|p| p.percentage).unwrap_or(0.0),
    };

    let step_description = wire
        .step_description
        .or_else(|| previous.map(|p| p.step_description.clone()))
        .unwrap_or_default();

    ProgressInfo {
        current_step,
        total_steps,
        percentage: clamp_percent(percentage),
        step_description,
    }
}

pub fn general_progress(wire: GeneralProgress) -> GeneralProgressInfo {
    GeneralProgressInfo {
        percent: clamp_percent(wire.percent.unwrap_or(0.0)),
        message: wire.message.unwrap_or_default(),
    }
}

pub fn recommendation_result(raw: RawRecommendationResult) -> RecommendationResult {
    let recipes: Vec<RecipeSummary> = raw
        .recipes
        .unwrap_or_default()
        .into_iter()
        .map(recipe_summary)
        .collect();

    // An empty list always reports zero, whatever count the server attached.
    let total_count = if recipes.is_empty() {
        0
    } else {
        raw.total_count
            .unwrap_or_else(|| u32::try_from(recipes.len()).unwrap_or(u32::MAX))
    };

    let reason = raw
        .reason
        .filter(|reason| !reason.trim().is_empty())
        .unwrap_or_else(|| default_reason(recipes.len()));

    RecommendationResult {
        recipes,
        total_count,
        reason,
    }
}

pub fn default_reason(count: usize) -> String {
    match count {
        0 => String::from("No recommended recipes found"),
        1 => String::from("Found 1 recommended recipe"),
        n => format!("Found {n} recommended recipes"),
    }
}

fn recipe_summary(raw: RawRecipe) -> RecipeSummary {
    RecipeSummary {
        id: raw.id.map(id_to_string).unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        image_url: raw.image_url.filter(|url| !url.is_empty()),
        difficulty: raw
            .difficulty
            .filter(|difficulty| !difficulty.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        cook_time_minutes: whole_number(raw.cook_time),
        calories: whole_number(raw.calories),
        servings: whole_number(raw.servings),
        match_score: raw.match_score.filter(|s| s.is_finite()).unwrap_or(0.0),
        match_percentage: whole_number(raw.match_percentage.map(clamp_percent)),
        match_reasons: raw.match_reasons.unwrap_or_default(),
        ingredients: raw.ingredients.unwrap_or_default(),
        tags: raw.tags.unwrap_or_default(),
    }
}

fn id_to_string(id: Value) -> String {
    match id {
        Value::String(id) => id,
        Value::Number(id) => id.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// `as` saturates: NaN -> 0, negatives -> 0, huge -> u32::MAX.
fn whole_number(value: Option<f64>) -> u32 {
    value.map(|v| v.round() as u32).unwrap_or(0)
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_PERCENT)
    }
}
