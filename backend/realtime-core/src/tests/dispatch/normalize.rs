use crate::dispatch::normalize::{default_reason, merge_progress, recommendation_result};
use crate::events::ProgressInfo;
use crate::protocol::messages::{RawRecipe, RawRecommendationResult, WireProgress};

use serde_json::json;

/// **VALUE**: Missing progress fields inherit from the previous frame on the same track.
///
/// **WHY THIS MATTERS**: The backend often sends only the step that changed. Without
/// merging, the UI would flash back to "step 0 of 0".
///
/// **BUG THIS CATCHES**: Would catch merge replacing instead of folding.
#[test]
fn given_partial_progress_when_merged_then_missing_fields_inherit() {
    // GIVEN: A previous frame with full data
    let previous = ProgressInfo {
        current_step: 1,
        total_steps: 4,
        percentage: 25.0,
        step_description: "Uploading".to_string(),
    };

    // WHEN: The next frame only moves the step
    let merged = merge_progress(
        Some(&previous),
        WireProgress {
            current_step: Some(3),
            ..WireProgress::default()
        },
    );

    // THEN: Total and description carry over, percentage is derived
    assert_eq!(merged.current_step, 3);
    assert_eq!(merged.total_steps, 4);
    assert_eq!(merged.percentage, 75.0);
    assert_eq!(merged.step_description, "Uploading");
}

/// **VALUE**: Percentage is clamped to 0..=100.
///
/// **BUG THIS CATCHES**: Would catch a progress bar drawn past its end.
#[test]
fn given_out_of_range_percentage_when_merged_then_clamped() {
    let over = merge_progress(
        None,
        WireProgress {
            percentage: Some(140.0),
            ..WireProgress::default()
        },
    );
    let under = merge_progress(
        None,
        WireProgress {
            percentage: Some(-5.0),
            ..WireProgress::default()
        },
    );

    assert_eq!(over.percentage, 100.0);
    assert_eq!(under.percentage, 0.0);
}

/// **VALUE**: An empty recipe list reports zero and a "no recipes" reason.
///
/// **WHY THIS MATTERS**: The UI shows `total_count` next to an empty list; any other number
/// looks broken.
///
/// **BUG THIS CATCHES**: Would catch the server's stale `total_count` leaking through.
#[test]
fn given_empty_recipe_list_when_normalized_then_total_is_zero_with_default_reason() {
    let result = recommendation_result(RawRecommendationResult {
        recipes: Some(Vec::new()),
        total_count: Some(12),
        reason: None,
    });

    assert!(result.recipes.is_empty());
    assert_eq!(result.total_count, 0);
    assert_eq!(result.reason, "No recommended recipes found");
}

/// **VALUE**: Missing recipe fields get defaults instead of failing the frame.
///
/// **WHY THIS MATTERS**: One sparse recipe must not drop the whole recommendation set.
///
/// **BUG THIS CATCHES**: Would catch difficulty defaulting to "" or numeric ids being lost.
#[test]
fn given_sparse_recipe_when_normalized_then_defaults_fill_gaps() {
    let result = recommendation_result(RawRecommendationResult {
        recipes: Some(vec![RawRecipe {
            id: Some(json!(42)),
            title: Some("Shakshuka".to_string()),
            cook_time: Some(24.6),
            match_percentage: Some(180.0),
            ..RawRecipe::default()
        }]),
        total_count: None,
        reason: Some("  ".to_string()),
    });

    assert_eq!(result.total_count, 1);
    assert_eq!(result.reason, "Found 1 recommended recipe");

    let recipe = &result.recipes[0];
    assert_eq!(recipe.id, "42");
    assert_eq!(recipe.title, "Shakshuka");
    assert_eq!(recipe.difficulty, "medium");
    assert_eq!(recipe.cook_time_minutes, 25);
    assert_eq!(recipe.match_percentage, 100);
    assert_eq!(recipe.image_url, None);
    assert!(recipe.tags.is_empty());
}

#[test]
fn given_counts_when_default_reason_then_pluralizes() {
    assert_eq!(default_reason(0), "No recommended recipes found");
    assert_eq!(default_reason(1), "Found 1 recommended recipe");
    assert_eq!(default_reason(7), "Found 7 recommended recipes");
}
