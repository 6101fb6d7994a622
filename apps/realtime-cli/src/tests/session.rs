use crate::session::describe_progress;

use realtime_core::events::ProgressInfo;

#[test]
fn given_step_progress_when_described_then_shows_steps_and_percent() {
    let progress = ProgressInfo {
        current_step: 2,
        total_steps: 5,
        percentage: 40.0,
        step_description: "Matching ingredients".to_string(),
    };

    assert_eq!(
        describe_progress(&progress),
        "step 2/5 (40%) Matching ingredients"
    );
}

#[test]
fn given_percent_only_progress_when_described_then_omits_steps() {
    let progress = ProgressInfo {
        percentage: 62.4,
        step_description: "Scanning".to_string(),
        ..ProgressInfo::default()
    };

    assert_eq!(describe_progress(&progress), "62% Scanning");
}
