//! Tests for the top-level API surface

use registro::{
    BestTracker, CheckpointDecision, CheckpointSelector, OrchestratorConfig, OrchestratorState,
    WorkspaceState,
};

#[test]
fn test_config_builder_chain() {
    let config = OrchestratorConfig::builder("chain")
        .results_root("/tmp/registro")
        .validation_frequency(5)
        .overwrite(true)
        .checkpoint_extension("pth")
        .build();
    assert!(config.is_ok(), "Config build with all options should succeed");
}

#[test]
fn test_best_tracker_default_matches_new() {
    assert_eq!(BestTracker::default(), BestTracker::new());
}

#[test]
fn test_decision_default_is_no_progress() {
    let decision = CheckpointDecision::default();
    assert!(!decision.save_for_loss());
    assert!(!decision.save_for_score());
    assert!(!decision.is_progress());
}

#[test]
fn test_selector_is_copy() {
    let selector = CheckpointSelector;
    let _copied = selector;
    let _another = selector;
}

#[test]
fn test_state_enums_debug() {
    assert_eq!(format!("{:?}", WorkspaceState::Fresh), "Fresh");
    assert_eq!(format!("{:?}", WorkspaceState::Overwritten), "Overwritten");
    assert_eq!(format!("{:?}", WorkspaceState::Blocked), "Blocked");
    assert_eq!(format!("{:?}", OrchestratorState::Initialized), "Initialized");
    assert_eq!(format!("{:?}", OrchestratorState::Validating), "Validating");
    assert_eq!(format!("{:?}", OrchestratorState::Idle), "Idle");
    assert_eq!(format!("{:?}", OrchestratorState::Blocked), "Blocked");
}

#[test]
fn test_state_enums_serialize() {
    let json = serde_json::to_string(&WorkspaceState::Overwritten).unwrap();
    assert_eq!(json, "\"Overwritten\"");
    let back: WorkspaceState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, WorkspaceState::Overwritten);
}
