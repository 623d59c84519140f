//! Pure derivations: the objective sentence and wizard step status.

mod sentence;
mod steps;

pub use sentence::{
    AUDIENCE_PLACEHOLDER, BEHAVIOR_PLACEHOLDER, CONDITION_PLACEHOLDER, CRITERIA_PLACEHOLDER,
    compose_objective_text,
};
pub use steps::{StepKey, StepStatus, derive_step_status};
