//! Objective sentence composition.

use courseapi::model::Objective;

/// Markers substituted for missing ABCD components. They are plain
/// text on purpose; styling (italics, color) is a caller concern.
pub const CONDITION_PLACEHOLDER: &str = "[condition]";
pub const AUDIENCE_PLACEHOLDER: &str = "[audience]";
pub const BEHAVIOR_PLACEHOLDER: &str = "[behavior]";
pub const CRITERIA_PLACEHOLDER: &str = "[criteria]";

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

/// Build the display sentence for an objective:
/// `"{condition}, {audience} will {behavior} {criteria}."`
///
/// Missing components fall back to placeholders; the audience slot also
/// falls back to `default_audience` before its placeholder. When no
/// structured field is filled in at all, the freeform text is returned
/// instead (possibly empty). Freeform text never overwrites the
/// structured fields; any such conversion is an explicit user action.
pub fn compose_objective_text(objective: &Objective, default_audience: &str) -> String {
    let has_structured = !objective.condition.is_empty()
        || !objective.audience.is_empty()
        || !objective.behavior.is_empty()
        || !objective.criteria.is_empty();
    if !has_structured {
        return objective.freeform_text.clone();
    }

    let condition = or_placeholder(&objective.condition, CONDITION_PLACEHOLDER);
    let audience = if !objective.audience.is_empty() {
        objective.audience.as_str()
    } else {
        or_placeholder(default_audience, AUDIENCE_PLACEHOLDER)
    };
    let behavior = or_placeholder(&objective.behavior, BEHAVIOR_PLACEHOLDER);
    let criteria = or_placeholder(&objective.criteria, CRITERIA_PLACEHOLDER);

    format!("{}, {} will {} {}.", condition, audience, behavior, criteria)
}
