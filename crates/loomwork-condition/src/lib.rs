//! The `conditional_split` condition evaluator (component C1).
//!
//! A pure, synchronous function over a two-level tree: an [`Expression`] is
//! a list of [`ConditionGroup`]s joined by `group_operator`; a group is a
//! list of [`Condition`]s joined by `logical_operator`.

use loomwork_model::{BoolOperator, Condition, ConditionGroup, ConditionOperator, Contact, Expression};

/// Evaluate an expression tree against a contact.
///
/// Empty expression, and empty groups within it, evaluate to `true` (an
/// absent filter excludes nothing).
pub fn evaluate(expr: &Expression, contact: &Contact) -> bool {
  if expr.groups.is_empty() {
    return true;
  }

  let mut results = expr.groups.iter().map(|g| evaluate_group(g, contact));
  match expr.group_operator {
    BoolOperator::And => results.all(|r| r),
    BoolOperator::Or => results.any(|r| r),
  }
}

fn evaluate_group(group: &ConditionGroup, contact: &Contact) -> bool {
  if group.conditions.is_empty() {
    return true;
  }

  let mut results = group.conditions.iter().map(|c| evaluate_condition(c, contact));
  match group.logical_operator {
    BoolOperator::And => results.all(|r| r),
    BoolOperator::Or => results.any(|r| r),
  }
}

fn evaluate_condition(condition: &Condition, contact: &Contact) -> bool {
  let resolved = contact.resolve_field(&condition.field);

  match condition.operator {
    ConditionOperator::IsEmpty => resolved.trim().is_empty(),
    ConditionOperator::IsNotEmpty => !resolved.trim().is_empty(),
    ConditionOperator::Equals => resolved.eq_ignore_ascii_case(&condition.value),
    ConditionOperator::NotEquals => !resolved.eq_ignore_ascii_case(&condition.value),
    ConditionOperator::Contains => resolved
      .to_lowercase()
      .contains(&condition.value.to_lowercase()),
    ConditionOperator::NotContains => !resolved
      .to_lowercase()
      .contains(&condition.value.to_lowercase()),
    ConditionOperator::StartsWith => resolved
      .to_lowercase()
      .starts_with(&condition.value.to_lowercase()),
    ConditionOperator::EndsWith => resolved
      .to_lowercase()
      .ends_with(&condition.value.to_lowercase()),
    ConditionOperator::GreaterThan => compare_numeric(&resolved, &condition.value, |a, b| a > b),
    ConditionOperator::LessThan => compare_numeric(&resolved, &condition.value, |a, b| a < b),
  }
}

fn compare_numeric(resolved: &str, value: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
  match (resolved.trim().parse::<f64>(), value.trim().parse::<f64>()) {
    (Ok(a), Ok(b)) => cmp(a, b),
    _ => false,
  }
}
