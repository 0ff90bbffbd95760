//! The `conditional_split` expression tree.
//!
//! An [`Expression`] is a list of [`ConditionGroup`]s joined by
//! `group_operator`; a group is a list of [`Condition`]s joined by
//! `logical_operator`. Evaluating this tree against a contact is the job of
//! `loomwork-condition` — this crate only defines the shape, since the
//! shape is part of the node payload (serialized/deserialized with the rest
//! of the graph).

use serde::{Deserialize, Serialize};

use crate::enums::BoolOperator;

/// The comparison applied to a resolved field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
  Equals,
  NotEquals,
  Contains,
  NotContains,
  StartsWith,
  EndsWith,
  IsEmpty,
  IsNotEmpty,
  GreaterThan,
  LessThan,
}

/// A single `{field, operator, value}` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
  pub field: String,
  pub operator: ConditionOperator,
  #[serde(default)]
  pub value: String,
}

/// A group of conditions joined by `logical_operator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
  #[serde(default)]
  pub conditions: Vec<Condition>,
  pub logical_operator: BoolOperator,
}

/// The full expression tree evaluated by a `conditional_split` node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
  #[serde(default)]
  pub groups: Vec<ConditionGroup>,
  pub group_operator: BoolOperator,
}

impl Expression {
  /// Auto-migrate a legacy flat `{field, operator, value}` payload into a
  /// one-group/one-condition tree.
  pub fn from_legacy(field: String, operator: ConditionOperator, value: String) -> Self {
    Expression {
      groups: vec![ConditionGroup {
        conditions: vec![Condition {
          field,
          operator,
          value,
        }],
        logical_operator: BoolOperator::And,
      }],
      group_operator: BoolOperator::And,
    }
  }
}

/// The two shapes a `conditional_split` payload's `expression` may arrive
/// in on the wire: the current group tree, or a legacy flat single
/// condition (no `groups` key). Deserializing through this wire type is
/// what performs the auto-migration the load path requires — callers never
/// see the legacy shape once a [`Expression`] exists.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpressionWire {
  Tree {
    #[serde(default)]
    groups: Vec<ConditionGroup>,
    group_operator: BoolOperator,
  },
  Legacy {
    field: String,
    operator: ConditionOperator,
    #[serde(default)]
    value: String,
  },
}

impl<'de> Deserialize<'de> for Expression {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    match ExpressionWire::deserialize(deserializer)? {
      ExpressionWire::Tree { groups, group_operator } => Ok(Expression { groups, group_operator }),
      ExpressionWire::Legacy { field, operator, value } => Ok(Expression::from_legacy(field, operator, value)),
    }
  }
}
