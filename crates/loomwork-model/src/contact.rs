use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ContactStatus;

/// A messageable person. Read-mostly: only `update_status` mutates a
/// contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id: String,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub phone: String,
  pub status: ContactStatus,
  pub do_not_contact: bool,
  #[serde(default)]
  pub tags: HashSet<String>,
  #[serde(default)]
  pub custom_fields: HashMap<String, String>,
  /// Set true once `stop_on_reply` (or any reply-aware processor) observes
  /// an inbound message; mirrors the `replied` standard field from §4.1.
  #[serde(default)]
  pub replied: bool,
  #[serde(default)]
  pub last_contacted: Option<DateTime<Utc>>,
}

impl Contact {
  /// Resolve a field name against this contact: standard fields first, then
  /// custom fields (case-insensitive name), then tag membership. Missing
  /// fields resolve to the empty string.
  pub fn resolve_field(&self, field: &str) -> String {
    match field {
      "first_name" => return self.first_name.clone(),
      "last_name" => return self.last_name.clone(),
      "email" => return self.email.clone(),
      "phone" => return self.phone.clone(),
      "status" => return self.status.as_str().to_string(),
      "replied" => return self.replied.to_string(),
      "last_contacted" => {
        return self
          .last_contacted
          .map(|t| t.to_rfc3339())
          .unwrap_or_default();
      }
      _ => {}
    }

    if let Some(value) = self
      .custom_fields
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(field))
      .map(|(_, v)| v.clone())
    {
      return value;
    }

    if self.tags.iter().any(|t| t.eq_ignore_ascii_case(field)) {
      return "true".to_string();
    }

    String::new()
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name).trim().to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn contact() -> Contact {
    Contact {
      contact_id: "c1".into(),
      first_name: "Ana".into(),
      last_name: "Diaz".into(),
      email: "ana@example.com".into(),
      phone: "+15551234567".into(),
      status: ContactStatus::New,
      do_not_contact: false,
      tags: HashSet::from(["vip".to_string()]),
      custom_fields: HashMap::from([("Region".to_string(), "west".to_string())]),
      replied: false,
      last_contacted: None,
    }
  }

  #[test]
  fn resolves_standard_fields() {
    let c = contact();
    assert_eq!(c.resolve_field("first_name"), "Ana");
    assert_eq!(c.resolve_field("status"), "new");
  }

  #[test]
  fn resolves_custom_fields_case_insensitively() {
    let c = contact();
    assert_eq!(c.resolve_field("region"), "west");
    assert_eq!(c.resolve_field("REGION"), "west");
  }

  #[test]
  fn resolves_tag_membership() {
    let c = contact();
    assert_eq!(c.resolve_field("vip"), "true");
    assert_eq!(c.resolve_field("nonexistent"), "");
  }
}
