//! `{{placeholder}}` substitution.
//!
//! Substitution is global and case-insensitive on the key; unresolved
//! tokens are left literal. Values are not HTML-escaped — that is the
//! template author's responsibility.

use std::collections::HashMap;

use loomwork_model::Contact;

/// Build the placeholder map for a contact: standard keys first, then
/// custom fields (which may shadow a standard key of the same name).
pub fn placeholder_map(contact: &Contact) -> HashMap<String, String> {
  let mut map = HashMap::new();
  map.insert("first_name".to_string(), contact.first_name.clone());
  map.insert("last_name".to_string(), contact.last_name.clone());
  map.insert("full_name".to_string(), contact.full_name());
  map.insert("email".to_string(), contact.email.clone());
  map.insert("phone".to_string(), contact.phone.clone());
  for (key, value) in &contact.custom_fields {
    map.insert(key.to_lowercase(), value.clone());
  }
  map
}

/// Substitute every `{{key}}` token in `template` using `map`, matching
/// keys case-insensitively. A token with no match in `map` is left as-is.
pub fn substitute(template: &str, map: &HashMap<String, String>) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(start) = rest.find("{{") {
    let Some(end) = rest[start..].find("}}") else {
      out.push_str(rest);
      return out;
    };
    let end = start + end;

    out.push_str(&rest[..start]);
    let key = rest[start + 2..end].trim();
    match map.get(&key.to_lowercase()) {
      Some(value) => out.push_str(value),
      None => out.push_str(&rest[start..end + 2]),
    }
    rest = &rest[end + 2..];
  }

  out.push_str(rest);
  out
}
