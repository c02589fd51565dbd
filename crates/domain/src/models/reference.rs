//! Reference data: roles, regions and access rules.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::ALL_REGIONS;

/// Regions offered when none are stored.
pub const DEFAULT_REGIONS: &[&str] = &[
    "Київський",
    "Одеський",
    "Львівський",
    "Дніпровський",
    "Хмельницький",
    ALL_REGIONS,
];

/// A named role with free-form permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[validate(length(min = 1, max = 100, message = "Role name is required"))]
    pub name: String,
    #[serde(default)]
    pub permissions: serde_json::Value,
}

impl Role {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: serde_json::Value::Object(Default::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[validate(length(min = 1, max = 200, message = "Region name is required"))]
    pub name: String,
}

/// Defaults followed by any user regions not already present, trimmed and deduplicated.
///
/// Comma-separated user regions contribute each of their parts.
pub fn merge_default_regions<'a>(user_regions: impl IntoIterator<Item = &'a str>) -> Vec<Region> {
    let mut names: Vec<String> = DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect();
    for raw in user_regions {
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !names.iter().any(|n| n == part) {
                names.push(part.to_string());
            }
        }
    }
    names.into_iter().map(|name| Region { name }).collect()
}

/// Distinct non-empty user roles as role entries, in first-seen order.
pub fn roles_from_users<'a>(user_roles: impl IntoIterator<Item = &'a str>) -> Vec<Role> {
    let mut roles: Vec<Role> = Vec::new();
    for role in user_roles.into_iter().map(str::trim).filter(|r| !r.is_empty()) {
        if !roles.iter().any(|r| r.name == role) {
            roles.push(Role::named(role));
        }
    }
    roles
}

/// Access rules are an opaque JSON object owned by the UI.
pub type AccessRules = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_default_regions() {
        let regions = merge_default_regions(["Одеський", "Вінницький, Житомирський", " "]);
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names.len(), DEFAULT_REGIONS.len() + 2);
        assert_eq!(names[0], "Київський");
        assert!(names.contains(&"Вінницький"));
        assert!(names.contains(&"Житомирський"));
        assert_eq!(names.iter().filter(|n| **n == "Одеський").count(), 1);
    }

    #[test]
    fn test_roles_from_users() {
        let roles = roles_from_users(["admin", "service", "admin", ""]);
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["admin", "service"]);
    }
}
