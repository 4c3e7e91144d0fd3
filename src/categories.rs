//! Two-level topic categories (`sport` -> `sport.football`, ...).
//!
//! The category tree ships with the crate as `assets/categories.json` and is
//! parsed once by [`Categories::bundled`]. Parameter setters that accept
//! categories take the tree explicitly.

use std::path::Path;

use once_cell::sync::OnceCell;
use serde_json::{Map, Value};

use crate::constants::Checkable;
use crate::error::{RadarlyError, Result};

const BUNDLED_JSON: &str = include_str!("../assets/categories.json");

static BUNDLED: OnceCell<Categories> = OnceCell::new();

/// One top-level category and its sub-categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    name: String,
    // (UPPER_SNAKE member name, "group.sub-category")
    members: Vec<(String, String)>,
}

impl CategoryGroup {
    fn new(name: &str, items: Vec<String>) -> Self {
        let members = items
            .into_iter()
            .map(|item| {
                let member = item.replace('-', "_").to_uppercase();
                (member, format!("{name}.{item}"))
            })
            .collect();
        Self {
            name: name.to_string(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire value of a member, looked up by upper-snake name
    /// (`FORMULA_ONE` -> `sport.formula-one`).
    pub fn get(&self, member: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, value)| value.as_str())
    }

    /// Upper-snake names of the members.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    /// Wire values of the members.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values().any(|v| v == value)
    }
}

/// The whole category tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categories {
    groups: Vec<CategoryGroup>,
}

impl Categories {
    /// The tree bundled with the crate, parsed on first use.
    pub fn bundled() -> Result<&'static Categories> {
        BUNDLED.get_or_try_init(|| Self::from_json(BUNDLED_JSON))
    }

    /// Parse a `{"group": ["sub", ...], ...}` document.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Map<String, Value> = serde_json::from_str(text)?;
        let groups = raw
            .into_iter()
            .map(|(name, items)| -> Result<CategoryGroup> {
                let items: Vec<String> = serde_json::from_value(items)?;
                Ok(CategoryGroup::new(&name, items))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { groups })
    }

    /// Load a category tree from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// A group by name, case-insensitively (`sport` or `SPORT`).
    pub fn group(&self, name: &str) -> Option<&CategoryGroup> {
        self.groups
            .iter()
            .find(|group| group.name.eq_ignore_ascii_case(name))
    }

    pub fn groups(&self) -> impl Iterator<Item = &CategoryGroup> {
        self.groups.iter()
    }

    /// Every sub-category wire value, regardless of group.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flat_map(CategoryGroup::values)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.groups.iter().any(|group| group.contains(value))
    }

    /// Check a value or a list of values against the flattened tree.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first unknown category.
    pub fn check<C: Checkable + ?Sized>(&self, value: &C) -> Result<()> {
        value.check_with("CATEGORY", &|v: &str| self.contains(v))
    }

    /// Wire value of `group.MEMBER`, e.g. `member("sport", "FOOTBALL")`.
    pub fn member(&self, group: &str, member: &str) -> Result<&str> {
        self.group(group)
            .and_then(|g| g.get(member))
            .ok_or_else(|| {
                RadarlyError::validation("CATEGORY", format!("'{group}.{member}' is not a category"))
            })
    }
}
