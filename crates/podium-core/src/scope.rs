//! Scopes — the independent tally and ranking universes.
//!
//! A [`ScopeKey`] selects results by season and level, and optionally by sport,
//! tournament, division and category. An absent field matches everything.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{entity::EntityKind, placement::PointsTable};

/// Category spelling that means "every category".
pub const OVERALL_CATEGORY: &str = "overall";

// ─── Level ───────────────────────────────────────────────────────────────────

/// Competition level, ordered from the lowest feeder upwards.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
  Provincial,
  Regional,
  National,
}

// ─── Coordinates ─────────────────────────────────────────────────────────────

/// Where a single result or match took place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
  pub season:        String,
  pub level:         Level,
  pub sport_id:      Uuid,
  pub tournament_id: Uuid,
  pub division:      String,
  pub category:      String,
}

// ─── ScopeKey ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
  pub season:        String,
  pub level:         Level,
  #[serde(default)]
  pub sport_id:      Option<Uuid>,
  #[serde(default)]
  pub tournament_id: Option<Uuid>,
  #[serde(default)]
  pub division:      Option<String>,
  #[serde(default)]
  pub category:      Option<String>,
}

fn normalize_label(label: Option<String>) -> Option<String> {
  label
    .map(|l| l.trim().to_lowercase())
    .filter(|l| !l.is_empty() && l != OVERALL_CATEGORY && l != "*")
}

impl ScopeKey {
  /// A scope spanning every sport, tournament, division and category of one
  /// season and level.
  pub fn new(season: impl Into<String>, level: Level) -> Self {
    Self {
      season: season.into().trim().to_owned(),
      level,
      sport_id: None,
      tournament_id: None,
      division: None,
      category: None,
    }
  }

  /// The scope champion resolution reads for `(year, level, category)`.
  /// `"overall"` selects every category.
  pub fn champion(year: &str, level: Level, category: &str) -> Self {
    Self::new(year, level).with_category(category)
  }

  pub fn with_sport(mut self, sport_id: Uuid) -> Self {
    self.sport_id = Some(sport_id);
    self
  }

  pub fn with_tournament(mut self, tournament_id: Uuid) -> Self {
    self.tournament_id = Some(tournament_id);
    self
  }

  pub fn with_division(mut self, division: impl Into<String>) -> Self {
    self.division = normalize_label(Some(division.into()));
    self
  }

  pub fn with_category(mut self, category: impl Into<String>) -> Self {
    self.category = normalize_label(Some(category.into()));
    self
  }

  /// Trim and lowercase labels so that equal scopes share one canonical key.
  /// Keys deserialised from callers must pass through here before use.
  pub fn normalized(self) -> Self {
    Self {
      season: self.season.trim().to_owned(),
      division: normalize_label(self.division),
      category: normalize_label(self.category),
      ..self
    }
  }

  /// The `category` label as used in champion records.
  pub fn category_label(&self) -> &str {
    self.category.as_deref().unwrap_or(OVERALL_CATEGORY)
  }

  /// Stable string identity; used as the storage key and the lock key.
  pub fn canonical(&self) -> String {
    fn field<T: fmt::Display>(value: &Option<T>) -> String {
      value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "*".to_owned())
    }
    format!(
      "{}/{}/sport={}/tournament={}/division={}/category={}",
      self.season,
      self.level,
      field(&self.sport_id),
      field(&self.tournament_id),
      field(&self.division),
      field(&self.category),
    )
  }

  /// Whether a result at `at` belongs to this scope.
  pub fn contains(&self, at: &Coordinates) -> bool {
    self.season == at.season.trim()
      && self.level == at.level
      && self.sport_id.is_none_or(|s| s == at.sport_id)
      && self.tournament_id.is_none_or(|t| t == at.tournament_id)
      && self
        .division
        .as_deref()
        .is_none_or(|d| d.eq_ignore_ascii_case(at.division.trim()))
      && self
        .category
        .as_deref()
        .is_none_or(|c| c.eq_ignore_ascii_case(at.category.trim()))
  }
}

impl fmt::Display for ScopeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical())
  }
}

// ─── RankingScope ────────────────────────────────────────────────────────────

/// One ranking universe: a scope restricted to a single entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankingScope {
  pub scope: ScopeKey,
  pub kind:  EntityKind,
}

impl RankingScope {
  pub fn new(scope: ScopeKey, kind: EntityKind) -> Self { Self { scope, kind } }

  pub fn canonical(&self) -> String {
    format!("{}#{}", self.scope.canonical(), self.kind)
  }
}

// ─── ScopeDefinition ─────────────────────────────────────────────────────────

/// Administrative configuration for a scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeDefinition {
  pub key:        ScopeKey,
  /// `true` once the period is closed; closed scopes accept no new facts.
  pub closed:     bool,
  /// Per-scope medal weighting; falls back to the engine default.
  pub points:     Option<PointsTable>,
  pub defined_at: DateTime<Utc>,
}

impl ScopeDefinition {
  pub fn open(key: ScopeKey) -> Self {
    Self {
      key:        key.normalized(),
      closed:     false,
      points:     None,
      defined_at: Utc::now(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(division: &str, category: &str) -> Coordinates {
    Coordinates {
      season:        "2025".into(),
      level:         Level::Provincial,
      sport_id:      Uuid::nil(),
      tournament_id: Uuid::nil(),
      division:      division.into(),
      category:      category.into(),
    }
  }

  #[test]
  fn wildcard_scope_contains_everything_in_season_and_level() {
    let key = ScopeKey::new("2025", Level::Provincial);
    assert!(key.contains(&at("secondary", "boys")));
    assert!(!ScopeKey::new("2024", Level::Provincial).contains(&at("secondary", "boys")));
    assert!(!ScopeKey::new("2025", Level::Regional).contains(&at("secondary", "boys")));
  }

  #[test]
  fn labels_match_case_insensitively() {
    let key = ScopeKey::new("2025", Level::Provincial)
      .with_division("Secondary")
      .with_category("GIRLS");
    assert!(key.contains(&at("secondary", "Girls")));
    assert!(!key.contains(&at("secondary", "boys")));
  }

  #[test]
  fn overall_category_is_a_wildcard() {
    let key = ScopeKey::champion("2025", Level::National, "Overall");
    assert_eq!(key.category, None);
    assert_eq!(key.category_label(), OVERALL_CATEGORY);
  }

  #[test]
  fn canonical_is_stable_across_normalisation() {
    let a = ScopeKey::new("2025", Level::Regional).with_division("Tertiary");
    let b = ScopeKey {
      season:        " 2025 ".into(),
      level:         Level::Regional,
      sport_id:      None,
      tournament_id: None,
      division:      Some(" tertiary".into()),
      category:      Some("overall".into()),
    }
    .normalized();
    assert_eq!(a.canonical(), b.canonical());
    assert_eq!(
      a.canonical(),
      "2025/regional/sport=*/tournament=*/division=tertiary/category=*"
    );
  }
}
