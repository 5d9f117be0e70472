//! Verified results and the placement facts derived from them.
//!
//! A [`VerifiedResult`] is an append-only ledger row produced once a human has
//! verified an outcome. A [`PlacementFact`] is the normalised, weighted view of
//! one result; it is derived fresh on every recompute and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{EntityKind, EntityRef},
  scope::{Coordinates, Level},
};

// ─── Medals ──────────────────────────────────────────────────────────────────

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
pub enum MedalType {
  Gold,
  Silver,
  Bronze,
  None,
}

impl MedalType {
  /// The finishing position a medal implies, if any.
  pub fn canonical_position(self) -> Option<u32> {
    match self {
      Self::Gold => Some(1),
      Self::Silver => Some(2),
      Self::Bronze => Some(3),
      Self::None => None,
    }
  }
}

/// How a sport reports placements.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResultFormat {
  /// One entity per medal position.
  #[default]
  Standard,
  /// Several entities may share a medal at the same position (e.g. two
  /// bronzes in combat sports).
  TiesAllowed,
}

/// Points awarded per medal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsTable {
  pub gold:   f64,
  pub silver: f64,
  pub bronze: f64,
  #[serde(default)]
  pub none:   f64,
}

impl Default for PointsTable {
  fn default() -> Self { Self { gold: 3.0, silver: 2.0, bronze: 1.0, none: 0.0 } }
}

impl PointsTable {
  pub fn points_for(&self, medal: MedalType) -> f64 {
    match medal {
      MedalType::Gold => self.gold,
      MedalType::Silver => self.silver,
      MedalType::Bronze => self.bronze,
      MedalType::None => self.none,
    }
  }

  /// Reject weights that would make totals meaningless.
  pub fn validate(&self) -> Result<()> {
    for (name, value) in [
      ("gold", self.gold),
      ("silver", self.silver),
      ("bronze", self.bronze),
      ("none", self.none),
    ] {
      if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidPlacement(format!(
          "{name} points must be a non-negative number, got {value}"
        )));
      }
    }
    Ok(())
  }
}

// ─── Ledger rows ─────────────────────────────────────────────────────────────

/// A verified result as recorded in the ledger. Never updated once written;
/// corrections are supersessions, withdrawals are retractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedResult {
  pub result_id:        Uuid,
  /// Server-assigned timestamp; never changes after creation.
  pub recorded_at:      DateTime<Utc>,
  pub participant:      EntityRef,
  pub participant_name: String,
  /// The school an athlete or team competes for.
  pub school_id:        Option<Uuid>,
  pub school_name:      Option<String>,
  pub region:           Option<String>,
  pub province:         Option<String>,
  pub sport_id:         Uuid,
  pub tournament_id:    Uuid,
  pub level:            Level,
  pub season:           String,
  pub division:         String,
  pub category:         String,
  /// Event name within the sport, e.g. "100m dash".
  pub event:            String,
  pub position:         u32,
  pub medal_type:       MedalType,
  pub competition_date: NaiveDate,
  pub result_format:    ResultFormat,
}

impl VerifiedResult {
  pub fn coordinates(&self) -> Coordinates {
    Coordinates {
      season:        self.season.clone(),
      level:         self.level,
      sport_id:      self.sport_id,
      tournament_id: self.tournament_id,
      division:      self.division.clone(),
      category:      self.category.clone(),
    }
  }
}

/// Input to [`crate::store::StandingsStore::record_result`].
/// `result_id` and `recorded_at` are always set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResult {
  pub participant:      EntityRef,
  pub participant_name: String,
  #[serde(default)]
  pub school_id:        Option<Uuid>,
  #[serde(default)]
  pub school_name:      Option<String>,
  #[serde(default)]
  pub region:           Option<String>,
  #[serde(default)]
  pub province:         Option<String>,
  pub sport_id:         Uuid,
  pub tournament_id:    Uuid,
  pub level:            Level,
  pub season:           String,
  pub division:         String,
  pub category:         String,
  pub event:            String,
  pub position:         u32,
  pub medal_type:       MedalType,
  pub competition_date: NaiveDate,
  #[serde(default)]
  pub result_format:    ResultFormat,
}

impl NewResult {
  /// Attach the store-assigned identity.
  pub fn into_verified(self, result_id: Uuid, recorded_at: DateTime<Utc>) -> VerifiedResult {
    VerifiedResult {
      result_id,
      recorded_at,
      participant: self.participant,
      participant_name: self.participant_name,
      school_id: self.school_id,
      school_name: self.school_name,
      region: self.region,
      province: self.province,
      sport_id: self.sport_id,
      tournament_id: self.tournament_id,
      level: self.level,
      season: self.season,
      division: self.division,
      category: self.category,
      event: self.event,
      position: self.position,
      medal_type: self.medal_type,
      competition_date: self.competition_date,
      result_format: self.result_format,
    }
  }
}

// ─── PlacementFact ───────────────────────────────────────────────────────────

/// The school credited alongside an athlete or team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolCredit {
  pub id:   Uuid,
  pub name: String,
}

/// One entity's normalised, weighted result in one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementFact {
  pub result_id:        Uuid,
  pub entity:           EntityRef,
  pub entity_name:      String,
  pub school:           Option<SchoolCredit>,
  pub region:           Option<String>,
  pub province:         Option<String>,
  pub coordinates:      Coordinates,
  pub event:            String,
  pub medal:            MedalType,
  pub position:         u32,
  pub points:           f64,
  pub competition_date: NaiveDate,
  pub result_format:    ResultFormat,
}

impl PlacementFact {
  /// Every entity this fact counts towards: the participant itself, plus its
  /// school when the participant is an athlete or a team.
  pub fn credited(&self) -> Vec<(EntityRef, &str)> {
    let mut out = vec![(self.entity, self.entity_name.as_str())];
    match self.entity.kind {
      EntityKind::School => {}
      EntityKind::Team | EntityKind::Athlete => {
        if let Some(school) = &self.school {
          out.push((EntityRef::school(school.id), school.name.as_str()));
        }
      }
    }
    out
  }

  /// Identity of the event slot this fact occupies.
  fn slot(&self) -> (Uuid, Uuid, &str, &str, &str, u32) {
    (
      self.coordinates.tournament_id,
      self.coordinates.sport_id,
      self.event.as_str(),
      self.coordinates.division.as_str(),
      self.coordinates.category.as_str(),
      self.position,
    )
  }
}

fn blank(s: &str) -> bool { s.trim().is_empty() }

/// Turn a verified result into a [`PlacementFact`], weighting it with `points`.
pub fn normalize(result: &VerifiedResult, points: &PointsTable) -> Result<PlacementFact> {
  let id = result.result_id;

  if blank(&result.participant_name) {
    return Err(Error::InvalidPlacement(format!("result {id}: participant name is blank")));
  }
  if blank(&result.event) {
    return Err(Error::InvalidPlacement(format!("result {id}: event is blank")));
  }
  if blank(&result.season) {
    return Err(Error::InvalidPlacement(format!("result {id}: season is blank")));
  }
  if result.position == 0 {
    return Err(Error::InvalidPlacement(format!("result {id}: position must be 1 or greater")));
  }
  if let Some(expected) = result.medal_type.canonical_position()
    && expected != result.position
  {
    return Err(Error::InvalidPlacement(format!(
      "result {id}: {} medal implies position {expected}, got {}",
      result.medal_type, result.position
    )));
  }

  let school = match (result.school_id, result.school_name.as_deref()) {
    (Some(sid), Some(name)) if !blank(name) => Some(SchoolCredit {
      id:   sid,
      name: name.trim().to_owned(),
    }),
    (Some(sid), _) => {
      return Err(Error::InvalidPlacement(format!(
        "result {id}: school {sid} is missing a name"
      )));
    }
    (None, _) => None,
  };

  if result.participant.kind == EntityKind::School
    && let Some(s) = &school
    && s.id != result.participant.id
  {
    return Err(Error::InvalidPlacement(format!(
      "result {id}: school participant {} names a different school {}",
      result.participant.id, s.id
    )));
  }

  Ok(PlacementFact {
    result_id: id,
    entity: result.participant,
    entity_name: result.participant_name.trim().to_owned(),
    school,
    region: result.region.clone(),
    province: result.province.clone(),
    coordinates: result.coordinates(),
    event: result.event.trim().to_owned(),
    medal: result.medal_type,
    position: result.position,
    points: points.points_for(result.medal_type),
    competition_date: result.competition_date,
    result_format: result.result_format,
  })
}

/// Reject two medal facts occupying the same event position unless both
/// belong to a sport whose format allows ties.
pub fn check_event_positions(facts: &[PlacementFact]) -> Result<()> {
  let mut medal_facts: Vec<&PlacementFact> =
    facts.iter().filter(|f| f.medal != MedalType::None).collect();
  medal_facts.sort_by(|a, b| a.slot().cmp(&b.slot()));

  for pair in medal_facts.windows(2) {
    let (a, b) = (pair[0], pair[1]);
    if a.slot() == b.slot()
      && (a.result_format == ResultFormat::Standard
        || b.result_format == ResultFormat::Standard)
    {
      return Err(Error::InvalidPlacement(format!(
        "{} and {} both hold position {} in event {:?}",
        a.entity_name, b.entity_name, a.position, a.event
      )));
    }
  }
  Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn result(name: &str, medal: MedalType, position: u32) -> VerifiedResult {
    VerifiedResult {
      result_id:        Uuid::new_v4(),
      recorded_at:      Utc::now(),
      participant:      EntityRef::school(Uuid::new_v4()),
      participant_name: name.into(),
      school_id:        None,
      school_name:      None,
      region:           None,
      province:         None,
      sport_id:         Uuid::nil(),
      tournament_id:    Uuid::nil(),
      level:            Level::Provincial,
      season:           "2025".into(),
      division:         "secondary".into(),
      category:         "boys".into(),
      event:            "100m".into(),
      position,
      medal_type:       medal,
      competition_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      result_format:    ResultFormat::Standard,
    }
  }

  #[test]
  fn default_points_are_three_two_one() {
    let table = PointsTable::default();
    let gold = normalize(&result("A", MedalType::Gold, 1), &table).unwrap();
    let silver = normalize(&result("A", MedalType::Silver, 2), &table).unwrap();
    let bronze = normalize(&result("A", MedalType::Bronze, 3), &table).unwrap();
    let none = normalize(&result("A", MedalType::None, 7), &table).unwrap();
    assert_eq!(
      [gold.points, silver.points, bronze.points, none.points],
      [3.0, 2.0, 1.0, 0.0]
    );
  }

  #[test]
  fn override_table_replaces_weights() {
    let table = PointsTable { gold: 5.0, silver: 3.0, bronze: 1.0, none: 0.0 };
    let fact = normalize(&result("A", MedalType::Gold, 1), &table).unwrap();
    assert_eq!(fact.points, 5.0);
  }

  #[test]
  fn medal_contradicting_position_is_rejected() {
    let err = normalize(&result("A", MedalType::Gold, 2), &PointsTable::default())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidPlacement(_)));
  }

  #[test]
  fn zero_position_and_blank_name_are_rejected() {
    let table = PointsTable::default();
    assert!(normalize(&result("A", MedalType::None, 0), &table).is_err());
    assert!(normalize(&result("  ", MedalType::Gold, 1), &table).is_err());
  }

  #[test]
  fn school_without_name_is_rejected() {
    let mut r = result("Juan", MedalType::Gold, 1);
    r.participant = EntityRef::athlete(Uuid::new_v4());
    r.school_id = Some(Uuid::new_v4());
    assert!(normalize(&r, &PointsTable::default()).is_err());
  }

  #[test]
  fn athlete_credits_school() {
    let school = Uuid::new_v4();
    let mut r = result("Juan", MedalType::Silver, 2);
    r.participant = EntityRef::athlete(Uuid::new_v4());
    r.school_id = Some(school);
    r.school_name = Some("Central".into());

    let fact = normalize(&r, &PointsTable::default()).unwrap();
    let credited = fact.credited();
    assert_eq!(credited.len(), 2);
    assert_eq!(credited[1], (EntityRef::school(school), "Central"));
  }

  #[test]
  fn shared_gold_needs_ties_allowed() {
    let table = PointsTable::default();
    let a = normalize(&result("A", MedalType::Gold, 1), &table).unwrap();
    let b = normalize(&result("B", MedalType::Gold, 1), &table).unwrap();
    assert!(check_event_positions(&[a.clone(), b.clone()]).is_err());

    let mut tied_a = result("A", MedalType::Bronze, 3);
    let mut tied_b = result("B", MedalType::Bronze, 3);
    tied_a.result_format = ResultFormat::TiesAllowed;
    tied_b.result_format = ResultFormat::TiesAllowed;
    let facts = [normalize(&tied_a, &table).unwrap(), normalize(&tied_b, &table).unwrap()];
    assert!(check_event_positions(&facts).is_ok());
  }

  #[test]
  fn unplaced_facts_may_share_positions() {
    let table = PointsTable::default();
    let a = normalize(&result("A", MedalType::None, 5), &table).unwrap();
    let b = normalize(&result("B", MedalType::None, 5), &table).unwrap();
    assert!(check_event_positions(&[a, b]).is_ok());
  }
}
