//! Medal tallies — one entity's medal and point accumulation within a scope.
//!
//! Tallies are always recomputed from the full fact set of a scope. Totals are
//! write-time invariants maintained by [`MedalTally::reconcile`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{EntityKind, EntityRef},
  placement::{MedalType, PlacementFact},
  ranking::{Standing, StandingKey, assign_ranks},
  scope::ScopeKey,
};

/// One fact's contribution to a tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedalEntry {
  pub result_id:        Uuid,
  pub sport_id:         Uuid,
  pub tournament_id:    Uuid,
  pub event:            String,
  /// Who actually competed; differs from the tally's entity for school credit.
  pub participant:      EntityRef,
  pub participant_name: String,
  pub medal:            MedalType,
  pub position:         u32,
  pub points:           f64,
  pub competition_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedalTally {
  pub entity:          EntityRef,
  pub entity_name:     String,
  pub scope:           ScopeKey,
  pub region:          Option<String>,
  pub province:        Option<String>,
  /// Latest competition date contributing to this tally.
  pub tally_date:      NaiveDate,
  pub period_start:    Option<NaiveDate>,
  pub period_end:      Option<NaiveDate>,
  pub gold_medals:     u32,
  pub silver_medals:   u32,
  pub bronze_medals:   u32,
  pub total_medals:    u32,
  pub gold_points:     f64,
  pub silver_points:   f64,
  pub bronze_points:   f64,
  pub total_points:    f64,
  pub rank:            u32,
  pub previous_rank:   Option<u32>,
  pub medal_breakdown: Vec<MedalEntry>,
  pub generation:      u64,
  pub is_current:      bool,
  pub is_final:        bool,
}

impl MedalTally {
  fn empty(entity: EntityRef, entity_name: &str, scope: &ScopeKey, date: NaiveDate) -> Self {
    Self {
      entity,
      entity_name: entity_name.to_owned(),
      scope: scope.clone(),
      region: None,
      province: None,
      tally_date: date,
      period_start: None,
      period_end: None,
      gold_medals: 0,
      silver_medals: 0,
      bronze_medals: 0,
      total_medals: 0,
      gold_points: 0.0,
      silver_points: 0.0,
      bronze_points: 0.0,
      total_points: 0.0,
      rank: 0,
      previous_rank: None,
      medal_breakdown: Vec::new(),
      generation: 0,
      is_current: true,
      is_final: false,
    }
  }

  /// A zero tally for an entity that holds no facts in `scope`.
  pub fn placeholder(entity: EntityRef, entity_name: &str, scope: &ScopeKey) -> Self {
    Self::empty(entity, entity_name, scope, NaiveDate::MIN)
  }

  /// Recompute every derived field from the medal breakdown.
  pub fn reconcile(&mut self) {
    let (mut gold, mut silver, mut bronze) = (0u32, 0u32, 0u32);
    let (mut gold_pts, mut silver_pts, mut bronze_pts) = (0.0, 0.0, 0.0);
    for entry in &self.medal_breakdown {
      match entry.medal {
        MedalType::Gold => {
          gold += 1;
          gold_pts += entry.points;
        }
        MedalType::Silver => {
          silver += 1;
          silver_pts += entry.points;
        }
        MedalType::Bronze => {
          bronze += 1;
          bronze_pts += entry.points;
        }
        MedalType::None => {}
      }
    }
    self.gold_medals = gold;
    self.silver_medals = silver;
    self.bronze_medals = bronze;
    self.total_medals = gold + silver + bronze;
    self.gold_points = gold_pts;
    self.silver_points = silver_pts;
    self.bronze_points = bronze_pts;
    self.total_points = gold_pts + silver_pts + bronze_pts;

    self.period_start = self.medal_breakdown.iter().map(|e| e.competition_date).min();
    self.period_end = self.medal_breakdown.iter().map(|e| e.competition_date).max();
    if let Some(end) = self.period_end {
      self.tally_date = end;
    }
  }

  /// Whether `other` holds the same standing, ignoring lineage fields
  /// (`generation`, `previous_rank`, `is_current`, `is_final`).
  pub fn same_standing(&self, other: &Self) -> bool {
    self.entity == other.entity
      && self.entity_name == other.entity_name
      && self.scope == other.scope
      && self.region == other.region
      && self.province == other.province
      && self.tally_date == other.tally_date
      && self.period_start == other.period_start
      && self.period_end == other.period_end
      && self.gold_medals == other.gold_medals
      && self.silver_medals == other.silver_medals
      && self.bronze_medals == other.bronze_medals
      && self.total_medals == other.total_medals
      && self.gold_points.to_bits() == other.gold_points.to_bits()
      && self.silver_points.to_bits() == other.silver_points.to_bits()
      && self.bronze_points.to_bits() == other.bronze_points.to_bits()
      && self.total_points.to_bits() == other.total_points.to_bits()
      && self.rank == other.rank
      && self.medal_breakdown == other.medal_breakdown
  }
}

impl Standing for MedalTally {
  fn standing_key(&self) -> StandingKey<'_> {
    StandingKey {
      points:       self.total_points,
      total_medals: self.total_medals,
      gold:         self.gold_medals,
      silver:       self.silver_medals,
      bronze:       self.bronze_medals,
      name:         &self.entity_name,
      entity:       self.entity,
    }
  }

  fn set_rank(&mut self, rank: u32) { self.rank = rank; }
}

/// Fold `facts` into one tally per credited entity of `scope`.
///
/// The output is sorted per entity kind in ranking order, with `rank` assigned
/// within each kind. `previous_rank` is left empty; see [`carry_forward`].
pub fn aggregate(facts: &[PlacementFact], scope: &ScopeKey) -> Result<Vec<MedalTally>> {
  if let Some(stray) = facts.iter().find(|f| !scope.contains(&f.coordinates)) {
    return Err(Error::InvalidPlacement(format!(
      "result {} lies outside scope {scope}",
      stray.result_id
    )));
  }

  // Fold in a fixed order so float sums are reproducible.
  let mut ordered: Vec<&PlacementFact> = facts.iter().collect();
  ordered.sort_by(|a, b| {
    (a.competition_date, a.result_id).cmp(&(b.competition_date, b.result_id))
  });

  let mut by_entity: BTreeMap<EntityRef, MedalTally> = BTreeMap::new();
  for fact in ordered {
    for (entity, name) in fact.credited() {
      let tally = by_entity
        .entry(entity)
        .or_insert_with(|| MedalTally::empty(entity, name, scope, fact.competition_date));
      if tally.region.is_none() {
        tally.region = fact.region.clone();
      }
      if tally.province.is_none() {
        tally.province = fact.province.clone();
      }
      tally.medal_breakdown.push(MedalEntry {
        result_id:        fact.result_id,
        sport_id:         fact.coordinates.sport_id,
        tournament_id:    fact.coordinates.tournament_id,
        event:            fact.event.clone(),
        participant:      fact.entity,
        participant_name: fact.entity_name.clone(),
        medal:            fact.medal,
        position:         fact.position,
        points:           fact.points,
        competition_date: fact.competition_date,
      });
    }
  }

  let mut out = Vec::with_capacity(by_entity.len());
  for kind in EntityKind::ALL {
    let mut group: Vec<MedalTally> = by_entity
      .values()
      .filter(|t| t.entity.kind == kind)
      .cloned()
      .collect();
    for tally in &mut group {
      tally.reconcile();
    }
    assign_ranks(&mut group);
    out.extend(group);
  }
  Ok(out)
}

/// Copy each entity's rank in the superseded generation into `previous_rank`.
pub fn carry_forward(tallies: &mut [MedalTally], previous: &[MedalTally]) {
  let prior: BTreeMap<EntityRef, u32> =
    previous.iter().map(|t| (t.entity, t.rank)).collect();
  for tally in tallies {
    tally.previous_rank = prior.get(&tally.entity).copied();
  }
}

/// Whether two generations hold identical standings entity-for-entity.
pub fn unchanged(next: &[MedalTally], current: &[MedalTally]) -> bool {
  next.len() == current.len()
    && next.iter().all(|n| {
      current
        .iter()
        .any(|c| c.entity == n.entity && c.same_standing(n))
    })
}
