//! Overall champions per (year, level, category).
//!
//! Champions are chosen from school tallies with the ranking comparator.
//! Unlike rankings, champion ranks are positional: exactly one school holds
//! each rank.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{EntityKind, EntityRef},
  ranking::assign_ranks,
  scope::{Level, ScopeKey},
  tally::MedalTally,
};

pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallChampion {
  pub year:          String,
  pub level:         Level,
  pub category:      String,
  pub school:        EntityRef,
  pub school_name:   String,
  pub rank:          u32,
  pub points:        f64,
  pub gold_medals:   u32,
  pub silver_medals: u32,
  pub bronze_medals: u32,
  pub total_medals:  u32,
  pub region:        Option<String>,
  pub province:      Option<String>,
  pub generation:    u64,
  pub is_current:    bool,
}

impl OverallChampion {
  pub fn title(&self) -> String { place_title(self.rank) }
}

/// "Champion", "1st Runner-up", "2nd Runner-up", then "4th Place" onwards.
pub fn place_title(rank: u32) -> String {
  match rank {
    1 => "Champion".to_owned(),
    2 => "1st Runner-up".to_owned(),
    3 => "2nd Runner-up".to_owned(),
    n => format!("{n}{} Place", ordinal_suffix(n)),
  }
}

fn ordinal_suffix(n: u32) -> &'static str {
  match (n % 10, n % 100) {
    (_, 11..=13) => "th",
    (1, _) => "st",
    (2, _) => "nd",
    (3, _) => "rd",
    _ => "th",
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// A school entered into the pool by hand, e.g. a host-school slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
  pub school_id: Uuid,
  pub name:      String,
}

/// The roll-up rule: which lower-level scopes feed this pool, and how many
/// schools from each of them qualify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
  pub feeders: Vec<ScopeKey>,
  #[serde(default = "default_qualify_top_n")]
  pub top_n:   u32,
}

fn default_qualify_top_n() -> u32 { DEFAULT_TOP_N as u32 }

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChampionPolicy {
  /// How many champion rows to write; falls back to the engine default.
  #[serde(default)]
  pub top_n:          Option<usize>,
  #[serde(default)]
  pub qualification:  Option<Qualification>,
  #[serde(default)]
  pub pool_additions: Vec<PoolEntry>,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Schools placing within `top_n` of any feeder scope's school tallies.
pub fn qualified_schools(feeder_tallies: &[MedalTally], top_n: u32) -> BTreeSet<Uuid> {
  feeder_tallies
    .iter()
    .filter(|t| t.entity.kind == EntityKind::School && t.rank >= 1 && t.rank <= top_n)
    .map(|t| t.entity.id)
    .collect()
}

/// Pick the top `top_n` schools of `candidates` for `scope`.
///
/// `additions` are appended as zero tallies when not already present. When
/// `qualified` is given, every school in the pool must belong to it.
pub fn select_champions(
  scope: &ScopeKey,
  candidates: &[MedalTally],
  additions: &[PoolEntry],
  qualified: Option<&BTreeSet<Uuid>>,
  top_n: usize,
) -> Result<Vec<OverallChampion>> {
  let mut pool: Vec<MedalTally> = candidates
    .iter()
    .filter(|t| t.entity.kind == EntityKind::School)
    .cloned()
    .collect();
  for entry in additions {
    let school = EntityRef::school(entry.school_id);
    if !pool.iter().any(|t| t.entity == school) {
      pool.push(MedalTally::placeholder(school, entry.name.trim(), scope));
    }
  }

  assign_ranks(&mut pool);

  if let Some(qualified) = qualified
    && let Some(outsider) = pool.iter().find(|t| !qualified.contains(&t.entity.id))
  {
    return Err(Error::UnqualifiedEntity {
      entity: outsider.entity,
      name:   outsider.entity_name.clone(),
    });
  }

  Ok(
    pool
      .into_iter()
      .take(top_n)
      .enumerate()
      .map(|(i, t)| OverallChampion {
        year:          scope.season.clone(),
        level:         scope.level,
        category:      scope.category_label().to_owned(),
        school:        t.entity,
        school_name:   t.entity_name,
        rank:          i as u32 + 1,
        points:        t.total_points,
        gold_medals:   t.gold_medals,
        silver_medals: t.silver_medals,
        bronze_medals: t.bronze_medals,
        total_medals:  t.total_medals,
        region:        t.region,
        province:      t.province,
        generation:    0,
        is_current:    true,
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    placement::{MedalType, PointsTable, normalize, tests::result},
    tally::aggregate,
  };

  fn tallies(scope: &ScopeKey, entries: &[(Uuid, &str, MedalType)]) -> Vec<MedalTally> {
    let facts: Vec<_> = entries
      .iter()
      .map(|(id, name, medal)| {
        let mut r = result(name, *medal, medal.canonical_position().unwrap_or(4));
        r.participant = EntityRef::school(*id);
        r.level = scope.level;
        if let Some(category) = &scope.category {
          r.category = category.clone();
        }
        r.event = format!("event-{}", Uuid::new_v4());
        normalize(&r, &PointsTable::default()).unwrap()
      })
      .collect();
    aggregate(&facts, scope).unwrap()
  }

  #[test]
  fn titles() {
    assert_eq!(place_title(1), "Champion");
    assert_eq!(place_title(2), "1st Runner-up");
    assert_eq!(place_title(3), "2nd Runner-up");
    assert_eq!(place_title(4), "4th Place");
    assert_eq!(place_title(11), "11th Place");
    assert_eq!(place_title(21), "21st Place");
    assert_eq!(place_title(22), "22nd Place");
  }

  #[test]
  fn tied_schools_still_get_distinct_ranks() {
    let scope = ScopeKey::champion("2025", Level::Provincial, "overall");
    let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let pool = tallies(
      &scope,
      &[
        (a, "Central", MedalType::Gold),
        (b, "Ateneo", MedalType::Gold),
        (c, "Baguio", MedalType::Silver),
        (d, "Davao", MedalType::Bronze),
      ],
    );

    let champs = select_champions(&scope, &pool, &[], None, 3).unwrap();
    let ranks: Vec<_> = champs.iter().map(|c| (c.school_name.as_str(), c.rank)).collect();
    assert_eq!(ranks, vec![("Ateneo", 1), ("Central", 2), ("Baguio", 3)]);
    assert_eq!(champs[0].category, "overall");
  }

  #[test]
  fn fewer_schools_than_top_n() {
    let scope = ScopeKey::champion("2025", Level::Provincial, "girls");
    let pool = tallies(&scope, &[(Uuid::new_v4(), "Solo", MedalType::Gold)]);
    let champs = select_champions(&scope, &pool, &[], None, 3).unwrap();
    assert_eq!(champs.len(), 1);
    assert_eq!(champs[0].category, "girls");
  }

  #[test]
  fn pool_addition_without_feeder_placement_is_unqualified() {
    let national = ScopeKey::champion("2025", Level::National, "overall");
    let (a, host) = (Uuid::new_v4(), Uuid::new_v4());
    let pool = tallies(&national, &[(a, "Central", MedalType::Gold)]);
    let qualified: BTreeSet<Uuid> = [a].into_iter().collect();
    let additions = [PoolEntry { school_id: host, name: "Host School".into() }];

    let err = select_champions(&national, &pool, &additions, Some(&qualified), 3).unwrap_err();
    assert!(matches!(
      err,
      Error::UnqualifiedEntity { entity, ref name } if entity.id == host && name == "Host School"
    ));
  }

  #[test]
  fn qualified_schools_take_top_n_per_feeder() {
    let regional = ScopeKey::new("2025", Level::Regional);
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    let feeder = tallies(
      &regional,
      &[
        (ids[0], "A", MedalType::Gold),
        (ids[1], "B", MedalType::Silver),
        (ids[2], "C", MedalType::Bronze),
        (ids[3], "D", MedalType::None),
      ],
    );
    let q = qualified_schools(&feeder, 3);
    assert_eq!(q.len(), 3);
    assert!(!q.contains(&ids[3]));
  }
}
