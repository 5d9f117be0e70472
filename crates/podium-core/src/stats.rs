//! Per-year participation statistics.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
  entity::EntityKind,
  placement::{MedalType, PlacementFact},
};

/// Figures a competition year reports, derived from the same facts its
/// tallies are built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearStatistics {
  pub year:               String,
  pub total_tournaments:  usize,
  pub total_events:       usize,
  pub total_schools:      usize,
  /// Distinct athletes and teams.
  pub total_participants: usize,
  pub total_results:      usize,
  pub gold_medals:        u32,
  pub silver_medals:      u32,
  pub bronze_medals:      u32,
  pub total_medals:       u32,
}

pub fn year_statistics(year: &str, facts: &[PlacementFact]) -> YearStatistics {
  let mut tournaments = BTreeSet::new();
  let mut events = BTreeSet::new();
  let mut schools = BTreeSet::new();
  let mut participants = BTreeSet::new();
  let mut stats = YearStatistics { year: year.to_owned(), ..Default::default() };

  for fact in facts.iter().filter(|f| f.coordinates.season == year) {
    let at = &fact.coordinates;
    tournaments.insert(at.tournament_id);
    events.insert((at.tournament_id, at.sport_id, &at.division, &at.category, &fact.event));
    for (entity, _) in fact.credited() {
      match entity.kind {
        EntityKind::School => {
          schools.insert(entity.id);
        }
        EntityKind::Team | EntityKind::Athlete => {
          participants.insert(entity);
        }
      }
    }
    match fact.medal {
      MedalType::Gold => stats.gold_medals += 1,
      MedalType::Silver => stats.silver_medals += 1,
      MedalType::Bronze => stats.bronze_medals += 1,
      MedalType::None => {}
    }
    stats.total_results += 1;
  }

  stats.total_tournaments = tournaments.len();
  stats.total_events = events.len();
  stats.total_schools = schools.len();
  stats.total_participants = participants.len();
  stats.total_medals = stats.gold_medals + stats.silver_medals + stats.bronze_medals;
  stats
}
