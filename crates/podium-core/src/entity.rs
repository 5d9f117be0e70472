//! Entity references — the schools, teams and athletes a standing belongs to.
//!
//! The engine never owns these entities. It only holds a typed reference to
//! them; their records live with the external CRUD collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// The kind of entity a placement, tally or ranking is about.
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
pub enum EntityKind {
  School,
  Team,
  Athlete,
}

impl EntityKind {
  pub const ALL: [EntityKind; 3] =
    [EntityKind::School, EntityKind::Team, EntityKind::Athlete];
}

/// A typed reference to an externally-managed entity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityRef {
  pub kind: EntityKind,
  pub id:   Uuid,
}

impl EntityRef {
  pub fn new(kind: EntityKind, id: Uuid) -> Self { Self { kind, id } }

  pub fn school(id: Uuid) -> Self { Self::new(EntityKind::School, id) }

  pub fn team(id: Uuid) -> Self { Self::new(EntityKind::Team, id) }

  pub fn athlete(id: Uuid) -> Self { Self::new(EntityKind::Athlete, id) }
}

impl fmt::Display for EntityRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.kind, self.id)
  }
}
