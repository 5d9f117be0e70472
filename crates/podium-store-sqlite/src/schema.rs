//! SQL schema for the Podium SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS scopes (
    scope_key     TEXT PRIMARY KEY,   -- ScopeKey::canonical()
    season        TEXT NOT NULL,
    level         TEXT NOT NULL,      -- 'provincial' | 'regional' | 'national'
    sport_id      TEXT,
    tournament_id TEXT,
    division      TEXT,
    category      TEXT,
    closed        INTEGER NOT NULL DEFAULT 0,
    points_json   TEXT,               -- JSON PointsTable or NULL
    defined_at    TEXT NOT NULL
);

-- Verified results are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS results (
    result_id        TEXT PRIMARY KEY,
    participant_kind TEXT NOT NULL,
    participant_id   TEXT NOT NULL,
    participant_name TEXT NOT NULL,
    school_id        TEXT,
    school_name      TEXT,
    region           TEXT,
    province         TEXT,
    sport_id         TEXT NOT NULL,
    tournament_id    TEXT NOT NULL,
    level            TEXT NOT NULL,
    season           TEXT NOT NULL,
    division         TEXT NOT NULL,
    category         TEXT NOT NULL,
    event            TEXT NOT NULL,
    position         INTEGER NOT NULL CHECK (position >= 1),
    medal_type       TEXT NOT NULL,
    competition_date TEXT NOT NULL,   -- ISO 8601 date
    result_format    TEXT NOT NULL DEFAULT 'standard',
    recorded_at      TEXT NOT NULL    -- RFC 3339 UTC; server-assigned
);

-- A result replaced by a corrected version.
CREATE TABLE IF NOT EXISTS result_supersessions (
    supersession_id TEXT PRIMARY KEY,
    old_result_id   TEXT NOT NULL REFERENCES results(result_id),
    new_result_id   TEXT NOT NULL REFERENCES results(result_id),
    recorded_at     TEXT NOT NULL,
    UNIQUE (old_result_id),
    CHECK  (old_result_id != new_result_id)
);

-- A result withdrawn with no replacement.
CREATE TABLE IF NOT EXISTS result_retractions (
    retraction_id TEXT PRIMARY KEY,
    result_id     TEXT NOT NULL REFERENCES results(result_id),
    reason        TEXT,
    recorded_at   TEXT NOT NULL,
    UNIQUE (result_id)
);

CREATE TABLE IF NOT EXISTS matches (
    match_id      TEXT PRIMARY KEY,
    sport_id      TEXT NOT NULL,
    tournament_id TEXT NOT NULL,
    level         TEXT NOT NULL,
    season        TEXT NOT NULL,
    division      TEXT NOT NULL,
    category      TEXT NOT NULL,
    home_json     TEXT NOT NULL,      -- JSON MatchSide
    away_json     TEXT NOT NULL,
    played_on     TEXT NOT NULL,
    recorded_at   TEXT NOT NULL
);

-- Tally generations. Rows are never deleted; a recompute flips is_current.
CREATE TABLE IF NOT EXISTS tallies (
    scope_key       TEXT NOT NULL,
    entity_kind     TEXT NOT NULL,
    entity_id       TEXT NOT NULL,
    generation      INTEGER NOT NULL,
    entity_name     TEXT NOT NULL,
    region          TEXT,
    province        TEXT,
    tally_date      TEXT NOT NULL,
    period_start    TEXT,
    period_end      TEXT,
    gold_medals     INTEGER NOT NULL,
    silver_medals   INTEGER NOT NULL,
    bronze_medals   INTEGER NOT NULL,
    total_medals    INTEGER NOT NULL,
    gold_points     REAL NOT NULL,
    silver_points   REAL NOT NULL,
    bronze_points   REAL NOT NULL,
    total_points    REAL NOT NULL,
    rank            INTEGER NOT NULL,
    previous_rank   INTEGER,
    medal_breakdown TEXT NOT NULL,    -- JSON array of MedalEntry
    is_current      INTEGER NOT NULL,
    is_final        INTEGER NOT NULL,
    PRIMARY KEY (scope_key, entity_kind, entity_id, generation),
    CHECK (total_medals = gold_medals + silver_medals + bronze_medals)
);

CREATE UNIQUE INDEX IF NOT EXISTS tallies_current_idx
    ON tallies(scope_key, entity_kind, entity_id) WHERE is_current = 1;

-- Ranking generations, one universe per (scope_key, entity_kind).
CREATE TABLE IF NOT EXISTS rankings (
    scope_key          TEXT NOT NULL,
    entity_kind        TEXT NOT NULL,
    entity_id          TEXT NOT NULL,
    generation         INTEGER NOT NULL,
    entity_name        TEXT NOT NULL,
    current_rank       INTEGER NOT NULL,
    previous_rank      INTEGER,
    rank_change        INTEGER NOT NULL,
    points             REAL NOT NULL,
    rating             REAL NOT NULL,
    gold_medals        INTEGER NOT NULL,
    silver_medals      INTEGER NOT NULL,
    bronze_medals      INTEGER NOT NULL,
    total_medals       INTEGER NOT NULL,
    matches_played     INTEGER NOT NULL,
    wins               INTEGER NOT NULL,
    losses             INTEGER NOT NULL,
    draws              INTEGER NOT NULL,
    win_percentage     REAL NOT NULL,
    points_for         INTEGER NOT NULL,
    points_against     INTEGER NOT NULL,
    point_differential INTEGER NOT NULL,
    is_current         INTEGER NOT NULL,
    is_final           INTEGER NOT NULL,
    PRIMARY KEY (scope_key, entity_kind, entity_id, generation),
    CHECK (matches_played = wins + losses + draws)
);

CREATE UNIQUE INDEX IF NOT EXISTS rankings_current_idx
    ON rankings(scope_key, entity_kind, entity_id) WHERE is_current = 1;

CREATE TABLE IF NOT EXISTS champions (
    year          TEXT NOT NULL,
    level         TEXT NOT NULL,
    category      TEXT NOT NULL,
    generation    INTEGER NOT NULL,
    rank          INTEGER NOT NULL CHECK (rank >= 1),
    school_id     TEXT NOT NULL,
    school_name   TEXT NOT NULL,
    points        REAL NOT NULL,
    gold_medals   INTEGER NOT NULL,
    silver_medals INTEGER NOT NULL,
    bronze_medals INTEGER NOT NULL,
    total_medals  INTEGER NOT NULL,
    region        TEXT,
    province      TEXT,
    is_current    INTEGER NOT NULL,
    PRIMARY KEY (year, level, category, generation, rank)
);

-- No two schools share a rank in the current champion set.
CREATE UNIQUE INDEX IF NOT EXISTS champions_current_idx
    ON champions(year, level, category, rank) WHERE is_current = 1;

CREATE INDEX IF NOT EXISTS results_season_idx  ON results(season, level);
CREATE INDEX IF NOT EXISTS matches_season_idx  ON matches(season, level);
CREATE INDEX IF NOT EXISTS tallies_scope_idx   ON tallies(scope_key, generation);
CREATE INDEX IF NOT EXISTS rankings_scope_idx  ON rankings(scope_key, entity_kind, generation);

PRAGMA user_version = 1;
";
