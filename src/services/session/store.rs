use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::SessionGateway;
use crate::models::recurrence::{weekday_index, RecurrencePattern, ScheduleSpec, SlotTimes};
use crate::models::session::{NewSession, SessionBlock, SessionId, SessionPatch, SessionStatus};
use crate::models::settings::{GridSettings, Settings};
use crate::services::availability::AvailabilitySlot;
use crate::services::database::Database;
use crate::services::error::{SchedulingError, SchedulingResult};
use crate::services::schedule::{SlotSequencer, SlotVerdict};
use crate::utils::date::format_minute;

const SESSION_COLUMNS: &str =
    "id, date, start_minute, end_minute, status, title, note, pattern";

/// Time-of-day slots offered by the availability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityGrid {
    pub start_minute: u32,
    pub end_minute: u32,
    pub slot_minutes: u32,
    pub weeks_ahead: u32,
}

impl AvailabilityGrid {
    /// Slots covering the visible hours, one default session long each.
    pub fn from_grid_settings(grid: &GridSettings) -> Self {
        Self {
            start_minute: grid.visible_start_hour * 60,
            end_minute: grid.visible_end_hour * 60,
            slot_minutes: grid.default_session_minutes,
            ..Self::default()
        }
    }
}

impl Default for AvailabilityGrid {
    fn default() -> Self {
        Self {
            start_minute: 6 * 60,
            end_minute: 22 * 60,
            slot_minutes: 60,
            weeks_ahead: 4,
        }
    }
}

/// SQLite-backed gateway used when no remote scheduling service is
/// configured. Overlap with a non-cancelled session is the only conflict rule.
pub struct LocalSessionStore {
    db: Mutex<Database>,
    sequencer: SlotSequencer,
    grid: AvailabilityGrid,
}

impl LocalSessionStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            sequencer: SlotSequencer::new(),
            grid: AvailabilityGrid::default(),
        }
    }

    /// Open (or create) the store at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self> {
        let db = Database::new(path)?;
        db.initialize_schema()?;
        Ok(Self::new(db))
    }

    pub fn with_sequencer(mut self, sequencer: SlotSequencer) -> Self {
        self.sequencer = sequencer;
        self
    }

    pub fn with_availability_grid(mut self, grid: AvailabilityGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Apply the scheduling horizon and visible hours from `settings`, so
    /// previews expand exactly like the planner's local draft.
    pub fn configured(self, settings: &Settings) -> Self {
        self.with_sequencer(SlotSequencer::with_horizon(
            settings.scheduling.max_horizon_days,
        ))
        .with_availability_grid(AvailabilityGrid::from_grid_settings(&settings.grid))
    }

    fn lock(&self) -> SchedulingResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| SchedulingError::Network("Session store lock poisoned".to_string()))
    }
}

fn row_to_block(row: &Row<'_>) -> rusqlite::Result<SessionBlock> {
    let status: String = row.get(4)?;
    let status = SessionStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("Unknown session status '{}'", status).into(),
        )
    })?;

    let pattern = match row.get::<_, Option<String>>(7)? {
        Some(key) => Some(
            RecurrencePattern::from_key(&key)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into()))?,
        ),
        None => None,
    };

    Ok(SessionBlock {
        id: row.get(0)?,
        date: row.get(1)?,
        start_minute: row.get(2)?,
        end_minute: row.get(3)?,
        status,
        title: row.get(5)?,
        note: row.get(6)?,
        pattern,
    })
}

fn find(conn: &Connection, id: SessionId) -> Result<Option<SessionBlock>> {
    conn.query_row(
        &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
        [id],
        row_to_block,
    )
    .optional()
    .context("Failed to load session")
}

/// First occupying session that overlaps the span, ignoring `exclude`.
fn find_overlap(
    conn: &Connection,
    date: NaiveDate,
    start_minute: u32,
    end_minute: u32,
    exclude: Option<SessionId>,
) -> Result<Option<SessionBlock>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM sessions
             WHERE date = ?1 AND status != 'cancelled'
               AND start_minute < ?3 AND end_minute > ?2 AND id != ?4
             ORDER BY start_minute LIMIT 1",
            SESSION_COLUMNS
        ),
        params![date, start_minute, end_minute, exclude.unwrap_or(0)],
        row_to_block,
    )
    .optional()
    .context("Failed to check for overlapping sessions")
}

fn insert(conn: &Connection, block: &SessionBlock) -> Result<SessionId> {
    let now = Local::now().to_rfc3339();
    conn.execute(
        "INSERT INTO sessions (date, start_minute, end_minute, status, title, note, pattern,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            block.date,
            block.start_minute,
            block.end_minute,
            block.status.as_str(),
            block.title,
            block.note,
            block.pattern.as_ref().map(RecurrencePattern::key),
            now,
        ],
    )
    .context("Failed to insert session")?;
    Ok(conn.last_insert_rowid())
}

fn save(conn: &Connection, block: &SessionBlock) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE sessions
             SET date = ?1, start_minute = ?2, end_minute = ?3, status = ?4,
                 title = ?5, note = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                block.date,
                block.start_minute,
                block.end_minute,
                block.status.as_str(),
                block.title,
                block.note,
                Local::now().to_rfc3339(),
                block.id,
            ],
        )
        .context("Failed to update session")?;
    if changed == 0 {
        return Err(anyhow!("Session {} not found", block.id));
    }
    Ok(())
}

fn list_between(conn: &Connection, from: NaiveDate, to: NaiveDate) -> Result<Vec<SessionBlock>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM sessions WHERE date >= ?1 AND date <= ?2
             ORDER BY date, start_minute, id",
            SESSION_COLUMNS
        ))
        .context("Failed to prepare session range query")?;
    let rows = stmt
        .query_map(params![from, to], row_to_block)
        .context("Failed to query session range")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read session rows")
}

fn clash_reason(clash: &SessionBlock) -> String {
    format!(
        "Overlaps '{}' on {} {}–{}",
        clash.title,
        clash.date,
        format_minute(clash.start_minute),
        format_minute(clash.end_minute)
    )
}

impl SessionGateway for LocalSessionStore {
    fn create(&self, request: NewSession) -> SchedulingResult<SessionBlock> {
        request.validate()?;
        let db = self.lock()?;
        let conn = db.connection();

        if let Some(clash) = find_overlap(
            conn,
            request.date,
            request.start_minute,
            request.end_minute,
            None,
        )
        .map_err(SchedulingError::network)?
        {
            return Err(SchedulingError::Conflict {
                reason: clash_reason(&clash),
            });
        }

        let mut block = request.into_block(0);
        block.id = insert(conn, &block).map_err(SchedulingError::network)?;
        log::info!(
            "Created session {} on {} at {}",
            block.id,
            block.date,
            format_minute(block.start_minute)
        );
        Ok(block)
    }

    fn update(&self, id: SessionId, patch: SessionPatch) -> SchedulingResult<SessionBlock> {
        let db = self.lock()?;
        let conn = db.connection();

        let existing = find(conn, id)
            .map_err(SchedulingError::network)?
            .ok_or_else(|| SchedulingError::Network(format!("Session {} not found", id)))?;
        let next = existing.patched(&patch)?;

        if next.status.occupies_slot() {
            if let Some(clash) =
                find_overlap(conn, next.date, next.start_minute, next.end_minute, Some(id))
                    .map_err(SchedulingError::network)?
            {
                return Err(SchedulingError::Conflict {
                    reason: clash_reason(&clash),
                });
            }
        }

        save(conn, &next).map_err(SchedulingError::network)?;
        log::debug!("Updated session {}", id);
        Ok(next)
    }

    fn delete(&self, id: SessionId) -> SchedulingResult<()> {
        let db = self.lock()?;
        let removed = db
            .connection()
            .execute("DELETE FROM sessions WHERE id = ?1", [id])
            .context("Failed to delete session")
            .map_err(SchedulingError::network)?;
        if removed == 0 {
            return Err(SchedulingError::Network(format!("Session {} not found", id)));
        }
        log::info!("Deleted session {}", id);
        Ok(())
    }

    fn preview(&self, spec: &ScheduleSpec, times: &SlotTimes) -> SchedulingResult<Vec<SessionBlock>> {
        let db = self.lock()?;
        let conn = db.connection();

        let outcome = self.sequencer.generate_with(spec, times, |block| {
            match find_overlap(conn, block.date, block.start_minute, block.end_minute, None) {
                Ok(None) => SlotVerdict::Available,
                Ok(Some(clash)) => SlotVerdict::Unavailable {
                    reason: clash_reason(&clash),
                },
                Err(err) => {
                    log::warn!("Availability check failed for {}: {:#}", block.date, err);
                    SlotVerdict::Unavailable {
                        reason: err.to_string(),
                    }
                }
            }
        })?;

        Ok(outcome.blocks)
    }

    fn check_availability(
        &self,
        patterns: &[RecurrencePattern],
        package_id: i64,
        from: NaiveDate,
    ) -> SchedulingResult<Vec<AvailabilitySlot>> {
        if patterns.is_empty() {
            return Err(SchedulingError::Validation(
                "At least one recurrence pattern is required".to_string(),
            ));
        }
        if self.grid.slot_minutes == 0 {
            return Err(SchedulingError::Validation(
                "Availability slots must be at least one minute".to_string(),
            ));
        }

        let dates: Vec<NaiveDate> = (0..(self.grid.weeks_ahead * 7) as i64)
            .map(|offset| from + Duration::days(offset))
            .filter(|date| patterns.iter().any(|p| p.contains(weekday_index(*date))))
            .collect();
        log::debug!(
            "Checking availability for package {} across {} dates",
            package_id,
            dates.len()
        );

        let db = self.lock()?;
        let conn = db.connection();
        let mut slots = Vec::new();
        let mut start = self.grid.start_minute;
        while start + self.grid.slot_minutes <= self.grid.end_minute {
            let end = start + self.grid.slot_minutes;
            let mut verdict = AvailabilitySlot::open(start, end);
            for date in &dates {
                if let Some(clash) = find_overlap(conn, *date, start, end, None)
                    .map_err(SchedulingError::network)?
                {
                    verdict = AvailabilitySlot::taken(start, end, clash_reason(&clash));
                    break;
                }
            }
            slots.push(verdict);
            start = end;
        }
        Ok(slots)
    }

    fn list_range(&self, from: NaiveDate, to: NaiveDate) -> SchedulingResult<Vec<SessionBlock>> {
        let db = self.lock()?;
        list_between(db.connection(), from, to).map_err(SchedulingError::network)
    }
}
