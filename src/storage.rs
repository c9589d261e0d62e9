//! SQLite storage for glucose readings

use chrono::{Duration, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::reading::{GlucoseReading, ReadingType};

/// Sub-second digits are written only when present, so stored text still
/// sorts chronologically for the range queries
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Reading as stored, with database id and note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: i64,
    pub reading: GlucoseReading,
    pub note: Option<String>,
}

/// SQLite database for storing readings
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Create or open a database at the given path (":memory:" for in-memory)
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY,
                value REAL NOT NULL,
                reading_type TEXT NOT NULL,
                measured_at TEXT NOT NULL UNIQUE,
                note TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_readings_measured_at
                ON readings(measured_at);"
        )?;

        Ok(Self { conn })
    }

    /// Insert a reading, ignoring duplicates based on timestamp
    pub fn insert_reading(&self, reading: &GlucoseReading) -> Result<Option<i64>> {
        let result = self.conn.execute(
            "INSERT OR IGNORE INTO readings (value, reading_type, measured_at)
             VALUES (?1, ?2, ?3)",
            params![
                reading.value,
                reading.reading_type.as_str(),
                reading.measured_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;

        if result > 0 {
            Ok(Some(self.conn.last_insert_rowid()))
        } else {
            Ok(None) // Duplicate, not inserted
        }
    }

    /// Bulk import readings, returns count of new entries
    pub fn import_readings(&self, readings: &[GlucoseReading]) -> Result<usize> {
        let mut count = 0;
        for reading in readings {
            if self.insert_reading(reading)?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Update note for a reading by database ID, returns rows changed
    pub fn update_note(&self, id: i64, note: &str) -> Result<usize> {
        self.conn.execute(
            "UPDATE readings SET note = ?1 WHERE id = ?2",
            params![note, id],
        )
    }

    /// Readings measured between `start` and `end` (inclusive), oldest first
    pub fn get_readings_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<StoredReading>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, value, reading_type, measured_at, note
             FROM readings
             WHERE measured_at BETWEEN ?1 AND ?2
             ORDER BY measured_at"
        )?;

        let readings = stmt.query_map(
            params![
                start.format(TIMESTAMP_FORMAT).to_string(),
                end.format(TIMESTAMP_FORMAT).to_string(),
            ],
            |row| Self::row_to_stored_reading(row),
        )?.collect::<Result<Vec<_>>>()?;

        Ok(readings)
    }

    /// Readings from the `days_back` days before `now`, ready for analysis
    pub fn readings_since(
        &self,
        now: NaiveDateTime,
        days_back: u32,
    ) -> Result<Vec<GlucoseReading>> {
        Ok(self
            .stored_since(now, days_back)?
            .into_iter()
            .map(|stored| stored.reading)
            .collect())
    }

    /// Stored readings from the `days_back` days before `now`, with ids and notes
    pub fn stored_since(&self, now: NaiveDateTime, days_back: u32) -> Result<Vec<StoredReading>> {
        let start = now - Duration::days(i64::from(days_back));
        self.get_readings_in_range(start, now)
    }

    /// Get all readings
    pub fn get_all_readings(&self) -> Result<Vec<StoredReading>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, value, reading_type, measured_at, note
             FROM readings ORDER BY measured_at"
        )?;

        let readings = stmt.query_map([], |row| Self::row_to_stored_reading(row))?
            .collect::<Result<Vec<_>>>()?;

        Ok(readings)
    }

    /// Get total reading count
    pub fn count(&self) -> Result<i64> {
        self.conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))
    }

    fn row_to_stored_reading(row: &rusqlite::Row) -> Result<StoredReading> {
        let reading_type: String = row.get(2)?;
        let reading_type = reading_type
            .parse::<ReadingType>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        let measured_at: String = row.get(3)?;
        let measured_at = NaiveDateTime::parse_from_str(&measured_at, TIMESTAMP_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(StoredReading {
            id: row.get(0)?,
            reading: GlucoseReading {
                value: row.get(1)?,
                reading_type,
                measured_at,
            },
            note: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_import_skips_duplicates() {
        let storage = Storage::new(":memory:").unwrap();
        let readings = vec![
            GlucoseReading::new(98.0, ReadingType::Fasting, at(1, 7)),
            GlucoseReading::new(165.0, ReadingType::PostMeal, at(1, 13)),
        ];

        assert_eq!(storage.import_readings(&readings).unwrap(), 2);
        assert_eq!(storage.import_readings(&readings).unwrap(), 0);
        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_readings_round_trip() {
        let storage = Storage::new(":memory:").unwrap();
        let reading = GlucoseReading::new(142.5, ReadingType::BeforeMeal, at(3, 18));
        let id = storage.insert_reading(&reading).unwrap().unwrap();
        storage.update_note(id, "pasta dinner").unwrap();

        let all = storage.get_all_readings().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reading, reading);
        assert_eq!(all[0].note.as_deref(), Some("pasta dinner"));
        assert_eq!(storage.update_note(id + 1, "missing").unwrap(), 0);
    }

    #[test]
    fn test_sub_second_timestamps() {
        let storage = Storage::new(":memory:").unwrap();
        let first = at(4, 8) + Duration::milliseconds(250);
        let second = at(4, 8) + Duration::milliseconds(750);
        let readings = vec![
            GlucoseReading::new(101.0, ReadingType::Random, at(4, 8)),
            GlucoseReading::new(102.0, ReadingType::Random, first),
            GlucoseReading::new(103.0, ReadingType::Random, second),
        ];

        assert_eq!(storage.import_readings(&readings).unwrap(), 3);

        let all = storage.get_all_readings().unwrap();
        let stored: Vec<GlucoseReading> = all.into_iter().map(|s| s.reading).collect();
        assert_eq!(stored, readings);

        // a window ending on the whole second leaves out the later fractions
        let window = storage.get_readings_in_range(at(4, 0), at(4, 8)).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].reading.value, 101.0);
    }

    #[test]
    fn test_readings_since_window() {
        let storage = Storage::new(":memory:").unwrap();
        let readings: Vec<_> = (1..=10)
            .map(|day| GlucoseReading::new(100.0 + day as f64, ReadingType::Random, at(day, 9)))
            .collect();
        storage.import_readings(&readings).unwrap();

        let recent = storage.readings_since(at(10, 12), 3).unwrap();
        let values: Vec<f64> = recent.iter().map(|r| r.value).collect();
        // window starts 2024-06-07 12:30, so the 07 09:30 reading is excluded
        assert_eq!(values, vec![108.0, 109.0, 110.0]);
    }

    #[test]
    fn test_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.db");
        {
            let storage = Storage::new(&path).unwrap();
            storage
                .insert_reading(&GlucoseReading::new(90.0, ReadingType::Fasting, at(2, 6)))
                .unwrap();
        }
        assert_eq!(Storage::new(&path).unwrap().count().unwrap(), 1);
    }
}
