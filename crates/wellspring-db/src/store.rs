use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;
use wellspring_common::{Error, Result};

use crate::models::{
    ActivityEvent, Challenge, DashboardStats, MealLog, Memory, NewMealLog, ProfileUpdate, User,
    UserChallenge, WorkoutLog,
};

/// Persistent storage for users, logs, memories, challenges, and the
/// activity stream. One connection per store; callers serialize access.
pub struct WellnessStore {
    conn: Connection,
}

impl WellnessStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(dir) = db_path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::Database(format!("failed to create data dir: {e}")))?;
        }

        info!("opening wellness store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT,
                    email TEXT UNIQUE,
                    password_hash TEXT,
                    age INTEGER,
                    gender TEXT,
                    height_cm REAL,
                    weight_kg REAL,
                    fitness_goal TEXT,
                    activity_level TEXT,
                    dietary_preferences TEXT,
                    mental_health_background TEXT,
                    daily_schedule TEXT,
                    medical_conditions TEXT
                );

                CREATE TABLE IF NOT EXISTS mental_health_memories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    tags TEXT,
                    summary TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS workout_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    date TEXT NOT NULL,
                    routine TEXT NOT NULL,
                    calories_burned REAL
                );

                CREATE TABLE IF NOT EXISTS meal_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    date TEXT NOT NULL,
                    description TEXT,
                    image_path TEXT,
                    calories_est REAL,
                    macros_json TEXT
                );

                CREATE TABLE IF NOT EXISTS challenges (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    description TEXT,
                    goal_type TEXT,
                    difficulty TEXT,
                    duration_days INTEGER
                );

                CREATE TABLE IF NOT EXISTS user_challenges (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    challenge_id INTEGER NOT NULL REFERENCES challenges(id),
                    status TEXT NOT NULL DEFAULT 'active',
                    progress INTEGER NOT NULL DEFAULT 0,
                    started_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS activity_stream (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    created_at TEXT NOT NULL,
                    type TEXT NOT NULL,
                    payload TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_meal_logs_user
                    ON meal_logs(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_workout_logs_user
                    ON workout_logs(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_activity_user
                    ON activity_stream(user_id, created_at);",
            )
            .map_err(|e| Error::Database(format!("migration failed: {e}")))?;

        // Idempotent column additions for databases created before these
        // columns existed.
        let columns = [
            ("users", "profile_photo_path", "TEXT"),
            ("users", "avatar_choice", "TEXT"),
            ("meal_logs", "meal_name", "TEXT"),
        ];
        for (table, col, col_type) in &columns {
            let sql = format!("ALTER TABLE {table} ADD COLUMN {col} {col_type}");
            if let Err(e) = self.conn.execute(&sql, []) {
                let msg = e.to_string();
                if !msg.contains("duplicate column") {
                    return Err(Error::Database(format!("migration failed: {e}")));
                }
            }
        }

        Ok(())
    }

    // --- Users ---

    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO users (name, email, password_hash) VALUES (?1, ?2, ?3)",
                params![name, email, password_hash],
            )
            .map_err(|e| Error::Database(format!("failed to create user: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                map_user_row,
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to load user: {e}")))
    }

    pub fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![user_id],
                map_user_row,
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to load user: {e}")))
    }

    /// Apply a partial profile update; fields left as `None` are untouched.
    pub fn update_user_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<()> {
        let mut assignments: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! push_field {
            ($field:ident) => {
                if let Some(v) = &update.$field {
                    assignments.push(format!("{} = ?{}", stringify!($field), values.len() + 1));
                    values.push(Box::new(v.clone()));
                }
            };
        }

        push_field!(name);
        push_field!(age);
        push_field!(gender);
        push_field!(height_cm);
        push_field!(weight_kg);
        push_field!(fitness_goal);
        push_field!(activity_level);
        push_field!(dietary_preferences);
        push_field!(mental_health_background);
        push_field!(daily_schedule);
        push_field!(medical_conditions);

        if assignments.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len() + 1
        );
        values.push(Box::new(user_id));

        self.conn
            .execute(&sql, rusqlite::params_from_iter(values.iter()))
            .map_err(|e| Error::Database(format!("failed to update profile: {e}")))?;
        Ok(())
    }

    pub fn upsert_profile_media(
        &self,
        user_id: i64,
        photo_path: Option<&str>,
        avatar_choice: Option<&str>,
    ) -> Result<()> {
        if photo_path.is_none() && avatar_choice.is_none() {
            return Ok(());
        }
        self.conn
            .execute(
                "UPDATE users SET
                    profile_photo_path = COALESCE(?1, profile_photo_path),
                    avatar_choice = COALESCE(?2, avatar_choice)
                 WHERE id = ?3",
                params![photo_path, avatar_choice, user_id],
            )
            .map_err(|e| Error::Database(format!("failed to update profile media: {e}")))?;
        Ok(())
    }

    // --- Meal logs ---

    pub fn insert_meal_log(&self, log: &NewMealLog) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO meal_logs
                    (user_id, date, meal_name, description, image_path, calories_est, macros_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    log.user_id,
                    log.date,
                    log.meal_name,
                    log.description,
                    log.image_path,
                    log.calories_est,
                    log.macros_json,
                ],
            )
            .map_err(|e| Error::Database(format!("failed to insert meal log: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_meal_logs(&self, user_id: i64, limit: usize) -> Result<Vec<MealLog>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, date, meal_name, description, image_path,
                        calories_est, macros_json
                 FROM meal_logs
                 WHERE user_id = ?1
                 ORDER BY date DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(format!("failed to prepare meal query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(MealLog {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    date: row.get(2)?,
                    meal_name: row.get(3)?,
                    description: row.get(4)?,
                    image_path: row.get(5)?,
                    calories_est: row.get(6)?,
                    macros_json: row.get(7)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to list meal logs: {e}")))?;

        collect_rows(rows)
    }

    // --- Workout logs ---

    pub fn insert_workout_log(
        &self,
        user_id: i64,
        date: &str,
        routine: &str,
        calories_burned: Option<f64>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO workout_logs (user_id, date, routine, calories_burned)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, date, routine, calories_burned],
            )
            .map_err(|e| Error::Database(format!("failed to insert workout log: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_workout_logs(&self, user_id: i64, limit: usize) -> Result<Vec<WorkoutLog>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, date, routine, calories_burned
                 FROM workout_logs
                 WHERE user_id = ?1
                 ORDER BY date DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(format!("failed to prepare workout query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(WorkoutLog {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    date: row.get(2)?,
                    routine: row.get(3)?,
                    calories_burned: row.get(4)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to list workout logs: {e}")))?;

        collect_rows(rows)
    }

    // --- Mental health memories ---

    pub fn insert_memory(&self, user_id: i64, summary: &str, tags: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO mental_health_memories (user_id, tags, summary, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, tags, summary, now_rfc3339()],
            )
            .map_err(|e| Error::Database(format!("failed to insert memory: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_memories(&self, user_id: i64, limit: usize) -> Result<Vec<Memory>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, tags, summary, created_at
                 FROM mental_health_memories
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(format!("failed to prepare memory query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(Memory {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    tags: row.get(2)?,
                    summary: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to list memories: {e}")))?;

        collect_rows(rows)
    }

    // --- Activity stream ---

    /// Append one event to the activity stream. Events are never mutated.
    pub fn log_activity(
        &self,
        user_id: i64,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO activity_stream (user_id, created_at, type, payload)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, now_rfc3339(), kind, payload.to_string()],
            )
            .map_err(|e| Error::Database(format!("failed to log activity: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_activity(&self, user_id: i64, limit: usize) -> Result<Vec<ActivityEvent>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, created_at, type, payload
                 FROM activity_stream
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(format!("failed to prepare activity query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                let payload_raw: String = row.get(4)?;
                Ok(ActivityEvent {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    created_at: row.get(2)?,
                    kind: row.get(3)?,
                    payload: serde_json::from_str(&payload_raw)
                        .unwrap_or(serde_json::Value::Null),
                })
            })
            .map_err(|e| Error::Database(format!("failed to list activity: {e}")))?;

        collect_rows(rows)
    }

    // --- Challenges ---

    pub fn create_challenge(
        &self,
        title: &str,
        description: &str,
        goal_type: &str,
        difficulty: &str,
        duration_days: i64,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO challenges (title, description, goal_type, difficulty, duration_days)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![title, description, goal_type, difficulty, duration_days],
            )
            .map_err(|e| Error::Database(format!("failed to create challenge: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_relevant_challenges(
        &self,
        goal_type: Option<&str>,
        difficulty: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Challenge>> {
        let mut sql = String::from(
            "SELECT id, title, description, goal_type, difficulty, duration_days
             FROM challenges WHERE 1=1",
        );
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(goal) = goal_type {
            values.push(Box::new(goal.to_string()));
            sql.push_str(&format!(" AND goal_type = ?{}", values.len()));
        }
        if let Some(diff) = difficulty {
            values.push(Box::new(diff.to_string()));
            sql.push_str(&format!(" AND difficulty = ?{}", values.len()));
        }
        values.push(Box::new(limit as i64));
        sql.push_str(&format!(" ORDER BY id DESC LIMIT ?{}", values.len()));

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| Error::Database(format!("failed to prepare challenge query: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                Ok(Challenge {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    goal_type: row.get(3)?,
                    difficulty: row.get(4)?,
                    duration_days: row.get(5)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to list challenges: {e}")))?;

        collect_rows(rows)
    }

    /// Join a challenge: status starts 'active' with progress 0.
    pub fn join_challenge(&self, user_id: i64, challenge_id: i64) -> Result<i64> {
        let now = now_rfc3339();
        self.conn
            .execute(
                "INSERT INTO user_challenges
                    (user_id, challenge_id, status, progress, started_at, updated_at)
                 VALUES (?1, ?2, 'active', 0, ?3, ?4)",
                params![user_id, challenge_id, now, now],
            )
            .map_err(|e| Error::Database(format!("failed to join challenge: {e}")))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update progress; the terminal statuses 'completed' and 'dropped' are
    /// only ever set here, by explicit caller action.
    pub fn update_challenge_progress(
        &self,
        user_id: i64,
        challenge_id: i64,
        progress: i64,
        status: Option<&str>,
    ) -> Result<()> {
        let now = now_rfc3339();
        let changed = match status {
            Some(status) => self
                .conn
                .execute(
                    "UPDATE user_challenges
                     SET progress = ?1, status = ?2, updated_at = ?3
                     WHERE user_id = ?4 AND challenge_id = ?5",
                    params![progress, status, now, user_id, challenge_id],
                )
                .map_err(|e| Error::Database(format!("failed to update challenge: {e}")))?,
            None => self
                .conn
                .execute(
                    "UPDATE user_challenges
                     SET progress = ?1, updated_at = ?2
                     WHERE user_id = ?3 AND challenge_id = ?4",
                    params![progress, now, user_id, challenge_id],
                )
                .map_err(|e| Error::Database(format!("failed to update challenge: {e}")))?,
        };
        if changed == 0 {
            return Err(Error::Database(format!(
                "user {user_id} has not joined challenge {challenge_id}"
            )));
        }
        Ok(())
    }

    pub fn list_user_challenges(&self, user_id: i64) -> Result<Vec<UserChallenge>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT uc.id, uc.user_id, uc.challenge_id, uc.status, uc.progress,
                        uc.started_at, uc.updated_at, c.title, c.description
                 FROM user_challenges uc
                 JOIN challenges c ON uc.challenge_id = c.id
                 WHERE uc.user_id = ?1
                 ORDER BY uc.updated_at DESC",
            )
            .map_err(|e| Error::Database(format!("failed to prepare join query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(UserChallenge {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    challenge_id: row.get(2)?,
                    status: row.get(3)?,
                    progress: row.get(4)?,
                    started_at: row.get(5)?,
                    updated_at: row.get(6)?,
                    title: row.get(7)?,
                    description: row.get(8)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to list user challenges: {e}")))?;

        collect_rows(rows)
    }

    /// Seed the starter challenge catalog if the table is empty.
    pub fn ensure_default_challenges(&self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM challenges", [], |row| row.get(0))
            .map_err(|e| Error::Database(format!("failed to count challenges: {e}")))?;
        if count > 0 {
            return Ok(());
        }

        let defaults = [
            ("7-Day Step Boost", "Hit 8,000 steps daily for a week.", "weight_loss", "beginner", 7),
            ("Core Strength Sprint", "10-minute core routine daily.", "muscle_gain", "beginner", 14),
            ("Mindful Mornings", "5 minutes of morning meditation.", "mental_health", "beginner", 10),
            ("Protein Focus", "Hit your protein goal each day.", "muscle_gain", "intermediate", 14),
            ("Sugar-Lite Week", "Limit added sugars for 7 days.", "weight_loss", "beginner", 7),
        ];
        for (title, description, goal_type, difficulty, duration) in defaults {
            self.create_challenge(title, description, goal_type, difficulty, duration)?;
        }
        info!("seeded {} default challenges", defaults.len());
        Ok(())
    }

    // --- Aggregation ---

    /// Totals and today's counts for the report branch and dashboard.
    pub fn dashboard_stats(&self, user_id: i64, today: &str) -> Result<DashboardStats> {
        let count = |sql: &str, with_today: bool| -> Result<i64> {
            let result = if with_today {
                self.conn
                    .query_row(sql, params![user_id, today], |row| row.get(0))
            } else {
                self.conn.query_row(sql, params![user_id], |row| row.get(0))
            };
            result.map_err(|e| Error::Database(format!("failed to aggregate stats: {e}")))
        };

        let total_meals = count("SELECT COUNT(*) FROM meal_logs WHERE user_id = ?1", false)?;
        let total_workouts = count(
            "SELECT COUNT(*) FROM workout_logs WHERE user_id = ?1",
            false,
        )?;
        let meals_today = count(
            "SELECT COUNT(*) FROM meal_logs WHERE user_id = ?1 AND date >= ?2",
            true,
        )?;
        let workouts_today = count(
            "SELECT COUNT(*) FROM workout_logs WHERE user_id = ?1 AND date >= ?2",
            true,
        )?;
        let memory_count = count(
            "SELECT COUNT(*) FROM mental_health_memories WHERE user_id = ?1",
            false,
        )?;

        let last_meal_name: Option<String> = self
            .conn
            .query_row(
                "SELECT meal_name FROM meal_logs WHERE user_id = ?1
                 ORDER BY date DESC, id DESC LIMIT 1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to load last meal: {e}")))?
            .flatten();

        let last_workout_routine: Option<String> = self
            .conn
            .query_row(
                "SELECT routine FROM workout_logs WHERE user_id = ?1
                 ORDER BY date DESC, id DESC LIMIT 1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to load last workout: {e}")))?;

        Ok(DashboardStats {
            total_meals,
            total_workouts,
            meals_today,
            workouts_today,
            memory_count,
            last_meal_name,
            last_workout_routine,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, age, gender, height_cm, weight_kg, \
     fitness_goal, activity_level, dietary_preferences, mental_health_background, \
     daily_schedule, medical_conditions, profile_photo_path, avatar_choice";

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        email: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        password_hash: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        age: row.get(4)?,
        gender: row.get(5)?,
        height_cm: row.get(6)?,
        weight_kg: row.get(7)?,
        fitness_goal: row.get(8)?,
        activity_level: row.get(9)?,
        dietary_preferences: row.get(10)?,
        mental_health_background: row.get(11)?,
        daily_schedule: row.get(12)?,
        medical_conditions: row.get(13)?,
        profile_photo_path: row.get(14)?,
        avatar_choice: row.get(15)?,
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Error::Database(format!("failed to read row: {e}")))?);
    }
    Ok(out)
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
