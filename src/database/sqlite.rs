use crate::errors::{AppError, Result};
use crate::models::appointment::{Appointment, AppointmentStats, AppointmentStatus};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn new(database_path: &str) -> Result<Self> {
        // Ensure the directory exists
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::PersistenceError(format!("Failed to create database directory: {}", e))
            })?;
        }

        // Create the database file if it doesn't exist
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path).map_err(|e| {
                AppError::PersistenceError(format!("Failed to create database file: {}", e))
            })?;
            tracing::info!(path = %database_path, "created new database file");
        }
        let database_url = format!("sqlite:{}", database_path);

        let pool = SqlitePool::connect(&database_url).await.map_err(|e| {
            AppError::PersistenceError(format!("Failed to connect to database: {}", e))
        })?;

        let db = Self { pool };
        db.create_tables().await?;

        tracing::info!(path = %database_path, "connected to SQLite database");
        Ok(db)
    }

    /// In-memory database for tests. A single pooled connection, since every
    /// `sqlite::memory:` connection is its own separate database.
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::PersistenceError(format!("Failed to open in-memory database: {}", e))
            })?;
        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                service_type TEXT NOT NULL,
                preferred_date TEXT NOT NULL,
                preferred_time TEXT NOT NULL,
                message TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                admin_notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_appointments_email ON appointments (email);
            CREATE INDEX IF NOT EXISTS idx_appointments_created_at ON appointments (created_at);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::PersistenceError(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    pub async fn store_appointment(&self, appointment: &Appointment) -> Result<()> {
        let query = r#"
            INSERT INTO appointments (
                id, name, email, phone, service_type, preferred_date,
                preferred_time, message, status, admin_notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(appointment.id.to_string())
            .bind(&appointment.name)
            .bind(&appointment.email)
            .bind(&appointment.phone)
            .bind(&appointment.service_type)
            .bind(&appointment.preferred_date)
            .bind(&appointment.preferred_time)
            .bind(&appointment.message)
            .bind(appointment.status.as_str())
            .bind(&appointment.admin_notes)
            .bind(appointment.created_at.to_rfc3339())
            .bind(appointment.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::PersistenceError(format!("Failed to store appointment: {}", e))
            })?;

        Ok(())
    }

    pub async fn list_appointments(
        &self,
        status: Option<AppointmentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Appointment>> {
        let rows = match status {
            Some(status) => {
                let query = r#"
                    SELECT id, name, email, phone, service_type, preferred_date,
                           preferred_time, message, status, admin_notes, created_at, updated_at
                    FROM appointments
                    WHERE status = ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                "#;
                sqlx::query(query)
                    .bind(status.as_str())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = r#"
                    SELECT id, name, email, phone, service_type, preferred_date,
                           preferred_time, message, status, admin_notes, created_at, updated_at
                    FROM appointments
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                "#;
                sqlx::query(query)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::PersistenceError(format!("Failed to fetch appointments: {}", e)))?;

        Ok(rows.iter().map(Self::row_to_appointment).collect())
    }

    pub async fn get_appointment(&self, id: &Uuid) -> Result<Option<Appointment>> {
        let query = r#"
            SELECT id, name, email, phone, service_type, preferred_date,
                   preferred_time, message, status, admin_notes, created_at, updated_at
            FROM appointments
            WHERE id = ?
        "#;

        let row = sqlx::query(query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::PersistenceError(format!("Failed to fetch appointment: {}", e))
            })?;

        Ok(row.as_ref().map(Self::row_to_appointment))
    }

    pub async fn update_appointment(
        &self,
        id: &Uuid,
        status: Option<AppointmentStatus>,
        admin_notes: Option<&str>,
    ) -> Result<Option<Appointment>> {
        let existing = match self.get_appointment(id).await? {
            Some(a) => a,
            None => return Ok(None),
        };

        let new_status = status.unwrap_or(existing.status);
        let new_notes = match admin_notes {
            Some(notes) => Some(notes.to_string()),
            None => existing.admin_notes.clone(),
        };
        let updated_at = Utc::now();

        let query = r#"
            UPDATE appointments
            SET status = ?, admin_notes = ?, updated_at = ?
            WHERE id = ?
        "#;

        sqlx::query(query)
            .bind(new_status.as_str())
            .bind(&new_notes)
            .bind(updated_at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::PersistenceError(format!("Failed to update appointment: {}", e))
            })?;

        self.get_appointment(id).await
    }

    pub async fn appointment_stats(&self) -> Result<AppointmentStats> {
        let query = r#"
            SELECT status, COUNT(*) as count
            FROM appointments
            GROUP BY status
        "#;

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::PersistenceError(format!("Failed to fetch appointment stats: {}", e))
            })?;

        let mut stats = AppointmentStats {
            total: 0,
            pending: 0,
            confirmed: 0,
            completed: 0,
            cancelled: 0,
        };

        for row in rows {
            let count: i64 = row.get("count");
            stats.total += count;
            match AppointmentStatus::parse(row.get::<&str, _>("status")) {
                Some(AppointmentStatus::Pending) => stats.pending = count,
                Some(AppointmentStatus::Confirmed) => stats.confirmed = count,
                Some(AppointmentStatus::Completed) => stats.completed = count,
                Some(AppointmentStatus::Cancelled) => stats.cancelled = count,
                None => {}
            }
        }

        Ok(stats)
    }

    fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Appointment {
        Appointment {
            id: Uuid::parse_str(row.get("id")).unwrap_or_default(),
            name: row.get("name"),
            email: row.get("email"),
            phone: row.get("phone"),
            service_type: row.get("service_type"),
            preferred_date: row.get("preferred_date"),
            preferred_time: row.get("preferred_time"),
            message: row.get("message"),
            status: AppointmentStatus::parse(row.get::<&str, _>("status"))
                .unwrap_or(AppointmentStatus::Pending),
            admin_notes: row.get("admin_notes"),
            created_at: DateTime::parse_from_rfc3339(row.get("created_at"))
                .unwrap_or_default()
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(row.get("updated_at"))
                .unwrap_or_default()
                .with_timezone(&Utc),
        }
    }
}
