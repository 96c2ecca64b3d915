//! Persistence contract for attendance rows.
//!
//! The session manager and the reporting aggregator only talk to
//! [`AttendanceStore`]; the MySQL implementation lives here, and the tests
//! run against an in-memory implementation with the same atomicity on
//! `insert_open`.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::model::attendance::AttendanceRecord;
use crate::timeclock::error::TimeclockError;

#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    /// Create an OPEN record, atomically guarded against an existing OPEN
    /// record for the same employee. Returns `ConcurrencyConflict` when the
    /// guard rejects the insert.
    async fn insert_open(
        &self,
        employee_id: u64,
        clock_in: DateTime<Utc>,
        clock_in_local: String,
    ) -> Result<AttendanceRecord, TimeclockError>;

    /// OPEN records for one employee, newest clock-in first. The invariant
    /// allows at most one; callers treat extras as a recoverable anomaly.
    async fn find_open(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, TimeclockError>;

    /// Close an OPEN record, writing the clock-out fields exactly once.
    async fn close(
        &self,
        id: u64,
        clock_out: DateTime<Utc>,
        clock_out_local: String,
        break_minutes: u32,
        total_work_hhmm: String,
    ) -> Result<AttendanceRecord, TimeclockError>;

    /// Records whose `[clock_in, clock_out or now)` interval intersects
    /// `[start, end)`, in clock-in order. Open records always qualify once
    /// they started before `end`.
    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, TimeclockError>;

    /// The latest record per employee, one pass for the status board.
    async fn latest_per_employee(&self) -> Result<Vec<AttendanceRecord>, TimeclockError>;

    /// Flat record listing filtered by employee and clock-in window, newest
    /// first. `None` bounds are unbounded.
    async fn find_range(
        &self,
        employee_id: Option<u64>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AttendanceRecord>, TimeclockError>;

    /// Administrative removal of one record. Returns false when the id does
    /// not exist.
    async fn delete(&self, id: u64) -> Result<bool, TimeclockError>;
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

const SELECT_COLUMNS: &str = "id, employee_id, clock_in, clock_out, clock_in_local, \
     clock_out_local, break_minutes, total_work_hhmm";

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, id: u64) -> Result<AttendanceRecord, TimeclockError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM attendance WHERE id = ?");
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }
}

impl AttendanceStore for MySqlAttendanceStore {
    async fn insert_open(
        &self,
        employee_id: u64,
        clock_in: DateTime<Utc>,
        clock_in_local: String,
    ) -> Result<AttendanceRecord, TimeclockError> {
        // Conditional insert: the NOT EXISTS subquery makes the
        // check-then-insert atomic on the database side, so two racing
        // clock-ins cannot both create an open row.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, clock_in, clock_in_local, break_minutes)
            SELECT ?, ?, ?, 0 FROM DUAL
            WHERE NOT EXISTS (
                SELECT 1 FROM attendance WHERE employee_id = ? AND clock_out IS NULL
            )
            "#,
        )
        .bind(employee_id)
        .bind(clock_in)
        .bind(&clock_in_local)
        .bind(employee_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TimeclockError::ConcurrencyConflict);
        }

        self.fetch_by_id(result.last_insert_id()).await
    }

    async fn find_open(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, TimeclockError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND clock_out IS NULL \
             ORDER BY clock_in DESC"
        );
        let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn close(
        &self,
        id: u64,
        clock_out: DateTime<Utc>,
        clock_out_local: String,
        break_minutes: u32,
        total_work_hhmm: String,
    ) -> Result<AttendanceRecord, TimeclockError> {
        // `clock_out IS NULL` keeps a closed record immutable.
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET clock_out = ?, clock_out_local = ?, break_minutes = ?, total_work_hhmm = ?
            WHERE id = ? AND clock_out IS NULL
            "#,
        )
        .bind(clock_out)
        .bind(&clock_out_local)
        .bind(break_minutes)
        .bind(&total_work_hhmm)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TimeclockError::NoOpenSession);
        }

        self.fetch_by_id(id).await
    }

    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, TimeclockError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM attendance \
             WHERE clock_in < ? AND (clock_out IS NULL OR clock_out > ?) \
             ORDER BY clock_in ASC"
        );
        let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn latest_per_employee(&self) -> Result<Vec<AttendanceRecord>, TimeclockError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM attendance a \
             WHERE a.clock_in = ( \
                 SELECT MAX(b.clock_in) FROM attendance b WHERE b.employee_id = a.employee_id \
             ) \
             ORDER BY a.employee_id ASC"
        );
        let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn find_range(
        &self,
        employee_id: Option<u64>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AttendanceRecord>, TimeclockError> {
        let mut conditions = Vec::new();
        if employee_id.is_some() {
            conditions.push("employee_id = ?");
        }
        if from.is_some() {
            conditions.push("clock_in >= ?");
        }
        if to.is_some() {
            conditions.push("clock_in <= ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM attendance {where_clause} ORDER BY clock_in DESC"
        );

        let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql);
        if let Some(id) = employee_id {
            query = query.bind(id);
        }
        if let Some(from) = from {
            query = query.bind(from);
        }
        if let Some(to) = to {
            query = query.bind(to);
        }

        let records = query.fetch_all(&self.pool).await?;
        Ok(records)
    }

    async fn delete(&self, id: u64) -> Result<bool, TimeclockError> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory store for session and aggregator tests, with the same
    //! conditional-insert atomicity as the MySQL implementation.

    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    pub struct MemoryAttendanceStore {
        inner: Arc<Mutex<Inner>>,
    }

    #[derive(Default)]
    struct Inner {
        next_id: u64,
        rows: Vec<AttendanceRecord>,
    }

    impl AttendanceStore for MemoryAttendanceStore {
        async fn insert_open(
            &self,
            employee_id: u64,
            clock_in: DateTime<Utc>,
            clock_in_local: String,
        ) -> Result<AttendanceRecord, TimeclockError> {
            let mut inner = self.inner.lock().unwrap();
            if inner
                .rows
                .iter()
                .any(|r| r.employee_id == employee_id && r.is_open())
            {
                return Err(TimeclockError::ConcurrencyConflict);
            }
            inner.next_id += 1;
            let record = AttendanceRecord {
                id: inner.next_id,
                employee_id,
                clock_in,
                clock_out: None,
                clock_in_local,
                clock_out_local: None,
                break_minutes: 0,
                total_work_hhmm: None,
            };
            inner.rows.push(record.clone());
            Ok(record)
        }

        async fn find_open(
            &self,
            employee_id: u64,
        ) -> Result<Vec<AttendanceRecord>, TimeclockError> {
            let inner = self.inner.lock().unwrap();
            let mut open: Vec<_> = inner
                .rows
                .iter()
                .filter(|r| r.employee_id == employee_id && r.is_open())
                .cloned()
                .collect();
            open.sort_by_key(|r| std::cmp::Reverse(r.clock_in));
            Ok(open)
        }

        async fn close(
            &self,
            id: u64,
            clock_out: DateTime<Utc>,
            clock_out_local: String,
            break_minutes: u32,
            total_work_hhmm: String,
        ) -> Result<AttendanceRecord, TimeclockError> {
            let mut inner = self.inner.lock().unwrap();
            let row = inner
                .rows
                .iter_mut()
                .find(|r| r.id == id && r.is_open())
                .ok_or(TimeclockError::NoOpenSession)?;
            row.clock_out = Some(clock_out);
            row.clock_out_local = Some(clock_out_local);
            row.break_minutes = break_minutes;
            row.total_work_hhmm = Some(total_work_hhmm);
            Ok(row.clone())
        }

        async fn find_overlapping(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<AttendanceRecord>, TimeclockError> {
            let inner = self.inner.lock().unwrap();
            let mut hits: Vec<_> = inner
                .rows
                .iter()
                .filter(|r| r.clock_in < end && r.clock_out.map_or(true, |out| out > start))
                .cloned()
                .collect();
            hits.sort_by_key(|r| r.clock_in);
            Ok(hits)
        }

        async fn latest_per_employee(&self) -> Result<Vec<AttendanceRecord>, TimeclockError> {
            let inner = self.inner.lock().unwrap();
            let mut latest: Vec<AttendanceRecord> = Vec::new();
            for row in &inner.rows {
                match latest.iter_mut().find(|r| r.employee_id == row.employee_id) {
                    Some(existing) if existing.clock_in < row.clock_in => *existing = row.clone(),
                    Some(_) => {}
                    None => latest.push(row.clone()),
                }
            }
            latest.sort_by_key(|r| r.employee_id);
            Ok(latest)
        }

        async fn find_range(
            &self,
            employee_id: Option<u64>,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
        ) -> Result<Vec<AttendanceRecord>, TimeclockError> {
            let inner = self.inner.lock().unwrap();
            let mut hits: Vec<_> = inner
                .rows
                .iter()
                .filter(|r| employee_id.map_or(true, |id| r.employee_id == id))
                .filter(|r| from.map_or(true, |f| r.clock_in >= f))
                .filter(|r| to.map_or(true, |t| r.clock_in <= t))
                .cloned()
                .collect();
            hits.sort_by_key(|r| std::cmp::Reverse(r.clock_in));
            Ok(hits)
        }

        async fn delete(&self, id: u64) -> Result<bool, TimeclockError> {
            let mut inner = self.inner.lock().unwrap();
            let before = inner.rows.len();
            inner.rows.retain(|r| r.id != id);
            Ok(inner.rows.len() < before)
        }
    }
}
