use chrono::NaiveDate;
use sqlx::MySqlPool;

use super::{ApprovalQuery, AttendanceStore};
use crate::model::approval::{ApprovalRecord, ApprovalStatus, NewApproval};
use crate::model::attendance::{AttendanceLog, NewPunch, PunchFlag, PunchKind};
use crate::model::branch::Branch;
use crate::model::employee::{Employee, normalize_emp_no};
use crate::model::kiosk_session::{KioskSession, KioskSessionRow};
use crate::model::shift_rule::ShiftRule;
use crate::utils::time::DateBounds;

const BRANCH_COLUMNS: &str = "id, code, name, address, lat, lng, radius_meters, is_active";

const EMPLOYEE_COLUMNS: &str = "id, emp_no, name, role, grade, branch_id, salary_override, is_active, \
     gender, birth_date, religion, education, marital_status, address, national_id";

const SHIFT_RULE_COLUMNS: &str = "id, branch_id, code, name, window_start, window_end, work_start, \
     late_tolerance_minutes, daily_rate, late_penalty_per_minute, absence_penalty, is_active";

const LOG_COLUMNS: &str = "id, employee_id, branch_id, date, punched_at, kind, shift_code, mode, \
     lat, lng, distance_meters, late_minutes, flags, final_status, photo, note, status";

const APPROVAL_COLUMNS: &str = "id, employee_id, date, kind, reason, evidence_photo, check_in, \
     check_out, distance_meters, radius_meters, status, created_at";

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Date(NaiveDate),
    Str(&'a str),
}

fn date_clauses<'a>(column: &str, bounds: DateBounds, where_sql: &mut String, args: &mut Vec<FilterValue<'a>>) {
    if let Some(from) = bounds.from {
        where_sql.push_str(&format!(" AND {column} >= ?"));
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = bounds.to {
        where_sql.push_str(&format!(" AND {column} <= ?"));
        args.push(FilterValue::Date(to));
    }
}

/// JSON array for the `flags` column; no flags is NULL.
pub(crate) fn encode_flags(flags: &[PunchFlag]) -> Result<Option<String>, sqlx::Error> {
    if flags.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(flags)
        .map(Some)
        .map_err(|e| sqlx::Error::Protocol(format!("cannot encode punch flags: {e}")))
}

/// `attendance_logs`, `approvals` and the master tables on a MySQL pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn employee(&self, id: u64) -> Result<Option<Employee>, sqlx::Error> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn branch(&self, id: u64) -> Result<Option<Branch>, sqlx::Error> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE id = ?");
        sqlx::query_as::<_, Branch>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

impl AttendanceStore for MySqlStore {
    async fn branches(&self) -> Result<Vec<Branch>, sqlx::Error> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches ORDER BY name");
        sqlx::query_as::<_, Branch>(&sql).fetch_all(&self.pool).await
    }

    async fn employees(&self, branch_id: Option<u64>) -> Result<Vec<Employee>, sqlx::Error> {
        let mut sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE is_active = TRUE");
        if branch_id.is_some() {
            sql.push_str(" AND branch_id = ?");
        }
        sql.push_str(" ORDER BY name");

        let mut q = sqlx::query_as::<_, Employee>(&sql);
        if let Some(id) = branch_id {
            q = q.bind(id);
        }

        let mut employees = q.fetch_all(&self.pool).await?;
        for e in &mut employees {
            e.emp_no = normalize_emp_no(&e.emp_no);
        }
        Ok(employees)
    }

    async fn shift_rules(&self, branch_id: Option<u64>) -> Result<Vec<ShiftRule>, sqlx::Error> {
        let mut sql = format!("SELECT {SHIFT_RULE_COLUMNS} FROM shift_rules WHERE 1=1");
        if branch_id.is_some() {
            sql.push_str(" AND branch_id = ?");
        }
        sql.push_str(" ORDER BY branch_id, id");

        let mut q = sqlx::query_as::<_, ShiftRule>(&sql);
        if let Some(id) = branch_id {
            q = q.bind(id);
        }
        q.fetch_all(&self.pool).await
    }

    async fn attendance_logs(
        &self,
        bounds: DateBounds,
        branch_id: Option<u64>,
    ) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        date_clauses("date", bounds, &mut where_sql, &mut args);
        if let Some(id) = branch_id {
            where_sql.push_str(" AND branch_id = ?");
            args.push(FilterValue::U64(id));
        }

        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM attendance_logs{where_sql} ORDER BY date, employee_id, punched_at"
        );

        let mut q = sqlx::query_as::<_, AttendanceLog>(&sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Date(d) => q.bind(d),
                FilterValue::Str(s) => q.bind(s),
            };
        }
        q.fetch_all(&self.pool).await
    }

    async fn approvals(&self, bounds: DateBounds) -> Result<Vec<ApprovalRecord>, sqlx::Error> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();
        date_clauses("date", bounds, &mut where_sql, &mut args);

        // oldest first so the first approval of each type wins in the merge
        let sql = format!("SELECT {APPROVAL_COLUMNS} FROM approvals{where_sql} ORDER BY created_at, id");

        let mut q = sqlx::query_as::<_, ApprovalRecord>(&sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Date(d) => q.bind(d),
                FilterValue::Str(s) => q.bind(s),
            };
        }
        q.fetch_all(&self.pool).await
    }

    async fn list_approvals(
        &self,
        query: &ApprovalQuery,
    ) -> Result<(Vec<ApprovalRecord>, i64), sqlx::Error> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }
        if let Some(branch_id) = query.branch_id {
            where_sql.push_str(" AND employee_id IN (SELECT id FROM employees WHERE branch_id = ?)");
            args.push(FilterValue::U64(branch_id));
        }
        if let Some(status) = &query.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_ref()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM approvals{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Date(d) => count_q.bind(*d),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {APPROVAL_COLUMNS} FROM approvals{where_sql} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, ApprovalRecord>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Date(d) => data_q.bind(d),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let rows = data_q
            .bind(query.per_page)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn kiosk_session(&self, token: &str) -> Result<Option<KioskSession>, sqlx::Error> {
        let row = sqlx::query_as::<_, KioskSessionRow>(
            "SELECT id, token, branch_id, employee_id, expires_at FROM kiosk_sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (Some(mut employee), Some(branch)) =
            (self.employee(row.employee_id).await?, self.branch(row.branch_id).await?)
        else {
            tracing::warn!(
                session_id = row.id,
                employee_id = row.employee_id,
                branch_id = row.branch_id,
                "Kiosk session points at a missing employee or branch"
            );
            return Ok(None);
        };
        employee.emp_no = normalize_emp_no(&employee.emp_no);

        Ok(Some(KioskSession {
            id: row.id,
            token: row.token,
            expires_at: row.expires_at,
            branch,
            employee,
        }))
    }

    async fn punch_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
        kind: PunchKind,
    ) -> Result<Option<AttendanceLog>, sqlx::Error> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM attendance_logs \
             WHERE employee_id = ? AND date = ? AND kind = ? \
             ORDER BY punched_at LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceLog>(&sql)
            .bind(employee_id)
            .bind(date)
            .bind(kind.as_ref())
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_punch(&self, punch: &NewPunch) -> Result<u64, sqlx::Error> {
        let flags = encode_flags(&punch.flags)?;

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_logs
            (employee_id, branch_id, date, punched_at, kind, shift_code, mode,
             lat, lng, distance_meters, late_minutes, flags, final_status, photo, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(punch.employee_id)
        .bind(punch.branch_id)
        .bind(punch.date)
        .bind(punch.punched_at)
        .bind(punch.kind.as_ref())
        .bind(punch.shift_code.as_deref())
        .bind(punch.mode.as_ref())
        .bind(punch.lat)
        .bind(punch.lng)
        .bind(punch.distance_meters)
        .bind(punch.late_minutes)
        .bind(flags)
        .bind(punch.final_status.as_ref())
        .bind(punch.photo.as_deref())
        .bind(punch.note.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn approval_branch(&self, id: u64) -> Result<Option<u64>, sqlx::Error> {
        sqlx::query_scalar::<_, u64>(
            r#"
            SELECT e.branch_id
            FROM approvals a
            JOIN employees e ON e.id = a.employee_id
            WHERE a.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_approval(&self, approval: &NewApproval) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO approvals
            (employee_id, date, kind, reason, check_in, check_out, distance_meters, radius_meters, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(approval.employee_id)
        .bind(approval.date)
        .bind(approval.kind.as_ref())
        .bind(approval.reason.as_deref())
        .bind(approval.check_in)
        .bind(approval.check_out)
        .bind(approval.distance_meters)
        .bind(approval.radius_meters)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn decide_approval(&self, id: u64, status: ApprovalStatus) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE approvals
            SET status = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(status.as_ref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
