use crate::intake::AcceptedSubmission;
use crate::schema::{AdminIdentity, AiAnalysis, Departments, Location, Report, Role};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("report {0} not found")]
    ReportNotFound(String),
    #[error("report {0} is already classified")]
    AlreadyClassified(String),
    #[error("admin {0} not found")]
    AdminNotFound(String),
    #[error("admin {0} already exists")]
    AdminExists(String),
    #[error("invalid admin {username}: {reason}")]
    InvalidAdmin { username: String, reason: &'static str },
}

/// Source of report snapshots, newest first.
pub trait ReportStore {
    fn fetch_all_desc(&self) -> Result<Vec<Report>>;
}

impl ReportStore for Connection {
    fn fetch_all_desc(&self) -> Result<Vec<Report>> {
        fetch_reports(self)
    }
}

impl ReportStore for [Report] {
    fn fetch_all_desc(&self) -> Result<Vec<Report>> {
        let mut reports = self.to_vec();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }
}

impl ReportStore for Vec<Report> {
    fn fetch_all_desc(&self) -> Result<Vec<Report>> {
        self.as_slice().fetch_all_desc()
    }
}

pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path).with_context(|| format!("opening {db_path}"))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    init(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init(&conn)?;
    Ok(conn)
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
          id TEXT PRIMARY KEY,
          created_at TEXT NOT NULL,
          district TEXT,
          constituency TEXT,
          reporter_json TEXT NOT NULL,
          feedback_json TEXT NOT NULL,
          ai_json TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at);

        CREATE TABLE IF NOT EXISTS admins (
          username TEXT PRIMARY KEY,
          role TEXT NOT NULL,
          email TEXT,
          access_json TEXT NOT NULL,
          departments_json TEXT,
          inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );
        "#,
    )?;
    Ok(())
}

pub fn insert_report(
    conn: &Connection,
    id: &str,
    created_at: &str,
    submission: &AcceptedSubmission,
) -> Result<()> {
    let reporter_json = serde_json::to_string(&submission.reporter)?;
    let feedback_json = serde_json::to_string(&submission.feedback)?;

    conn.execute(
        r#"
        INSERT INTO reports (id, created_at, district, constituency, reporter_json, feedback_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            id,
            created_at,
            submission.location.district,
            submission.location.constituency,
            reporter_json,
            feedback_json
        ],
    )?;

    info!(report_id = id, "stored report");
    Ok(())
}

/// Attaches classifier output to a report. A report is classified once;
/// later attempts fail with [`StoreError::AlreadyClassified`].
pub fn classify(conn: &Connection, id: &str, analysis: &AiAnalysis) -> Result<()> {
    let ai_json = serde_json::to_string(analysis)?;
    let changed = conn.execute(
        "UPDATE reports SET ai_json = ?1 WHERE id = ?2 AND ai_json IS NULL",
        params![ai_json, id],
    )?;

    if changed == 0 {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM reports WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        let err = if exists {
            StoreError::AlreadyClassified(id.to_string())
        } else {
            StoreError::ReportNotFound(id.to_string())
        };
        return Err(err.into());
    }

    info!(report_id = id, "stored classification");
    Ok(())
}

pub fn fetch_reports(conn: &Connection) -> Result<Vec<Report>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, created_at, district, constituency, reporter_json, feedback_json, ai_json
        FROM reports
        ORDER BY created_at DESC, rowid DESC
        "#,
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ReportRow {
            id: row.get(0)?,
            created_at: row.get(1)?,
            district: row.get(2)?,
            constituency: row.get(3)?,
            reporter_json: row.get(4)?,
            feedback_json: row.get(5)?,
            ai_json: row.get(6)?,
        })
    })?;

    let mut reports = Vec::new();
    for r in rows {
        reports.push(r?.into_report()?);
    }
    Ok(reports)
}

#[derive(Debug)]
struct ReportRow {
    id: String,
    created_at: String,
    district: Option<String>,
    constituency: Option<String>,
    reporter_json: String,
    feedback_json: String,
    ai_json: Option<String>,
}

impl ReportRow {
    fn into_report(self) -> Result<Report> {
        let ai = match self.ai_json.as_deref() {
            Some(raw) => Some(
                serde_json::from_str(raw)
                    .with_context(|| format!("decoding classification of {}", self.id))?,
            ),
            None => None,
        };
        Ok(Report {
            location: Location {
                district: self.district,
                constituency: self.constituency,
            },
            reporter: serde_json::from_str(&self.reporter_json)
                .with_context(|| format!("decoding reporter of {}", self.id))?,
            feedback: serde_json::from_str(&self.feedback_json)
                .with_context(|| format!("decoding feedback of {}", self.id))?,
            ai,
            id: self.id,
            created_at: self.created_at,
        })
    }
}

fn validate_admin(identity: &AdminIdentity) -> Result<(), StoreError> {
    if identity.role != Role::Admin {
        return Ok(());
    }
    let invalid = |reason| StoreError::InvalidAdmin {
        username: identity.username.clone(),
        reason,
    };
    if identity.access.is_empty() {
        return Err(invalid("at least one district is required"));
    }
    if identity.departments.is_empty() {
        return Err(invalid("at least one department is required"));
    }
    Ok(())
}

/// Only new admins need an email; older records without one stay editable.
pub fn create_admin(conn: &Connection, identity: &AdminIdentity) -> Result<()> {
    validate_admin(identity)?;
    if identity.role == Role::Admin && identity.email.as_deref().is_none_or(|email| email.trim().is_empty()) {
        return Err(StoreError::InvalidAdmin {
            username: identity.username.clone(),
            reason: "an email address is required",
        }
        .into());
    }
    if get_admin(conn, &identity.username)?.is_some() {
        return Err(StoreError::AdminExists(identity.username.clone()).into());
    }

    conn.execute(
        r#"
        INSERT INTO admins (username, role, email, access_json, departments_json)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            identity.username,
            identity.role.as_str(),
            identity.email,
            serde_json::to_string(&identity.access)?,
            serde_json::to_string(&identity.departments)?
        ],
    )?;

    info!(username = %identity.username, role = %identity.role, "created admin");
    Ok(())
}

pub fn get_admin(conn: &Connection, username: &str) -> Result<Option<AdminIdentity>> {
    let row = conn
        .query_row(
            "SELECT username, role, email, access_json, departments_json FROM admins WHERE username = ?1",
            params![username],
            AdminRow::from_row,
        )
        .optional()?;
    row.map(AdminRow::into_identity).transpose()
}

pub fn list_admins(conn: &Connection, role: Option<Role>) -> Result<Vec<AdminIdentity>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT username, role, email, access_json, departments_json
        FROM admins
        WHERE ?1 IS NULL OR role = ?1
        ORDER BY username
        "#,
    )?;
    let rows = stmt.query_map(params![role.map(|r| r.as_str())], AdminRow::from_row)?;

    let mut admins = Vec::new();
    for r in rows {
        admins.push(r?.into_identity()?);
    }
    Ok(admins)
}

/// Replaces an admin's districts and departments. An empty department list
/// keeps the current assignment.
pub fn update_admin_access(
    conn: &Connection,
    username: &str,
    access: &BTreeSet<String>,
    departments: Option<&Departments>,
) -> Result<AdminIdentity> {
    let mut identity =
        get_admin(conn, username)?.ok_or_else(|| StoreError::AdminNotFound(username.to_string()))?;

    identity.access = access.clone();
    if let Some(departments) = departments.filter(|d| !d.is_empty()) {
        identity.departments = departments.clone();
    }
    validate_admin(&identity)?;

    conn.execute(
        "UPDATE admins SET access_json = ?1, departments_json = ?2 WHERE username = ?3",
        params![
            serde_json::to_string(&identity.access)?,
            serde_json::to_string(&identity.departments)?,
            username
        ],
    )?;

    info!(username, "updated admin access");
    Ok(identity)
}

pub fn delete_admin(conn: &Connection, username: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM admins WHERE username = ?1", params![username])?;
    if changed == 0 {
        return Err(StoreError::AdminNotFound(username.to_string()).into());
    }
    info!(username, "deleted admin");
    Ok(())
}

/// Distinct non-empty districts that have received reports.
pub fn known_districts(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT district FROM reports WHERE district IS NOT NULL AND district <> '' ORDER BY district",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[derive(Debug)]
struct AdminRow {
    username: String,
    role: String,
    email: Option<String>,
    access_json: String,
    departments_json: Option<String>,
}

impl AdminRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            username: row.get(0)?,
            role: row.get(1)?,
            email: row.get(2)?,
            access_json: row.get(3)?,
            departments_json: row.get(4)?,
        })
    }

    fn into_identity(self) -> Result<AdminIdentity> {
        let role = Role::parse(&self.role)
            .with_context(|| format!("unknown role {:?} for {}", self.role, self.username))?;
        let departments = match self.departments_json.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .with_context(|| format!("decoding departments of {}", self.username))?,
            None => Departments::default(),
        };
        Ok(AdminIdentity {
            access: serde_json::from_str(&self.access_json)
                .with_context(|| format!("decoding access of {}", self.username))?,
            username: self.username,
            role,
            email: self.email,
            departments,
        })
    }
}
