//! Database initialization
//!
//! Opens (or creates) the SQLite store and creates every portal table and
//! view idempotently. Safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Default timestamp expression; matches `time::now_rfc3339()` formatting
macro_rules! now_default {
    () => {
        "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))"
    };
}

/// Table and view definitions in dependency order
const SCHEMA: &[(&str, &str)] = &[
    (
        "clinics",
        concat!(
            "CREATE TABLE IF NOT EXISTS clinics (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "directors",
        concat!(
            "CREATE TABLE IF NOT EXISTS directors (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                bio TEXT,
                profile_picture_url TEXT,
                clinic TEXT,
                job_title TEXT,
                role TEXT,
                semester TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "clinic_directors",
        "CREATE TABLE IF NOT EXISTS clinic_directors (
            clinic_id TEXT NOT NULL REFERENCES clinics(id) ON DELETE CASCADE,
            director_id TEXT NOT NULL REFERENCES directors(id) ON DELETE CASCADE,
            PRIMARY KEY (clinic_id, director_id)
        )",
    ),
    (
        "students",
        concat!(
            "CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT,
                email TEXT,
                phone TEXT,
                bio TEXT,
                profile_picture_url TEXT,
                clinic_id TEXT REFERENCES clinics(id) ON DELETE SET NULL,
                clinic TEXT,
                client_team TEXT,
                is_team_leader INTEGER NOT NULL DEFAULT 0,
                academic_level TEXT,
                education TEXT,
                linkedin_profile TEXT,
                business_experience TEXT,
                semester TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "clients",
        concat!(
            "CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                contact_name TEXT,
                phone TEXT,
                website TEXT,
                project_type TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                semester TEXT,
                alumni_mentor TEXT,
                clinic TEXT,
                auth_user_id TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "client_directors",
        "CREATE TABLE IF NOT EXISTS client_directors (
            client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            director_id TEXT NOT NULL REFERENCES directors(id) ON DELETE CASCADE,
            is_primary INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (client_id, director_id)
        )",
    ),
    (
        "client_assignments",
        "CREATE TABLE IF NOT EXISTS client_assignments (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            role TEXT,
            UNIQUE (client_id, student_id)
        )",
    ),
    (
        "debriefs",
        concat!(
            "CREATE TABLE IF NOT EXISTS debriefs (
                id TEXT PRIMARY KEY,
                student_id TEXT REFERENCES students(id) ON DELETE SET NULL,
                student_name TEXT NOT NULL,
                client_id TEXT REFERENCES clients(id) ON DELETE SET NULL,
                client_name TEXT NOT NULL,
                clinic TEXT,
                hours_worked REAL NOT NULL,
                work_summary TEXT,
                questions TEXT,
                action_items TEXT,
                debrief_date TEXT NOT NULL,
                week_ending TEXT NOT NULL,
                semester TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "weekly_summaries",
        concat!(
            "CREATE TABLE IF NOT EXISTS weekly_summaries (
                id TEXT PRIMARY KEY,
                week_ending TEXT NOT NULL,
                clinic TEXT NOT NULL,
                client_name TEXT NOT NULL,
                client_id TEXT,
                total_hours REAL NOT NULL DEFAULT 0,
                student_count INTEGER NOT NULL DEFAULT 0,
                activity_count INTEGER NOT NULL DEFAULT 0,
                summary TEXT NOT NULL DEFAULT '',
                semester TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                UNIQUE (week_ending, clinic, client_name)
            )"
        ),
    ),
    (
        "semester_config",
        concat!(
            "CREATE TABLE IF NOT EXISTS semester_config (
                id TEXT PRIMARY KEY,
                semester TEXT NOT NULL UNIQUE,
                start_date TEXT,
                end_date TEXT,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "semester_schedule",
        concat!(
            "CREATE TABLE IF NOT EXISTS semester_schedule (
                id TEXT PRIMARY KEY,
                semester_id TEXT REFERENCES semester_config(id) ON DELETE CASCADE,
                week_number INTEGER NOT NULL,
                week_label TEXT NOT NULL,
                week_start TEXT NOT NULL,
                week_end TEXT NOT NULL,
                session_focus TEXT,
                activities TEXT NOT NULL DEFAULT '[]',
                assignments TEXT NOT NULL DEFAULT '[]',
                notes TEXT,
                class_time_minutes INTEGER NOT NULL DEFAULT 90,
                clinic_time_minutes INTEGER NOT NULL DEFAULT 90,
                is_break INTEGER NOT NULL DEFAULT 0,
                room_assignment TEXT,
                zoom_link TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "course_materials",
        concat!(
            "CREATE TABLE IF NOT EXISTS course_materials (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                file_name TEXT NOT NULL,
                file_url TEXT NOT NULL,
                file_type TEXT,
                file_size INTEGER,
                target_clinic TEXT NOT NULL DEFAULT 'all',
                category TEXT NOT NULL DEFAULT 'resource',
                uploaded_by_name TEXT,
                uploaded_by_email TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "documents",
        concat!(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                client_id TEXT REFERENCES clients(id) ON DELETE CASCADE,
                client_name TEXT,
                student_id TEXT,
                student_name TEXT,
                clinic TEXT,
                clinic_id TEXT,
                clinic_director_id TEXT,
                client_director_id TEXT,
                file_name TEXT NOT NULL,
                file_url TEXT NOT NULL,
                file_type TEXT,
                file_size INTEGER,
                submission_type TEXT,
                semester_id TEXT,
                description TEXT,
                uploaded_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "evaluations",
        concat!(
            "CREATE TABLE IF NOT EXISTS evaluations (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                director_name TEXT NOT NULL,
                question_1_rating INTEGER,
                question_2_rating INTEGER,
                question_3_rating INTEGER,
                question_4_rating INTEGER,
                question_5_rating INTEGER,
                question_1_notes TEXT,
                question_2_notes TEXT,
                question_3_notes TEXT,
                question_4_notes TEXT,
                question_5_notes TEXT,
                additional_comments TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                UNIQUE (document_id, director_name)
            )"
        ),
    ),
    (
        "document_reviews",
        concat!(
            "CREATE TABLE IF NOT EXISTS document_reviews (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                reviewer_name TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                comments TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "client_documents",
        concat!(
            "CREATE TABLE IF NOT EXISTS client_documents (
                id TEXT PRIMARY KEY,
                client_id TEXT,
                file_name TEXT NOT NULL,
                file_url TEXT NOT NULL,
                file_type TEXT,
                description TEXT,
                uploaded_by_name TEXT,
                uploaded_by_email TEXT,
                uploaded_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "client_messages",
        concat!(
            "CREATE TABLE IF NOT EXISTS client_messages (
                id TEXT PRIMARY KEY,
                client_id TEXT,
                subject TEXT,
                message TEXT NOT NULL,
                sender_name TEXT,
                sender_email TEXT,
                sender_type TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "notifications",
        concat!(
            "CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL DEFAULT 'announcement',
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                clinic TEXT,
                clinic_id TEXT,
                student_id TEXT,
                target_audience TEXT NOT NULL DEFAULT 'directors',
                is_read INTEGER NOT NULL DEFAULT 0,
                created_by TEXT,
                created_by_id TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "client_tasks",
        concat!(
            "CREATE TABLE IF NOT EXISTS client_tasks (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL DEFAULT 'medium',
                due_date TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                assigned_to TEXT,
                assigned_to_id TEXT,
                created_by TEXT NOT NULL,
                created_by_type TEXT NOT NULL DEFAULT 'admin',
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "client_task_comments",
        concat!(
            "CREATE TABLE IF NOT EXISTS client_task_comments (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL REFERENCES client_tasks(id) ON DELETE CASCADE,
                client_id TEXT,
                comment_text TEXT NOT NULL,
                author_name TEXT NOT NULL,
                author_email TEXT NOT NULL DEFAULT '',
                author_type TEXT NOT NULL DEFAULT 'client',
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "client_questions",
        concat!(
            "CREATE TABLE IF NOT EXISTS client_questions (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                question TEXT NOT NULL,
                asked_by TEXT NOT NULL,
                asked_by_email TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'general',
                status TEXT NOT NULL DEFAULT 'pending',
                answer TEXT,
                answered_by TEXT,
                answered_at TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "signed_agreements",
        concat!(
            "CREATE TABLE IF NOT EXISTS signed_agreements (
                id TEXT PRIMARY KEY,
                agreement_type TEXT NOT NULL,
                user_name TEXT,
                user_email TEXT NOT NULL,
                user_type TEXT,
                signature TEXT NOT NULL,
                signed_at TEXT NOT NULL,
                program_name TEXT,
                client_name TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                UNIQUE (user_email, agreement_type)
            )"
        ),
    ),
    (
        "prospects",
        concat!(
            "CREATE TABLE IF NOT EXISTS prospects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                business_name TEXT,
                clinic_of_interest TEXT,
                suggested_clinic TEXT,
                interviewer_id TEXT,
                director_in_charge_id TEXT,
                acceptance_status TEXT NOT NULL DEFAULT 'pending',
                target_semester_id TEXT,
                notes TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "prospect_interviews",
        concat!(
            "CREATE TABLE IF NOT EXISTS prospect_interviews (
                id TEXT PRIMARY KEY,
                prospect_id TEXT NOT NULL REFERENCES prospects(id) ON DELETE CASCADE,
                interviewer_id TEXT,
                interview_date TEXT,
                interview_status TEXT NOT NULL DEFAULT 'scheduled',
                rating INTEGER,
                notes TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "scheduled_client_meetings",
        concat!(
            "CREATE TABLE IF NOT EXISTS scheduled_client_meetings (
                id TEXT PRIMARY KEY,
                semester_schedule_id TEXT,
                semester_id TEXT,
                week_number INTEGER NOT NULL,
                week_label TEXT,
                week_start TEXT,
                week_end TEXT,
                client_name TEXT NOT NULL,
                client_id TEXT,
                primary_director_id TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT,
                minutes INTEGER NOT NULL DEFAULT 30,
                room_assignment TEXT,
                zoom_link TEXT,
                notes TEXT,
                created_at TEXT NOT NULL DEFAULT ", now_default!(), ",
                updated_at TEXT NOT NULL DEFAULT ", now_default!(), "
            )"
        ),
    ),
    (
        "v_complete_mapping",
        "CREATE VIEW IF NOT EXISTS v_complete_mapping AS
        SELECT
            c.id AS client_id,
            c.name AS client_name,
            c.semester AS semester,
            s.id AS student_id,
            s.full_name AS student_name,
            s.email AS student_email,
            COALESCE(ca.role, CASE WHEN s.is_team_leader = 1 THEN 'Team Leader' ELSE 'Team Member' END) AS student_role,
            s.clinic_id AS student_clinic_id,
            cl.name AS student_clinic_name,
            cdir.id AS clinic_director_id,
            cdir.full_name AS clinic_director_name,
            cdir.email AS clinic_director_email,
            pdir.id AS client_director_id,
            pdir.full_name AS client_director_name,
            pdir.email AS client_director_email
        FROM client_assignments ca
        JOIN clients c ON c.id = ca.client_id
        JOIN students s ON s.id = ca.student_id
        LEFT JOIN clinics cl ON cl.id = s.clinic_id
        LEFT JOIN clinic_directors cd ON cd.clinic_id = s.clinic_id
        LEFT JOIN directors cdir ON cdir.id = cd.director_id
        LEFT JOIN client_directors pd ON pd.client_id = c.id AND pd.is_primary = 1
        LEFT JOIN directors pdir ON pdir.id = pd.director_id",
    ),
];

/// Index definitions backing the common filters
const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_debriefs_client ON debriefs(client_id, week_ending)",
    "CREATE INDEX IF NOT EXISTS idx_debriefs_student ON debriefs(student_id)",
    "CREATE INDEX IF NOT EXISTS idx_schedule_semester ON semester_schedule(semester_id, week_number)",
    "CREATE INDEX IF NOT EXISTS idx_meetings_week ON scheduled_client_meetings(semester_id, week_number)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_client ON client_tasks(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_questions_client ON client_questions(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_audience ON notifications(target_audience, created_at)",
];

/// Open or create the database file and make sure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL lets readers proceed alongside the single writer
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(250));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database with the full schema (tests and dry runs).
///
/// A single connection that is never recycled, so the data lives as long
/// as the pool.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables, views and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    for (_name, ddl) in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    info!("Database schema ready ({} tables/views)", SCHEMA.len());
    Ok(())
}

/// Names of the tables and views the schema defines
pub fn schema_objects() -> impl Iterator<Item = &'static str> {
    SCHEMA.iter().map(|(name, _)| *name)
}
