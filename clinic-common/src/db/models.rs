//! Row models
//!
//! One struct per table, decoded with `sqlx::FromRow` and serialized with the
//! column names as JSON keys. JSON columns decode through `sqlx::types::Json`.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::agenda::TimeBlock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Clinic {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Director {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub clinic: Option<String>,
    pub job_title: Option<String>,
    pub role: Option<String>,
    pub semester: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub clinic_id: Option<String>,
    pub clinic: Option<String>,
    pub client_team: Option<String>,
    pub is_team_leader: bool,
    pub academic_level: Option<String>,
    pub education: Option<String>,
    pub linkedin_profile: Option<String>,
    pub business_experience: Option<String>,
    pub semester: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub project_type: Option<String>,
    pub status: String,
    pub semester: Option<String>,
    pub alumni_mentor: Option<String>,
    pub clinic: Option<String>,
    pub auth_user_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Debrief {
    pub id: String,
    pub student_id: Option<String>,
    pub student_name: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub clinic: Option<String>,
    pub hours_worked: f64,
    pub work_summary: Option<String>,
    pub questions: Option<String>,
    pub action_items: Option<String>,
    pub debrief_date: String,
    pub week_ending: String,
    pub semester: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeeklySummary {
    pub id: String,
    pub week_ending: String,
    pub clinic: String,
    pub client_name: String,
    pub client_id: Option<String>,
    pub total_hours: f64,
    pub student_count: i64,
    pub activity_count: i64,
    pub summary: String,
    pub semester: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SemesterConfig {
    pub id: String,
    pub semester: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

/// Coursework attached to a schedule week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    /// reading, deliverable, quiz, presentation or other
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, rename = "file_url", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, rename = "file_name", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// One week row of the semester schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleWeek {
    pub id: String,
    pub semester_id: Option<String>,
    pub week_number: i64,
    pub week_label: String,
    pub week_start: String,
    pub week_end: String,
    pub session_focus: Option<String>,
    pub activities: Json<Vec<TimeBlock>>,
    pub assignments: Json<Vec<Assignment>>,
    pub notes: Option<String>,
    pub class_time_minutes: i64,
    pub clinic_time_minutes: i64,
    pub is_break: bool,
    pub room_assignment: Option<String>,
    pub zoom_link: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseMaterial {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub target_clinic: String,
    pub category: String,
    pub uploaded_by_name: Option<String>,
    pub uploaded_by_email: Option<String>,
    pub created_at: String,
}

/// A deliverable uploaded by a student team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub clinic: Option<String>,
    pub clinic_id: Option<String>,
    pub clinic_director_id: Option<String>,
    pub client_director_id: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub submission_type: Option<String>,
    pub semester_id: Option<String>,
    pub description: Option<String>,
    pub uploaded_at: String,
}

/// A director's five-question rubric for one deliverable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Evaluation {
    pub id: String,
    pub document_id: String,
    pub director_name: String,
    pub question_1_rating: Option<i64>,
    pub question_2_rating: Option<i64>,
    pub question_3_rating: Option<i64>,
    pub question_4_rating: Option<i64>,
    pub question_5_rating: Option<i64>,
    pub question_1_notes: Option<String>,
    pub question_2_notes: Option<String>,
    pub question_3_notes: Option<String>,
    pub question_4_notes: Option<String>,
    pub question_5_notes: Option<String>,
    pub additional_comments: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentReview {
    pub id: String,
    pub document_id: String,
    pub reviewer_name: Option<String>,
    pub status: String,
    pub comments: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientDocument {
    pub id: String,
    pub client_id: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub description: Option<String>,
    pub uploaded_by_name: Option<String>,
    pub uploaded_by_email: Option<String>,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientMessage {
    pub id: String,
    pub client_id: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub sender_type: Option<String>,
    pub created_at: String,
}

/// Triage inbox entry; announcements are notifications aimed at students
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub clinic: Option<String>,
    pub clinic_id: Option<String>,
    pub student_id: Option<String>,
    pub target_audience: String,
    pub is_read: bool,
    pub created_by: Option<String>,
    pub created_by_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientTask {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub due_date: Option<String>,
    pub status: String,
    pub assigned_to: Option<String>,
    pub assigned_to_id: Option<String>,
    pub created_by: String,
    pub created_by_type: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientTaskComment {
    pub id: String,
    pub task_id: String,
    pub client_id: Option<String>,
    pub comment_text: String,
    pub author_name: String,
    pub author_email: String,
    pub author_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientQuestion {
    pub id: String,
    pub client_id: String,
    pub question: String,
    pub asked_by: String,
    pub asked_by_email: String,
    pub category: String,
    pub status: String,
    pub answer: Option<String>,
    pub answered_by: Option<String>,
    pub answered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SignedAgreement {
    pub id: String,
    pub agreement_type: String,
    pub user_name: Option<String>,
    pub user_email: String,
    pub user_type: Option<String>,
    pub signature: String,
    pub signed_at: String,
    pub program_name: Option<String>,
    pub client_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Prospect {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub clinic_of_interest: Option<String>,
    pub suggested_clinic: Option<String>,
    pub interviewer_id: Option<String>,
    pub director_in_charge_id: Option<String>,
    pub acceptance_status: String,
    pub target_semester_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProspectInterview {
    pub id: String,
    pub prospect_id: String,
    pub interviewer_id: Option<String>,
    pub interview_date: Option<String>,
    pub interview_status: String,
    pub rating: Option<i64>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledClientMeeting {
    pub id: String,
    pub semester_schedule_id: Option<String>,
    pub semester_id: Option<String>,
    pub week_number: i64,
    pub week_label: Option<String>,
    pub week_start: Option<String>,
    pub week_end: Option<String>,
    pub client_name: String,
    pub client_id: Option<String>,
    pub primary_director_id: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub minutes: i64,
    pub room_assignment: Option<String>,
    pub zoom_link: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Row of `v_complete_mapping`: one student x clinic director x client director
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MappingRow {
    pub client_id: String,
    pub client_name: String,
    pub semester: Option<String>,
    pub student_id: String,
    pub student_name: String,
    pub student_email: Option<String>,
    pub student_role: Option<String>,
    pub student_clinic_id: Option<String>,
    pub student_clinic_name: Option<String>,
    pub clinic_director_id: Option<String>,
    pub clinic_director_name: Option<String>,
    pub clinic_director_email: Option<String>,
    pub client_director_id: Option<String>,
    pub client_director_name: Option<String>,
    pub client_director_email: Option<String>,
}
