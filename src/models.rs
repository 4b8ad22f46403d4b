use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

// ============ Database Models ============

/// A prospective customer captured via the commitment form, keyed by email.
///
/// At most one row exists per normalized (trimmed, lowercased) email; repeat
/// submissions update the mutable fields instead of creating duplicates.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    /// Row identifier.
    pub id: i64,
    /// Normalized email address, unique across the table.
    pub email: String,
    /// Stated purchase intent at submission time.
    pub willing_to_pay: bool,
    /// Price displayed to the user when they submitted.
    pub price_shown: f64,
    /// Free-text problem description, trimmed on write.
    pub main_problem: String,
    /// Attribution tag (utm_source), kept from the first submission unless
    /// a later submission carries its own.
    pub source: Option<String>,
    /// Timestamp of first submission, server-assigned.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest repeat submission, if any.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A validated, normalized lead submission ready to be upserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLead {
    pub email: String,
    pub willing_to_pay: bool,
    pub price_shown: f64,
    pub main_problem: String,
    pub source: Option<String>,
}

impl NewLead {
    /// Builds a submission with the email trimmed and lowercased and the
    /// problem text trimmed, matching what the store keys on.
    pub fn normalized(
        email: &str,
        willing_to_pay: bool,
        price_shown: f64,
        main_problem: &str,
        source: Option<String>,
    ) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            willing_to_pay,
            price_shown,
            main_problem: main_problem.trim().to_string(),
            source,
        }
    }
}

// ============ Wire Models ============

/// The lead payload the modal posts to `/api/leads`.
///
/// Field names match the wire contract; the server normalizes email and
/// problem text on its side, so this carries the user's raw input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub email: String,
    pub willing_to_pay: bool,
    pub price_shown: f64,
    pub main_problem: String,
    pub source: Option<String>,
}

// ============ Analytics ============

/// The closed set of funnel events the site emits.
///
/// The first six mark progress through the intent → form → submit funnel;
/// the field-focus and blur variants exist for engagement diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEvent {
    PageView,
    CtaClick,
    IntentYes,
    IntentNo,
    FormSubmit,
    FormError,
    FieldFocusEmail,
    FieldFocusCheckbox,
    FieldFocusTextarea,
    EmailBlur,
}

impl AnalyticsEvent {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEvent::PageView => "page_view",
            AnalyticsEvent::CtaClick => "cta_click",
            AnalyticsEvent::IntentYes => "intent_yes",
            AnalyticsEvent::IntentNo => "intent_no",
            AnalyticsEvent::FormSubmit => "form_submit",
            AnalyticsEvent::FormError => "form_error",
            AnalyticsEvent::FieldFocusEmail => "field_focus_email",
            AnalyticsEvent::FieldFocusCheckbox => "field_focus_checkbox",
            AnalyticsEvent::FieldFocusTextarea => "field_focus_textarea",
            AnalyticsEvent::EmailBlur => "email_blur",
        }
    }
}

impl fmt::Display for AnalyticsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticsEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page_view" => Ok(AnalyticsEvent::PageView),
            "cta_click" => Ok(AnalyticsEvent::CtaClick),
            "intent_yes" => Ok(AnalyticsEvent::IntentYes),
            "intent_no" => Ok(AnalyticsEvent::IntentNo),
            "form_submit" => Ok(AnalyticsEvent::FormSubmit),
            "form_error" => Ok(AnalyticsEvent::FormError),
            "field_focus_email" => Ok(AnalyticsEvent::FieldFocusEmail),
            "field_focus_checkbox" => Ok(AnalyticsEvent::FieldFocusCheckbox),
            "field_focus_textarea" => Ok(AnalyticsEvent::FieldFocusTextarea),
            "email_blur" => Ok(AnalyticsEvent::EmailBlur),
            _ => Err(()),
        }
    }
}
