//! Lead submission flow: the three-step optimize modal.
//!
//! The flow is a small closed-set state machine (`Intent` → `Form` →
//! `Confirmation`, plus an implicit closed state). The network write goes
//! through the [`LeadSubmitter`] seam and is split into a begin/finish pair
//! so the response callback can land after the modal has already closed —
//! in that case the resulting transition is inert.

use crate::models::{AnalyticsEvent, LeadSubmission};
use crate::tracker::{source_from_query, EventTracker};
use crate::validation;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Price displayed on the intent step and sent with every submission.
pub const PROFILE_OPTIMIZATION_PRICE: f64 = 29.0;

/// How long the confirmation step stays up before the modal closes itself.
pub const CONFIRMATION_DWELL: Duration = Duration::from_secs(5);

/// Delay before field state is cleared after close, so the closing
/// animation is not visually interrupted by the reset.
pub const RESET_DEBOUNCE: Duration = Duration::from_millis(300);

/// User-facing message for any submit failure. Raw error detail never
/// reaches the user.
pub const GENERIC_SUBMIT_ERROR: &str = "Something went wrong. Please try again.";

/// Network seam for the lead write. The production implementation posts to
/// `/api/leads`; tests substitute their own.
#[async_trait]
pub trait LeadSubmitter: Send + Sync {
    async fn submit(&self, payload: &LeadSubmission) -> anyhow::Result<()>;
}

/// Posts lead submissions to the persistence endpoint over HTTP.
pub struct HttpLeadSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLeadSubmitter {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl LeadSubmitter for HttpLeadSubmitter {
    async fn submit(&self, payload: &LeadSubmission) -> anyhow::Result<()> {
        let response = self.client.post(&self.endpoint).json(payload).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("lead endpoint returned status {}", response.status());
        }

        Ok(())
    }
}

/// The visible step of the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalStep {
    /// Pay-intent question with the displayed price.
    Intent,
    /// The lead-capture form.
    Form,
    /// Post-submit confirmation, auto-dismissed after [`CONFIRMATION_DWELL`].
    Confirmation,
}

/// Form fields that emit a one-time focus event per open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Email,
    Checkbox,
    Textarea,
}

#[derive(Debug, Default, Clone, Copy)]
struct FocusFlags {
    email: bool,
    checkbox: bool,
    textarea: bool,
}

/// State of one modal instance.
pub struct ModalFlow {
    open: bool,
    step: ModalStep,
    email: String,
    willing_to_pay: bool,
    main_problem: String,
    error: Option<String>,
    is_submitting: bool,
    focused: FocusFlags,
    pending_reset: bool,
}

impl Default for ModalFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalFlow {
    /// A closed modal with pristine fields.
    pub fn new() -> Self {
        Self {
            open: false,
            step: ModalStep::Intent,
            email: String::new(),
            willing_to_pay: false,
            main_problem: String::new(),
            error: None,
            is_submitting: false,
            focused: FocusFlags::default(),
            pending_reset: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn step(&self) -> ModalStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn willing_to_pay(&self) -> bool {
        self.willing_to_pay
    }

    pub fn main_problem(&self) -> &str {
        &self.main_problem
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    /// Whether a close has happened and the debounced reset is still due.
    pub fn reset_pending(&self) -> bool {
        self.pending_reset
    }

    /// Whether the submit control is enabled.
    pub fn is_form_valid(&self) -> bool {
        validation::is_form_valid(&self.email, self.willing_to_pay, &self.main_problem)
    }

    /// External open trigger: closed → intent.
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    pub fn set_willing_to_pay(&mut self, willing: bool) {
        self.willing_to_pay = willing;
    }

    pub fn set_main_problem(&mut self, problem: &str) {
        self.main_problem = problem.to_string();
    }

    /// User confirmed purchase intent: intent → form. No persistence yet.
    pub fn intent_yes(&mut self, tracker: &EventTracker, page_query: &str) {
        if !self.open || self.step != ModalStep::Intent {
            return;
        }
        tracker.track(
            AnalyticsEvent::IntentYes,
            Some(json!({ "price": PROFILE_OPTIMIZATION_PRICE })),
            page_query,
        );
        self.step = ModalStep::Form;
    }

    /// User declined: intent → closed. Fields reset when the close settles.
    pub fn intent_no(&mut self, tracker: &EventTracker, page_query: &str) {
        if !self.open || self.step != ModalStep::Intent {
            return;
        }
        tracker.track(
            AnalyticsEvent::IntentNo,
            Some(json!({ "price": PROFILE_OPTIMIZATION_PRICE })),
            page_query,
        );
        self.close();
    }

    /// First focus of a field fires its engagement event; later focuses of
    /// the same field within one open are silent.
    pub fn focus_field(&mut self, field: FormField, tracker: &EventTracker, page_query: &str) {
        let (seen, event) = match field {
            FormField::Email => (&mut self.focused.email, AnalyticsEvent::FieldFocusEmail),
            FormField::Checkbox => (
                &mut self.focused.checkbox,
                AnalyticsEvent::FieldFocusCheckbox,
            ),
            FormField::Textarea => (
                &mut self.focused.textarea,
                AnalyticsEvent::FieldFocusTextarea,
            ),
        };

        if !*seen {
            *seen = true;
            tracker.track(event, None, page_query);
        }
    }

    /// Diagnostic event on leaving the email field, carrying its current
    /// value.
    pub fn blur_email(&self, tracker: &EventTracker, page_query: &str) {
        tracker.track(
            AnalyticsEvent::EmailBlur,
            Some(json!({ "email": self.email })),
            page_query,
        );
    }

    /// Start a submit attempt.
    ///
    /// Returns the payload for the single network call, or `None` when the
    /// form is not submittable (invalid fields, wrong step, or an attempt
    /// already in flight) — the server re-validates regardless.
    pub fn begin_submit(&mut self, page_query: &str) -> Option<LeadSubmission> {
        if !self.open || self.step != ModalStep::Form || self.is_submitting {
            return None;
        }
        if !self.is_form_valid() {
            return None;
        }

        self.error = None;
        self.is_submitting = true;

        Some(LeadSubmission {
            email: self.email.clone(),
            willing_to_pay: self.willing_to_pay,
            price_shown: PROFILE_OPTIMIZATION_PRICE,
            main_problem: self.main_problem.clone(),
            source: source_from_query(page_query),
        })
    }

    /// Apply the settled outcome of the network call.
    ///
    /// Success moves to the confirmation step and fires `form_submit`;
    /// failure stays on the form with a generic retry-eligible message and
    /// fires `form_error` — entered values are preserved. If the modal was
    /// closed while the request was in flight, the outcome is inert.
    pub fn finish_submit(
        &mut self,
        outcome: anyhow::Result<()>,
        tracker: &EventTracker,
        page_query: &str,
    ) {
        self.is_submitting = false;

        if !self.open {
            tracing::debug!("Submit settled after modal closed, dropping transition");
            return;
        }

        match outcome {
            Ok(()) => {
                tracker.track(
                    AnalyticsEvent::FormSubmit,
                    Some(json!({
                        "email": self.email,
                        "willing_to_pay": self.willing_to_pay,
                        "main_problem": self.main_problem,
                        "price": PROFILE_OPTIMIZATION_PRICE,
                    })),
                    page_query,
                );
                self.step = ModalStep::Confirmation;
            }
            Err(e) => {
                tracing::debug!("Lead submit failed: {}", e);
                tracker.track(AnalyticsEvent::FormError, None, page_query);
                self.error = Some(GENERIC_SUBMIT_ERROR.to_string());
            }
        }
    }

    /// One full submit attempt: validate, one network call, settle.
    ///
    /// Never panics and never surfaces an error to the caller; all failure
    /// detail lands in the generic form error state.
    pub async fn submit(
        &mut self,
        submitter: &dyn LeadSubmitter,
        tracker: &EventTracker,
        page_query: &str,
    ) {
        let Some(payload) = self.begin_submit(page_query) else {
            return;
        };
        let outcome = submitter.submit(&payload).await;
        self.finish_submit(outcome, tracker, page_query);
    }

    /// The confirmation dwell elapsed with no interaction: auto-close.
    pub fn confirmation_elapsed(&mut self) {
        if self.open && self.step == ModalStep::Confirmation {
            self.close();
        }
    }

    /// Close the modal. Field and error state survive until the caller runs
    /// [`finish_close`] after [`RESET_DEBOUNCE`].
    ///
    /// [`finish_close`]: ModalFlow::finish_close
    pub fn close(&mut self) {
        self.open = false;
        self.pending_reset = true;
    }

    /// Apply the debounced post-close reset: all fields, error state, and
    /// focus tracking return to initial defaults.
    pub fn finish_close(&mut self) {
        if !self.pending_reset {
            return;
        }
        self.step = ModalStep::Intent;
        self.email.clear();
        self.willing_to_pay = false;
        self.main_problem.clear();
        self.error = None;
        self.is_submitting = false;
        self.focused = FocusFlags::default();
        self.pending_reset = false;
    }
}
