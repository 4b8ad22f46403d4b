use crate::errors::AppError;
use crate::models::{AnalyticsEvent, Lead, NewLead};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Narrow persistence seam for the lead-capture flow.
///
/// Two backends exist: Postgres for the hosted deployment and an in-memory
/// map for tests and local runs without a database. Both guarantee the same
/// upsert contract, so handlers never care which one is behind the trait.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Idempotent insert-or-update keyed by the lead's normalized email.
    ///
    /// On insert, all fields are stored with a server-assigned creation
    /// timestamp. On update, `willing_to_pay`, `price_shown`, `main_problem`
    /// and the update timestamp are overwritten; `source` is overwritten only
    /// when the incoming submission carries one, otherwise the stored value
    /// is preserved.
    async fn upsert_lead(&self, lead: &NewLead) -> Result<(), AppError>;

    /// Fetch a lead by normalized email. `Ok(None)` when absent.
    async fn find_lead(&self, email: &str) -> Result<Option<Lead>, AppError>;

    /// Append an analytics event row (self-hosted analytics variant).
    async fn record_event(
        &self,
        event: AnalyticsEvent,
        source: Option<&str>,
    ) -> Result<(), AppError>;
}

// ============ Postgres backend ============

/// Postgres-backed lead store.
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    ///
    /// Mirrors the original embedded-store bootstrap: schema is owned by the
    /// service, applied idempotently at startup.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                id BIGSERIAL PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                willing_to_pay BOOLEAN NOT NULL DEFAULT FALSE,
                price_shown DOUBLE PRECISION NOT NULL,
                main_problem TEXT NOT NULL,
                source TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_events (
                id BIGSERIAL PRIMARY KEY,
                event_name TEXT NOT NULL,
                source TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Lead store schema ready");
        Ok(())
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn upsert_lead(&self, lead: &NewLead) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO leads (email, willing_to_pay, price_shown, main_problem, source)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET willing_to_pay = EXCLUDED.willing_to_pay,
                price_shown = EXCLUDED.price_shown,
                main_problem = EXCLUDED.main_problem,
                source = COALESCE(EXCLUDED.source, leads.source),
                updated_at = now()
            "#,
        )
        .bind(&lead.email)
        .bind(lead.willing_to_pay)
        .bind(lead.price_shown)
        .bind(&lead.main_problem)
        .bind(&lead.source)
        .execute(&self.pool)
        .await?;

        tracing::info!("Upserted lead for email: {}", lead.email);
        Ok(())
    }

    async fn find_lead(&self, email: &str) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    async fn record_event(
        &self,
        event: AnalyticsEvent,
        source: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO analytics_events (event_name, source) VALUES ($1, $2)")
            .bind(event.as_str())
            .bind(source)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============ In-memory backend ============

/// In-memory lead store keyed by normalized email.
///
/// The embedded counterpart to [`PgLeadStore`]: same upsert semantics over a
/// plain map. Used by the integration tests and for local runs without a
/// database.
#[derive(Default)]
pub struct MemoryLeadStore {
    leads: Mutex<HashMap<String, Lead>>,
    events: Mutex<Vec<(AnalyticsEvent, Option<String>)>>,
    next_id: AtomicI64,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored leads. Test observability.
    pub fn lead_count(&self) -> usize {
        self.leads.lock().expect("lead map poisoned").len()
    }

    /// Recorded analytics events. Test observability.
    pub fn recorded_events(&self) -> Vec<(AnalyticsEvent, Option<String>)> {
        self.events.lock().expect("event log poisoned").clone()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn upsert_lead(&self, lead: &NewLead) -> Result<(), AppError> {
        let mut leads = self.leads.lock().expect("lead map poisoned");

        match leads.get_mut(&lead.email) {
            Some(existing) => {
                existing.willing_to_pay = lead.willing_to_pay;
                existing.price_shown = lead.price_shown;
                existing.main_problem = lead.main_problem.clone();
                if lead.source.is_some() {
                    existing.source = lead.source.clone();
                }
                existing.updated_at = Some(Utc::now());
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                leads.insert(
                    lead.email.clone(),
                    Lead {
                        id,
                        email: lead.email.clone(),
                        willing_to_pay: lead.willing_to_pay,
                        price_shown: lead.price_shown,
                        main_problem: lead.main_problem.clone(),
                        source: lead.source.clone(),
                        created_at: Utc::now(),
                        updated_at: None,
                    },
                );
            }
        }

        Ok(())
    }

    async fn find_lead(&self, email: &str) -> Result<Option<Lead>, AppError> {
        let leads = self.leads.lock().expect("lead map poisoned");
        Ok(leads.get(email).cloned())
    }

    async fn record_event(
        &self,
        event: AnalyticsEvent,
        source: Option<&str>,
    ) -> Result<(), AppError> {
        self.events
            .lock()
            .expect("event log poisoned")
            .push((event, source.map(String::from)));
        Ok(())
    }
}
