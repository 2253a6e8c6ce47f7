//! Registration repository for database operations.

use domain::models::ticket::TicketMint;
use domain::models::{NewRegistration, RegistrationRejection};
use domain::services::{evaluate_admission, AdmissionResult, StoreError};
use sqlx::PgPool;

use crate::entities::{EventEntity, RegistrationEntity, RegistrationWithEventEntity};
use crate::metrics::QueryTimer;
use crate::store::{db_error, is_unique_violation};

/// Repository for registration-related database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Admit a registration in one transaction.
    ///
    /// The event row is locked `FOR UPDATE` first, so concurrent admissions for
    /// the same event queue here and the capacity count cannot go stale before
    /// the insert. Dropping the transaction on any early return rolls it back.
    pub async fn admit(
        &self,
        new: &NewRegistration,
        mint: TicketMint,
    ) -> Result<AdmissionResult, StoreError> {
        let timer = QueryTimer::new("admit_registration");
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let event: Option<EventEntity> = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, name, description, event_type, event_date, capacity, registration_open, created_at
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(new.event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        let event = event.map(domain::models::Event::from);

        let registered: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM registrations WHERE event_id = $1
            "#,
        )
        .bind(new.event_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let duplicate: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM registrations WHERE event_id = $1 AND email = $2)
            "#,
        )
        .bind(new.event_id)
        .bind(&new.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let event = match evaluate_admission(event.as_ref(), registered, duplicate) {
            Ok(event) => event.clone(),
            Err(rejection) => {
                timer.record();
                return Ok(AdmissionResult::Rejected(rejection));
            }
        };

        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO registrations (event_id, name, email, phone, affiliation)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(new.event_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.affiliation)
        .fetch_one(&mut *tx)
        .await;

        let registration_id = match inserted {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                timer.record();
                return Ok(AdmissionResult::Rejected(
                    RegistrationRejection::DuplicateRegistration,
                ));
            }
            Err(e) => return Err(db_error(e)),
        };

        let issued = mint(event.id, registration_id)?;

        let registration = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            UPDATE registrations
            SET ticket_id = $2, qr_code = $3
            WHERE id = $1
            RETURNING id, event_id, name, email, phone, affiliation, ticket_id, qr_code,
                      checked_in, checked_in_at, created_at
            "#,
        )
        .bind(registration_id)
        .bind(issued.ticket_id.as_str())
        .bind(&issued.qr_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        timer.record();

        Ok(AdmissionResult::Admitted {
            registration: registration.into(),
            event,
        })
    }

    /// Find registration by ticket id, joined with its event.
    pub async fn find_by_ticket(
        &self,
        ticket_id: &str,
    ) -> Result<Option<RegistrationWithEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_ticket");
        let result = sqlx::query_as::<_, RegistrationWithEventEntity>(
            r#"
            SELECT
                r.id, r.event_id, r.name, r.email, r.phone, r.affiliation, r.ticket_id, r.qr_code,
                r.checked_in, r.checked_in_at, r.created_at,
                e.name as event_name, e.event_date
            FROM registrations r
            JOIN events e ON r.event_id = e.id
            WHERE r.ticket_id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Check whether a registration exists for (event, email).
    pub async fn exists(&self, event_id: i64, email: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("registration_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM registrations WHERE event_id = $1 AND email = $2)
            "#,
        )
        .bind(event_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List registrations for an event, newest first.
    pub async fn list_for_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_registrations");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, event_id, name, email, phone, affiliation, ticket_id, qr_code,
                   checked_in, checked_in_at, created_at
            FROM registrations
            WHERE event_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
