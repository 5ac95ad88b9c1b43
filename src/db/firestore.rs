// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed calendar store.
//!
//! One document per athlete in [`collections::USER_CALENDARS`], with the
//! athlete ID as the document ID.

use super::{empty_calendar, CalendarStore};
use crate::db::collections;
use crate::error::AppError;
use crate::models::{CalendarEvent, UserCalendar};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use firestore::errors::FirestoreError;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes an unauthenticated connection.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Offline client: every operation fails with a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn read_calendar(&self, user_id: u64) -> Result<Option<UserCalendar>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_CALENDARS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl CalendarStore for FirestoreDb {
    async fn create_if_absent(&self, user_id: u64) -> Result<(UserCalendar, bool), AppError> {
        let record = empty_calendar(user_id);

        // Insert fails with a conflict if the document already exists.
        let inserted: Result<UserCalendar, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USER_CALENDARS)
            .document_id(user_id.to_string())
            .object(&record)
            .execute()
            .await;

        match inserted {
            Ok(stored) => {
                tracing::info!(user_id, "Calendar record created");
                Ok((stored, true))
            }
            Err(FirestoreError::DataConflictError(_)) => {
                let existing = self.read_calendar(user_id).await?.ok_or_else(|| {
                    AppError::Database(format!("Calendar {} vanished after conflict", user_id))
                })?;
                Ok((existing, false))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn get(&self, user_id: u64) -> Result<Option<UserCalendar>, AppError> {
        self.read_calendar(user_id).await
    }

    async fn replace_events(
        &self,
        user_id: u64,
        events: Vec<CalendarEvent>,
    ) -> Result<Option<UserCalendar>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let Some(mut record) = self.read_calendar(user_id).await? else {
            let _ = transaction.rollback().await;
            return Ok(None);
        };

        record.events = events;
        record.updated_at = format_utc_rfc3339(chrono::Utc::now());

        client
            .fluent()
            .update()
            .in_col(collections::USER_CALENDARS)
            .document_id(user_id.to_string())
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add calendar to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            events_count = record.events.len(),
            "Calendar events replaced"
        );

        Ok(Some(record))
    }
}
