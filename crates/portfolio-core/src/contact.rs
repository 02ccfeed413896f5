//! Contact message service.
//!
//! Validates and stores contact form submissions, serves the newest-first
//! listing, and runs the status transition. The service holds no mutable
//! state of its own; the document store is the only shared resource.
//!
//! # Status transitions
//!
//! The three [`MessageStatus`] values form a fully connected graph: any
//! value may be set from any other. A transition that matches no record,
//! or that sets the value the record already holds, reports
//! [`ServiceError::NotFound`] because the store modified nothing.

use std::sync::Arc;

use mockable::Clock;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{ContactMessage, MessageStatus};
use crate::store::{Collection, DocumentStore, Filter, Patch, Sort};
use crate::validation::ContactSubmission;

/// Result cap used when the caller does not pass one.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Read-side query for [`ContactService::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    /// Literal status to match. Values outside the enumeration are not
    /// rejected; they simply match nothing.
    pub status: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            status: None,
        }
    }
}

impl ListQuery {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            filter.insert("status".to_string(), Value::String(status.to_string()));
        }
        filter
    }
}

/// Contact message orchestration service.
pub struct ContactService<C>
where
    C: Clock + Send + Sync,
{
    messages: Collection<ContactMessage>,
    clock: Arc<C>,
}

impl<C> Clone for ContactService<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            messages: self.messages.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> ContactService<C>
where
    C: Clock + Send + Sync,
{
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<C>) -> Self {
        Self {
            messages: Collection::new(store),
            clock,
        }
    }

    /// Validate and persist a contact form submission.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] before any write when a field is
    /// missing, empty, or the email is malformed;
    /// [`ServiceError::Persistence`] when the store accepted the call but
    /// wrote nothing; [`ServiceError::Store`] on a storage fault.
    pub async fn submit(&self, submission: ContactSubmission) -> ServiceResult<ContactMessage> {
        let input = submission.validate()?;
        let message = ContactMessage::from_submission(
            input,
            Uuid::new_v4(),
            self.clock.utc(),
            MessageStatus::Unread,
        );

        let inserted = match self.messages.insert(&message).await {
            Ok(n) => n,
            Err(e) => {
                error!(operation = "submit", email = %message.email, error = %format!("{e:#}"), "error submitting contact form");
                return Err(ServiceError::Store(e));
            }
        };
        if inserted == 0 {
            error!(operation = "submit", email = %message.email, "contact message insert had no effect");
            return Err(ServiceError::Persistence("contact message"));
        }

        info!(id = %message.id, "contact message submitted by {}", message.email);
        Ok(message)
    }

    /// List messages newest first, capped at `query.limit`.
    ///
    /// Never fails for an empty result; an unmatched status filter yields an
    /// empty list.
    pub async fn list(&self, query: &ListQuery) -> ServiceResult<Vec<ContactMessage>> {
        let sort = Sort::descending("timestamp");
        self.messages
            .find(&query.filter(), Some(&sort), query.limit)
            .await
            .map_err(|e| {
                error!(operation = "list", error = %format!("{e:#}"), "error retrieving contact messages");
                ServiceError::Store(e)
            })
    }

    /// Move message `id` to `status`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidStatus`] without touching the store when
    /// `status` is not an enumeration value; [`ServiceError::NotFound`] when
    /// the store modified no record.
    pub async fn update_status(&self, id: &str, status: &str) -> ServiceResult<()> {
        let status: MessageStatus = status.parse()?;

        let mut filter = Filter::new();
        filter.insert("id".to_string(), Value::String(id.to_string()));
        let mut patch = Patch::new();
        patch.insert(
            "status".to_string(),
            Value::String(status.as_str().to_string()),
        );

        let modified = self
            .messages
            .update_one(&filter, &patch)
            .await
            .map_err(|e| {
                error!(operation = "update_status", id, error = %format!("{e:#}"), "error updating message status");
                ServiceError::Store(e)
            })?;

        if modified == 0 {
            warn!(id, %status, "status update modified no message");
            return Err(ServiceError::NotFound { id: id.to_string() });
        }

        info!(id, %status, "message status updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{SubsecRound, Utc};
    use mockable::DefaultClock;

    use crate::store::{Document, Record};

    fn service() -> (Arc<InMemoryStore>, ContactService<DefaultClock>) {
        let store = Arc::new(InMemoryStore::new());
        let service = ContactService::new(store.clone(), Arc::new(DefaultClock));
        (store, service)
    }

    fn john() -> ContactSubmission {
        ContactSubmission::new("John Doe", "john.doe@example.com", "Testing", "hello")
    }

    fn count(store: &InMemoryStore) -> usize {
        store.len(ContactMessage::COLLECTION).unwrap()
    }

    #[tokio::test]
    async fn test_submit_assigns_server_fields() {
        let (store, service) = service();
        let started = Utc::now().trunc_subsecs(6);

        let msg = service.submit(john()).await.unwrap();

        assert_eq!(msg.status, MessageStatus::Unread);
        assert!(Uuid::parse_str(&msg.id).is_ok());
        assert!(msg.timestamp >= started);
        assert_eq!(msg.name, "John Doe");
        assert_eq!(msg.subject, "Testing");
        assert_eq!(count(&store), 1);
    }

    #[tokio::test]
    async fn test_submit_ids_are_fresh() {
        let (_store, service) = service();
        let a = service.submit(john()).await.unwrap();
        let b = service.submit(john()).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_invalid_email_writes_nothing() {
        let (store, service) = service();
        let err = service
            .submit(ContactSubmission::new("John", "invalid-email", "Hi", "hello"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(v) => assert_eq!(v.fields()[0].field, "email"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(count(&store), 0);
        assert!(service.list(&ListQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let (store, service) = service();
        let submission = ContactSubmission {
            subject: None,
            ..john()
        };
        let err = service.submit(submission).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(count(&store), 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_limited() {
        let (_store, service) = service();
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(service.submit(john()).await.unwrap().id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed = service.list(&ListQuery::default()).await.unwrap();
        let listed_ids: Vec<_> = listed.iter().map(|m| m.id.clone()).collect();
        ids.reverse();
        assert_eq!(listed_ids, ids);
        for pair in listed.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }

        let capped = service
            .list(&ListQuery::default().with_limit(2))
            .await
            .unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].id, ids[0]);

        let none = service
            .list(&ListQuery::default().with_limit(0))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_twice_is_identical() {
        let (_store, service) = service();
        for _ in 0..3 {
            service.submit(john()).await.unwrap();
        }
        let q = ListQuery::default();
        assert_eq!(
            service.list(&q).await.unwrap(),
            service.list(&q).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_list_limit_has_no_upper_cap() {
        let (_store, service) = service();
        for _ in 0..3 {
            service.submit(john()).await.unwrap();
        }
        let all = service
            .list(&ListQuery::default().with_limit(usize::MAX))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_status_filter() {
        let (_store, service) = service();
        let a = service.submit(john()).await.unwrap();
        let b = service.submit(john()).await.unwrap();
        service.update_status(&a.id, "read").await.unwrap();

        let read = service
            .list(&ListQuery::default().with_status("read"))
            .await
            .unwrap();
        assert_eq!(read.len(), 1);
        assert!(read.iter().all(|m| m.status == MessageStatus::Read));
        assert_eq!(read[0].id, a.id);

        let unread = service
            .list(&ListQuery::default().with_status("unread"))
            .await
            .unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, b.id);
    }

    #[tokio::test]
    async fn test_unknown_status_filter_is_empty_not_error() {
        let (_store, service) = service();
        service.submit(john()).await.unwrap();
        let res = service
            .list(&ListQuery::default().with_status("bogus"))
            .await
            .unwrap();
        assert!(res.is_empty());
    }

    #[tokio::test]
    async fn test_empty_status_filter_means_no_filter() {
        let (_store, service) = service();
        service.submit(john()).await.unwrap();
        let res = service
            .list(&ListQuery::default().with_status(""))
            .await
            .unwrap();
        assert_eq!(res.len(), 1);
    }

    #[tokio::test]
    async fn test_every_transition_is_allowed() {
        let (_store, service) = service();
        let msg = service.submit(john()).await.unwrap();
        for to in ["read", "archived", "unread", "archived", "read", "unread"] {
            service.update_status(&msg.id, to).await.unwrap();
            let listed = service
                .list(&ListQuery::default().with_status(to))
                .await
                .unwrap();
            assert_eq!(listed[0].id, msg.id);
        }
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_record_unchanged() {
        let (_store, service) = service();
        let msg = service.submit(john()).await.unwrap();
        let err = service.update_status(&msg.id, "deleted").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStatus(_)));

        let listed = service.list(&ListQuery::default()).await.unwrap();
        assert_eq!(listed[0].status, MessageStatus::Unread);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (_store, service) = service();
        let err = service
            .update_status("00000000-0000-0000-0000-000000000000", "read")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_same_status_update_reports_not_found() {
        // The store reports zero modifications for a no-op set, which is
        // indistinguishable from a missing id.
        let (_store, service) = service();
        let msg = service.submit(john()).await.unwrap();
        let err = service.update_status(&msg.id, "unread").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    struct BrokenStore {
        inserted: u64,
    }

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn insert_one(&self, _: &str, _: &str, _: Document) -> Result<u64> {
            if self.inserted == 0 {
                Ok(0)
            } else {
                anyhow::bail!("connection reset by peer")
            }
        }

        async fn find(&self, _: &str, _: &Filter, _: Option<&Sort>, _: usize) -> Result<Vec<Document>> {
            anyhow::bail!("connection reset by peer")
        }

        async fn update_one(&self, _: &str, _: &Filter, _: &Patch) -> Result<u64> {
            anyhow::bail!("connection reset by peer")
        }
    }

    fn broken(inserted: u64) -> ContactService<DefaultClock> {
        ContactService::new(Arc::new(BrokenStore { inserted }), Arc::new(DefaultClock))
    }

    #[tokio::test]
    async fn test_insert_without_effect_is_persistence_error() {
        let err = broken(0).submit(john()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert_eq!(err.to_string(), "failed to save contact message");
    }

    #[tokio::test]
    async fn test_store_faults_propagate() {
        let service = broken(1);
        assert!(matches!(
            service.submit(john()).await.unwrap_err(),
            ServiceError::Store(_)
        ));
        assert!(matches!(
            service.list(&ListQuery::default()).await.unwrap_err(),
            ServiceError::Store(_)
        ));
        assert!(matches!(
            service.update_status("abc", "read").await.unwrap_err(),
            ServiceError::Store(_)
        ));
    }

    #[tokio::test]
    async fn test_invalid_status_checked_before_store() {
        // A broken store would fault; validation must short-circuit first.
        let err = broken(1).update_status("abc", "nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStatus(_)));
    }
}
