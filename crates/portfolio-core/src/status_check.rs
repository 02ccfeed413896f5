//! Status check service: record client pings and list them back.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::StatusCheck;
use crate::store::{Collection, DocumentStore, Filter};
use crate::validation::StatusCheckCreate;

/// How many status checks `list` returns when not configured otherwise.
pub const DEFAULT_STATUS_CHECK_LIMIT: usize = 1000;

pub struct StatusCheckService<C>
where
    C: Clock + Send + Sync,
{
    checks: Collection<StatusCheck>,
    clock: Arc<C>,
    list_limit: usize,
}

impl<C> StatusCheckService<C>
where
    C: Clock + Send + Sync,
{
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<C>) -> Self {
        Self {
            checks: Collection::new(store),
            clock,
            list_limit: DEFAULT_STATUS_CHECK_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    pub async fn create(&self, input: StatusCheckCreate) -> ServiceResult<StatusCheck> {
        let input = input.validate()?;
        let check = StatusCheck::new(input, Uuid::new_v4(), self.clock.utc());

        let inserted = self.checks.insert(&check).await.map_err(|e| {
            error!(operation = "create_status_check", error = %format!("{e:#}"), "error saving status check");
            ServiceError::Store(e)
        })?;
        if inserted == 0 {
            return Err(ServiceError::Persistence("status check"));
        }

        debug!(id = %check.id, client = %check.client_name, "status check recorded");
        Ok(check)
    }

    /// All status checks in insertion order, up to the configured limit.
    pub async fn list(&self) -> ServiceResult<Vec<StatusCheck>> {
        self.checks
            .find(&Filter::new(), None, self.list_limit)
            .await
            .map_err(|e| {
                error!(operation = "list_status_checks", error = %format!("{e:#}"), "error retrieving status checks");
                ServiceError::Store(e)
            })
    }
}
