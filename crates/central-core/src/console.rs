//! `Console`: the surface the application talks to
//!
//! Owns references to the store and lifecycle actors. Read paths take a
//! snapshot from the store and filter it outside the actor, so a long
//! filter never holds up writers and never waits on an in-flight transition.

use std::sync::Arc;

use kameo::actor::ActorRef;
use kameo::prelude::*;
use tracing::info;

use central_api::requests::InstanceInput;
use central_api::responses::ListSummary;

use crate::actor::{InstanceStore, LifecycleController, LifecycleControllerArgs, flatten};
use crate::config::LifecycleConfig;
use crate::error::CoreError;
use crate::handle::TransitionHandle;
use crate::instance::{Instance, InstanceId};
use crate::logs::LogSource;
use crate::message::{
    AddInstance, Cancel, DeleteInstance, GetInstance, IsInFlight, ListInstances, Redeploy, Start,
    Stop, UpdateInstance,
};
use crate::notify::NotificationSink;
use crate::query::{self, InstanceQuery, StatusFilter};

/// Handle to a running instance console
#[derive(Clone)]
pub struct Console {
    store: ActorRef<InstanceStore>,
    lifecycle: ActorRef<LifecycleController>,
    logs: Arc<dyn LogSource>,
}

impl Console {
    /// Spawn the store and lifecycle actors
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` if the delays are inconsistent
    pub fn spawn(
        config: LifecycleConfig,
        sink: Arc<dyn NotificationSink>,
        logs: Arc<dyn LogSource>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let store = InstanceStore::spawn(InstanceStore::new());
        let lifecycle = LifecycleController::spawn(LifecycleControllerArgs {
            store: store.clone(),
            config,
            sink,
        });

        Ok(Self {
            store,
            lifecycle,
            logs,
        })
    }

    /// Add each seed, stopping at the first invalid one
    ///
    /// # Errors
    /// Returns the validation error of the first rejected seed
    pub async fn seed(&self, seeds: &[InstanceInput]) -> Result<Vec<Instance>, CoreError> {
        let mut added = Vec::with_capacity(seeds.len());
        for input in seeds {
            added.push(self.add(input.clone()).await?);
        }
        info!(count = added.len(), "seeded instances");
        Ok(added)
    }

    // ------------------------------------------------------------------------
    // Store
    // ------------------------------------------------------------------------

    /// # Errors
    /// Returns `CoreError::Validation` naming the offending field
    pub async fn add(&self, input: InstanceInput) -> Result<Instance, CoreError> {
        flatten(self.store.ask(AddInstance { input }).await)
    }

    /// # Errors
    /// Returns `CoreError::NotFound` or `CoreError::Validation`
    pub async fn update(&self, id: InstanceId, input: InstanceInput) -> Result<Instance, CoreError> {
        flatten(self.store.ask(UpdateInstance { id, input }).await)
    }

    /// Delete an instance
    ///
    /// Allowed while a transition is in flight; that transition then
    /// reports a failed outcome instead of committing.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the id is unknown
    pub async fn delete(&self, id: InstanceId) -> Result<(), CoreError> {
        flatten(self.store.ask(DeleteInstance { id }).await)
    }

    /// # Errors
    /// Returns `CoreError::NotFound` if the id is unknown
    pub async fn get(&self, id: InstanceId) -> Result<Instance, CoreError> {
        flatten(self.store.ask(GetInstance { id }).await)
    }

    /// Snapshot of every instance in insertion order
    ///
    /// # Errors
    /// Returns `CoreError::ActorError` if the store is not running
    pub async fn list_all(&self) -> Result<Vec<Instance>, CoreError> {
        self.store
            .ask(ListInstances)
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// # Errors
    /// Returns `CoreError::ActorError` if the store is not running
    pub async fn search(&self, keyword: &str) -> Result<Vec<Instance>, CoreError> {
        Ok(query::search(&self.list_all().await?, keyword))
    }

    /// # Errors
    /// Returns `CoreError::ActorError` if the store is not running
    pub async fn filter(&self, status: StatusFilter) -> Result<Vec<Instance>, CoreError> {
        Ok(query::filter(&self.list_all().await?, status))
    }

    /// # Errors
    /// Returns `CoreError::ActorError` if the store is not running
    pub async fn search_and_filter(
        &self,
        keyword: &str,
        status: StatusFilter,
    ) -> Result<Vec<Instance>, CoreError> {
        Ok(query::search_and_filter(&self.list_all().await?, keyword, status))
    }

    /// Run a query and count matches against the full snapshot
    ///
    /// # Errors
    /// Returns `CoreError::ActorError` if the store is not running
    pub async fn query(
        &self,
        query: &InstanceQuery,
    ) -> Result<(Vec<Instance>, ListSummary), CoreError> {
        let snapshot = self.list_all().await?;
        let visible = query.apply(&snapshot);
        let summary = ListSummary {
            visible: visible.len(),
            total: snapshot.len(),
        };
        Ok((visible, summary))
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Start an instance; `Deploying` is visible when this returns
    ///
    /// # Errors
    /// Returns `CoreError::Busy` or `CoreError::NotFound`
    pub async fn start(&self, id: InstanceId) -> Result<TransitionHandle, CoreError> {
        flatten(self.lifecycle.ask(Start { id }).await)
    }

    /// Stop an instance immediately
    ///
    /// # Errors
    /// Returns `CoreError::Busy` or `CoreError::NotFound`
    pub async fn stop(&self, id: InstanceId) -> Result<TransitionHandle, CoreError> {
        flatten(self.lifecycle.ask(Stop { id }).await)
    }

    /// Redeploy an instance; `Deploying` is visible when this returns
    ///
    /// # Errors
    /// Returns `CoreError::Busy` or `CoreError::NotFound`
    pub async fn redeploy(&self, id: InstanceId) -> Result<TransitionHandle, CoreError> {
        flatten(self.lifecycle.ask(Redeploy { id }).await)
    }

    /// Abort an in-flight start or redeploy
    ///
    /// # Errors
    /// Returns `CoreError::NotInFlight` if nothing is pending for the id
    pub async fn cancel(&self, id: InstanceId) -> Result<(), CoreError> {
        flatten(self.lifecycle.ask(Cancel { id }).await)
    }

    /// # Errors
    /// Returns `CoreError::ActorError` if the controller is not running
    pub async fn is_in_flight(&self, id: InstanceId) -> Result<bool, CoreError> {
        self.lifecycle
            .ask(IsInFlight { id })
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    // ------------------------------------------------------------------------
    // Logs
    // ------------------------------------------------------------------------

    /// Log lines for an existing instance
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the id is unknown
    pub async fn logs(&self, id: InstanceId) -> Result<Vec<String>, CoreError> {
        self.get(id).await?;
        Ok(self.logs.logs(id).await)
    }

    /// Stop both actors, failing any in-flight transitions
    pub async fn shutdown(&self) {
        self.lifecycle.stop_gracefully().await.ok();
        self.store.stop_gracefully().await.ok();
        info!("console shut down");
    }
}
