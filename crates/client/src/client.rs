//! Registry-client facade
//!
//! Ties the intent tracker, the reconciler and the connection together. Every
//! write declares intent first and then makes one synchronous attempt: its
//! outcome is reported to the caller, but a failure never forgets the intent —
//! the reconciler replays it until the server agrees.

use std::sync::Arc;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use roster_types::{Instance, RegistrationPayload, ServiceKey};

use crate::{
    config::ClientConfig,
    connection::{Connection, ConnectionEventListener, RegistryRequest},
    error::{ClientError, ClientResult},
    reconcile::{IntentTracker, Reconciler},
};

/// Client handle for a registry server
pub struct RegistryClient<C: Connection> {
    connection: Arc<C>,
    tracker: Arc<IntentTracker>,
    reconciler: Arc<Reconciler<C>>,
    config: ClientConfig,
    cancel: CancellationToken,
}

impl<C: Connection + 'static> RegistryClient<C> {
    /// Create a client over the given connection
    pub fn new(connection: Arc<C>, config: ClientConfig) -> Self {
        let tracker = Arc::new(IntentTracker::new());
        let reconciler = Arc::new(Reconciler::new(
            tracker.clone(),
            connection.clone(),
            config.clone(),
        ));
        Self {
            connection,
            tracker,
            reconciler,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the background reconciler
    pub fn start(&self) {
        info!("starting registry client");
        tokio::spawn(self.reconciler.clone().run(self.cancel.child_token()));
    }

    /// Stop the reconciler and drop all tracked intent
    pub fn shutdown(&self) {
        info!("shutting down registry client");
        self.cancel.cancel();
        self.tracker.shutdown();
    }

    /// The tracker, for confirmation polling and transport event wiring
    ///
    /// The transport must deliver its connect/disconnect events to this
    /// tracker (it implements [`ConnectionEventListener`]).
    pub fn tracker(&self) -> &Arc<IntentTracker> {
        &self.tracker
    }

    /// The tracker as a connection-event listener, for transport wiring
    pub fn connection_listener(&self) -> Arc<dyn ConnectionEventListener> {
        self.tracker.clone()
    }

    /// Register a single instance under a service
    pub async fn register(&self, service: &ServiceKey, instance: Instance) -> ClientResult<()> {
        self.register_payload(service, RegistrationPayload::Single(instance))
            .await
    }

    /// Register a batch of instances under a service
    ///
    /// The batch replaces the service's whole instance set for this client.
    pub async fn register_batch(
        &self,
        service: &ServiceKey,
        instances: Vec<Instance>,
    ) -> ClientResult<()> {
        self.register_payload(service, RegistrationPayload::Batch(instances))
            .await
    }

    async fn register_payload(
        &self,
        service: &ServiceKey,
        payload: RegistrationPayload,
    ) -> ClientResult<()> {
        self.tracker.declare_register(service, payload.clone());
        self.request(RegistryRequest::Register {
            service: service.clone(),
            payload,
        })
        .await?;
        self.tracker.confirm_registered(service);
        debug!(service = %service, "instance registered");
        Ok(())
    }

    /// Deregister a single instance from a service
    pub async fn deregister(&self, service: &ServiceKey, instance: Instance) -> ClientResult<()> {
        self.deregister_payload(service, RegistrationPayload::Single(instance))
            .await
    }

    /// Deregister a batch of instances from a service
    pub async fn deregister_batch(
        &self,
        service: &ServiceKey,
        instances: Vec<Instance>,
    ) -> ClientResult<()> {
        self.deregister_payload(service, RegistrationPayload::Batch(instances))
            .await
    }

    async fn deregister_payload(
        &self,
        service: &ServiceKey,
        payload: RegistrationPayload,
    ) -> ClientResult<()> {
        self.tracker.declare_deregister(service);
        self.request(RegistryRequest::Deregister {
            service: service.clone(),
            payload,
        })
        .await?;
        self.tracker.confirm_deregistered(service);
        debug!(service = %service, "instance deregistered");
        Ok(())
    }

    /// Subscribe to a service's instance-set changes
    pub async fn subscribe(&self, service: &ServiceKey, clusters: &str) -> ClientResult<()> {
        self.tracker.declare_subscribe(service, clusters);
        self.request(RegistryRequest::Subscribe {
            service: service.clone(),
            clusters: clusters.to_string(),
        })
        .await?;
        self.tracker.confirm_subscribed(service, clusters);
        debug!(service = %service, clusters, "subscribed");
        Ok(())
    }

    /// Drop a subscription
    pub async fn unsubscribe(&self, service: &ServiceKey, clusters: &str) -> ClientResult<()> {
        self.tracker.declare_unsubscribe(service, clusters);
        self.request(RegistryRequest::Unsubscribe {
            service: service.clone(),
            clusters: clusters.to_string(),
        })
        .await?;
        self.tracker.confirm_unsubscribed(service, clusters);
        debug!(service = %service, clusters, "unsubscribed");
        Ok(())
    }

    /// Whether the server has confirmed a subscription
    pub fn is_subscribed(&self, service: &ServiceKey, clusters: &str) -> bool {
        self.tracker.is_subscribed(service, clusters)
    }

    /// Whether the server has confirmed a registration
    ///
    /// Callers needing strong confirmation poll this; the reconciler keeps
    /// working toward the declared intent either way.
    pub fn is_registered(&self, service: &ServiceKey) -> bool {
        self.tracker
            .registration(service)
            .map(|intent| intent.flags.confirmed_registered)
            .unwrap_or(false)
    }

    async fn request(&self, request: RegistryRequest) -> ClientResult<()> {
        let duration = self.config.request_timeout;
        match timeout(duration, self.connection.request(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout { duration }),
        }
    }
}
