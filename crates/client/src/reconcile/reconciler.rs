//! Periodic task that drives tracked intent back into agreement with the server

use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    connection::{Connection, RegistryRequest},
    error::{ClientError, ClientResult},
};

use super::{
    intent::{IntentAction, RegistrationIntent, SubscriptionIntent},
    tracker::IntentTracker,
};

/// Replays divergent intent against the server on a fixed interval
///
/// One reconciler runs per client connection. A tick that overruns the
/// interval delays the next tick instead of overlapping it. Errors inside a
/// tick are logged and swallowed: the entry stays pending and the next tick
/// retries.
pub struct Reconciler<C: Connection> {
    tracker: Arc<IntentTracker>,
    connection: Arc<C>,
    config: ClientConfig,
}

impl<C: Connection> Reconciler<C> {
    /// Create a reconciler over the given tracker and connection
    pub fn new(tracker: Arc<IntentTracker>, connection: Arc<C>, config: ClientConfig) -> Self {
        Self {
            tracker,
            connection,
            config,
        }
    }

    /// Run the periodic loop until cancelled
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.config.reconcile_interval;
        let mut tick = interval_at(tokio::time::Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("reconciler started (interval {:?})", period);
        loop {
            tokio::select! {
                _ = tick.tick() => self.tick().await,
                _ = cancel.cancelled() => {
                    info!("reconciler stopped");
                    break;
                }
            }
        }
    }

    /// Run one reconcile pass
    ///
    /// Public so tests (and operators) can drive the loop deterministically.
    pub async fn tick(&self) {
        if !self.connection.is_connected() {
            debug!("skipping reconcile tick, connection is down");
            return;
        }

        for intent in self.tracker.pending_registrations() {
            if let Err(e) = self.reconcile_registration(&intent).await {
                warn!(
                    service = %intent.service,
                    "registration reconcile failed, will retry: {e}"
                );
            }
        }

        for intent in self.tracker.pending_subscriptions() {
            if let Err(e) = self.reconcile_subscription(&intent).await {
                warn!(
                    service = %intent.service,
                    clusters = %intent.clusters,
                    "subscription reconcile failed, will retry: {e}"
                );
            }
        }
    }

    async fn reconcile_registration(&self, intent: &RegistrationIntent) -> ClientResult<()> {
        match intent.flags.action() {
            IntentAction::Register => {
                if !self.connection.is_enabled() {
                    return Ok(());
                }
                self.request(RegistryRequest::Register {
                    service: intent.service.clone(),
                    payload: intent.payload.clone(),
                })
                .await?;
                self.tracker.confirm_registered(&intent.service);
                debug!(service = %intent.service, "registration replayed");
            }
            IntentAction::Deregister => {
                if !self.connection.is_enabled() {
                    return Ok(());
                }
                self.request(RegistryRequest::Deregister {
                    service: intent.service.clone(),
                    payload: intent.payload.clone(),
                })
                .await?;
                self.tracker.confirm_deregistered(&intent.service);
                debug!(service = %intent.service, "deregistration replayed");
            }
            IntentAction::Remove => {
                self.tracker.remove_registration(&intent.service);
                debug!(service = %intent.service, "drained registration swept");
            }
            IntentAction::None => {}
        }
        Ok(())
    }

    async fn reconcile_subscription(&self, intent: &SubscriptionIntent) -> ClientResult<()> {
        match intent.flags.action() {
            IntentAction::Register => {
                if !self.connection.is_enabled() {
                    return Ok(());
                }
                self.request(RegistryRequest::Subscribe {
                    service: intent.service.clone(),
                    clusters: intent.clusters.clone(),
                })
                .await?;
                self.tracker
                    .confirm_subscribed(&intent.service, &intent.clusters);
            }
            IntentAction::Deregister => {
                if !self.connection.is_enabled() {
                    return Ok(());
                }
                self.request(RegistryRequest::Unsubscribe {
                    service: intent.service.clone(),
                    clusters: intent.clusters.clone(),
                })
                .await?;
                self.tracker
                    .confirm_unsubscribed(&intent.service, &intent.clusters);
            }
            IntentAction::Remove => {
                self.tracker
                    .remove_subscription(&intent.service, &intent.clusters);
            }
            IntentAction::None => {}
        }
        Ok(())
    }

    async fn request(&self, request: RegistryRequest) -> ClientResult<()> {
        let duration = self.config.request_timeout;
        match timeout(duration, self.connection.request(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout { duration }),
        }
    }
}
