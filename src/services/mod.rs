//! Services module
//!
//! This module contains the engine's business logic services

pub mod approval;
pub mod auth;
pub mod dispatcher;
pub mod relay;
pub mod routing;

// Re-export commonly used services
pub use approval::ApprovalService;
pub use auth::AuthService;
pub use dispatcher::RelayDispatcher;
pub use relay::RelayService;
pub use routing::{Destination, Origin, RoutingService};

use std::sync::Arc;
use std::time::Duration;

use crate::config::settings::Settings;
use crate::storage::{IdentityStore, ReplyLinks};
use crate::transport::Transport;

/// Service factory for creating and wiring all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub approval_service: ApprovalService,
    pub routing_service: RoutingService,
    pub relay_service: RelayService,
    pub dispatcher: RelayDispatcher,
    pub reply_links: ReplyLinks,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(store: IdentityStore, transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        let auth_service = AuthService::new(store.clone());
        let approval_service = ApprovalService::new(store.clone(), auth_service.clone());
        let routing_service = RoutingService::new(store.clone());
        let relay_service = RelayService::new(
            store,
            auth_service.clone(),
            approval_service.clone(),
            routing_service.clone(),
        );
        let reply_links = ReplyLinks::new();
        let dispatcher = RelayDispatcher::new(
            relay_service.clone(),
            transport,
            reply_links.clone(),
            Duration::from_secs(settings.relay.send_timeout_seconds),
            settings.relay.queue_capacity,
            Duration::from_secs(settings.relay.worker_idle_seconds),
        );

        Self {
            auth_service,
            approval_service,
            routing_service,
            relay_service,
            dispatcher,
            reply_links,
        }
    }
}
