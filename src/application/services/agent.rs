//! Agent - wires the transport, action queue, plugin manager and router
//! together and drives them from the transport's event stream.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::errors::BotError;
use crate::application::events::{AgentEvent, EventBus};
use crate::application::messaging::Router;
use crate::application::queue::{ActionQueue, TransportResolver};
use crate::application::services::Actions;
use crate::domain::traits::{Store, Transport, TransportEvent};
use crate::infrastructure::config::{Config, ConfigSource};
use crate::infrastructure::plugins::PluginCatalog;
use crate::plugins::PluginManager;

pub struct Agent {
    transport: Arc<dyn Transport>,
    events: EventBus,
    actions: Actions,
    plugins: Arc<PluginManager>,
    router: Arc<Router>,
    store: Option<Arc<dyn Store>>,
}

impl Agent {
    pub fn new(
        transport: Arc<dyn Transport>,
        catalog: PluginCatalog,
        source: ConfigSource,
        config: Config,
        store: Option<Arc<dyn Store>>,
    ) -> Self {
        let events = EventBus::new();
        let queue = Arc::new(ActionQueue::new(
            Arc::new(TransportResolver(transport.clone())),
            events.clone(),
        ));
        let actions = Actions::new(transport.clone(), queue);
        let plugins = Arc::new(PluginManager::new(
            catalog,
            source,
            config,
            store.clone(),
            events.clone(),
        ));
        let router = Arc::new(Router::new(actions.clone(), plugins.clone(), events.clone()));

        Self {
            transport,
            events,
            actions,
            plugins,
            router,
            store,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn plugins(&self) -> &Arc<PluginManager> {
        &self.plugins
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Connect and process transport events until the session ends
    pub async fn run(&self) -> Result<(), BotError> {
        let mut session = self.transport.connect().await?;

        while let Some(event) = session.recv().await {
            match event {
                TransportEvent::Connected(user) => {
                    info!("Connected as {}", user.display_name());
                    self.events.emit(AgentEvent::Connected { user });

                    let report = self.plugins.reload().await;
                    info!(
                        "Ready with {} plugin(s), {} failed",
                        report.succeeded.len(),
                        report.failed.len()
                    );
                    self.events.emit(AgentEvent::Ready);
                }
                TransportEvent::Message(message) => self.router.dispatch(message),
                TransportEvent::Error(e) => {
                    warn!("Transport error: {}", e);
                    self.events.report(e);
                }
                TransportEvent::Disconnected => break,
            }
        }

        info!("Session ended");
        self.events.emit(AgentEvent::End);
        Ok(())
    }

    /// Unload every plugin, release the store and close the session
    pub async fn stop(&self) -> Result<(), BotError> {
        info!("Shutting down");
        let report = self.plugins.unload_all().await;
        if !report.is_clean() {
            warn!("{} plugin(s) failed to unload cleanly", report.failed.len());
        }

        if let Some(store) = &self.store {
            store.close().await?;
        }
        self.transport.disconnect().await
    }
}
