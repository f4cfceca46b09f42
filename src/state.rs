use std::sync::Arc;

use crate::config::Config;
use crate::dialog::{ConversationBridge, DialogflowCx};
use crate::dispatch::Dispatcher;
use crate::notifier::WhatsAppNotifier;
use crate::rate_limit::RateLimiter;
use crate::registry::UserRegistry;
use crate::store;

// app's shared state
pub struct AppState {
    pub verification_token: String,
    pub app_secret: Option<String>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: &Config, dispatcher: Dispatcher) -> Self {
        Self {
            verification_token: config.verification_token.clone(),
            app_secret: config.app_secret.clone(),
            dispatcher,
        }
    }

    // Wire the real collaborators; one HTTP client shared by all of them
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::new();
        let store = store::from_config(config, client.clone());

        let bridge = ConversationBridge::new(Arc::new(DialogflowCx::new(client.clone(), &config.dialogflow)));
        let notifier = Arc::new(WhatsAppNotifier::new(client, config));

        let mut dispatcher = Dispatcher::new(bridge, notifier);
        if config.register_users {
            dispatcher = dispatcher.with_registry(UserRegistry::new(store.clone()));
        }
        if config.rate_limit_enabled {
            dispatcher = dispatcher.with_rate_limiter(RateLimiter::new(store));
        }

        Self::new(config, dispatcher)
    }
}
