use clap::{Parser, ValueEnum};
use crate::error::ConfigError;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v22.0";
pub const DEFAULT_FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

// CLI argument structure, every field can come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "wa-dialog-gateway")]
#[command(about = "WhatsApp webhook bridged to Dialogflow CX")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "WHATSAPP_ACCESS_TOKEN", hide_env_values = true)]
    pub whatsapp_access_token: String,

    // Secret echoed by the platform on the GET handshake
    #[arg(long, env = "WHATSAPP_VERIFICATION_TOKEN", hide_env_values = true)]
    pub whatsapp_verification_token: String,

    #[arg(long, env = "WHATSAPP_PHONE_NUMBER_ID")]
    pub whatsapp_phone_number_id: String,

    // App secret for X-Hub-Signature-256, unchecked when absent
    #[arg(long, env = "WHATSAPP_APP_SECRET", hide_env_values = true)]
    pub whatsapp_app_secret: Option<String>,

    #[arg(long, env = "WHATSAPP_API_BASE", default_value = DEFAULT_GRAPH_API_BASE)]
    pub graph_api_base: String,

    #[arg(long, env = "DIALOGFLOW_PROJECT")]
    pub dialogflow_project: String,

    #[arg(long, env = "DIALOGFLOW_AGENT_ID")]
    pub dialogflow_agent_id: String,

    #[arg(long, env = "DIALOGFLOW_LOCATION")]
    pub dialogflow_location: String,

    // Defaults to the regional endpoint of the location
    #[arg(long, env = "DIALOGFLOW_ENDPOINT")]
    pub dialogflow_endpoint: Option<String>,

    #[arg(long, env = "DIALOGFLOW_ACCESS_TOKEN", hide_env_values = true)]
    pub dialogflow_access_token: Option<String>,

    #[arg(long, env = "FIRESTORE_PROJECT_ID")]
    pub firestore_project_id: Option<String>,

    #[arg(long, env = "FIRESTORE_ACCESS_TOKEN", hide_env_values = true)]
    pub firestore_access_token: Option<String>,

    #[arg(long, env = "FIRESTORE_API_BASE", default_value = DEFAULT_FIRESTORE_BASE)]
    pub firestore_base: String,

    // Where rate-limit records and users live
    #[arg(long, env = "DOCUMENT_STORE", value_enum, default_value_t = StoreBackend::Firestore)]
    pub store: StoreBackend,

    // Create a users/{id} document for unknown senders
    #[arg(long, env = "REGISTER_USERS", action = clap::ArgAction::Set, default_value_t = false)]
    pub register_users: bool,

    #[arg(long, env = "RATE_LIMIT_ENABLED", action = clap::ArgAction::Set, default_value_t = true)]
    pub rate_limit_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub base: String,
    pub project_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct DialogflowConfig {
    pub endpoint: String,
    pub project: String,
    pub location: String,
    pub agent_id: String,
    pub access_token: Option<String>,
}

/// Settings resolved once at start-up and handed to each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub access_token: String,
    pub verification_token: String,
    pub phone_number_id: String,
    pub app_secret: Option<String>,
    pub graph_api_base: String,
    pub dialogflow: DialogflowConfig,
    /// `None` selects the in-memory store.
    pub firestore: Option<FirestoreConfig>,
    pub register_users: bool,
    pub rate_limit_enabled: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let firestore = match args.store {
            StoreBackend::Memory => None,
            StoreBackend::Firestore => Some(FirestoreConfig {
                base: trim_base(&args.firestore_base),
                project_id: non_empty(args.firestore_project_id, "FIRESTORE_PROJECT_ID")?,
                access_token: non_empty(args.firestore_access_token, "FIRESTORE_ACCESS_TOKEN")?,
            }),
        };

        let endpoint = args
            .dialogflow_endpoint
            .map(|e| trim_base(&e))
            .unwrap_or_else(|| {
                format!("https://{}-dialogflow.googleapis.com", args.dialogflow_location)
            });

        Ok(Self {
            port: args.port,
            access_token: args.whatsapp_access_token,
            verification_token: args.whatsapp_verification_token,
            phone_number_id: args.whatsapp_phone_number_id,
            app_secret: args.whatsapp_app_secret.filter(|s| !s.is_empty()),
            graph_api_base: trim_base(&args.graph_api_base),
            dialogflow: DialogflowConfig {
                endpoint,
                project: args.dialogflow_project,
                location: args.dialogflow_location,
                agent_id: args.dialogflow_agent_id,
                access_token: args.dialogflow_access_token.filter(|s| !s.is_empty()),
            },
            firestore,
            register_users: args.register_users,
            rate_limit_enabled: args.rate_limit_enabled,
        })
    }
}

fn non_empty(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "wa-dialog-gateway",
            "--whatsapp-access-token", "wa-token",
            "--whatsapp-verification-token", "secret",
            "--whatsapp-phone-number-id", "1234",
            "--dialogflow-project", "proj",
            "--dialogflow-agent-id", "agent",
            "--dialogflow-location", "us-central1",
        ]
    }

    #[test]
    fn memory_store_needs_no_firestore_settings() {
        let mut argv = base_args();
        argv.extend(["--store", "memory"]);
        let config = Config::from_args(Args::try_parse_from(argv).unwrap()).unwrap();

        assert!(config.firestore.is_none());
        assert_eq!(config.dialogflow.endpoint, "https://us-central1-dialogflow.googleapis.com");
        assert_eq!(config.graph_api_base, DEFAULT_GRAPH_API_BASE);
        assert!(config.rate_limit_enabled);
        assert!(!config.register_users);
    }

    #[test]
    fn firestore_store_requires_project_and_token() {
        let mut argv = base_args();
        argv.extend(["--store", "firestore", "--firestore-project-id", "p"]);
        let err = Config::from_args(Args::try_parse_from(argv).unwrap()).unwrap_err();

        assert_eq!(err, ConfigError::Missing("FIRESTORE_ACCESS_TOKEN"));
    }

    #[test]
    fn trailing_slashes_are_dropped_from_bases() {
        let mut argv = base_args();
        argv.extend([
            "--store", "memory",
            "--dialogflow-endpoint", "http://127.0.0.1:9000/",
            "--graph-api-base", "http://127.0.0.1:9001/v22.0/",
            "--register-users", "true",
        ]);
        let config = Config::from_args(Args::try_parse_from(argv).unwrap()).unwrap();

        assert_eq!(config.dialogflow.endpoint, "http://127.0.0.1:9000");
        assert_eq!(config.graph_api_base, "http://127.0.0.1:9001/v22.0");
        assert!(config.register_users);
    }
}
