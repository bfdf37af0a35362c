//! Configuration distribution for enrolled nodes.

use std::sync::Arc;

use biff_core::NodeConfig;
use biff_state::{EnrollmentLookup, EnrollmentStore};
use tracing::{debug, warn};

use crate::error::ProtocolResult;
use crate::messages::{ConfigurationRequest, ConfigurationResponse};

/// Handles `/configuration`. Read-only over the enrollment store.
///
/// Every enrolled node gets the same server-wide [`NodeConfig`].
#[derive(Clone)]
pub struct ConfigurationDistributor {
    store: EnrollmentStore,
    config: Arc<NodeConfig>,
}

impl ConfigurationDistributor {
    pub fn new(store: EnrollmentStore, config: NodeConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Resolve the presented node key and return its configuration, or
    /// [`ConfigurationResponse::invalid_node`] if the key is unknown.
    pub fn get_configuration(
        &self,
        request: ConfigurationRequest,
    ) -> ProtocolResult<ConfigurationResponse> {
        let Some(node_key) = request.node_key.filter(|key| !key.is_empty()) else {
            warn!("configuration request without node key");
            return Ok(ConfigurationResponse::invalid_node());
        };

        match self.store.find(EnrollmentLookup::ByNodeKey(&node_key))? {
            Some(enrollment) => {
                debug!(
                    id = enrollment.id,
                    host_identifier = %enrollment.host_identifier,
                    "configuration served"
                );
                Ok(ConfigurationResponse {
                    schedule: self.config.schedule.clone(),
                    options: self.config.options.clone(),
                    node_invalid: false,
                })
            }
            None => {
                warn!("configuration request with unknown node key");
                Ok(ConfigurationResponse::invalid_node())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biff_core::{Schedule, ScheduledQuery};
    use serde_json::json;

    fn node_config() -> NodeConfig {
        let mut schedule = Schedule::new();
        schedule.insert(
            "time".to_string(),
            ScheduledQuery::new("SELECT * FROM time;", 60, "clock"),
        );
        NodeConfig {
            schedule,
            options: Default::default(),
        }
    }

    fn setup() -> (ConfigurationDistributor, EnrollmentStore) {
        let store = EnrollmentStore::open_in_memory().unwrap();
        let distributor = ConfigurationDistributor::new(store.clone(), node_config());
        (distributor, store)
    }

    fn request(node_key: Option<&str>) -> ConfigurationRequest {
        ConfigurationRequest {
            node_key: node_key.map(str::to_string),
        }
    }

    #[test]
    fn enrolled_node_gets_schedule() {
        let (distributor, store) = setup();
        store.insert(21, "H1", &json!({}), "key-1").unwrap();

        let resp = distributor.get_configuration(request(Some("key-1"))).unwrap();
        assert!(!resp.node_invalid);
        assert_eq!(resp.schedule, node_config().schedule);
    }

    #[test]
    fn unknown_keys_are_invalid_nodes() {
        let (distributor, store) = setup();
        store.insert(21, "H1", &json!({}), "key-1").unwrap();

        for key in [Some("made_up_key"), Some(""), None, Some("key-1 ")] {
            let resp = distributor.get_configuration(request(key)).unwrap();
            assert_eq!(resp, ConfigurationResponse::invalid_node());
        }
    }

    #[test]
    fn repeated_fetches_are_identical() {
        let (distributor, store) = setup();
        store.insert(21, "H1", &json!({}), "key-1").unwrap();

        let first = distributor.get_configuration(request(Some("key-1"))).unwrap();
        let second = distributor.get_configuration(request(Some("key-1"))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn options_are_passed_through() {
        let store = EnrollmentStore::open_in_memory().unwrap();
        let mut config = node_config();
        config
            .options
            .insert("distributed_interval".to_string(), json!(60));
        let distributor = ConfigurationDistributor::new(store.clone(), config);
        store.insert(21, "H1", &json!({}), "key-1").unwrap();

        let resp = distributor.get_configuration(request(Some("key-1"))).unwrap();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["options"]["distributed_interval"], 60);
        assert_eq!(json["schedule"]["time"]["interval"], "60");
        assert_eq!(json["node_invalid"], false);
    }
}
