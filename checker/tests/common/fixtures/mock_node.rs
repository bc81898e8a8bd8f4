//! Mock node API for testing API-transport checks
//!
//! Serves the endpoints the checker probes without requiring a real node.

use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockNodeServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockNodeServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    pub fn host(&self) -> String {
        self.server.address().ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    /// Minima `/incentivecash` with the given status and daily reward
    pub async fn mock_minima(&self, status: bool, daily_rewards: f64) {
        self.mock_minima_delayed(status, daily_rewards, Duration::ZERO)
            .await;
    }

    /// Like [`Self::mock_minima`], answering only after `delay`
    pub async fn mock_minima_delayed(&self, status: bool, daily_rewards: f64, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/incentivecash"))
            .respond_with(ResponseTemplate::new(200).set_delay(delay).set_body_json(json!({
                "command": "incentivecash",
                "status": status,
                "response": {
                    "uid": "0xABCDEF",
                    "details": {
                        "rewards": {
                            "dailyRewards": daily_rewards,
                            "previousRewards": 0,
                            "communityRewards": 0,
                            "inviterRewards": 0
                        }
                    }
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Tendermint `/status`
    pub async fn mock_cosmos_status(&self, catching_up: bool, latest_block: u64) {
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": -1,
                "result": {
                    "node_info": { "network": "cosmoshub-4", "moniker": "test-node" },
                    "sync_info": {
                        "latest_block_height": latest_block.to_string(),
                        "catching_up": catching_up
                    }
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Prometheus `/metrics` of an aptos node
    pub async fn mock_aptos_metrics(&self, applied: i64, synced: i64) {
        let body = format!(
            "# TYPE aptos_state_sync_version gauge\n\
             aptos_state_sync_version{{type=\"applied_transaction_outputs\"}} {}\n\
             aptos_state_sync_version{{type=\"synced\"}} {}\n",
            applied, synced
        );
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Reference ledger root document
    pub async fn mock_ledger(&self, ledger_version: i64) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chain_id": 4,
                "ledger_version": ledger_version.to_string()
            })))
            .mount(&self.server)
            .await;
    }

    /// Plain HTML page at `endpoint`
    pub async fn mock_html(&self, endpoint: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string(body),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_status_code(&self, endpoint: &str, status_code: u16) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status_code))
            .mount(&self.server)
            .await;
    }

    /// Drop every mounted response
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
