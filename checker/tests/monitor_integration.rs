//! Integration tests for owner check runs
//!
//! API nodes are served by wiremock, session nodes by a scripted shell, so a
//! run exercises registry lookup, transport, parsing, hysteresis and storage.

mod common;

use common::fixtures::test_config::TestConfig;
use common::fixtures::*;
use std::sync::Arc;
use std::time::Duration;

use node_checker::database::{Database, NodeStore};
use node_checker::health::{HealthMonitor, NodeType};
use node_checker::services::{Notifier, WebhookNotifier};

struct Harness {
    _config: TestConfig,
    db: TestDatabase,
    monitor: HealthMonitor,
    notifier: RecordingNotifier,
    connector: ScriptedConnector,
}

async fn harness(builder: TestConfigBuilder) -> Harness {
    let test_config = builder.build();
    let config = test_config.load().await;
    let db = TestDatabase::new().await.unwrap();
    let notifier = RecordingNotifier::new();
    let connector = ScriptedConnector::new();

    let store: Arc<dyn NodeStore> = db.database.clone();
    let monitor = HealthMonitor::from_config(
        &config,
        store,
        Arc::new(notifier.clone()),
        Arc::new(connector.clone()),
    )
    .unwrap();

    Harness {
        _config: test_config,
        db,
        monitor,
        notifier,
        connector,
    }
}

fn database(harness: &Harness) -> &Database {
    &harness.db.database
}

#[tokio::test]
async fn test_no_nodes() {
    let h = harness(TestConfigBuilder::new()).await;

    assert_eq!(h.monitor.check_nodes_now(OWNER, true).await.unwrap(), "No node exists");
    assert_eq!(h.monitor.check_nodes_cached(OWNER).await.unwrap(), "No node exists");
    assert_eq!(h.notifier.count().await, 0);
}

#[tokio::test]
async fn test_mixed_transports_report() {
    let h = harness(TestConfigBuilder::new()).await;
    let node_api = MockNodeServer::start().await;
    node_api.mock_minima(true, 4.0).await;
    h.connector
        .set_output("10.0.0.5", &massa_wallet_output(5, 3, "101.5"));

    let minima = database(&h)
        .insert_node(&new_api_node(
            OWNER,
            NodeType::Minima,
            &node_api.host(),
            node_api.port(),
        ))
        .await
        .unwrap();
    database(&h)
        .insert_node(&new_session_node(OWNER, NodeType::Massa, "10.0.0.5"))
        .await
        .unwrap();

    let report = h.monitor.check_nodes_now(OWNER, true).await.unwrap();

    let expected = format!(
        "1. massa 10.0.0.5@root (true, Node is OK, rolls active: 5, rolls candidate: 3, balance: 101.5)\n\
         2. minima {}:{} (true, Node is OK, rewards: 4)\n\
         \n\
         All metrics: massa=101.5, minima=4",
        node_api.host(),
        node_api.port()
    );
    assert_eq!(report, expected);

    // Healthy first checks are not a change worth reporting
    assert_eq!(h.notifier.count().await, 0);
    assert_eq!(h.connector.typed(), vec!["wallet_info".to_string()]);

    let history = database(&h).get_check_history(minima.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].verdict.is_ok());
}

#[tokio::test]
async fn test_session_escalation_and_terminal() {
    let h = harness(TestConfigBuilder::new()).await;
    h.connector.set_output("10.0.0.7", STARKNET_RUNNING);

    let mut node = new_session_node(OWNER, NodeType::Starknet, "10.0.0.7");
    node.use_sudo = true;
    node.terminal_name = Some("starknet".to_string());
    database(&h).insert_node(&node).await.unwrap();

    let report = h.monitor.check_nodes_now(OWNER, false).await.unwrap();
    assert!(report.starts_with("1. starknet 10.0.0.7@root (true, Node is OK, active (running))"));

    assert_eq!(
        h.connector.typed(),
        vec![
            "sudo su".to_string(),
            "s3cret".to_string(),
            "screen -dr starknet".to_string(),
            "systemctl status starknetd | grep Active".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_failures_are_contained() {
    let h = harness(TestConfigBuilder::new()).await;
    let node_api = MockNodeServer::start().await;
    node_api.mock_status_code("/status", 503).await;

    database(&h)
        .insert_node(&new_api_node(
            OWNER,
            NodeType::Cosmos,
            &node_api.host(),
            node_api.port(),
        ))
        .await
        .unwrap();
    // No scripted output: the connector refuses the session
    database(&h)
        .insert_node(&new_session_node(OWNER, NodeType::Massa, "10.0.0.99"))
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO nodes (owner_id, node_type, host, port, use_sudo, created_at) VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(OWNER)
    .bind("solana")
    .bind("10.0.0.8")
    .bind(8899i64)
    .bind(chrono::Utc::now())
    .execute(h.db.pool())
    .await
    .unwrap();

    let report = h.monitor.check_nodes_now(OWNER, true).await.unwrap();
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines[0], "1. solana 10.0.0.8:8899 (false, Unsupported node type 'solana')");
    assert!(lines[1].starts_with("2. massa 10.0.0.99@root (false, Wrong ssh answer"));
    assert!(lines[1].contains("No route to host"));
    assert!(lines[2].ends_with("(false, Wrong request answer code 503)"));
    assert_eq!(lines.last(), Some(&"All metrics: cosmos=0, massa=0, solana=0"));
}

#[tokio::test]
async fn test_status_change_notified_after_confirmation() {
    let h = harness(TestConfigBuilder::new().with_hysteresis(2, 3)).await;
    let node_api = MockNodeServer::start().await;
    node_api.mock_minima(false, 0.0).await;

    database(&h)
        .insert_node(&new_api_node(
            OWNER,
            NodeType::Minima,
            &node_api.host(),
            node_api.port(),
        ))
        .await
        .unwrap();
    let describe = format!("{}:{}", node_api.host(), node_api.port());

    // First failure is not confirmed yet
    h.monitor.check_nodes_now(OWNER, true).await.unwrap();
    assert_eq!(h.notifier.count().await, 0);

    h.monitor.check_nodes_now(OWNER, true).await.unwrap();
    let messages = h.notifier.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, OWNER);
    assert_eq!(
        messages[0].1,
        format!(
            "Nodes status changed!\n1. minima {} (false, Node status is not true false)",
            describe
        )
    );

    // Still down: nothing new to say
    h.monitor.check_nodes_now(OWNER, true).await.unwrap();
    assert_eq!(h.notifier.count().await, 1);

    node_api.reset().await;
    node_api.mock_minima(true, 2.5).await;

    h.monitor.check_nodes_now(OWNER, true).await.unwrap();
    h.monitor.check_nodes_now(OWNER, true).await.unwrap();
    assert_eq!(h.notifier.count().await, 1);

    h.monitor.check_nodes_now(OWNER, true).await.unwrap();
    let messages = h.notifier.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[1].1,
        format!(
            "Nodes status changed!\n1. minima {} (true, Node is OK, rewards: 2.5)",
            describe
        )
    );
}

#[tokio::test]
async fn test_changes_not_sent_when_disabled() {
    let h = harness(TestConfigBuilder::new().with_hysteresis(1, 1)).await;
    let node_api = MockNodeServer::start().await;
    node_api.mock_minima(false, 0.0).await;

    database(&h)
        .insert_node(&new_api_node(
            OWNER,
            NodeType::Minima,
            &node_api.host(),
            node_api.port(),
        ))
        .await
        .unwrap();

    h.monitor.check_nodes_now(OWNER, false).await.unwrap();
    assert_eq!(h.notifier.count().await, 0);

    // The change was still recorded as surfaced
    let node = &database(&h).list_nodes(OWNER).await.unwrap()[0];
    assert_eq!(node.state.last_notified_ok, Some(false));
}

#[tokio::test]
async fn test_cached_report_uses_stored_status() {
    let h = harness(TestConfigBuilder::new().with_timezone("Europe/Berlin")).await;
    let node_api = MockNodeServer::start().await;
    node_api.mock_cosmos_status(false, 1234).await;

    database(&h)
        .insert_node(&new_api_node(
            OWNER,
            NodeType::Cosmos,
            &node_api.host(),
            node_api.port(),
        ))
        .await
        .unwrap();
    database(&h)
        .insert_node(&new_session_node(OWNER, NodeType::Massa, "10.0.0.5"))
        .await
        .unwrap();

    let cached = h.monitor.check_nodes_cached(OWNER).await.unwrap();
    assert!(cached.contains("1. massa 10.0.0.5@root (not checked yet)"));

    h.connector
        .set_output("10.0.0.5", &massa_wallet_output(2, 2, "7"));
    h.monitor.check_nodes_now(OWNER, false).await.unwrap();

    // The node is not contacted for a cached report
    node_api.reset().await;
    let cached = h.monitor.check_nodes_cached(OWNER).await.unwrap();
    let lines: Vec<&str> = cached.lines().collect();

    assert!(lines[0].starts_with("Checked at "));
    assert!(cached.contains("1. massa 10.0.0.5@root (true, Node is OK, rolls active: 2, rolls candidate: 2, balance: 7)"));
    assert!(cached.contains("(true, Node is OK, latest_block_height: 1234)"));
    assert!(cached.ends_with("All metrics: cosmos=0, massa=7"));
}

#[tokio::test]
async fn test_aptos_cross_check_against_reference() {
    let ledger = MockNodeServer::start().await;
    ledger.mock_ledger(1_000_050).await;
    let h = harness(TestConfigBuilder::new().with_aptos_ledger(&format!("{}/", ledger.base_url))).await;

    let node_api = MockNodeServer::start().await;
    node_api.mock_aptos_metrics(1_000_000, 1_000_000).await;
    database(&h)
        .insert_node(&new_api_node(
            OWNER,
            NodeType::Aptos,
            &node_api.host(),
            node_api.port(),
        ))
        .await
        .unwrap();

    let report = h.monitor.check_nodes_now(OWNER, false).await.unwrap();
    assert!(report.contains("(false, Something wrong in sync process, ledger 1000050, synced 1000000)"));
}

#[tokio::test]
async fn test_sweep_and_daily_reports_cover_every_owner() {
    let h = harness(TestConfigBuilder::new()).await;
    h.connector.set_output("10.0.0.7", STARKNET_RUNNING);

    database(&h)
        .insert_node(&new_session_node(OWNER, NodeType::Starknet, "10.0.0.7"))
        .await
        .unwrap();
    database(&h)
        .insert_node(&new_session_node(OTHER_OWNER, NodeType::Starknet, "10.0.0.7"))
        .await
        .unwrap();

    h.monitor.check_all_owners(true).await.unwrap();
    h.monitor.send_daily_reports().await.unwrap();

    let messages = h.notifier.messages().await;
    let owners: Vec<i64> = messages.iter().map(|(owner, _)| *owner).collect();
    assert_eq!(owners, vec![OWNER, OTHER_OWNER]);
    for (_, text) in messages {
        assert!(text.contains("(true, Node is OK, active (running))"));
        assert!(text.ends_with("All metrics: starknet=0"));
    }
}

#[tokio::test]
async fn test_webhook_delivery() {
    let webhook = MockWebhookServer::start().await;
    webhook.mock_success().await;

    let notifier = WebhookNotifier::new(webhook.webhook_url());
    notifier
        .send(OWNER, "Nodes status changed!\n1. minima 10.0.0.1:9002 (false, x)")
        .await
        .unwrap();

    let bodies = webhook.received_bodies().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["owner_id"], OWNER);
    assert_eq!(
        bodies[0]["text"],
        "Nodes status changed!\n1. minima 10.0.0.1:9002 (false, x)"
    );
}

#[tokio::test]
async fn test_webhook_failure_is_an_error() {
    let webhook = MockWebhookServer::start().await;
    webhook.mock_failure(500).await;

    let notifier = WebhookNotifier::new(webhook.webhook_url());
    assert!(notifier.send(OWNER, "report").await.is_err());
}

#[tokio::test]
async fn test_concurrent_runs_for_one_owner_serialize() {
    let h = harness(TestConfigBuilder::new()).await;
    let node_api = MockNodeServer::start().await;
    node_api
        .mock_minima_delayed(true, 1.0, Duration::from_millis(300))
        .await;

    let node = database(&h)
        .insert_node(&new_api_node(
            OWNER,
            NodeType::Minima,
            &node_api.host(),
            node_api.port(),
        ))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        h.monitor.check_nodes_now(OWNER, false),
        h.monitor.check_nodes_now(OWNER, false)
    );
    first.unwrap();
    second.unwrap();

    // The second run saw the state saved by the first one
    let stored = database(&h).get_node(node.id).await.unwrap().unwrap();
    assert_eq!(stored.state.consecutive_same_count, 1);

    let history = database(&h).get_check_history(node.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_garbled_session_reply_is_reported_as_parse_failure() {
    let h = harness(TestConfigBuilder::new()).await;
    h.connector
        .set_output("10.0.0.5", "root@massa:~# wallet_info\r\nError: wallet locked\r\nroot@massa:~# ");

    database(&h)
        .insert_node(&new_session_node(OWNER, NodeType::Massa, "10.0.0.5"))
        .await
        .unwrap();

    let report = h.monitor.check_nodes_now(OWNER, false).await.unwrap();
    assert!(report.starts_with(
        "1. massa 10.0.0.5@root (false, Wrong ssh answer parsing Wrong active rolls reply)"
    ));
}
