//! Common test data and constants

use secrecy::SecretString;
use serde_json::Value;

use node_checker::database::NewNode;
use node_checker::health::NodeType;
use node_checker::services::node_service::{AddNodeRequest, ParamValue};

pub const OWNER: i64 = 1001;
pub const OTHER_OWNER: i64 = 2002;

/// `wallet_info` as it arrives through a terminal
pub fn massa_wallet_output(active: i64, candidate: i64, balance: &str) -> String {
    format!(
        "\x1b]0;root@massa: ~\x07root@massa:~# wallet_info\r\n\
         Address: AU12xyz (thread 7):\r\n\
         \x1b[1mFinal balance:\x1b[0m {}\r\n\
         Candidate rolls: {}\r\n\
         Active rolls: {}\r\n\
         root@massa:~# ",
        balance, candidate, active
    )
}

pub const STARKNET_RUNNING: &str =
    "     Active: active (running) since Tue 2024-03-05 08:00:00 UTC; 1 day ago\r\n";

pub fn api_request(node_type: &str, host: &str, port: u16) -> AddNodeRequest {
    AddNodeRequest {
        node_type: node_type.to_string(),
        host: host.to_string(),
        port: Some(ParamValue::Number(i64::from(port))),
        ..Default::default()
    }
}

pub fn session_request(node_type: &str, host: &str) -> AddNodeRequest {
    AddNodeRequest {
        node_type: node_type.to_string(),
        host: host.to_string(),
        ssh_user: Some("root".to_string()),
        ssh_credential: Some("s3cret".to_string()),
        ..Default::default()
    }
}

pub fn new_api_node(owner_id: i64, node_type: NodeType, host: &str, port: u16) -> NewNode {
    NewNode {
        owner_id,
        node_type,
        host: host.to_string(),
        port: Some(port),
        ssh_user: None,
        ssh_credential: None,
        terminal_name: None,
        use_sudo: false,
    }
}

pub fn new_session_node(owner_id: i64, node_type: NodeType, host: &str) -> NewNode {
    NewNode {
        owner_id,
        node_type,
        host: host.to_string(),
        port: None,
        ssh_user: Some("root".to_string()),
        ssh_credential: Some(SecretString::from("s3cret")),
        terminal_name: None,
        use_sudo: false,
    }
}

/// Catalogue page embedding `projects` the way nodes.guru does
pub fn project_page(projects: &Value) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Nodes Guru</title></head><body>\
         <div id=\"__next\"></div>\
         <script id=\"__NEXT_DATA__\" type=\"application/json\">\
         {{\"props\":{{\"pageProps\":{{\"projects\":{}}}}},\"page\":\"/\"}}\
         </script></body></html>",
        projects
    )
}
