//! Full collection against mocked web sources and an unreachable database

use std::fs;

use circ_collector::{Collector, ReconcileDate, config::parse_config};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FRAMESET: &str = r#"<html><frameset rows="10%,*">
  <frameset cols="*"><frame src="banner.html"></frameset>
  <frameset cols="25%,*">
    <frame src="menu.html">
    <frame src="stats/table.html">
  </frameset>
</frameset></html>"#;

const TABLE: &str = r#"<html><body>
  <center>Statewide lending</center>
  <center><table>
    <tr><td>Daily lending</td></tr>
    <tr><td>Lender</td><td>Total</td><td>zv001</td><td>zv052</td></tr>
    <tr><td>zv001 Alpha</td><td></td><td>7</td><td>11</td></tr>
    <tr><td>zv052 Canton</td><td></td><td>15</td><td>3</td></tr>
  </table></center>
</body></html>"#;

async fn mount_sources(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "tok"})),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/data/traffic"))
        .and(header("Authorization", "Bearer tok"))
        .and(query_param("relativeDate", "yesterday"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"name": "Main Entrance", "sumins": 120}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reports/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FRAMESET))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reports/stats/table.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TABLE))
        .mount(server)
        .await;
}

fn config_toml(uri: &str, ledger: &str, write: bool) -> String {
    format!(
        r#"
[sensor]
auth_url = "{uri}/oauth/token"
url = "{uri}/api/data/traffic"
client_id = "client"
client_secret = "secret"

[database]
host = "127.0.0.1"
port = 1
database = "circ"
user = "reader"
password = "secret"

[interlibrary]
url = "{uri}/reports/index.html"
code = "zv052"

[files]
ledger = '{ledger}'
backup = '{ledger}.bak'
write = {write}

[http]
timeout_secs = 5
"#
    )
}

#[tokio::test]
async fn test_collect_yesterday_from_configured_sources() {
    let server = MockServer::start().await;
    mount_sources(&server).await;

    let dir = tempdir().unwrap();
    let ledger = dir.path().join("circ.csv");
    let config = parse_config(&config_toml(&server.uri(), &ledger.display().to_string(), true))
        .unwrap();
    let collector = Collector::from_config(&config).unwrap();

    let record = collector.run(ReconcileDate::Yesterday).await.unwrap();

    assert_eq!(record.id, Some(1));
    assert_eq!(record.door_count, Some(120));
    assert_eq!(record.ill_lent, Some(15));
    assert_eq!(record.ill_borrowed, Some(11));
    assert_eq!(record.checked_out, None);
    assert_eq!(record.holds, None);
    assert_eq!(record.comments, None);

    let content = fs::read_to_string(&ledger).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn test_read_only_config_leaves_no_ledger() {
    let server = MockServer::start().await;
    mount_sources(&server).await;

    let dir = tempdir().unwrap();
    let ledger = dir.path().join("circ.csv");
    let config = parse_config(&config_toml(&server.uri(), &ledger.display().to_string(), false))
        .unwrap();
    let collector = Collector::from_config(&config).unwrap();

    let record = collector.run(ReconcileDate::Yesterday).await.unwrap();

    assert_eq!(record.id, None);
    assert_eq!(record.door_count, Some(120));
    assert!(!ledger.exists());
}
