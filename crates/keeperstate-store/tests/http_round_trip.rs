//! Store round trips through the real HTTP clients against a local stand-in
//! for a ClickHouse server with one KeeperMap table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use keeperstate_config::KeeperConfig;
use keeperstate_store::{KeeperStateStore, State, StateProvider, StateRecord};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type Rows = Arc<Mutex<HashMap<String, (i64, i64, String)>>>;

/// Start a server and return its port and table contents.
async fn start_keeper_server() -> (u16, Rows) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let rows: Rows = Arc::default();

    let table = rows.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream, table.clone()));
        }
    });

    (port, rows)
}

async fn serve(mut stream: TcpStream, rows: Rows) {
    let Some((target, body)) = read_request(&mut stream).await else {
        return;
    };
    let (path, query) = split_target(&target);
    let (status, response) = respond(&rows, path, &query, &body);

    let head = format!(
        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        response.len(),
        if status == 200 {
            String::new()
        } else {
            "X-ClickHouse-Exception-Code: 62\r\n".to_string()
        }
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn respond(rows: &Rows, path: &str, query: &HashMap<String, String>, sql: &str) -> (u16, String) {
    if path == "/ping" {
        return (200, "Ok.\n".to_string());
    }
    if sql.starts_with("CREATE TABLE IF NOT EXISTS") {
        return (200, String::new());
    }

    if let Some(values) = sql.split_once(" VALUES (").map(|(_, v)| v) {
        let mut rest = values;
        let key = take_literal(&mut rest);
        let min = take_int(&mut rest);
        let max = take_int(&mut rest);
        let state = take_literal(&mut rest);
        return match (key, min, max, state) {
            (Some(key), Some(min), Some(max), Some(state)) => {
                rows.lock().unwrap().insert(key, (min, max, state));
                (200, String::new())
            }
            _ => (400, format!("cannot parse VALUES in {}", sql)),
        };
    }

    if sql.starts_with("SELECT") {
        let key = match query.get("param_key") {
            Some(wire) => unescape_escaped(wire),
            None => {
                let mut rest = match sql.split_once("key = ") {
                    Some((_, rest)) => rest,
                    None => return (400, "no key predicate".to_string()),
                };
                match take_literal(&mut rest) {
                    Some(key) => key,
                    None => return (400, "bad key literal".to_string()),
                }
            }
        };
        let row = rows.lock().unwrap().get(&key).cloned();
        return (200, format_rows(query, key, row));
    }

    (400, format!("unsupported statement: {}", sql))
}

fn format_rows(
    query: &HashMap<String, String>,
    key: String,
    row: Option<(i64, i64, String)>,
) -> String {
    if query.get("default_format").map(String::as_str) == Some("JSONCompact") {
        let data: Vec<serde_json::Value> = row
            .into_iter()
            .map(|(min, max, state)| serde_json::json!([key, min, max, state]))
            .collect();
        return serde_json::json!({
            "meta": [{"name": "key"}, {"name": "minOffset"}, {"name": "maxOffset"}, {"name": "state"}],
            "data": data
        })
        .to_string();
    }

    let mut out = "key\tminOffset\tmaxOffset\tstate\n".to_string();
    if let Some((min, max, state)) = row {
        out.push_str(&format!("{}\t{}\t{}\t{}\n", escape_escaped(&key), min, max, state));
    }
    out
}

/// Consume a single-quoted SQL literal and a following `, ` if present.
fn take_literal(rest: &mut &str) -> Option<String> {
    let mut chars = rest.strip_prefix('\'')?.char_indices();
    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?.1),
            '\'' => {
                let after = &rest[i + 2..];
                *rest = after.strip_prefix(", ").unwrap_or(after);
                return Some(out);
            }
            _ => out.push(c),
        }
    }
    None
}

fn take_int(rest: &mut &str) -> Option<i64> {
    let (value, after) = rest.split_once(", ")?;
    *rest = after;
    value.parse().ok()
}

fn unescape_escaped(value: &str) -> String {
    let mut out = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape_escaped(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn split_target(target: &str) -> (&str, HashMap<String, String>) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let params = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (percent_decode(k), percent_decode(v)))
        .collect();
    (path, params)
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).unwrap()
}

async fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let target = head.lines().next()?.split(' ').nth(1)?.to_string();
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Some((target, String::from_utf8_lossy(&body).into_owned()))
}

fn config(port: u16, version: &str) -> KeeperConfig {
    KeeperConfig::parse(&format!(
        "[clickhouse]\nhostname = \"127.0.0.1\"\nport = {}\nssl = false\ntimeout_ms = 5000\nclient_version = \"{}\"\n",
        port, version
    ))
    .unwrap()
}

#[tokio::test]
async fn set_then_get_round_trips_on_both_client_versions() {
    let (port, rows) = start_keeper_server().await;

    for version in ["V1", "V2"] {
        let store = KeeperStateStore::connect(&config(port, version)).await.unwrap();
        let topic = format!("orders_{}", version);

        let unwritten = store.get_state(&topic, 7).await.unwrap();
        assert_eq!(unwritten, StateRecord::none(topic.as_str(), 7), "{}", version);

        let record = StateRecord::new(topic.as_str(), 3, 100, 500, State::NONE);
        store.set_state(&record).await.unwrap();
        assert_eq!(store.get_state(&topic, 3).await.unwrap(), record, "{}", version);
    }
    assert_eq!(rows.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn topics_with_escape_characters_round_trip_on_both_client_versions() {
    let (port, rows) = start_keeper_server().await;

    for version in ["V1", "V2"] {
        let store = KeeperStateStore::connect(&config(port, version)).await.unwrap();

        for (partition, topic) in [(1, "a\\b"), (2, "tab\there"), (3, "quote'd")] {
            let partition = if version == "V1" { partition } else { partition + 10 };
            let record = StateRecord::new(topic, partition, 100, 500, State::NONE);
            store.set_state(&record).await.unwrap();

            let read = store.get_state(topic, partition).await.unwrap();
            assert_eq!(read, record, "{} {:?}", version, topic);
        }
    }

    let rows = rows.lock().unwrap();
    assert!(rows.contains_key("a\\b-1"));
    assert!(rows.contains_key("a\\b-11"));
    assert!(rows.contains_key("tab\there-12"));
}

#[tokio::test]
async fn both_client_versions_read_each_others_writes() {
    let (port, _rows) = start_keeper_server().await;
    let legacy = KeeperStateStore::connect(&config(port, "V1")).await.unwrap();
    let current = KeeperStateStore::connect(&config(port, "V2")).await.unwrap();

    let record = StateRecord::new("payments\\eu", 0, 42, 99, State::NONE);
    legacy.set_state(&record).await.unwrap();
    assert_eq!(current.get_state("payments\\eu", 0).await.unwrap(), record);

    let cleared = StateRecord::none("payments\\eu", 0);
    current.set_state(&cleared).await.unwrap();
    assert_eq!(legacy.get_state("payments\\eu", 0).await.unwrap(), cleared);
}
