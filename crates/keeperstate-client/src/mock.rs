use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::client::KeeperClient;
use crate::error::{ClientError, ClientResult};
use crate::result::{Cell, ResultSet, Row};
use crate::statement::{Param, Statement};

const TABLE_ALREADY_EXISTS: u32 = 57;
const UNKNOWN_TABLE: u32 = 60;
const SYNTAX_ERROR: u32 = 62;

/// A stored checkpoint row: `(minOffset, maxOffset, state)`.
pub type MockRow = (i64, i64, String);

/// A mock ClickHouse client emulating KeeperMap tables, for testing.
///
/// Understands the statement shapes the checkpoint store issues: `CREATE
/// TABLE [IF NOT EXISTS]`, point `SELECT ... WHERE key = {key:String}` and
/// `INSERT ... VALUES ({key}, {minOffset}, {maxOffset}, {state})`. Inserts
/// replace the whole row for a key.
#[derive(Clone)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    /// Rows by table, then by key.
    tables: HashMap<String, BTreeMap<String, MockRow>>,
    /// SQL of every statement executed or queried.
    statements: Vec<String>,
    /// Whether ping reports healthy.
    reachable: bool,
    /// If set, all operations will fail with this error.
    fail_with: Option<String>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                tables: HashMap::new(),
                statements: Vec::new(),
                reachable: true,
                fail_with: None,
            })),
        }
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client that simulates failures.
    pub fn failing(error_message: impl Into<String>) -> Self {
        let client = Self::new();
        client.state.lock().unwrap().fail_with = Some(error_message.into());
        client
    }

    /// Create a mock client whose ping reports unhealthy.
    pub fn unreachable() -> Self {
        let client = Self::new();
        client.set_reachable(false);
        client
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().unwrap().reachable = reachable;
    }

    /// Make every subsequent operation fail (or stop failing with `None`).
    pub fn set_failure(&self, error_message: Option<String>) {
        self.state.lock().unwrap().fail_with = error_message;
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.state.lock().unwrap().tables.contains_key(table)
    }

    /// Write a row directly, bypassing statements.
    pub fn put_raw(&self, table: &str, key: &str, min_offset: i64, max_offset: i64, state: &str) {
        let mut guard = self.state.lock().unwrap();
        guard
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), (min_offset, max_offset, state.to_string()));
    }

    /// Read a row directly.
    pub fn get_raw(&self, table: &str, key: &str) -> Option<MockRow> {
        let guard = self.state.lock().unwrap();
        guard.tables.get(table).and_then(|t| t.get(key)).cloned()
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        let guard = self.state.lock().unwrap();
        guard.tables.get(table).map_or(0, |t| t.len())
    }

    /// SQL of all statements seen so far.
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    /// Clear recorded statements.
    pub fn clear_statements(&self) {
        self.state.lock().unwrap().statements.clear();
    }

    fn run(&self, statement: &Statement) -> ClientResult<ResultSet> {
        let mut state = self.state.lock().unwrap();

        if let Some(ref error) = state.fail_with {
            return Err(ClientError::Network(error.clone()));
        }
        state.statements.push(statement.sql().to_string());

        let sql = statement.sql().trim_start();
        if sql.starts_with("CREATE TABLE") {
            let if_not_exists = sql.starts_with("CREATE TABLE IF NOT EXISTS");
            let keyword = if if_not_exists { "EXISTS" } else { "TABLE" };
            let table = table_after(sql, keyword)?;

            if state.tables.contains_key(&table) {
                if if_not_exists {
                    return Ok(ResultSet::default());
                }
                return Err(server_error(
                    TABLE_ALREADY_EXISTS,
                    format!("Table {} already exists", table),
                ));
            }
            state.tables.insert(table, BTreeMap::new());
            Ok(ResultSet::default())
        } else if sql.starts_with("SELECT") {
            let table = table_after(sql, "FROM")?;
            let rows = state
                .tables
                .get(&table)
                .ok_or_else(|| server_error(UNKNOWN_TABLE, format!("Table {} does not exist", table)))?;
            let key = string_param(statement, "key")?;

            let columns = ["key", "minOffset", "maxOffset", "state"]
                .iter()
                .map(|c| c.to_string())
                .collect();
            let found = rows
                .get(&key)
                .map(|(min, max, st)| {
                    Row::new(vec![
                        Cell::Text(key.clone()),
                        Cell::Int(*min),
                        Cell::Int(*max),
                        Cell::Text(st.clone()),
                    ])
                })
                .into_iter()
                .collect();
            Ok(ResultSet::new(columns, found))
        } else if sql.starts_with("INSERT INTO") {
            let table = table_after(sql, "INTO")?;
            let key = string_param(statement, "key")?;
            let min = int_param(statement, "minOffset")?;
            let max = int_param(statement, "maxOffset")?;
            let st = string_param(statement, "state")?;

            let rows = state
                .tables
                .get_mut(&table)
                .ok_or_else(|| server_error(UNKNOWN_TABLE, format!("Table {} does not exist", table)))?;
            rows.insert(key, (min, max, st));
            Ok(ResultSet::default())
        } else {
            Err(server_error(SYNTAX_ERROR, format!("unsupported statement: {}", sql)))
        }
    }
}

impl KeeperClient for MockClient {
    fn ping(&self) -> impl Future<Output = ClientResult<bool>> + Send {
        let state = self.state.clone();
        async move {
            let state = state.lock().unwrap();

            if let Some(ref error) = state.fail_with {
                return Err(ClientError::Network(error.clone()));
            }

            Ok(state.reachable)
        }
    }

    fn execute(&self, statement: &Statement) -> impl Future<Output = ClientResult<()>> + Send {
        let result = self.run(statement).map(|_| ());
        async move { result }
    }

    fn query(&self, statement: &Statement) -> impl Future<Output = ClientResult<ResultSet>> + Send {
        let result = self.run(statement);
        async move { result }
    }
}

fn server_error(code: u32, message: String) -> ClientError {
    ClientError::Server { code, message }
}

/// The backtick-quoted identifier following `keyword`.
fn table_after(sql: &str, keyword: &str) -> ClientResult<String> {
    let malformed = || server_error(SYNTAX_ERROR, format!("expected table after {}: {}", keyword, sql));

    let start = sql.find(keyword).ok_or_else(malformed)? + keyword.len();
    let rest = sql[start..].trim_start();
    let mut chars = rest.chars();
    if chars.next() != Some('`') {
        return Err(malformed());
    }

    let mut name = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.push(chars.next().ok_or_else(malformed)?),
            '`' => return Ok(name),
            _ => name.push(c),
        }
    }
    Err(malformed())
}

fn string_param(statement: &Statement, name: &str) -> ClientResult<String> {
    match statement.param(name) {
        Some(Param::String(s)) => Ok(s.clone()),
        _ => Err(ClientError::Param(format!("expected String param '{}'", name))),
    }
}

fn int_param(statement: &Statement, name: &str) -> ClientResult<i64> {
    match statement.param(name) {
        Some(Param::Int64(i)) => Ok(*i),
        _ => Err(ClientError::Param(format!("expected Int64 param '{}'", name))),
    }
}
