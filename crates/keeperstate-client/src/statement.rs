//! Parameterized statements.
//!
//! Placeholders use the ClickHouse `{name:Type}` syntax. The current client
//! sends them to the server as `param_<name>` values; the legacy client
//! inlines escaped literals before sending.

use crate::error::{ClientError, ClientResult};

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    String(String),
    Int64(i64),
}

impl Param {
    /// The value as sent in a `param_<name>` URL parameter.
    ///
    /// The server reads parameter values in the Escaped format, so strings
    /// have their backslashes and control characters escaped.
    pub fn to_wire(&self) -> String {
        match self {
            Param::String(s) => escape_param(s),
            Param::Int64(i) => i.to_string(),
        }
    }

    /// The value as a SQL literal.
    pub fn to_literal(&self) -> String {
        match self {
            Param::String(s) => quote_string(s),
            Param::Int64(i) => i.to_string(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Param::String(_) => "String",
            Param::Int64(_) => "Int64",
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::String(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::String(s)
    }
}

impl From<i64> for Param {
    fn from(i: i64) -> Self {
        Param::Int64(i)
    }
}

/// A SQL statement with named parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<(String, Param)>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind a value to the `{name:Type}` placeholder.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Param>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, Param)] {
        &self.params
    }

    /// Look up a bound parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Whether this is an `INSERT ... VALUES`, whose placeholders sit in row
    /// data rather than in the query itself.
    pub fn has_values_clause(&self) -> bool {
        let sql = self.sql.trim_start();
        sql.starts_with("INSERT") && sql.contains(" VALUES ")
    }

    /// Render the statement with every placeholder replaced by a literal.
    ///
    /// Braces that do not form a `{name:Type}` placeholder (such as Keeper
    /// path macros) are copied through untouched.
    pub fn inline(&self) -> ClientResult<String> {
        let mut out = String::with_capacity(self.sql.len());
        let mut rest = self.sql.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let candidate = &rest[start..];

            match parse_placeholder(candidate) {
                Some((name, type_name, len)) => {
                    let value = self.param(name).ok_or_else(|| {
                        ClientError::Param(format!("no value bound for '{}'", name))
                    })?;
                    if value.type_name() != type_name {
                        return Err(ClientError::Param(format!(
                            "'{}' declared as {} but bound as {}",
                            name,
                            type_name,
                            value.type_name()
                        )));
                    }
                    out.push_str(&value.to_literal());
                    rest = &candidate[len..];
                }
                None => {
                    out.push('{');
                    rest = &candidate[1..];
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Parse `{name:Type}` at the start of `s`, returning name, type and length.
fn parse_placeholder(s: &str) -> Option<(&str, &str, usize)> {
    let end = s.find('}')?;
    let inner = &s[1..end];
    let (name, type_name) = inner.split_once(':')?;

    let is_ident = |part: &str| {
        !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if !is_ident(name) || !is_ident(type_name) {
        return None;
    }
    Some((name, type_name, end + 1))
}

fn escape_param(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a string as a ClickHouse literal.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Quote an identifier with backticks.
pub fn quote_identifier(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('`');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            _ => out.push(c),
        }
    }
    out.push('`');
    out
}
