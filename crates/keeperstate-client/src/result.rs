//! Query results with positional, typed column access.

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

/// A single value in a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Null,
    Int(i64),
    Text(String),
}

/// One row of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn cell(&self, index: usize) -> ClientResult<&Cell> {
        self.cells.get(index).ok_or_else(|| ClientError::Column {
            index,
            message: format!("row has only {} columns", self.cells.len()),
        })
    }

    /// Read a String column.
    pub fn get_string(&self, index: usize) -> ClientResult<&str> {
        match self.cell(index)? {
            Cell::Text(s) => Ok(s),
            other => Err(ClientError::Column {
                index,
                message: format!("expected String, got {:?}", other),
            }),
        }
    }

    /// Read an Int64 column. Text cells holding a decimal integer are
    /// accepted, since text formats carry every value as a string.
    pub fn get_i64(&self, index: usize) -> ClientResult<i64> {
        match self.cell(index)? {
            Cell::Int(i) => Ok(*i),
            Cell::Text(s) => s.parse().map_err(|_| ClientError::Column {
                index,
                message: format!("expected Int64, got '{}'", s),
            }),
            Cell::Null => Err(ClientError::Column {
                index,
                message: "expected Int64, got NULL".to_string(),
            }),
        }
    }
}

/// The rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decode a `TabSeparatedWithNames` body.
    pub fn from_tab_separated(body: &[u8]) -> ClientResult<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|e| ClientError::Decode(format!("response is not UTF-8: {}", e)))?;

        let mut lines = text.lines();
        let columns: Vec<String> = match lines.next() {
            Some(header) if !header.is_empty() => header
                .split('\t')
                .map(unescape_tsv)
                .collect::<ClientResult<_>>()?,
            _ => return Ok(Self::default()),
        };

        let mut rows = Vec::new();
        for line in lines {
            let cells: Vec<Cell> = line
                .split('\t')
                .map(|field| {
                    if field == "\\N" {
                        Ok(Cell::Null)
                    } else {
                        unescape_tsv(field).map(Cell::Text)
                    }
                })
                .collect::<ClientResult<_>>()?;

            if cells.len() != columns.len() {
                return Err(ClientError::Decode(format!(
                    "row has {} fields but header has {}",
                    cells.len(),
                    columns.len()
                )));
            }
            rows.push(Row::new(cells));
        }

        Ok(Self { columns, rows })
    }

    /// Decode a `JSONCompact` body.
    pub fn from_json_compact(body: &[u8]) -> ClientResult<Self> {
        let payload: JsonCompact = serde_json::from_slice(body)?;

        let columns: Vec<String> = payload.meta.into_iter().map(|m| m.name).collect();
        let rows = payload
            .data
            .into_iter()
            .map(|values| {
                if values.len() != columns.len() {
                    return Err(ClientError::Decode(format!(
                        "row has {} values but meta has {}",
                        values.len(),
                        columns.len()
                    )));
                }
                Ok(Row::new(values.into_iter().map(json_to_cell).collect()))
            })
            .collect::<ClientResult<Vec<_>>>()?;

        Ok(Self { columns, rows })
    }
}

#[derive(Deserialize)]
struct JsonCompact {
    meta: Vec<JsonColumn>,
    data: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct JsonColumn {
    name: String,
}

fn json_to_cell(value: serde_json::Value) -> Cell {
    match value {
        serde_json::Value::Null => Cell::Null,
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => Cell::Text(n.to_string()),
        },
        serde_json::Value::String(s) => Cell::Text(s),
        other => Cell::Text(other.to_string()),
    }
}

fn unescape_tsv(field: &str) -> ClientResult<String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some(other) => out.push(other),
            None => {
                return Err(ClientError::Decode(format!(
                    "dangling escape in field '{}'",
                    field
                )))
            }
        }
    }

    Ok(out)
}
