//! Row and value plumbing over the relational connection.
//!
//! The engine owns no storage; everything here adapts `rusqlite` to the
//! engine's needs: converting dynamic column values into JSON, chunking
//! bind lists below the store's variable limit, and enforcing the
//! per-query statement deadline through a progress handler installed
//! for the duration of each statement.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use base64::Engine as _;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::error::{GraphError, Result};

/// Upper bound on ids bound into a single `IN (...)` list, kept well
/// below the store's default variable limit.
pub(crate) const BIND_CHUNK: usize = 900;

/// Virtual-machine ops between deadline checks.
const PROGRESS_OPS: i32 = 4096;

/// Translates a store failure, recognising deadline interrupts.
pub(crate) fn map_store_err(err: rusqlite::Error, timeout: Duration) -> GraphError {
    match err {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::OperationInterrupted =>
        {
            GraphError::QueryTimeout(timeout)
        }
        other => GraphError::Store(other),
    }
}

/// Statement deadline installed on the connection for one query.
///
/// The handler fires every [`PROGRESS_OPS`] virtual-machine steps and
/// interrupts the statement once the deadline passes; dropping the
/// guard removes the handler so unrelated statements are unaffected.
pub(crate) struct DeadlineGuard<'conn> {
    conn: &'conn Connection,
}

impl<'conn> DeadlineGuard<'conn> {
    pub(crate) fn install(conn: &'conn Connection, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
        Self { conn }
    }
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(PROGRESS_OPS, None::<fn() -> bool>);
    }
}

/// Runs one parameterized query under the statement deadline, mapping
/// each row through `f`.
pub(crate) fn query_rows<T, F>(
    conn: &Connection,
    timeout: Duration,
    sql: &str,
    params: &[rusqlite::types::Value],
    mut f: F,
) -> Result<Vec<T>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let _deadline = DeadlineGuard::install(conn, timeout);
    let mut stmt = conn.prepare(sql).map_err(|e| map_store_err(e, timeout))?;
    let mut rows = stmt
        .query(rusqlite::params_from_iter(params.iter()))
        .map_err(|e| map_store_err(e, timeout))?;
    let mut out = Vec::new();
    loop {
        match rows.next() {
            Ok(Some(row)) => out.push(f(row).map_err(|e| map_store_err(e, timeout))?),
            Ok(None) => break,
            Err(e) => return Err(map_store_err(e, timeout)),
        }
    }
    Ok(out)
}

/// Converts one dynamic column value to JSON. BLOBs become base64
/// strings, the representation the result records use on the wire.
pub(crate) fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Blob(bytes) => serde_json::Value::String(
            base64::engine::general_purpose::STANDARD.encode(bytes),
        ),
    }
}

/// Total order over JSON column values used for client-side row
/// ordering: NULL first, then numbers, strings, booleans, and
/// everything else by text rendering.
pub(crate) fn compare_json(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value;
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Bool(_) => 3,
            _ => 4,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}
