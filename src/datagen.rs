//! Synthetic graph fixtures for tests and benchmarks.
//!
//! Installs a node/edge DDL matching a [`GraphSchema`] and populates
//! deterministic shapes: layered DAGs, stars, and hand-picked edges.
//! All writes happen here, in fixture code; the engine itself is
//! read-only.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusqlite::Connection;

use crate::error::Result;
use crate::model::NodeId;
use crate::schema::GraphSchema;
use crate::sql::ident;

/// Creates the node and edge tables (plus edge indexes) named by the
/// schema binding. The node table carries a small fixed payload:
/// `name`, `tier`, `unit_cost`, and the soft-delete column when the
/// binding declares one.
pub fn install_schema(conn: &Connection, schema: &GraphSchema) -> Result<()> {
    schema.validate()?;
    let nodes = ident::quoted(&schema.nodes_table)?;
    let pk = ident::quoted(&schema.node_pk_col)?;
    let from = ident::quoted(&schema.edge_from_col)?;
    let to = ident::quoted(&schema.edge_to_col)?;
    let edges = ident::quoted(&schema.edges_table)?;

    let soft_delete = match &schema.soft_delete_col {
        Some(col) => format!(", {} TEXT", ident::quoted(col)?),
        None => String::new(),
    };
    let weight = match &schema.weight_col {
        Some(col) => format!(", {} REAL", ident::quoted(col)?),
        None => String::new(),
    };

    conn.execute_batch(&format!(
        "CREATE TABLE {nodes} ( \
             {pk} INTEGER PRIMARY KEY, \
             name TEXT, \
             tier INTEGER, \
             unit_cost REAL{soft_delete} \
         ); \
         CREATE TABLE {edges} ( \
             {from} INTEGER NOT NULL, \
             {to} INTEGER NOT NULL{weight} \
         ); \
         CREATE INDEX idx_{edges_raw}_from ON {edges} ({from}); \
         CREATE INDEX idx_{edges_raw}_to ON {edges} ({to});",
        edges_raw = schema.edges_table,
    ))?;
    Ok(())
}

/// Inserts one node row.
pub fn insert_node(
    conn: &Connection,
    schema: &GraphSchema,
    id: NodeId,
    name: &str,
    tier: i64,
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {nodes} ({pk}, name, tier) VALUES (?, ?, ?)",
        nodes = ident::quoted(&schema.nodes_table)?,
        pk = ident::quoted(&schema.node_pk_col)?,
    );
    conn.execute(&sql, rusqlite::params![id, name, tier])?;
    Ok(())
}

/// Inserts one edge row, with a weight when the binding has a weight
/// column.
pub fn insert_edge(
    conn: &Connection,
    schema: &GraphSchema,
    from: NodeId,
    to: NodeId,
    weight: Option<f64>,
) -> Result<()> {
    match (&schema.weight_col, weight) {
        (Some(col), value) => {
            let sql = format!(
                "INSERT INTO {edges} ({from_col}, {to_col}, {weight_col}) VALUES (?, ?, ?)",
                edges = ident::quoted(&schema.edges_table)?,
                from_col = ident::quoted(&schema.edge_from_col)?,
                to_col = ident::quoted(&schema.edge_to_col)?,
                weight_col = ident::quoted(col)?,
            );
            conn.execute(&sql, rusqlite::params![from, to, value])?;
        }
        (None, _) => {
            let sql = format!(
                "INSERT INTO {edges} ({from_col}, {to_col}) VALUES (?, ?)",
                edges = ident::quoted(&schema.edges_table)?,
                from_col = ident::quoted(&schema.edge_from_col)?,
                to_col = ident::quoted(&schema.edge_to_col)?,
            );
            conn.execute(&sql, rusqlite::params![from, to])?;
        }
    }
    Ok(())
}

/// Builds a star: node 1 in the middle with `children` leaves fanned
/// out from it. Returns the hub id.
pub fn star(conn: &Connection, schema: &GraphSchema, children: usize) -> Result<NodeId> {
    let hub: NodeId = 1;
    insert_node(conn, schema, hub, "hub", 0)?;
    for offset in 0..children {
        let child = hub + 1 + offset as NodeId;
        insert_node(conn, schema, child, &format!("leaf-{child}"), 1)?;
        insert_edge(conn, schema, hub, child, Some(1.0))?;
    }
    Ok(hub)
}

/// Builds a layered DAG: `layers` tiers of `width` nodes each, every
/// node wired to `fanout` random nodes of the next tier with weights
/// drawn from 1..=9. The same seed always produces the same graph.
/// Returns the ids of the first (root) tier.
pub fn layered(
    conn: &Connection,
    schema: &GraphSchema,
    layers: u32,
    width: u32,
    fanout: u32,
    seed: u64,
) -> Result<Vec<NodeId>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut next_id: NodeId = 1;
    let mut tiers: Vec<Vec<NodeId>> = Vec::with_capacity(layers as usize);
    for tier in 0..layers {
        let mut ids = Vec::with_capacity(width as usize);
        for _ in 0..width {
            insert_node(conn, schema, next_id, &format!("n{next_id}"), i64::from(tier))?;
            ids.push(next_id);
            next_id += 1;
        }
        tiers.push(ids);
    }
    for window in tiers.windows(2) {
        let (upper, lower) = (&window[0], &window[1]);
        for &from in upper {
            for _ in 0..fanout {
                let to = lower[rng.gen_range(0..lower.len())];
                let weight = f64::from(rng.gen_range(1..=9));
                insert_edge(conn, schema, from, to, Some(weight))?;
            }
        }
    }
    Ok(tiers.first().cloned().unwrap_or_default())
}
