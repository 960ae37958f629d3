//! Query text assembly over validated schema bindings.
//!
//! Every function here assumes the schema already passed
//! [`GraphSchema::validate`](crate::schema::GraphSchema::validate);
//! identifiers are interpolated quoted, all values stay positional
//! parameters. Recursive queries encode the running path as
//! `',' || id || ','` text and reject any step whose target already
//! appears on its own prefix; their recursive member carries a `LIMIT`
//! so runaway recursion stops at the row cap.

use crate::model::{AggregateOp, Direction};
use crate::schema::GraphSchema;

use super::ident::quote;

/// Orientation of one frontier fetch: which edge column anchors to the
/// frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Leg {
    /// Anchor on `edge_from_col`, enter `edge_to_col`.
    Forward,
    /// Anchor on `edge_to_col`, enter `edge_from_col`.
    Reverse,
}

impl Leg {
    /// The legs a direction expands through, in fixed order.
    pub(crate) fn for_direction(direction: Direction) -> &'static [Leg] {
        match direction {
            Direction::Outbound => &[Leg::Forward],
            Direction::Inbound => &[Leg::Reverse],
            Direction::Both => &[Leg::Forward, Leg::Reverse],
        }
    }
}

fn placeholders(count: usize) -> String {
    let mut out = String::with_capacity(count * 3);
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    out
}

/// JOIN clause filtering soft-deleted rows for the node reached by
/// `entered`, or an empty string when the schema has no soft-delete
/// column.
fn soft_delete_join(schema: &GraphSchema, entered: &str) -> String {
    match &schema.soft_delete_col {
        Some(col) => format!(
            " JOIN {nodes} AS n ON n.{pk} = {entered} AND n.{sd} IS NULL",
            nodes = quote(&schema.nodes_table),
            pk = quote(&schema.node_pk_col),
            sd = quote(col),
        ),
        None => String::new(),
    }
}

/// Batched edge fetch for one frontier chunk.
///
/// Emits `(from, to[, weight])` rows for edges whose anchor column is
/// in the bound id list, ordered by `(from, to)` so tie-breaks are
/// deterministic. Parameters: the frontier ids.
pub(crate) fn edge_batch(schema: &GraphSchema, leg: Leg, id_count: usize) -> String {
    let from = quote(&schema.edge_from_col);
    let to = quote(&schema.edge_to_col);
    let (anchor, entered) = match leg {
        Leg::Forward => (&from, &to),
        Leg::Reverse => (&to, &from),
    };
    let weight = match &schema.weight_col {
        Some(col) => format!(", e.{}", quote(col)),
        None => String::new(),
    };
    format!(
        "SELECT e.{from}, e.{to}{weight} FROM {edges} AS e{sd_join} \
         WHERE e.{anchor} IN ({ids}) ORDER BY e.{from}, e.{to}",
        edges = quote(&schema.edges_table),
        sd_join = soft_delete_join(schema, &format!("e.{entered}")),
        ids = placeholders(id_count),
    )
}

/// Node hydration for one id chunk. Parameters: the node ids.
///
/// `predicate` is the already-guarded trusted condition appended as a
/// conjunct; ordering happens client-side.
pub(crate) fn hydrate(schema: &GraphSchema, id_count: usize, predicate: Option<&str>) -> String {
    let mut sql = format!(
        "SELECT * FROM {nodes} WHERE {pk} IN ({ids})",
        nodes = quote(&schema.nodes_table),
        pk = quote(&schema.node_pk_col),
        ids = placeholders(id_count),
    );
    if let Some(col) = &schema.soft_delete_col {
        sql.push_str(&format!(" AND {} IS NULL", quote(col)));
    }
    if let Some(cond) = predicate {
        sql.push_str(&format!(" AND ({cond})"));
    }
    sql
}

/// Degree of a single node on one leg. Parameter: the node id.
pub(crate) fn start_degree(schema: &GraphSchema, leg: Leg) -> String {
    let anchor = match leg {
        Leg::Forward => quote(&schema.edge_from_col),
        Leg::Reverse => quote(&schema.edge_to_col),
    };
    format!(
        "SELECT COUNT(*) FROM {edges} WHERE {anchor} = ?",
        edges = quote(&schema.edges_table),
    )
}

/// Average degree over a random sample of nodes that carry edges on
/// the given leg. Parameter: the sample size.
pub(crate) fn avg_degree_sample(schema: &GraphSchema, leg: Leg) -> String {
    let anchor = match leg {
        Leg::Forward => quote(&schema.edge_from_col),
        Leg::Reverse => quote(&schema.edge_to_col),
    };
    format!(
        "SELECT AVG(deg) FROM (SELECT COUNT(*) AS deg FROM {edges} \
         GROUP BY {anchor} ORDER BY RANDOM() LIMIT ?)",
        edges = quote(&schema.edges_table),
    )
}

/// Count of live rows in the node table.
pub(crate) fn node_count(schema: &GraphSchema) -> String {
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote(&schema.nodes_table));
    if let Some(col) = &schema.soft_delete_col {
        sql.push_str(&format!(" WHERE {} IS NULL", quote(col)));
    }
    sql
}

/// All live node ids, ascending.
pub(crate) fn all_node_ids(schema: &GraphSchema) -> String {
    let mut sql = format!(
        "SELECT {pk} FROM {nodes}",
        pk = quote(&schema.node_pk_col),
        nodes = quote(&schema.nodes_table),
    );
    if let Some(col) = &schema.soft_delete_col {
        sql.push_str(&format!(" WHERE {} IS NULL", quote(col)));
    }
    sql.push_str(&format!(" ORDER BY {}", quote(&schema.node_pk_col)));
    sql
}

/// Every edge between live nodes, capped. Parameter: the row cap.
pub(crate) fn all_edges(schema: &GraphSchema) -> String {
    let from = quote(&schema.edge_from_col);
    let to = quote(&schema.edge_to_col);
    let mut sql = format!(
        "SELECT e.{from}, e.{to} FROM {edges} AS e",
        edges = quote(&schema.edges_table),
    );
    if let Some(col) = &schema.soft_delete_col {
        let nodes = quote(&schema.nodes_table);
        let pk = quote(&schema.node_pk_col);
        let sd = quote(col);
        sql.push_str(&format!(
            " JOIN {nodes} AS src ON src.{pk} = e.{from} AND src.{sd} IS NULL \
             JOIN {nodes} AS dst ON dst.{pk} = e.{to} AND dst.{sd} IS NULL"
        ));
    }
    sql.push_str(&format!(" ORDER BY e.{from}, e.{to} LIMIT ?"));
    sql
}

/// Per-node degree ranking; soft-deleted nodes are left out of the
/// ranking when the schema declares the column. Parameter: the result
/// cap.
pub(crate) fn degree_group(schema: &GraphSchema, direction: Direction) -> String {
    let from = quote(&schema.edge_from_col);
    let to = quote(&schema.edge_to_col);
    let edges = quote(&schema.edges_table);
    let arm = |counted: &str| {
        format!(
            "SELECT e.{counted} AS node FROM {edges} AS e{sd_join}",
            sd_join = soft_delete_join(schema, &format!("e.{counted}")),
        )
    };
    let source = match direction {
        Direction::Outbound => arm(&from),
        Direction::Inbound => arm(&to),
        Direction::Both => format!("{} UNION ALL {}", arm(&from), arm(&to)),
    };
    format!(
        "SELECT node, COUNT(*) AS degree FROM ({source}) \
         GROUP BY node ORDER BY degree DESC, node ASC LIMIT ?"
    )
}

/// Step expressions for a recursive walk: the JOIN condition anchoring
/// the edge to the current row, and the expression naming the node the
/// step enters.
fn walk_step(schema: &GraphSchema, direction: Direction) -> (String, String) {
    let from = quote(&schema.edge_from_col);
    let to = quote(&schema.edge_to_col);
    match direction {
        Direction::Outbound => (format!("e.{from} = w.node"), format!("e.{to}")),
        Direction::Inbound => (format!("e.{to} = w.node"), format!("e.{from}")),
        Direction::Both => (
            format!("(e.{from} = w.node OR e.{to} = w.node)"),
            format!("CASE WHEN e.{from} = w.node THEN e.{to} ELSE e.{from} END"),
        ),
    }
}

fn excluded_clause(next: &str, excluded_count: usize) -> String {
    if excluded_count == 0 {
        String::new()
    } else {
        format!(" AND {next} NOT IN ({})", placeholders(excluded_count))
    }
}

/// Weighted path enumeration as a bounded recursive walk.
///
/// Rows are `(node, cum_weight, path, depth)`, one per simple path
/// prefix. Parameters, in order: start id (twice), depth bound,
/// excluded ids, row cap.
pub(crate) fn weighted_walk(
    schema: &GraphSchema,
    weight_col: &str,
    direction: Direction,
    excluded_count: usize,
) -> String {
    let (join_on, next) = walk_step(schema, direction);
    format!(
        "WITH RECURSIVE walk(node, cum_weight, path, depth) AS ( \
         SELECT ?, CAST(0 AS REAL), ',' || ? || ',', 0 \
         UNION ALL \
         SELECT {next}, w.cum_weight + e.{weight}, w.path || {next} || ',', w.depth + 1 \
         FROM walk AS w JOIN {edges} AS e ON {join_on}{sd_join} \
         WHERE w.depth < ? AND instr(w.path, ',' || {next} || ',') = 0{excluded} \
         LIMIT ? \
         ) SELECT node, cum_weight, path, depth FROM walk",
        weight = quote(weight_col),
        edges = quote(&schema.edges_table),
        sd_join = soft_delete_join(schema, &next),
        excluded = excluded_clause(&next, excluded_count),
    )
}

/// Unweighted path enumeration, used to list every simple path of an
/// exact hop length.
///
/// Rows are `(node, path, depth)`. Parameters, in order: start id
/// (twice), depth bound, excluded ids, row cap.
pub(crate) fn exact_length_walk(
    schema: &GraphSchema,
    direction: Direction,
    excluded_count: usize,
) -> String {
    let (join_on, next) = walk_step(schema, direction);
    format!(
        "WITH RECURSIVE walk(node, path, depth) AS ( \
         SELECT ?, ',' || ? || ',', 0 \
         UNION ALL \
         SELECT {next}, w.path || {next} || ',', w.depth + 1 \
         FROM walk AS w JOIN {edges} AS e ON {join_on}{sd_join} \
         WHERE w.depth < ? AND instr(w.path, ',' || {next} || ',') = 0{excluded} \
         LIMIT ? \
         ) SELECT node, path, depth FROM walk",
        edges = quote(&schema.edges_table),
        sd_join = soft_delete_join(schema, &next),
        excluded = excluded_clause(&next, excluded_count),
    )
}

/// Multi-path aggregation walk. Partial rows are keyed by their full
/// path prefix (never deduplicated on node) so every distinct path
/// contributes; the caller collapses rows by terminal node afterwards.
///
/// Rows are `(node, acc, depth)` with the start row filtered out.
/// Parameters, in order: start id (twice), depth bound, row cap.
pub(crate) fn aggregate_walk(schema: &GraphSchema, value_col: &str, op: AggregateOp) -> String {
    let to = quote(&schema.edge_to_col);
    let from = quote(&schema.edge_from_col);
    let value = quote(value_col);
    let (init, step) = match op {
        AggregateOp::Sum => ("CAST(0 AS REAL)".to_string(), format!("w.acc + e.{value}")),
        AggregateOp::Multiply => ("CAST(1 AS REAL)".to_string(), format!("w.acc * e.{value}")),
        // The first-hop branch keys on depth, not on the accumulator:
        // an accumulator NULLed by a NULL edge value must stay NULL
        // through to grouping.
        AggregateOp::Max => (
            "CAST(NULL AS REAL)".to_string(),
            format!("CASE WHEN w.depth = 0 THEN e.{value} ELSE MAX(w.acc, e.{value}) END"),
        ),
        AggregateOp::Min => (
            "CAST(NULL AS REAL)".to_string(),
            format!("CASE WHEN w.depth = 0 THEN e.{value} ELSE MIN(w.acc, e.{value}) END"),
        ),
        AggregateOp::Count => ("CAST(0 AS REAL)".to_string(), "w.acc + 1".to_string()),
    };
    format!(
        "WITH RECURSIVE walk(node, acc, path, depth) AS ( \
         SELECT ?, {init}, ',' || ? || ',', 0 \
         UNION ALL \
         SELECT e.{to}, {step}, w.path || e.{to} || ',', w.depth + 1 \
         FROM walk AS w JOIN {edges} AS e ON e.{from} = w.node{sd_join} \
         WHERE w.depth < ? AND instr(w.path, ',' || e.{to} || ',') = 0 \
         LIMIT ? \
         ) SELECT node, acc, depth FROM walk WHERE depth > 0",
        edges = quote(&schema.edges_table),
        sd_join = soft_delete_join(schema, &format!("e.{to}")),
    )
}

/// Cheapest weight between two endpoints, orientation-aware.
/// Parameters: the two node ids (twice for `Both`).
pub(crate) fn edge_weight_lookup(
    schema: &GraphSchema,
    weight_col: &str,
    direction: Direction,
) -> String {
    let from = quote(&schema.edge_from_col);
    let to = quote(&schema.edge_to_col);
    let condition = match direction {
        Direction::Outbound => format!("{from} = ? AND {to} = ?"),
        Direction::Inbound => format!("{to} = ? AND {from} = ?"),
        Direction::Both => {
            format!("({from} = ?1 AND {to} = ?2) OR ({from} = ?2 AND {to} = ?1)")
        }
    };
    format!(
        "SELECT MIN({weight}) FROM {edges} WHERE {condition}",
        weight = quote(weight_col),
        edges = quote(&schema.edges_table),
    )
}
