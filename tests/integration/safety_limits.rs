#![allow(clippy::all)]

mod common;

use common::{facilities_schema, memory_conn, parts_schema, seed_numbered};
use vgraph::datagen;
use vgraph::{
    AggregateOp, AggregateOptions, GraphError, PathfindOptions, Result, SafetyLimits,
    Termination, TraverseOptions, VirtualGraph,
};

fn tight_limits(max_nodes: usize) -> SafetyLimits {
    SafetyLimits {
        max_nodes,
        ..SafetyLimits::default()
    }
}

#[test]
fn preflight_refuses_oversized_subgraphs() -> Result<()> {
    let conn = memory_conn();
    let schema = facilities_schema();
    datagen::install_schema(&conn, &schema)?;
    let hub = datagen::star(&conn, &schema, 30)?;
    let graph = VirtualGraph::with_limits(&conn, schema, tight_limits(20))?;

    let err = graph
        .traverse(hub, &TraverseOptions::default())
        .expect_err("estimate must refuse");
    match err {
        GraphError::SubgraphTooLarge { estimated, limit } => {
            assert_eq!(limit, 20);
            assert!(estimated >= limit);
        }
        other => panic!("expected SubgraphTooLarge, got {other:?}"),
    }
    Ok(())
}

#[test]
fn skipping_estimation_hits_the_budget_mid_hop() -> Result<()> {
    let conn = memory_conn();
    let schema = facilities_schema();
    datagen::install_schema(&conn, &schema)?;
    let hub = datagen::star(&conn, &schema, 30)?;
    let graph = VirtualGraph::with_limits(&conn, schema, tight_limits(20))?;

    let opts = TraverseOptions {
        skip_estimation: true,
        ..TraverseOptions::default()
    };
    let result = graph.traverse(hub, &opts)?;

    // The partial result is returned, flagged, and within budget.
    assert_eq!(result.terminated_at, Termination::SafetyLimit);
    assert_eq!(result.nodes_visited, 20);
    assert!(result.nodes.len() <= 20);
    Ok(())
}

#[test]
fn default_budgets_guard_a_wide_star() -> Result<()> {
    let conn = memory_conn();
    let schema = facilities_schema();
    datagen::install_schema(&conn, &schema)?;
    let hub = datagen::star(&conn, &schema, 10_100)?;
    let graph = VirtualGraph::new(&conn, schema)?;

    let err = graph
        .traverse(hub, &TraverseOptions::default())
        .expect_err("estimate must refuse");
    assert!(matches!(err, GraphError::SubgraphTooLarge { .. }));

    let opts = TraverseOptions {
        skip_estimation: true,
        ..TraverseOptions::default()
    };
    let result = graph.traverse(hub, &opts)?;
    assert_eq!(result.terminated_at, Termination::SafetyLimit);
    assert_eq!(result.nodes_visited, vgraph::MAX_NODES);
    Ok(())
}

#[test]
fn requested_depth_clamps_down_silently() -> Result<()> {
    let conn = memory_conn();
    let schema = facilities_schema();
    seed_numbered(
        &conn,
        &schema,
        6,
        &[
            (1, 2, 1.0),
            (2, 3, 1.0),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (5, 6, 1.0),
        ],
    );
    let limits = SafetyLimits {
        max_depth: 3,
        ..SafetyLimits::default()
    };
    let graph = VirtualGraph::with_limits(&conn, schema, limits)?;

    let opts = TraverseOptions {
        max_depth: 100,
        ..TraverseOptions::default()
    };
    let result = graph.traverse(1, &opts)?;

    assert_eq!(result.depth_reached, 3);
    assert_eq!(result.nodes_visited, 4);
    assert_eq!(result.terminated_at, Termination::DepthExhausted);
    Ok(())
}

#[test]
fn aggregation_row_cap_raises() -> Result<()> {
    let conn = memory_conn();
    let schema = parts_schema();
    seed_numbered(
        &conn,
        &schema,
        4,
        &[(1, 2, 1.0), (1, 3, 1.0), (2, 4, 1.0), (3, 4, 1.0)],
    );
    let limits = SafetyLimits {
        max_nodes: 2,
        aggregate_fanout: 1,
        ..SafetyLimits::default()
    };
    let graph = VirtualGraph::with_limits(&conn, schema, limits)?;

    let opts = AggregateOptions::new("quantity", AggregateOp::Sum);
    let err = graph.path_aggregate(1, &opts).expect_err("row cap");
    assert!(matches!(err, GraphError::SafetyLimitExceeded(_)));
    Ok(())
}

#[test]
fn weighted_pathfinder_row_cap_raises() -> Result<()> {
    let conn = memory_conn();
    let schema = facilities_schema();
    // Dense mesh: many simple paths between 1 and 6.
    let mut edges = Vec::new();
    for a in 1..=6i64 {
        for b in 1..=6i64 {
            if a != b {
                edges.push((a, b, 1.0));
            }
        }
    }
    seed_numbered(&conn, &schema, 6, &edges);
    let limits = SafetyLimits {
        max_nodes: 4,
        aggregate_fanout: 1,
        ..SafetyLimits::default()
    };
    let graph = VirtualGraph::with_limits(&conn, schema, limits)?;

    let err = graph
        .shortest_path(1, 6, &PathfindOptions::default())
        .expect_err("row cap");
    assert!(matches!(err, GraphError::SafetyLimitExceeded(_)));
    Ok(())
}

#[test]
fn pathfinder_within_caps_still_answers() -> Result<()> {
    let conn = memory_conn();
    let schema = facilities_schema();
    seed_numbered(&conn, &schema, 3, &[(1, 2, 1.0), (2, 3, 1.0)]);
    let graph = VirtualGraph::with_limits(&conn, schema, tight_limits(100))?;

    let result = graph.shortest_path(1, 3, &PathfindOptions::default())?;
    assert_eq!(result.path, Some(vec![1, 2, 3]));
    Ok(())
}

#[test]
fn visited_count_never_exceeds_budget_on_any_return() -> Result<()> {
    let conn = memory_conn();
    let schema = facilities_schema();
    datagen::install_schema(&conn, &schema)?;
    datagen::layered(&conn, &schema, 4, 10, 3, 11)?;
    let limits = tight_limits(15);
    let graph = VirtualGraph::with_limits(&conn, schema, limits)?;

    let opts = TraverseOptions {
        skip_estimation: true,
        ..TraverseOptions::default()
    };
    let result = graph.traverse(1, &opts)?;
    assert!(result.nodes_visited <= 15);
    assert!(result.depth_reached <= graph.limits().max_depth);
    Ok(())
}
