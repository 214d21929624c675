//! Dominance integration tests.
//!
//! These tests drive the public API end to end:
//! 1. Build a graph, either raw through `GraphCollection` or through `ControlFlowGraph`
//! 2. Compute dominators and post-dominators with `DominanceEngine`
//! 3. Compare the results with hand-derived maps and with a brute-force reachability
//!    definition of dominance on generated graphs

use std::collections::{BTreeMap, BTreeSet};

use cfgscope::{
    algorithms::dfs,
    analysis::{CfgEdgeKind, ControlFlowGraph},
    DominanceDirection, DominanceEngine, DominanceState, DominatorTree, Error, GraphCollection,
    NodeId, Result, Selector,
};

/// Deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as usize) % bound
    }
}

/// Shows the crate's `log` output when a test runs with `RUST_LOG` set.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A connected graph with vertex 0 as entry and vertex 1 as exit, plus `extra` random
/// edges. Few extra edges leave dead ends and cycles without a path to the exit.
fn random_graph(seed: u64, count: usize, extra: usize) -> GraphCollection<(), ()> {
    let mut rng = Lcg(seed);
    let mut graph = GraphCollection::new();
    let nodes: Vec<NodeId> = (0..count).map(|_| graph.add_vertex()).collect();
    graph.add_edge(nodes[0], nodes[1], Selector::CFG).unwrap();

    for i in 2..count {
        // tree edge from an earlier non-exit vertex keeps everything reachable
        let mut parent = rng.next(i);
        if parent == 1 {
            parent = 0;
        }
        graph
            .ensure_edge(nodes[parent], nodes[i], Selector::CFG)
            .unwrap();
    }
    for _ in 0..extra {
        let s = rng.next(count);
        let t = rng.next(count);
        if s == 1 {
            continue;
        }
        graph.ensure_edge(nodes[s], nodes[t], Selector::CFG).unwrap();
    }
    graph
}

fn compute(
    graph: &GraphCollection<(), ()>,
    entry: NodeId,
    exit: NodeId,
    direction: DominanceDirection,
) -> Result<DominatorTree> {
    init_logging();
    let view = graph.view(Selector::CFG);
    let mut engine = DominanceEngine::new(&view, entry, exit)?;
    engine.compute(direction)?;
    engine.into_tree()
}

/// `d` dominates `v` iff `v` cannot be reached from `entry` once `d` is removed.
fn brute_force_dominates(
    graph: &GraphCollection<(), ()>,
    entry: NodeId,
    d: NodeId,
    v: NodeId,
) -> bool {
    if d == v || d == entry {
        return true;
    }
    let view = graph.subgraph_view(Selector::CFG, graph.vertices().filter(|&n| n != d));
    !dfs(&view, entry).any(|n| n == v)
}

/// `d` post-dominates `v` iff `v` cannot reach `exit` once `d` is removed. `graph` must
/// already carry the fake exit edges.
fn brute_force_post_dominates(
    graph: &GraphCollection<(), ()>,
    exit: NodeId,
    d: NodeId,
    v: NodeId,
) -> bool {
    if d == v || d == exit {
        return true;
    }
    let view = graph.subgraph_view(Selector::CFG, graph.vertices().filter(|&n| n != d));
    !dfs(&view, v).any(|n| n == exit)
}

#[test]
fn test_scenario_diamond() -> Result<()> {
    // entry -> A -> {B, C} -> D -> exit
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.add_block(2)?;
    let b = cfg.add_block(3)?;
    let c = cfg.add_block(4)?;
    let d = cfg.add_block(5)?;
    cfg.add_unconditional_edge(cfg.entry(), a)?;
    cfg.add_edge(a, b, CfgEdgeKind::ConditionalTrue)?;
    cfg.add_edge(a, c, CfgEdgeKind::ConditionalFalse)?;
    cfg.add_unconditional_edge(b, d)?;
    cfg.add_unconditional_edge(c, d)?;
    cfg.add_unconditional_edge(d, cfg.exit())?;

    let view = cfg.full_cfg_view();
    let mut dom = DominanceEngine::new(&view, cfg.entry(), cfg.exit())?;
    dom.compute(DominanceDirection::Dominators)?;
    let map = dom.dominator_map()?;
    assert_eq!(map[&a], cfg.entry());
    assert_eq!(map[&b], a);
    assert_eq!(map[&c], a);
    assert_eq!(map[&d], a);
    assert_eq!(map[&cfg.entry()], cfg.entry());

    let mut pdom = DominanceEngine::new(&view, cfg.entry(), cfg.exit())?;
    pdom.compute(DominanceDirection::PostDominators)?;
    let map = pdom.dominator_map()?;
    assert_eq!(map[&c], d);
    assert_eq!(map[&b], d);
    assert_eq!(map[&a], d);
    assert_eq!(map[&d], cfg.exit());
    assert!(pdom.fake_exit_edges()?.is_empty());

    let dominated = dom.all_dominated()?;
    assert_eq!(dominated[&a], BTreeSet::from([a, b, c, d]));
    assert_eq!(dominated[&b], BTreeSet::from([b]));
    Ok(())
}

#[test]
fn test_noreturn_block_gets_fake_exit_edge() -> Result<()> {
    // entry -> a -> exit, entry -> abort (no successors)
    let mut graph: GraphCollection<(), ()> = GraphCollection::new();
    let entry = graph.add_vertex();
    let exit = graph.add_vertex();
    let a = graph.add_vertex();
    let abort = graph.add_vertex();
    graph.add_edge(entry, a, Selector::CFG)?;
    graph.add_edge(a, exit, Selector::CFG)?;
    graph.add_edge(entry, abort, Selector::CFG)?;

    let view = graph.view(Selector::CFG);
    let mut engine = DominanceEngine::new(&view, entry, exit)?;
    engine.compute(DominanceDirection::PostDominators)?;

    assert!(engine.has_fake_exit_edge(abort)?);
    assert!(!engine.has_fake_exit_edge(a)?);
    assert_eq!(engine.immediate_dominator(abort)?, exit);
    assert_eq!(engine.immediate_dominator(a)?, exit);
    assert_eq!(engine.immediate_dominator(entry)?, exit);
    Ok(())
}

#[test]
fn test_unreachable_block_is_malformed() -> Result<()> {
    let mut graph: GraphCollection<(), ()> = GraphCollection::new();
    let entry = graph.add_vertex();
    let exit = graph.add_vertex();
    let orphan = graph.add_vertex();
    graph.add_edge(entry, exit, Selector::CFG)?;
    graph.add_edge(orphan, exit, Selector::CFG)?;

    let view = graph.view(Selector::CFG);
    let mut engine = DominanceEngine::new(&view, entry, exit)?;
    assert!(matches!(
        engine.compute(DominanceDirection::Dominators),
        Err(Error::MalformedGraph { .. })
    ));
    assert_eq!(engine.state(), DominanceState::NotComputed);
    assert!(matches!(
        engine.immediate_dominator(exit),
        Err(Error::DominanceNotComputed)
    ));
    Ok(())
}

#[test]
fn test_generated_graphs_match_brute_force() {
    for seed in 0..40 {
        let count = 6 + (seed as usize % 9);
        let graph = random_graph(seed, count, count * 2);
        let entry = NodeId::new(0);
        let exit = NodeId::new(1);
        let tree = compute(&graph, entry, exit, DominanceDirection::Dominators).unwrap();

        for v in graph.vertices() {
            for d in graph.vertices() {
                assert_eq!(
                    tree.dominates(d, v),
                    brute_force_dominates(&graph, entry, d, v),
                    "seed {seed}: dominates({d}, {v})"
                );
            }

            // the idom chain reaches the entry in at most |V| steps
            let chain: Vec<NodeId> = tree.dominators(v).collect();
            assert!(chain.len() <= count, "seed {seed}: chain of {v}");
            assert_eq!(chain.last(), Some(&entry));

            // the immediate dominator is the closest strict dominator
            if let Some(idom) = tree.immediate_dominator(v) {
                for d in graph.vertices() {
                    if d != v && tree.dominates(d, v) {
                        assert!(tree.dominates(d, idom), "seed {seed}: {d} above {idom}");
                    }
                }
            }
        }
    }
}

#[test]
fn test_generated_post_dominators_cover_every_vertex() {
    for seed in 100..130 {
        let count = 6 + (seed as usize % 7);
        let graph = random_graph(seed, count, count * 2);
        let tree = compute(
            &graph,
            NodeId::new(0),
            NodeId::new(1),
            DominanceDirection::PostDominators,
        )
        .unwrap();

        let map: BTreeMap<NodeId, Option<NodeId>> = graph
            .vertices()
            .map(|v| (v, tree.immediate_dominator(v)))
            .collect();
        for (&v, &ipdom) in &map {
            assert!(tree.contains(v), "seed {seed}: {v} has no post-dominator");
            if v != NodeId::new(1) {
                assert!(ipdom.is_some(), "seed {seed}: {v}");
            }
        }
    }
}

#[test]
fn test_generated_post_dominators_match_brute_force() {
    let (entry, exit) = (NodeId::new(0), NodeId::new(1));
    let mut saw_fake_edges = false;
    for seed in 400..520 {
        let count = 3 + (seed as usize % 14);
        let extra = seed as usize % count;
        let graph = random_graph(seed, count, extra);
        let tree = compute(&graph, entry, exit, DominanceDirection::PostDominators).unwrap();

        // blocks without a path to the exit hang off it through fake edges
        let mut augmented = graph.clone();
        for &v in tree.fake_exit_edges() {
            augmented.ensure_edge(v, exit, Selector::CFG).unwrap();
            saw_fake_edges = true;
        }
        for v in graph.vertices() {
            assert!(
                dfs(&augmented.view(Selector::CFG), v).any(|n| n == exit),
                "seed {seed}: {v} still cannot reach the exit"
            );
        }

        for v in graph.vertices() {
            for d in graph.vertices() {
                assert_eq!(
                    tree.dominates(d, v),
                    brute_force_post_dominates(&augmented, exit, d, v),
                    "seed {seed}: post-dominates({d}, {v})"
                );
            }

            // the immediate post-dominator is the closest strict post-dominator
            if let Some(ipdom) = tree.immediate_dominator(v) {
                assert!(brute_force_post_dominates(&augmented, exit, ipdom, v));
                for d in graph.vertices() {
                    if d != v && brute_force_post_dominates(&augmented, exit, d, v) {
                        assert!(
                            brute_force_post_dominates(&augmented, exit, d, ipdom),
                            "seed {seed}: {d} below {ipdom}"
                        );
                    }
                }
            } else {
                assert_eq!(v, exit, "seed {seed}");
            }
        }
    }
    assert!(saw_fake_edges);
}

#[test]
fn test_rebuild_is_deterministic() {
    let first = random_graph(7, 12, 24);
    let second = random_graph(7, 12, 24);
    let a = compute(&first, NodeId::new(0), NodeId::new(1), DominanceDirection::Dominators)
        .unwrap();
    let b = compute(&second, NodeId::new(0), NodeId::new(1), DominanceDirection::Dominators)
        .unwrap();
    assert_eq!(a.preorder(), b.preorder());
    for v in first.vertices() {
        assert_eq!(a.immediate_dominator(v), b.immediate_dominator(v));
    }
}
