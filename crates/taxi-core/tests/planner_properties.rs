use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use taxi_core::{
    AirfieldGraph, CostModel, NodeId, NodeKind, PathOutcome, Pathfinder, PlanningConstraints,
    Reservations,
};

const TRIALS: u64 = 200;

struct Fixture {
    graph: AirfieldGraph,
    ids: Vec<NodeId>,
    constraints: PlanningConstraints,
}

/// Connected random airfield with up to 12 nodes on distinct grid points,
/// random kinds, a few blocked nodes and a few reserved edges.
fn random_fixture(rng: &mut StdRng) -> Fixture {
    let n = rng.random_range(4..=12);
    let mut cells: Vec<(i32, i32)> = Vec::new();
    while cells.len() < n {
        let cell = (rng.random_range(0..8), rng.random_range(0..8));
        if !cells.contains(&cell) {
            cells.push(cell);
        }
    }

    let mut graph = AirfieldGraph::new();
    let ids: Vec<NodeId> = (0..n).map(|i| NodeId::new(format!("N{}", i))).collect();
    for (id, (x, y)) in ids.iter().zip(&cells) {
        let kind = match rng.random_range(0..10) {
            0 => NodeKind::Runway,
            1 => NodeKind::Spawn,
            _ => NodeKind::Taxiway,
        };
        graph.add_node(id.clone(), (f64::from(*x) * 30.0, f64::from(*y) * 30.0), kind);
    }

    // Random spanning tree, then extra edges.
    for i in 1..n {
        let j = rng.random_range(0..i);
        graph.add_edge(ids[i].clone(), ids[j].clone(), None).unwrap();
    }
    for _ in 0..n {
        let a = rng.random_range(0..n);
        let b = rng.random_range(0..n);
        if a != b {
            graph.add_edge(ids[a].clone(), ids[b].clone(), None).unwrap();
        }
    }

    let mut constraints = PlanningConstraints::default();
    for _ in 0..rng.random_range(0..=2) {
        constraints.blocked.insert(ids[rng.random_range(0..n)].clone());
    }
    let mut reservations = Reservations::new();
    for _ in 0..rng.random_range(0..=3) {
        let from = &ids[rng.random_range(0..n)];
        let neighbors = graph.neighbors(from.as_str());
        if neighbors.is_empty() {
            continue;
        }
        let to = neighbors[rng.random_range(0..neighbors.len())].clone();
        reservations.add_route(&[from.clone(), to]);
    }
    constraints.reservations = reservations;

    Fixture {
        graph,
        ids,
        constraints,
    }
}

fn walk_cost(
    model: &CostModel,
    graph: &AirfieldGraph,
    path: &[NodeId],
    constraints: &PlanningConstraints,
) -> Option<f64> {
    let dest = path.last()?;
    let mut total = 0.0;
    for i in 1..path.len() {
        let prev = if i >= 2 { Some(&path[i - 2]) } else { None };
        total += model
            .cost(graph, prev, &path[i - 1], &path[i], constraints, dest)
            .ok()?;
    }
    Some(total)
}

/// Cheapest feasible simple path by exhaustive enumeration.
fn brute_force(
    model: &CostModel,
    graph: &AirfieldGraph,
    start: &NodeId,
    end: &NodeId,
    constraints: &PlanningConstraints,
) -> Option<f64> {
    fn dfs(
        model: &CostModel,
        graph: &AirfieldGraph,
        end: &NodeId,
        constraints: &PlanningConstraints,
        path: &mut Vec<NodeId>,
        best: &mut Option<f64>,
    ) {
        let Some(current) = path.last().cloned() else {
            return;
        };
        if &current == end {
            if let Some(cost) = walk_cost(model, graph, path, constraints) {
                if best.map_or(true, |b| cost < b) {
                    *best = Some(cost);
                }
            }
            return;
        }
        for next in graph.neighbors(current.as_str()) {
            if path.contains(next) {
                continue;
            }
            path.push(next.clone());
            dfs(model, graph, end, constraints, path, best);
            path.pop();
        }
    }

    let mut best = None;
    let mut path = vec![start.clone()];
    dfs(model, graph, end, constraints, &mut path, &mut best);
    best
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

fn assert_constraints_hold(path: &[NodeId], constraints: &PlanningConstraints) {
    for node in &path[1..] {
        assert!(
            !constraints.blocked.contains(node),
            "route {:?} enters blocked node {}",
            path,
            node
        );
    }
    for pair in path.windows(2) {
        assert!(
            !constraints.reservations.is_reserved(&pair[1], &pair[0]),
            "route {:?} drives {} -> {} against a reservation",
            path,
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn matches_brute_force_without_turn_penalties() {
    let model = CostModel {
        turn_penalty_factor: 0.0,
        u_turn_penalty: 0.0,
        ..CostModel::default()
    };
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..TRIALS {
        let fixture = random_fixture(&mut rng);
        let start = &fixture.ids[0];
        let end = &fixture.ids[fixture.ids.len() - 1];
        let pathfinder = Pathfinder::with_cost_model(&fixture.graph, model.clone());

        let outcome = pathfinder.find_path(start, end, &fixture.constraints);
        let expected = brute_force(&model, &fixture.graph, start, end, &fixture.constraints);

        match (outcome, expected) {
            (PathOutcome::Found(route), Some(best)) => {
                assert!(
                    close(route.cost, best),
                    "A* cost {} differs from brute force {}",
                    route.cost,
                    best
                );
                assert_eq!(route.nodes.first(), Some(start));
                assert_eq!(route.nodes.last(), Some(end));
                assert_constraints_hold(&route.nodes, &fixture.constraints);
            }
            (PathOutcome::Unroutable { .. }, None) => {}
            (outcome, expected) => {
                panic!("A* returned {:?}, brute force {:?}", outcome.path(), expected)
            }
        }
    }
}

#[test]
fn default_model_never_beaten_by_simple_paths() {
    let model = CostModel::default();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..TRIALS {
        let fixture = random_fixture(&mut rng);
        let start = &fixture.ids[0];
        let end = &fixture.ids[fixture.ids.len() - 1];

        let outcome = Pathfinder::new(&fixture.graph).find_path(start, end, &fixture.constraints);
        let best_simple = brute_force(&model, &fixture.graph, start, end, &fixture.constraints);

        assert_eq!(outcome.is_found(), best_simple.is_some());
        if let (Some(route), Some(best)) = (outcome.route(), best_simple) {
            assert!(route.cost <= best || close(route.cost, best));
            let recomputed =
                walk_cost(&model, &fixture.graph, &route.nodes, &fixture.constraints).unwrap();
            assert!(close(recomputed, route.cost));
            assert_constraints_hold(&route.nodes, &fixture.constraints);
        }
    }
}

#[test]
fn trivial_route_for_every_node() {
    let mut rng = StdRng::seed_from_u64(3);
    let fixture = random_fixture(&mut rng);
    let pathfinder = Pathfinder::new(&fixture.graph);
    for id in &fixture.ids {
        let outcome = pathfinder.find_path(id, id, &PlanningConstraints::default());
        assert_eq!(outcome.path(), Some(std::slice::from_ref(id)));
        assert_eq!(outcome.route().map(|route| route.cost), Some(0.0));
    }
}

#[test]
fn reserved_corridor_only_blocks_opposing_direction() {
    let mut graph = AirfieldGraph::new();
    for (i, x) in [0.0, 50.0, 100.0, 150.0].into_iter().enumerate() {
        graph.add_node(format!("A{}", i), (x, 0.0), NodeKind::Taxiway);
    }
    for i in 0..3 {
        graph
            .add_edge(format!("A{}", i), format!("A{}", i + 1), Some("A"))
            .unwrap();
    }
    let corridor: Vec<NodeId> = ["A0", "A1", "A2", "A3"].into_iter().map(NodeId::from).collect();
    let mut constraints = PlanningConstraints::default();
    constraints.reservations.add_route(&corridor);

    let pathfinder = Pathfinder::new(&graph);
    let same_way = pathfinder.find_path(&"A0".into(), &"A3".into(), &constraints);
    assert_eq!(same_way.path(), Some(corridor.as_slice()));

    let against = pathfinder.find_path(&"A3".into(), &"A0".into(), &constraints);
    assert!(!against.is_found());

    let blocked: HashSet<NodeId> = [NodeId::from("A2")].into_iter().collect();
    let constraints = PlanningConstraints::new(blocked, Reservations::new());
    assert!(!pathfinder
        .find_path(&"A0".into(), &"A3".into(), &constraints)
        .is_found());
}
