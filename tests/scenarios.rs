//! End-to-end scenarios against the public API

use dlr_graph::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn two_node_graph() {
    init_tracing();
    let mut ctx: GraphContext<()> = GraphContext::new();
    ctx.create_node(1, None);
    ctx.create_node(2, None);
    ctx.add_inputs(2, &[1]);

    assert_eq!(ctx.node_inputs(2), vec![1]);
    assert!(ctx.node_inputs(1).is_empty());
    assert_eq!(ctx.vertex_count(), 2);
}

#[test]
fn wiring_unknown_identity_is_silent() {
    init_tracing();
    let mut ctx: GraphContext<()> = GraphContext::new();
    ctx.create_node(1, None);
    ctx.create_node(2, None);

    assert_eq!(ctx.add_inputs(2, &[99]), 0);
    assert!(ctx.node_inputs(2).is_empty());
}

#[test]
fn inputs_follow_creation_order_not_request_order() {
    let mut ctx: GraphContext<()> = GraphContext::new();
    for id in [10, 20, 30, 40] {
        ctx.create_node(id, None);
    }

    ctx.add_inputs(40, &[30, 10, 20]);
    assert_eq!(ctx.node_inputs(40), vec![10, 20, 30]);
}

#[test]
fn dump_ignores_edges() {
    let mut ctx: GraphContext<()> = GraphContext::new();
    for id in 1..=3 {
        ctx.create_node(id, None);
    }
    let before = ctx.dump();
    ctx.add_inputs(1, &[3, 2]);

    assert_eq!(before, "-> 1 -> 2 -> 3");
    assert_eq!(ctx.dump(), before);
}

#[test]
fn duplicate_identity_shadows() {
    let mut ctx: GraphContext<&str> = GraphContext::new();
    ctx.create_node(1, Some("first"));
    ctx.create_node(1, Some("second"));

    assert_eq!(ctx.vertex_count(), 2);
    assert_eq!(ctx.payload(1), Some(&"first"));
    assert_eq!(ctx.dump(), "-> 1 -> 1");
}

#[test]
fn real_and_virtual_payloads() {
    let mut ctx: GraphContext<Vec<f32>> = GraphContext::new();
    ctx.create_node(1, Some(vec![0.5, 1.5]));
    ctx.create_node(2, None);

    assert_eq!(ctx.payload(1), Some(&vec![0.5, 1.5]));
    assert!(ctx.payload(2).is_none());
    assert!(ctx.payload(3).is_none());
    assert!(ctx.lookup(2).map(|n| n.is_virtual()).unwrap_or(false));
    assert!(ctx.lookup(3).is_none());
}

#[test]
fn releasing_result_frees_virtual_chain() {
    init_tracing();
    // x (real) -> a (virtual) -> b (virtual) -> out (virtual)
    let mut ctx: GraphContext<String> = GraphContext::new();
    let x = ctx.create_node(1, Some("x".to_string()));
    let a = ctx.create_node(2, None);
    let b = ctx.create_node(3, None);
    let out = ctx.create_node(4, None);
    ctx.add_inputs(2, &[1]);
    ctx.add_inputs(3, &[2]);
    ctx.add_inputs(4, &[3]);

    // intermediates dropped by the host first: still needed by consumers
    assert_eq!(ctx.release(a).unwrap(), 0);
    assert_eq!(ctx.release(b).unwrap(), 0);
    assert_eq!(ctx.live_count(), 4);

    assert_eq!(ctx.release(out).unwrap(), 3);
    assert_eq!(ctx.dump(), "-> 1");
    assert_eq!(ctx.payload(1).map(String::as_str), Some("x"));

    ctx.release(x).unwrap();
    assert!(ctx.is_empty());
    assert_eq!(ctx.vertex_count(), 4);
}

#[test]
fn stale_and_foreign_handles() {
    let mut a: GraphContext<()> = GraphContext::new();
    let mut b: GraphContext<()> = GraphContext::new();
    let h = a.create_node(1, None);

    assert!(matches!(
        b.release(h),
        Err(GraphError::ForeignHandle { .. })
    ));
    a.release(h).unwrap();
    assert_eq!(a.release(h), Err(GraphError::StaleHandle(1)));
    assert!(a.node(h).is_err());
}

#[test]
fn sweep_collects_unreferenced_cycle() {
    let mut ctx: GraphContext<()> = GraphContext::new();
    let keep = ctx.create_node(1, None);
    let handles: Vec<_> = (2..=4).map(|id| ctx.create_node(id, None)).collect();
    ctx.add_inputs(2, &[4]);
    ctx.add_inputs(3, &[2]);
    ctx.add_inputs(4, &[3]);
    for h in handles {
        ctx.release(h).unwrap();
    }

    assert!(find_cycle(&ctx).is_some());
    assert_eq!(ctx.sweep(), 3);
    assert!(find_cycle(&ctx).is_none());
    assert_eq!(ctx.node(keep).unwrap().identity(), 1);
}

#[test]
fn shared_context_across_threads() {
    let shared = GraphContext::<u64>::new().into_shared();

    std::thread::scope(|s| {
        for t in 0..4 {
            let shared = &shared;
            s.spawn(move || {
                for i in 0..25 {
                    let mut ctx = shared.lock().unwrap();
                    ctx.create_node(t * 100 + i, Some(i as u64));
                }
            });
        }
    });

    let ctx = shared.lock().unwrap();
    assert_eq!(ctx.vertex_count(), 100);
    assert_eq!(ctx.live_count(), 100);
}
