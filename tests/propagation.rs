//! Propagation engine: fan-out, chaining, de-duplication, the live
//! auto-run gate, and defensive handling of structural edits mid-walk.

mod common;

use std::time::Duration;

use common::*;
use convograph::engine::{BeginTurn, TurnOutcome, TurnSource};
use convograph::event_bus::CanvasEvent;
use convograph::graph::EdgeStatus;
use convograph::message::Role;

#[tokio::test]
async fn auto_run_disabled_means_no_forwarding() {
    let (canvas, gateway) = scripted_canvas();
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    canvas.connect(&a, &b);

    canvas.submit(&a, "hello").await.unwrap();

    assert!(gateway.calls_for("model-b").is_empty());
    assert!(canvas.nodes().history(&b).unwrap().is_empty());
}

#[tokio::test]
async fn fan_out_delivers_the_same_payload_to_every_target() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    let c = canvas.create_node("model-c");
    canvas.connect(&a, &b);
    canvas.connect(&a, &c);

    let outcome = canvas.submit(&a, "hello").await.unwrap();
    let TurnOutcome::Replied { text: reply_a, .. } = outcome else {
        panic!("origin should reply");
    };

    // Both targets received exactly one submission carrying A's reply.
    for (node, model) in [(&b, "model-b"), (&c, "model-c")] {
        let calls = gateway.calls_for(model);
        assert_eq!(calls.len(), 1, "{model} should be called exactly once");
        assert_eq!(calls[0].messages.last().unwrap().content, reply_a);

        let history = canvas.nodes().history(node).unwrap();
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, reply_a);
    }
}

#[tokio::test]
async fn chain_forwards_each_hops_own_reply() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    let c = canvas.create_node("model-c");
    canvas.connect(&a, &b);
    canvas.connect(&b, &c);

    canvas.submit(&a, "start").await.unwrap();

    // The echo gateway answers "model-x answers: <input>", so each hop's
    // payload is attributable. C must have received B's reply, not A's.
    let reply_a = "model-a answers: start";
    let reply_b = format!("model-b answers: {reply_a}");

    assert_eq!(canvas.nodes().history(&b).unwrap()[0].content, reply_a);
    let c_history = canvas.nodes().history(&c).unwrap();
    assert_eq!(c_history[0].content, reply_b);
    assert_eq!(c_history[1].role, Role::Assistant);
    assert_eq!(gateway.call_count(), 3);
}

#[tokio::test]
async fn duplicate_payload_is_suppressed_without_a_gateway_call() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    canvas.connect(&a, &b);
    canvas.nodes().append_user_turn(&b, "X");

    canvas.propagate(&a, "X").await;

    let history = canvas.nodes().history(&b).unwrap();
    assert_eq!(history.len(), 1, "no second X turn may be appended");
    assert!(gateway.calls_for("model-b").is_empty());

    let events = canvas.events().drain();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CanvasEvent::DuplicateSuppressed { node, .. } if node == &b))
    );
}

#[tokio::test]
async fn duplicate_fan_in_reaches_a_shared_target_once() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    let c = canvas.create_node("model-c");
    // Two paths converge on B with the same payload text.
    canvas.connect(&a, &b);
    canvas.connect(&c, &b);

    canvas.propagate(&a, "shared payload").await;
    canvas.propagate(&c, "shared payload").await;

    assert_eq!(gateway.calls_for("model-b").len(), 1);
    let history = canvas.nodes().history(&b).unwrap();
    assert_eq!(
        history
            .iter()
            .filter(|t| t.is_user() && t.content == "shared payload")
            .count(),
        1
    );
}

#[tokio::test]
async fn toggling_auto_run_off_before_the_reply_resolves_stops_propagation() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    canvas.connect(&a, &b);
    gateway.script_delayed_reply("model-a", "slow reply", Duration::from_millis(60));

    let task = {
        let canvas = canvas.clone();
        let a = a.clone();
        tokio::spawn(async move { canvas.submit(&a, "q").await })
    };

    // Auto-run was enabled at submission time; disabling it before the
    // pending reply lands must win.
    tokio::time::sleep(Duration::from_millis(15)).await;
    canvas.settings().set_auto_run(false);

    let outcome = task.await.unwrap().unwrap();
    assert!(matches!(outcome, TurnOutcome::Replied { .. }));
    assert!(gateway.calls_for("model-b").is_empty());
    assert!(canvas.nodes().history(&b).unwrap().is_empty());
}

#[tokio::test]
async fn gate_is_reread_at_every_hop() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    let c = canvas.create_node("model-c");
    canvas.connect(&a, &b);
    canvas.connect(&b, &c);
    gateway.script_delayed_reply("model-b", "slow middle reply", Duration::from_millis(60));

    let task = {
        let canvas = canvas.clone();
        let a = a.clone();
        tokio::spawn(async move { canvas.submit(&a, "start").await })
    };

    // A's hop to B happens under an enabled gate; flipping it while B's
    // call is in flight stops the chain before C.
    tokio::time::sleep(Duration::from_millis(20)).await;
    canvas.settings().set_auto_run(false);
    task.await.unwrap().unwrap();

    assert_eq!(gateway.calls_for("model-b").len(), 1);
    assert!(gateway.calls_for("model-c").is_empty());
    assert!(canvas.nodes().history(&c).unwrap().is_empty());
}

#[tokio::test]
async fn a_failing_hop_terminates_only_its_branch() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    let c = canvas.create_node("model-c");
    let d = canvas.create_node("model-d");
    canvas.connect(&a, &b);
    canvas.connect(&b, &c);
    canvas.connect(&a, &d);
    gateway.script_failure("model-b", "connection refused");

    canvas.submit(&a, "go").await.unwrap();

    // B failed: error line recorded, chain to C never ran.
    assert!(
        canvas
            .nodes()
            .render_transcript(&b)
            .unwrap()
            .contains("[error]: ")
    );
    assert!(gateway.calls_for("model-c").is_empty());
    // The sibling branch through D was unaffected.
    assert_eq!(gateway.calls_for("model-d").len(), 1);
    assert_eq!(canvas.nodes().history(&d).unwrap().len(), 2);
}

#[tokio::test]
async fn edges_whose_target_vanished_are_skipped_silently() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    canvas.connect(&a, &b);

    // Remove the node behind the store's back of the edge set, leaving a
    // stale edge the walk must tolerate.
    canvas.nodes().remove(&b);
    assert_eq!(canvas.edges().len(), 1);

    canvas.submit(&a, "q").await.unwrap();

    assert_eq!(gateway.call_count(), 1);
    assert!(gateway.calls_for("model-b").is_empty());
}

#[tokio::test]
async fn busy_target_rejects_the_delivery_and_the_branch_ends() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    canvas.connect(&a, &b);

    // Occupy B's single in-flight slot.
    let ticket = match canvas.begin_turn(&b, "held", TurnSource::Typed).unwrap() {
        BeginTurn::Started(ticket) => ticket,
        BeginTurn::Suppressed => unreachable!(),
    };

    canvas.propagate(&a, "payload").await;

    assert!(gateway.calls_for("model-b").is_empty());
    assert_eq!(canvas.nodes().history(&b).unwrap().len(), 1);

    canvas.complete_turn(ticket, Ok(convograph::gateway::GatewayReply::new("ok")));
}

#[tokio::test]
async fn a_cycle_with_fresh_payloads_is_cut_at_the_depth_bound() {
    let (canvas, gateway) = scripted_canvas_with_depth(Some(3));
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    canvas.connect(&a, &b);
    canvas.connect(&b, &a);

    // The echo gateway produces a longer, distinct payload every hop, so
    // the per-target duplicate check alone would never stop this cycle.
    canvas.submit(&a, "seed").await.unwrap();

    // Origin call plus one delivery per depth 0, 1, 2; depth 3 truncates.
    assert_eq!(gateway.call_count(), 4);
    let events = canvas.events().drain();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CanvasEvent::ChainTruncated { depth: 3, .. }))
    );
}

#[tokio::test]
async fn edge_status_goes_active_during_delivery_and_back_to_idle() {
    let (canvas, gateway) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    let edge = canvas.connect(&a, &b).unwrap();
    gateway.script_delayed_reply("model-b", "slow", Duration::from_millis(80));

    let task = {
        let canvas = canvas.clone();
        let a = a.clone();
        tokio::spawn(async move { canvas.submit(&a, "q").await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(
        canvas.edges().get(&edge).unwrap().status,
        EdgeStatus::Active
    );

    task.await.unwrap().unwrap();
    assert_eq!(canvas.edges().get(&edge).unwrap().status, EdgeStatus::Idle);
}

#[tokio::test]
async fn propagation_emits_turn_events_for_piped_deliveries() {
    let (canvas, _) = scripted_canvas();
    canvas.settings().set_auto_run(true);
    let a = canvas.create_node("model-a");
    let b = canvas.create_node("model-b");
    canvas.connect(&a, &b);

    canvas.submit(&a, "hello").await.unwrap();

    let events = canvas.events().drain();
    assert!(events.iter().any(|e| matches!(
        e,
        CanvasEvent::TurnStarted { node, source: TurnSource::Piped, .. } if node == &b
    )));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CanvasEvent::TurnReplied { node, .. } if node == &b))
    );
}
