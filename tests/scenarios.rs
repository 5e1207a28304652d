//! End-to-end seed scenarios (spec §8) driven through the public `Strategy`
//! contract and the in-memory `TestNetwork` fixture.

use edge_placement_core::config::StrategyConfig;
use edge_placement_core::event::{Event, StatusCode};
use edge_placement_core::ids::NodeId;
use edge_placement_core::strategy::{Coordinated, Hybrid, Lru, MostFrequentlyUsed, StrictestDeadlineFirst, Strategy};
use edge_placement_core::task::AdmissionReason;
use edge_placement_core::testing::TestNetwork;

/// S1 — single receiver, two hops, deadline met.
///
/// `R -> E -> C`: the edge has one resident VM for the requested service, so
/// the request never has to travel all the way to the cloud.
#[test]
fn s1_single_receiver_two_hops_deadline_met() {
    let r = NodeId(0);
    let e = NodeId(1);
    let c = NodeId(2);

    let mut net = TestNetwork::new();
    net.link(r, e, 1.0).link(e, c, 1.0).receiver(r);
    let service = net.service(1.0, 10.0, c);
    net.edge_spot(e, 1, 1, 1);
    net.cloud_spot(c);

    let mut strategy = Lru::new(&StrategyConfig::default());
    let seed = Event { time: 0.0, receiver: r, service, node: r, flow_id: 1, deadline: 10.0, rtt_delay: 0.0, status: StatusCode::Request };
    net.run(&mut strategy, seed, 20).unwrap();

    assert_eq!(net.sessions_started.len(), 1);
    assert_eq!(net.sessions_ended.len(), 1);
    assert!(net.sessions_ended[0].successful);
    assert_eq!(net.sessions_ended[0].time, 3.0, "2*link_delay + service_time");

    let edge_exec = net.executions.iter().find(|ex| ex.node == e).expect("edge should have executed the task");
    assert_eq!(edge_exec.time, 1.0, "arrives at the edge after one link delay");
    assert!(!edge_exec.is_cloud);
}

/// S2 — a request for a non-resident service is forced to the cloud and
/// still completes successfully.
#[test]
fn s2_deadline_miss_forces_cloud_fallback() {
    let r = NodeId(0);
    let e = NodeId(1);
    let c = NodeId(2);

    let mut net = TestNetwork::new();
    net.link(r, e, 1.0).link(e, c, 1.0).receiver(r);
    // Two services sharing one VM at the edge: round-robin seeds it onto
    // service 0, leaving service 1 with no resident instance.
    let filler = net.service(1.0, 10.0, c);
    let requested = net.service(1.0, 10.0, c);
    net.edge_spot(e, 1, 1, 2);
    net.cloud_spot(c);
    assert!(net.comp_spots[&e].has_service(filler));
    assert!(!net.comp_spots[&e].has_service(requested));

    // p=0: LRU never evicts to make room, so the request must continue to
    // the cloud on every hop.
    let mut config = StrategyConfig::default();
    config.p = 0.0;
    let mut strategy = Lru::new(&config);

    let seed = Event { time: 0.0, receiver: r, service: requested, node: r, flow_id: 7, deadline: 10.0, rtt_delay: 0.0, status: StatusCode::Request };
    net.run(&mut strategy, seed, 20).unwrap();

    assert_eq!(net.sessions_ended.len(), 1);
    assert!(net.sessions_ended[0].successful);
    assert!(net.executions.iter().any(|ex| ex.node == c && ex.is_cloud), "cloud must have executed the task");
    assert_eq!(net.comp_spots[&e].missed_requests.get(&requested).copied().unwrap_or(0), 1);
}

/// S3 — a second back-to-back admission that would push the first task's
/// deadline is rejected with CONGESTION, and the first admission is
/// unaffected by the rollback.
#[test]
fn s3_congestion_rejects_second_admission_leaving_first_untouched() {
    let node = NodeId(0);
    let receiver = NodeId(1);

    let mut net = TestNetwork::new();
    net.edge_spot(node, 1, 1, 1);
    let service = net.service(5.0, 6.0, node);

    let (mut view, mut controller) = net.split();
    use edge_placement_core::view::View;
    let svc = view.services()[service.index()];
    let compspot = view.comp_spot_mut(node);

    let (ok1, reason1) = compspot.admit_task(&svc, 0.0, 1, 6.0, receiver, 0.0, 0.0, &mut controller);
    assert!(ok1);
    assert_eq!(reason1, AdmissionReason::Success);
    let busy_after_first = compspot.scheduler.cores[0].busy_until;
    assert_eq!(busy_after_first, 5.0);

    let (ok2, reason2) = compspot.admit_task(&svc, 0.0, 2, 6.0, receiver, 0.0, 0.0, &mut controller);
    assert!(!ok2);
    assert_eq!(reason2, AdmissionReason::Congestion);
    assert_eq!(compspot.scheduler.cores[0].busy_until, busy_after_first, "rejected admission must not disturb the first task");
    assert_eq!(compspot.missed_requests.get(&service), Some(&1));
}

/// S4 — COORDINATED places demand-heavy service 0 at the edge shared by two
/// receivers after a single replacement pass.
#[test]
fn s4_coordinated_places_hot_service_at_shared_edge() {
    let r0 = NodeId(0);
    let r1 = NodeId(1);
    let r2 = NodeId(2);
    let e = NodeId(3);
    let c = NodeId(4);

    let mut net = TestNetwork::new();
    net.link(r0, e, 1.0).link(r1, e, 1.0).link(r2, e, 1.0).link(e, c, 1.0);
    net.receiver(r0).receiver(r1).receiver(r2);
    net.depth(e, 1);
    net.edge_spot(e, 4, 2, 2);
    net.cloud_spot(c);
    let service0 = net.service(1.0, 20.0, c);
    let service1 = net.service(1.0, 20.0, c);

    let mut strategy = Coordinated::new(&StrategyConfig::default());
    let mut flow = 0u64;
    let mut fire = |net: &mut TestNetwork, receiver: NodeId, service: edge_placement_core::ids::ServiceId, time: f64, flow: u64| {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time, receiver, service, node: receiver, flow_id: flow, deadline: 20.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    };

    for _ in 0..3 {
        flow += 1;
        fire(&mut net, r0, service0, 0.0, flow);
    }
    for _ in 0..3 {
        flow += 1;
        fire(&mut net, r1, service0, 0.0, flow);
    }
    flow += 1;
    fire(&mut net, r2, service1, 0.0, flow);

    // More than replacement_interval (default 10) has elapsed: this call's
    // gate check runs replace_services before processing its own request.
    flow += 1;
    fire(&mut net, r0, service0, 11.0, flow);

    let edge = &net.comp_spots[&e];
    let placed = edge.service_instances.get(&service0).copied().unwrap_or(0);
    assert!(placed >= 1, "edge shared by two heavy receivers should hold service 0, got {placed}");
    assert_eq!(edge.service_instances.values().sum::<u32>(), edge.num_vms, "VM total must be conserved across a replacement pass");
}

/// §8 invariant 4 — a replacement pass is a no-op when every counter is
/// still zero at the start of the interval.
#[test]
fn coordinated_replacement_is_idempotent_under_zero_traffic() {
    let e = NodeId(0);
    let c = NodeId(1);

    let mut net = TestNetwork::new();
    net.link(e, c, 1.0);
    net.depth(e, 1);
    net.edge_spot(e, 2, 2, 2);
    net.cloud_spot(c);
    let service0 = net.service(1.0, 20.0, c);
    let _service1 = net.service(1.0, 20.0, c);

    let before = net.comp_spots[&e].service_instances.clone();

    // The very first event in the simulation is more than replacement_interval
    // past `last_replacement` (which starts at 0), so this call's gate check
    // runs `replace_services` against all-zero demand before it does anything
    // else.
    let mut strategy = Coordinated::new(&StrategyConfig::default());
    let (mut view, mut controller) = net.split();
    strategy
        .process_event(&mut view, &mut controller, Event { time: 11.0, receiver: e, service: service0, node: e, flow_id: 1, deadline: 20.0, rtt_delay: 0.0, status: StatusCode::Request })
        .unwrap();

    let after = &net.comp_spots[&e].service_instances;
    assert_eq!(after.values().sum::<u32>(), net.comp_spots[&e].num_vms);
    assert_eq!(*after, before, "zero-traffic replacement pass must leave placement untouched");
}

/// S5 — HYBRID reassigns a VM from a resident service with ample slack to an
/// urgently-demanded absent one.
#[test]
fn s5_hybrid_swaps_low_slack_resident_for_urgent_missed_service() {
    let e = NodeId(0);
    let r = NodeId(1);
    let c = NodeId(2);

    let mut net = TestNetwork::new();
    net.link(e, r, 1.0).link(e, c, 1.0);
    net.edge_spot(e, 8, 1, 2);
    net.cloud_spot(c);
    // Round-robin seeds the single VM onto `resident` (index 0 % 2).
    let resident = net.service(1.0, 100.0, c);
    let missed = net.service(1.0, 100.0, c);
    assert!(net.comp_spots[&e].has_service(resident));
    assert!(!net.comp_spots[&e].has_service(missed));

    let mut strategy = Hybrid::new(&StrategyConfig::default());

    // One admitted request for the resident service with 8 units of slack.
    {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: resident, node: e, flow_id: 1, deadline: 9.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }

    // A hundred forwarded requests for the non-resident service, each with
    // only 1 unit of slack: urgent, frequent demand for a service with no
    // resident VM.
    for i in 0..100u64 {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: missed, node: e, flow_id: 100 + i, deadline: 2.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }

    // Trigger the replacement gate.
    {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 11.0, receiver: r, service: resident, node: e, flow_id: 999, deadline: 100.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }

    assert!(
        net.reassignments.iter().any(|re| re.node == e && re.from_service == Some(resident) && re.to_services == vec![missed]),
        "expected one VM to move from the slack-rich resident service to the urgent missed one, got {:?}",
        net.reassignments
    );
}

/// S6 — MFU and SDF disagree on which absent service deserves a freed VM:
/// MFU follows raw request volume, SDF follows deadline urgency.
fn build_divergence_network() -> (TestNetwork, NodeId, NodeId, edge_placement_core::ids::ServiceId, edge_placement_core::ids::ServiceId, edge_placement_core::ids::ServiceId) {
    let e = NodeId(0);
    let r = NodeId(1);
    let c = NodeId(2);

    let mut net = TestNetwork::new();
    net.link(e, r, 1.0).link(e, c, 1.0);
    net.edge_spot(e, 8, 1, 3);
    net.cloud_spot(c);
    // Round-robin with population 3 and 1 VM seeds `resident` (index 0 % 3).
    let resident = net.service(1.0, 50.0, c);
    let frequent = net.service(1.0, 50.0, c); // many small requests
    let urgent = net.service(1.0, 50.0, c); // few, tight-deadline requests
    (net, e, r, resident, frequent, urgent)
}

#[test]
fn s6_mfu_prefers_the_high_volume_candidate() {
    let (mut net, e, r, resident, frequent, urgent) = build_divergence_network();
    let mut strategy = MostFrequentlyUsed::new(&StrategyConfig::default());

    // A couple of lightly-used admitted requests for the resident service.
    for i in 0..2u64 {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: resident, node: e, flow_id: i, deadline: 20.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }
    // `frequent`: 80 forwarded requests, generous deadlines.
    for i in 0..80u64 {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: frequent, node: e, flow_id: 1_000 + i, deadline: 20.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }
    // `urgent`: only 3 forwarded requests, but razor-thin deadlines.
    for i in 0..3u64 {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: urgent, node: e, flow_id: 2_000 + i, deadline: 1.02, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }
    // Trigger the replacement gate.
    {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 11.0, receiver: r, service: resident, node: e, flow_id: 9_999, deadline: 50.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }

    assert!(
        net.reassignments.iter().any(|re| re.node == e && re.from_service == Some(resident) && re.to_services == vec![frequent]),
        "MFU should swap the resident VM to the high-volume candidate, got {:?}",
        net.reassignments
    );
}

#[test]
fn s6_sdf_prefers_the_tight_deadline_candidate() {
    let (mut net, e, r, resident, frequent, urgent) = build_divergence_network();
    let mut strategy = StrictestDeadlineFirst::new(&StrategyConfig::default());

    // One admitted request for the resident service with ample slack.
    {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: resident, node: e, flow_id: 1, deadline: 10.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }
    // `frequent`: many requests, but generous deadlines (low urgency).
    for i in 0..80u64 {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: frequent, node: e, flow_id: 1_000 + i, deadline: 20.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }
    // `urgent`: few requests, but razor-thin deadlines (high urgency).
    for i in 0..3u64 {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 0.0, receiver: r, service: urgent, node: e, flow_id: 2_000 + i, deadline: 1.02, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }
    // Trigger the replacement gate.
    {
        let (mut view, mut controller) = net.split();
        strategy
            .process_event(&mut view, &mut controller, Event { time: 11.0, receiver: r, service: resident, node: e, flow_id: 9_999, deadline: 50.0, rtt_delay: 0.0, status: StatusCode::Request })
            .unwrap();
    }

    assert!(
        net.reassignments.iter().any(|re| re.node == e && re.from_service == Some(resident) && re.to_services == vec![urgent]),
        "SDF should swap the resident VM to the tight-deadline candidate, got {:?}",
        net.reassignments
    );
}

/// §8 invariant 6 — a cloud compute spot never refuses an admission.
#[test]
fn cloud_spot_never_rejects_admission() {
    use edge_placement_core::compute_spot::ComputeSpot;
    use edge_placement_core::service::Service;
    use edge_placement_core::ids::ServiceId;

    struct NullController;
    impl edge_placement_core::controller::Controller for NullController {
        fn start_session(&mut self, _: f64, _: NodeId, _: ServiceId, _: bool, _: u64, _: f64) {}
        fn end_session(&mut self, _: bool, _: f64, _: u64) {}
        fn add_event(&mut self, _: f64, _: NodeId, _: ServiceId, _: NodeId, _: u64, _: f64, _: f64, _: StatusCode) {}
        fn execute_service(&mut self, _: u64, _: ServiceId, _: NodeId, _: f64, _: bool) {}
        fn replacement_interval_over(&mut self, _: u64, _: f64, _: f64) {}
        fn put_content(&mut self, _: NodeId, _: ServiceId) -> Option<ServiceId> {
            None
        }
        fn get_content(&mut self, _: NodeId, _: ServiceId) {}
        fn reassign_vm(&mut self, _: NodeId, _: Option<ServiceId>, _: &[ServiceId]) {}
    }

    let mut cs = ComputeSpot::new_cloud(NodeId(0));
    let svc = Service { service_id: ServiceId(0), service_time: 50.0, deadline: 0.001 };
    let mut controller = NullController;
    for i in 0..10 {
        let (ok, reason) = cs.admit_task(&svc, i as f64, i, 0.001, NodeId(1), 0.0, 0.0, &mut controller);
        assert!(ok, "cloud spot must admit every task regardless of deadline pressure");
        assert_eq!(reason, AdmissionReason::Cloud);
    }
}
