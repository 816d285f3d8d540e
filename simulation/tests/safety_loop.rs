use simulation::{
    driver::Kinematics, hud::labels, ActorKind, ControlMode, Roadway, Severity, SignalPhase,
    SignalState, Simulation, SimulationConfig, SimulationError,
};

const FRAME: f32 = 1.0 / 60.0;

fn place(sim: &mut Simulation, kind: ActorKind, z: f32) {
    sim.resource_mut::<Roadway>().set_z(kind, z).unwrap();
}

#[test]
fn open_road_holds_cruise() {
    let mut sim = Simulation::default();
    sim.run_for(1.0, FRAME);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.speed, 45.0);
    assert_eq!(snapshot.target_speed, 45.0);
    assert_eq!(snapshot.label, labels::CRUISE);
    assert_eq!(snapshot.severity, Severity::Nominal);
}

#[test]
fn contact_range_stops_in_one_tick() {
    let mut sim = Simulation::default();
    place(&mut sim, ActorKind::Lead, -5.0);

    sim.step_secs(FRAME);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.speed, 0.0);
    assert_eq!(snapshot.target_speed, 0.0);
    assert_eq!(snapshot.label, labels::AEB_LEAD);
}

#[test]
fn lead_braking_outranks_red_signal() {
    let mut sim = Simulation::default();
    place(&mut sim, ActorKind::Lead, -10.0);
    place(&mut sim, ActorKind::StopLine, -30.0);
    sim.resource_mut::<SignalState>().force_red();

    sim.step_secs(FRAME);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.target_speed, 0.0);
    assert_eq!(snapshot.label, labels::AEB_LEAD);
    assert_eq!(snapshot.severity, Severity::Critical);
    // Still a committed signal stop underneath
    assert!(snapshot.signal.stop_line_locked);
}

#[test]
fn red_signal_is_committed_once_per_phase() {
    let mut sim = Simulation::default();
    place(&mut sim, ActorKind::StopLine, -45.0);
    sim.resource_mut::<SignalState>().force_red();

    sim.step_secs(FRAME);
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.label, labels::SIGNAL_STOP);
    assert_eq!(snapshot.severity, Severity::Caution);
    assert!(snapshot.signal.stop_line_locked);
    assert_eq!(snapshot.ticker, simulation::hud::ticker::STOP_COMMITTED);

    // A held stop does not announce itself again
    sim.resource_mut::<simulation::Hud>().announce("other");
    sim.step_secs(FRAME);
    assert_eq!(sim.snapshot().ticker, "other");
    assert_eq!(sim.snapshot().target_speed, 0.0);
}

#[test]
fn vehicle_halts_before_a_red_stop_line() {
    let mut sim = Simulation::default();
    place(&mut sim, ActorKind::StopLine, -80.0);
    sim.resource_mut::<SignalState>().force_red();

    sim.run_for(3.0, FRAME);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.speed, 0.0);
    let line = sim
        .resource::<Roadway>()
        .distance_ahead(ActorKind::StopLine)
        .unwrap();
    assert!(line > 0.0, "crossed the stop line: {line}");
}

#[test]
fn speeds_never_go_negative() {
    let mut sim = Simulation::default();
    let deltas = [FRAME, 0.05, 0.2, 0.001, 0.1];

    for (i, kind) in ["braking", "pedestrian", "signal", "braking"].iter().enumerate() {
        sim.trigger(kind).unwrap();
        for step in 0..240 {
            sim.step_secs(deltas[(i + step) % deltas.len()]);
            let k = sim.resource::<Kinematics>();
            assert!(k.speed >= 0.0);
            assert!(k.target_speed >= 0.0);
            assert!(k.lead_speed >= 0.0);
        }
    }
}

#[test]
fn scenery_never_sits_past_the_camera() {
    let mut sim = Simulation::default();
    let threshold = sim.resource::<SimulationConfig>().recycle_threshold;

    for _ in 0..1800 {
        sim.step_secs(FRAME);
        let roadway = sim.resource::<Roadway>();
        assert!(roadway
            .actors
            .iter()
            .filter(|actor| actor.kind.is_environment())
            .all(|actor| actor.position.z <= threshold));
    }
}

#[test]
fn signal_cycles_every_period() {
    let mut sim = Simulation::default();

    sim.run_for(15.0, 0.25);
    let signal = sim.resource::<SignalState>();
    assert_eq!(signal.phase, SignalPhase::Red);
    assert_eq!(signal.timer, 15.0);

    sim.run_for(15.0, 0.25);
    let signal = sim.resource::<SignalState>();
    assert_eq!(signal.phase, SignalPhase::Green);
    assert!(!signal.stop_line_locked);
}

#[test]
fn manual_displacement_moves_scenery_once() {
    let mut sim = Simulation::default();
    sim.request_displacement(10.0).unwrap();

    sim.step_secs(0.25);
    // (45 * 0.25 + 10) * 1.5
    assert_eq!(sim.snapshot().z_of(ActorKind::StopLine), Some(-138.125));

    sim.step_secs(0.25);
    assert_eq!(sim.snapshot().z_of(ActorKind::StopLine), Some(-121.25));
}

#[test]
fn oversized_displacement_engages_aeb_alert() {
    let mut sim = Simulation::default();

    let err = sim.request_displacement(151.0).unwrap_err();
    assert_eq!(
        err,
        SimulationError::DisplacementRejected {
            requested: 151.0,
            limit: 150.0
        }
    );
    assert_eq!(sim.snapshot().alert.unwrap().title, "AEB ACTIVE");
    assert_eq!(sim.resource::<Roadway>().pending_shift(), 0.0);

    assert!(matches!(
        sim.request_displacement(f32::NAN),
        Err(SimulationError::InvalidDisplacement(_))
    ));
}

#[test]
fn set_point_lowers_cruise() {
    let mut sim = Simulation::default();
    assert_eq!(sim.set_cruise_set_point(30.0), 30.0);

    sim.run_for(2.0, FRAME);
    assert_eq!(sim.snapshot().speed, 30.0);

    assert_eq!(sim.set_cruise_set_point(400.0), 45.0);
    assert_eq!(sim.set_cruise_set_point(f32::NAN), 45.0);
}

#[test]
fn missing_actors_brake_instead_of_failing() {
    let mut sim = Simulation::default();
    *sim.resource_mut::<Roadway>() = Roadway::default();

    sim.step_secs(FRAME);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.speed, 0.0);
    assert_eq!(snapshot.label, labels::AEB_LEAD);
    assert!(snapshot.actors.is_empty());
}

#[test]
fn risk_tiers_set_target_after_one_tick() {
    let mut sim = Simulation::new(SimulationConfig::default().with_mode(ControlMode::RiskFeed));

    for (tag, expected) in [("SAFE", 45.0), ("MEDIUM", 30.0), ("HIGH", 12.0), ("CRITICAL", 0.0)] {
        sim.push_risk(tag, "test event").unwrap();
        sim.step_secs(FRAME);
        assert_eq!(sim.snapshot().target_speed, expected, "{tag}");
    }
}

#[test]
fn risk_alerts_carry_the_event() {
    let mut sim = Simulation::new(SimulationConfig::default().with_mode(ControlMode::RiskFeed));

    sim.push_risk("HIGH", "stalled truck beyond the bend").unwrap();
    sim.step_secs(FRAME);

    let snapshot = sim.snapshot();
    let alert = snapshot.alert.unwrap();
    assert_eq!(alert.description, "stalled truck beyond the bend");
    assert_eq!(snapshot.label, labels::V2X_HAZARD);
}

#[test]
fn unknown_risk_tag_keeps_last_classification() {
    let mut sim = Simulation::new(SimulationConfig::default().with_mode(ControlMode::RiskFeed));
    sim.push_risk("MEDIUM", "fog bank").unwrap();

    let err = sim.push_risk("YELLOW", "bad tag").unwrap_err();
    assert_eq!(err, SimulationError::InvalidRiskTag("YELLOW".to_string()));

    sim.step_secs(FRAME);
    assert_eq!(sim.snapshot().target_speed, 30.0);
}

#[test]
fn risk_mode_brakes_at_the_ordinary_rate() {
    let mut sim = Simulation::new(SimulationConfig::default().with_mode(ControlMode::RiskFeed));
    sim.push_risk("CRITICAL", "collision ahead").unwrap();

    sim.step_secs(0.5);

    // 45 - 32 * 0.5, no emergency rate in this mode
    assert_eq!(sim.snapshot().speed, 29.0);
}

#[test]
fn snapshot_serializes_for_the_renderer() {
    let sim = Simulation::default();
    let json = serde_json::to_value(sim.snapshot()).unwrap();

    assert_eq!(json["signal"]["phase"], "green");
    assert_eq!(json["label"], labels::CRUISE);
    assert_eq!(json["actors"][0]["kind"], "lead");
    assert_eq!(json["actors"][0]["position"][2], -40.0);
}

#[test]
fn safe_report_clears_an_earlier_alert() {
    let mut sim = Simulation::new(SimulationConfig::default().with_mode(ControlMode::RiskFeed));

    sim.push_risk("CRITICAL", "wrong-way driver").unwrap();
    sim.step_secs(FRAME);
    assert!(sim.snapshot().alert.is_some());

    sim.push_risk("SAFE", "road clear").unwrap();
    sim.step_secs(FRAME);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.alert, None);
    assert_eq!(snapshot.label, labels::CRUISE);
    assert_eq!(snapshot.target_speed, 45.0);
}

#[test]
fn medium_report_replaces_a_high_alert() {
    let mut sim = Simulation::new(SimulationConfig::default().with_mode(ControlMode::RiskFeed));

    sim.push_risk("HIGH", "debris").unwrap();
    sim.step_secs(FRAME);
    sim.push_risk("MEDIUM", "fog bank").unwrap();
    sim.step_secs(FRAME);

    assert_eq!(sim.snapshot().alert, None);
    assert_eq!(sim.snapshot().label, labels::V2X_CAUTION);
}

#[test]
fn degenerate_runs_do_nothing() {
    let mut sim = Simulation::default();

    sim.run_for(0.1, 0.0);
    sim.run_for(1.0, -0.1);
    sim.run_for(1.0, f32::NAN);
    sim.run_for(f32::INFINITY, FRAME);
    sim.run_for(-1.0, FRAME);

    assert_eq!(sim.resource::<SignalState>().timer, 15.0);
    assert_eq!(sim.snapshot().z_of(ActorKind::StopLine), Some(-170.0));
}
