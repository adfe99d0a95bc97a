//! End-to-end planning: raw secondary-store documents plus primary records
//! in, an auditable change plan out.

use tessmatch::index::by_name;
use tessmatch::planner::ChangeAction;
use tessmatch::{
    Coordinates, Photometer, ReconcileConfig, ReconcileError, Reconciler, StoreSide,
};

fn primary(name: &str, mac: &str, lon: f64, lat: f64, place: &str, tz: &str) -> Photometer {
    let mut r = Photometer::new(name, StoreSide::Primary);
    r.mac = mac.parse().ok();
    r.coordinates = Some(Coordinates::new(lon, lat));
    r.place = Some(place.to_string());
    r.timezone = Some(tz.to_string());
    r
}

fn secondary_from_json(doc: serde_json::Value) -> Photometer {
    serde_json::from_value(doc).unwrap()
}

fn secondary_doc(name: &str, mac: &str, lon: f64, lat: f64, place: &str, tz: &str) -> Photometer {
    secondary_from_json(serde_json::json!({
        "name": name,
        "mac": mac,
        "coordinates": { "longitude": lon, "latitude": lat },
        "place": place,
        "town": null,
        "sub_region": null,
        "region": null,
        "country": null,
        "timezone": tz,
        "zero_point": null,
        "side": "Secondary"
    }))
}

#[test]
fn full_plan_covers_all_four_actions() {
    let primary_index = by_name(vec![
        // Agrees exactly with the secondary.
        primary("stars1", "AA:BB:CC:DD:EE:01", -3.7, 40.4, "Madrid", "Europe/Madrid"),
        // Same spot, stale place label on the secondary side.
        primary("stars2", "AA:BB:CC:DD:EE:02", -3.7, 40.5, "Villaverde", "Europe/Madrid"),
        // ~150 m drift: same place, snap coordinates.
        primary("stars3", "AA:BB:CC:DD:EE:03", -3.7, 40.6, "Coslada", "Europe/Madrid"),
        // ~5.5 km: the device was physically moved.
        primary("stars4", "AA:BB:CC:DD:EE:04", -3.7, 40.7, "Alcobendas", "Europe/Madrid"),
    ]);
    let secondary_index = by_name(vec![
        secondary_doc("stars1", "aa:bb:cc:dd:ee:1", -3.7, 40.4, "Madrid", "Europe/Madrid"),
        secondary_doc("stars2", "aa:bb:cc:dd:ee:2", -3.7, 40.5, "villaverde alto", "Europe/Madrid"),
        secondary_doc("stars3", "aa:bb:cc:dd:ee:3", -3.7, 40.60135, "Coslada", "Europe/Madrid"),
        secondary_doc("stars4", "aa:bb:cc:dd:ee:4", -3.7, 40.75, "Alcobendas", "Europe/Madrid"),
    ]);

    let engine = Reconciler::new(ReconcileConfig::default());
    let plan = engine.plan_changes(&primary_index, &secondary_index);

    assert!(plan.skipped.is_empty());
    assert_eq!(plan.changes.len(), 4);

    let action_of = |name: &str| {
        plan.changes
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.action.clone())
            .unwrap()
    };
    assert_eq!(action_of("stars1"), ChangeAction::NoOp);
    assert_eq!(action_of("stars2"), ChangeAction::MetadataUpdate);
    assert_eq!(action_of("stars3"), ChangeAction::CoordinateUpdate);
    assert_eq!(action_of("stars4"), ChangeAction::NewLocationInsert);

    // The no-op is excluded from effective writes.
    assert_eq!(plan.effective().count(), 3);

    // MAC normalization happened at the boundary: the plan carries the
    // canonical uppercase padded form, not the raw document text.
    let snap = plan.changes.iter().find(|c| c.name == "stars3").unwrap();
    assert_eq!(snap.mac.as_str(), "AA:BB:CC:DD:EE:03");
    assert!(snap.distance_m > 100.0 && snap.distance_m < 200.0);
}

#[test]
fn mac_disagreement_is_excluded_with_the_pair_named() {
    let primary_index = by_name(vec![primary(
        "stars1",
        "AA:BB:CC:DD:EE:01",
        -3.7,
        40.4,
        "Madrid",
        "Europe/Madrid",
    )]);
    let secondary_index = by_name(vec![secondary_doc(
        "stars1",
        "ff:ff:ff:ff:ff:ff",
        -3.7,
        40.4,
        "Madrid",
        "Europe/Madrid",
    )]);

    let engine = Reconciler::new(ReconcileConfig::default());
    let plan = engine.plan_changes(&primary_index, &secondary_index);

    assert!(plan.changes.is_empty());
    assert_eq!(plan.skipped.len(), 1);
    match &plan.skipped[0] {
        ReconcileError::MismatchedCounterpart { key, .. } => assert_eq!(key, "stars1"),
        other => panic!("unexpected skip reason {other:?}"),
    }
}

#[test]
fn ambiguous_and_missing_names_never_reach_planning() {
    let primary_index = by_name(vec![
        // Duplicated on the primary side.
        primary("stars1", "AA:BB:CC:DD:EE:01", -3.7, 40.4, "Madrid", "Europe/Madrid"),
        primary("stars1", "AA:BB:CC:DD:EE:99", -3.7, 40.4, "Madrid", "Europe/Madrid"),
        // Absent from the secondary.
        primary("stars2", "AA:BB:CC:DD:EE:02", -3.7, 40.5, "Madrid", "Europe/Madrid"),
        primary("stars3", "AA:BB:CC:DD:EE:03", -3.7, 40.6, "Madrid", "Europe/Madrid"),
    ]);
    let secondary_index = by_name(vec![
        secondary_doc("stars1", "aa:bb:cc:dd:ee:1", -3.7, 40.4, "Madrid", "Europe/Madrid"),
        secondary_doc("stars3", "aa:bb:cc:dd:ee:3", -3.7, 40.6, "Madrid", "Europe/Madrid"),
    ]);

    let engine = Reconciler::new(ReconcileConfig::default());
    let plan = engine.plan_changes(&primary_index, &secondary_index);

    // Only stars3 pairs cleanly.
    assert_eq!(plan.changes.len(), 1);
    assert_eq!(plan.changes[0].name, "stars3");
    assert_eq!(plan.skipped.len(), 1);
    assert!(matches!(
        plan.skipped[0],
        ReconcileError::AmbiguousKey { .. }
    ));
}

#[test]
fn plan_serializes_for_operator_review() {
    let primary_index = by_name(vec![primary(
        "stars1",
        "AA:BB:CC:DD:EE:01",
        -3.7,
        40.4,
        "Madrid",
        "Europe/Madrid",
    )]);
    let secondary_index = by_name(vec![secondary_doc(
        "stars1",
        "aa:bb:cc:dd:ee:1",
        -3.7,
        40.4,
        "madrid-old",
        "Europe/Madrid",
    )]);

    let engine = Reconciler::new(ReconcileConfig::default());
    let plan = engine.plan_changes(&primary_index, &secondary_index);

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["changes"][0]["name"], "stars1");
    assert_eq!(json["changes"][0]["diffs"][0]["field"], "place");
    assert_eq!(json["changes"][0]["diffs"][0]["before"], "madrid-old");
    assert_eq!(json["changes"][0]["diffs"][0]["after"], "Madrid");
}
