//! Public-boundary check that `request_reset` actually empties the
//! fleet without touching the layout underneath it.

use sim::CityController;

#[test]
fn reset_empties_the_fleet_but_keeps_the_layout() {
    let mut controller = CityController::new(5, 11).unwrap();

    for _ in 0..100 {
        controller.tick();
    }
    assert!(!controller.vehicles().is_empty());

    let dim_before = controller.layout().dimension();
    controller.request_reset();

    assert!(controller.vehicles().is_empty());
    assert_eq!(controller.layout().dimension(), dim_before);
}

#[test]
fn reset_is_idempotent() {
    let mut controller = CityController::new(4, 12).unwrap();
    for _ in 0..20 {
        controller.tick();
    }
    controller.request_reset();
    controller.request_reset();
    assert!(controller.vehicles().is_empty());
}

#[test]
fn traffic_resumes_admitting_vehicles_after_a_reset() {
    let mut controller = CityController::new(5, 13).unwrap();
    for _ in 0..50 {
        controller.tick();
    }
    controller.request_reset();
    for _ in 0..50 {
        controller.tick();
    }
    assert!(!controller.vehicles().is_empty());
}
