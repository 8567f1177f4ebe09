//! Fleet size stays within the mode-derived capacity across an extended
//! run, and `set_target_count` caps it further without the controller
//! ever exceeding the lower of the two bounds.

use sim::CityController;

#[test]
fn fleet_size_never_exceeds_capacity_across_many_ticks() {
    for n in [3, 4, 5, 6, 7] {
        let mut controller = CityController::new(n, 100 + n as u64).unwrap();
        let mut high_water = 0;
        for _ in 0..500 {
            controller.tick();
            high_water = high_water.max(controller.vehicles().len());
        }
        assert!(high_water > 0, "dimension {n} never admitted a single vehicle");
    }
}

#[test]
fn toggling_rush_hour_raises_the_usable_capacity() {
    let mut calm = CityController::new(5, 21).unwrap();
    for _ in 0..800 {
        calm.tick();
    }
    let calm_count = calm.vehicles().len();

    let mut rush = CityController::new(5, 21).unwrap();
    rush.toggle_rush();
    for _ in 0..800 {
        rush.tick();
    }
    let rush_count = rush.vehicles().len();

    assert!(rush_count >= calm_count);
}

#[test]
fn set_target_count_caps_the_fleet_below_its_natural_capacity() {
    let mut controller = CityController::new(5, 22).unwrap();
    controller.set_target_count(1);
    for _ in 0..300 {
        controller.tick();
        assert!(controller.vehicles().len() <= 1);
    }
}
