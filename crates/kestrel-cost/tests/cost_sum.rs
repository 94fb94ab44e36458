//! Cost sum behavior on a full cost set

mod common;

use std::sync::Arc;

use nalgebra::Vector3;

use kestrel_core::state::State;
use kestrel_cost::{
    CostComPosition, CostControl, CostError, CostFrameTranslation, CostModel, CostModelSum, CostState,
    FrameTranslation,
};

use common::*;

fn walking_sum(fixture: &HumanoidFixture) -> CostModelSum {
    let state = fixture.state.clone();
    let mut sum = CostModelSum::with_default_nu(state.clone());
    sum.add_cost("xReg", Arc::new(CostState::new(state.clone()).unwrap()), 1e-2).unwrap();
    sum.add_cost("uReg", Arc::new(CostControl::new(state.clone()).unwrap()), 1e-4).unwrap();
    sum.add_cost(
        "com",
        Arc::new(CostComPosition::new(state.clone(), Vector3::new(0.0, 0.0, 0.85)).unwrap()),
        10.0,
    )
    .unwrap();
    let reference = FrameTranslation {
        frame: fixture.frame(),
        translation: Vector3::new(0.0, -0.1, 0.0),
    };
    sum.add_cost("foot", Arc::new(CostFrameTranslation::new(state, reference).unwrap()), 1e3)
        .unwrap();
    sum
}

#[test]
fn test_totals_are_weighted_item_sums() {
    let fixture = HumanoidFixture::new(7);
    let sum = walking_sum(&fixture);
    let mut data = sum.create_data();
    sum.calc_diff(&mut data, &fixture.kin, &fixture.x, &fixture.u, true).unwrap();

    let mut cost = 0.0;
    let mut lx = kestrel_core::DVec::zeros(fixture.state.ndx());
    let mut luu = kestrel_core::DMat::zeros(36, 36);
    for (name, item) in sum.costs() {
        let item_data = &data.costs[name];
        cost += item.weight * item_data.cost;
        lx += &item_data.lx * item.weight;
        luu += &item_data.luu * item.weight;
    }
    approx::assert_relative_eq!(data.cost, cost, epsilon = 1e-10);
    approx::assert_relative_eq!(data.lx, lx, epsilon = 1e-9);
    approx::assert_relative_eq!(data.luu, luu, epsilon = 1e-9);
}

#[test]
fn test_stacked_residual_reproduces_cost() {
    // With quadratic activations, ½‖r‖² of the stacked residual is the total cost
    let fixture = HumanoidFixture::new(8);
    let sum = walking_sum(&fixture);
    let mut data = sum.create_data();
    sum.calc_diff(&mut data, &fixture.kin, &fixture.x, &fixture.u, true).unwrap();

    assert_eq!(data.r.len(), 72 + 36 + 3 + 3);
    approx::assert_relative_eq!(0.5 * data.r.norm_squared(), data.cost, max_relative = 1e-12);
    approx::assert_relative_eq!(data.rx.tr_mul(&data.r), data.lx, epsilon = 1e-8, max_relative = 1e-10);
    approx::assert_relative_eq!(data.rx.tr_mul(&data.rx), data.lxx, epsilon = 1e-8, max_relative = 1e-10);
}

#[test]
fn test_items_are_stacked_in_name_order() {
    let fixture = HumanoidFixture::new(9);
    let sum = walking_sum(&fixture);
    let names: Vec<_> = sum.costs().map(|(name, _)| name.to_string()).collect();
    assert_eq!(names, ["com", "foot", "uReg", "xReg"]);

    let mut data = sum.create_data();
    sum.calc(&mut data, &fixture.kin, &fixture.x, &fixture.u).unwrap();
    // com comes first with weight 10
    let com = &data.costs["com"];
    approx::assert_relative_eq!(data.r[0], 10f64.sqrt() * com.r[0], epsilon = 1e-12);
}

#[test]
fn test_data_must_follow_model() {
    let fixture = HumanoidFixture::new(10);
    let mut sum = walking_sum(&fixture);
    let mut data = sum.create_data();
    sum.remove_cost("foot").unwrap();

    let err = sum.calc(&mut data, &fixture.kin, &fixture.x, &fixture.u).unwrap_err();
    assert!(matches!(err, CostError::DataMismatch(_)));

    let mut data = sum.create_data();
    sum.calc(&mut data, &fixture.kin, &fixture.x, &fixture.u).unwrap();
}

#[test]
fn test_argument_dimensions() {
    let fixture = HumanoidFixture::new(13);
    let sum = walking_sum(&fixture);
    let mut data = sum.create_data();

    let err = sum
        .calc(&mut data, &fixture.kin, &fixture.x, &kestrel_core::DVec::zeros(3))
        .unwrap_err();
    assert!(matches!(err, CostError::DimensionMismatch { what: "u", expected: 36, got: 3 }));
}

#[test]
fn test_shared_cost_in_two_sums() {
    let fixture = HumanoidFixture::new(14);
    let cost: Arc<dyn CostModel> = Arc::new(CostControl::new(fixture.state.clone()).unwrap());

    let mut running = CostModelSum::with_default_nu(fixture.state.clone());
    let mut terminal = CostModelSum::with_default_nu(fixture.state.clone());
    running.add_cost("uReg", cost.clone(), 1.0).unwrap();
    terminal.add_cost("uReg", cost.clone(), 2.0).unwrap();
    assert_eq!(Arc::strong_count(&cost), 3);

    let mut d_run = running.create_data();
    let mut d_term = terminal.create_data();
    running.calc(&mut d_run, &fixture.kin, &fixture.x, &fixture.u).unwrap();
    terminal.calc(&mut d_term, &fixture.kin, &fixture.x, &fixture.u).unwrap();
    approx::assert_relative_eq!(d_term.cost, 2.0 * d_run.cost, max_relative = 1e-12);
}
