//! Regeneration policy tests against the public API

use relief_engine::terrain::streaming::{plan, StreamingParams};
use relief_engine::terrain::{grid_vertex_count, BASE_COMPUTE_RECT, BASE_RENDER_RECT};
use relief_engine::{Rect, StreamingWindow};

fn fresh_window() -> StreamingWindow {
    StreamingWindow::new(BASE_RENDER_RECT, BASE_COMPUTE_RECT)
}

fn apply(window: &mut StreamingWindow, p: &relief_engine::terrain::streaming::RegenPlan) {
    window.render_rect = p.render_rect;
    window.compute_rect = p.compute_rect;
    window.origin = p.origin;
}

#[test]
fn small_drift_never_regenerates() {
    let params = StreamingParams::default();
    let window = fresh_window();
    assert!(plan(&params, &window, [1.0, 1.0]).is_none());
    assert!(plan(&params, &window, [-1.0, 2.0]).is_none());
    assert!(plan(&params, &window, [0.0, 0.0]).is_none());
}

#[test]
fn crossing_one_axis_regenerates_exactly_once() {
    let params = StreamingParams::default();
    let mut window = fresh_window();

    let first = plan(&params, &window, [3.0, 0.0]).expect("displacement past threshold");
    apply(&mut window, &first);

    // Same camera position again: the origin moved, so nothing fires.
    assert!(plan(&params, &window, [3.0, 0.0]).is_none());
}

#[test]
fn reference_displacement_produces_reference_rects() {
    let params = StreamingParams::default();
    let window = fresh_window();

    let p = plan(&params, &window, [3.0, -1.0]).expect("x axis crossed the threshold");
    assert_eq!(p.render_rect, Rect::new(-12.0, -16.0, 18.0, 14.0));
    assert_eq!(p.compute_rect, Rect::new(-6.0, -8.0, 9.0, 7.0));

    // The compute window stays at exactly half the render extent.
    let render = p.render_rect.extent();
    let compute = p.compute_rect.extent();
    assert_eq!(render[0], compute[0] * 2.0);
    assert_eq!(render[1], compute[1] * 2.0);
}

#[test]
fn threshold_is_per_axis_not_radial() {
    // A diagonal drift of ~2.47 on each axis has euclidean length ~3.5,
    // well past the threshold, yet neither axis alone crosses it. The
    // policy is per-axis on purpose.
    let params = StreamingParams::default();
    let window = fresh_window();
    assert!(plan(&params, &window, [2.47, 2.47]).is_none());

    // While a pure single-axis drift of 2.5 fires.
    assert!(plan(&params, &window, [2.5, 0.0]).is_some());
    assert!(plan(&params, &window, [0.0, 2.5]).is_some());
}

#[test]
fn successive_regenerations_track_the_latest_origin() {
    let params = StreamingParams::default();
    let mut window = fresh_window();

    let first = plan(&params, &window, [4.0, 0.0]).expect("first");
    apply(&mut window, &first);
    assert_eq!(window.origin, [4.0, 0.0]);

    let second = plan(&params, &window, [4.0, -6.0]).expect("second");
    // Displacement is measured from the previous origin, not from zero.
    assert_eq!(second.render_rect, Rect::new(-15.0, -21.0, 15.0, 9.0));
    assert_eq!(second.compute_rect, Rect::new(-7.5, -10.5, 7.5, 4.5));
}

#[test]
fn reference_mesh_draws_the_expected_vertex_range() {
    assert_eq!(grid_vertex_count([1000, 1000]), 6 * 999 * 999);
    assert_eq!(grid_vertex_count([1000, 1000]), 5_988_006);
    assert_eq!(grid_vertex_count([2, 2]), 6);
}
