use fretcam_core::{Error, GeometryError, Loop, Orientation, Point};
use fretcam_designer::{
    classify_loops, EngagementSettings, OffsetEngine, OffsetSettings, PlannerSettings,
    PocketPlanner, PocketStrategy, RingSource,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Loop {
    Loop::from_xy(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
}

fn circle(cx: f64, cy: f64, r: f64, n: usize) -> Loop {
    let points = (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / n as f64;
            Point::new(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect();
    Loop::new(points)
}

#[test]
fn first_ring_clears_wall_by_radius_plus_margin() {
    let result = OffsetEngine::default()
        .compute(&rect(0.0, 0.0, 50.0, 30.0), &[], 6.0, 0.4, 0.5)
        .unwrap();
    let first: Vec<_> = result.rings_at(0).collect();
    assert_eq!(first.len(), 1);
    let b = first[0].path.bounds();
    assert!((b.min_x - 3.5).abs() < 1e-6);
    assert!((b.max_y - 26.5).abs() < 1e-6);
    assert_eq!(first[0].source, RingSource::Boundary);
    assert_eq!(first[0].path.orientation(), Orientation::CounterClockwise);
}

#[test]
fn clockwise_input_is_accepted() {
    let ccw = rect(0.0, 0.0, 40.0, 40.0);
    let engine = OffsetEngine::default();
    let a = engine.compute(&ccw, &[], 6.0, 0.5, 0.0).unwrap();
    let b = engine.compute(&ccw.reversed(), &[], 6.0, 0.5, 0.0).unwrap();
    assert_eq!(a.levels, b.levels);
    assert!((a.level_area(0) - b.level_area(0)).abs() < 1e-6);
}

#[test]
fn tool_larger_than_pocket_is_exhausted() {
    let err = OffsetEngine::default()
        .compute(&rect(0.0, 0.0, 4.0, 4.0), &[], 6.0, 0.5, 0.0)
        .unwrap_err();
    assert!(err.is_offset_exhausted());
}

#[test]
fn degenerate_input_is_rejected() {
    let line = Loop::from_xy(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
    let err = OffsetEngine::default()
        .compute(&line, &[], 6.0, 0.5, 0.0)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Geometry(GeometryError::ZeroArea { loop_index: 0 })
    ));

    let two = Loop::from_xy(&[(0.0, 0.0), (10.0, 0.0)]);
    let err = OffsetEngine::default()
        .compute(&two, &[], 6.0, 0.5, 0.0)
        .unwrap_err();
    assert!(err.is_geometry_error());
}

#[test]
fn rings_keep_clear_of_island() {
    let outer = rect(0.0, 0.0, 80.0, 60.0);
    let island = circle(40.0, 30.0, 8.0, 72);
    let result = OffsetEngine::default()
        .compute(&outer, &[island.clone()], 6.0, 0.45, 0.0)
        .unwrap();
    assert!(result.rings.iter().any(|r| r.source == RingSource::Island));
    for ring in &result.rings {
        for p in &ring.path.points {
            assert!(!island.contains(p));
            assert!(island.distance_to_point(p) > 3.0 - 0.05);
        }
    }
    for ring in result.rings.iter().filter(|r| r.source == RingSource::Island) {
        assert_eq!(ring.path.orientation(), Orientation::Clockwise);
    }
}

#[test]
fn overlapping_islands_are_unioned() {
    let outer = rect(0.0, 0.0, 100.0, 60.0);
    let a = rect(30.0, 20.0, 50.0, 40.0);
    let b = rect(45.0, 25.0, 65.0, 45.0);
    let result = OffsetEngine::default()
        .compute(&outer, &[a, b], 6.0, 0.45, 0.0)
        .unwrap();
    let island_rings = result
        .rings_at(0)
        .filter(|r| r.source == RingSource::Island)
        .count();
    assert_eq!(island_rings, 1);
}

#[test]
fn island_crossing_boundary_is_rejected() {
    let outer = rect(0.0, 0.0, 50.0, 50.0);
    let island = rect(40.0, 10.0, 60.0, 20.0);
    let err = OffsetEngine::default()
        .compute(&outer, &[island], 6.0, 0.5, 0.0)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Geometry(GeometryError::IslandCrossesBoundary { island_index: 1 })
    ));
}

#[test]
fn island_outside_boundary_is_ignored() {
    let outer = rect(0.0, 0.0, 50.0, 50.0);
    let engine = OffsetEngine::default();
    let with = engine
        .compute(&outer, &[rect(70.0, 0.0, 80.0, 10.0)], 6.0, 0.5, 0.0)
        .unwrap();
    let without = engine.compute(&outer, &[], 6.0, 0.5, 0.0).unwrap();
    assert_eq!(with.rings, without.rings);
}

#[test]
fn self_intersecting_input_is_repaired_and_reported() {
    // Figure eight crossing at (15, 22.5): the lower CCW lobe is kept.
    let bowtie = Loop::from_xy(&[(0.0, 0.0), (60.0, 0.0), (0.0, 30.0), (40.0, 60.0)]);
    let result = OffsetEngine::default()
        .compute(&bowtie, &[], 4.0, 0.5, 0.0)
        .unwrap();
    let input_notice = result
        .repairs
        .iter()
        .find(|n| n.level.is_none())
        .expect("input repair reported");
    assert!(input_notice.exceeds_tolerance);
    assert!(result.rings.iter().all(|r| r.path.bounds().max_y < 22.5));

    let strict = OffsetEngine::new(OffsetSettings {
        reject_repairs_above_tolerance: true,
        ..Default::default()
    });
    let err = strict.compute(&bowtie, &[], 4.0, 0.5, 0.0).unwrap_err();
    assert!(matches!(
        err,
        Error::Geometry(GeometryError::RepairRejected { .. })
    ));
}

#[test]
fn ring_cap_bounds_the_sequence() {
    let engine = OffsetEngine::new(OffsetSettings {
        max_rings: 3,
        ..Default::default()
    });
    let result = engine
        .compute(&rect(0.0, 0.0, 200.0, 200.0), &[], 6.0, 0.5, 0.0)
        .unwrap();
    assert_eq!(result.levels, 3);
    assert!(result.hit_ring_cap);
}

#[test]
fn parents_point_one_level_out() {
    let result = OffsetEngine::default()
        .compute(&rect(0.0, 0.0, 60.0, 40.0), &[], 6.0, 0.5, 0.0)
        .unwrap();
    for ring in &result.rings {
        match ring.parent {
            None => assert_eq!(ring.depth, 0),
            Some(p) => assert_eq!(result.rings[p].depth + 1, ring.depth),
        }
    }
}

#[test]
fn disjoint_regions_are_ordered_and_planned_independently() {
    let loops = vec![
        rect(100.0, 0.0, 140.0, 30.0),
        rect(0.0, 0.0, 40.0, 30.0),
        rect(15.0, 10.0, 25.0, 20.0),
    ];
    let regions = classify_loops(&loops).unwrap();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].islands.len(), 1);
    assert!(regions[1].islands.is_empty());

    let rings = OffsetEngine::default()
        .compute_regions(&regions, 4.0, 0.5, 0.0)
        .unwrap();
    assert_eq!(rings.len(), 2);
    assert_eq!(rings[0].region_index, 0);

    let planner = PocketPlanner::new(fretcam_core::Tool::new(4.0, 0.5), PlannerSettings::default());
    let toolpath = planner
        .plan_regions(&rings, PocketStrategy::Spiral, &EngagementSettings::default())
        .unwrap();
    assert_eq!(toolpath.stats.region_count, 2);
    // The left region is cut first.
    let first_cut = toolpath.moves.iter().find(|m| !m.is_rapid()).unwrap();
    assert!(first_cut.start().x < 40.0);
    let last = toolpath.moves.last().unwrap();
    assert!(last.end().x > 100.0);
}

#[test]
fn exhausted_region_is_skipped() {
    let loops = vec![rect(0.0, 0.0, 40.0, 30.0), rect(60.0, 0.0, 62.0, 2.0)];
    let regions = classify_loops(&loops).unwrap();
    let rings = OffsetEngine::default()
        .compute_regions(&regions, 4.0, 0.5, 0.0)
        .unwrap();
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].region_index, 0);
}
