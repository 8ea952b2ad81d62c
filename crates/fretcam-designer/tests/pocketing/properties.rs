use fretcam_core::Loop;
use fretcam_designer::OffsetEngine;
use proptest::prelude::*;

fn convex_polygon() -> impl Strategy<Value = Loop> {
    // Points on an ellipse at sorted angles give a convex CCW polygon.
    (
        20.0f64..120.0,
        20.0f64..80.0,
        prop::collection::btree_set(0u32..360, 5..24),
    )
        .prop_map(|(a, b, angles)| {
            let coords: Vec<(f64, f64)> = angles
                .into_iter()
                .map(|deg| {
                    let t = (deg as f64).to_radians();
                    (a * t.cos(), b * t.sin())
                })
                .collect();
            Loop::from_xy(&coords)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rectangle_rings_strictly_shrink(
        w in 20.0f64..150.0,
        h in 20.0f64..100.0,
        tool in 2.0f64..10.0,
        stepover in 0.2f64..0.9,
    ) {
        let outer = Loop::from_xy(&[(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]);
        let result = OffsetEngine::default().compute(&outer, &[], tool, stepover, 0.0).unwrap();
        prop_assert!(result.levels > 0);
        for depth in 1..result.levels {
            prop_assert!(result.level_area(depth) < result.level_area(depth - 1));
            prop_assert!(result.rings_at(depth).next().is_some());
        }
        for ring in &result.rings {
            prop_assert!(!ring.path.is_self_intersecting());
        }
    }

    #[test]
    fn convex_rings_strictly_shrink(outer in convex_polygon(), stepover in 0.3f64..0.8) {
        match OffsetEngine::default().compute(&outer, &[], 4.0, stepover, 0.0) {
            Ok(result) => {
                for depth in 1..result.levels {
                    prop_assert!(result.level_area(depth) < result.level_area(depth - 1));
                }
                let first_area = result.level_area(0);
                prop_assert!(first_area < outer.area());
            }
            // Thin slivers may not fit the tool at all.
            Err(e) => prop_assert!(e.is_offset_exhausted() || e.is_geometry_error()),
        }
    }
}
