use fretcam_core::{point_segment_distance, Loop, Point, Tool};
use fretcam_designer::{
    CornerMode, EmitterSettings, EngagementSettings, GcodeEmitter, OffsetEngine, OffsetResult,
    PlannerSettings, PocketPlanner, PocketStrategy, Toolpath,
};
use fretcam_postdb::{FeedOverrideMode, PostProfile};

const TOOL_D: f64 = 6.0;
const STEPOVER: f64 = 0.45;

fn pocket() -> Loop {
    Loop::from_xy(&[(0.0, 0.0), (100.0, 0.0), (100.0, 60.0), (0.0, 60.0)])
}

fn rings() -> OffsetResult {
    OffsetEngine::default()
        .compute(&pocket(), &[], TOOL_D, STEPOVER, 0.0)
        .unwrap()
}

fn plan(strategy: PocketStrategy, engagement: &EngagementSettings) -> Toolpath {
    let planner = PocketPlanner::new(Tool::new(TOOL_D, STEPOVER), PlannerSettings::default());
    planner.plan(&rings().rings, strategy, engagement).unwrap()
}

fn distance_to_cuts(toolpath: &Toolpath, p: &Point) -> f64 {
    toolpath
        .moves
        .iter()
        .filter(|m| !m.is_rapid())
        .map(|m| point_segment_distance(p, &m.start(), &m.end()))
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn spiral_covers_interior() {
    let toolpath = plan(PocketStrategy::Spiral, &EngagementSettings::default());
    let radius = TOOL_D / 2.0;
    let mut y = 1.0;
    while y <= 59.0 {
        let mut x = 1.0;
        while x <= 99.0 {
            let p = Point::new(x, y);
            let d = distance_to_cuts(&toolpath, &p);
            assert!(d <= radius + 1e-6, "({}, {}) left uncut, {:.3}mm away", x, y, d);
            x += 1.0;
        }
        y += 1.0;
    }
}

#[test]
fn lanes_cover_interior() {
    let toolpath = plan(PocketStrategy::Lanes, &EngagementSettings::default());
    let radius = TOOL_D / 2.0;
    for iy in 0..=29 {
        for ix in 0..=49 {
            let p = Point::new(1.0 + 2.0 * ix as f64, 1.0 + 2.0 * iy as f64);
            assert!(distance_to_cuts(&toolpath, &p) <= radius + 1e-6, "{:?} left uncut", p);
        }
    }
}

#[test]
fn rings_shrink_and_stay_within_one_diameter() {
    let result = rings();
    assert!(result.levels > 5);
    assert!(!result.hit_ring_cap);
    for depth in 1..result.levels {
        assert!(result.level_area(depth) < result.level_area(depth - 1));
    }
    for ring in result.rings.iter().filter(|r| r.depth > 0) {
        let parent = &result.rings[ring.parent.unwrap()];
        for p in &ring.path.points {
            assert!(parent.path.distance_to_point(p) <= TOOL_D + 1e-6);
        }
    }
}

#[test]
fn spiral_transitions_stay_short() {
    let toolpath = plan(PocketStrategy::Spiral, &EngagementSettings::default());
    assert_eq!(toolpath.stats.rapid_moves, 1);
    for mv in toolpath.moves.iter().skip(1) {
        assert!(!mv.is_rapid());
    }
    assert_eq!(toolpath.stats.ring_count, rings().rings.len());
    assert!(toolpath.stats.tight_corners >= 4);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let engagement = EngagementSettings {
        mode: CornerMode::Trochoidal,
        ..Default::default()
    };
    let emitter = GcodeEmitter::new(PostProfile::grbl(), EmitterSettings::default());
    let first = emitter
        .emit(
            &plan(PocketStrategy::Spiral, &engagement).moves,
            FeedOverrideMode::InlineF,
            None,
        )
        .unwrap();
    let second = emitter
        .emit(
            &plan(PocketStrategy::Spiral, &engagement).moves,
            FeedOverrideMode::InlineF,
            None,
        )
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&plan(PocketStrategy::Lanes, &engagement)).unwrap(),
        serde_json::to_string(&plan(PocketStrategy::Lanes, &engagement)).unwrap()
    );
}
