use folio_motion_core::{
    ElementId, HeadlessStage, MotionConfig, MotionEngine, ReadyAfter, Stage, Unavailable, Value,
};
use folio_orchestrator::{
    Director, Kinematics, LoadingSignals, ObserverSupport, Recipe, RegionState, Roles,
    ScrollRegion, TransitionState,
};
use folio_test_fixtures::{configs, recipes};

const DT: f64 = 1000.0 / 60.0;

fn init_tracing() {
    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "folio_orchestrator=debug".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn ready_director(cfg: MotionConfig, support: ObserverSupport) -> Director {
    Director::with_engine(MotionEngine::ready(cfg), support)
}

fn opacity(stage: &HeadlessStage, el: ElementId) -> Option<f32> {
    stage.read(el, "opacity").and_then(|v| v.as_float())
}

fn run(director: &mut Director, stage: &mut HeadlessStage, ms: f64) {
    let mut elapsed = 0.0;
    while elapsed < ms {
        director.step(DT, stage);
        elapsed += DT;
    }
}

#[test]
fn hero_reveal_fixture_plays_once_on_scroll() {
    init_tracing();
    let recipe = Recipe::from_json(&recipes::json("hero-reveal").unwrap()).unwrap();
    let mut stage = HeadlessStage::new();
    let hero = stage.create_root("section");
    let title = stage.create_child(hero, "h1").unwrap();
    let subtitle = stage.create_child(hero, "p").unwrap();
    let cta = stage.create_child(hero, "a").unwrap();
    let roles = Roles::new()
        .with("title", title)
        .with("subtitle", subtitle)
        .with("cta", cta);

    let mut director = ready_director(MotionConfig::default().with_seed(9), ObserverSupport::Available);
    let id = director.register_region(ScrollRegion::new(hero, recipe).roles(roles), &mut stage);

    run(&mut director, &mut stage, 200.0);
    assert_eq!(opacity(&stage, title), None);

    assert!(director.observe(id, 0.6, &mut stage));
    run(&mut director, &mut stage, 2200.0);
    for el in [title, subtitle, cta] {
        assert_eq!(opacity(&stage, el), Some(1.0));
    }

    assert!(!director.observe(id, 0.0, &mut stage));
    assert!(!director.observe(id, 1.0, &mut stage));
    assert_eq!(director.visibility.fire_count(id), 1);
    assert_eq!(director.visibility.state(id), RegionState::Fired);
}

#[test]
fn project_cards_fixture_cascades_in_order() {
    let recipe = Recipe::from_json(&recipes::json("project-cards").unwrap()).unwrap();
    let mut stage = HeadlessStage::new();
    let grid = stage.create_root("section");
    let cards: Vec<ElementId> = (0..4)
        .map(|_| stage.create_child(grid, "article").unwrap())
        .collect();
    let mut director = ready_director(MotionConfig::default(), ObserverSupport::Available);
    let region = ScrollRegion::new(grid, recipe).roles(Roles::new().with("cards", cards.clone()));
    let id = director.register_region(region, &mut stage);
    assert!(director.observe(id, 1.0, &mut stage));

    run(&mut director, &mut stage, 300.0);
    let first = opacity(&stage, cards[0]).unwrap();
    let second = opacity(&stage, cards[1]).unwrap();
    assert!(first > second);
    assert_eq!(opacity(&stage, cards[3]), None);

    run(&mut director, &mut stage, 900.0);
    for el in &cards {
        assert_eq!(opacity(&stage, *el), Some(1.0));
    }
}

#[test]
fn slow_interactive_config_bounds_particles_and_ripples() {
    init_tracing();
    let mut director = Director::from_config_json(
        &configs::json("slow-interactive").unwrap(),
        ReadyAfter::immediately(),
        ObserverSupport::Available,
    )
    .unwrap();
    assert_eq!(director.config().particle_count, 8);

    let mut stage = HeadlessStage::new();
    let bg = stage.create_root("div");
    director.spawn_particles(bg, 20, &Kinematics::ambient(), &mut stage);
    assert_eq!(director.particles.live_count(bg), 8);
    assert_eq!(stage.children(bg).len(), 8);
    // full container: the ripple set is created but clamped to nothing
    let ripple = director.ripple(bg, 4.0, 4.0, &mut stage).unwrap();
    assert_eq!(director.particles.set_len(ripple), Some(0));
}

#[test]
fn particles_are_removed_after_their_lifetime() {
    let mut stage = HeadlessStage::new();
    let bg = stage.create_root("div");
    let mut director = ready_director(
        MotionConfig::default().with_speed(folio_motion_core::Speed::Slow),
        ObserverSupport::Available,
    );
    let fixed = Kinematics {
        lifetime_ms: [500.0, 500.0],
        ..Kinematics::ambient()
    };
    director.spawn_particles(bg, 3, &fixed, &mut stage);

    let mut elapsed = 0.0;
    loop {
        let frame = director.step(DT, &mut stage);
        elapsed += DT;
        if frame.expired_particles > 0 {
            assert_eq!(frame.expired_particles, 3);
            break;
        }
        assert!(elapsed < 2000.0, "particles never expired");
    }
    assert!(elapsed >= 750.0 && elapsed < 750.0 + DT, "elapsed={elapsed}");
    assert!(stage.children(bg).is_empty());
}

#[test]
fn loader_reaches_removed_with_monotonic_progress() {
    init_tracing();
    let mut stage = HeadlessStage::new();
    let loader = stage.create_root("div");
    let logo = stage.create_child(loader, "img").unwrap();
    let bar = stage.create_child(loader, "div").unwrap();
    let mut director = ready_director(MotionConfig::default().with_seed(2), ObserverSupport::Available);
    director.mount_loader(loader, Roles::new().with("logo", logo).with("bar", bar), &mut stage);
    assert!(director.particles.live_count(loader) > 0);

    let mut seen = Vec::new();
    let mut last = 0.0;
    for i in 0..600 {
        if i == 150 {
            director.set_signals(loader, LoadingSignals::done());
        }
        let frame = director.step(DT, &mut stage);
        seen.extend(frame.transitions.iter().map(|c| c.state));
        let progress = director.loader(loader).unwrap().progress();
        assert!(progress >= last);
        last = progress;
    }
    assert_eq!(
        seen,
        vec![
            TransitionState::Active,
            TransitionState::Exiting,
            TransitionState::Removed
        ]
    );
    assert_eq!(last, 100.0);
    assert!(!stage.contains(loader));

    // signals after removal change nothing
    director.set_signals(loader, LoadingSignals::loading());
    let frame = director.step(DT, &mut stage);
    assert!(frame.transitions.is_empty());
}

#[test]
fn degraded_engine_still_completes_everything() {
    let mut stage = HeadlessStage::new();
    let page = stage.create_root("main");
    let section = stage.create_child(page, "section").unwrap();
    let loader = stage.create_root("div");
    let mut director = Director::new(
        MotionConfig::default(),
        Unavailable::new("blocked by host"),
        ObserverSupport::Unavailable,
    );

    director.mount_loader(loader, Roles::new(), &mut stage);
    director.set_signals(loader, LoadingSignals::done());
    let id = director.register_region(ScrollRegion::new(section, Recipe::fade_up()), &mut stage);
    assert_eq!(director.visibility.state(id), RegionState::Fired);
    assert_eq!(stage.read(section, "opacity"), Some(Value::Float(1.0)));

    run(&mut director, &mut stage, 200.0);
    let t = director.loader(loader).unwrap();
    assert_eq!(t.state(), TransitionState::Removed);
    assert_eq!(t.progress(), 100.0);
    assert!(director.engine.is_failed());
    assert!(director.engine.diagnostics().not_ready_calls > 0);
    assert!(director.start_morphing(page, section).is_none());
}

#[test]
fn teardown_releases_everything_in_a_container() {
    let mut stage = HeadlessStage::new();
    let container = stage.create_root("section");
    let shape = stage.create_child(container, "div").unwrap();
    let cfg = MotionConfig::default().with_morphing_shapes(true).with_particle_count(10);
    let mut director = ready_director(cfg, ObserverSupport::Available);

    director.mount_loader(container, Roles::new(), &mut stage);
    director.spawn_particles(container, 3, &Kinematics::burst(), &mut stage);
    let region = director.register_region(
        ScrollRegion::new(shape, Recipe::stagger_in()).in_container(container),
        &mut stage,
    );
    let morph = director.start_morphing(container, shape).unwrap();
    run(&mut director, &mut stage, 100.0);

    let report = director.teardown(container, &mut stage);
    assert_eq!(report.particle_sets, 2);
    assert_eq!(report.regions, 1);
    assert_eq!(report.loops, 1);
    assert_eq!(report.loaders, 1);
    assert_eq!(director.particles.live_count(container), 0);
    assert_eq!(director.visibility.state(region), RegionState::Unarmed);
    assert!(director.loader(container).is_none());
    assert!(!stage.contains(container));
    assert!(director.engine.is_finished(morph));
    assert_eq!(director.engine.active_tweens(), 0);
    run(&mut director, &mut stage, 500.0);
    assert_eq!(director.engine.active_tweens(), 0);
    assert_eq!(director.particles.total_live(), 0);

    // second teardown is a no-op
    assert_eq!(director.teardown(container, &mut stage), Default::default());
}

#[test]
fn refiring_region_keeps_a_single_live_run() {
    let mut stage = HeadlessStage::new();
    let section = stage.create_root("section");
    let mut director = ready_director(MotionConfig::default(), ObserverSupport::Available);
    let region = ScrollRegion::new(section, Recipe::fade_up()).once(false);
    let id = director.register_region(region, &mut stage);

    for _ in 0..100 {
        assert!(director.observe(id, 1.0, &mut stage));
        director.step(DT, &mut stage);
        assert!(!director.observe(id, 0.0, &mut stage));
    }
    assert_eq!(director.visibility.fire_count(id), 100);
    assert_eq!(director.engine.active_tweens(), 1);

    stage.remove(section);
    run(&mut director, &mut stage, 200.0);
    assert_eq!(director.engine.active_tweens(), 0);
}

#[test]
fn expired_and_retired_particles_leave_no_tweens() {
    let mut stage = HeadlessStage::new();
    let bg = stage.create_root("div");
    let mut director = ready_director(MotionConfig::default(), ObserverSupport::Available);
    let short = Kinematics {
        lifetime_ms: [200.0, 200.0],
        ..Kinematics::ambient()
    };
    director.spawn_particles(bg, 5, &short, &mut stage);
    let kept = director.spawn_particles(bg, 5, &Kinematics::ambient(), &mut stage);
    assert_eq!(director.engine.active_tweens(), 10);

    run(&mut director, &mut stage, 300.0);
    assert_eq!(director.engine.active_tweens(), 5);

    assert!(director
        .particles
        .retire(kept, &mut director.engine, &mut stage));
    assert_eq!(director.engine.active_tweens(), 0);
    assert!(stage.children(bg).is_empty());
}
