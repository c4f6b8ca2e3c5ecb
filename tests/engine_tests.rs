mod common;

use common::seeded_store;
use hindsight::{
    EngineEvent, EventSink, FrameStore, LoadKind, PlaybackScheduler, ScrubEngine,
};
use tempfile::TempDir;
use tokio::time::Duration;

const APPS: [&str; 5] = ["Safari", "Safari", "Terminal", "Terminal", "Mail"];

async fn seeded_engine() -> (TempDir, ScrubEngine) {
    let (dir, store) = seeded_store(&APPS);
    let engine = ScrubEngine::new(store, EventSink::disconnected());
    assert_eq!(engine.reload().await.unwrap(), APPS.len());
    (dir, engine)
}

#[tokio::test]
async fn seek_clamps_out_of_range_indices() {
    let (_dir, engine) = seeded_engine().await;

    let frame = engine
        .seek_to_index(99, LoadKind::UserSeek)
        .await
        .unwrap()
        .expect("frame");
    assert_eq!(frame.index, 4);
    assert_eq!(engine.position(), 4.0);
}

#[tokio::test]
async fn fraction_seek_keeps_exact_position_and_loads_nearest() {
    let (_dir, engine) = seeded_engine().await;

    let frame = engine.seek_to_fraction(0.6).await.unwrap().expect("frame");
    // 0.6 * 4 = 2.4: indicator stays fractional, display rounds to 2.
    assert!((engine.position() - 2.4).abs() < 1e-9);
    assert_eq!(frame.index, 2);
    assert!(!frame.blended);
}

#[tokio::test]
async fn interpolation_buckets_are_deterministic_and_cached() {
    let (_dir, engine) = seeded_engine().await;

    // Low bucket: the earlier frame as-is.
    let low = engine.resolve_interpolated(2.1).await.unwrap().unwrap();
    assert_eq!(low.index, 2);
    assert!(!low.blended);

    // Mid bucket at f <= 0.5 selects the earlier endpoint and caches it.
    let mid = engine.resolve_interpolated(2.4).await.unwrap().unwrap();
    assert!(mid.blended);
    assert_eq!(*mid.data, *low.data);

    // Same pair, different mid fraction: the cached result is reused
    // verbatim even though 0.6 would have picked the later endpoint.
    let mid_again = engine.resolve_interpolated(2.6).await.unwrap().unwrap();
    assert!(mid_again.blended);
    assert_eq!(mid_again.filename, mid.filename);
    assert_eq!(*mid_again.data, *mid.data);

    // High bucket: the later frame as-is.
    let high = engine.resolve_interpolated(2.8).await.unwrap().unwrap();
    assert_eq!(high.index, 3);
    assert!(!high.blended);
    assert_ne!(*high.data, *mid.data);
}

#[tokio::test]
async fn integer_positions_never_blend() {
    let (_dir, engine) = seeded_engine().await;

    let exact = engine.resolve_interpolated(3.0).await.unwrap().unwrap();
    assert_eq!(exact.index, 3);
    assert!(!exact.blended);

    // The final index has no successor to blend toward.
    let last = engine.resolve_interpolated(4.9).await.unwrap().unwrap();
    assert_eq!(last.index, 4);
    assert!(!last.blended);
}

#[tokio::test]
async fn wheel_settles_onto_an_integer_frame() {
    let (_dir, engine) = seeded_engine().await;

    engine.seek_to_index(2, LoadKind::UserSeek).await.unwrap();
    engine.wheel(0.0, 45.0).await.unwrap();
    let moved = engine.position();
    assert!(moved > 2.0 && moved.fract() != 0.0);

    // Trackpad settle is 200 ms; wheel settle 100 ms. Wait past both.
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(engine.position().fract(), 0.0);
}

#[tokio::test]
async fn empty_store_is_a_no_op_everywhere() {
    let dir = TempDir::new().unwrap();
    let store = FrameStore::new(dir.path()).unwrap();
    let engine = ScrubEngine::new(store, EventSink::disconnected());

    assert_eq!(engine.reload().await.unwrap(), 0);
    assert!(engine
        .seek_to_index(0, LoadKind::UserSeek)
        .await
        .unwrap()
        .is_none());
    assert!(engine.seek_to_fraction(0.5).await.unwrap().is_none());
    assert!(engine.wheel(0.0, 120.0).await.unwrap().is_none());
    assert!(engine.resolve_interpolated(1.5).await.unwrap().is_none());
    assert_eq!(engine.position(), 0.0);

    let step = engine.step_frame(1).await.unwrap();
    assert!(step.frame.is_none());
    assert!(!step.end_reached);
}

#[tokio::test]
async fn user_seeks_are_tagged_for_the_ui() {
    let (dir, store) = seeded_store(&APPS);
    let (sink, mut rx) = EventSink::channel();
    let engine = ScrubEngine::new(store, sink);
    engine.reload().await.unwrap();
    let _dir = dir;

    // Drain the reload events.
    while rx.try_recv().is_ok() {}

    engine.seek_to_index(3, LoadKind::UserSeek).await.unwrap();

    let mut saw_position = false;
    let mut saw_user_seek = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            EngineEvent::PositionChanged { position } => {
                saw_position = position == 3.0 || saw_position;
            }
            EngineEvent::FrameResolved { kind, index, .. } => {
                saw_user_seek = (kind == LoadKind::UserSeek && index == 3) || saw_user_seek;
            }
            _ => {}
        }
    }
    assert!(saw_position);
    assert!(saw_user_seek);
}

#[tokio::test]
async fn play_at_the_end_rewinds_first() {
    let (_dir, engine) = seeded_engine().await;
    let scheduler = PlaybackScheduler::new(engine.clone(), EventSink::disconnected());

    engine.seek_to_index(4, LoadKind::UserSeek).await.unwrap();
    scheduler.play().await.unwrap();

    // The rewind happens synchronously in play(); the first tick is a full
    // interval away.
    assert!(scheduler.is_playing());
    assert_eq!(engine.position(), 0.0);
    scheduler.pause().await;
}

#[tokio::test]
async fn playback_stops_at_the_final_frame() {
    let (_dir, engine) = seeded_engine().await;
    let scheduler = PlaybackScheduler::new(engine.clone(), EventSink::disconnected());

    engine.seek_to_index(3, LoadKind::UserSeek).await.unwrap();
    scheduler.play().await.unwrap();

    // One index to cover at 0.1/tick, 100 ms/tick: done within ~1.1 s.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!scheduler.is_playing());
    assert_eq!(engine.position(), 4.0);
}

#[tokio::test]
async fn speed_cycles_through_the_fixed_set() {
    let (_dir, engine) = seeded_engine().await;
    let scheduler = PlaybackScheduler::new(engine, EventSink::disconnected());

    assert_eq!(scheduler.speed(), 1.0);
    assert_eq!(scheduler.cycle_speed().await, 2.0);
    assert_eq!(scheduler.cycle_speed().await, 0.25);
    assert_eq!(scheduler.cycle_speed().await, 0.5);
    assert_eq!(scheduler.cycle_speed().await, 1.0);
}

#[tokio::test]
async fn stepping_past_the_end_stops_autoplay() {
    let (_dir, engine) = seeded_engine().await;
    let scheduler = PlaybackScheduler::new(engine.clone(), EventSink::disconnected());

    engine.seek_to_index(0, LoadKind::UserSeek).await.unwrap();
    scheduler.play().await.unwrap();
    assert!(scheduler.is_playing());

    engine.seek_to_index(4, LoadKind::UserSeek).await.unwrap();
    let frame = scheduler.step_frame(1).await.unwrap();
    assert!(frame.is_none());
    assert!(!scheduler.is_playing());
}

#[tokio::test]
async fn advance_crosses_boundaries_and_reports_end() {
    let (_dir, engine) = seeded_engine().await;

    // 0 -> 0.5: no boundary crossing, mid-bucket blend surfaces.
    let out = engine.advance(0.5).await.unwrap();
    assert!(!out.end_reached);
    let frame = out.frame.expect("blend for the fractional remainder");
    assert!(frame.blended);

    // 0.5 -> 1.2: crosses into index 1.
    let out = engine.advance(0.7).await.unwrap();
    assert!(!out.end_reached);
    assert!((out.position - 1.2).abs() < 1e-9);

    // Overshooting the end clamps and reports it.
    let out = engine.advance(10.0).await.unwrap();
    assert!(out.end_reached);
    assert_eq!(out.position, 4.0);
}
