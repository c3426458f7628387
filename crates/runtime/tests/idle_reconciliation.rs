//! End-to-end idle catch-up: slots, queue chaining, accrual, and replay.

use std::sync::Arc;

use cultivation_core::ledger::ResourceId;
use cultivation_core::progress::CultivationPath;
use runtime::{ManualClock, MemoryStore, Session, Topic};

const HOUR_MS: u64 = 60 * 60 * 1_000;

fn session_at_zero() -> (Session, Arc<ManualClock>, Arc<MemoryStore>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(MemoryStore::new());
    let session = Session::builder()
        .clock(clock.clone())
        .store(store.clone())
        .seed(0xC0FFEE)
        .build()
        .unwrap();
    (session, clock, store)
}

fn fund(session: &mut Session) {
    session
        .accessories
        .grant_resource(ResourceId::SpiritStones, 100_000);
    session
        .accessories
        .grant_resource(ResourceId::EnhancementStones, 1_000);
    session.accessories.grant_resource(ResourceId::StarIron, 1_000);
    session
        .crafting
        .grant_resource(ResourceId::SpiritStones, 100_000);
    session
        .crafting
        .grant_resource(ResourceId::HerbEssence, 10_000);
    session
        .meridians
        .grant_resource(ResourceId::SpiritStones, 100_000);
    session
        .meridians
        .grant_resource(ResourceId::MeridianPills, 1_000);
}

#[test]
fn suspension_gap_completes_everything_once() {
    let (mut session, clock, _store) = session_at_zero();
    fund(&mut session);

    session.accessories.acquire("iron_ring").unwrap();
    session.accessories.start_enhancement("iron_ring", 0).unwrap();
    for _ in 0..3 {
        session.crafting.queue_craft("meridian_pill", 0).unwrap();
    }
    session.meridians.start_open("hand_taiyin_lung", 0).unwrap();
    session
        .cultivation
        .begin(CultivationPath::Qi, None, 0)
        .unwrap();

    let mut events = session.subscribe(Topic::Session);

    // Eight hours pass while the process is suspended.
    clock.advance(8 * HOUR_MS);
    let outcome = session.process_idle_gains();

    // Enhancement + three chained crafts + channel opening.
    assert_eq!(outcome.completed_operations, 5);
    assert!(outcome.experience_gained > 0);
    assert!(outcome.levels_gained > 0);

    assert_eq!(session.accessories.owned()[0].enhancement_level, 1);
    assert!(session.crafting.pool().amount(ResourceId::MeridianPills) >= 3);
    assert!(session.meridians.progress("hand_taiyin_lung").unwrap().open);

    let event = events.try_recv().unwrap();
    assert_eq!(event.name, "session:idle_reconciled");

    // Replay with an unchanged clock applies nothing.
    let replay = session.process_idle_gains();
    assert!(replay.is_empty());
    assert_eq!(session.accessories.owned()[0].enhancement_level, 1);
}

#[test]
fn tick_and_idle_share_completion_semantics() {
    let (mut session, clock, _store) = session_at_zero();
    fund(&mut session);

    session.accessories.acquire("iron_ring").unwrap();
    session.accessories.start_enhancement("iron_ring", 0).unwrap();

    // Live ticking up to just before completion does nothing.
    clock.advance(29_999);
    session.tick();
    assert_eq!(session.accessories.owned()[0].enhancement_level, 0);

    clock.advance(1);
    session.tick();
    assert_eq!(session.accessories.owned()[0].enhancement_level, 1);
}

#[test]
fn save_and_rehydrate_round_trips() {
    let (mut session, clock, store) = session_at_zero();
    fund(&mut session);

    session.accessories.acquire("iron_ring").unwrap();
    session.accessories.start_enhancement("iron_ring", 0).unwrap();
    session
        .cultivation
        .begin(CultivationPath::Qi, None, 0)
        .unwrap();
    clock.advance(2 * HOUR_MS);
    session.process_idle_gains();
    session.save().unwrap();

    let qi_level = session.cultivation.path(CultivationPath::Qi).level;
    let spirit = session.accessories.pool().amount(ResourceId::SpiritStones);

    let restored = Session::builder()
        .clock(clock.clone())
        .store(store)
        .seed(0xC0FFEE)
        .build()
        .unwrap();
    assert_eq!(
        restored.cultivation.path(CultivationPath::Qi).level,
        qi_level
    );
    assert_eq!(
        restored.accessories.pool().amount(ResourceId::SpiritStones),
        spirit
    );
    assert_eq!(restored.accessories.owned()[0].enhancement_level, 1);
    assert_eq!(restored.combat_power(), session.combat_power());
}
