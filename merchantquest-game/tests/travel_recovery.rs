use std::cell::RefCell;
use std::rc::Rc;

use merchantquest_game::{
    City, Commodity, MarketScenario, MerchantId, Recovery, StaticFeed, StatusWatcher, TradeError,
    TradeSide, TravelCacheEntry, TravelError, TravelPhase, World, reconcile, travel_duration,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn new_world() -> (World<StaticFeed>, MerchantId) {
    let mut world = World::new(StaticFeed::new());
    let id = world.create_merchant("0xplayer", "Aldric", 1_000).unwrap();
    (world, id)
}

#[test]
fn travel_round_trip_then_benign_repeat() {
    let (mut world, id) = new_world();
    let start = 10_000;
    world.start_travel("0xplayer", id, 2, start).unwrap();

    let arrival = start + travel_duration(City::Silverport, City::Silkwind);
    assert_eq!(
        world.complete_travel("0xplayer", id, arrival),
        Ok(City::Silkwind)
    );
    assert_eq!(
        world.complete_travel("0xplayer", id, arrival + 1),
        Err(TravelError::NotTraveling)
    );
    assert_eq!(
        world.merchant(id).unwrap().travel.current_city(),
        Some(City::Silkwind)
    );
}

#[test]
fn premature_completion_reports_full_duration() {
    let (mut world, id) = new_world();
    let start = 500;
    world.start_travel("0xplayer", id, 1, start).unwrap();

    let expected = travel_duration(City::Silverport, City::Goldmere);
    assert_eq!(
        world.complete_travel("0xplayer", id, start),
        Err(TravelError::StillTraveling {
            remaining: expected
        })
    );
    let status = world.get_travel_status(id, start).unwrap();
    assert!(status.is_traveling);
    assert_eq!(status.time_remaining, expected);
}

#[test]
fn self_travel_never_debits() {
    let (mut world, id) = new_world();
    let gold_before = world.merchant(id).unwrap().gold;
    assert_eq!(
        world.start_travel("0xplayer", id, 0, 100),
        Err(TravelError::NoOpTravel(City::Silverport))
    );
    assert_eq!(world.merchant(id).unwrap().gold, gold_before);
    assert!(world.can_trade(id).unwrap());
}

#[test]
fn two_recovering_clients_heal_exactly_once() {
    let (mut world, id) = new_world();
    let start = 2_000;
    world.start_travel("0xplayer", id, 1, start).unwrap();
    let arrival = start + travel_duration(City::Silverport, City::Goldmere);
    let gold_after_depart = world.merchant(id).unwrap().gold;

    // Two independent clients run the recovery protocol concurrently.
    let status = world.get_travel_status(id, arrival).unwrap();
    assert_eq!(
        reconcile(None, id, &status),
        Recovery::CompleteNow {
            destination: City::Goldmere
        }
    );
    assert_eq!(
        world.complete_travel("0xplayer", id, arrival),
        Ok(City::Goldmere)
    );
    // The slower client observes the benign no-op signal, not corruption.
    assert_eq!(
        world.complete_travel("0xplayer", id, arrival),
        Err(TravelError::NotTraveling)
    );
    assert_eq!(world.merchant(id).unwrap().gold, gold_after_depart);
    assert_eq!(
        world.merchant(id).unwrap().travel.current_city(),
        Some(City::Goldmere)
    );
}

#[test]
fn watcher_auto_heals_and_reports_changes() {
    let (mut world, id) = new_world();
    let start = 3_000;
    world.start_travel("0xplayer", id, 3, start).unwrap();
    let arrival = start + travel_duration(City::Silverport, City::Ironhold);

    let travel_changes = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&travel_changes);
    let mut watcher = StatusWatcher::new("0xplayer", id);
    watcher.on_travel_change(move |status| {
        seen.borrow_mut().push(status.is_traveling);
    });

    // Mid-flight: observed once, still traveling.
    let status = watcher.poll(&mut world, start + 1).unwrap();
    assert!(status.is_traveling);

    // Unchanged status does not refire the callback.
    watcher.poll(&mut world, start + 1).unwrap();

    // A different client's watcher heals the arrived trip; the original
    // trip-starter never came back.
    let mut other = StatusWatcher::new("0xplayer", id);
    let healed = other.poll(&mut world, arrival + 5).unwrap();
    assert!(!healed.is_traveling);

    let final_status = watcher.poll(&mut world, arrival + 6).unwrap();
    assert!(!final_status.is_traveling);
    assert_eq!(*travel_changes.borrow(), vec![true, false]);
    assert_eq!(
        world.merchant(id).unwrap().travel.current_city(),
        Some(City::Ironhold)
    );
}

#[test]
fn watcher_price_callback_fires_on_oracle_moves() {
    let (mut world, id) = new_world();
    let price_snapshots = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&price_snapshots);
    let mut watcher = StatusWatcher::new("0xplayer", id);
    watcher.on_price_change(move |prices| {
        seen.borrow_mut().push(prices[4]);
    });

    watcher.poll(&mut world, 10).unwrap();
    world
        .oracle_mut()
        .update_oracle_trends([10_000, 10_000, 10_000, 10_000, 14_000])
        .unwrap();
    watcher.poll(&mut world, 20).unwrap();
    watcher.poll(&mut world, 30).unwrap();

    let snapshots = price_snapshots.borrow();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0], Commodity::Iron.base_price());
    assert_eq!(snapshots[1], Commodity::Iron.base_price() * 14_000 / 10_000);
}

#[test]
fn cached_countdown_resumes_from_authoritative_remaining() {
    let (mut world, id) = new_world();
    let start = 4_000;
    world.start_travel("0xplayer", id, 2, start).unwrap();

    // The client cached an optimistic entry, then reloaded 3 seconds in.
    let entry = TravelCacheEntry {
        merchant_id: id,
        destination: City::Silkwind,
        start_time: start,
        duration: travel_duration(City::Silverport, City::Silkwind),
        phase: TravelPhase::Traveling,
    };
    let status = world.get_travel_status(id, start + 3).unwrap();
    assert_eq!(
        reconcile(Some(&entry), id, &status),
        Recovery::ResumeCountdown {
            destination: City::Silkwind,
            remaining: 5
        }
    );
}

#[test]
fn completed_trip_discards_the_cache() {
    let (mut world, id) = new_world();
    let start = 5_000;
    world.start_travel("0xplayer", id, 1, start).unwrap();
    let arrival = start + travel_duration(City::Silverport, City::Goldmere);
    world.complete_travel("0xplayer", id, arrival).unwrap();

    let entry = TravelCacheEntry {
        merchant_id: id,
        destination: City::Goldmere,
        start_time: start,
        duration: 5,
        phase: TravelPhase::Completing,
    };
    let status = world.get_travel_status(id, arrival + 60).unwrap();
    assert_eq!(reconcile(Some(&entry), id, &status), Recovery::DiscardCache);
}

#[test]
fn trade_route_session_exercises_core_systems() {
    let mut rng = ChaCha8Rng::seed_from_u64(1_337);
    let (mut world, id) = new_world();
    let mut now = 100_000;

    // A bull market sets in.
    let trends = MarketScenario::Bull.trends_bp(&mut rng);
    world.oracle_mut().update_oracle_trends(trends).unwrap();

    // Buy silk cheap at its source: travel to Silkwind first.
    world.start_travel("0xplayer", id, 2, now).unwrap();
    now += travel_duration(City::Silverport, City::Silkwind);
    world.complete_travel("0xplayer", id, now).unwrap();

    let silk_quote = world.city_price(City::Silkwind, Commodity::Silk, TradeSide::Buy);
    let receipt = world
        .buy("0xplayer", id, Commodity::Silk, 3)
        .unwrap();
    assert_eq!(receipt.unit_price, silk_quote);
    assert_eq!(receipt.total, silk_quote * 3);

    // Haul it to Ironhold, where luxuries fetch a premium.
    world.start_travel("0xplayer", id, 3, now).unwrap();
    now += travel_duration(City::Silkwind, City::Ironhold);
    world.complete_travel("0xplayer", id, now).unwrap();

    let receipt = world
        .sell("0xplayer", id, Commodity::Silk, 3)
        .unwrap();
    assert!(receipt.profit > 0);

    let merchant = world.merchant(id).unwrap();
    assert_eq!(merchant.total_trades, 2);
    assert_eq!(merchant.total_profit, receipt.profit);
    assert_eq!(merchant.holding(Commodity::Silk).quantity, 0);
    assert_eq!(merchant.travel.current_city(), Some(City::Ironhold));

    // Overspending is rejected with the exact shortfall.
    let gold = merchant.gold;
    let iron_quote = world.city_price(City::Ironhold, Commodity::Iron, TradeSide::Buy);
    let too_many = gold / iron_quote + 1;
    assert_eq!(
        world.buy("0xplayer", id, Commodity::Iron, too_many),
        Err(TradeError::InsufficientFunds {
            needed: iron_quote * too_many,
            available: gold
        })
    );
}
