//! Multi-deck and multi-user journeys
//!
//! Deck filtering, per-user isolation, and the summary rollup across decks.

use chrono::Duration;
use linguadeck_e2e::{ReviewFixtures, TestDatabaseManager};
use linguadeck_core::DueQuery;

#[test]
fn deck_filter_scopes_the_due_queue() {
    let db = TestDatabaseManager::new_temp();
    let user = ReviewFixtures::user_id(1);
    let reviewed_at = db.now() - Duration::days(3);

    db.seed_due_cards(&user, &ReviewFixtures::spanish_deck(), 3, reviewed_at);
    db.seed_review(&user, &ReviewFixtures::french_deck(), "bonjour", 4, reviewed_at);

    // Unfiltered: everything due across decks.
    let all = db
        .storage
        .get_due_cards_at(&DueQuery::for_user(&user), db.now())
        .unwrap();
    assert_eq!(all.total_due, 4);

    // Filtered: only the Spanish deck.
    let spanish = db
        .storage
        .get_due_cards_at(
            &ReviewFixtures::deck_query(&user, &ReviewFixtures::spanish_deck(), 20),
            db.now(),
        )
        .unwrap();
    assert_eq!(spanish.total_due, 3);
    assert!(spanish
        .cards
        .iter()
        .all(|c| c.deck_id == ReviewFixtures::spanish_deck()));
}

#[test]
fn users_never_see_each_other() {
    let db = TestDatabaseManager::new_temp();
    let alice = ReviewFixtures::user_id(10);
    let bob = ReviewFixtures::user_id(11);
    let deck = ReviewFixtures::spanish_deck();
    let reviewed_at = db.now() - Duration::days(2);

    // Both review the same card ids; records stay separate.
    db.seed_review(&alice, &deck, "hola", 5, reviewed_at);
    db.seed_review(&bob, &deck, "hola", 0, reviewed_at);

    let alice_card = db.storage.get_card(&alice, "hola", &deck).unwrap().unwrap();
    let bob_card = db.storage.get_card(&bob, "hola", &deck).unwrap().unwrap();
    assert_eq!(alice_card.correct_count, 1);
    assert_eq!(bob_card.incorrect_count, 1);

    let alice_due = db
        .storage
        .get_due_cards_at(&DueQuery::for_user(&alice), db.now())
        .unwrap();
    assert!(alice_due.cards.iter().all(|c| c.user_id == alice));

    let alice_summary = db.storage.get_summary_at(&alice, db.now()).unwrap();
    assert_eq!(alice_summary.total_cards, 1);
}

#[test]
fn summary_rolls_up_across_decks() {
    let db = TestDatabaseManager::new_temp();
    let user = ReviewFixtures::user_id(20);

    db.seed_mastered_card(&user, &ReviewFixtures::spanish_deck(), "hola");
    db.seed_due_cards(
        &user,
        &ReviewFixtures::french_deck(),
        2,
        db.now() - Duration::days(2),
    );
    db.seed_unreviewed_cards(&user, &ReviewFixtures::spanish_deck(), 3);

    let summary = db.storage.get_summary_at(&user, db.now()).unwrap();
    assert_eq!(summary.total_cards, 6);
    assert_eq!(summary.mastered, 1);
    assert_eq!(summary.learning, 2);
    assert!(summary.has_cards());

    // The mastered card and the two learning cards are all overdue; the
    // three registered-only cards have no schedule yet.
    assert_eq!(summary.due_today, 3);
}

#[test]
fn unreviewed_cards_stay_out_of_the_due_queue() {
    let db = TestDatabaseManager::new_temp();
    let user = ReviewFixtures::user_id(30);
    let deck = ReviewFixtures::spanish_deck();

    db.seed_unreviewed_cards(&user, &deck, 5);

    let due = db
        .storage
        .get_due_cards_at(&DueQuery::for_user(&user), db.now() + Duration::days(365))
        .unwrap();
    assert_eq!(due.total_due, 0);
    assert!(due.cards.is_empty());

    // They still count toward the user's totals.
    assert_eq!(db.card_count(&user), 5);
}
