//! Review cycle journey
//!
//! A learner meets a card, grades it through the classic SM-2 ladder, then
//! forgets it. Every step checks the scheduling state the client would see.
//! All timestamps are injected so the due-date boundaries are deterministic.

use chrono::Duration;
use linguadeck_e2e::{ReviewFixtures, TestDatabaseManager};
use linguadeck_core::DueQuery;

#[test]
fn full_review_cycle_walks_the_interval_ladder() {
    let db = TestDatabaseManager::new_temp();
    let user = ReviewFixtures::user_id(1);
    let deck = ReviewFixtures::spanish_deck();

    // Day 0: first exposure via the deck flow, then a good recall.
    let mut now = db.now() - Duration::days(40);
    db.storage
        .register_card_at(&user, "hola", &deck, now)
        .unwrap();

    let first = db
        .storage
        .apply_review_at(&ReviewFixtures::review_input(&user, &deck, "hola", 4), now)
        .unwrap();
    assert!(first.is_correct);
    assert_eq!(first.card.repetition, 1);
    assert_eq!(first.card.interval_days, 1);
    assert_eq!(first.card.next_review, Some(now + Duration::days(1)));

    // Day 1: the card is due again; second good recall moves it 6 days out.
    now += Duration::days(1);
    let due = db
        .storage
        .get_due_cards_at(&DueQuery::for_user(&user), now)
        .unwrap();
    assert_eq!(due.total_due, 1);
    assert_eq!(due.cards[0].card_id, "hola");

    let second = db
        .storage
        .apply_review_at(&ReviewFixtures::review_input(&user, &deck, "hola", 4), now)
        .unwrap();
    assert_eq!(second.card.repetition, 2);
    assert_eq!(second.card.interval_days, 6);

    // Day 7: a perfect recall compounds the interval and masters the card.
    now += Duration::days(6);
    let third = db
        .storage
        .apply_review_at(&ReviewFixtures::review_input(&user, &deck, "hola", 5), now)
        .unwrap();
    assert_eq!(third.card.repetition, 3);
    // Easiness after (4, 4, 5) is 2.6; round(6 * 2.6) = 16.
    assert!((third.card.easiness_factor - 2.6).abs() < 1e-9);
    assert_eq!(third.card.interval_days, 16);
    assert!(third.card.is_mastered());

    let summary = db.storage.get_summary_at(&user, now).unwrap();
    assert_eq!(summary.mastered, 1);
    assert_eq!(summary.learning, 0);

    // In between, nothing is due.
    let quiet = db
        .storage
        .get_due_cards_at(&DueQuery::for_user(&user), now + Duration::days(15))
        .unwrap();
    assert_eq!(quiet.total_due, 0);
    assert!(!quiet.has_due_cards());

    // Day 23: the learner blanks. Streak and interval collapse, but the
    // lifetime counters keep the full history.
    now += Duration::days(16);
    let lapse = db
        .storage
        .apply_review_at(&ReviewFixtures::review_input(&user, &deck, "hola", 1), now)
        .unwrap();
    assert!(!lapse.is_correct);
    assert_eq!(lapse.card.repetition, 0);
    assert_eq!(lapse.card.interval_days, 1);
    assert_eq!(lapse.card.total_reviews, 4);
    assert_eq!(lapse.card.correct_count, 3);
    assert_eq!(lapse.card.incorrect_count, 1);

    // Back to the learning bucket.
    let summary = db.storage.get_summary_at(&user, now).unwrap();
    assert_eq!(summary.mastered, 0);
    assert_eq!(summary.learning, 1);
}

#[test]
fn failed_review_never_advances_the_schedule_past_tomorrow() {
    let db = TestDatabaseManager::new_temp();
    let user = ReviewFixtures::user_id(2);
    let deck = ReviewFixtures::spanish_deck();

    let mut now = db.now() - Duration::days(90);
    // Build a long interval first.
    for quality in [4, 4, 5, 5, 5] {
        let outcome = db
            .storage
            .apply_review_at(
                &ReviewFixtures::review_input(&user, &deck, "gato", quality),
                now,
            )
            .unwrap();
        now += Duration::days(outcome.card.interval_days as i64);
    }

    let before = db.storage.get_card(&user, "gato", &deck).unwrap().unwrap();
    assert!(before.interval_days > 30);

    // Total blackout: due again tomorrow, no matter how large the interval was.
    let failed = db
        .storage
        .apply_review_at(&ReviewFixtures::review_input(&user, &deck, "gato", 0), now)
        .unwrap();
    assert_eq!(failed.card.interval_days, 1);
    assert_eq!(failed.card.next_review, Some(now + Duration::days(1)));
}

#[test]
fn replayed_review_submission_grades_exactly_once() {
    let db = TestDatabaseManager::new_temp();
    let user = ReviewFixtures::user_id(3);
    let deck = ReviewFixtures::spanish_deck();
    let now = db.now();

    let input = ReviewFixtures::review_input(&user, &deck, "perro", 4);

    let first = db.storage.apply_review_at(&input, now).unwrap();
    assert!(!first.deduplicated);

    // The client retries the same submission after a timeout.
    let replay = db
        .storage
        .apply_review_at(&input, now + Duration::seconds(30))
        .unwrap();
    assert!(replay.deduplicated);
    assert_eq!(replay.card.total_reviews, 1);
    assert_eq!(replay.card.repetition, 1);
    assert_eq!(replay.card.next_review, first.card.next_review);
}
