//! End-to-end engine tests with paused time.
//!
//! Round letters are random, so tests read the letter back from a
//! snapshot and build words from it.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    Broken, Capitalized, Lenient, Recorder, Slow, SlowFor, SlowNames, Unreachable, chat, engine,
    pid, secs, word,
};
use lastword::{Engine, EngineBuilder};
use lastword_game::{GameConfig, Phase, Player, Rejection, Verdict};
use lastword_lexicon::Dictionary;
use lastword_protocol::{ChatId, Difficulty};

// =========================================================================
// Helpers
// =========================================================================

/// Opens a lobby hosted by the first id, joins the rest, starts the game,
/// and returns round 1's letter.
async fn started<D: Dictionary>(engine: &Engine<Recorder, D>, ids: &[&str]) -> char {
    engine
        .start_lobby(&chat(), &pid(ids[0]), Some(Difficulty::Easy))
        .await
        .unwrap();
    for id in &ids[1..] {
        engine.join(&chat(), &pid(id)).await.unwrap();
    }
    let session = engine.start(&chat()).await.unwrap();
    session.current_letter().unwrap()
}

async fn letter<D: Dictionary>(engine: &Engine<Recorder, D>) -> char {
    engine
        .snapshot(&chat())
        .await
        .and_then(|s| s.current_letter())
        .unwrap()
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_lobby_and_join() {
    let (engine, recorder) = engine(Lenient::default());

    let lobby = engine
        .start_lobby(&chat(), &pid("ana"), None)
        .await
        .unwrap();
    assert_eq!(lobby.phase(), Phase::Lobby);
    assert_eq!(lobby.difficulty(), Difficulty::Medium);
    assert!(recorder.last_text().contains("lobby started on medium mode by @ana"));

    let joined = engine.join(&chat(), &pid("bo")).await.unwrap();
    assert_eq!(joined.player_ids(), vec![pid("ana"), pid("bo")]);
    assert_eq!(recorder.last_text(), "@bo joined the word game! Current players: 2");

    let err = engine.join(&chat(), &pid("bo")).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::AlreadyJoined));
    assert_eq!(engine.active_sessions().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_without_lobby() {
    let (engine, _) = engine(Lenient::default());
    let err = engine.join(&chat(), &pid("bo")).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoLobby));
}

#[tokio::test(start_paused = true)]
async fn test_set_difficulty_only_in_lobby() {
    let (engine, recorder) = engine(Lenient::default());
    engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap();

    let session = engine.set_difficulty(&chat(), Difficulty::Hard).await.unwrap();
    assert_eq!(session.difficulty(), Difficulty::Hard);
    assert_eq!(recorder.last_text(), "Difficulty set to hard. Starting time: 35 seconds.");

    engine.join(&chat(), &pid("bo")).await.unwrap();
    engine.start(&chat()).await.unwrap();
    let err = engine.set_difficulty(&chat(), Difficulty::Easy).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoLobby));
}

#[tokio::test(start_paused = true)]
async fn test_new_lobby_replaces_lobby_but_not_game() {
    let (engine, _) = engine(Lenient::default());
    engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap();
    engine.join(&chat(), &pid("bo")).await.unwrap();

    let replaced = engine.start_lobby(&chat(), &pid("cy"), None).await.unwrap();
    assert_eq!(replaced.player_ids(), vec![pid("cy")]);

    engine.join(&chat(), &pid("di")).await.unwrap();
    engine.start(&chat()).await.unwrap();
    let err = engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::SessionAlreadyActive));
}

#[tokio::test(start_paused = true)]
async fn test_join_racing_a_lobby_replacement_is_refused() {
    let recorder = Recorder::default();
    let names = SlowNames {
        player: pid("bo"),
        delay: Duration::from_secs(5),
    };
    let engine = EngineBuilder::new().build(recorder.clone(), Lenient::default(), names);
    engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap();

    // bo's name lookup is still running when cy opens a new lobby.
    let joining = tokio::spawn({
        let engine = engine.clone();
        async move { engine.join(&chat(), &pid("bo")).await }
    });
    secs(1).await;
    engine.start_lobby(&chat(), &pid("cy"), None).await.unwrap();

    let err = joining.await.unwrap().unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoLobby));
    assert_eq!(recorder.count("joined the word game"), 0);
    assert_eq!(
        engine.snapshot(&chat()).await.unwrap().player_ids(),
        vec![pid("cy")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_start_needs_two_players() {
    let (engine, _) = engine(Lenient::default());
    engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap();

    let err = engine.start(&chat()).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NotEnoughPlayers { needed: 2 }));
    assert_eq!(engine.snapshot(&chat()).await.unwrap().phase(), Phase::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_start_announces_round_to_everyone() {
    let (engine, recorder) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo"]).await;

    let notices = recorder.notices();
    let Some(lastword_protocol::Notice::Text { text, mentions, .. }) = notices.last() else {
        panic!("expected a round announcement");
    };
    assert!(text.starts_with(&format!("Round 1: Submit a word starting with \"{letter}\" (min 3 letters)")));
    assert!(text.contains("Time: 45 seconds!"));
    assert_eq!(mentions, &vec![pid("ana"), pid("bo")]);
}

// =========================================================================
// Rounds
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_silent_player_is_eliminated_and_other_wins() {
    let (engine, recorder) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo"]).await;

    engine
        .submit(&chat(), &pid("ana"), &word(letter, "aaa"))
        .await
        .unwrap();
    secs(44).await;
    assert_eq!(recorder.count("Time's up"), 0, "fired too early");

    secs(2).await;
    assert_eq!(
        recorder.last_text(),
        "⏰ Time's up! Eliminated: @bo\n🏆 Game over! Winner: @ana"
    );
    assert_eq!(engine.active_sessions().await, 0);
    assert!(engine.snapshot(&chat()).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_nobody_answering_has_no_winner() {
    let (engine, recorder) = engine(Lenient::default());
    started(&engine, &["ana", "bo"]).await;

    secs(46).await;
    assert!(recorder.last_text().ends_with("🏁 Game over! No winner."));
    assert_eq!(engine.active_sessions().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_all_answered_resolves_early_and_only_once() {
    let (engine, recorder) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo"]).await;

    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();
    let last = engine
        .submit(&chat(), &pid("bo"), &word(letter, "bbb"))
        .await
        .unwrap();
    assert!(last.completes_round());
    assert_eq!(recorder.count("Next round starting"), 1);
    assert_eq!(engine.snapshot(&chat()).await.unwrap().phase(), Phase::RoundResolving);

    // Grace delay, then round 2. The round-1 timer never fires.
    secs(4).await;
    let session = engine.snapshot(&chat()).await.unwrap();
    assert_eq!(session.round(), 2);
    assert_eq!(session.phase(), Phase::RoundActive);

    secs(40).await;
    assert_eq!(recorder.count("Next round starting"), 1);
    assert_eq!(recorder.count("Time's up"), 0);

    // Round 2 (42 s, opened at t=3) times out with nobody answering.
    secs(2).await;
    assert_eq!(recorder.count("Time's up"), 1);
    assert_eq!(recorder.count("No winner"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submission_after_timeout_is_refused() {
    let (engine, recorder) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo", "cy"]).await;

    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();
    engine.submit(&chat(), &pid("bo"), &word(letter, "bbb")).await.unwrap();
    secs(46).await;
    assert_eq!(recorder.count("Eliminated: @cy"), 1);

    // Round 1 is closed; cy is out anyway, ana is waiting for round 2.
    let err = engine
        .submit(&chat(), &pid("ana"), &word(letter, "ccc"))
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoActiveRound));
    assert_eq!(recorder.count("Time's up"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_game_runs_several_rounds() {
    let (engine, recorder) = engine(Lenient::default());
    let first = started(&engine, &["ana", "bo", "cy"]).await;

    // Round 1: cy stays silent.
    engine.submit(&chat(), &pid("ana"), &word(first, "aaa")).await.unwrap();
    engine.submit(&chat(), &pid("bo"), &word(first, "bbb")).await.unwrap();
    secs(46).await;
    assert!(recorder.last_text().contains("Remaining: @ana, @bo"));

    // Grace delay, then round 2 with a shorter fuse.
    secs(3).await;
    let session = engine.snapshot(&chat()).await.unwrap();
    assert_eq!(session.round(), 2);
    assert_eq!(session.time_limit(), Duration::from_secs(42));
    assert_eq!(session.player_ids(), vec![pid("ana"), pid("bo")]);

    // Round 2: only bo answers.
    let second = letter(&engine).await;
    engine.submit(&chat(), &pid("bo"), &word(second, "zzz")).await.unwrap();
    secs(43).await;
    assert_eq!(
        recorder.last_text(),
        "⏰ Time's up! Eliminated: @ana\n🏆 Game over! Winner: @bo"
    );
    assert_eq!(engine.active_sessions().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_word_once_per_round() {
    let (engine, _) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo", "cy"]).await;

    let taken = word(letter, "aaa");
    engine.submit(&chat(), &pid("ana"), &taken).await.unwrap();
    let err = engine
        .submit(&chat(), &pid("bo"), &taken.to_uppercase())
        .await
        .unwrap_err();
    assert_eq!(
        err.rejection(),
        Some(&Rejection::AlreadyUsedInGame {
            word: taken.to_uppercase()
        })
    );
    assert!(!engine.snapshot(&chat()).await.unwrap().has_responded(&pid("bo")));
}

#[tokio::test(start_paused = true)]
async fn test_validation_order_through_engine() {
    let (engine, _) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo"]).await;
    let wrong = if letter == 'Z' { 'A' } else { 'Z' };

    let rejection = |r: Result<_, lastword::LastwordError>| r.unwrap_err().rejection().cloned();

    assert_eq!(
        rejection(engine.submit(&chat(), &pid("zed"), "anything").await),
        Some(Rejection::NotAPlayer)
    );
    assert_eq!(
        rejection(engine.submit(&chat(), &pid("ana"), "").await),
        Some(Rejection::InvalidFormat)
    );
    assert_eq!(
        rejection(engine.submit(&chat(), &pid("ana"), &word(letter, "a")).await),
        Some(Rejection::TooShort { min: 3 })
    );
    assert_eq!(
        rejection(engine.submit(&chat(), &pid("ana"), &word(wrong, "aaa")).await),
        Some(Rejection::WrongLetter { letter })
    );

    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();
    assert_eq!(
        rejection(engine.submit(&chat(), &pid("ana"), &word(letter, "bbb")).await),
        Some(Rejection::AlreadySubmitted)
    );
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_game() {
    let (engine, _) = engine(Lenient::default());
    let err = engine.submit(&chat(), &pid("ana"), "cat").await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoActiveRound));

    engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap();
    let err = engine.submit(&chat(), &pid("ana"), "cat").await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoActiveRound));
}

// =========================================================================
// Dictionary
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_unknown_word_is_rejected() {
    let (engine, recorder) = engine(Lenient::rejecting(&["xqz"]));
    let letter = started(&engine, &["ana", "bo"]).await;

    let fake = word(letter, "xqz").to_uppercase();
    let err = engine.submit(&chat(), &pid("ana"), &fake).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NotAWord { word: fake }));
    assert_eq!(engine.words().cached(&word(letter, "xqz")).await, Some(false));
    assert_eq!(recorder.count("submitted"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_lookup_counts_as_not_a_word_and_is_retried() {
    let dictionary = Broken::default();
    let calls = dictionary.calls.clone();
    let (engine, _) = engine(dictionary);
    let letter = started(&engine, &["ana", "bo"]).await;

    let attempt = word(letter, "aaa");
    for _ in 0..2 {
        let err = engine.submit(&chat(), &pid("ana"), &attempt).await.unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::NotAWord {
                word: attempt.clone()
            })
        );
    }
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2, "failures are not cached");
    assert!(engine.words().is_empty().await);
    assert_eq!(engine.snapshot(&chat()).await.unwrap().phase(), Phase::RoundActive);
}

#[tokio::test(start_paused = true)]
async fn test_answers_are_cached_across_chats() {
    let dictionary = Lenient::default();
    let (engine, _) = engine(dictionary.clone());
    let letter = started(&engine, &["ana", "bo"]).await;

    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();
    assert_eq!(dictionary.calls(), 1);
    assert_eq!(engine.words().cached(&word(letter, "aaa")).await, Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_straddling_timeout_is_refused() {
    let (engine, recorder) = engine(Slow {
        delay: Duration::from_secs(60),
    });
    let letter = started(&engine, &["ana", "bo"]).await;

    // The round times out while the dictionary is still thinking.
    let err = engine
        .submit(&chat(), &pid("ana"), &word(letter, "aaa"))
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoActiveRound));
    assert_eq!(recorder.count("No winner"), 1);
    assert_eq!(recorder.count("submitted"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_last_answer_on_the_deadline_resolves_once() {
    let (engine, recorder) = engine(SlowFor {
        suffix: "zzz".into(),
        delay: Duration::from_secs(45),
    });
    let letter = started(&engine, &["ana", "bo"]).await;

    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();
    // bo's lookup returns at the same instant the round timer fires.
    let last = engine.submit(&chat(), &pid("bo"), &word(letter, "zzz")).await;
    secs(1).await;

    let resolutions = recorder
        .texts()
        .iter()
        .filter(|t| {
            t.contains("Time's up") || t.contains("Next round starting") || t.contains("Game over")
        })
        .count();
    assert_eq!(resolutions, 1);

    match last {
        Ok(accepted) => {
            assert!(accepted.completes_round());
            let session = engine.snapshot(&chat()).await.unwrap();
            assert_eq!(session.phase(), Phase::RoundResolving);
            assert_eq!(session.player_ids(), vec![pid("ana"), pid("bo")]);
        }
        Err(err) => {
            assert_eq!(err.rejection(), Some(&Rejection::NoActiveRound));
            assert_eq!(
                recorder.last_text(),
                "⏰ Time's up! Eliminated: @bo\n🏆 Game over! Winner: @ana"
            );
            assert_eq!(engine.active_sessions().await, 0);
        }
    }
}

// =========================================================================
// Forfeit and end
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_forfeit_leaves_winner() {
    let (engine, recorder) = engine(Lenient::default());
    started(&engine, &["ana", "bo"]).await;

    let forfeit = engine.forfeit(&chat(), &pid("ana")).await.unwrap();
    assert_eq!(forfeit.verdict, Verdict::Winner(Player::new(pid("bo"), "@bo")));
    assert_eq!(
        recorder.last_text(),
        "@ana has forfeited!\n🏆 Game over! Winner: @bo"
    );
    assert_eq!(engine.active_sessions().await, 0);

    // The cancelled round timer stays silent.
    secs(60).await;
    assert_eq!(recorder.count("Time's up"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_forfeit_with_players_left_starts_fresh_round() {
    let (engine, recorder) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo", "cy"]).await;
    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();

    let forfeit = engine.forfeit(&chat(), &pid("cy")).await.unwrap();
    assert!(!forfeit.verdict.ends_game());
    assert!(recorder.last_text().contains("Remaining: @ana, @bo"));

    secs(4).await;
    let session = engine.snapshot(&chat()).await.unwrap();
    assert_eq!(session.round(), 2);
    assert_eq!(session.phase(), Phase::RoundActive);
    assert!(session.responses().is_empty());
    assert_eq!(recorder.count("Time's up"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_forfeit_in_lobby_is_rejected() {
    let (engine, _) = engine(Lenient::default());
    engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap();
    let err = engine.forfeit(&chat(), &pid("ana")).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoActiveRound));
}

#[tokio::test(start_paused = true)]
async fn test_end_twice() {
    let (engine, recorder) = engine(Lenient::default());
    started(&engine, &["ana", "bo"]).await;

    engine.end(&chat(), &pid("bo")).await.unwrap();
    assert_eq!(recorder.last_text(), "Word game ended by @bo.");
    assert_eq!(engine.active_sessions().await, 0);

    let err = engine.end(&chat(), &pid("bo")).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NoActiveRound));

    secs(60).await;
    assert_eq!(recorder.count("Time's up"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_end_by_outsider_is_rejected() {
    let (engine, _) = engine(Lenient::default());
    started(&engine, &["ana", "bo"]).await;

    let err = engine.end(&chat(), &pid("zed")).await.unwrap_err();
    assert_eq!(err.rejection(), Some(&Rejection::NotAPlayer));
    assert_eq!(engine.active_sessions().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_end_during_grace_delay_cancels_next_round() {
    let (engine, recorder) = engine(Lenient::default());
    let letter = started(&engine, &["ana", "bo"]).await;
    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();
    engine.submit(&chat(), &pid("bo"), &word(letter, "bbb")).await.unwrap();

    engine.end(&chat(), &pid("ana")).await.unwrap();
    secs(10).await;
    assert_eq!(recorder.count("Round 2"), 0);
}

// =========================================================================
// Isolation, names, shutdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_chats_do_not_interfere() {
    let (engine, recorder) = engine(Lenient::default());
    let other = ChatId::new("group-2");
    started(&engine, &["ana", "bo"]).await;

    engine.start_lobby(&other, &pid("cy"), Some(Difficulty::Hard)).await.unwrap();
    engine.join(&other, &pid("di")).await.unwrap();
    engine.start(&other).await.unwrap();
    assert_eq!(engine.active_sessions().await, 2);

    engine.end(&chat(), &pid("ana")).await.unwrap();
    let survivor = engine.snapshot(&other).await.unwrap();
    assert_eq!(survivor.phase(), Phase::RoundActive);
    assert_eq!(survivor.time_limit(), Duration::from_secs(35));

    secs(36).await;
    assert_eq!(recorder.count("No winner"), 1);
    assert_eq!(engine.active_sessions().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_names_resolved_once_with_fallback() {
    let recorder = Recorder::default();
    let engine = Engine::new(GameConfig::default(), recorder.clone(), Lenient::default(), Capitalized);
    let lobby = engine.start_lobby(&chat(), &pid("ana"), None).await.unwrap();
    assert_eq!(lobby.players()[0].display_name, "@Ana");

    let recorder = Recorder::default();
    let engine = Engine::new(GameConfig::default(), recorder.clone(), Lenient::default(), Unreachable);
    let lobby = engine
        .start_lobby(&chat(), &pid("+4915112345@s.net"), None)
        .await
        .unwrap();
    assert_eq!(lobby.players()[0].display_name, "@4915112345");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    let (engine, recorder) = engine(Lenient::default());
    started(&engine, &["ana", "bo"]).await;
    engine
        .start_lobby(&ChatId::new("group-2"), &pid("cy"), None)
        .await
        .unwrap();

    assert_eq!(engine.shutdown().await, 2);
    assert_eq!(engine.active_sessions().await, 0);
    assert_eq!(recorder.count("shutting down"), 2);

    secs(60).await;
    assert_eq!(recorder.count("Time's up"), 0);
    assert_eq!(recorder.count("No winner"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_engine_drops_pending_timers() {
    let dictionary = Lenient::default();
    let (engine, recorder) = engine(dictionary.clone());
    started(&engine, &["ana", "bo"]).await;

    drop(engine);
    assert_eq!(Arc::strong_count(&dictionary.calls), 1, "engine state outlived the engine");

    secs(60).await;
    assert_eq!(recorder.count("Time's up"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_custom_grace_delay() {
    let recorder = Recorder::default();
    let config = GameConfig {
        next_round_delay_ms: 10_000,
        ..GameConfig::default()
    };
    let engine = Engine::new(config, recorder.clone(), Lenient::default(), lastword::PlaceholderNames);
    let letter = started(&engine, &["ana", "bo"]).await;
    engine.submit(&chat(), &pid("ana"), &word(letter, "aaa")).await.unwrap();
    engine.submit(&chat(), &pid("bo"), &word(letter, "bbb")).await.unwrap();

    secs(5).await;
    assert_eq!(engine.snapshot(&chat()).await.unwrap().round(), 1);
    secs(6).await;
    assert_eq!(engine.snapshot(&chat()).await.unwrap().round(), 2);
}
