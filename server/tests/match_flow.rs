mod common;

use common::*;
use mineduel_core::*;
use mineduel_protocol::ServerMessage;

/// Host and guest seated in a started easy match; inboxes drained.
fn started_match(harness: &Harness) -> (MatchId, (PlayerId, Inbox), (PlayerId, Inbox)) {
    let (host, mut host_inbox) = harness.connect("host");
    let (guest, mut guest_inbox) = harness.connect("guest");

    harness.send(
        &host,
        r#"{"type":"createMatch","playerName":"Ada","difficulty":"easy","maxPlayers":2}"#,
    );
    let id = last_view(&drain(&mut host_inbox)).unwrap().match_id;
    harness.send(
        &guest,
        &format!(r#"{{"type":"joinMatch","matchId":"{id}","playerName":"Bob"}}"#),
    );
    harness.send(&host, &format!(r#"{{"type":"startMatch","matchId":"{id}"}}"#));
    drain(&mut host_inbox);
    drain(&mut guest_inbox);

    (id, (host, host_inbox), (guest, guest_inbox))
}

fn reveal(harness: &Harness, who: &PlayerId, id: &MatchId, (row, col): Coord2) {
    harness.send(
        who,
        &format!(r#"{{"type":"revealCell","matchId":"{id}","row":{row},"col":{col}}}"#),
    );
}

#[test]
fn create_join_start_notifies_everyone() {
    let harness = Harness::new();
    let (host, mut host_inbox) = harness.connect("host");
    let (guest, mut guest_inbox) = harness.connect("guest");
    assert_eq!(drain(&mut host_inbox)[0], ServerMessage::LobbyJoined);
    drain(&mut guest_inbox);

    harness.send(
        &host,
        r#"{"type":"createMatch","playerName":"Ada","difficulty":"easy","maxPlayers":2}"#,
    );
    let messages = drain(&mut host_inbox);
    let ServerMessage::MatchCreated { match_id, state } = &messages[0] else {
        panic!("expected matchCreated, got {:?}", messages[0]);
    };
    assert_eq!(state.state, MatchState::Waiting);
    assert_eq!((state.width, state.height, state.mine_count), (8, 8, 10));
    let id = match_id.clone();

    let lobby = drain(&mut guest_inbox);
    let Some(ServerMessage::LobbyUpdate(snapshot)) = lobby.last() else {
        panic!("expected a lobby update, got {lobby:?}");
    };
    assert_eq!(snapshot.active_connections, 1);
    assert_eq!(snapshot.available_matches[0].match_id, id);

    harness.send(
        &guest,
        &format!(r#"{{"type":"joinMatch","matchId":"{id}","playerName":"Bob"}}"#),
    );
    let joined = drain(&mut guest_inbox);
    assert!(matches!(&joined[0], ServerMessage::MatchJoined { match_id, .. } if *match_id == id));
    assert_eq!(last_view(&drain(&mut host_inbox)).unwrap().players.len(), 2);

    harness.send(&guest, &format!(r#"{{"type":"startMatch","matchId":"{id}"}}"#));
    assert_eq!(
        errors(&drain(&mut guest_inbox)),
        ["Only the host can start the game"]
    );
    assert!(drain(&mut host_inbox).is_empty());

    harness.send(&host, &format!(r#"{{"type":"startMatch","matchId":"{id}"}}"#));
    for inbox in [&mut host_inbox, &mut guest_inbox] {
        let messages = drain(inbox);
        assert_eq!(last_view(&messages).unwrap().state, MatchState::Playing);
        let Some(ServerMessage::LobbyUpdate(snapshot)) = messages.last() else {
            panic!("expected a lobby update, got {messages:?}");
        };
        assert!(snapshot.available_matches.is_empty());
    }
}

#[test]
fn first_reveal_opens_a_safe_corner() {
    let harness = Harness::new();
    let (id, (host, mut host_inbox), (_, mut guest_inbox)) = started_match(&harness);

    reveal(&harness, &host, &id, (0, 0));

    let view = last_view(&drain(&mut guest_inbox)).unwrap();
    assert_eq!(view, last_view(&drain(&mut host_inbox)).unwrap());
    let corner: [Coord2; 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];
    for pos in corner {
        let cell = &view.board[usize::from(pos.0)][usize::from(pos.1)];
        assert!(cell.is_revealed, "{pos:?} should be open");
        assert!(!cell.is_mine);
        assert_eq!(cell.revealed_by, Some(host.clone()));
    }
    assert_eq!(view.board[0][0].neighbor_mines, 0);
    assert_eq!(view.current_player, 1);
    assert!(view.players[0].score >= 4);
}

#[test]
fn out_of_turn_reveal_changes_nothing() {
    let harness = Harness::new();
    let (id, (host, mut host_inbox), (guest, mut guest_inbox)) = started_match(&harness);
    reveal(&harness, &host, &id, (0, 0));
    let before = last_view(&drain(&mut host_inbox)).unwrap();
    drain(&mut guest_inbox);

    reveal(&harness, &host, &id, (7, 7));

    assert_eq!(errors(&drain(&mut host_inbox)), ["Not your turn"]);
    assert!(drain(&mut guest_inbox).is_empty());
    assert_eq!(harness.dispatcher.registry().match_view(&id).unwrap(), before);

    reveal(&harness, &guest, &id, (0, 0));
    assert_eq!(errors(&drain(&mut guest_inbox)), ["Cell not clickable"]);
}

#[test]
fn bad_input_is_reported_to_the_sender_only() {
    let harness = Harness::new();
    let (id, (host, mut host_inbox), (_, mut guest_inbox)) = started_match(&harness);

    reveal(&harness, &host, &id, (8, 0));
    harness.send(&host, r#"{"type":"revealCell","matchId":"X","row":999,"col":0}"#);
    harness.send(&host, "not json");
    reveal(&harness, &host, &MatchId::new("NOPE99"), (0, 0));

    let reported = errors(&drain(&mut host_inbox));
    assert_eq!(reported.len(), 4);
    assert_eq!(reported[0], "Invalid coordinates");
    assert!(reported[1].starts_with("Invalid message"));
    assert!(reported[2].starts_with("Invalid message"));
    assert_eq!(reported[3], "Game not found");
    assert!(drain(&mut guest_inbox).is_empty());
}

#[test]
fn late_and_surplus_joins_are_rejected() {
    let harness = Harness::new();
    let (id, _, _) = started_match(&harness);
    let (late, mut late_inbox) = harness.connect("late");
    drain(&mut late_inbox);

    harness.send(
        &late,
        &format!(r#"{{"type":"joinMatch","matchId":"{id}","playerName":"Cy"}}"#),
    );
    assert_eq!(errors(&drain(&mut late_inbox)), ["Game already started"]);

    let (host, mut host_inbox) = harness.connect("host2");
    harness.send(
        &host,
        r#"{"type":"createMatch","playerName":"Di","difficulty":"hard","maxPlayers":2}"#,
    );
    let id = last_view(&drain(&mut host_inbox)).unwrap().match_id;
    let (second, mut second_inbox) = harness.connect("second");
    let (third, mut third_inbox) = harness.connect("third");
    let join = |who: &PlayerId, name: &str| {
        harness.send(
            who,
            &format!(r#"{{"type":"joinMatch","matchId":"{id}","playerName":"{name}"}}"#),
        );
    };

    join(&second, "Eve");
    join(&third, "Fay");

    assert!(errors(&drain(&mut second_inbox)).is_empty());
    assert_eq!(errors(&drain(&mut third_inbox)), ["Game is full"]);
    let view = harness.dispatcher.registry().match_view(&id).unwrap();
    assert_eq!(view.players.len(), 2);
    assert_eq!(view.state, MatchState::Waiting);
}

#[test]
fn flags_alternate_turns_and_stay_visible() {
    let harness = Harness::new();
    let (id, (host, mut host_inbox), (guest, _)) = started_match(&harness);

    let flag = |who: &PlayerId, row: u8, col: u8| {
        harness.send(
            who,
            &format!(r#"{{"type":"toggleFlag","matchId":"{id}","row":{row},"col":{col}}}"#),
        );
    };
    flag(&host, 5, 5);
    flag(&guest, 5, 5);
    flag(&host, 2, 3);

    let view = last_view(&drain(&mut host_inbox)).unwrap();
    assert!(!view.board[5][5].is_flagged);
    assert!(view.board[2][3].is_flagged);
    assert!(!view.board[2][3].is_revealed);
    assert_eq!(view.current_player, 1);
}

#[test]
fn played_out_match_is_archived_and_replayable() {
    let harness = Harness::new();
    let (id, (host, mut host_inbox), (guest, mut guest_inbox)) = started_match(&harness);
    let players = [host.clone(), guest.clone()];

    let mut view = harness.dispatcher.registry().match_view(&id).unwrap();
    let cells: Vec<Coord2> = Dimensions::new(8, 8).positions().collect();
    for pos in cells {
        if view.state == MatchState::Finished {
            break;
        }
        if view.board[usize::from(pos.0)][usize::from(pos.1)].is_revealed {
            continue;
        }
        harness.clock.advance(1_500);
        reveal(&harness, &players[view.current_player], &id, pos);
        view = last_view(&drain(&mut host_inbox)).unwrap();
    }
    assert_eq!(view.state, MatchState::Finished);
    let reason = view.end_reason.unwrap();
    let winner = view.winner.clone().unwrap();
    assert_eq!(last_view(&drain(&mut guest_inbox)).unwrap(), view);

    // a finished match refuses further moves
    reveal(&harness, &host, &id, (7, 7));
    assert_eq!(errors(&drain(&mut host_inbox)), ["Game not active"]);

    harness.send(&guest, r#"{"type":"getHistory"}"#);
    let messages = drain(&mut guest_inbox);
    let ServerMessage::HistoryList { entries } = &messages[0] else {
        panic!("expected a history list");
    };
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.match_id, id);
    assert_eq!(entry.reason, reason);
    assert_eq!(entry.winner.as_ref(), Some(&winner));
    assert_eq!(entry.mines.len(), 10);
    assert_eq!(entry.duration, entry.ended_at - entry.started_at);
    assert!(entry.duration > 0);

    harness.send(&guest, r#"{"type":"getLeaderboard","filter":"easy"}"#);
    let messages = drain(&mut guest_inbox);
    let ServerMessage::LeaderboardList { entries: board, .. } = &messages[0] else {
        panic!("expected a leaderboard");
    };
    match reason {
        EndReason::Completed => {
            assert_eq!(board.len(), 1);
            assert_eq!(board[0].rank, 1);
            assert_eq!(board[0].duration, entry.duration);
        }
        EndReason::MineHit => assert!(board.is_empty()),
    }

    harness.send(&host, &format!(r#"{{"type":"getReplay","matchId":"{id}"}}"#));
    let replies = drain(&mut host_inbox);
    let ServerMessage::ReplayData { entry: archived } = &replies[0] else {
        panic!("expected replay data");
    };
    assert_eq!(archived, entry);
    let replay = Replay::new(archived).unwrap();
    assert_eq!(replay.view_after(replay.len()), view.board);
    assert_eq!(replay.board_after(0).revealed_count(), 0);
}

#[test]
fn replay_of_unknown_match_is_an_error() {
    let harness = Harness::new();
    let (conn, mut inbox) = harness.connect("curious");
    drain(&mut inbox);

    harness.send(&conn, r#"{"type":"getReplay","matchId":"ZZZZZZ"}"#);

    assert_eq!(errors(&drain(&mut inbox)), ["Game not found"]);
}
