//! Integration tests for the room client against a scripted coordinator
//!
//! These tests validate cross-component interactions over real TCP connections.

use client::game::Phase;
use client::network::{Channel, ChannelConfig, ChannelEvent, Subscription};
use client::room::{Event, RoomClient, UserInput};
use client::session::Session;
use shared::{
    decode_body, encode_frame, frame_body_len, ChatKind, Intent, Notification, Participant,
    Role, SeatRole, FRAME_HEADER_LEN,
};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

async fn push(stream: &mut TcpStream, notification: &Notification) {
    let frame = encode_frame(notification).unwrap();
    stream.write_all(&frame).await.unwrap();
}

async fn read_intent(stream: &mut TcpStream) -> Intent {
    let mut header = [0u8; FRAME_HEADER_LEN];
    timeout(WAIT, stream.read_exact(&mut header))
        .await
        .expect("timed out waiting for intent")
        .unwrap();
    let mut body = vec![0u8; frame_body_len(header).unwrap()];
    stream.read_exact(&mut body).await.unwrap();
    decode_body(&body).unwrap()
}

/// One client process: channel, subscription and room core.
struct TestClient {
    channel: Channel,
    events: Subscription,
    room: RoomClient,
}

impl TestClient {
    /// Connects, joins and returns the client with the coordinator side of its socket.
    async fn join(listener: &TcpListener, name: &str, room: &str) -> (Self, TcpStream) {
        let address = listener.local_addr().unwrap().to_string();
        let channel = Channel::connect(&address, ChannelConfig::default())
            .await
            .unwrap();
        let (peer, _) = listener.accept().await.unwrap();

        let events = channel.subscribe();
        let (session, intent) = Session::join(name, room, channel.identity()).unwrap();
        channel.send(intent);

        let client = Self {
            channel,
            events,
            room: RoomClient::new(session),
        };
        (client, peer)
    }

    /// Waits for `count` channel events and feeds them through the room core.
    async fn pump(&mut self, count: usize) {
        for _ in 0..count {
            let event = timeout(WAIT, self.events.recv())
                .await
                .expect("timed out waiting for notification")
                .expect("subscription closed");
            self.dispatch(Event::from(event));
        }
    }

    fn input(&mut self, input: UserInput) {
        self.dispatch(Event::Input(input));
    }

    fn dispatch(&mut self, event: Event) {
        for intent in self.room.handle(event, Instant::now()) {
            self.channel.send(intent);
        }
    }
}

fn roster(bob_score: u32) -> Vec<Participant> {
    vec![
        Participant::new("ann-id", "Ann", 0, Role::Drawer),
        Participant::new("bob-id", "Bob", bob_score, Role::Guesser),
        Participant::new("cy-id", "Cy", 0, Role::Spectator),
    ]
}

/// Pushes the round-start burst the coordinator sends each participant.
async fn start_round(peer: &mut TcpStream, identity: &str, seat: SeatRole, word_or_hint: Notification) {
    push(
        peer,
        &Notification::Connected {
            identity: identity.to_string(),
        },
    )
    .await;
    push(peer, &Notification::Players { players: roster(0) }).await;
    push(peer, &Notification::Role { role: seat }).await;
    push(
        peer,
        &Notification::Drawer {
            identity: "ann-id".to_string(),
        },
    )
    .await;
    push(peer, &word_or_hint).await;
    push(
        peer,
        &Notification::Time {
            remaining_seconds: 60,
        },
    )
    .await;
}

/// FULL ROUND SCENARIO TESTS
mod scenario_tests {
    use super::*;

    /// Drawer draws, guesser guesses, scores move only through the roster broadcast
    #[tokio::test]
    async fn full_round_with_three_clients() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let (mut ann, mut ann_peer) = TestClient::join(&listener, "Ann", "ABCD").await;
        let (mut bob, mut bob_peer) = TestClient::join(&listener, "Bob", "ABCD").await;
        let (mut cy, mut cy_peer) = TestClient::join(&listener, "Cy", "ABCD").await;

        for peer in [&mut ann_peer, &mut bob_peer, &mut cy_peer] {
            assert!(matches!(read_intent(peer).await, Intent::JoinRoom { .. }));
        }

        let hint = Notification::Hint {
            text: "_ _ _ _ _".to_string(),
        };
        start_round(
            &mut ann_peer,
            "ann-id",
            SeatRole::Player,
            Notification::Word {
                text: "apple".to_string(),
            },
        )
        .await;
        start_round(&mut bob_peer, "bob-id", SeatRole::Player, hint.clone()).await;
        start_round(&mut cy_peer, "cy-id", SeatRole::Spectator, hint).await;

        ann.pump(6).await;
        bob.pump(6).await;
        cy.pump(6).await;

        assert_eq!(ann.room.role(), Role::Drawer);
        assert_eq!(bob.room.role(), Role::Guesser);
        assert_eq!(cy.room.role(), Role::Spectator);
        assert_eq!(ann.room.phase(), Phase::Active);
        assert_eq!(ann.room.word_or_hint(), Some("apple"));
        assert_eq!(bob.room.word_or_hint(), Some("_ _ _ _ _"));
        assert!(bob.room.can_guess());
        assert!(!cy.room.can_guess());

        // Ann draws one stroke; the coordinator relays it but never echoes it back.
        ann.input(UserInput::PointerDown { x: 100.0, y: 100.0 });
        ann.input(UserInput::PointerMove { x: 200.0, y: 150.0 });
        ann.input(UserInput::PointerMove { x: 260.0, y: 120.0 });
        ann.input(UserInput::PointerUp);

        for _ in 0..2 {
            let Intent::Draw { room, segment } = read_intent(&mut ann_peer).await else {
                panic!("Expected a draw intent");
            };
            assert_eq!(room, "ABCD");
            let relay = Notification::Draw { segment };
            push(&mut bob_peer, &relay).await;
            push(&mut cy_peer, &relay).await;
        }
        bob.pump(2).await;
        cy.pump(2).await;

        assert!(!ann.room.surface().is_blank());
        assert_eq!(ann.room.surface(), bob.room.surface());
        assert_eq!(ann.room.surface(), cy.room.surface());

        // Bob guesses; typing pulses reach the coordinator first.
        for c in "apple".chars() {
            bob.input(UserInput::TypeChar(c));
        }
        bob.input(UserInput::SubmitGuess);

        let guess = loop {
            match read_intent(&mut bob_peer).await {
                Intent::Typing { name } => assert_eq!(name, "Bob"),
                other => break other,
            }
        };
        assert_eq!(
            guess,
            Intent::Guess {
                text: "apple".to_string()
            }
        );
        assert_eq!(bob.room.guess_text(), "");
        assert_eq!(bob.room.ranked_roster()[0].score, 0);

        let notice = Notification::Message {
            author: String::new(),
            text: "Bob guessed the word!".to_string(),
            kind: ChatKind::SystemNotice,
        };
        for (client, peer) in [
            (&mut ann, &mut ann_peer),
            (&mut bob, &mut bob_peer),
            (&mut cy, &mut cy_peer),
        ] {
            push(peer, &notice).await;
            push(peer, &Notification::Players { players: roster(100) }).await;
            client.pump(2).await;
        }

        for client in [&ann, &bob, &cy] {
            let leader = client.room.ranked_roster()[0];
            assert_eq!(leader.name, "Bob");
            assert_eq!(leader.score, 100);
            assert_eq!(client.room.chat().last().unwrap().kind, ChatKind::SystemNotice);
        }
    }

    /// A new round wipes the surface before later strokes are painted
    #[tokio::test]
    async fn new_round_clears_before_later_strokes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut bob, mut peer) = TestClient::join(&listener, "Bob", "ABCD").await;
        read_intent(&mut peer).await;

        let hint = Notification::Hint {
            text: "_ _ _".to_string(),
        };
        start_round(&mut peer, "bob-id", SeatRole::Player, hint).await;

        let early = shared::StrokeSegment::new((10.0, 10.0), (80.0, 10.0), "#ff0000", 4.0);
        let late = shared::StrokeSegment::new((10.0, 300.0), (80.0, 300.0), "#0000ff", 4.0);
        push(&mut peer, &Notification::Draw { segment: early }).await;
        push(&mut peer, &Notification::NewRound).await;
        push(&mut peer, &Notification::Draw { segment: late }).await;

        bob.pump(9).await;

        assert_eq!(bob.room.phase(), Phase::Ended);
        assert_eq!(bob.room.surface().pixel(40, 10), Some(shared::Rgb::WHITE));
        assert_eq!(
            bob.room.surface().pixel(40, 300),
            Some(shared::Rgb { r: 0, g: 0, b: 255 })
        );
    }

    /// Game over freezes the standings and drops later round notifications
    #[tokio::test]
    async fn game_over_is_terminal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut cy, mut peer) = TestClient::join(&listener, "Cy", "ABCD").await;
        read_intent(&mut peer).await;

        push(&mut peer, &Notification::GameOver { standings: roster(100) }).await;
        push(
            &mut peer,
            &Notification::Drawer {
                identity: "ann-id".to_string(),
            },
        )
        .await;
        cy.pump(2).await;

        assert_eq!(cy.room.phase(), Phase::GameOver);
        assert_eq!(cy.room.winner().map(|p| p.name.as_str()), Some("Bob"));
        assert_eq!(cy.room.standings().len(), 3);
    }
}

/// CHANNEL ROBUSTNESS TESTS
mod channel_tests {
    use super::*;

    /// A garbage frame is dropped and the stream keeps flowing
    #[tokio::test]
    async fn malformed_frame_is_skipped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut ann, mut peer) = TestClient::join(&listener, "Ann", "ABCD").await;
        read_intent(&mut peer).await;

        let garbage = [0xffu8; 7];
        peer.write_all(&(garbage.len() as u32).to_be_bytes())
            .await
            .unwrap();
        peer.write_all(&garbage).await.unwrap();

        // A segment with a broken color fails validation at the boundary.
        let mut bad = shared::StrokeSegment::new((0.0, 0.0), (5.0, 5.0), "#000000", 4.0);
        bad.color = "blue".to_string();
        push(&mut peer, &Notification::Draw { segment: bad }).await;

        push(
            &mut peer,
            &Notification::Time {
                remaining_seconds: 42,
            },
        )
        .await;

        ann.pump(1).await;
        assert_eq!(ann.room.remaining_seconds(), 42);
        assert!(ann.room.surface().is_blank());
        assert!(ann.channel.is_open());
    }

    /// Coordinator hang-up closes the session and blocks further input
    #[tokio::test]
    async fn coordinator_disconnect_closes_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut bob, mut peer) = TestClient::join(&listener, "Bob", "ABCD").await;
        read_intent(&mut peer).await;

        start_round(
            &mut peer,
            "bob-id",
            SeatRole::Player,
            Notification::Hint {
                text: "_ _".to_string(),
            },
        )
        .await;
        bob.pump(6).await;
        assert!(bob.room.can_guess());

        drop(peer);
        let event = timeout(WAIT, bob.events.recv()).await.unwrap().unwrap();
        assert!(matches!(event, ChannelEvent::Closed { .. }));
        bob.dispatch(Event::from(event));

        assert!(!bob.room.session().is_open());
        assert!(!bob.room.can_guess());
        bob.input(UserInput::TypeChar('x'));
        assert_eq!(bob.room.guess_text(), "");
    }
}

/// SESSION TESTS
mod session_tests {
    use super::*;

    #[test]
    fn blank_join_is_rejected_before_sending() {
        tokio_test::assert_err!(Session::join("   ", "ABCD", None));
        tokio_test::assert_err!(Session::join("Ann", "", None));
        let (session, _) = tokio_test::assert_ok!(Session::join(" Ann ", " ABCD ", None));
        assert_eq!(session.display_name, "Ann");
        assert_eq!(session.room_code, "ABCD");
    }

    #[test]
    fn brush_size_is_clamped() {
        let (session, _) = Session::join("Ann", "ABCD", Some("ann-id".to_string())).unwrap();
        let mut room = RoomClient::new(session);
        room.handle(
            Event::Input(UserInput::SetBrushSize(40.0)),
            Instant::now(),
        );
        assert_approx_eq::assert_approx_eq!(room.brush().size, shared::MAX_BRUSH_SIZE);
    }
}
