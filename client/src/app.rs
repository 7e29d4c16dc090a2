//! Screen flow: join form, room, post-game summary
//!
//! The app owns the channel handle and the current room core. Every frame it
//! drains the channel into one queue ahead of the frame's local input, feeds the
//! queue through [`RoomClient::handle`] in order, and forwards the resulting
//! intents. Nothing here waits on the network: connecting runs on the tokio
//! runtime and is polled.

use crate::game::Phase;
use crate::input::InputEvent;
use crate::layout::{Layout, ToolbarHit};
use crate::network::{Channel, ChannelConfig, ChannelError, Subscription};
use crate::room::{Event, RoomClient, UserInput};
use crate::session::Session;
use log::{error, info, warn};
use shared::{Intent, Notification};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: String,
    pub channel: ChannelConfig,
    pub default_name: String,
    pub default_room: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinField {
    Name,
    Room,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinForm {
    pub name: String,
    pub room: String,
    pub focus: JoinField,
    pub error: Option<String>,
}

impl JoinForm {
    pub fn new(name: &str, room: &str) -> Self {
        Self {
            name: name.to_string(),
            room: room.to_string(),
            focus: if name.is_empty() {
                JoinField::Name
            } else {
                JoinField::Room
            },
            error: None,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            JoinField::Name => &mut self.name,
            JoinField::Room => &mut self.room,
        }
    }

    pub fn type_char(&mut self, c: char) {
        self.field_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.field_mut().pop();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            JoinField::Name => JoinField::Room,
            JoinField::Room => JoinField::Name,
        };
    }
}

pub enum Screen {
    Join(JoinForm),
    Room(Box<RoomClient>),
}

pub enum Link {
    Connecting(oneshot::Receiver<Result<Channel, ChannelError>>),
    Ready(Channel),
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Online,
    Offline,
}

pub struct App {
    runtime: Runtime,
    config: AppConfig,
    layout: Layout,
    link: Link,
    subscription: Option<Subscription>,
    screen: Screen,
}

impl App {
    /// Builds the app and starts connecting to the coordinator.
    pub fn new(runtime: Runtime, config: AppConfig) -> Self {
        let form = JoinForm::new(&config.default_name, &config.default_room);
        let mut app = Self {
            runtime,
            config,
            layout: Layout::new(),
            link: Link::Down,
            subscription: None,
            screen: Screen::Join(form),
        };
        app.start_connect();
        app
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn link_status(&self) -> LinkStatus {
        match &self.link {
            Link::Connecting(_) => LinkStatus::Connecting,
            Link::Ready(channel) if channel.is_open() => LinkStatus::Online,
            _ => LinkStatus::Offline,
        }
    }

    /// Processes one frame worth of network events and local input.
    pub fn frame(&mut self, inputs: Vec<InputEvent>, now: Instant) {
        self.poll_link();

        if matches!(self.screen, Screen::Join(_)) {
            self.frame_join(inputs);
        } else {
            self.frame_room(inputs, now);
        }
    }

    fn frame_join(&mut self, inputs: Vec<InputEvent>) {
        for input in inputs {
            let Screen::Join(form) = &mut self.screen else {
                return;
            };
            match input {
                InputEvent::Char(c) => form.type_char(c),
                InputEvent::Backspace => form.backspace(),
                InputEvent::Tab => form.toggle_focus(),
                InputEvent::Enter => self.submit_join(),
                _ => {}
            }
        }
    }

    fn submit_join(&mut self) {
        let Screen::Join(form) = &mut self.screen else {
            return;
        };

        let channel = match &self.link {
            Link::Ready(channel) if channel.is_open() => channel,
            Link::Connecting(_) => {
                form.error = Some("Still connecting to the coordinator".to_string());
                return;
            }
            _ => {
                form.error = Some("Connecting to the coordinator, press Enter again".to_string());
                self.start_connect();
                return;
            }
        };

        match Session::join(&form.name, &form.room, channel.identity()) {
            Ok((session, intent)) => {
                // Subscribe before sending so no room notification is missed.
                self.subscription = Some(channel.subscribe());
                channel.send(intent);
                self.screen = Screen::Room(Box::new(RoomClient::new(session)));
            }
            Err(e) => {
                warn!("Join suppressed: {}", e);
                form.error = Some(e.to_string());
            }
        }
    }

    fn frame_room(&mut self, inputs: Vec<InputEvent>, now: Instant) {
        let Screen::Room(room) = &mut self.screen else {
            return;
        };

        let mut queue: Vec<Event> = Vec::new();

        // The identity announced before this room subscribed still has to reach it.
        if room.session().local_identity.is_none() {
            if let Link::Ready(channel) = &self.link {
                if let Some(identity) = channel.identity() {
                    queue.push(Event::Notification(Notification::Connected { identity }));
                }
            }
        }

        if let Some(subscription) = self.subscription.as_mut() {
            queue.extend(subscription.drain().into_iter().map(Event::from));
        }

        let mut restart = false;
        for input in inputs {
            let finished = room.phase() == Phase::GameOver;
            let lost = !room.session().is_open();
            match input {
                InputEvent::Char('r') | InputEvent::Char('R') if finished => restart = true,
                InputEvent::Enter if lost => restart = true,
                other => {
                    if let Some(mapped) = map_room_input(&self.layout, other, room.can_draw()) {
                        queue.push(Event::Input(mapped));
                    }
                }
            }
        }

        let mut outbound = Vec::new();
        for event in queue {
            outbound.extend(room.handle(event, now));
        }
        room.tick(now);

        if let Link::Ready(channel) = &self.link {
            for intent in outbound {
                channel.send(intent);
            }
        }

        if restart {
            self.restart();
        }
    }

    /// Discards all room state and returns to the join form. The channel is kept.
    pub fn restart(&mut self) {
        info!("Leaving room; local state discarded");
        self.subscription = None;

        if let Link::Ready(channel) = &self.link {
            channel.unsubscribe();
            if channel.is_open() {
                channel.send(Intent::Leave);
            } else {
                self.link = Link::Down;
            }
        }

        self.screen = Screen::Join(JoinForm::new(
            &self.config.default_name,
            &self.config.default_room,
        ));
    }

    fn start_connect(&mut self) {
        let (tx, rx) = oneshot::channel();
        let address = self.config.server.clone();
        let config = self.config.channel;
        self.runtime.spawn(async move {
            let _ = tx.send(Channel::connect(&address, config).await);
        });
        self.link = Link::Connecting(rx);
    }

    fn poll_link(&mut self) {
        let Link::Connecting(rx) = &mut self.link else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(channel)) => {
                info!("Connected to {}", self.config.server);
                self.link = Link::Ready(channel);
            }
            Ok(Err(e)) => {
                error!("Failed to connect to {}: {}", self.config.server, e);
                self.link = Link::Down;
                if let Screen::Join(form) = &mut self.screen {
                    form.error = Some(format!("Cannot reach coordinator: {}", e));
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => self.link = Link::Down,
        }
    }

    /// Leaves the room, closes the channel and gives queued writes a moment to flush.
    pub fn shutdown(self) {
        let App { runtime, link, .. } = self;
        if let Link::Ready(channel) = link {
            channel.close();
        }
        runtime.shutdown_timeout(Duration::from_millis(250));
    }
}

/// Maps window-level input to a room input. Toolbar clicks only count for the drawer.
pub fn map_room_input(layout: &Layout, input: InputEvent, can_draw: bool) -> Option<UserInput> {
    match input {
        InputEvent::PointerDown { x, y } => {
            if can_draw {
                match layout.toolbar_hit(x, y) {
                    Some(ToolbarHit::Color(color)) => {
                        return Some(UserInput::SetColor(color.to_string()))
                    }
                    Some(ToolbarHit::Size(size)) => return Some(UserInput::SetBrushSize(size)),
                    None => {}
                }
            }
            if layout.canvas.contains(x, y) {
                let (x, y) = layout.to_surface(x, y);
                Some(UserInput::PointerDown { x, y })
            } else {
                None
            }
        }
        InputEvent::PointerMove { x, y } => {
            if layout.canvas.contains(x, y) {
                let (x, y) = layout.to_surface(x, y);
                Some(UserInput::PointerMove { x, y })
            } else {
                None
            }
        }
        InputEvent::PointerUp => Some(UserInput::PointerUp),
        InputEvent::Char(c) => Some(UserInput::TypeChar(c)),
        InputEvent::Backspace => Some(UserInput::Backspace),
        InputEvent::Enter => Some(UserInput::SubmitGuess),
        InputEvent::Tab => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PALETTE;
    use crate::room::RoomClient;
    use assert_approx_eq::assert_approx_eq;
    use shared::{
        decode_body, encode_frame, frame_body_len, ChatKind, Participant, Role, FRAME_HEADER_LEN,
    };
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};

    fn test_runtime() -> Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn offline_app() -> App {
        App::new(
            test_runtime(),
            AppConfig {
                // Port 9 on localhost is expected to refuse connections.
                server: "127.0.0.1:9".to_string(),
                channel: ChannelConfig::default(),
                default_name: "Ann".to_string(),
                default_room: String::new(),
            },
        )
    }

    /// App joined to a blocking scripted coordinator on localhost.
    fn joined_app() -> (App, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut app = App::new(
            test_runtime(),
            AppConfig {
                server: listener.local_addr().unwrap().to_string(),
                channel: ChannelConfig::default(),
                default_name: "Ann".to_string(),
                default_room: "ABCD".to_string(),
            },
        );
        let (mut peer, _) = listener.accept().unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        run_until(&mut app, |app| app.link_status() == LinkStatus::Online);
        app.frame(vec![InputEvent::Enter], Instant::now());
        assert!(room_of(&app).is_some());
        assert!(matches!(read_intent(&mut peer), Intent::JoinRoom { .. }));
        (app, peer)
    }

    fn run_until(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..200 {
            app.frame(Vec::new(), Instant::now());
            if done(app) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("Condition not reached");
    }

    fn room_of(app: &App) -> Option<&RoomClient> {
        match app.screen() {
            Screen::Room(room) => Some(room.as_ref()),
            Screen::Join(_) => None,
        }
    }

    fn push(peer: &mut TcpStream, notification: &Notification) {
        peer.write_all(&encode_frame(notification).unwrap()).unwrap();
    }

    fn read_intent(peer: &mut TcpStream) -> Intent {
        let mut header = [0u8; FRAME_HEADER_LEN];
        peer.read_exact(&mut header).unwrap();
        let mut body = vec![0u8; frame_body_len(header).unwrap()];
        peer.read_exact(&mut body).unwrap();
        decode_body(&body).unwrap()
    }

    fn chat(text: &str) -> Notification {
        Notification::Message {
            author: "Cy".to_string(),
            text: text.to_string(),
            kind: ChatKind::Chat,
        }
    }

    #[test]
    fn test_restart_from_summary() {
        let (mut app, mut peer) = joined_app();

        push(
            &mut peer,
            &Notification::GameOver {
                standings: vec![Participant::new("ann-id", "Ann", 30, Role::Guesser)],
            },
        );
        run_until(&mut app, |app| {
            room_of(app).map(|room| room.phase()) == Some(Phase::GameOver)
        });

        app.frame(vec![InputEvent::Char('R')], Instant::now());

        match app.screen() {
            Screen::Join(form) => {
                assert_eq!(form.name, "Ann");
                assert_eq!(form.room, "ABCD");
                assert_eq!(form.error, None);
            }
            Screen::Room(_) => panic!("Restart must return to the join form"),
        }
        assert!(app.subscription.is_none());
        assert_eq!(read_intent(&mut peer), Intent::Leave);
        assert_eq!(app.link_status(), LinkStatus::Online);

        // Nothing is subscribed now, so this one is discarded.
        push(&mut peer, &chat("stale"));
        std::thread::sleep(Duration::from_millis(100));
        app.frame(Vec::new(), Instant::now());

        app.frame(vec![InputEvent::Enter], Instant::now());
        assert!(matches!(read_intent(&mut peer), Intent::JoinRoom { .. }));
        push(&mut peer, &chat("fresh"));
        run_until(&mut app, |app| {
            room_of(app).is_some_and(|room| !room.chat().is_empty())
        });

        let room = room_of(&app).unwrap();
        assert_eq!(room.phase(), Phase::Lobby);
        let texts: Vec<&str> = room.chat().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["fresh"]);
        app.shutdown();
    }

    #[test]
    fn test_enter_after_lost_channel_returns_to_form() {
        let (mut app, peer) = joined_app();

        drop(peer);
        run_until(&mut app, |app| {
            room_of(app).is_some_and(|room| !room.session().is_open())
        });

        app.frame(vec![InputEvent::Enter], Instant::now());
        assert!(matches!(app.screen(), Screen::Join(_)));
        assert_eq!(app.link_status(), LinkStatus::Offline);
        app.shutdown();
    }

    #[test]
    fn test_join_form_editing() {
        let mut form = JoinForm::new("", "");
        assert_eq!(form.focus, JoinField::Name);
        for c in "Ann".chars() {
            form.type_char(c);
        }
        form.toggle_focus();
        for c in "ABCDX".chars() {
            form.type_char(c);
        }
        form.backspace();

        assert_eq!(form.name, "Ann");
        assert_eq!(form.room, "ABCD");
    }

    #[test]
    fn test_prefilled_name_focuses_room() {
        let form = JoinForm::new("Ann", "");
        assert_eq!(form.focus, JoinField::Room);
    }

    #[test]
    fn test_join_without_link_stays_on_form() {
        let mut app = offline_app();
        app.frame(vec![InputEvent::Enter], Instant::now());

        match app.screen() {
            Screen::Join(form) => assert!(form.error.is_some()),
            Screen::Room(_) => panic!("Join must not proceed without a channel"),
        }
        app.shutdown();
    }

    #[test]
    fn test_map_canvas_pointer_to_surface() {
        let layout = Layout::new();
        let mapped = map_room_input(
            &layout,
            InputEvent::PointerDown {
                x: layout.canvas.x + 10.0,
                y: layout.canvas.y + 20.0,
            },
            false,
        );
        match mapped {
            Some(UserInput::PointerDown { x, y }) => {
                assert_approx_eq!(x, 10.0);
                assert_approx_eq!(y, 20.0);
            }
            other => panic!("Unexpected mapping {:?}", other),
        }
    }

    #[test]
    fn test_map_ignores_pointer_outside_canvas() {
        let layout = Layout::new();
        let outside = InputEvent::PointerMove {
            x: layout.chat.x + 5.0,
            y: layout.chat.y + 5.0,
        };
        assert_eq!(map_room_input(&layout, outside, true), None);
        assert_eq!(
            map_room_input(&layout, InputEvent::PointerUp, false),
            Some(UserInput::PointerUp)
        );
    }

    #[test]
    fn test_toolbar_only_for_drawer() {
        let layout = Layout::new();
        let swatch = layout.swatch_rect(4);
        let click = InputEvent::PointerDown {
            x: swatch.x + 2.0,
            y: swatch.y + 2.0,
        };

        assert_eq!(
            map_room_input(&layout, click.clone(), true),
            Some(UserInput::SetColor(PALETTE[4].to_string()))
        );
        assert_eq!(map_room_input(&layout, click, false), None);
    }
}
