//! macroquad drawing of the join form, the room and the post-game summary

use crate::app::{App, JoinField, JoinForm, LinkStatus, Screen};
use crate::canvas::Surface;
use crate::game::Phase;
use crate::layout::{Layout, Rect, BRUSH_SIZES, PALETTE};
use crate::room::RoomClient;
use macroquad::prelude::*;
use shared::{ChatKind, Rgb, Role};
use std::time::Instant;

const BACKGROUND: Color = Color::new(0.10, 0.10, 0.10, 1.0);
const PANEL: Color = Color::new(0.16, 0.16, 0.18, 1.0);
const ACCENT: Color = Color::new(0.0, 0.67, 1.0, 1.0);
const MUTED: Color = Color::new(0.55, 0.55, 0.55, 1.0);
const CHAT_LINES: usize = 20;

pub struct Renderer {
    canvas_texture: Texture2D,
}

impl Renderer {
    /// Must be called once the window exists.
    pub fn new(surface: &Surface) -> Self {
        let canvas_texture = Texture2D::from_rgba8(
            surface.width() as u16,
            surface.height() as u16,
            surface.rgba(),
        );
        canvas_texture.set_filter(FilterMode::Nearest);
        Self { canvas_texture }
    }

    pub fn render(&mut self, app: &mut App, now: Instant) {
        clear_background(BACKGROUND);

        let layout = *app.layout();
        let status = app.link_status();
        match app.screen_mut() {
            Screen::Join(form) => self.draw_join_form(form, status),
            Screen::Room(room) => {
                self.upload_surface(room.surface_mut());
                self.draw_room(room, &layout, now);
                if room.phase() == Phase::GameOver {
                    self.draw_summary(room);
                }
            }
        }
    }

    /// Re-uploads the raster only when it changed since the last frame.
    fn upload_surface(&mut self, surface: &mut Surface) {
        if !surface.take_dirty() {
            return;
        }
        let image = Image {
            bytes: surface.rgba().to_vec(),
            width: surface.width() as u16,
            height: surface.height() as u16,
        };
        self.canvas_texture.update(&image);
    }

    fn draw_join_form(&self, form: &JoinForm, status: LinkStatus) {
        let x = screen_width() / 2.0 - 200.0;
        let y = screen_height() / 2.0 - 140.0;

        draw_rectangle(x, y, 400.0, 280.0, PANEL);
        draw_text("Draw n Guess", x + 20.0, y + 45.0, 40.0, WHITE);

        self.draw_field(
            "Name",
            &form.name,
            x + 20.0,
            y + 80.0,
            form.focus == JoinField::Name,
        );
        self.draw_field(
            "Room",
            &form.room,
            x + 20.0,
            y + 145.0,
            form.focus == JoinField::Room,
        );

        if let Some(error) = &form.error {
            draw_text(error, x + 20.0, y + 225.0, 18.0, RED);
        }

        let (label, color) = match status {
            LinkStatus::Online => ("online", GREEN),
            LinkStatus::Connecting => ("connecting...", YELLOW),
            LinkStatus::Offline => ("offline", RED),
        };
        draw_rectangle(x + 20.0, y + 250.0, 8.0, 8.0, color);
        draw_text(label, x + 34.0, y + 258.0, 16.0, MUTED);
        draw_text("Tab: switch field   Enter: join", x + 170.0, y + 258.0, 16.0, MUTED);
    }

    fn draw_field(&self, label: &str, value: &str, x: f32, y: f32, focused: bool) {
        draw_text(label, x, y + 14.0, 18.0, MUTED);
        let border = if focused { ACCENT } else { MUTED };
        draw_rectangle(x, y + 20.0, 360.0, 32.0, BACKGROUND);
        draw_rectangle_lines(x, y + 20.0, 360.0, 32.0, 2.0, border);
        let text = if focused {
            format!("{}_", value)
        } else {
            value.to_string()
        };
        draw_text(&text, x + 8.0, y + 42.0, 22.0, WHITE);
    }

    fn draw_room(&self, room: &RoomClient, layout: &Layout, now: Instant) {
        self.draw_sidebar(room, layout.sidebar);
        if room.can_draw() {
            self.draw_toolbar(room, layout);
        }
        self.draw_canvas(layout.canvas);
        self.draw_chat(room, layout.chat, now);
        if room.role() != Role::Drawer {
            self.draw_guess_box(room, layout.guess_box);
        }

        if let crate::session::ChannelState::Closed { reason } = &room.session().channel_state {
            let banner = format!("Disconnected: {}. Press Enter to return.", reason);
            draw_rectangle(layout.canvas.x, layout.canvas.y, layout.canvas.w, 40.0, RED);
            draw_text(&banner, layout.canvas.x + 12.0, layout.canvas.y + 27.0, 22.0, WHITE);
        }
    }

    fn draw_sidebar(&self, room: &RoomClient, area: Rect) {
        draw_rectangle(area.x, area.y, area.w, area.h, PANEL);

        let session = room.session();
        draw_text(
            &format!("Room {}", session.room_code),
            area.x + 12.0,
            area.y + 26.0,
            22.0,
            MUTED,
        );
        draw_text(
            &format!("Time: {}s", room.remaining_seconds()),
            area.x + 12.0,
            area.y + 56.0,
            28.0,
            WHITE,
        );

        let headline = match (room.role(), room.word_or_hint()) {
            (Role::Drawer, Some(word)) => format!("Draw: {}", word),
            (_, Some(hint)) => hint.to_string(),
            (_, None) => match room.phase() {
                Phase::Lobby => "Waiting for players...".to_string(),
                _ => "Next round soon...".to_string(),
            },
        };
        draw_text(&headline, area.x + 12.0, area.y + 88.0, 24.0, ACCENT);

        let drawer = room.game().round.drawer.as_deref();
        let local = session.local_identity.as_deref();
        for (i, player) in room.ranked_roster().iter().enumerate() {
            let y = area.y + 120.0 + i as f32 * 44.0;
            let is_drawer = Some(player.id.as_str()) == drawer;
            if is_drawer {
                draw_rectangle(area.x + 4.0, y - 4.0, area.w - 8.0, 40.0, DARKBLUE);
            }

            let name_color = if Some(player.id.as_str()) == local {
                GREEN
            } else {
                WHITE
            };
            draw_text(&player.name, area.x + 12.0, y + 14.0, 20.0, name_color);
            draw_text(
                &format!("{} pts", player.score),
                area.x + 12.0,
                y + 32.0,
                16.0,
                MUTED,
            );
            if is_drawer {
                draw_text("DRAWING", area.x + area.w - 80.0, y + 14.0, 16.0, YELLOW);
            }
        }
    }

    fn draw_toolbar(&self, room: &RoomClient, layout: &Layout) {
        let bar = layout.toolbar;
        draw_rectangle(bar.x, bar.y, bar.w, bar.h, PANEL);

        let brush = room.brush();
        for (i, hex) in PALETTE.iter().enumerate() {
            let rect = layout.swatch_rect(i);
            draw_rectangle(rect.x, rect.y, rect.w, rect.h, to_color(hex));
            let outline = if brush.color == *hex { ACCENT } else { MUTED };
            draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, outline);
        }

        for (i, size) in BRUSH_SIZES.iter().enumerate() {
            let rect = layout.size_rect(i);
            let selected = (brush.size - size).abs() < f32::EPSILON;
            draw_rectangle_lines(
                rect.x,
                rect.y,
                rect.w,
                rect.h,
                2.0,
                if selected { ACCENT } else { MUTED },
            );
            draw_circle(
                rect.x + rect.w / 2.0,
                rect.y + rect.h / 2.0,
                size / 2.0,
                WHITE,
            );
        }
    }

    fn draw_canvas(&self, area: Rect) {
        draw_texture(&self.canvas_texture, area.x, area.y, WHITE);
        draw_rectangle_lines(area.x, area.y, area.w, area.h, 2.0, MUTED);
    }

    fn draw_chat(&self, room: &RoomClient, area: Rect, now: Instant) {
        draw_rectangle(area.x, area.y, area.w, area.h, PANEL);
        draw_text("Chat", area.x + 10.0, area.y + 24.0, 22.0, WHITE);

        for (i, entry) in room.chat_tail(CHAT_LINES).iter().enumerate() {
            let y = area.y + 50.0 + i as f32 * 22.0;
            let line = match entry.kind {
                ChatKind::Chat => format!("{}: {}", entry.author, entry.text),
                ChatKind::SystemNotice => entry.text.clone(),
            };
            let color = match entry.kind {
                ChatKind::Chat => WHITE,
                ChatKind::SystemNotice => YELLOW,
            };
            draw_text(&line, area.x + 10.0, y, 16.0, color);
        }

        let typing = room.typing_authors(now);
        if !typing.is_empty() {
            let label = format!("{} typing...", typing.join(", "));
            draw_text(&label, area.x + 10.0, area.y + area.h - 10.0, 16.0, MUTED);
        }
    }

    fn draw_guess_box(&self, room: &RoomClient, area: Rect) {
        let enabled = room.can_guess();
        draw_rectangle(area.x, area.y, area.w, area.h, BACKGROUND);
        draw_rectangle_lines(
            area.x,
            area.y,
            area.w,
            area.h,
            2.0,
            if enabled { ACCENT } else { MUTED },
        );

        let text = if enabled {
            format!("{}_", room.guess_text())
        } else if room.role() == Role::Spectator {
            "Spectating".to_string()
        } else {
            "Guessing closed".to_string()
        };
        let color = if enabled { WHITE } else { MUTED };
        draw_text(&text, area.x + 8.0, area.y + 22.0, 20.0, color);
    }

    fn draw_summary(&self, room: &RoomClient) {
        let x = screen_width() / 2.0 - 220.0;
        let y = screen_height() / 2.0 - 200.0;
        draw_rectangle(x, y, 440.0, 400.0, Color::new(0.0, 0.0, 0.0, 0.9));
        draw_text("Game over", x + 20.0, y + 45.0, 40.0, WHITE);

        if let Some(winner) = room.winner() {
            draw_text(
                &format!("Winner: {}", winner.name),
                x + 20.0,
                y + 85.0,
                28.0,
                YELLOW,
            );
        }

        for (i, player) in room.standings().iter().take(10).enumerate() {
            let line = format!("{}. {}  {} pts", i + 1, player.name, player.score);
            draw_text(&line, x + 20.0, y + 125.0 + i as f32 * 24.0, 20.0, WHITE);
        }

        draw_text("Press R to play again", x + 20.0, y + 385.0, 20.0, ACCENT);
    }
}

fn to_color(hex: &str) -> Color {
    let rgb = hex.parse::<Rgb>().unwrap_or(Rgb::BLACK);
    Color::from_rgba(rgb.r, rgb.g, rgb.b, 255)
}
