//! Frame rendering: title bar, login form, profile pane and status bar.

use std::rc::Rc;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use authref_core::SessionView;

use crate::app::{wrap_text, App, Focus};

use super::styles;

/// Width of the text inside the email/password brackets
const FIELD_WIDTH: usize = 32;

fn layout(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(7), // Login form
            Constraint::Min(5),    // Profile
            Constraint::Length(2), // Status bar
        ])
        .split(area)
}

fn profile_block() -> Block<'static> {
    Block::default()
        .title(" Profile ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(false))
}

/// Area the profile text occupies inside its border, for a frame of `area`
pub fn profile_inner_area(area: Rect) -> Rect {
    profile_block().inner(layout(area)[2])
}

pub fn render(frame: &mut Frame, app: &App) {
    let view = app.session.view();
    let chunks = layout(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_form(frame, app, &view, chunks[1]);
    render_profile(frame, app, &view, chunks[2]);
    render_status_bar(frame, app, chunks[3]);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Auth Reference App";
    let backend = format!("{} ", app.api.base_url());

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + backend.len()),
        )),
        Span::styled(backend, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn field_line<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::field_style()
    };
    // Keep the tail visible once the value outgrows the box
    let skip = value.chars().count().saturating_sub(FIELD_WIDTH);
    let shown: String = value.chars().skip(skip).collect();
    let cursor = if focused { "▌" } else { " " };

    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_spans(label: &str, focused: bool, enabled: bool) -> Vec<Span<'static>> {
    let style = if !enabled {
        styles::muted_style()
    } else if focused {
        styles::selected_style()
    } else {
        styles::field_style()
    };
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    vec![Span::raw("["), Span::styled(text, style), Span::raw("]")]
}

fn render_form(frame: &mut Frame, app: &App, view: &SessionView, area: Rect) {
    let mut buttons = vec![Span::raw("  ")];
    buttons.extend(button_spans("Login", app.focus == Focus::LoginButton, true));
    buttons.push(Span::raw("  "));
    buttons.extend(button_spans(
        "Get Profile",
        app.focus == Focus::ProfileButton,
        view.can_fetch_profile,
    ));
    if !view.can_fetch_profile {
        buttons.push(Span::styled("  (log in first)", styles::muted_style()));
    }

    let lines = vec![
        field_line("Email:    ", &view.email, app.focus == Focus::Email),
        field_line("Password: ", &view.masked_password, app.focus == Focus::Password),
        Line::from(""),
        Line::from(buttons),
    ];

    let block = Block::default()
        .title(" Login ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_profile(frame: &mut Frame, app: &App, view: &SessionView, area: Rect) {
    let style = if view.profile_text == authref_core::session::NO_PROFILE_PLACEHOLDER {
        styles::muted_style()
    } else {
        styles::field_style()
    };

    let mut block = profile_block();
    let inner = block.inner(area);
    let lines = wrap_text(&view.profile_text, inner.width as usize);

    let max_scroll = lines.len().saturating_sub(inner.height as usize);
    let scroll = (app.profile_scroll as usize).min(max_scroll);
    let hidden_above = scroll > 0;
    let hidden_below = scroll < max_scroll;

    if hidden_above || hidden_below {
        let mut marker = vec![Span::raw(" ")];
        if hidden_above {
            marker.push(Span::styled("▲ more [PgUp] ", styles::key_style()));
        }
        if hidden_below {
            marker.push(Span::styled("▼ more [PgDn] ", styles::key_style()));
        }
        block = block.title_bottom(Line::from(marker).right_aligned());
    }

    let text: Vec<Line> = lines.into_iter().map(Line::from).collect();
    let paragraph = Paragraph::new(text)
        .style(style)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[Tab] next | [Enter] select | [PgUp/PgDn] scroll | [Esc] quit";

    let (left_text, left_style) = match app.status_message {
        Some(ref msg) if msg.starts_with("Error") => (format!(" {} ", msg), styles::error_style()),
        Some(ref msg) if app.in_flight == 0 => (format!(" {} ", msg), styles::success_style()),
        Some(ref msg) => (format!(" {} ", msg), styles::muted_style()),
        None => (" Not logged in ".to_string(), styles::muted_style()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::key_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use authref_core::Config;
    use ratatui::{backend::TestBackend, Terminal};
    use crate::ui::input::handle_input;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use serde_json::{json, Value};

    const WIDTH: u16 = 80;
    const HEIGHT: u16 = 30;

    fn draw(app: &App) -> String {
        let backend = TestBackend::new(WIDTH, HEIGHT);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_render_logged_out() {
        let app = App::new(Config::default()).unwrap();
        let screen = draw(&app);
        assert!(screen.contains("Auth Reference App"));
        assert!(screen.contains("http://localhost:8000"));
        assert!(screen.contains("No profile loaded"));
        assert!(screen.contains("(log in first)"));
        assert!(screen.contains("Not logged in"));
    }

    #[test]
    fn test_render_masks_password() {
        let config = Config {
            email: Some("a@b.com".to_string()),
            password: Some("hunter22".to_string()),
            ..Config::default()
        };
        let app = App::new(config).unwrap();
        let screen = draw(&app);
        assert!(screen.contains("a@b.com"));
        assert!(screen.contains("********"));
        assert!(!screen.contains("hunter22"));
    }

    #[test]
    fn test_render_profile_verbatim() {
        let mut app = App::new(Config::default()).unwrap();
        app.session.apply_login(json!({"access_token": "abc123"}));
        app.session.apply_profile(json!({"id": 1, "email": "a@b.com"}));
        let screen = draw(&app);
        assert!(screen.contains("\"id\": 1"));
        assert!(screen.contains("\"email\": \"a@b.com\""));
        assert!(!screen.contains("No profile loaded"));
        assert!(!screen.contains("(log in first)"));
    }

    /// A profile far taller than the pane, with a long value at the end
    fn long_profile() -> Value {
        let mut profile = serde_json::Map::new();
        for i in 0..30 {
            profile.insert(format!("field_{:02}", i), json!(i));
        }
        profile.insert("zz_bio".to_string(), json!(format!("{}TAILMARK", "x".repeat(120))));
        Value::Object(profile)
    }

    fn app_with_long_profile() -> App {
        let mut app = App::new(Config::default()).unwrap();
        app.session.apply_login(json!({"access_token": "abc123"}));
        app.session.apply_profile(long_profile());
        let inner = profile_inner_area(Rect::new(0, 0, WIDTH, HEIGHT));
        app.set_profile_viewport(inner.width, inner.height);
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    #[test]
    fn test_long_profile_marks_hidden_lines() {
        let app = app_with_long_profile();
        let screen = draw(&app);
        assert!(screen.contains("field_00"));
        assert!(!screen.contains("TAILMARK"));
        assert!(screen.contains("▼ more [PgDn]"));
        assert!(!screen.contains("▲ more [PgUp]"));
    }

    #[test]
    fn test_end_reaches_last_profile_line() {
        let mut app = app_with_long_profile();
        press(&mut app, KeyCode::End);
        let screen = draw(&app);
        assert!(screen.contains("field_29"));
        assert!(screen.contains("TAILMARK"));
        assert!(screen.contains("▲ more [PgUp]"));
        assert!(!screen.contains("▼ more [PgDn]"));

        press(&mut app, KeyCode::Home);
        let screen = draw(&app);
        assert!(screen.contains("field_00"));
        assert!(!screen.contains("TAILMARK"));
    }

    #[test]
    fn test_page_down_walks_to_end() {
        let mut app = app_with_long_profile();
        for _ in 0..10 {
            press(&mut app, KeyCode::PageDown);
        }
        assert_eq!(app.profile_scroll, app.max_profile_scroll());
        assert!(draw(&app).contains("TAILMARK"));
    }
}
