use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

pub fn draw_ui(f: &mut Frame, app: &mut App) {
    if app.gate_open() {
        render_gate(f, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(3),    // Conversation
            Constraint::Length(3), // Input
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(Span::styled(
        app.config.assistant_name.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let sending = app.is_sending();
    if let Some(session) = app.session.as_ref() {
        app.transcript.render(
            f,
            chunks[1],
            session.conversation(),
            &app.config.assistant_name,
            sending,
        );
    }

    render_input(f, app, chunks[2]);
}

fn render_input(f: &mut Frame, app: &mut App, area: Rect) {
    let send_style = if app.can_send() {
        Style::default().fg(Color::Black).bg(Color::Blue)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title = format!("Message {}", app.config.assistant_name);
    app.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_bottom(Line::from(Span::styled(" ⏎ Send ", send_style)).right_aligned()),
    );
    f.render_widget(&app.input, area);
}

fn render_gate(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 9, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Enter API Key")
        .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Prompt
            Constraint::Length(3), // Key field
            Constraint::Min(1),    // Actions
        ])
        .split(inner);

    let prompt = Paragraph::new("Please enter your OpenRouter API key to start the conversation.")
        .wrap(Wrap { trim: true });
    f.render_widget(prompt, chunks[0]);

    f.render_widget(&app.key_input, chunks[1]);

    let start_style = if app.key_input.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
    };
    let actions = Paragraph::new(Line::from(vec![
        Span::styled("⏎ Start", start_style),
        Span::raw("   "),
        Span::styled("Esc Quit", Style::default().fg(Color::DarkGray)),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(actions, chunks[2]);
}

/// Rect of `percent_x` width and `height` rows, centered in `r`.
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
