use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

use crate::conversation::{Conversation, Role};

/// Scrollable transcript of the conversation.
///
/// Follows the bottom while the user has not scrolled away, so new turns stay
/// in view.
pub struct TranscriptView {
    pub scroll_position: usize,
    pub max_scroll: usize,
    pub follow: bool,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            scroll_position: 0,
            max_scroll: 0,
            follow: true,
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_position = self.scroll_position.saturating_sub(lines);
        self.follow = self.scroll_position >= self.max_scroll;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_position = (self.scroll_position + lines).min(self.max_scroll);
        self.follow = self.scroll_position >= self.max_scroll;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_position = self.max_scroll;
        self.follow = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_position = 0;
        self.follow = self.max_scroll == 0;
    }

    pub fn handle_scroll_event(&mut self, direction: ScrollDirection, amount: usize) {
        match direction {
            ScrollDirection::Up => self.scroll_up(amount),
            ScrollDirection::Down => self.scroll_down(amount),
        }
    }

    fn update_max_scroll(&mut self, total_lines: usize, visible_lines: usize) {
        self.max_scroll = total_lines.saturating_sub(visible_lines);
        if self.follow || self.scroll_position > self.max_scroll {
            self.scroll_position = self.max_scroll;
        }
    }

    pub fn render(
        &mut self,
        f: &mut ratatui::Frame,
        area: Rect,
        conversation: &Conversation,
        assistant_name: &str,
        sending: bool,
    ) {
        // Leave a column for the scrollbar
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let lines = transcript_lines(conversation, assistant_name, sending);

        let inner_width = chunks[0].width.saturating_sub(2).max(1);
        let inner_height = chunks[0].height.saturating_sub(2) as usize;
        let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
        // Counted before the block is attached, so borders are not included.
        let total_lines = paragraph.line_count(inner_width);
        self.update_max_scroll(total_lines, inner_height);

        let paragraph = paragraph
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Conversation")
                    .title_style(Style::default().fg(Color::Blue)),
            )
            .scroll((self.scroll_position.min(u16::MAX as usize) as u16, 0));

        f.render_widget(paragraph, chunks[0]);

        if self.max_scroll > 0 {
            let mut scrollbar_state = ScrollbarState::new(self.max_scroll).position(self.scroll_position);

            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            f.render_stateful_widget(scrollbar, chunks[1], &mut scrollbar_state);
        }
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Header line (icon + label) per turn, then its content verbatim, then a
/// blank separator. A trailing indicator is added while a request is pending.
pub fn transcript_lines<'a>(
    conversation: &'a Conversation,
    assistant_name: &'a str,
    sending: bool,
) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for turn in conversation {
        let color = match turn.role {
            Role::User => Color::Cyan,
            Role::Assistant => Color::Green,
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", turn.role.icon())),
            Span::styled(
                turn.role.label(assistant_name),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]));
        // `str::lines` drops a lone trailing newline; content is otherwise untouched.
        if turn.content.is_empty() {
            lines.push(Line::raw(""));
        }
        for content_line in turn.content.lines() {
            lines.push(Line::raw(content_line));
        }
        lines.push(Line::raw(""));
    }
    if sending {
        lines.push(
            Line::styled(
                "⏳ Waiting for reply...",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center),
        );
    }
    lines
}
