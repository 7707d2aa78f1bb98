use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::{Block, Borders};
use tracing::{debug, info};
use tui_textarea::TextArea;

use crate::completions::CompletionsClient;
use crate::config::Config;
use crate::credential::CredentialGate;
use crate::dispatcher::ChatSession;
use crate::ui_components::{ScrollDirection, TranscriptView};

const SCROLL_STEP: usize = 5;

pub struct App {
    pub config: Config,
    pub gate: CredentialGate,
    pub key_input: TextArea<'static>,
    pub session: Option<ChatSession>,
    pub input: TextArea<'static>,
    pub transcript: TranscriptView,
    pub should_quit: bool,
    client: Arc<CompletionsClient>,
}

fn key_textarea() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_mask_char('•');
    textarea.set_placeholder_text("API Key");
    textarea.set_block(Block::default().borders(Borders::ALL).title("API Key"));
    textarea
}

fn message_textarea(assistant_name: &str) -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_placeholder_text(format!("Message {}", assistant_name));
    textarea
}

impl App {
    /// The session exists as soon as a credential does, so a stored key goes
    /// straight to the conversation view.
    pub fn new(config: Config, gate: CredentialGate) -> Self {
        let client = Arc::new(CompletionsClient::new(&config));
        let session = gate
            .credential()
            .cloned()
            .map(|credential| ChatSession::new(Arc::clone(&client), credential));
        let input = message_textarea(&config.assistant_name);

        Self {
            config,
            gate,
            key_input: key_textarea(),
            session,
            input,
            transcript: TranscriptView::new(),
            should_quit: false,
            client,
        }
    }

    pub fn gate_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn is_sending(&self) -> bool {
        self.session.as_ref().is_some_and(ChatSession::is_sending)
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    /// Whether the send affordance is enabled for the current input.
    pub fn can_send(&self) -> bool {
        let input = self.input_text();
        self.session.as_ref().is_some_and(|s| s.can_submit(&input))
    }

    /// Called once per loop iteration to fold in a finished request.
    pub fn tick(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.poll_settled();
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                info!("Quit requested");
                self.should_quit = true;
                return Ok(());
            }
            _ => {}
        }

        if self.gate_open() {
            return self.handle_gate_key(key);
        }

        match (key.code, key.modifiers) {
            (KeyCode::PageUp, _) => self.scroll(ScrollDirection::Up, SCROLL_STEP),
            (KeyCode::PageDown, _) => self.scroll(ScrollDirection::Down, SCROLL_STEP),
            (KeyCode::Up, KeyModifiers::CONTROL) => self.scroll(ScrollDirection::Up, 1),
            (KeyCode::Down, KeyModifiers::CONTROL) => self.scroll(ScrollDirection::Down, 1),
            (KeyCode::Home, KeyModifiers::CONTROL) => self.transcript.scroll_to_top(),
            (KeyCode::End, KeyModifiers::CONTROL) => self.transcript.scroll_to_bottom(),
            (KeyCode::Enter, _) => self.submit_input(),
            _ => {
                // Typing stays possible while a request is in flight.
                self.input.input(key);
            }
        }
        Ok(())
    }

    fn scroll(&mut self, direction: ScrollDirection, lines: usize) {
        self.transcript.handle_scroll_event(direction, lines);
    }

    pub fn handle_paste(&mut self, data: &str) {
        let target = if self.gate_open() {
            &mut self.key_input
        } else {
            &mut self.input
        };
        // Both fields are single line.
        let flattened = data.replace(['\r', '\n'], " ");
        target.insert_str(flattened);
    }

    fn handle_gate_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code != KeyCode::Enter {
            self.key_input.input(key);
            return Ok(());
        }

        let value = self.key_input.lines().join("");
        let accepted = self
            .gate
            .accept(&value)
            .context("Failed to persist the API key")?;
        if !accepted {
            debug!("Start pressed with an empty API key");
            return Ok(());
        }

        if let Some(credential) = self.gate.credential().cloned() {
            self.session = Some(ChatSession::new(Arc::clone(&self.client), credential));
        }
        self.key_input = key_textarea();
        Ok(())
    }

    // Enter fires even when the send hint is disabled; the session re-checks.
    // The field is emptied as soon as the turn is taken, so anything typed
    // while the request is in flight is kept.
    fn submit_input(&mut self) {
        let input = self.input_text();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.submit(&input) {
            self.input = message_textarea(&self.config.assistant_name);
            self.transcript.scroll_to_bottom();
        }
    }
}
