//! Request dispatcher: the Idle → Sending → Idle cycle behind every submit.
//!
//! At most one request is outstanding. The call runs on a spawned task and
//! reports back over a channel, so the owning event loop never blocks; the
//! loop calls [`ChatSession::poll_settled`] (or awaits
//! [`ChatSession::wait_settled`]) to fold the reply into the conversation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::completions::{ClientError, CompletionResponse, CompletionsClient};
use crate::constants::FALLBACK_REPLY;
use crate::conversation::{Conversation, Turn};
use crate::credential::Credential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Sending,
}

/// Content of the assistant turn that closes a request cycle.
pub fn reply_text(outcome: Result<CompletionResponse, ClientError>) -> String {
    match outcome {
        Ok(response) => match response.first_content() {
            Some(content) => content.to_string(),
            None => {
                warn!("Completion carried no usable choice, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        },
        Err(e) => {
            warn!(error = %e, "Chat completion failed");
            if let Some(message) = e.server_message() {
                return message.to_string();
            }
            let description = e.to_string();
            if description.is_empty() {
                FALLBACK_REPLY.to_string()
            } else {
                description
            }
        }
    }
}

pub struct ChatSession {
    client: Arc<CompletionsClient>,
    credential: Credential,
    conversation: Conversation,
    state: DispatchState,
    settled_tx: mpsc::UnboundedSender<String>,
    settled_rx: mpsc::UnboundedReceiver<String>,
    pending: Option<JoinHandle<()>>,
}

impl ChatSession {
    pub fn new(client: Arc<CompletionsClient>, credential: Credential) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            client,
            credential,
            conversation: Conversation::new(),
            state: DispatchState::Idle,
            settled_tx,
            settled_rx,
            pending: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == DispatchState::Sending
    }

    pub fn can_submit(&self, input: &str) -> bool {
        !input.trim().is_empty() && !self.is_sending()
    }

    /// Starts a request cycle for `input`. Returns `false` (and changes
    /// nothing) when the input is blank or a request is already in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, input: &str) -> bool {
        if !self.can_submit(input) {
            debug!(sending = self.is_sending(), "Submit rejected");
            return false;
        }

        // The history already ends with the new user turn, so it is sent once.
        self.conversation.push(Turn::user(input));
        self.state = DispatchState::Sending;
        info!(turns = self.conversation.len(), "Dispatching chat completion request");

        let client = Arc::clone(&self.client);
        let credential = self.credential.clone();
        let messages = self.conversation.turns().to_vec();
        let tx = self.settled_tx.clone();
        self.pending = Some(tokio::spawn(async move {
            let reply = reply_text(client.complete(&credential, &messages).await);
            // The receiver lives as long as the session; a send error means it is gone.
            if tx.send(reply).is_err() {
                debug!("Session dropped before the request settled");
            }
        }));
        true
    }

    /// Folds a finished request into the conversation, if there is one.
    /// Returns whether the session went back to idle.
    pub fn poll_settled(&mut self) -> bool {
        if let Ok(reply) = self.settled_rx.try_recv() {
            self.pending = None;
            self.settle(reply);
            return true;
        }
        if !self.pending.as_ref().is_some_and(JoinHandle::is_finished) {
            return false;
        }
        self.pending = None;
        // The task may have sent between the two checks.
        let reply = self.settled_rx.try_recv().unwrap_or_else(|_| {
            error!("Request task ended without a reply");
            FALLBACK_REPLY.to_string()
        });
        self.settle(reply);
        true
    }

    /// Waits for the outstanding request, if any, and folds it in.
    pub async fn wait_settled(&mut self) {
        if !self.is_sending() {
            return;
        }
        let finished = match self.pending.take() {
            Some(handle) => handle.await,
            None => Ok(()),
        };
        let reply = match finished {
            // The task sends before it returns.
            Ok(()) => self.settled_rx.try_recv().ok(),
            Err(e) => {
                error!(error = %e, "Request task failed");
                None
            }
        };
        self.settle(reply.unwrap_or_else(|| FALLBACK_REPLY.to_string()));
    }

    /// Submit and wait. Returns the assistant turn, or `None` when the
    /// submit was rejected.
    pub async fn send(&mut self, input: &str) -> Option<&Turn> {
        if !self.submit(input) {
            return None;
        }
        self.wait_settled().await;
        self.conversation.last()
    }

    fn settle(&mut self, reply: String) {
        self.conversation.push(Turn::assistant(reply));
        self.state = DispatchState::Idle;
        info!(turns = self.conversation.len(), "Request settled");
    }
}
