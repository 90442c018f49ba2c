//! The chat widget controller.
//!
//! A [`ChatWidget`] is mounted once per conversation view and owns all of
//! that view's state: the backend, the credential bootstrapper, the view,
//! and the volatile [`UiState`] (session identifier, stateless history,
//! submission sequence numbers).  Tearing it down discards the volatile
//! state; the credential survives in durable storage.
//!
//! Every call to [`ChatWidget::submit`] runs one submission through
//! `Idle -> UserMessageRendered -> Pending -> {Resolved | Failed}`.
//! Submissions take `&self` and may overlap.  Each carries a sequence
//! number: its reply always lands in its own pending slot, but a reply that
//! is older than one already applied does not overwrite the session
//! identifier.

use std::sync::{Mutex, MutexGuard};

use crate::auth::SessionBootstrapper;
use crate::client::Backend;
use crate::credential::CredentialStore;
use crate::error::{Error, Result};
use crate::observability::{
    WIDGET_FAILURES, WIDGET_IGNORED, WIDGET_STALE_RESPONSES, WIDGET_SUBMISSIONS,
};
use crate::prompt::CredentialPrompt;
use crate::types::{
    ChatParams, ChatReply, ConversationTurn, HealthStatus, SessionId, SessionList,
    StatelessChatParams,
};
use crate::view::ChatView;

/// Greeting shown when a widget is mounted.
pub const DEFAULT_GREETING: &str = "Hi! I'm CareerCompass. Tell me your current situation and goal, and I'll build a practical career plan.";

/// How chat requests carry conversation context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatProtocol {
    /// Every request carries the full history; no authentication.
    Stateless,

    /// Requests carry a backend-issued session id and a bearer credential.
    #[default]
    Session,
}

/// Behavior switches for a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    /// How context travels with each request.
    pub protocol: ChatProtocol,

    /// Whether to show a provisional indicator while awaiting a reply.
    pub pending_indicator: bool,

    /// Bot message shown on mount.
    pub greeting: Option<String>,
}

impl WidgetOptions {
    /// Session protocol, pending indicator on, default greeting.
    pub fn new() -> Self {
        Self {
            protocol: ChatProtocol::Session,
            pending_indicator: true,
            greeting: Some(DEFAULT_GREETING.to_string()),
        }
    }

    /// Sets the protocol.
    pub fn with_protocol(mut self, protocol: ChatProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Enables or disables the pending indicator.
    pub fn with_pending_indicator(mut self, enabled: bool) -> Self {
        self.pending_indicator = enabled;
        self
    }

    /// Sets or clears the greeting.
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a submission is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// Nothing has happened yet.
    Idle,
    /// The user's message is on screen.
    UserMessageRendered,
    /// A request is outstanding.
    Pending,
    /// The reply replaced the indicator.
    Resolved,
    /// An error replaced the indicator.
    Failed,
}

impl SubmissionPhase {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: SubmissionPhase) -> bool {
        use SubmissionPhase::*;
        matches!(
            (self, next),
            (Idle, UserMessageRendered)
                | (UserMessageRendered, Pending)
                | (Pending, Resolved)
                | (Pending, Failed)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionPhase::Resolved | SubmissionPhase::Failed)
    }
}

/// What became of one submission.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Empty or whitespace-only input; nothing rendered or sent.
    Ignored,

    /// The reply was rendered.
    Resolved {
        /// The submission's sequence number.
        sequence: u64,
        /// The backend's reply.
        reply: ChatReply,
        /// False when a newer response had already set the session id.
        applied: bool,
    },

    /// An error message was rendered.
    Failed {
        /// The submission's sequence number.
        sequence: u64,
        /// Why it failed.
        error: Error,
    },
}

impl SubmissionOutcome {
    /// The terminal phase, or `None` for ignored input.
    pub fn phase(&self) -> Option<SubmissionPhase> {
        match self {
            SubmissionOutcome::Ignored => None,
            SubmissionOutcome::Resolved { .. } => Some(SubmissionPhase::Resolved),
            SubmissionOutcome::Failed { .. } => Some(SubmissionPhase::Failed),
        }
    }

    /// The reply text, if resolved.
    pub fn reply(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Resolved { reply, .. } => Some(&reply.reply),
            _ => None,
        }
    }

    /// The error, if failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SubmissionOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Volatile per-view state.
#[derive(Debug, Default)]
pub struct UiState {
    session_id: Option<SessionId>,
    history: Vec<ConversationTurn>,
    next_sequence: u64,
    latest_applied: u64,
    session_start: u64,
}

/// Snapshot of a widget's counters and context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetStats {
    /// Active protocol.
    pub protocol: ChatProtocol,
    /// Whether a credential is held.
    pub authenticated: bool,
    /// Current session, if any.
    pub session_id: Option<SessionId>,
    /// Completed stateless turns.
    pub history_len: usize,
    /// Submissions started (ignored input excluded).
    pub submissions: u64,
}

struct Submission {
    sequence: u64,
    phase: SubmissionPhase,
}

impl Submission {
    fn advance(&mut self, next: SubmissionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal submission transition {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }
}

/// Controller for one conversation view.
pub struct ChatWidget<B, S, P, V>
where
    B: Backend,
    S: CredentialStore,
    P: CredentialPrompt,
    V: ChatView,
{
    backend: B,
    bootstrapper: SessionBootstrapper<S, P>,
    view: Mutex<V>,
    options: WidgetOptions,
    state: Mutex<UiState>,
}

impl<B, S, P, V> ChatWidget<B, S, P, V>
where
    B: Backend,
    S: CredentialStore,
    P: CredentialPrompt,
    V: ChatView,
{
    /// Mounts a widget: restores any stored credential and shows the greeting.
    ///
    /// Unreadable storage is logged and treated as empty.
    pub fn mount(
        backend: B,
        bootstrapper: SessionBootstrapper<S, P>,
        view: V,
        options: WidgetOptions,
    ) -> Self {
        match bootstrapper.restore() {
            Ok(true) => tracing::debug!("restored stored credential"),
            Ok(false) => tracing::debug!("no stored credential"),
            Err(err) => tracing::warn!(error = %err, "could not read credential storage"),
        }
        let widget = Self {
            backend,
            bootstrapper,
            view: Mutex::new(view),
            options,
            state: Mutex::new(UiState::default()),
        };
        if let Some(greeting) = &widget.options.greeting {
            widget.view().show_bot_message(greeting);
        }
        widget
    }

    /// Tears the widget down, discarding the session id and history.
    ///
    /// Returns the view so a caller can inspect what was rendered.
    pub fn teardown(self) -> V {
        let state = self.lock_state();
        tracing::debug!(
            session_id = ?state.session_id,
            submissions = state.next_sequence,
            "widget torn down"
        );
        drop(state);
        self.view
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Submits one user message.
    ///
    /// Never returns an error: failures are rendered and reported through
    /// [`SubmissionOutcome::Failed`].
    pub async fn submit(&self, input: &str) -> SubmissionOutcome {
        let message = input.trim();
        if message.is_empty() {
            WIDGET_IGNORED.click();
            return SubmissionOutcome::Ignored;
        }
        WIDGET_SUBMISSIONS.click();

        let mut submission = Submission {
            sequence: self.next_sequence(),
            phase: SubmissionPhase::Idle,
        };
        let sequence = submission.sequence;

        self.view().show_user_message(message);
        submission.advance(SubmissionPhase::UserMessageRendered);

        if self.options.pending_indicator {
            self.view().show_pending(sequence);
        }
        submission.advance(SubmissionPhase::Pending);

        match self.send(message).await {
            Ok(reply) => {
                let applied = self.apply_reply(sequence, message, &reply);
                if self.options.pending_indicator {
                    self.view().resolve_pending(sequence, &reply.reply);
                } else {
                    self.view().show_bot_message(&reply.reply);
                }
                submission.advance(SubmissionPhase::Resolved);
                SubmissionOutcome::Resolved {
                    sequence,
                    reply,
                    applied,
                }
            }
            Err(error) => {
                WIDGET_FAILURES.click();
                tracing::warn!(sequence, error = %error, "submission failed");
                let text = format!("Error: {error}");
                if self.options.pending_indicator {
                    self.view().fail_pending(sequence, &text);
                } else {
                    self.view().show_error_message(&text);
                }
                submission.advance(SubmissionPhase::Failed);
                SubmissionOutcome::Failed { sequence, error }
            }
        }
    }

    async fn send(&self, message: &str) -> Result<ChatReply> {
        match self.options.protocol {
            ChatProtocol::Session => {
                if self.bootstrapper.credential().is_none() {
                    self.view().interrupt_pending();
                }
                let token = self.bootstrapper.ensure_credential(&self.backend).await?;
                let params = ChatParams::new(message, self.session_id());
                self.backend.chat(&token, &params).await
            }
            ChatProtocol::Stateless => {
                let params = StatelessChatParams {
                    message: message.to_string(),
                    history: self.history(),
                };
                self.backend.chat_stateless(&params).await
            }
        }
    }

    /// Records a successful reply.  Returns false if it was stale.
    fn apply_reply(&self, sequence: u64, message: &str, reply: &ChatReply) -> bool {
        let mut state = self.lock_state();
        if sequence <= state.session_start {
            WIDGET_STALE_RESPONSES.click();
            tracing::debug!(sequence, "response to a session since left; not applied");
            return false;
        }
        if self.options.protocol == ChatProtocol::Stateless {
            state
                .history
                .push(ConversationTurn::new(message, reply.reply.clone()));
        }
        if sequence < state.latest_applied {
            WIDGET_STALE_RESPONSES.click();
            tracing::debug!(
                sequence,
                latest = state.latest_applied,
                "stale response; keeping newer session id"
            );
            return false;
        }
        state.latest_applied = sequence;
        if let Some(session_id) = &reply.session_id {
            if state.session_id.as_ref() != Some(session_id) {
                tracing::info!(session_id = %session_id, "joined session");
            }
            state.session_id = Some(session_id.clone());
        }
        true
    }

    /// Forgets the current session so the next message opens a new one.
    pub fn reset_session(&self) {
        self.switch_session(None);
    }

    /// Continues an existing backend session with the next message.
    ///
    /// The id is not checked here; a session the user does not own fails
    /// the next submission with a not-found error.
    pub fn resume_session(&self, session_id: SessionId) {
        tracing::info!(session_id = %session_id, "resuming session");
        self.switch_session(Some(session_id));
    }

    fn switch_session(&self, session_id: Option<SessionId>) {
        let mut state = self.lock_state();
        state.session_id = session_id;
        state.history.clear();
        // Submissions already in flight belong to the old session.
        state.session_start = state.next_sequence;
    }

    /// Lists the user's sessions, authenticating first if necessary.
    pub async fn list_sessions(&self) -> Result<SessionList> {
        let token = self.bootstrapper.ensure_credential(&self.backend).await?;
        self.backend.list_sessions(&token).await
    }

    /// Checks backend health.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.backend.health().await
    }

    /// The current session identifier.
    pub fn session_id(&self) -> Option<SessionId> {
        self.lock_state().session_id.clone()
    }

    /// Completed turns sent with stateless requests.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.lock_state().history.clone()
    }

    /// The credential held in memory.
    pub fn credential(&self) -> Option<String> {
        self.bootstrapper.credential()
    }

    /// The options this widget was mounted with.
    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current counters and context.
    pub fn stats(&self) -> WidgetStats {
        let state = self.lock_state();
        WidgetStats {
            protocol: self.options.protocol,
            authenticated: self.bootstrapper.credential().is_some(),
            session_id: state.session_id.clone(),
            history_len: state.history.len(),
            submissions: state.next_sequence,
        }
    }

    /// Runs `f` against the view.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        f(&mut self.view())
    }

    fn next_sequence(&self) -> u64 {
        let mut state = self.lock_state();
        state.next_sequence += 1;
        state.next_sequence
    }

    fn view(&self) -> MutexGuard<'_, V> {
        self.view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_state(&self) -> MutexGuard<'_, UiState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::chat::TerminalView;
    use crate::credential::MemoryCredentialStore;
    use crate::prompt::FormPrompt;
    use crate::types::{
        AuthResponse, LoginParams, RegisterParams, SessionSummary, StatelessChatParams,
    };
    use crate::view::{MessageList, MessageRole};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Login,
        Register,
        Chat {
            token: String,
            params: ChatParams,
        },
        Stateless(StatelessChatParams),
    }

    /// Scripted backend; replies are consumed in order.
    #[derive(Default)]
    struct FakeBackend {
        login_ok: bool,
        register_ok: bool,
        replies: StdMutex<Vec<Result<ChatReply>>>,
        calls: StdMutex<Vec<Call>>,
    }

    impl FakeBackend {
        fn replying(replies: Vec<Result<ChatReply>>) -> Self {
            Self {
                replies: StdMutex::new(replies),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn next_reply(&self) -> Result<ChatReply> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok(ChatReply::new("default reply", None))
            } else {
                replies.remove(0)
            }
        }
    }

    #[async_trait::async_trait]
    impl Backend for FakeBackend {
        async fn login(&self, _: &LoginParams) -> Result<AuthResponse> {
            self.calls.lock().unwrap().push(Call::Login);
            if self.login_ok {
                Ok(token("login-token"))
            } else {
                Err(Error::authentication("Invalid credentials"))
            }
        }

        async fn register(&self, _: &RegisterParams) -> Result<AuthResponse> {
            self.calls.lock().unwrap().push(Call::Register);
            if self.register_ok {
                Ok(token("register-token"))
            } else {
                Err(Error::conflict("Email already exists"))
            }
        }

        async fn chat(&self, token: &str, params: &ChatParams) -> Result<ChatReply> {
            self.calls.lock().unwrap().push(Call::Chat {
                token: token.to_string(),
                params: params.clone(),
            });
            self.next_reply()
        }

        async fn chat_stateless(&self, params: &StatelessChatParams) -> Result<ChatReply> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Stateless(params.clone()));
            self.next_reply()
        }

        async fn list_sessions(&self, _: &str) -> Result<SessionList> {
            Ok(SessionList {
                sessions: Vec::<SessionSummary>::new(),
            })
        }

        async fn health(&self) -> Result<HealthStatus> {
            Err(Error::service_unavailable("down"))
        }
    }

    fn token(value: &str) -> AuthResponse {
        AuthResponse {
            access_token: value.to_string(),
            user_id: None,
            tier: None,
        }
    }

    /// Prompt that must never be consulted unless scripted.
    struct CountingPrompt {
        answer: Option<LoginParams>,
        asked: AtomicUsize,
    }

    impl CountingPrompt {
        fn answering() -> Self {
            Self {
                answer: Some(LoginParams::new("user@example.com", "strongpass123")),
                asked: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl CredentialPrompt for CountingPrompt {
        async fn request_credentials(&self) -> Result<Option<LoginParams>> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    type TestWidget = ChatWidget<FakeBackend, MemoryCredentialStore, CountingPrompt, MessageList>;

    fn mount(backend: FakeBackend, store: MemoryCredentialStore) -> TestWidget {
        ChatWidget::mount(
            backend,
            SessionBootstrapper::new(store, CountingPrompt::answering()),
            MessageList::new(),
            WidgetOptions::new().with_greeting(None),
        )
    }

    fn asked<B: Backend>(
        widget: &ChatWidget<B, MemoryCredentialStore, CountingPrompt, MessageList>,
    ) -> usize {
        widget.bootstrapper.prompt().asked.load(Ordering::SeqCst)
    }

    #[test]
    fn phase_transitions() {
        use SubmissionPhase::*;
        assert!(Idle.can_advance_to(UserMessageRendered));
        assert!(UserMessageRendered.can_advance_to(Pending));
        assert!(Pending.can_advance_to(Resolved));
        assert!(Pending.can_advance_to(Failed));
        assert!(!Idle.can_advance_to(Pending));
        assert!(!Resolved.can_advance_to(Pending));
        assert!(!Failed.can_advance_to(Resolved));
        assert!(Resolved.is_terminal() && Failed.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let widget = mount(FakeBackend::default(), MemoryCredentialStore::new());
        for input in ["", "   ", "\t\n", " \r\n "] {
            assert!(matches!(
                widget.submit(input).await,
                SubmissionOutcome::Ignored
            ));
        }
        assert!(widget.backend().calls().is_empty());
        assert_eq!(asked(&widget), 0);
        let view = widget.teardown();
        assert!(view.messages().is_empty());
    }

    #[tokio::test]
    async fn successful_round_trip_replaces_indicator() {
        let backend = FakeBackend::replying(vec![Ok(ChatReply::new(
            "Start with data structures...",
            Some(SessionId::from(1)),
        ))]);
        let widget = mount(backend, MemoryCredentialStore::with_token("saved"));

        let outcome = widget.submit("I want to become a backend engineer").await;
        assert_eq!(outcome.phase(), Some(SubmissionPhase::Resolved));
        assert_eq!(outcome.reply(), Some("Start with data structures..."));

        let view = widget.teardown();
        assert!(view.with_role(MessageRole::Pending).is_empty());
        let bots = view.with_role(MessageRole::Bot);
        assert_eq!(bots.len(), 1);
        assert_eq!(bots[0].text, "Start with data structures...");
        let users = view.with_role(MessageRole::User);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].text, "I want to become a backend engineer");
    }

    #[tokio::test]
    async fn message_is_trimmed_before_sending() {
        let widget = mount(FakeBackend::default(), MemoryCredentialStore::with_token("saved"));
        widget.submit("  hello there  ").await;
        assert_eq!(
            widget.backend().calls(),
            vec![Call::Chat {
                token: "saved".to_string(),
                params: ChatParams::new("hello there", None),
            }]
        );
    }

    #[tokio::test]
    async fn session_id_is_echoed_on_next_request() {
        let backend = FakeBackend::replying(vec![
            Ok(ChatReply::new("first", Some(SessionId::from("abc123")))),
            Ok(ChatReply::new("second", Some(SessionId::from("abc123")))),
        ]);
        let widget = mount(backend, MemoryCredentialStore::with_token("saved"));

        widget.submit("one").await;
        assert_eq!(widget.session_id(), Some(SessionId::from("abc123")));
        widget.submit("two").await;

        let calls = widget.backend().calls();
        let Call::Chat { params, .. } = &calls[1] else {
            panic!("expected chat call, got {:?}", calls[1]);
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            serde_json::json!({"message": "two", "session_id": "abc123"})
        );
    }

    #[tokio::test]
    async fn registration_credential_is_persisted_and_reused() {
        let store = MemoryCredentialStore::new();
        let backend = FakeBackend {
            register_ok: true,
            ..Default::default()
        };
        let widget = mount(backend, store.clone());

        widget.submit("first").await;
        widget.submit("second").await;

        assert_eq!(asked(&widget), 1);
        assert_eq!(store.load().unwrap(), Some("register-token".to_string()));
        let calls = widget.backend().calls();
        assert_eq!(calls[0], Call::Login);
        assert_eq!(calls[1], Call::Register);
        assert!(matches!(&calls[2], Call::Chat { token, .. } if token == "register-token"));
        assert!(matches!(&calls[3], Call::Chat { token, .. } if token == "register-token"));
        assert_eq!(calls.len(), 4);
    }

    #[tokio::test]
    async fn exhausted_authentication_renders_one_error() {
        let store = MemoryCredentialStore::new();
        let widget = mount(FakeBackend::default(), store.clone());

        let outcome = widget.submit("help me").await;
        assert!(outcome.error().unwrap().is_unable_to_authenticate());
        assert_eq!(widget.credential(), None);
        assert_eq!(store.load().unwrap(), None);
        assert!(
            !widget
                .backend()
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Chat { .. }))
        );

        let view = widget.teardown();
        let errors = view.with_role(MessageRole::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "Error: Unable to authenticate");
        assert!(view.with_role(MessageRole::Pending).is_empty());
        assert!(view.with_role(MessageRole::Bot).is_empty());
    }

    #[tokio::test]
    async fn remount_with_stored_credential_skips_prompt() {
        let store = MemoryCredentialStore::new();
        let first = mount(
            FakeBackend {
                login_ok: true,
                ..Default::default()
            },
            store.clone(),
        );
        first.submit("hello").await;
        assert_eq!(asked(&first), 1);
        first.teardown();

        let second = mount(FakeBackend::default(), store.clone());
        assert_eq!(second.credential(), Some("login-token".to_string()));
        second.submit("hello again").await;
        assert_eq!(asked(&second), 0);
        assert_eq!(second.session_id(), None);
        assert!(matches!(
            second.backend().calls().as_slice(),
            [Call::Chat { token, .. }] if token == "login-token"
        ));
    }

    #[tokio::test]
    async fn chat_failure_is_rendered_and_not_retried() {
        let backend = FakeBackend::replying(vec![Err(Error::rate_limit(
            "Rate limit exceeded for your subscription tier",
            None,
        ))]);
        let widget = mount(backend, MemoryCredentialStore::with_token("saved"));

        let outcome = widget.submit("plan my transition").await;
        assert!(outcome.error().unwrap().is_rate_limit());
        assert_eq!(widget.backend().calls().len(), 1);

        // The widget keeps working.
        let outcome = widget.submit("try again").await;
        assert_eq!(outcome.reply(), Some("default reply"));

        let view = widget.teardown();
        let errors = view.with_role(MessageRole::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].text.contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn stale_reply_does_not_clobber_session() {
        let widget = mount(FakeBackend::default(), MemoryCredentialStore::with_token("saved"));
        let newer = ChatReply::new("newer", Some(SessionId::from("new")));
        let older = ChatReply::new("older", Some(SessionId::from("old")));

        assert!(widget.apply_reply(2, "b", &newer));
        assert!(!widget.apply_reply(1, "a", &older));
        assert_eq!(widget.session_id(), Some(SessionId::from("new")));
    }

    #[tokio::test]
    async fn overlapping_submissions_each_resolve() {
        let backend = FakeBackend::replying(vec![
            Ok(ChatReply::new("reply one", Some(SessionId::from(5)))),
            Ok(ChatReply::new("reply two", Some(SessionId::from(5)))),
        ]);
        let widget = mount(backend, MemoryCredentialStore::with_token("saved"));

        let (a, b) = futures::join!(widget.submit("one"), widget.submit("two"));
        assert!(a.reply().is_some() && b.reply().is_some());
        assert_eq!(widget.stats().submissions, 2);

        let view = widget.teardown();
        assert!(view.with_role(MessageRole::Pending).is_empty());
        assert_eq!(view.with_role(MessageRole::Bot).len(), 2);
    }

    #[tokio::test]
    async fn overlapping_submissions_authenticate_once() {
        let store = MemoryCredentialStore::new();
        let backend = FakeBackend {
            login_ok: true,
            ..Default::default()
        };
        let widget = mount(backend, store);

        futures::join!(widget.submit("one"), widget.submit("two"));
        assert_eq!(asked(&widget), 1);
        let logins = widget
            .backend()
            .calls()
            .iter()
            .filter(|c| **c == Call::Login)
            .count();
        assert_eq!(logins, 1);
    }

    #[tokio::test]
    async fn stateless_protocol_sends_history() {
        let backend = FakeBackend::replying(vec![
            Ok(ChatReply::new("hello", None)),
            Err(Error::internal_server("boom")),
            Ok(ChatReply::new("plan", None)),
        ]);
        let widget = ChatWidget::mount(
            backend,
            SessionBootstrapper::new(MemoryCredentialStore::new(), CountingPrompt::answering()),
            MessageList::new(),
            WidgetOptions::new()
                .with_protocol(ChatProtocol::Stateless)
                .with_pending_indicator(false),
        );

        widget.submit("hi").await;
        widget.submit("fails").await;
        widget.submit("make a plan").await;

        assert_eq!(asked(&widget), 0);
        assert_eq!(
            widget.history(),
            vec![
                ConversationTurn::new("hi", "hello"),
                ConversationTurn::new("make a plan", "plan"),
            ]
        );
        let calls = widget.backend().calls();
        let Call::Stateless(last) = &calls[2] else {
            panic!("expected stateless call");
        };
        assert_eq!(last.history, vec![ConversationTurn::new("hi", "hello")]);

        let view = widget.teardown();
        // Greeting plus two replies; the failure is its own error message.
        assert_eq!(view.with_role(MessageRole::Bot).len(), 3);
        assert_eq!(view.with_role(MessageRole::Error).len(), 1);
        assert!(view.with_role(MessageRole::Pending).is_empty());
        assert_eq!(view.messages()[0].text, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn reset_session_starts_over() {
        let backend =
            FakeBackend::replying(vec![Ok(ChatReply::new("one", Some(SessionId::from(9))))]);
        let widget = mount(backend, MemoryCredentialStore::with_token("saved"));
        widget.submit("one").await;
        assert_eq!(widget.session_id(), Some(SessionId::from(9)));
        widget.reset_session();
        widget.submit("two").await;
        let calls = widget.backend().calls();
        assert!(matches!(&calls[1], Call::Chat { params, .. } if params.session_id.is_none()));
    }

    #[tokio::test]
    async fn resume_session_continues_chosen_session() {
        let backend = FakeBackend::replying(vec![
            Ok(ChatReply::new("one", Some(SessionId::from(9)))),
            Ok(ChatReply::new("two", Some(SessionId::from(3)))),
        ]);
        let widget = mount(backend, MemoryCredentialStore::with_token("saved"));
        widget.submit("one").await;

        widget.resume_session(SessionId::from(3));
        assert_eq!(widget.session_id(), Some(SessionId::from(3)));
        widget.submit("two").await;

        let calls = widget.backend().calls();
        assert!(matches!(
            &calls[1],
            Call::Chat { params, .. } if params.session_id == Some(SessionId::from(3))
        ));
        assert_eq!(widget.session_id(), Some(SessionId::from(3)));
    }

    #[tokio::test]
    async fn reply_in_flight_does_not_undo_resume() {
        let widget = mount(FakeBackend::default(), MemoryCredentialStore::with_token("saved"));
        let sequence = widget.next_sequence();
        widget.resume_session(SessionId::from(3));

        let late = ChatReply::new("late", Some(SessionId::from(9)));
        assert!(!widget.apply_reply(sequence, "earlier", &late));
        assert_eq!(widget.session_id(), Some(SessionId::from(3)));
    }

    fn terminal_widget(
        store: MemoryCredentialStore,
    ) -> ChatWidget<FakeBackend, MemoryCredentialStore, CountingPrompt, TerminalView<Vec<u8>>>
    {
        ChatWidget::mount(
            FakeBackend {
                login_ok: true,
                ..Default::default()
            },
            SessionBootstrapper::new(store, CountingPrompt::answering()),
            TerminalView::with_writer(Vec::new(), true),
            WidgetOptions::new().with_greeting(None),
        )
    }

    #[tokio::test]
    async fn indicator_line_is_closed_before_prompting() {
        let widget = terminal_widget(MemoryCredentialStore::new());
        widget.submit("hello").await;
        assert_eq!(widget.bootstrapper.prompt().asked.load(Ordering::SeqCst), 1);

        let out = String::from_utf8(widget.teardown().into_inner()).unwrap();
        // The prompt's line must not be erased in place of the indicator.
        assert!(!out.contains("\r\x1b[2K"));
        let (indicator, reply) = out.split_once('\n').unwrap();
        assert!(indicator.contains("thinking..."));
        assert!(reply.contains("default reply"));
    }

    #[tokio::test]
    async fn indicator_is_overwritten_without_prompt() {
        let widget = terminal_widget(MemoryCredentialStore::with_token("saved"));
        widget.submit("hello").await;
        assert_eq!(widget.bootstrapper.prompt().asked.load(Ordering::SeqCst), 0);

        let out = String::from_utf8(widget.teardown().into_inner()).unwrap();
        assert!(out.contains("\r\x1b[2K"));
    }

    #[tokio::test]
    async fn form_prompt_drives_bootstrap() {
        let (prompt, mut form) = FormPrompt::new();
        let store = MemoryCredentialStore::new();
        let widget = ChatWidget::mount(
            FakeBackend {
                login_ok: true,
                ..Default::default()
            },
            SessionBootstrapper::new(store.clone(), prompt),
            MessageList::new(),
            WidgetOptions::new().with_greeting(None),
        );

        let answer = async {
            let pending = form.next_request().await.unwrap();
            pending.submit("user@example.com", "strongpass123");
        };
        let (outcome, ()) = futures::join!(widget.submit("hello"), answer);
        assert_eq!(outcome.phase(), Some(SubmissionPhase::Resolved));
        assert_eq!(store.load().unwrap(), Some("login-token".to_string()));
    }
}
