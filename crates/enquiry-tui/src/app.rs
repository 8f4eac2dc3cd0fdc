use enquiry_core::chat;
use enquiry_core::{
    ApiError, ChatSession, CrudOp, CrudRequest, EnquiryClient, FaqAdmin, FaqBackend, FaqEntry,
    PendingReply,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Admin,
}

/// Which part of the admin screen takes keystrokes when no popup is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminFocus {
    List,
    CreateQuestion,
    CreateAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalField {
    Question,
    Answer,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub admin_enabled: bool,

    // Controllers
    pub chat: ChatSession,
    pub admin: FaqAdmin,

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the transcript area
    pub chat_width: u16,  // Inner width, for wrap calculations
    pub followed_revision: u64,

    // Admin view state
    pub faq_state: ListState,
    pub admin_focus: AdminFocus,
    pub modal_field: ModalField,
    pub faqs_loading: bool,
    pub reload_queued: bool, // A change landed while a fetch was running
    pub crud_in_flight: usize,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Areas for mouse hit-testing (updated during render)
    pub send_button_area: Option<Rect>,
    pub chat_area: Option<Rect>,
    pub modal_area: Option<Rect>,
    pub modal_close_area: Option<Rect>,

    // Backend
    pub client: EnquiryClient,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(client: EnquiryClient, events: UnboundedSender<AppEvent>, admin_enabled: bool) -> Self {
        Self {
            should_quit: false,
            screen: if admin_enabled { Screen::Admin } else { Screen::Chat },
            admin_enabled,

            chat: ChatSession::new(),
            admin: FaqAdmin::new(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            followed_revision: 0,

            faq_state: ListState::default(),
            admin_focus: AdminFocus::List,
            modal_field: ModalField::Question,
            faqs_loading: false,
            reload_queued: false,
            crud_in_flight: 0,

            animation_frame: 0,

            send_button_area: None,
            chat_area: None,
            modal_area: None,
            modal_close_area: None,

            client,
            events,
        }
    }

    // Chat actions
    pub fn send_chat(&mut self) {
        if let Some(reply) = self.chat.submit() {
            self.scroll_chat_to_bottom();
            self.spawn_reply(reply);
        }
    }

    /// Pre-fill a canned question from a deep link and send it
    pub fn open_deep_link(&mut self, link: &str) {
        match self.chat.open_deep_link(link) {
            Some(reply) => {
                self.screen = Screen::Chat;
                self.scroll_chat_to_bottom();
                self.spawn_reply(reply);
            }
            None => tracing::info!(link, "deep link names no known topic"),
        }
    }

    fn spawn_reply(&self, reply: PendingReply) {
        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let (reply, outcome) = chat::resolve(&client, reply).await;
            let _ = tx.send(AppEvent::ChatSettled(reply, outcome));
        });
    }

    pub fn on_chat_settled(&mut self, reply: PendingReply, outcome: Result<String, ApiError>) {
        self.chat.settle(reply, outcome);
        self.scroll_chat_to_bottom();
    }

    // Admin actions
    pub fn submit_create(&mut self) {
        let request = self.admin.create_request();
        self.dispatch_crud(request);
    }

    pub fn submit_update(&mut self) {
        if let Some(request) = self.admin.update_request() {
            self.dispatch_crud(request);
        }
    }

    pub fn begin_edit_selected(&mut self) {
        if let Some(entry) = self.selected_entry().cloned() {
            self.admin.begin_edit(entry.id, &entry.question, &entry.answer);
            self.modal_field = ModalField::Question;
        }
    }

    pub fn request_delete_selected(&mut self) {
        if let Some(entry) = self.selected_entry() {
            let id = entry.id.clone();
            self.admin.request_delete(id);
        }
    }

    pub fn answer_delete(&mut self, confirmed: bool) {
        if let Some(request) = self.admin.answer_delete(confirmed) {
            self.dispatch_crud(request);
        }
    }

    fn dispatch_crud(&mut self, request: CrudRequest) {
        self.crud_in_flight += 1;
        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = request.send(&client).await;
            let _ = tx.send(AppEvent::CrudSettled(request.op(), result));
        });
    }

    pub fn on_crud_settled(&mut self, op: CrudOp, result: Result<(), ApiError>) {
        self.crud_in_flight = self.crud_in_flight.saturating_sub(1);
        if self.admin.settle(op, result) {
            self.admin_focus = AdminFocus::List;
            self.load_faqs();
        }
    }

    /// Fetch the FAQ list. While a fetch is running, another one is queued behind it.
    pub fn load_faqs(&mut self) {
        if self.faqs_loading {
            self.reload_queued = true;
            return;
        }
        self.faqs_loading = true;

        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.list_faqs().await;
            let _ = tx.send(AppEvent::FaqsLoaded(result));
        });
    }

    pub fn on_faqs_loaded(&mut self, result: Result<Vec<FaqEntry>, ApiError>) {
        self.faqs_loading = false;

        // The result predates a later change, so fetch again and keep the list flagged
        if self.reload_queued {
            self.reload_queued = false;
            tracing::debug!("discarding stale faq list");
            self.load_faqs();
            return;
        }

        match result {
            Ok(entries) => {
                self.admin.reload(entries);
                self.clamp_faq_selection();
            }
            Err(err) => self.admin.reload_failed(&err),
        }
    }

    pub fn selected_entry(&self) -> Option<&FaqEntry> {
        self.faq_state
            .selected()
            .and_then(|i| self.admin.entries().get(i))
    }

    fn clamp_faq_selection(&mut self) {
        let len = self.admin.entries().len();
        if len == 0 {
            self.faq_state.select(None);
        } else {
            let i = self.faq_state.selected().unwrap_or(0);
            self.faq_state.select(Some(i.min(len - 1)));
        }
    }

    pub fn faq_nav_down(&mut self) {
        let len = self.admin.entries().len();
        if len > 0 {
            let i = self.faq_state.selected().unwrap_or(0);
            self.faq_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn faq_nav_up(&mut self) {
        let i = self.faq_state.selected().unwrap_or(0);
        self.faq_state.select(Some(i.saturating_sub(1)));
    }

    pub fn toggle_screen(&mut self) {
        if !self.admin_enabled {
            return;
        }
        self.screen = match self.screen {
            Screen::Chat => Screen::Admin,
            Screen::Admin => Screen::Chat,
        };
        if self.screen == Screen::Admin && self.admin.needs_reload() {
            self.load_faqs();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the transcript so the newest line (or the typing marker) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.chat.transcript().iter() {
            total_lines = total_lines.saturating_add(1); // Sender line ("You:" or "AI:")
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 text
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { char_count / wrap_width + 1 };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.chat.is_awaiting_reply() {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Typing..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
        self.followed_revision = self.chat.revision();
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::sync::mpsc;

    pub(crate) fn test_app(admin_enabled: bool) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = EnquiryClient::new("http://127.0.0.1:9").unwrap();
        (App::new(client, tx, admin_enabled), rx)
    }

    fn entry(id: i64, question: &str) -> FaqEntry {
        FaqEntry {
            id: id.into(),
            question: question.to_string(),
            answer: format!("answer to {question}"),
        }
    }

    #[test]
    fn test_scroll_follows_latest_message() {
        let (mut app, _rx) = test_app(false);
        app.chat_height = 4;
        app.chat_width = 40;

        for i in 0..3 {
            app.chat.input_mut().set(format!("question {i}"));
            let reply = app.chat.submit().unwrap();
            app.on_chat_settled(reply, Ok("answer".to_string()));
        }

        // 6 messages x 3 lines each, minus the 4 visible rows
        assert_eq!(app.chat_scroll, 14);
        assert_eq!(app.followed_revision, app.chat.revision());
    }

    #[test]
    fn test_faq_reload_clamps_selection() {
        let (mut app, _rx) = test_app(true);
        app.on_faqs_loaded(Ok(vec![entry(1, "a"), entry(2, "b"), entry(3, "c")]));
        app.faq_state.select(Some(2));

        app.on_faqs_loaded(Ok(vec![entry(1, "a")]));
        assert_eq!(app.faq_state.selected(), Some(0));

        app.on_faqs_loaded(Ok(Vec::new()));
        assert_eq!(app.faq_state.selected(), None);
        assert!(app.selected_entry().is_none());
    }

    #[test]
    fn test_failed_load_keeps_list_and_notifies() {
        let (mut app, _rx) = test_app(true);
        app.on_faqs_loaded(Ok(vec![entry(1, "a")]));

        app.on_faqs_loaded(Err(ApiError::Rejected(None)));

        assert_eq!(app.admin.entries().len(), 1);
        assert!(app.admin.notice().is_some_and(|n| n.is_error()));
        assert!(!app.faqs_loading);
    }

    #[test]
    fn test_begin_edit_selected_stages_row() {
        let (mut app, _rx) = test_app(true);
        app.on_faqs_loaded(Ok(vec![entry(1, "a"), entry(2, "b")]));
        app.faq_nav_down();

        app.begin_edit_selected();

        let form = app.admin.edit_form().unwrap();
        assert_eq!(form.id.as_str(), "2");
        assert_eq!(form.question.text(), "b");
        assert!(app.admin.is_modal_open());
    }

    #[tokio::test]
    async fn test_change_during_fetch_queues_another_fetch() {
        let (mut app, _rx) = test_app(true);
        app.load_faqs();
        assert!(app.faqs_loading);

        app.on_crud_settled(CrudOp::Create, Ok(()));
        assert!(app.reload_queued);

        // The list fetched before the create lands first
        app.on_faqs_loaded(Ok(vec![entry(1, "a")]));
        assert!(app.faqs_loading);
        assert!(!app.reload_queued);
        assert!(app.admin.needs_reload());
        assert!(app.admin.entries().is_empty());

        app.on_faqs_loaded(Ok(vec![entry(1, "a"), entry(2, "new")]));
        assert!(!app.faqs_loading);
        assert!(!app.admin.needs_reload());
        assert_eq!(app.admin.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_deep_link_switches_to_chat_and_sends_once() {
        let (mut app, _rx) = test_app(true);
        assert_eq!(app.screen, Screen::Admin);

        app.open_deep_link("/chat?question=admission");

        assert_eq!(app.screen, Screen::Chat);
        assert_eq!(app.chat.transcript().len(), 1);
        assert_eq!(
            app.chat.transcript().last().map(|m| m.text.as_str()),
            Some("Tell me about the admission process")
        );
        assert_eq!(app.chat.pending_count(), 1);
        assert!(app.chat.input().is_empty());
    }

    #[test]
    fn test_chat_only_mode_cannot_switch_to_admin() {
        let (mut app, _rx) = test_app(false);
        app.toggle_screen();
        assert_eq!(app.screen, Screen::Chat);
    }
}
