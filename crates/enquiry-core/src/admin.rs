//! FAQ admin controller
//!
//! Create, update and delete run the same way: build a [`CrudRequest`], send
//! it, then [`FaqAdmin::settle`] the result. A success queues a notice, drops
//! all form state and flags the list for a reload. A failure queues an error
//! notice and leaves everything else as it was so the user can retry.

use std::collections::VecDeque;
use tracing::{info, warn};

use crate::api::FaqBackend;
use crate::error::ApiError;
use crate::state::{FaqEntry, FaqId, InputLine};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this FAQ?";
pub const LOAD_FAILED: &str = "Error loading FAQs. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalVisibility {
    Open,
    Closed,
}

/// Where a pointer click landed, as far as the edit dialog is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The dimmed backdrop around the dialog
    Overlay,
    /// Anything inside the dialog itself
    DialogContent,
    Elsewhere,
}

/// User-facing outcome of an admin action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(text) | Notice::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudOp {
    Create,
    Update,
    Delete,
}

impl CrudOp {
    fn past_tense(&self) -> &'static str {
        match self {
            CrudOp::Create => "added",
            CrudOp::Update => "updated",
            CrudOp::Delete => "deleted",
        }
    }

    fn progressive(&self) -> &'static str {
        match self {
            CrudOp::Create => "adding",
            CrudOp::Update => "updating",
            CrudOp::Delete => "deleting",
        }
    }

    fn success_notice(&self) -> Notice {
        Notice::Success(format!("FAQ {} successfully!", self.past_tense()))
    }

    fn failure_notice(&self, err: &ApiError) -> Notice {
        if err.is_reported() {
            Notice::Error(format!(
                "Error {} FAQ: {}",
                self.progressive(),
                err.server_message().unwrap_or("unknown error")
            ))
        } else {
            Notice::Error(format!("Error {} FAQ. Please try again.", self.progressive()))
        }
    }
}

/// A change ready to be sent to the FAQ backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrudRequest {
    Create {
        question: String,
        answer: String,
    },
    Update {
        id: FaqId,
        question: String,
        answer: String,
    },
    Delete {
        id: FaqId,
    },
}

impl CrudRequest {
    pub fn op(&self) -> CrudOp {
        match self {
            CrudRequest::Create { .. } => CrudOp::Create,
            CrudRequest::Update { .. } => CrudOp::Update,
            CrudRequest::Delete { .. } => CrudOp::Delete,
        }
    }

    pub async fn send<B>(&self, backend: &B) -> Result<(), ApiError>
    where
        B: FaqBackend + ?Sized,
    {
        match self {
            CrudRequest::Create { question, answer } => backend.add_faq(question, answer).await,
            CrudRequest::Update {
                id,
                question,
                answer,
            } => backend.update_faq(id, question, answer).await,
            CrudRequest::Delete { id } => backend.delete_faq(id).await,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CreateFormState {
    pub question: InputLine,
    pub answer: InputLine,
}

/// The entry being edited, mirrored into the modal's fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFormState {
    pub id: FaqId,
    pub question: InputLine,
    pub answer: InputLine,
}

#[derive(Debug)]
pub struct FaqAdmin {
    entries: Vec<FaqEntry>,
    create_form: CreateFormState,
    edit_form: Option<EditFormState>,
    modal: ModalVisibility,
    pending_delete: Option<FaqId>,
    notices: VecDeque<Notice>,
    needs_reload: bool,
}

impl Default for FaqAdmin {
    fn default() -> Self {
        Self::new()
    }
}

impl FaqAdmin {
    /// Starts empty and flagged for an initial load
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            create_form: CreateFormState::default(),
            edit_form: None,
            modal: ModalVisibility::Closed,
            pending_delete: None,
            notices: VecDeque::new(),
            needs_reload: true,
        }
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn create_form(&self) -> &CreateFormState {
        &self.create_form
    }

    pub fn create_form_mut(&mut self) -> &mut CreateFormState {
        &mut self.create_form
    }

    pub fn edit_form(&self) -> Option<&EditFormState> {
        self.edit_form.as_ref()
    }

    pub fn edit_form_mut(&mut self) -> Option<&mut EditFormState> {
        self.edit_form.as_mut()
    }

    pub fn modal(&self) -> ModalVisibility {
        self.modal
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal == ModalVisibility::Open
    }

    /// Entry awaiting a yes/no on deletion
    pub fn pending_delete(&self) -> Option<&FaqId> {
        self.pending_delete.as_ref()
    }

    /// Oldest notice not yet dismissed
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    pub fn create_request(&self) -> CrudRequest {
        CrudRequest::Create {
            question: self.create_form.question.text().to_string(),
            answer: self.create_form.answer.text().to_string(),
        }
    }

    /// Stage an entry in the edit form and open the modal. No request is made.
    pub fn begin_edit(&mut self, id: FaqId, question: &str, answer: &str) {
        self.edit_form = Some(EditFormState {
            id,
            question: InputLine::with_text(question),
            answer: InputLine::with_text(answer),
        });
        self.modal = ModalVisibility::Open;
    }

    /// `None` when nothing is staged for editing
    pub fn update_request(&self) -> Option<CrudRequest> {
        self.edit_form.as_ref().map(|form| CrudRequest::Update {
            id: form.id.clone(),
            question: form.question.text().to_string(),
            answer: form.answer.text().to_string(),
        })
    }

    /// Ask for confirmation before deleting; nothing is sent yet
    pub fn request_delete(&mut self, id: FaqId) {
        self.pending_delete = Some(id);
    }

    /// Resolve the confirmation gate. Declining sends nothing.
    pub fn answer_delete(&mut self, confirmed: bool) -> Option<CrudRequest> {
        let id = self.pending_delete.take()?;
        if confirmed {
            Some(CrudRequest::Delete { id })
        } else {
            None
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalVisibility::Closed;
    }

    /// Only a click on the overlay itself closes the dialog. Returns whether it closed.
    pub fn click(&mut self, target: ClickTarget) -> bool {
        if target == ClickTarget::Overlay && self.is_modal_open() {
            self.close_modal();
            true
        } else {
            false
        }
    }

    /// Apply the outcome of a sent request. Returns true when the list must be reloaded.
    pub fn settle(&mut self, op: CrudOp, result: Result<(), ApiError>) -> bool {
        match result {
            Ok(()) => {
                info!(?op, "faq change accepted");
                self.notices.push_back(op.success_notice());
                self.create_form = CreateFormState::default();
                self.edit_form = None;
                self.modal = ModalVisibility::Closed;
                self.needs_reload = true;
                true
            }
            Err(err) => {
                warn!(?op, error = %err, reported = err.is_reported(), "faq change failed");
                self.notices.push_back(op.failure_notice(&err));
                false
            }
        }
    }

    /// Replace the list with what the backend returned
    pub fn reload(&mut self, entries: Vec<FaqEntry>) {
        self.entries = entries;
        self.needs_reload = false;
    }

    /// The list could not be fetched; keep the old one and stay flagged
    pub fn reload_failed(&mut self, err: &ApiError) {
        warn!(error = %err, "loading faqs failed");
        self.notices.push_back(Notice::Error(LOAD_FAILED.to_string()));
    }

    pub async fn refresh<B>(&mut self, backend: &B) -> bool
    where
        B: FaqBackend + ?Sized,
    {
        match backend.list_faqs().await {
            Ok(entries) => {
                self.reload(entries);
                true
            }
            Err(err) => {
                self.reload_failed(&err);
                false
            }
        }
    }

    pub async fn create<B>(&mut self, backend: &B) -> bool
    where
        B: FaqBackend + ?Sized,
    {
        let request = self.create_request();
        self.run(request, backend).await
    }

    pub async fn update<B>(&mut self, backend: &B) -> bool
    where
        B: FaqBackend + ?Sized,
    {
        match self.update_request() {
            Some(request) => self.run(request, backend).await,
            None => false,
        }
    }

    /// `confirm` receives the prompt and decides whether the delete goes ahead
    pub async fn delete_entry<B, F>(&mut self, id: FaqId, confirm: F, backend: &B) -> bool
    where
        B: FaqBackend + ?Sized,
        F: FnOnce(&str) -> bool,
    {
        self.request_delete(id);
        let confirmed = confirm(DELETE_PROMPT);
        match self.answer_delete(confirmed) {
            Some(request) => self.run(request, backend).await,
            None => false,
        }
    }

    /// Send and settle. A caller showing the list follows a success with [`FaqAdmin::refresh`].
    async fn run<B>(&mut self, request: CrudRequest, backend: &B) -> bool
    where
        B: FaqBackend + ?Sized,
    {
        let result = request.send(backend).await;
        self.settle(request.op(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Accept,
        Reject,
        Down,
    }

    /// In-memory FAQ store that logs every call
    struct FakeStore {
        entries: Mutex<Vec<FaqEntry>>,
        calls: Mutex<Vec<String>>,
        mode: Mutex<Mode>,
        next_id: Mutex<i64>,
    }

    impl FakeStore {
        fn new(entries: Vec<FaqEntry>) -> Self {
            Self {
                entries: Mutex::new(entries),
                calls: Mutex::new(Vec::new()),
                mode: Mutex::new(Mode::Accept),
                next_id: Mutex::new(100),
            }
        }

        fn set_mode(&self, mode: Mode) {
            *self.mode.lock().unwrap() = mode;
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn outcome(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            match *self.mode.lock().unwrap() {
                Mode::Accept => Ok(()),
                Mode::Reject => Err(ApiError::Rejected(Some("Unauthorized".to_string()))),
                Mode::Down => Err(ApiError::Http(StatusCode::BAD_GATEWAY)),
            }
        }
    }

    #[async_trait]
    impl FaqBackend for FakeStore {
        async fn list_faqs(&self) -> Result<Vec<FaqEntry>, ApiError> {
            self.outcome("list".to_string())?;
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn add_faq(&self, question: &str, answer: &str) -> Result<(), ApiError> {
            self.outcome(format!("add {question}"))?;
            let mut next_id = self.next_id.lock().unwrap();
            self.entries.lock().unwrap().push(entry(*next_id, question, answer));
            *next_id += 1;
            Ok(())
        }

        async fn update_faq(&self, id: &FaqId, question: &str, answer: &str) -> Result<(), ApiError> {
            self.outcome(format!("update {id}"))?;
            for e in self.entries.lock().unwrap().iter_mut().filter(|e| &e.id == id) {
                e.question = question.to_string();
                e.answer = answer.to_string();
            }
            Ok(())
        }

        async fn delete_faq(&self, id: &FaqId) -> Result<(), ApiError> {
            self.outcome(format!("delete {id}"))?;
            self.entries.lock().unwrap().retain(|e| &e.id != id);
            Ok(())
        }
    }

    fn entry(id: i64, question: &str, answer: &str) -> FaqEntry {
        FaqEntry {
            id: FaqId::from(id),
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    async fn loaded(store: &FakeStore) -> FaqAdmin {
        let mut admin = FaqAdmin::new();
        assert!(admin.refresh(store).await);
        store.calls.lock().unwrap().clear();
        admin
    }

    #[tokio::test]
    async fn test_create_success_notifies_and_reloads() {
        let store = FakeStore::new(vec![entry(1, "Hostel?", "Yes")]);
        let mut admin = loaded(&store).await;
        admin.create_form_mut().question.set("Library hours?");
        admin.create_form_mut().answer.set("9 to 5");

        assert!(admin.create(&store).await);

        assert_eq!(store.calls(), vec!["add Library hours?"]);
        assert_eq!(
            admin.notice(),
            Some(&Notice::Success("FAQ added successfully!".to_string()))
        );
        assert!(admin.create_form().question.is_empty());
        assert!(admin.needs_reload());

        assert!(admin.refresh(&store).await);
        assert_eq!(admin.entries().len(), 2);
        assert!(!admin.needs_reload());
    }

    #[tokio::test]
    async fn test_create_reported_failure_keeps_form() {
        let store = FakeStore::new(Vec::new());
        let mut admin = loaded(&store).await;
        admin.create_form_mut().question.set("Q");
        admin.create_form_mut().answer.set("A");
        store.set_mode(Mode::Reject);

        assert!(!admin.create(&store).await);

        assert_eq!(store.calls(), vec!["add Q"]);
        assert_eq!(
            admin.notice().map(Notice::text),
            Some("Error adding FAQ: Unauthorized")
        );
        assert_eq!(admin.create_form().question.text(), "Q");
        assert_eq!(admin.create_form().answer.text(), "A");
    }

    #[tokio::test]
    async fn test_create_transport_failure_uses_generic_text() {
        let store = FakeStore::new(Vec::new());
        let mut admin = loaded(&store).await;
        store.set_mode(Mode::Down);

        assert!(!admin.create(&store).await);
        assert_eq!(
            admin.notice().map(Notice::text),
            Some("Error adding FAQ. Please try again.")
        );
    }

    #[test]
    fn test_begin_edit_stages_entry_and_opens_modal() {
        let mut admin = FaqAdmin::new();
        admin.begin_edit(FaqId::from(4), "Fees?", "Varies");

        assert!(admin.is_modal_open());
        let form = admin.edit_form().unwrap();
        assert_eq!(form.id.as_str(), "4");
        assert_eq!(form.question.text(), "Fees?");
        assert_eq!(form.answer.text(), "Varies");
    }

    #[tokio::test]
    async fn test_update_success_closes_modal_and_reloads() {
        let store = FakeStore::new(vec![entry(4, "Fees?", "Varies")]);
        let mut admin = loaded(&store).await;
        admin.begin_edit(FaqId::from(4), "Fees?", "Varies");
        admin.edit_form_mut().unwrap().answer.set("See the office");

        assert!(admin.update(&store).await);

        assert_eq!(store.calls(), vec!["update 4"]);
        assert_eq!(admin.modal(), ModalVisibility::Closed);
        assert!(admin.edit_form().is_none());

        assert!(admin.refresh(&store).await);
        assert_eq!(admin.entries()[0].answer, "See the office");
    }

    #[tokio::test]
    async fn test_update_failure_keeps_modal_for_correction() {
        let store = FakeStore::new(vec![entry(4, "Fees?", "Varies")]);
        let mut admin = loaded(&store).await;
        admin.begin_edit(FaqId::from(4), "Fees?", "Varies");
        admin.edit_form_mut().unwrap().answer.set("draft");
        store.set_mode(Mode::Reject);

        assert!(!admin.update(&store).await);

        assert!(admin.is_modal_open());
        assert_eq!(admin.edit_form().unwrap().answer.text(), "draft");
        assert_eq!(
            admin.notice().map(Notice::text),
            Some("Error updating FAQ: Unauthorized")
        );
        assert_eq!(admin.entries()[0].answer, "Varies");
    }

    #[tokio::test]
    async fn test_update_without_staged_entry_sends_nothing() {
        let store = FakeStore::new(Vec::new());
        let mut admin = loaded(&store).await;

        assert!(!admin.update(&store).await);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let store = FakeStore::new(vec![entry(1, "Q", "A")]);
        let mut admin = loaded(&store).await;
        let mut prompt = String::new();

        let deleted = admin
            .delete_entry(
                FaqId::from(1),
                |text| {
                    prompt = text.to_string();
                    false
                },
                &store,
            )
            .await;

        assert!(!deleted);
        assert_eq!(prompt, DELETE_PROMPT);
        assert!(store.calls().is_empty());
        assert_eq!(admin.entries().len(), 1);
        assert!(admin.notice().is_none());
        assert!(admin.pending_delete().is_none());
    }

    #[tokio::test]
    async fn test_confirmed_delete_reloads_list() {
        let store = FakeStore::new(vec![entry(1, "Q", "A"), entry(2, "Q2", "A2")]);
        let mut admin = loaded(&store).await;

        assert!(admin.delete_entry(FaqId::from(1), |_| true, &store).await);

        assert_eq!(store.calls(), vec!["delete 1"]);
        assert!(admin.refresh(&store).await);
        assert_eq!(admin.entries(), &[entry(2, "Q2", "A2")]);
        assert_eq!(
            admin.notice().map(Notice::text),
            Some("FAQ deleted successfully!")
        );
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_entry() {
        let store = FakeStore::new(vec![entry(1, "Q", "A")]);
        let mut admin = loaded(&store).await;
        store.set_mode(Mode::Down);

        assert!(!admin.delete_entry(FaqId::from(1), |_| true, &store).await);

        assert_eq!(admin.entries().len(), 1);
        assert_eq!(
            admin.notice().map(Notice::text),
            Some("Error deleting FAQ. Please try again.")
        );
    }

    #[test]
    fn test_only_overlay_clicks_close_modal() {
        let mut admin = FaqAdmin::new();
        admin.begin_edit(FaqId::from(1), "Q", "A");

        assert!(!admin.click(ClickTarget::DialogContent));
        assert!(!admin.click(ClickTarget::Elsewhere));
        assert!(admin.is_modal_open());

        assert!(admin.click(ClickTarget::Overlay));
        assert_eq!(admin.modal(), ModalVisibility::Closed);
        // Staged values survive a close; the next begin_edit replaces them
        assert!(admin.edit_form().is_some());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_flag_for_retry() {
        let store = FakeStore::new(vec![entry(1, "Q", "A")]);
        let mut admin = FaqAdmin::new();
        store.set_mode(Mode::Down);

        assert!(!admin.refresh(&store).await);
        assert!(admin.needs_reload());
        assert_eq!(admin.dismiss_notice().map(|n| n.is_error()), Some(true));
        assert!(admin.notice().is_none());
    }
}
