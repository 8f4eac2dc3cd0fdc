use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use enquiry_core::{ClickTarget, InputLine};
use ratatui::layout::Rect;

use crate::app::{AdminFocus, App, ModalField, Screen};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::ChatSettled(reply, outcome) => app.on_chat_settled(reply, outcome),
        AppEvent::CrudSettled(op, result) => app.on_crud_settled(op, result),
        AppEvent::FaqsLoaded(result) => app.on_faqs_loaded(result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on every screen
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::F(2) {
        app.toggle_screen();
        return;
    }

    match app.screen {
        Screen::Chat => handle_chat_key(app, key),
        Screen::Admin => handle_admin_key(app, key),
    }
}

/// Shared line editing for every text field
fn edit_line(line: &mut InputLine, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => line.backspace(),
        KeyCode::Delete => line.delete(),
        KeyCode::Left => line.left(),
        KeyCode::Right => line.right(),
        KeyCode::Home => line.home(),
        KeyCode::End => line.end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => line.insert(c),
        _ => {}
    }
}

fn is_save(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.send_chat(),
        KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height / 2),
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height / 2),
        KeyCode::Esc => app.should_quit = true,
        _ => edit_line(app.chat.input_mut(), key),
    }
}

fn handle_admin_key(app: &mut App, key: KeyEvent) {
    // Popups take keys in priority order: notice, delete confirmation, edit modal
    if app.admin.notice().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.admin.dismiss_notice();
        }
        return;
    }

    if app.admin.pending_delete().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_delete(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_delete(false),
            _ => {}
        }
        return;
    }

    if app.admin.is_modal_open() {
        handle_modal_key(app, key);
        return;
    }

    match app.admin_focus {
        AdminFocus::List => handle_list_key(app, key),
        AdminFocus::CreateQuestion | AdminFocus::CreateAnswer => handle_create_key(app, key),
    }
}

fn handle_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.faq_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.faq_nav_up(),
        KeyCode::Char('e') | KeyCode::Enter => app.begin_edit_selected(),
        KeyCode::Char('d') => app.request_delete_selected(),
        KeyCode::Char('r') => app.load_faqs(),
        KeyCode::Char('a') | KeyCode::Tab => app.admin_focus = AdminFocus::CreateQuestion,
        _ => {}
    }
}

fn handle_create_key(app: &mut App, key: KeyEvent) {
    if is_save(&key) {
        app.submit_create();
        return;
    }

    match key.code {
        KeyCode::Esc => app.admin_focus = AdminFocus::List,
        KeyCode::Tab | KeyCode::BackTab => {
            app.admin_focus = match app.admin_focus {
                AdminFocus::CreateQuestion => AdminFocus::CreateAnswer,
                _ => AdminFocus::CreateQuestion,
            };
        }
        KeyCode::Enter if app.admin_focus == AdminFocus::CreateQuestion => {
            app.admin_focus = AdminFocus::CreateAnswer;
        }
        KeyCode::Enter => app.submit_create(),
        _ => {
            let form = app.admin.create_form_mut();
            let line = if app.admin_focus == AdminFocus::CreateQuestion {
                &mut form.question
            } else {
                &mut form.answer
            };
            edit_line(line, key);
        }
    }
}

fn handle_modal_key(app: &mut App, key: KeyEvent) {
    if is_save(&key) {
        app.submit_update();
        return;
    }

    match key.code {
        KeyCode::Esc => app.admin.close_modal(),
        KeyCode::Tab | KeyCode::BackTab => {
            app.modal_field = match app.modal_field {
                ModalField::Question => ModalField::Answer,
                ModalField::Answer => ModalField::Question,
            };
        }
        KeyCode::Enter if app.modal_field == ModalField::Question => {
            app.modal_field = ModalField::Answer;
        }
        KeyCode::Enter => app.submit_update(),
        _ => {
            let field = app.modal_field;
            if let Some(form) = app.admin.edit_form_mut() {
                let line = match field {
                    ModalField::Question => &mut form.question,
                    ModalField::Answer => &mut form.answer,
                };
                edit_line(line, key);
            }
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Classify a click relative to the edit dialog
pub fn modal_click_target(modal_area: Option<Rect>, x: u16, y: u16) -> ClickTarget {
    match modal_area {
        Some(area) if point_in_rect(x, y, area) => ClickTarget::DialogContent,
        Some(_) => ClickTarget::Overlay,
        None => ClickTarget::Elsewhere,
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => match app.screen {
            Screen::Chat => {
                if app.send_button_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false) {
                    app.send_chat();
                }
            }
            Screen::Admin => {
                if !app.admin.is_modal_open() || app.admin.notice().is_some() {
                    return;
                }
                if app.modal_close_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false) {
                    app.admin.close_modal();
                } else {
                    app.admin.click(modal_click_target(app.modal_area, x, y));
                }
            }
        },
        MouseEventKind::ScrollDown if app.screen == Screen::Chat && in_chat => {
            app.scroll_chat_down(3);
        }
        MouseEventKind::ScrollUp if app.screen == Screen::Chat && in_chat => {
            app.scroll_chat_up(3);
        }
        _ => {}
    }
}
