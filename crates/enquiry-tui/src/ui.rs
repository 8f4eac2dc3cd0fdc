use enquiry_core::admin::DELETE_PROMPT;
use enquiry_core::{InputLine, Notice, Sender};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{AdminFocus, App, ModalField, Screen};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Hit-test areas are rebuilt every frame
    app.send_button_area = None;
    app.chat_area = None;
    app.modal_area = None;
    app.modal_close_area = None;

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Admin => render_admin_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority, the last one drawn is on top)
    if app.screen == Screen::Admin {
        if app.admin.is_modal_open() {
            render_edit_modal(app, frame, area);
        }
        if app.admin.pending_delete().is_some() {
            render_confirm_delete(frame, area);
        }
        if let Some(notice) = app.admin.notice() {
            render_notice(notice, frame, area);
        }
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" College Enquiry ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.client.base_url().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mode = match app.screen {
        Screen::Chat => Span::styled(" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        Screen::Admin => Span::styled(" ADMIN ", Style::default().bg(Color::Magenta).fg(Color::White)),
    };

    let pairs: Vec<(&str, &str)> = match app.screen {
        Screen::Chat => vec![("Enter", "send"), ("↑/↓", "scroll"), ("Esc", "quit")],
        Screen::Admin if app.admin.notice().is_some() => vec![("Enter", "dismiss")],
        Screen::Admin if app.admin.pending_delete().is_some() => vec![("y", "delete"), ("n", "cancel")],
        Screen::Admin if app.admin.is_modal_open() => {
            vec![("Tab", "field"), ("Ctrl+S", "save"), ("Esc", "close")]
        }
        Screen::Admin => match app.admin_focus {
            AdminFocus::List => vec![
                ("j/k", "nav"),
                ("e", "edit"),
                ("d", "delete"),
                ("a", "add"),
                ("r", "reload"),
                ("q", "quit"),
            ],
            _ => vec![("Tab", "field"), ("Ctrl+S", "add"), ("Esc", "list")],
        },
    };

    let mut spans = vec![mode, Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }
    if app.admin_enabled {
        spans.push(Span::styled(" F2 ", key_style));
        spans.push(Span::styled(" switch ", label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_row] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);
    let [input_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(input_row);

    app.chat_area = Some(chat_area);
    app.send_button_area = Some(button_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    // Something was appended since the last follow: jump to it
    if app.followed_revision != app.chat.revision() {
        app.scroll_chat_to_bottom();
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let chat_text = if app.chat.transcript().is_empty() && !app.chat.is_awaiting_reply() {
        Text::from(Span::styled(
            "Ask about admissions, courses, fees, facilities...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.chat.transcript().iter() {
            let (label, color) = match msg.sender {
                Sender::User => ("You:", Color::Cyan),
                Sender::Ai => ("AI:", Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            for line in msg.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        // At most one typing indicator, however many replies are outstanding
        if app.chat.is_awaiting_reply() {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Typing{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(frame, input_area, app.chat.input(), " Message ", true, true);

    let button = Paragraph::new(Line::from(" Send ".bold()))
        .style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    frame.render_widget(button, button_area);
}

fn render_admin_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, detail_area] = Layout::horizontal([
        Constraint::Percentage(45),
        Constraint::Percentage(55),
    ])
    .areas(area);

    let popup_open = app.admin.is_modal_open()
        || app.admin.pending_delete().is_some()
        || app.admin.notice().is_some();

    let mut title = format!(" FAQs ({}) ", app.admin.entries().len());
    if app.faqs_loading {
        title.push_str("loading... ");
    } else if app.crud_in_flight > 0 {
        title.push_str("saving... ");
    }

    let list_focused = app.admin_focus == AdminFocus::List;
    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if list_focused { Color::Cyan } else { Color::DarkGray }))
        .title(title);

    let items: Vec<ListItem> = app
        .admin
        .entries()
        .iter()
        .map(|entry| ListItem::new(format!(" #{} {} ", entry.id, entry.question)))
        .collect();

    let list = List::new(items)
        .block(list_block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.faq_state);

    let [answer_area, question_input, answer_input] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(detail_area);

    let answer = match app.selected_entry() {
        Some(entry) => Paragraph::new(entry.answer.as_str()),
        None => Paragraph::new("No FAQ selected").style(Style::default().fg(Color::DarkGray)),
    };
    let answer = answer
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Answer "));
    frame.render_widget(answer, answer_area);

    let form = app.admin.create_form();
    let question_focused = app.admin_focus == AdminFocus::CreateQuestion;
    let answer_focused = app.admin_focus == AdminFocus::CreateAnswer;
    render_input(
        frame,
        question_input,
        &form.question,
        " New question ",
        question_focused,
        question_focused && !popup_open,
    );
    render_input(
        frame,
        answer_input,
        &form.answer,
        " New answer (Ctrl+S to add) ",
        answer_focused,
        answer_focused && !popup_open,
    );
}

fn render_edit_modal(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 10, area);

    // Dim everything behind the dialog; that backdrop is the click-to-close overlay
    frame.buffer_mut().set_style(area, Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(Clear, popup_area);

    let Some(form) = app.admin.edit_form() else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Edit FAQ #{} ", form.id));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Close control in the top-right corner of the border
    let close_area = Rect::new(
        (popup_area.x + popup_area.width).saturating_sub(5),
        popup_area.y,
        3,
        1,
    );
    frame.render_widget(
        Paragraph::new("[x]").style(Style::default().fg(Color::Red).bold()),
        close_area,
    );

    let [question_area, answer_area, hint_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    let topmost = app.admin.pending_delete().is_none() && app.admin.notice().is_none();
    let on_question = app.modal_field == ModalField::Question;
    render_input(frame, question_area, &form.question, " Question ", on_question, on_question && topmost);
    render_input(frame, answer_area, &form.answer, " Answer ", !on_question, !on_question && topmost);

    frame.render_widget(
        Paragraph::new("Ctrl+S to save, Esc or click outside to close")
            .style(Style::default().fg(Color::DarkGray)),
        hint_area,
    );

    app.modal_area = Some(popup_area);
    app.modal_close_area = Some(close_area);
}

fn render_confirm_delete(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 5, area);
    frame.render_widget(Clear, popup_area);

    let text = Text::from(vec![
        Line::from(DELETE_PROMPT),
        Line::default(),
        Line::from(vec![
            Span::styled(" y ", Style::default().bg(Color::Red).fg(Color::White)),
            Span::raw(" delete   "),
            Span::styled(" n ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" cancel"),
        ]),
    ]);

    let popup = Paragraph::new(text).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Confirm "),
    );
    frame.render_widget(popup, popup_area);
}

fn render_notice(notice: &Notice, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 5, area);
    frame.render_widget(Clear, popup_area);

    let (color, title) = match notice {
        Notice::Success(_) => (Color::Green, " Done "),
        Notice::Error(_) => (Color::Red, " Error "),
    };

    let text = Text::from(vec![
        Line::from(notice.text().to_string()),
        Line::from(Span::styled(
            "Press Enter to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let popup = Paragraph::new(text).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title),
    );
    frame.render_widget(popup, popup_area);
}

/// Single-line input box that scrolls horizontally to keep the cursor visible
fn render_input(
    frame: &mut Frame,
    area: Rect,
    line: &InputLine,
    title: &str,
    focused: bool,
    show_cursor: bool,
) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = line.cursor();

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = line
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if show_cursor {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// A `width` x `height` rectangle centred in `area`, shrunk to fit
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(2));

    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}
