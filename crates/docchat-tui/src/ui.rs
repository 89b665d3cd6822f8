use docchat_core::Sender;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};

pub fn render(app: &mut App, frame: &mut Frame) {
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_context_prompt {
        render_context_prompt(app, frame, frame.area());
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let context_indicator = match &app.context_file {
        Some(name) => format!(" [context: {}]", name),
        None => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" docchat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(context_indicator, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Chat ");
    let inner = block.inner(area);

    // Remember the viewport so scroll_to_bottom can estimate wrapping
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let in_flight = app.controller.in_flight();
    let messages = app.controller.messages();

    let chat_text = if messages.is_empty() && !in_flight {
        Text::from(Span::styled(
            "Ask a question... (i to type, f to load a context file)",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in messages {
            let label_color = match msg.sender {
                Sender::User => Color::Cyan,
                Sender::Bot => Color::Yellow,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}:", msg.sender.label()),
                    Style::default()
                        .fg(label_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(
                    msg.timestamp.clone(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            for text_line in msg.text.lines() {
                lines.push(Line::from(text_line.to_string()));
            }
            lines.push(Line::default());
        }

        if in_flight {
            lines.push(Line::from(Span::styled(
                "Bot:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let (border_color, title) = match app.input_mode {
        InputMode::Editing => (Color::Green, " Question (Enter to send, Esc to stop typing) "),
        InputMode::Normal => (Color::DarkGray, " Question (i to type) "),
    };

    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing && !app.show_context_prompt {
        frame.set_cursor_position((area.x + 1 + app.cursor as u16, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let line = if let Some(err) = app.controller.last_error() {
        Line::from(Span::styled(
            format!(" {} ", err),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            " i type · f context file · c clear · j/k scroll · q quit ",
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_context_prompt(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Load context file (.txt, .pdf, .docx) ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Path to a file. Enter to load, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input = Paragraph::new(app.context_input.as_str());
    frame.render_widget(input, Rect::new(inner.x, inner.y + 2, inner.width, 1));

    frame.set_cursor_position((
        inner.x + app.context_input.chars().count() as u16,
        inner.y + 2,
    ));
}
