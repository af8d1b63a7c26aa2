use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Sender};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, footer_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);
    render_input(app, frame, input_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Story Time ", Style::default().fg(Color::Magenta).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    // Inner dimensions feed the wrap-aware scroll math
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.messages {
        match msg.sender {
            Sender::User => {
                lines.push(
                    Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
                for line in msg.text.lines() {
                    lines.push(
                        Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::Cyan),
                        ))
                        .alignment(Alignment::Right),
                    );
                }
                lines.push(Line::default());
            }
            Sender::Bot => {
                lines.push(Line::from(Span::styled(
                    "Storyteller:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.in_flight {
        lines.push(Line::from(Span::styled(
            "Storyteller:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
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

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let line = if let Some(err) = &app.last_error {
        Line::from(Span::styled(
            format!(" {} ", err),
            Style::default().fg(Color::Red),
        ))
    } else {
        let hints = match app.input_mode {
            InputMode::Editing => " Enter: send | Esc: scroll mode | Ctrl-C: quit ",
            InputMode::Normal => " j/k: scroll | g/G: top/bottom | i: type | q: quit ",
        };
        Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let (title, border_color) = if app.in_flight {
        (" Thinking... ", Color::DarkGray)
    } else if app.input_mode == InputMode::Editing {
        (" What story would you like to hear? ", Color::Yellow)
    } else {
        (" What story would you like to hear? ", Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible in long prompts
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 || app.cursor < inner_width {
        0
    } else {
        app.cursor - inner_width + 1
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing && !app.in_flight {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
