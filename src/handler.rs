use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::{Responder, StoryReply, CANNED_REPLY};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => app.scroll_to_bottom(),
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_response().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,

        // Return to the input box
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => submit_prompt(app),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete_char(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Dispatches an accepted submission to the configured responder. The
/// backend variant runs as a background task so the UI keeps drawing; the
/// canned variant settles on the spot.
fn submit_prompt(app: &mut App) {
    let Some(prompt) = app.submit() else {
        return;
    };

    match &app.responder {
        Responder::Backend(client) => {
            tracing::info!(prompt_len = prompt.len(), "submitting story prompt");
            let client = client.clone();
            app.task = Some(tokio::spawn(
                async move { client.tell_story(&prompt).await },
            ));
        }
        Responder::Canned => {
            app.settle(Ok(StoryReply::Story(CANNED_REPLY.to_string())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Sender;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::from(code))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn canned_responder_answers_immediately() {
        let mut app = App::new(Responder::Canned);
        type_text(&mut app, "a dragon story").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.messages.len(), 3); // greeting, user, canned reply
        assert_eq!(app.messages[1].sender, Sender::User);
        assert_eq!(app.messages[1].text, "a dragon story");
        assert_eq!(app.messages[2].text, CANNED_REPLY);
        assert!(!app.in_flight);
        assert!(app.task.is_none());
    }

    #[tokio::test]
    async fn enter_on_whitespace_does_nothing() {
        let mut app = App::new(Responder::Canned);
        type_text(&mut app, "   ").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.messages.len(), 1);
        assert!(app.task.is_none());
    }

    #[tokio::test]
    async fn enter_is_ignored_while_request_outstanding() {
        let mut app = App::new(Responder::Canned);
        app.in_flight = true;
        type_text(&mut app, "another idea").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.messages.len(), 1); // still just the greeting
        assert_eq!(app.input, "another idea");
        assert!(app.task.is_none());
    }

    #[tokio::test]
    async fn esc_leaves_editing_and_q_quits() {
        let mut app = App::new(Responder::Canned);
        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
        handle_event(&mut app, key(KeyCode::Char('q'))).await.unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_editing_mode() {
        let mut app = App::new(Responder::Canned);
        let event = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, event).await.unwrap();
        assert!(app.should_quit);
    }
}
