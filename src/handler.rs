use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Control chords first; plain characters go to the input buffer.
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('b') => app.toggle_browsing(),
            KeyCode::Char('r') => app.reset_memory(),
            KeyCode::Char('u') => {
                app.input.clear();
                app.cursor = 0;
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit_input(),

        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                app.cursor += 1;
            }
        }
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.chars().count(),

        KeyCode::Up | KeyCode::PageUp => app.scroll_up(),
        KeyCode::Down | KeyCode::PageDown => app.scroll_down(),

        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::ScrollDown => app.scroll_down(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::conversation::ChatMessage;
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<ChatMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(ApiClient::new("http://127.0.0.1:9"), tx), rx)
    }

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[tokio::test]
    async fn typing_inserts_at_cursor() {
        let (mut app, _rx) = test_app();
        for c in "héllo".chars() {
            handle_event(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(app.input, "héllo");
        assert_eq!(app.cursor, 5);

        // Move left twice and insert in the middle of a multibyte string
        handle_event(&mut app, press(KeyCode::Left)).unwrap();
        handle_event(&mut app, press(KeyCode::Left)).unwrap();
        handle_event(&mut app, press(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.input, "hélxlo");
    }

    #[tokio::test]
    async fn backspace_removes_multibyte_chars() {
        let (mut app, _rx) = test_app();
        app.input = "héllo".to_string();
        app.cursor = 2;
        handle_event(&mut app, press(KeyCode::Backspace)).unwrap();
        assert_eq!(app.input, "hllo");
        assert_eq!(app.cursor, 1);
    }

    #[tokio::test]
    async fn ctrl_b_toggles_browsing() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, ctrl('b')).unwrap();
        assert!(app.enable_browsing);
    }

    #[tokio::test]
    async fn ctrl_r_clears_history() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, ctrl('r')).unwrap();
        assert_eq!(app.conversation.len(), 0);
    }

    #[tokio::test]
    async fn ctrl_c_and_esc_quit() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, ctrl('c')).unwrap();
        assert!(app.should_quit);

        let (mut app, _rx) = test_app();
        handle_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn enter_with_whitespace_input_sends_nothing() {
        let (mut app, _rx) = test_app();
        app.input = " \t ".to_string();
        handle_event(&mut app, press(KeyCode::Enter)).unwrap();
        assert_eq!(app.conversation.len(), 1);
        assert!(!app.is_loading());
    }
}
