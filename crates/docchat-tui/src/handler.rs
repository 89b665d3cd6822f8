use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, InputMode};

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if app.show_context_prompt {
        handle_context_prompt(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal(app, key),
        InputMode::Editing => handle_editing(app, key),
    }
}

fn handle_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('f') => {
            app.context_input.clear();
            app.show_context_prompt = true;
        }
        KeyCode::Char('c') => {
            app.clear_chat();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_up();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_down();
        }
        KeyCode::Char('G') => {
            app.scroll_to_bottom();
        }
        _ => {}
    }
}

fn handle_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_question();
        }
        KeyCode::Backspace => {
            app.delete_char();
        }
        KeyCode::Left => {
            app.move_cursor_left();
        }
        KeyCode::Right => {
            app.move_cursor_right();
        }
        KeyCode::Home => {
            app.move_cursor_home();
        }
        KeyCode::End => {
            app.move_cursor_end();
        }
        KeyCode::Char(c) => {
            app.insert_char(c);
        }
        _ => {}
    }
}

fn handle_context_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_context_prompt = false;
        }
        KeyCode::Enter => {
            app.show_context_prompt = false;
            let path = app.context_input.clone();
            app.load_context(&path);
        }
        KeyCode::Backspace => {
            app.context_input.pop();
        }
        KeyCode::Char(c) => {
            app.context_input.push(c);
        }
        _ => {}
    }
}
