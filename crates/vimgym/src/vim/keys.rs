//! Terminal key events to logical key names.
//!
//! Names use Vim's key notation so a dispatched command can be sent to the
//! engine as-is. A literal `<` becomes `<LT>` so it is never read as the
//! start of a key code.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Translates a key event, or returns `None` for keys with no Vim meaning.
///
/// Only presses are translated; release and repeat events yield `None`.
pub fn translate_key(key: KeyEvent) -> Option<String> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let name = match key.code {
        KeyCode::Esc => "<Esc>".to_string(),
        KeyCode::Enter => "<CR>".to_string(),
        KeyCode::Tab => "<Tab>".to_string(),
        KeyCode::BackTab => "<S-Tab>".to_string(),
        KeyCode::Backspace => "<BS>".to_string(),
        KeyCode::Delete => "<Del>".to_string(),
        KeyCode::Up => "<Up>".to_string(),
        KeyCode::Down => "<Down>".to_string(),
        KeyCode::Left => "<Left>".to_string(),
        KeyCode::Right => "<Right>".to_string(),
        KeyCode::Home => "<Home>".to_string(),
        KeyCode::End => "<End>".to_string(),
        KeyCode::PageUp => "<PageUp>".to_string(),
        KeyCode::PageDown => "<PageDown>".to_string(),
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            // Terminals report Ctrl-[ as Esc already; anything else is <C-x>.
            format!("<C-{}>", c.to_ascii_lowercase())
        }
        KeyCode::Char('<') => "<LT>".to_string(),
        KeyCode::Char(c) => c.to_string(),
        _ => return None,
    };
    Some(name)
}
