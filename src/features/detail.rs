use ratatui::crossterm::event::{KeyCode, KeyEvent};

/// Read-only pane showing one fetched resource.
#[derive(Debug)]
pub struct DetailPane<T> {
    item: Option<T>,
    scroll: u16,
}

impl<T> Default for DetailPane<T> {
    fn default() -> Self {
        Self {
            item: None,
            scroll: 0,
        }
    }
}

impl<T> DetailPane<T> {
    pub fn set(&mut self, item: T) {
        self.item = Some(item);
    }

    pub fn clear(&mut self) {
        self.item = None;
        self.scroll = 0;
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Char('g') => self.scroll = 0,
            _ => return false,
        }

        true
    }
}
