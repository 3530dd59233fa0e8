use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const PAGE_SIZE: usize = 10;

/// Row type of a [`ListModel`].
pub trait ListItem {
    /// Stable identity used to keep the selection across refreshes.
    fn key(&self) -> &str;

    fn filter_value(&self) -> String {
        self.key().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterState {
    #[default]
    Off,
    /// The query is being typed; every key goes to the filter.
    Editing(String),
    Applied(String),
}

impl FilterState {
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Off => None,
            Self::Editing(query) | Self::Applied(query) => Some(query),
        }
    }
}

pub struct ListModel<T> {
    items: Vec<T>,
    visible: Vec<usize>,
    selected: usize,
    filter: FilterState,
    matcher: SkimMatcherV2,
}

impl<T: std::fmt::Debug> std::fmt::Debug for ListModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListModel")
            .field("items", &self.items)
            .field("visible", &self.visible)
            .field("selected", &self.selected)
            .field("filter", &self.filter)
            .field("matcher", &"SkimMatcherV2")
            .finish()
    }
}

impl<T> Default for ListModel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            visible: Vec::new(),
            selected: 0,
            filter: FilterState::Off,
            matcher: SkimMatcherV2::default(),
        }
    }
}

impl<T: ListItem> ListModel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rows, keeping the selected key when it is still present.
    pub fn set_items(&mut self, items: Vec<T>) {
        let selected_key = self.selected().map(|item| item.key().to_string());

        self.items = items;
        self.apply_filter();

        if let Some(key) = selected_key {
            let position = self.visible_items().position(|item| item.key() == key);

            if let Some(index) = position {
                self.selected = index;
            }
        }

        self.clamp();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.visible.clear();
        self.selected = 0;
        self.filter = FilterState::Off;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &T> + '_ {
        self.visible.iter().filter_map(|i| self.items.get(*i))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn selected(&self) -> Option<&T> {
        self.visible
            .get(self.selected)
            .and_then(|i| self.items.get(*i))
    }

    /// Position of the selection among the visible rows.
    pub fn selected_index(&self) -> Option<usize> {
        (!self.visible.is_empty()).then_some(self.selected)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn is_filter_editing(&self) -> bool {
        matches!(self.filter, FilterState::Editing(_))
    }

    pub fn start_filter(&mut self) {
        let query = self.filter.query().unwrap_or_default().to_string();

        self.filter = FilterState::Editing(query);
    }

    pub fn clear_filter(&mut self) {
        self.filter = FilterState::Off;
        self.apply_filter();
        self.clamp();
    }

    pub fn select_next(&mut self, n: usize) {
        self.selected = self.selected.saturating_add(n);
        self.clamp();
    }

    pub fn select_prev(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    /// Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let FilterState::Editing(query) = &mut self.filter {
            match key.code {
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    query.push(c);
                }
                KeyCode::Backspace => {
                    query.pop();
                }
                KeyCode::Enter => {
                    self.filter = if query.is_empty() {
                        FilterState::Off
                    } else {
                        FilterState::Applied(std::mem::take(query))
                    };
                }
                KeyCode::Esc => {
                    self.filter = FilterState::Off;
                }
                _ => return true,
            }

            self.apply_filter();
            self.clamp();

            return true;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.select_next(1),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(1),
            KeyCode::Char('g') | KeyCode::Home => self.select_first(),
            KeyCode::Char('G') | KeyCode::End => self.select_last(),
            KeyCode::PageDown => self.select_next(PAGE_SIZE),
            KeyCode::PageUp => self.select_prev(PAGE_SIZE),
            KeyCode::Char('/') => self.start_filter(),
            KeyCode::Esc if matches!(self.filter, FilterState::Applied(_)) => self.clear_filter(),
            _ => return false,
        }

        true
    }

    fn apply_filter(&mut self) {
        let Some(query) = self.filter.query().filter(|q| !q.is_empty()) else {
            self.visible = (0..self.items.len()).collect();
            return;
        };

        let mut scored: Vec<(i64, usize)> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                self.matcher
                    .fuzzy_match(&item.filter_value(), query)
                    .map(|score| (score, i))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));

        self.visible = scored.into_iter().map(|(_, i)| i).collect();
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.visible.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str);

    impl ListItem for Item {
        fn key(&self) -> &str {
            self.0
        }
    }

    fn model(names: &[&'static str]) -> ListModel<Item> {
        let mut model = ListModel::new();
        model.set_items(names.iter().copied().map(Item).collect());
        model
    }

    fn keys(model: &ListModel<Item>) -> Vec<&str> {
        model.visible_items().map(|item| item.0).collect()
    }

    fn type_keys(model: &mut ListModel<Item>, keys: &str) {
        for c in keys.chars() {
            model.handle_key(KeyEvent::from(KeyCode::Char(c)));
        }
    }

    #[test]
    fn 更新後も選択中のキーを維持する() {
        let mut model = model(&["api", "db", "web"]);
        model.select_next(2);

        model.set_items(vec![Item("cache"), Item("web"), Item("api")]);

        assert_eq!(model.selected(), Some(&Item("web")));
    }

    #[test]
    fn 選択中の項目が消えたら範囲内に収める() {
        let mut model = model(&["api", "db", "web"]);
        model.select_last();

        model.set_items(vec![Item("api")]);

        assert_eq!(model.selected(), Some(&Item("api")));
    }

    #[test]
    fn 入力中はすべてのキーをフィルタに渡す() {
        let mut model = model(&["web-7", "db-0", "web-8"]);

        assert!(model.handle_key(KeyEvent::from(KeyCode::Char('/'))));
        type_keys(&mut model, "wb");

        assert!(model.is_filter_editing());
        assert_eq!(model.filter(), &FilterState::Editing("wb".to_string()));
        assert_eq!(keys(&model).len(), 2);
        assert!(keys(&model).iter().all(|k| k.starts_with("web")));

        model.handle_key(KeyEvent::from(KeyCode::Enter));

        assert_eq!(model.filter(), &FilterState::Applied("wb".to_string()));
        assert!(!model.is_filter_editing());
    }

    #[test]
    fn escで適用済みフィルタを解除する() {
        let mut model = model(&["web-7", "db-0"]);

        model.handle_key(KeyEvent::from(KeyCode::Char('/')));
        type_keys(&mut model, "db");
        model.handle_key(KeyEvent::from(KeyCode::Enter));

        assert_eq!(keys(&model), vec!["db-0"]);

        assert!(model.handle_key(KeyEvent::from(KeyCode::Esc)));
        assert_eq!(model.filter(), &FilterState::Off);
        assert_eq!(keys(&model), vec!["web-7", "db-0"]);

        assert!(!model.handle_key(KeyEvent::from(KeyCode::Esc)));
    }

    #[test]
    fn 空のクエリで確定するとフィルタを解除する() {
        let mut model = model(&["web-7"]);

        model.handle_key(KeyEvent::from(KeyCode::Char('/')));
        model.handle_key(KeyEvent::from(KeyCode::Enter));

        assert_eq!(model.filter(), &FilterState::Off);
    }

    #[test]
    fn カーソル移動() {
        let mut model = model(&["a", "b", "c"]);

        model.handle_key(KeyEvent::from(KeyCode::Char('j')));
        assert_eq!(model.selected_index(), Some(1));

        model.handle_key(KeyEvent::from(KeyCode::Char('G')));
        assert_eq!(model.selected_index(), Some(2));

        model.handle_key(KeyEvent::from(KeyCode::Down));
        assert_eq!(model.selected_index(), Some(2));

        model.handle_key(KeyEvent::from(KeyCode::PageUp));
        assert_eq!(model.selected_index(), Some(0));

        assert!(!model.handle_key(KeyEvent::from(KeyCode::Char('x'))));
    }

    #[test]
    fn 空のリストは選択を持たない() {
        let model: ListModel<Item> = ListModel::new();

        assert_eq!(model.selected(), None);
        assert_eq!(model.selected_index(), None);
    }
}
