use std::collections::BTreeSet;

use ratatui::crossterm::event::{KeyCode, KeyEvent};

use crate::kube::EventSummary;

const PAGE_SIZE: usize = 10;

/// Namespace events, newest first.
#[derive(Debug, Clone)]
pub struct EventViewer {
    events: Vec<EventSummary>,
    following: bool,
    warnings_only: bool,
    kind_filter: Option<String>,
    scroll: usize,
}

impl Default for EventViewer {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            following: true,
            warnings_only: false,
            kind_filter: None,
            scroll: 0,
        }
    }
}

impl EventViewer {
    pub fn set_events(&mut self, mut events: Vec<EventSummary>) {
        events.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));

        self.events = events;

        if self
            .kind_filter
            .as_ref()
            .is_some_and(|kind| !self.events.iter().any(|e| e.object_kind == *kind))
        {
            self.kind_filter = None;
        }

        self.scroll = self.scroll.min(self.visible().len().saturating_sub(1));
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.scroll = 0;
    }

    pub fn visible(&self) -> Vec<&EventSummary> {
        self.events
            .iter()
            .filter(|e| !self.warnings_only || e.is_warning())
            .filter(|e| {
                self.kind_filter
                    .as_ref()
                    .is_none_or(|kind| e.object_kind == *kind)
            })
            .collect()
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.events
            .iter()
            .map(|e| e.object_kind.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn toggle_following(&mut self) -> bool {
        self.following = !self.following;
        self.following
    }

    pub fn set_following(&mut self, following: bool) {
        self.following = following;
    }

    pub fn warnings_only(&self) -> bool {
        self.warnings_only
    }

    pub fn toggle_warnings_only(&mut self) -> bool {
        self.warnings_only = !self.warnings_only;
        self.scroll = 0;
        self.warnings_only
    }

    pub fn kind_filter(&self) -> Option<&str> {
        self.kind_filter.as_deref()
    }

    /// `all` → each kind present → `all`.
    pub fn cycle_kind_filter(&mut self) -> Option<&str> {
        let next = {
            let kinds = self.kinds();

            match &self.kind_filter {
                None => kinds.first().map(|k| k.to_string()),
                Some(current) => kinds
                    .iter()
                    .position(|k| k == current)
                    .and_then(|i| kinds.get(i + 1))
                    .map(|k| k.to_string()),
            }
        };

        self.kind_filter = next;
        self.scroll = 0;

        self.kind_filter.as_deref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let max = self.visible().len().saturating_sub(1);

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll = (self.scroll + 1).min(max),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = (self.scroll + PAGE_SIZE).min(max),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(PAGE_SIZE),
            KeyCode::Char('g') => self.scroll = 0,
            KeyCode::Char('G') => self.scroll = max,
            _ => return false,
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn event(kind: &str, name: &str, type_: &str, minute: u32) -> EventSummary {
        EventSummary {
            type_: type_.to_string(),
            object_kind: kind.to_string(),
            object_name: name.to_string(),
            last_seen: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()),
            ..Default::default()
        }
    }

    fn names(viewer: &EventViewer) -> Vec<&str> {
        viewer
            .visible()
            .into_iter()
            .map(|e| e.object_name.as_str())
            .collect()
    }

    fn viewer() -> EventViewer {
        let mut viewer = EventViewer::default();
        viewer.set_events(vec![
            event("Pod", "web-7", "Warning", 1),
            event("Deployment", "web", "Normal", 3),
            event("Pod", "web-8", "Normal", 2),
        ]);
        viewer
    }

    #[test]
    fn 新しい順に並べる() {
        assert_eq!(names(&viewer()), vec!["web", "web-8", "web-7"]);
    }

    #[test]
    fn フォローは初期状態で有効() {
        assert!(EventViewer::default().is_following());
    }

    #[test]
    fn 警告のみ表示する() {
        let mut viewer = viewer();
        viewer.toggle_warnings_only();

        assert_eq!(names(&viewer), vec!["web-7"]);
    }

    #[test]
    fn 種別フィルタを順に切り替える() {
        let mut viewer = viewer();

        assert_eq!(viewer.cycle_kind_filter(), Some("Deployment"));
        assert_eq!(names(&viewer), vec!["web"]);

        assert_eq!(viewer.cycle_kind_filter(), Some("Pod"));
        assert_eq!(names(&viewer), vec!["web-8", "web-7"]);

        assert_eq!(viewer.cycle_kind_filter(), None);
        assert_eq!(names(&viewer).len(), 3);
    }

    #[test]
    fn 存在しない種別のフィルタは解除する() {
        let mut viewer = viewer();
        viewer.cycle_kind_filter();

        viewer.set_events(vec![event("Pod", "web-9", "Normal", 4)]);

        assert_eq!(viewer.kind_filter(), None);
    }
}
