use std::collections::VecDeque;

use ratatui::crossterm::event::{KeyCode, KeyEvent};

use crate::stream::SourceKey;

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiLogLine {
    Header(String),
    Line(String),
}

/// Interleaved scrollback of several sources in arrival order.
///
/// A header is inserted whenever the source of an appended line differs from
/// the source of the previous one.
#[derive(Debug, Clone)]
pub struct MultiLogViewer {
    sources: Vec<SourceKey>,
    lines: VecDeque<MultiLogLine>,
    last_source: Option<SourceKey>,
    header_count: usize,
    max_lines: usize,
    following: bool,
    scroll: usize,
}

impl MultiLogViewer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            sources: Vec::new(),
            lines: VecDeque::new(),
            last_source: None,
            header_count: 0,
            max_lines: max_lines.max(1),
            following: true,
            scroll: 0,
        }
    }

    pub fn reset(&mut self, sources: Vec<SourceKey>) {
        self.sources = sources;
        self.lines.clear();
        self.last_source = None;
        self.header_count = 0;
        self.following = true;
        self.scroll = 0;
    }

    pub fn sources(&self) -> &[SourceKey] {
        &self.sources
    }

    pub fn push(&mut self, source: &SourceKey, line: &str) {
        let line = line.trim_end_matches(['\n', '\r']);

        if line.is_empty() {
            return;
        }

        if self.last_source.as_ref() != Some(source) {
            self.lines
                .push_back(MultiLogLine::Header(format!("==> {} <==", source)));
            self.header_count += 1;
            self.last_source = Some(source.clone());
        }

        self.lines.push_back(MultiLogLine::Line(line.to_string()));

        if self.scroll > 0 {
            self.scroll += 1;
        }

        let over = self.lines.len().saturating_sub(self.max_lines);
        self.lines.drain(..over);
        self.scroll = self.scroll.min(self.lines.len().saturating_sub(1));
    }

    pub fn lines(&self) -> &VecDeque<MultiLogLine> {
        &self.lines
    }

    /// Headers inserted since the last reset.
    pub fn header_count(&self) -> usize {
        self.header_count
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn set_following(&mut self, following: bool) {
        self.following = following;

        if following {
            self.scroll = 0;
        }
    }

    pub fn toggle_following(&mut self) -> bool {
        self.set_following(!self.following);
        self.following
    }

    pub fn first_visible(&self, height: usize) -> usize {
        self.lines
            .len()
            .saturating_sub(self.scroll)
            .saturating_sub(height)
    }

    /// Manual scrolling leaves follow mode; `G` re-enters it.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let max = self.lines.len().saturating_sub(1);

        match key.code {
            KeyCode::Char('k') | KeyCode::Up => self.scroll = (self.scroll + 1).min(max),
            KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageUp => self.scroll = (self.scroll + PAGE_SIZE).min(max),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(PAGE_SIZE),
            KeyCode::Char('g') => self.scroll = max,
            KeyCode::Char('G') => {
                self.set_following(true);
                return true;
            }
            _ => return false,
        }

        self.following = false;

        true
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn key(pod: &str) -> SourceKey {
        SourceKey::container(pod, "app")
    }

    #[test]
    fn ソースが変わったときだけヘッダーを挿入する() {
        let mut viewer = MultiLogViewer::new(100);
        viewer.reset(vec![key("web-7"), key("web-8")]);

        viewer.push(&key("web-7"), "a");
        viewer.push(&key("web-7"), "b");
        viewer.push(&key("web-8"), "c");
        viewer.push(&key("web-7"), "d");

        assert_eq!(
            viewer.lines().iter().cloned().collect::<Vec<_>>(),
            vec![
                MultiLogLine::Header("==> web-7/app <==".to_string()),
                MultiLogLine::Line("a".to_string()),
                MultiLogLine::Line("b".to_string()),
                MultiLogLine::Header("==> web-8/app <==".to_string()),
                MultiLogLine::Line("c".to_string()),
                MultiLogLine::Header("==> web-7/app <==".to_string()),
                MultiLogLine::Line("d".to_string()),
            ]
        );
    }

    #[rstest]
    #[case::single_source(&["a", "a", "a"], 1)]
    #[case::alternating(&["a", "b", "a", "b"], 4)]
    #[case::grouped(&["a", "a", "b", "b", "c"], 3)]
    #[case::return_to_first(&["a", "b", "b", "a"], 3)]
    fn ヘッダー数は隣接するソースの変化数と一致する(
        #[case] sources: &[&str],
        #[case] expected: usize,
    ) {
        let mut viewer = MultiLogViewer::new(100);

        for source in sources {
            viewer.push(&key(source), "line");
        }

        let changes = 1 + sources.windows(2).filter(|w| w[0] != w[1]).count();

        assert_eq!(viewer.header_count(), expected);
        assert_eq!(viewer.header_count(), changes);
    }

    #[test]
    fn 空行は追加しない() {
        let mut viewer = MultiLogViewer::new(100);

        viewer.push(&key("web-7"), "\n");
        viewer.push(&key("web-7"), "");

        assert!(viewer.lines().is_empty());
        assert_eq!(viewer.header_count(), 0);
    }

    #[test]
    fn 手動スクロールでフォローを解除する() {
        let mut viewer = MultiLogViewer::new(100);
        viewer.push(&key("web-7"), "a");
        viewer.push(&key("web-7"), "b");

        assert!(viewer.is_following());

        viewer.handle_key(KeyEvent::from(KeyCode::Up));

        assert!(!viewer.is_following());

        viewer.handle_key(KeyEvent::from(KeyCode::Char('G')));

        assert!(viewer.is_following());
        assert_eq!(viewer.first_visible(10), 0);
    }
}
