use std::{collections::VecDeque, ops::Range};

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use regex::{Regex, RegexBuilder};

use crate::kube::LogOptions;

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone)]
struct Search {
    query: String,
    regex: Regex,
    matches: Vec<usize>,
    current: usize,
}

impl Search {
    fn new(query: &str) -> Option<Self> {
        let regex = RegexBuilder::new(query)
            .case_insensitive(true)
            .build()
            .or_else(|_| {
                RegexBuilder::new(&regex::escape(query))
                    .case_insensitive(true)
                    .build()
            })
            .ok()?;

        Some(Self {
            query: query.to_string(),
            regex,
            matches: Vec::new(),
            current: 0,
        })
    }

    fn rebuild(&mut self, lines: &VecDeque<String>) {
        self.matches = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.regex.is_match(line))
            .map(|(i, _)| i)
            .collect();

        self.current = self.current.min(self.matches.len().saturating_sub(1));
    }
}

/// Scrollback of a single log source.
#[derive(Debug, Clone)]
pub struct LogViewer {
    title: String,
    lines: VecDeque<String>,
    max_lines: usize,
    tail_lines: i64,
    following: bool,
    timestamps: bool,
    /// Lines between the bottom of the buffer and the bottom of the view.
    scroll: usize,
    search: Option<Search>,
}

impl LogViewer {
    pub fn new(max_lines: usize, tail_lines: i64) -> Self {
        Self {
            title: String::new(),
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
            tail_lines,
            following: false,
            timestamps: false,
            scroll: 0,
            search: None,
        }
    }

    /// Switches to a new source; keeps the timestamps preference.
    pub fn reset(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.lines.clear();
        self.following = false;
        self.scroll = 0;
        self.search = None;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn options(&self) -> LogOptions {
        LogOptions {
            tail_lines: Some(self.tail_lines),
            timestamps: self.timestamps,
        }
    }

    /// Replaces the buffer with a fetched log.
    pub fn set_content(&mut self, content: &str) {
        self.lines.clear();
        self.scroll = 0;

        for line in content.lines() {
            self.lines.push_back(line.to_string());
        }

        self.trim();
        self.rebuild_search();
    }

    pub fn push_line(&mut self, line: String) {
        self.lines.push_back(line);

        if self.scroll > 0 {
            self.scroll += 1;
        }

        if self.trim() > 0 {
            self.rebuild_search();
            return;
        }

        if let Some(search) = &mut self.search {
            let index = self.lines.len() - 1;

            if self.lines.back().is_some_and(|l| search.regex.is_match(l)) {
                search.matches.push(index);
            }
        }
    }

    pub fn lines(&self) -> &VecDeque<String> {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
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

    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    pub fn toggle_timestamps(&mut self) -> bool {
        self.timestamps = !self.timestamps;
        self.timestamps
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Index of the first line shown in a view of `height` rows.
    pub fn first_visible(&self, height: usize) -> usize {
        self.lines
            .len()
            .saturating_sub(self.scroll)
            .saturating_sub(height)
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll = (self.scroll + n).min(self.lines.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
    }

    pub fn set_search(&mut self, query: &str) {
        if query.is_empty() {
            self.search = None;
            return;
        }

        self.search = Search::new(query);
        self.rebuild_search();
        self.jump_to_match();
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search.as_ref().map(|s| s.query.as_str())
    }

    pub fn is_match(&self, index: usize) -> bool {
        self.search
            .as_ref()
            .is_some_and(|s| s.matches.binary_search(&index).is_ok())
    }

    /// Byte ranges of the search hits within `line`.
    pub fn match_ranges(&self, line: &str) -> Vec<Range<usize>> {
        self.search.as_ref().map_or_else(Vec::new, |s| {
            s.regex
                .find_iter(line)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect()
        })
    }

    pub fn match_count(&self) -> usize {
        self.search.as_ref().map_or(0, |s| s.matches.len())
    }

    /// Line index of the current match.
    pub fn current_match(&self) -> Option<usize> {
        self.search
            .as_ref()
            .and_then(|s| s.matches.get(s.current).copied())
    }

    /// `current/total`, one-based.
    pub fn search_status(&self) -> Option<String> {
        let search = self.search.as_ref()?;

        if search.matches.is_empty() {
            return Some("0/0".to_string());
        }

        Some(format!("{}/{}", search.current + 1, search.matches.len()))
    }

    pub fn next_match(&mut self) {
        if let Some(search) = self.search.as_mut().filter(|s| !s.matches.is_empty()) {
            search.current = (search.current + 1) % search.matches.len();
        }

        self.jump_to_match();
    }

    pub fn prev_match(&mut self) {
        if let Some(search) = self.search.as_mut().filter(|s| !s.matches.is_empty()) {
            search.current = search
                .current
                .checked_sub(1)
                .unwrap_or(search.matches.len() - 1);
        }

        self.jump_to_match();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(1),
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(PAGE_SIZE),
            KeyCode::PageDown => self.scroll_down(PAGE_SIZE),
            KeyCode::Char('g') => self.scroll = self.lines.len().saturating_sub(1),
            KeyCode::Char('G') => self.scroll = 0,
            _ => return false,
        }

        true
    }

    fn jump_to_match(&mut self) {
        if let Some(index) = self.current_match() {
            self.scroll = self.lines.len().saturating_sub(index + 1);
        }
    }

    fn rebuild_search(&mut self) {
        if let Some(search) = self.search.as_mut() {
            search.rebuild(&self.lines);
        }
    }

    /// Drops the oldest lines over capacity and returns how many were dropped.
    fn trim(&mut self) -> usize {
        let over = self.lines.len().saturating_sub(self.max_lines);

        self.lines.drain(..over);
        self.scroll = self.scroll.min(self.lines.len().saturating_sub(1));

        over
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn viewer(content: &str) -> LogViewer {
        let mut viewer = LogViewer::new(100, 100);
        viewer.reset("default/web-7/app");
        viewer.set_content(content);
        viewer
    }

    #[test]
    fn 大文字小文字を区別せずに検索する() {
        let mut viewer = viewer(indoc! {"
            GET /healthz 200
            ERROR connection reset
            GET /api 200
            error: timeout
        "});

        viewer.set_search("error");

        assert_eq!(viewer.match_count(), 2);
        assert_eq!(viewer.current_match(), Some(1));
        assert_eq!(viewer.search_status().as_deref(), Some("1/2"));

        viewer.next_match();
        assert_eq!(viewer.current_match(), Some(3));

        viewer.next_match();
        assert_eq!(viewer.current_match(), Some(1));

        viewer.prev_match();
        assert_eq!(viewer.current_match(), Some(3));
        assert_eq!(viewer.search_status().as_deref(), Some("2/2"));
    }

    #[test]
    fn 不正な正規表現は文字列として検索する() {
        let mut viewer = viewer("panic at [main\nok\n");

        viewer.set_search("[main");

        assert_eq!(viewer.match_count(), 1);
    }

    #[test]
    fn 追加した行も検索対象になる() {
        let mut viewer = viewer("start\n");
        viewer.set_search("warn");

        viewer.push_line("WARN disk almost full".to_string());

        assert_eq!(viewer.match_count(), 1);
        assert!(viewer.is_match(1));
    }

    #[test]
    fn 上限を超えた古い行を捨てる() {
        let mut viewer = LogViewer::new(3, 100);

        for i in 0..5 {
            viewer.push_line(format!("line {}", i));
        }

        assert_eq!(
            viewer.lines().iter().collect::<Vec<_>>(),
            vec!["line 2", "line 3", "line 4"]
        );
    }

    #[test]
    fn スクロール中は表示位置を保つ() {
        let mut viewer = viewer("a\nb\nc\nd\n");
        viewer.scroll_up(2);

        viewer.push_line("e".to_string());

        assert_eq!(viewer.scroll(), 3);
        assert_eq!(viewer.first_visible(2), 0);

        viewer.set_following(true);

        assert_eq!(viewer.scroll(), 0);
    }

    #[test]
    fn リセットしてもタイムスタンプ設定は残る() {
        let mut viewer = viewer("a\n");
        viewer.toggle_timestamps();
        viewer.set_following(true);

        viewer.reset("default/web-8/app");

        assert!(viewer.is_empty());
        assert!(!viewer.is_following());
        assert_eq!(
            viewer.options(),
            LogOptions {
                tail_lines: Some(100),
                timestamps: true
            }
        );
    }

    #[test]
    fn ヒット範囲は正規表現の一致位置() {
        let mut viewer = viewer("GET /health 200\n");
        viewer.set_search("H[a-z]+");

        assert_eq!(viewer.match_ranges("GET /Health 200 health"), vec![5..11, 16..22]);
        assert_eq!(viewer.match_ranges("POST /api"), Vec::<Range<usize>>::new());
    }
}
