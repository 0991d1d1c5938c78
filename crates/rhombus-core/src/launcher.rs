//! Application launcher model.
//!
//! Categories of desktop applications with per-category expansion, a
//! search string with substring filtering, a scroll offset and the
//! vertical layout shared by hit-testing and drawing. All coordinates
//! here are launcher-local.

use crate::state::Point;

/// Search box band.
pub const SEARCH_TOP: i32 = 10;
pub const SEARCH_BOTTOM: i32 = 40;
/// Rows above this line are covered by the title strip.
pub const LIST_TOP: i32 = 65;
/// First category header before scrolling.
pub const FIRST_ROW: i32 = 75;
pub const ROW_HEIGHT: i32 = 20;
pub const HEADER_PITCH: i32 = 25;
pub const APP_PITCH: i32 = 20;
pub const CATEGORY_GAP: i32 = 5;
pub const BOTTOM_MARGIN: i32 = 20;
pub const SCROLL_STEP: i32 = 20;
/// Longest accepted search string.
pub const MAX_SEARCH_LEN: usize = 255;

/// A launchable application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub name: String,
    pub command: String,
}

/// A named group of applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub apps: Vec<AppEntry>,
    pub expanded: bool,
}

impl Category {
    pub fn new(name: &str, apps: Vec<AppEntry>) -> Self {
        Self {
            name: name.to_string(),
            apps,
            expanded: false,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.apps
            .iter()
            .any(|a| a.name.to_lowercase().contains(needle))
    }
}

/// What a launcher-local point lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherHit {
    SearchBox,
    Category(usize),
    App { category: usize, app: usize },
}

/// One laid-out row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LauncherRow {
    /// Top edge, launcher-local.
    pub y: i32,
    pub hit: LauncherHit,
}

#[derive(Debug, Clone, Default)]
pub struct Launcher {
    categories: Vec<Category>,
    search: String,
    search_mode: bool,
    scroll: i32,
    hover: Option<LauncherHit>,
}

impl Launcher {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .filter(|c| !c.apps.is_empty())
                .collect(),
            ..Self::default()
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub const fn search_mode(&self) -> bool {
        self.search_mode
    }

    pub const fn scroll(&self) -> i32 {
        self.scroll
    }

    pub const fn hover(&self) -> Option<LauncherHit> {
        self.hover
    }

    /// Update the hovered row, reporting whether it changed.
    pub fn set_hover(&mut self, hover: Option<LauncherHit>) -> bool {
        if self.hover == hover {
            false
        } else {
            self.hover = hover;
            true
        }
    }

    pub fn app(&self, category: usize, app: usize) -> Option<&AppEntry> {
        self.categories.get(category)?.apps.get(app)
    }

    pub fn toggle_search_mode(&mut self) -> bool {
        self.search_mode = !self.search_mode;
        self.search_mode
    }

    pub fn toggle_category(&mut self, index: usize) {
        if let Some(cat) = self.categories.get_mut(index) {
            cat.expanded = !cat.expanded;
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.search.len() < MAX_SEARCH_LEN {
            self.search.push(c);
            self.apply_filter();
        }
    }

    pub fn pop_char(&mut self) {
        if self.search.pop().is_some() {
            self.apply_filter();
        }
    }

    /// Clear the search string and leave search mode.
    pub fn cancel_search(&mut self) {
        self.search.clear();
        self.search_mode = false;
        self.apply_filter();
    }

    /// State reset applied whenever the launcher is hidden.
    pub fn reset(&mut self) {
        self.search.clear();
        self.search_mode = false;
        self.scroll = 0;
        self.hover = None;
    }

    /// Expand exactly the categories holding a match; everything when the
    /// search string is empty.
    pub fn apply_filter(&mut self) {
        let needle = self.search.to_lowercase();
        for cat in &mut self.categories {
            cat.expanded = needle.is_empty() || cat.matches(&needle);
        }
        self.scroll = 0;
    }

    /// First application, in display order, whose name contains the search string.
    pub fn first_match(&self) -> Option<&AppEntry> {
        if self.search.is_empty() {
            return None;
        }
        let needle = self.search.to_lowercase();
        self.categories
            .iter()
            .flat_map(|c| c.apps.iter())
            .find(|a| a.name.to_lowercase().contains(&needle))
    }

    /// Total list height if nothing were cut off.
    fn content_height(&self) -> i32 {
        self.categories
            .iter()
            .map(|c| {
                let apps = if c.expanded { c.apps.len() as i32 } else { 0 };
                HEADER_PITCH + apps * APP_PITCH + CATEGORY_GAP
            })
            .sum()
    }

    /// Scroll by `delta` pixels, clamped to the content.
    pub fn scroll_by(&mut self, delta: i32, height: u32) {
        let visible = (height as i32 - BOTTOM_MARGIN - FIRST_ROW).max(0);
        let max = (self.content_height() - visible).max(0);
        self.scroll = (self.scroll + delta).clamp(0, max);
    }

    /// Visible rows for a launcher of the given height.
    pub fn rows(&self, height: u32) -> Vec<LauncherRow> {
        let limit = height as i32 - BOTTOM_MARGIN;
        let mut rows = Vec::new();
        let mut y = FIRST_ROW - self.scroll;

        for (ci, cat) in self.categories.iter().enumerate() {
            if y >= LIST_TOP {
                rows.push(LauncherRow {
                    y,
                    hit: LauncherHit::Category(ci),
                });
            }
            y += HEADER_PITCH;

            if cat.expanded {
                for ai in 0..cat.apps.len() {
                    if y >= LIST_TOP {
                        rows.push(LauncherRow {
                            y,
                            hit: LauncherHit::App {
                                category: ci,
                                app: ai,
                            },
                        });
                    }
                    y += APP_PITCH;
                }
            }

            y += CATEGORY_GAP;
            if y > limit {
                break;
            }
        }
        rows
    }

    /// Hit-test a launcher-local point. Bounds are inclusive.
    pub fn hit_test(&self, p: Point, width: u32, height: u32) -> Option<LauncherHit> {
        if p.x < 0 || p.x > width as i32 || p.y < 0 || p.y > height as i32 {
            return None;
        }
        if (SEARCH_TOP..=SEARCH_BOTTOM).contains(&p.y) {
            return Some(LauncherHit::SearchBox);
        }
        if p.y < LIST_TOP {
            return None;
        }
        self.rows(height)
            .into_iter()
            .find(|row| p.y >= row.y && p.y <= row.y + ROW_HEIGHT)
            .map(|row| row.hit)
    }
}
