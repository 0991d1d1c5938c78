//! Desktop entry discovery for the application launcher.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

use crate::launcher::{AppEntry, Category};

/// Freedesktop main categories and their display names, in display order.
pub const CATEGORY_MAP: &[(&str, &str)] = &[
    ("AudioVideo", "Multimedia"),
    ("Audio", "Audio"),
    ("Video", "Video"),
    ("Development", "Development"),
    ("Education", "Education"),
    ("Game", "Games"),
    ("Graphics", "Graphics"),
    ("Network", "Internet"),
    ("Office", "Office"),
    ("Science", "Science"),
    ("Settings", "Settings"),
    ("System", "System"),
    ("Utility", "Utilities"),
    ("GTK", "GTK Apps"),
    ("Qt", "Qt Apps"),
    ("XFCE", "XFCE Apps"),
    ("GNOME", "GNOME Apps"),
    ("KDE", "KDE Apps"),
];

const FALLBACK_CATEGORY: &str = "Utilities";

/// The fields of a `.desktop` file the launcher uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: String,
    pub exec: String,
    pub categories: Vec<String>,
}

impl DesktopEntry {
    /// Display name of the first category that maps.
    pub fn display_category(&self) -> &'static str {
        self.categories
            .iter()
            .find_map(|c| {
                CATEGORY_MAP
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(c))
                    .map(|&(_, display)| display)
            })
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

fn field_codes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%[fFuUdDnNickvm]").expect("static regex"))
}

/// Strip field codes from an `Exec` value and collapse whitespace.
pub fn clean_exec(exec: &str) -> String {
    let stripped = field_codes().replace_all(exec, "");
    let stripped = stripped.replace("%%", "%");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the `[Desktop Entry]` group. Returns `None` for entries the
/// launcher must not show.
pub fn parse_desktop_entry(text: &str) -> Option<DesktopEntry> {
    let mut in_main = false;
    let mut name = None;
    let mut exec = None;
    let mut kind = None;
    let mut categories = Vec::new();
    let mut hidden = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_main = line == "[Desktop Entry]";
            continue;
        }
        if !in_main {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Exec" => exec = Some(clean_exec(value)),
            "Type" => kind = Some(value.to_string()),
            "Categories" => {
                categories = value
                    .split(';')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
            },
            "Hidden" | "NoDisplay" => hidden |= value.eq_ignore_ascii_case("true"),
            _ => {},
        }
    }

    if hidden || kind.as_deref() != Some("Application") {
        return None;
    }
    let name = name.filter(|n| !n.is_empty())?;
    let exec = exec.filter(|e| !e.is_empty())?;
    if categories.is_empty() {
        categories.push("Utility".to_string());
    }
    Some(DesktopEntry {
        name,
        exec,
        categories,
    })
}

/// Scan directories for `.desktop` files. Later directories override
/// earlier ones for the same file name.
pub fn scan(dirs: &[PathBuf]) -> Vec<DesktopEntry> {
    let mut found: IndexMap<String, DesktopEntry> = IndexMap::new();
    for dir in dirs {
        for (file_name, entry) in scan_dir(dir) {
            found.insert(file_name, entry);
        }
    }
    debug!("Found {} desktop entries", found.len());
    found.into_values().collect()
}

fn scan_dir(dir: &Path) -> Vec<(String, DesktopEntry)> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            debug!("Skipping {:?}: {}", dir, e);
            return Vec::new();
        },
    };

    let mut paths: Vec<PathBuf> = read
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "desktop"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let text = fs::read_to_string(&path)
                .map_err(|e| warn!("Failed to read {:?}: {}", path, e))
                .ok()?;
            let entry = parse_desktop_entry(&text)?;
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            Some((file_name, entry))
        })
        .collect()
}

/// Group entries into launcher categories. Empty categories are dropped
/// and apps are sorted by name.
pub fn categorize(entries: &[DesktopEntry]) -> Vec<Category> {
    let mut buckets: IndexMap<&'static str, Vec<AppEntry>> = CATEGORY_MAP
        .iter()
        .map(|&(_, display)| (display, Vec::new()))
        .collect();

    for entry in entries {
        if let Some(bucket) = buckets.get_mut(entry.display_category()) {
            bucket.push(AppEntry {
                name: entry.name.clone(),
                command: entry.exec.clone(),
            });
        }
    }

    buckets
        .into_iter()
        .filter(|(_, apps)| !apps.is_empty())
        .map(|(name, mut apps)| {
            apps.sort_by_key(|a| a.name.to_lowercase());
            Category::new(name, apps)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIREFOX: &str = "\
[Desktop Entry]
Type=Application
Name=Firefox
Name[de]=Feuerfuchs
Exec=firefox %u
Categories=Network;WebBrowser;

[Desktop Action new-window]
Name=New Window
Exec=firefox --new-window %u
";

    #[test]
    fn test_parse_main_group_only() {
        let entry = parse_desktop_entry(FIREFOX).unwrap();
        assert_eq!(entry.name, "Firefox");
        assert_eq!(entry.exec, "firefox");
        assert_eq!(entry.display_category(), "Internet");
    }

    #[test]
    fn test_hidden_and_non_applications_skipped() {
        assert!(parse_desktop_entry("[Desktop Entry]\nType=Application\nName=A\nExec=a\nNoDisplay=true\n").is_none());
        assert!(parse_desktop_entry("[Desktop Entry]\nType=Link\nName=A\nExec=a\n").is_none());
        assert!(parse_desktop_entry("[Desktop Entry]\nType=Application\nName=A\n").is_none());
    }

    #[test]
    fn test_clean_exec() {
        assert_eq!(clean_exec("gimp-2.10  %U"), "gimp-2.10");
        assert_eq!(clean_exec("app --name %c --icon %i -x"), "app --name --icon -x");
        assert_eq!(clean_exec("printf 100%%"), "printf 100%");
    }

    #[test]
    fn test_first_mapped_category_wins() {
        let entry = DesktopEntry {
            name: "Editor".into(),
            exec: "editor".into(),
            categories: vec!["Qt".into(), "Development".into()],
        };
        assert_eq!(entry.display_category(), "Qt Apps");

        let entry = DesktopEntry {
            name: "Odd".into(),
            exec: "odd".into(),
            categories: vec!["X-Custom".into()],
        };
        assert_eq!(entry.display_category(), "Utilities");
    }

    #[test]
    fn test_categorize_drops_empty() {
        let entries = vec![
            DesktopEntry {
                name: "xterm".into(),
                exec: "xterm".into(),
                categories: vec!["System".into()],
            },
            DesktopEntry {
                name: "Firefox".into(),
                exec: "firefox".into(),
                categories: vec!["Network".into()],
            },
        ];
        let cats = categorize(&entries);
        let names: Vec<_> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Internet", "System"]);
    }

    #[test]
    fn test_scan_user_dir_overrides() {
        let system = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        fs::write(system.path().join("ff.desktop"), FIREFOX).unwrap();
        fs::write(
            user.path().join("ff.desktop"),
            "[Desktop Entry]\nType=Application\nName=My Firefox\nExec=firefox -P me\n",
        )
        .unwrap();
        fs::write(user.path().join("notes.txt"), "ignored").unwrap();

        let entries = scan(&[system.path().to_path_buf(), user.path().to_path_buf()]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "My Firefox");
        assert_eq!(entries[0].display_category(), "Utilities");
    }
}
