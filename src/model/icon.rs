//! Icon names used in node metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known icons. Unknown names map to [`Icon::Fallback`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Folder,
    Task,
    Note,
    Calendar,
    Chart,
    Gallery,
    Board,
    Star,
    Home,
    Settings,
    Fallback,
}

impl Icon {
    pub const ALL: [Icon; 11] = [
        Icon::Folder,
        Icon::Task,
        Icon::Note,
        Icon::Calendar,
        Icon::Chart,
        Icon::Gallery,
        Icon::Board,
        Icon::Star,
        Icon::Home,
        Icon::Settings,
        Icon::Fallback,
    ];

    /// Resolve an icon by name (case-insensitive, a few common aliases).
    pub fn from_name(name: &str) -> Icon {
        match name.trim().to_ascii_lowercase().as_str() {
            "folder" | "folder-open" => Icon::Folder,
            "task" | "check" | "check-square" | "checkbox" => Icon::Task,
            "note" | "file-text" | "sticky-note" => Icon::Note,
            "calendar" | "date" => Icon::Calendar,
            "chart" | "bar-chart" | "line-chart" | "pie-chart" => Icon::Chart,
            "gallery" | "image" | "images" => Icon::Gallery,
            "board" | "kanban" | "columns" => Icon::Board,
            "star" | "favorite" => Icon::Star,
            "home" | "house" => Icon::Home,
            "settings" | "gear" | "cog" => Icon::Settings,
            _ => Icon::Fallback,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Icon::Folder => "folder",
            Icon::Task => "task",
            Icon::Note => "note",
            Icon::Calendar => "calendar",
            Icon::Chart => "chart",
            Icon::Gallery => "gallery",
            Icon::Board => "board",
            Icon::Star => "star",
            Icon::Home => "home",
            Icon::Settings => "settings",
            Icon::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
