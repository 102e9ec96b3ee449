use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageConfig {
    pub layout: Layout,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub permalink: String,
    pub profile: Option<Profile>,
    pub selected_papers: bool,
    pub social: bool,
    pub announcements: Section,
    pub latest_posts: Section,
    pub biography: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    About,
    Archive,
    Bib,
    Cv,
    Default,
    Distill,
    Page,
    Post,
}

impl Layout {
    pub const ALL: [Layout; 8] = [
        Layout::About,
        Layout::Archive,
        Layout::Bib,
        Layout::Cv,
        Layout::Default,
        Layout::Distill,
        Layout::Page,
        Layout::Post,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::About => "about",
            Layout::Archive => "archive",
            Layout::Bib => "bib",
            Layout::Cv => "cv",
            Layout::Default => "default",
            Layout::Distill => "distill",
            Layout::Page => "page",
            Layout::Post => "post",
        }
    }

    /// Name of the template that renders this layout.
    pub fn template_name(self) -> String {
        format!("{}.html", self.as_str())
    }
}

impl FromStr for Layout {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::ALL
            .iter()
            .copied()
            .find(|layout| layout.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub align: Align,
    pub image: Option<String>,
    pub image_circular: bool,
    pub more_info: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            align: Align::Right,
            image: None,
            image_circular: false,
            more_info: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Right => "right",
        }
    }
}

impl FromStr for Align {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Align::Left),
            "right" => Ok(Align::Right),
            _ => Err(()),
        }
    }
}

/// Behaviour of an optional list section such as news or latest posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub enabled: bool,
    pub scrollable: bool,
    /// `None` shows every item.
    pub limit: Option<usize>,
}
