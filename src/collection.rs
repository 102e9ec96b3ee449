use crate::error::{Error, Result};
use crate::frontmatter;
use crate::markdown;
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};
use yaml_rust::Yaml;

/// A news entry or blog post listed on the about page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub title: Option<String>,
    pub date: String,
    pub permalink: Option<String>,
    pub content: String,
}

/// Loads every item under `dir`, newest first. Items that fail to parse are
/// logged and skipped; a missing directory yields no items.
pub fn load(dir: &Path) -> Vec<Item> {
    if !dir.is_dir() {
        info!("No collection at {}; skipping.", dir.display());
        return Vec::new();
    }

    let walker = WalkDir::new(dir)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter();
    let mut items = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Walking {}: {}", dir.display(), e);
                continue;
            }
        };

        if !is_item(&entry) {
            continue;
        }

        match parse_file_at(entry.path()) {
            Ok(item) => items.push(item),
            Err(e) => error!("For: {} - {}", entry.path().display(), e),
        }
    }

    items.sort_by(|a, b| b.date.cmp(&a.date));
    items
}

/// The first `limit` items, or all of them when there is no limit.
pub fn take(items: &[Item], limit: Option<usize>) -> &[Item] {
    match limit {
        Some(limit) => &items[..limit.min(items.len())],
        None => items,
    }
}

fn is_item(entry: &DirEntry) -> bool {
    let supported_extensions = ["md", "markdown", "html"];

    entry.file_type().is_file()
        && match entry.path().extension().and_then(|ext| ext.to_str()) {
            Some(ext) => supported_extensions.contains(&ext),
            None => false,
        }
}

fn parse_file_at(path: &Path) -> Result<Item> {
    let file_contents = fs::read_to_string(path)?;
    let split = frontmatter::split(&file_contents)?;
    let header = frontmatter::parse(split.header)?;

    let string = |key: &str| match &header[key] {
        Yaml::String(s) => Ok(Some(s.clone())),
        Yaml::Null | Yaml::BadValue => Ok(None),
        _ => Err(Error::schema(key, "expected a string")),
    };

    let date = string("date")?.ok_or_else(|| Error::schema("date", "missing required key"))?;

    let content = match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => split.body.to_string(),
        _ => markdown::from(split.body),
    };

    Ok(Item {
        title: string("title")?,
        date,
        permalink: string("permalink")?,
        content,
    })
}
