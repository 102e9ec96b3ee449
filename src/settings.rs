use crate::error::Result;
use config::{Config, File as ConfigFile, Value as ConfigValue};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

const PATH_FIELDS: [&str; 7] = [
    "page.path",
    "assets.path",
    "templates.path",
    "news.path",
    "posts.path",
    "bibliography.path",
    "cv.path",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub page_path: PathBuf,
    pub assets_path: PathBuf,
    /// URL prefix the rendered page loads `assets.path` files from.
    pub assets_url: String,
    pub templates_path: PathBuf,
    pub news_path: PathBuf,
    pub posts_path: PathBuf,
    pub bibliography_path: PathBuf,
    pub cv_path: PathBuf,
    pub owner_last_names: Vec<String>,
    pub minify: bool,
    pub social_links: BTreeMap<String, String>,
}

/// Defaults, then `./config/default`, then `./config/<FOLIO_ENV>`.
pub fn new() -> Result<Settings> {
    let pwd = env::current_dir()?;
    let mode = env::var("FOLIO_ENV").unwrap_or_else(|_| "development".into());
    load_from(&pwd, &mode)
}

/// Same layering as `new`, rooted at `root` instead of the working directory.
/// Relative paths come back joined onto `root`.
pub fn load_from(root: &Path, mode: &str) -> Result<Settings> {
    let mut config = default()?;
    merge_files(&mut config, root, mode)?;
    expand_paths(&mut config, root)?;
    Settings::from_config(&config)
}

pub fn default() -> Result<Config> {
    let mut config = Config::default();

    config.set_default("page.path", "_pages/about.md")?;
    config.set_default("assets.path", "assets/img")?;
    config.set_default("assets.url", "/assets/img")?;
    config.set_default("templates.path", "templates")?;
    config.set_default("news.path", "_news")?;
    config.set_default("posts.path", "_posts")?;
    config.set_default("bibliography.path", "_bibliography/papers.bib")?;
    config.set_default("cv.path", "_data/cv.yml")?;
    config.set_default("publications.owner_last_names", Vec::<String>::new())?;
    config.set_default("render.minify", true)?;

    Ok(config)
}

fn merge_files(config: &mut Config, root: &Path, mode: &str) -> Result<()> {
    let config_file = |name: &str| {
        let path = root.join("config").join(name);
        ConfigFile::with_name(&path.to_string_lossy()).required(false)
    };

    config.merge(config_file("default"))?;

    match mode {
        "development" | "production" => {
            config.merge(config_file(mode))?;
        }
        _ => warn!(
            "Ignoring FOLIO_ENV={}; default/development/production are the only valid config file names.",
            mode
        ),
    };

    Ok(())
}

fn expand_paths(config: &mut Config, root: &Path) -> Result<()> {
    for path_field in &PATH_FIELDS {
        let path_str = config.get_str(path_field)?;
        let path_buf = root.join(path_str);
        config.set(path_field, path_buf.to_string_lossy().into_owned())?;
    }

    Ok(())
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Settings> {
        let path = |key: &str| config.get_str(key).map(PathBuf::from);

        let owner_last_names = config
            .get_array("publications.owner_last_names")?
            .into_iter()
            .map(ConfigValue::into_str)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut social_links = BTreeMap::new();
        if let Ok(table) = config.get_table("social.links") {
            for (name, value) in table {
                match value.into_str() {
                    Ok(url) => {
                        social_links.insert(name, url);
                    }
                    Err(e) => warn!("Skipping social link {}: {}", name, e),
                }
            }
        }

        Ok(Settings {
            page_path: path("page.path")?,
            assets_path: path("assets.path")?,
            assets_url: config.get_str("assets.url")?,
            templates_path: path("templates.path")?,
            news_path: path("news.path")?,
            posts_path: path("posts.path")?,
            bibliography_path: path("bibliography.path")?,
            cv_path: path("cv.path")?,
            owner_last_names,
            minify: config.get_bool("render.minify")?,
            social_links,
        })
    }
}
