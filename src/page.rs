use crate::error::{Error, Result};
use crate::frontmatter;
use crate::models::{Align, Layout, PageConfig, Profile, Section};
use std::convert::TryFrom;
use std::fs;
use std::path::{Component, Path};
use std::str::FromStr;
use yaml_rust::yaml::Hash;
use yaml_rust::{Yaml, YamlEmitter};

const PAGE_KEYS: [&str; 9] = [
    "layout",
    "title",
    "subtitle",
    "permalink",
    "profile",
    "selected_papers",
    "social",
    "announcements",
    "latest_posts",
];
const PROFILE_KEYS: [&str; 4] = ["align", "image", "image_circular", "more_info"];
const SECTION_KEYS: [&str; 3] = ["enabled", "scrollable", "limit"];

/// Reads and validates the page document at `path`.
pub fn load(path: &Path) -> Result<PageConfig> {
    let contents = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents)
}

/// Parses a front matter document into a validated `PageConfig`.
pub fn parse(document: &str) -> Result<PageConfig> {
    let split = frontmatter::split(document)?;
    let header = frontmatter::parse(split.header)?;
    let fields = Fields::new("", &header)?;
    fields.check_keys(&PAGE_KEYS)?;

    let layout_name = fields.required_string("layout")?;
    let layout = layout_name.parse::<Layout>().map_err(|_| {
        Error::schema(
            fields.path("layout"),
            format!("unknown layout `{}`", layout_name),
        )
    })?;

    let permalink = fields.required_string("permalink")?;
    if let Err(reason) = validate_permalink(&permalink) {
        return Err(Error::schema(fields.path("permalink"), reason));
    }

    let profile = match fields.get("profile") {
        Some(yaml) => Some(parse_profile(&Fields::new("profile", yaml)?)?),
        None => None,
    };

    Ok(PageConfig {
        layout,
        title: fields.string("title")?,
        subtitle: fields.string("subtitle")?,
        permalink,
        profile,
        selected_papers: fields.boolean("selected_papers")?,
        social: fields.boolean("social")?,
        announcements: parse_section(&fields, "announcements")?,
        latest_posts: parse_section(&fields, "latest_posts")?,
        biography: split.body.to_string(),
    })
}

fn parse_profile(fields: &Fields) -> Result<Profile> {
    fields.check_keys(&PROFILE_KEYS)?;

    let align = match fields.string("align")? {
        Some(align) => align.parse::<Align>().map_err(|_| {
            Error::schema(
                fields.path("align"),
                format!("expected `left` or `right`, found `{}`", align),
            )
        })?,
        None => Align::Right,
    };

    let image = fields.string("image")?;
    if let Some(ref image) = image {
        if image.trim().is_empty() {
            return Err(Error::schema(fields.path("image"), "must not be empty"));
        }
    }

    Ok(Profile {
        align,
        image,
        image_circular: fields.boolean("image_circular")?,
        more_info: fields.string("more_info")?,
    })
}

fn parse_section(parent: &Fields, key: &str) -> Result<Section> {
    let yaml = match parent.get(key) {
        Some(yaml) => yaml,
        None => return Ok(Section::default()),
    };

    let fields = Fields::new(&parent.path(key), yaml)?;
    fields.check_keys(&SECTION_KEYS)?;

    Ok(Section {
        enabled: fields.boolean("enabled")?,
        scrollable: fields.boolean("scrollable")?,
        limit: fields.limit("limit")?,
    })
}

/// Checks that `permalink` is an absolute URL path without query, fragment,
/// whitespace, empty segments or dot segments. A trailing slash is allowed.
pub fn validate_permalink(permalink: &str) -> std::result::Result<(), String> {
    if !permalink.starts_with('/') {
        return Err(format!("`{}` must start with `/`", permalink));
    }

    if let Some(c) = permalink
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || *c == '?' || *c == '#')
    {
        return Err(format!("`{}` contains invalid character {:?}", permalink, c));
    }

    let rest = &permalink[1..];
    let inner = rest.strip_suffix('/').unwrap_or(rest);
    if inner.is_empty() {
        return match rest.is_empty() {
            true => Ok(()),
            false => Err(format!("`{}` contains an empty segment", permalink)),
        };
    }

    for segment in inner.split('/') {
        match segment {
            "" => return Err(format!("`{}` contains an empty segment", permalink)),
            "." | ".." => {
                return Err(format!("`{}` contains a `{}` segment", permalink, segment))
            }
            _ => {}
        }
    }

    Ok(())
}

impl PageConfig {
    /// Fails with a reference error when `profile.image` does not name a file
    /// inside `assets_dir`.
    pub fn check_references(&self, assets_dir: &Path) -> Result<()> {
        let image = match self.profile.as_ref().and_then(|p| p.image.as_ref()) {
            Some(image) => image,
            None => return Ok(()),
        };

        let escapes = Path::new(image).components().any(|component| match component {
            Component::Normal(_) | Component::CurDir => false,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => true,
        });
        if escapes {
            return Err(Error::schema(
                "profile.image",
                format!("`{}` must be a relative path inside the assets directory", image),
            ));
        }

        let path = assets_dir.join(image);
        if path.is_file() {
            Ok(())
        } else {
            Err(Error::Reference {
                key: "profile.image".to_string(),
                path,
            })
        }
    }

    /// Front matter header as YAML, keys in canonical order.
    pub fn to_yaml(&self) -> Yaml {
        let mut hash = Hash::new();
        insert(&mut hash, "layout", string(self.layout.as_str()));
        if let Some(ref title) = self.title {
            insert(&mut hash, "title", string(title));
        }
        if let Some(ref subtitle) = self.subtitle {
            insert(&mut hash, "subtitle", string(subtitle));
        }
        insert(&mut hash, "permalink", string(&self.permalink));

        if let Some(ref profile) = self.profile {
            let mut p = Hash::new();
            insert(&mut p, "align", string(profile.align.as_str()));
            if let Some(ref image) = profile.image {
                insert(&mut p, "image", string(image));
            }
            insert(&mut p, "image_circular", Yaml::Boolean(profile.image_circular));
            if let Some(ref more_info) = profile.more_info {
                insert(&mut p, "more_info", string(more_info));
            }
            insert(&mut hash, "profile", Yaml::Hash(p));
        }

        insert(&mut hash, "selected_papers", Yaml::Boolean(self.selected_papers));
        insert(&mut hash, "social", Yaml::Boolean(self.social));
        insert(&mut hash, "announcements", section_to_yaml(&self.announcements));
        insert(&mut hash, "latest_posts", section_to_yaml(&self.latest_posts));

        Yaml::Hash(hash)
    }

    /// Serializes back into a front matter document that `parse` accepts.
    pub fn to_document(&self) -> Result<String> {
        let mut header = String::new();
        {
            let mut emitter = YamlEmitter::new(&mut header);
            emitter
                .dump(&self.to_yaml())
                .map_err(|e| Error::schema("", format!("failed to emit YAML: {:?}", e)))?;
        }

        let mut document = String::with_capacity(header.len() + self.biography.len() + 8);
        document.push_str(&header);
        document.push_str("\n---\n");
        document.push_str(&self.biography);
        Ok(document)
    }
}

impl FromStr for PageConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

fn section_to_yaml(section: &Section) -> Yaml {
    let mut hash = Hash::new();
    insert(&mut hash, "enabled", Yaml::Boolean(section.enabled));
    insert(&mut hash, "scrollable", Yaml::Boolean(section.scrollable));
    let limit = match section.limit {
        Some(limit) => Yaml::Integer(limit as i64),
        None => Yaml::Null,
    };
    insert(&mut hash, "limit", limit);
    Yaml::Hash(hash)
}

fn insert(hash: &mut Hash, key: &str, value: Yaml) {
    hash.insert(string(key), value);
}

fn string(s: &str) -> Yaml {
    Yaml::String(s.to_string())
}

/// A YAML mapping together with the key path that leads to it.
struct Fields<'a> {
    prefix: String,
    hash: Option<&'a Hash>,
}

impl<'a> Fields<'a> {
    fn new(prefix: &str, yaml: &'a Yaml) -> Result<Self> {
        let hash = match yaml {
            Yaml::Hash(hash) => Some(hash),
            Yaml::Null => None,
            _ => return Err(Error::schema(prefix, "expected a mapping")),
        };

        Ok(Fields {
            prefix: prefix.to_string(),
            hash,
        })
    }

    fn path(&self, key: &str) -> String {
        match self.prefix.is_empty() {
            true => key.to_string(),
            false => format!("{}.{}", self.prefix, key),
        }
    }

    fn check_keys(&self, allowed: &[&str]) -> Result<()> {
        let hash = match self.hash {
            Some(hash) => hash,
            None => return Ok(()),
        };

        for key in hash.keys() {
            match key.as_str() {
                Some(name) if allowed.contains(&name) => {}
                Some(name) => return Err(Error::schema(self.path(name), "unknown key")),
                None => {
                    return Err(Error::schema(
                        self.prefix.as_str(),
                        format!("keys must be strings, found {:?}", key),
                    ))
                }
            }
        }

        Ok(())
    }

    /// The value under `key`; an explicit null counts as absent.
    fn get(&self, key: &str) -> Option<&'a Yaml> {
        self.hash
            .and_then(|hash| hash.get(&Yaml::String(key.to_string())))
            .filter(|yaml| !yaml.is_null())
    }

    fn string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            Some(Yaml::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::schema(
                self.path(key),
                format!("expected a string, found {}", describe(other)),
            )),
            None => Ok(None),
        }
    }

    fn required_string(&self, key: &str) -> Result<String> {
        self.string(key)?
            .ok_or_else(|| Error::schema(self.path(key), "missing required key"))
    }

    fn boolean(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            Some(Yaml::Boolean(b)) => Ok(*b),
            Some(other) => Err(Error::schema(
                self.path(key),
                format!("expected a boolean, found {}", describe(other)),
            )),
            None => Ok(false),
        }
    }

    fn limit(&self, key: &str) -> Result<Option<usize>> {
        match self.get(key) {
            Some(Yaml::Integer(n)) if *n < 0 => Err(Error::schema(
                self.path(key),
                format!("must not be negative, found {}", n),
            )),
            Some(Yaml::Integer(n)) => usize::try_from(*n)
                .map(Some)
                .map_err(|_| Error::schema(self.path(key), format!("{} is too large", n))),
            Some(other) => Err(Error::schema(
                self.path(key),
                format!("expected an integer, found {}", describe(other)),
            )),
            None => Ok(None),
        }
    }
}

fn describe(yaml: &Yaml) -> String {
    match yaml {
        Yaml::Real(r) => format!("number {}", r),
        Yaml::Integer(i) => format!("integer {}", i),
        Yaml::String(s) => format!("string {:?}", s),
        Yaml::Boolean(b) => format!("boolean {}", b),
        Yaml::Array(_) => "a sequence".to_string(),
        Yaml::Hash(_) => "a mapping".to_string(),
        Yaml::Alias(_) => "an alias".to_string(),
        Yaml::Null => "null".to_string(),
        Yaml::BadValue => "an invalid value".to_string(),
    }
}
