use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use yaml_rust::yaml::Hash;
use yaml_rust::Yaml;

lazy_static! {
    static ref ENTRY_RE: Regex = Regex::new(r"@(\w+)\s*\{([^,]+),").unwrap();
    static ref FIELD_RE: Regex = Regex::new(r"(\w+)\s*=\s*").unwrap();
    static ref LATEX_CMD_RE: Regex = Regex::new(r"\\[a-zA-Z]+\s*").unwrap();
    static ref AUTHOR_SEPARATOR_RE: Regex = Regex::new(r"\s+and\s+").unwrap();
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// One `@type{key, ...}` block. Field names are lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub kind: String,
    pub key: String,
    pub fields: BTreeMap<String, String>,
}

impl Entry {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub title: String,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    /// `YYYY` or `YYYY-MM`.
    pub date: String,
    pub doi: Option<String>,
    pub selected: bool,
}

impl Publication {
    /// CV entry with keys `title`, `authors`, `journal`, `date`, `doi`.
    pub fn to_yaml(&self) -> Yaml {
        let mut hash = Hash::new();
        hash.insert(key("title"), Yaml::String(self.title.clone()));
        hash.insert(
            key("authors"),
            Yaml::Array(self.authors.iter().cloned().map(Yaml::String).collect()),
        );
        if let Some(ref journal) = self.journal {
            hash.insert(key("journal"), Yaml::String(journal.clone()));
        }
        hash.insert(key("date"), Yaml::String(self.date.clone()));
        if let Some(ref doi) = self.doi {
            hash.insert(key("doi"), Yaml::String(doi.clone()));
        }
        Yaml::Hash(hash)
    }
}

fn key(s: &str) -> Yaml {
    Yaml::String(s.to_string())
}

/// Reads the `.bib` file at `path` and converts it into publications,
/// newest first.
pub fn load(path: &Path, owner_last_names: &[String]) -> Result<Vec<Publication>> {
    if !path.is_file() {
        return Err(Error::Bibliography(format!(
            "{} not found",
            path.display()
        )));
    }

    let text = fs::read_to_string(path)?;
    let entries = parse(&text);
    debug!("Parsed {} entries from {}", entries.len(), path.display());
    Ok(publications(&entries, owner_last_names))
}

/// Converts entries, dropping those without a title or year, and sorts the
/// result newest first. Entries sharing a date keep their file order.
pub fn publications(entries: &[Entry], owner_last_names: &[String]) -> Vec<Publication> {
    let mut publications = entries
        .iter()
        .filter_map(|entry| {
            let publication = to_publication(entry, owner_last_names);
            if publication.is_none() {
                debug!("Skipping {}: missing title or year", entry.key);
            }
            publication
        })
        .collect::<Vec<_>>();

    publications.sort_by(|a, b| b.date.cmp(&a.date));
    publications
}

pub fn parse(text: &str) -> Vec<Entry> {
    let bytes = text.as_bytes();
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let caps = match ENTRY_RE.captures(&text[pos..]) {
            Some(caps) => caps,
            None => break,
        };

        let kind = caps[1].to_lowercase();
        let key = caps[2].trim().to_string();
        let start = pos + caps.get(0).map_or(0, |m| m.end());

        let mut depth = 1;
        let mut i = start;
        while i < bytes.len() && depth > 0 {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            i += 1;
        }

        let body = match depth {
            0 => &text[start..i - 1],
            _ => {
                warn!("Unterminated entry {}", key);
                &text[start..]
            }
        };
        pos = i;

        entries.push(Entry {
            kind,
            key,
            fields: parse_fields(body),
        });
    }

    entries
}

fn parse_fields(body: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut pos = 0;

    while pos < body.len() {
        let caps = match FIELD_RE.captures(&body[pos..]) {
            Some(caps) => caps,
            None => break,
        };

        let name = caps[1].to_lowercase();
        let value_start = pos + caps.get(0).map_or(0, |m| m.end());
        let (value, value_end) = extract_value(body, value_start);
        fields.insert(name, value);
        pos = value_end;
    }

    fields
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

fn skip_separators(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (is_blank(bytes[i]) || bytes[i] == b',') {
        i += 1;
    }
    i
}

/// Reads a `{braced}`, `"quoted"` or bare value starting at `start` and
/// returns it with the offset just past it and its trailing separators.
fn extract_value(body: &str, start: usize) -> (String, usize) {
    let bytes = body.as_bytes();
    let mut i = start;
    while i < bytes.len() && is_blank(bytes[i]) {
        i += 1;
    }

    if i >= bytes.len() {
        return (String::new(), i);
    }

    match bytes[i] {
        b'{' => {
            let mut depth = 1;
            let mut j = i + 1;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            let end = if depth == 0 { j - 1 } else { j };
            (body[i + 1..end].to_string(), skip_separators(bytes, j))
        }
        b'"' => {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != b'"' {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            let end = j.min(bytes.len());
            let value = body[i + 1..end].to_string();
            (value, skip_separators(bytes, (j + 1).min(bytes.len())))
        }
        _ => {
            let mut j = i;
            while j < bytes.len() && !is_blank(bytes[j]) && bytes[j] != b',' && bytes[j] != b'}' {
                j += 1;
            }
            (body[i..j].to_string(), skip_separators(bytes, j))
        }
    }
}

/// Removes every pair of outer braces.
pub fn strip_braces(value: &str) -> &str {
    let mut value = value;
    while value.len() >= 2 && value.starts_with('{') && value.ends_with('}') {
        value = &value[1..value.len() - 1];
    }
    value
}

/// Maps the LaTeX commands that show up in titles and names to plain text.
pub fn clean_latex(value: &str) -> String {
    let value = value
        .replace(r"\flqq", "\u{ab}")
        .replace(r"\frqq", "\u{bb}")
        .replace(r"\dq", "\"")
        .replace('~', " ")
        .replace("--", "\u{2013}");
    let value = LATEX_CMD_RE.replace_all(&value, "");
    value.replace('{', "").replace('}', "").trim().to_string()
}

/// Splits an `author` field on `and`. `Last, First` becomes `First Last`;
/// parts with two or more commas are affiliations and are dropped.
pub fn parse_authors(raw: &str) -> Vec<String> {
    let mut names = Vec::new();

    for part in AUTHOR_SEPARATOR_RE.split(raw) {
        let part = part.trim();
        if part.is_empty() || part.matches(',').count() >= 2 {
            continue;
        }

        let name = match part.find(',') {
            Some(i) => format!("{} {}", part[i + 1..].trim(), part[..i].trim()),
            None => part.to_string(),
        };

        let name = clean_latex(&name);
        if !name.is_empty() {
            names.push(name);
        }
    }

    names
}

/// Wraps the site owner's name in `***` so the CV renders it bold.
pub fn emphasise_owner(authors: Vec<String>, owner_last_names: &[String]) -> Vec<String> {
    let owners = owner_last_names
        .iter()
        .map(|name| name.to_lowercase())
        .collect::<Vec<_>>();

    authors
        .into_iter()
        .map(|name| {
            let lowered = name.to_lowercase();
            match owners.iter().any(|owner| lowered.contains(owner.as_str())) {
                true => format!("***{}***", name),
                false => name,
            }
        })
        .collect()
}

/// Two-digit month from `jan`..`dec` or `1`..`12`.
pub fn resolve_month(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim().to_lowercase();

    if let Some(i) = MONTHS.iter().position(|m| *m == raw) {
        return Some(format!("{:02}", i + 1));
    }

    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<u32>() {
            if (1..=12).contains(&n) {
                return Some(format!("{:02}", n));
            }
        }
    }

    None
}

pub fn to_publication(entry: &Entry, owner_last_names: &[String]) -> Option<Publication> {
    let raw_title = entry.get("title").filter(|t| !t.is_empty())?;
    let raw_year = entry.get("year").filter(|y| !y.is_empty())?;

    let title = clean_latex(strip_braces(raw_title));
    let authors = emphasise_owner(
        parse_authors(entry.get("author").unwrap_or("")),
        owner_last_names,
    );

    let journal = entry
        .get("journal")
        .filter(|v| !v.is_empty())
        .or_else(|| entry.get("booktitle"))
        .map(|venue| clean_latex(strip_braces(venue)))
        .filter(|venue| !venue.is_empty());

    let year = raw_year.trim();
    let date = match resolve_month(entry.get("month")) {
        Some(month) => format!("{}-{}", year, month),
        None => year.to_string(),
    };

    let doi = entry
        .get("doi")
        .filter(|doi| !doi.is_empty())
        .map(|doi| strip_braces(doi).to_string());

    let selected = entry
        .get("selected")
        .map(|v| {
            let v = strip_braces(v).trim().to_lowercase();
            v == "true" || v == "yes"
        })
        .unwrap_or(false);

    Some(Publication {
        title,
        authors,
        journal,
        date,
        doi,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIB: &str = r#"
@article{einstein1905,
  title = {{On the Electrodynamics of Moving Bodies}},
  author = {Einstein, Albert and Rozhkov, Ivan},
  journal = {Annalen der Physik},
  year = 1905,
  month = jun,
  doi = {10.1002/andp.19053221004},
  selected = {true}
}

@inproceedings{talk2019,
  author = "Jane Doe and Lomonosov Moscow State University, Moscow, Russia",
  title = "A \"quoted\" talk",
  booktitle = {Proc. of {Things}},
  year = {2019},
}

@misc{draft,
  author = {Nobody},
}
"#;

    #[test]
    fn parses_entries_and_fields() {
        let entries = parse(BIB);
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].kind, "article");
        assert_eq!(entries[0].key, "einstein1905");
        assert_eq!(
            entries[0].get("title"),
            Some("{On the Electrodynamics of Moving Bodies}")
        );
        assert_eq!(entries[0].get("year"), Some("1905"));
        assert_eq!(entries[0].get("month"), Some("jun"));

        assert_eq!(entries[1].kind, "inproceedings");
        assert_eq!(entries[1].get("title"), Some(r#"A \"quoted\" talk"#));
        assert_eq!(entries[1].get("booktitle"), Some("Proc. of {Things}"));
        assert_eq!(entries[1].get("year"), Some("2019"));
    }

    #[test]
    fn converts_and_sorts_publications() {
        let owners = vec!["Rozhkov".to_string()];
        let pubs = publications(&parse(BIB), &owners);
        assert_eq!(pubs.len(), 2);

        assert_eq!(pubs[0].date, "2019");
        assert_eq!(pubs[0].authors, vec!["Jane Doe"]);
        assert_eq!(pubs[0].journal.as_deref(), Some("Proc. of Things"));
        assert!(!pubs[0].selected);

        assert_eq!(pubs[1].title, "On the Electrodynamics of Moving Bodies");
        assert_eq!(pubs[1].authors, vec!["Albert Einstein", "***Ivan Rozhkov***"]);
        assert_eq!(pubs[1].journal.as_deref(), Some("Annalen der Physik"));
        assert_eq!(pubs[1].date, "1905-06");
        assert_eq!(pubs[1].doi.as_deref(), Some("10.1002/andp.19053221004"));
        assert!(pubs[1].selected);
    }

    #[test]
    fn equal_dates_keep_file_order() {
        let bib = "@a{x, title={First}, year={2020}}\n@a{y, title={Second}, year={2020}}\n";
        let pubs = publications(&parse(bib), &[]);
        let titles = pubs.iter().map(|p| p.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn cleans_latex() {
        assert_eq!(clean_latex(r"\flqq Hi\frqq"), "\u{ab} Hi\u{bb}");
        assert_eq!(clean_latex(r"pages 1--2"), "pages 1\u{2013}2");
        assert_eq!(clean_latex(r"\textbf{Bold}~text"), "Bold text");
        assert_eq!(clean_latex(r"say \dq{}hi\dq{}"), "say \"hi\"");
    }

    #[test]
    fn strips_nested_outer_braces() {
        assert_eq!(strip_braces("{{Title}}"), "Title");
        assert_eq!(strip_braces("{A} and {B}"), "A} and {B");
        assert_eq!(strip_braces("plain"), "plain");
    }

    #[test]
    fn resolves_months() {
        assert_eq!(resolve_month(Some("Mar")), Some("03".to_string()));
        assert_eq!(resolve_month(Some("11")), Some("11".to_string()));
        assert_eq!(resolve_month(Some("7")), Some("07".to_string()));
        assert_eq!(resolve_month(Some("13")), None);
        assert_eq!(resolve_month(Some("spring")), None);
        assert_eq!(resolve_month(None), None);
    }

    #[test]
    fn owner_match_ignores_case() {
        let authors = vec!["Иван Рожков".to_string(), "A. Other".to_string()];
        let owners = vec!["рожков".to_string()];
        assert_eq!(
            emphasise_owner(authors, &owners),
            vec!["***Иван Рожков***", "A. Other"]
        );
    }

    #[test]
    fn cv_yaml_skips_missing_fields() {
        let publication = Publication {
            title: "T".into(),
            authors: vec!["A".into()],
            journal: None,
            date: "2020".into(),
            doi: None,
            selected: true,
        };
        let yaml = publication.to_yaml();
        let hash = yaml.as_hash().unwrap();
        let keys = hash.keys().filter_map(Yaml::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["title", "authors", "date"]);
    }
}
