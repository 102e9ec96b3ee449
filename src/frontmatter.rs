use crate::error::{Error, Result};
use yaml_rust::{Yaml, YamlLoader};

const DELIMITER: &str = "---";

/// A document cut into its YAML header and the untouched body after it.
#[derive(Debug, PartialEq)]
pub struct Split<'a> {
    pub header: &'a str,
    pub body: &'a str,
}

/// Finds the `---` delimited header at the top of `content`.
///
/// The opening delimiter must be the first line. The header runs until the
/// next line that is exactly `---`; everything after that line is the body,
/// byte for byte.
pub fn split(content: &str) -> Result<Split<'_>> {
    let err = || Error::schema("", "failed to find frontmatter");

    let first_line_end = match content.find('\n') {
        Some(i) => i,
        None => return Err(err()),
    };

    if trim_line(&content[..first_line_end]) != DELIMITER {
        return Err(err());
    }

    let header_start = first_line_end + 1;
    let mut line_start = header_start;

    while line_start <= content.len() {
        let rest = &content[line_start..];
        let (line, next) = match rest.find('\n') {
            Some(i) => (&rest[..i], line_start + i + 1),
            None => (rest, content.len() + 1),
        };

        if trim_line(line) == DELIMITER {
            let body_start = next.min(content.len());
            return Ok(Split {
                header: &content[header_start..line_start],
                body: &content[body_start..],
            });
        }

        line_start = next;
    }

    Err(err())
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches('\r').trim_end()
}

/// Parses the header as a single YAML document. An empty header is null.
pub fn parse(header: &str) -> Result<Yaml> {
    let mut docs = YamlLoader::load_from_str(header)?;
    match docs.len() {
        0 => Ok(Yaml::Null),
        1 => Ok(docs.remove(0)),
        _ => Err(Error::schema("", "frontmatter holds more than one YAML document")),
    }
}
