use crate::bibliography::Publication;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use yaml_rust::yaml::Hash;
use yaml_rust::{Yaml, YamlEmitter, YamlLoader};

const SECTION_NAME: &str = "Publications";

/// Replaces `cv.sections.Publications` in the CV file at `path` and writes the
/// file back. Returns how many publications were written.
pub fn inject(path: &Path, publications: &[Publication]) -> Result<usize> {
    if !path.is_file() {
        return Err(Error::Cv(format!("{} not found", path.display())));
    }

    let text = fs::read_to_string(path)?;
    let updated = inject_str(&text, publications)?;
    fs::write(path, updated)?;

    info!(
        "Injected {} publications into {}",
        publications.len(),
        path.display()
    );
    Ok(publications.len())
}

/// Same as `inject` but on the CV source text; other keys keep their order.
pub fn inject_str(text: &str, publications: &[Publication]) -> Result<String> {
    let mut doc = YamlLoader::load_from_str(text)?
        .into_iter()
        .next()
        .unwrap_or(Yaml::Null);

    set_publications(&mut doc, publications)?;

    let mut out = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut out);
        emitter
            .dump(&doc)
            .map_err(|e| Error::Cv(format!("failed to emit YAML: {:?}", e)))?;
    }
    if out.starts_with("---\n") {
        out.drain(..4);
    }
    out.push('\n');
    Ok(out)
}

fn set_publications(doc: &mut Yaml, publications: &[Publication]) -> Result<()> {
    let cv = match doc {
        Yaml::Hash(root) => match root.get_mut(&key("cv")) {
            Some(Yaml::Hash(cv)) => cv,
            _ => return Err(Error::Cv("missing top-level `cv` mapping".into())),
        },
        _ => return Err(Error::Cv("missing top-level `cv` mapping".into())),
    };

    let sections = replace_or_insert(cv, "sections", |existing| match existing {
        None | Some(Yaml::Null) => Ok(Yaml::Hash(Hash::new())),
        Some(Yaml::Hash(_)) => Ok(existing.cloned().unwrap_or(Yaml::Null)),
        Some(_) => Err(Error::Cv("`cv.sections` must be a mapping".into())),
    })?;

    if let Yaml::Hash(sections) = sections {
        let list = Yaml::Array(publications.iter().map(Publication::to_yaml).collect());
        replace_or_insert(sections, SECTION_NAME, |_| Ok(list))?;
    }

    Ok(())
}

/// Sets `name` to the value `make` derives from the current one. An existing
/// key keeps its position in the mapping.
fn replace_or_insert<'a, F>(hash: &'a mut Hash, name: &str, make: F) -> Result<&'a mut Yaml>
where
    F: FnOnce(Option<&Yaml>) -> Result<Yaml>,
{
    let k = key(name);
    let value = make(hash.get(&k))?;

    if !hash.contains_key(&k) {
        hash.insert(k.clone(), Yaml::Null);
    }

    match hash.get_mut(&k) {
        Some(slot) => {
            *slot = value;
            Ok(slot)
        }
        None => Err(Error::Cv(format!("failed to set `{}`", name))),
    }
}

fn key(s: &str) -> Yaml {
    Yaml::String(s.to_string())
}
