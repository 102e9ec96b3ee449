use folio::render::{Inputs, Renderer};
use folio::{bibliography, collection, cv, page, Error};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ABOUT: &str = "---
layout: about
title: about
permalink: /
subtitle: Researcher at <a href='https://example.org'>Example Lab</a>

profile:
  align: right
  image: prof_pic.jpg
  image_circular: true

selected_papers: true
social: false

announcements:
  enabled: true
  scrollable: false
  limit: 2

latest_posts:
  enabled: false
---

I study **things**.
";

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_page_and_checks_profile_image() {
    let site = TempDir::new().unwrap();
    write(site.path(), "_pages/about.md", ABOUT);

    let page = page::load(&site.path().join("_pages/about.md")).unwrap();
    assert_eq!(page.biography, "\nI study **things**.\n");

    let assets = site.path().join("assets/img");
    fs::create_dir_all(&assets).unwrap();
    match page.check_references(&assets) {
        Err(Error::Reference { key, path }) => {
            assert_eq!(key, "profile.image");
            assert_eq!(path, assets.join("prof_pic.jpg"));
        }
        other => panic!("expected a reference error, got {:?}", other),
    }

    write(&assets, "prof_pic.jpg", "not really a jpeg");
    page.check_references(&assets).unwrap();
}

#[test]
fn missing_page_file_names_the_path() {
    let site = TempDir::new().unwrap();
    let missing = site.path().join("nope.md");
    match page::load(&missing) {
        Err(err @ Error::Read { .. }) => {
            assert!(err.to_string().contains(&missing.display().to_string()));
        }
        other => panic!("expected a read error, got {:?}", other),
    }
}

#[test]
fn collections_are_newest_first_and_skip_bad_items() {
    let site = TempDir::new().unwrap();
    let news = site.path().join("_news");
    write(&news, "a.md", "---\ndate: 2023-05-01\n---\nOld news with a [link](/x/).\n");
    write(&news, "b.md", "---\ndate: 2024-01-10\ntitle: Joined\npermalink: /news/joined/\n---\n");
    write(&news, "broken.md", "no front matter here\n");
    write(&news, "dateless.md", "---\ntitle: Missing date\n---\n");
    write(&news, "notes.txt", "---\ndate: 2025-01-01\n---\n");

    let items = collection::load(&news);
    let dates = items.iter().map(|i| i.date.as_str()).collect::<Vec<_>>();
    assert_eq!(dates, vec!["2024-01-10", "2023-05-01"]);
    assert_eq!(items[0].title.as_deref(), Some("Joined"));
    assert_eq!(items[0].permalink.as_deref(), Some("/news/joined/"));
    assert!(items[1].content.contains("<a href=\"/x/\">link</a>"));
}

#[test]
fn publications_are_injected_into_the_cv() {
    let site = TempDir::new().unwrap();
    write(
        site.path(),
        "_bibliography/papers.bib",
        "@article{a, title={Older}, author={Doe, Jane}, year={2019}}\n\
         @article{b, title={Newer}, author={Roe, Rick and Doe, Jane}, journal={J}, year={2021}, month={mar}}\n\
         @misc{c, author={No Title}}\n",
    );
    write(
        site.path(),
        "_data/cv.yml",
        "cv:\n  name: Jane Doe\n  sections:\n    Education:\n      - PhD\n",
    );

    let owners = vec!["doe".to_string()];
    let pubs = bibliography::load(&site.path().join("_bibliography/papers.bib"), &owners).unwrap();
    assert_eq!(pubs.len(), 2);
    assert_eq!(pubs[0].title, "Newer");
    assert_eq!(pubs[0].date, "2021-03");
    assert_eq!(pubs[0].authors, vec!["Rick Roe", "***Jane Doe***"]);

    let cv_path = site.path().join("_data/cv.yml");
    assert_eq!(cv::inject(&cv_path, &pubs).unwrap(), 2);

    let text = fs::read_to_string(&cv_path).unwrap();
    let doc = yaml_rust::YamlLoader::load_from_str(&text).unwrap().remove(0);
    assert_eq!(doc["cv"]["name"].as_str(), Some("Jane Doe"));
    assert_eq!(doc["cv"]["sections"]["Education"][0].as_str(), Some("PhD"));
    assert_eq!(
        doc["cv"]["sections"]["Publications"][1]["title"].as_str(),
        Some("Older")
    );
    assert!(doc["cv"]["sections"]["Publications"][1]["journal"].is_badvalue());
}

#[test]
fn missing_bibliography_is_reported() {
    let site = TempDir::new().unwrap();
    assert!(matches!(
        bibliography::load(&site.path().join("papers.bib"), &[]),
        Err(Error::Bibliography(_))
    ));
}

#[test]
fn renders_a_site_page_end_to_end() {
    let site = TempDir::new().unwrap();
    let news = site.path().join("_news");
    write(&news, "1.md", "---\ndate: 2024-03-01\ntitle: Third\n---\n");
    write(&news, "2.md", "---\ndate: 2024-02-01\ntitle: Second\n---\n");
    write(&news, "3.md", "---\ndate: 2024-01-01\ntitle: First\n---\n");

    let page: folio::PageConfig = ABOUT.parse().unwrap();
    let publications = bibliography::publications(
        &bibliography::parse("@article{s, title={Picked}, year={2020}, selected={true}}"),
        &[],
    );
    let inputs = Inputs {
        news: collection::load(&news),
        publications,
        ..Inputs::default()
    };

    let renderer = Renderer::new(&site.path().join("templates"), false).unwrap();
    let html = renderer.render(&page, &inputs).unwrap();
    assert!(html.contains("<strong>things</strong>"));
    assert!(html.contains("Third"));
    assert!(html.contains("Second"));
    assert!(!html.contains("First"));
    assert!(html.contains("Picked"));
    assert!(!html.contains("latest-posts"));
    assert!(!html.contains("class=\"social\""));
}

#[test]
fn site_templates_override_the_builtin_layout() {
    let site = TempDir::new().unwrap();
    let templates = site.path().join("templates");
    write(&templates, "about.html", "<main>{{ page.permalink }}|{{ biography | safe }}</main>");

    let page: folio::PageConfig = "---\nlayout: about\npermalink: /me/\n---\nhi".parse().unwrap();
    let renderer = Renderer::new(&templates, false).unwrap();
    let html = renderer.render(&page, &Inputs::default()).unwrap();
    assert_eq!(html, "<main>&#x2F;me&#x2F;|<p>hi</p>\n</main>");
}
