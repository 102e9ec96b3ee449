#[macro_use]
extern crate log;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use folio::render::{Inputs, Renderer};
use folio::{bibliography, collection, cv, page, settings, Result, Settings};
use std::path::PathBuf;
use std::{env, fs, process};

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let page_arg = Arg::with_name("PAGE")
        .help("Page document; defaults to page.path from the config");

    let matches = App::new("folio")
        .version(clap::crate_version!())
        .about("Checks and renders the about page of an academic site")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("check")
                .about("Validates the page and the assets it references")
                .arg(page_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Renders the page to HTML")
                .arg(page_arg)
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("Write the HTML here instead of stdout"),
                ),
        )
        .subcommand(
            SubCommand::with_name("publications")
                .about("Injects the bibliography into the CV data file"),
        )
        .get_matches();

    let settings = match settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let result = match matches.subcommand() {
        ("check", Some(m)) => check(&settings, m),
        ("render", Some(m)) => render(&settings, m),
        ("publications", Some(_)) => publications(&settings),
        _ => Ok(()),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn page_path(settings: &Settings, matches: &ArgMatches) -> PathBuf {
    matches
        .value_of("PAGE")
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.page_path.clone())
}

fn check(settings: &Settings, matches: &ArgMatches) -> Result<()> {
    let path = page_path(settings, matches);
    let page = page::load(&path)?;
    page.check_references(&settings.assets_path)?;
    info!("{} is valid ({} layout).", path.display(), page.layout);
    Ok(())
}

fn render(settings: &Settings, matches: &ArgMatches) -> Result<()> {
    let path = page_path(settings, matches);
    let page = page::load(&path)?;
    page.check_references(&settings.assets_path)?;

    let mut inputs = Inputs {
        socials: settings.social_links.clone(),
        ..Inputs::default()
    };
    if page.announcements.enabled {
        inputs.news = collection::load(&settings.news_path);
    }
    if page.latest_posts.enabled {
        inputs.posts = collection::load(&settings.posts_path);
    }
    if page.selected_papers {
        inputs.publications =
            match bibliography::load(&settings.bibliography_path, &settings.owner_last_names) {
                Ok(publications) => publications,
                Err(e) => {
                    warn!("No selected papers: {}", e);
                    Vec::new()
                }
            };
    }

    let renderer = Renderer::new(&settings.templates_path, settings.minify)?
        .with_assets_url(settings.assets_url.as_str());
    let html = renderer.render(&page, &inputs)?;

    match matches.value_of("output") {
        Some(output) => {
            fs::write(output, html)?;
            info!("Rendered {} to {}.", path.display(), output);
        }
        None => print!("{}", html),
    }

    Ok(())
}

fn publications(settings: &Settings) -> Result<()> {
    let publications =
        bibliography::load(&settings.bibliography_path, &settings.owner_last_names)?;
    cv::inject(&settings.cv_path, &publications)?;
    Ok(())
}
