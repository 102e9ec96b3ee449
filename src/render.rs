use crate::bibliography::Publication;
use crate::collection::{self, Item};
use crate::error::{Error, Result};
use crate::markdown;
use crate::models::PageConfig;
use html_minifier::HTMLMinifier;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

const ABOUT_TEMPLATE_NAME: &str = "about.html";
const DEFAULT_ASSETS_URL: &str = "/assets/img";

const ABOUT_TEMPLATE: &str = r#"<div class="post">
  <header class="post-header">
    {% if page.title %}<h1 class="post-title">{{ page.title }}</h1>{% endif %}
    {% if page.subtitle %}<p class="desc">{{ page.subtitle | safe }}</p>{% endif %}
  </header>
  <article>
    {% if page.profile %}
    <div class="profile float-{{ page.profile.align }}">
      {% if page.profile.image %}<img src="{{ assets_url | safe }}/{{ page.profile.image }}" class="img-fluid z-depth-1{% if page.profile.image_circular %} rounded-circle{% endif %}" alt="{{ page.profile.image }}">{% endif %}
      {% if page.profile.more_info %}<div class="more-info">{{ page.profile.more_info | safe }}</div>{% endif %}
    </div>
    {% endif %}
    <div class="clearfix">{{ biography | safe }}</div>
    {% if page.announcements.enabled %}
    <h2><a href="/news/" style="color: inherit">news</a></h2>
    <div class="news{% if page.announcements.scrollable %} scrollable{% endif %}">
      <table class="table table-sm table-borderless">
        {% for item in news %}
        <tr><th scope="row">{{ item.date }}</th><td>{% if item.title %}{% if item.permalink %}<a class="news-title" href="{{ item.permalink }}">{{ item.title }}</a>{% else %}{{ item.title }}{% endif %}{% else %}{{ item.content | safe }}{% endif %}</td></tr>
        {% endfor %}
      </table>
    </div>
    {% endif %}
    {% if page.latest_posts.enabled %}
    <h2><a href="/blog/" style="color: inherit">latest posts</a></h2>
    <div class="latest-posts{% if page.latest_posts.scrollable %} scrollable{% endif %}">
      <table class="table table-sm table-borderless">
        {% for post in posts %}
        <tr><th scope="row">{{ post.date }}</th><td>{% if post.permalink %}<a class="news-title" href="{{ post.permalink }}">{{ post.title }}</a>{% else %}{{ post.title }}{% endif %}</td></tr>
        {% endfor %}
      </table>
    </div>
    {% endif %}
    {% if page.selected_papers %}
    <h2><a href="/publications/" style="color: inherit">selected publications</a></h2>
    <div class="publications">
      <ol class="bibliography">
        {% for paper in publications %}
        <li><div class="title">{{ paper.title }}</div><div class="author">{{ paper.authors | join(sep=", ") }}</div><div class="periodical">{% if paper.journal %}<em>{{ paper.journal }}</em>, {% endif %}{{ paper.date }}</div></li>
        {% endfor %}
      </ol>
    </div>
    {% endif %}
    {% if page.social %}
    <div class="social">
      <div class="contact-icons">
        {% for name, url in socials %}<a href="{{ url }}" title="{{ name }}" rel="external nofollow noopener" target="_blank">{{ name }}</a>{% endfor %}
      </div>
    </div>
    {% endif %}
  </article>
</div>
"#;

/// Data the page sections list. Limits and the `selected` filter are applied
/// while rendering.
#[derive(Debug, Default, Clone)]
pub struct Inputs {
    pub news: Vec<Item>,
    pub posts: Vec<Item>,
    pub publications: Vec<Publication>,
    pub socials: BTreeMap<String, String>,
}

pub struct Renderer {
    tera: Tera,
    minify: bool,
    assets_url: String,
}

impl Renderer {
    /// Loads the site's templates from `templates_path` when it exists. The
    /// built-in `about.html` is used unless the site provides its own.
    pub fn new(templates_path: &Path, minify: bool) -> Result<Renderer> {
        let mut tera = match templates_path.is_dir() {
            true => Tera::new(&format!("{}/**/*", templates_path.display()))?,
            false => Tera::default(),
        };

        if !tera
            .get_template_names()
            .any(|name| name == ABOUT_TEMPLATE_NAME)
        {
            tera.add_raw_template(ABOUT_TEMPLATE_NAME, ABOUT_TEMPLATE)?;
        }

        Ok(Renderer {
            tera,
            minify,
            assets_url: DEFAULT_ASSETS_URL.to_string(),
        })
    }

    /// URL prefix for `profile.image`; templates see it as `assets_url`.
    pub fn with_assets_url<S: Into<String>>(mut self, url: S) -> Renderer {
        let url = url.into();
        self.assets_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn render(&self, page: &PageConfig, inputs: &Inputs) -> Result<String> {
        let mut context = TeraContext::new();
        context.insert("page", page);
        context.insert("biography", &markdown::from(&page.biography));
        context.insert("assets_url", &self.assets_url);

        let news: &[Item] = match page.announcements.enabled {
            true => collection::take(&inputs.news, page.announcements.limit),
            false => &[],
        };
        context.insert("news", news);

        let posts: &[Item] = match page.latest_posts.enabled {
            true => collection::take(&inputs.posts, page.latest_posts.limit),
            false => &[],
        };
        context.insert("posts", posts);

        let selected = match page.selected_papers {
            true => inputs
                .publications
                .iter()
                .filter(|p| p.selected)
                .collect::<Vec<_>>(),
            false => Vec::new(),
        };
        context.insert("publications", &selected);
        context.insert("socials", &inputs.socials);

        let html = self.render_html(&page.layout.template_name(), &context)?;
        match self.minify {
            true => minify(html),
            false => Ok(html),
        }
    }

    fn render_html(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut cause = e.source();

            while let Some(e) = cause {
                error!("Reason: {}", e);
                cause = e.source();
            }

            Error::from(e)
        })
    }
}

fn minify(html: String) -> Result<String> {
    let mut html_minifier = HTMLMinifier::new();

    match html_minifier.digest(html) {
        Ok(()) => (),
        Err(e) => return Err(Error::Minify(e.to_string())),
    };

    Ok(html_minifier.get_html())
}
