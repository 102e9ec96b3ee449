use pulldown_cmark::{html as md_html, Options as MdOptions, Parser as MdParser};

/// Renders markdown to HTML. Inline HTML in the source is passed through.
pub fn from(content: &str) -> String {
    let options = MdOptions::all();
    let mut html_output = String::with_capacity(content.len() * 3 / 2);
    md_html::push_html(&mut html_output, MdParser::new_ext(content, options));
    html_output
}
