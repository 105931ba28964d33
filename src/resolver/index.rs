//! Directory listings.

use html_escape::{encode_single_quoted_attribute, encode_text};

/// Render an HTML listing of `entries`, the children of the directory that
/// `request_path` names.
///
/// Each entry becomes a link to `<request_path>/<entry>`, with any trailing
/// slash of `request_path` removed first so links never contain `//`.
/// Entries are listed in the order given.
pub fn render_index(request_path: &str, entries: &[String]) -> String {
    let base = request_path.trim_end_matches('/');
    let base = if base.is_empty() || base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    let title = encode_text(&format!("Index of {base}/")).into_owned();

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<pre>\n"
    );
    let href_base = encode_single_quoted_attribute(&base);
    for name in entries {
        html.push_str(&format!(
            "<a href='{href_base}/{href}'>{text}</a>\n",
            href = encode_single_quoted_attribute(name),
            text = encode_text(name)
        ));
    }
    html.push_str("</pre>\n</body>\n</html>\n");
    html
}
