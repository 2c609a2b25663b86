use axum::http::StatusCode;

use crate::domain::models::BlobDescriptor;

const GALLERY_TEMPLATE: &str = include_str!("templates/gallery.html");
const ERROR_TEMPLATE: &str = include_str!("templates/error.html");

/// Gallery page: one tile per blob with its delete form
pub fn render_gallery(blobs: &[BlobDescriptor]) -> String {
    let items = if blobs.is_empty() {
        r#"<p class="empty">No images yet.</p>"#.to_string()
    } else {
        blobs.iter().map(render_tile).collect::<Vec<_>>().join("\n")
    };

    GALLERY_TEMPLATE
        .replace("{{count}}", &blobs.len().to_string())
        .replace("{{items}}", &items)
}

fn render_tile(blob: &BlobDescriptor) -> String {
    let url = escape_html(&blob.url);
    let name = escape_html(blob.name.as_str());

    format!(
        r#"<div class="tile">
  <a href="{url}"><img src="{url}" alt="{name}"></a>
  <form method="post" action="/delete">
    <input type="hidden" name="name" value="{url}">
    <button type="submit">Delete</button>
  </form>
</div>"#
    )
}

/// Error page with the message and diagnostic trace
pub fn render_error(status: StatusCode, message: &str, trace: &[String]) -> String {
    let trace = trace
        .iter()
        .map(|line| escape_html(line))
        .collect::<Vec<_>>()
        .join("\n");

    ERROR_TEMPLATE
        .replace("{{status}}", &escape_html(&status.to_string()))
        .replace("{{message}}", &escape_html(message))
        .replace("{{trace}}", &trace)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
