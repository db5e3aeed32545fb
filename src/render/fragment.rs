//! Standalone "All Steps" block: a collapsible list of step descriptions
//! followed by the screenshots taken along the way.

use super::html::escape_html;
use crate::models::Attachment;

const ATTACHMENT_SEPARATOR: &str = "<hr/>";

const HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta http-equiv="X-UA-Compatible" content="IE=edge">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 2em; line-height: 1.6; }
        pre { background-color: #FAFAFA; padding: 1em; border-radius: 5px; white-space: pre-wrap; word-break: break-all; }
        .expandable { cursor: pointer; background-color: #f0f0f0; border: 1px solid #ddd; padding: 0.5em; border-radius: 5px; }
        .expandable-content { display: none; margin-top: 1em; }
        .attachment { margin: 1em 0; }
        .attachment img { max-width: 100%; height: auto; }
    </style>
    <script>
        function toggleContent(event) {
            const content = event.target.nextElementSibling;
            if (content.style.display === 'none' || content.style.display === '') {
                content.style.display = 'block';
                event.target.innerHTML = 'v All Steps';
            } else {
                content.style.display = 'none';
                event.target.innerHTML = '&gt; All Steps';
            }
        }
    </script>
</head>
<body>"#;

const FOOTER: &str = "</body></html>";

/// Build a full document listing `steps` as `Step N: ...` under a collapsed
/// header, then each attachment as a fixed-size image with its caption.
pub fn text_and_attachments_html(title: &str, steps: &[String], attachments: &[Attachment]) -> String {
    let mut body = String::from("<pre><code>");
    body.push_str("<div class=\"expandable\" onclick=\"toggleContent(event)\">&gt; All Steps</div>");
    body.push_str("<div class=\"expandable-content\">");
    for (i, step) in steps.iter().enumerate() {
        body.push_str(&format!("<div>Step {}: {}</div>", i + 1, escape_html(step)));
    }
    body.push_str("</div>");

    if !attachments.is_empty() {
        body.push('\n');
        body.push_str(ATTACHMENT_SEPARATOR);
        body.push('\n');
        for attachment in attachments {
            body.push_str(&format!(
                "<div class=\"attachment\"><img src='{}' height='550' width='950'><div>{}</div></div>",
                escape_html(&attachment.url),
                escape_html(&attachment.title)
            ));
        }
    }
    body.push_str("</code></pre>");

    let mut html = HEADER.replace("{title}", &escape_html(title));
    html.push_str(&body);
    html.push_str(FOOTER);
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_steps_from_one() {
        let html = text_and_attachments_html(
            "Login",
            &["open page".into(), "type <user>".into()],
            &[],
        );
        assert!(html.contains("<title>Login</title>"));
        assert!(html.contains("<div>Step 1: open page</div><div>Step 2: type &lt;user&gt;</div>"));
        assert!(!html.contains(ATTACHMENT_SEPARATOR));
        assert!(html.ends_with("</code></pre></body></html>"));
    }

    #[test]
    fn attachments_follow_separator() {
        let html = text_and_attachments_html(
            "Cart",
            &[],
            &[Attachment {
                title: "after click".into(),
                url: "data:image/png;base64,iVBO".into(),
            }],
        );
        let separator = html.find("\n<hr/>\n").expect("separator present");
        let image = html
            .find("<img src='data:image/png;base64,iVBO' height='550' width='950'><div>after click</div>")
            .expect("image present");
        assert!(separator < image);
    }
}
