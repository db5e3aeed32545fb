//! HTML rendering for a single test execution.
//!
//! Output is a standalone document: styles and the expand/collapse script are
//! inlined and attachments are embedded as data URLs.

pub mod fragment;
pub mod html;

use chrono::{DateTime, FixedOffset};

use crate::config::MetadataConfig;
use crate::failure;
use crate::models::{Attachment, Status, Step, TestCaseRecord};

pub use html::{escape_html, format_duration, format_optional_duration};

const NOT_AVAILABLE: &str = "N/A";

const STYLE: &str = r#"<style>
    body { font-family: sans-serif; }
    .test-case { margin-bottom: 20px; border: 1px solid #ccc; padding: 10px; }
    .test-case h2 { margin-top: 0; }
    .test-info-container { background-color: #f9f9f9; border: 1px solid #eee; padding: 10px; margin-bottom: 10px; font-size: 0.9em; }
    .test-info-item { margin-bottom: 5px; }
    .error-container { background-color: #ffe0e0; border: 1px solid #ffb3b3; padding: 10px; margin-bottom: 10px; font-size: 0.9em; white-space: pre-wrap; color: darkred; font-weight: bold; }
    .error-location { font-size: 0.8em; color: #555; margin-top: 5px; }
    .step { color: #777; }
    .parent { font-weight: bold; cursor: pointer; }
    .children { display: none; }
    .expanded > .children { display: block; }
    .duration { font-size: 0.8em; color: #999; float: right; }
    .screenshot-container { margin-top: 10px; border-top: 1px solid #eee; padding-top: 10px; }
    .attachment-title { font-size: 1.1em; color: #333; margin-bottom: 5px; font-weight: bold; }
    .screenshot { max-width: 600px; height: auto; display: block; margin-bottom: 15px; border: 1px solid #ddd; }
    .status-passed { color: green; }
    .status-failed { color: red; }
    .status-skipped { color: orange; }
    .status-timedout { color: darkred; }
    .status-interrupted { color: gray; }
    .stdout-container { margin-top: 10px; border-top: 1px solid #eee; padding-top: 10px; font-size: 0.85em; white-space: pre-wrap; }
    .stdout-title { font-weight: bold; margin-bottom: 5px; }
</style>"#;

const SCRIPT: &str = r#"<script>
    document.addEventListener('click', function (event) {
        if (event.target.classList.contains('parent')) {
            event.target.parentElement.classList.toggle('expanded');
        }
    });
</script>"#;

/// Values from the surrounding process shown in the metadata block, plus the
/// generation time. Kept outside the record so rendering stays pure.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub client: Option<String>,
    pub environment: Option<String>,
    pub build_number: Option<String>,
    pub generated_at: DateTime<FixedOffset>,
}

impl RenderContext {
    /// Read the metadata variables named in the config from the environment.
    pub fn from_env(metadata: &MetadataConfig, generated_at: DateTime<FixedOffset>) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            client: var(&metadata.client_var),
            environment: var(&metadata.environment_var),
            build_number: var(&metadata.build_number_var),
            generated_at,
        }
    }
}

/// Render the full report document for one test case.
pub fn render(record: &TestCaseRecord, ctx: &RenderContext) -> String {
    let name = escape_html(&record.display_name);
    let generated = ctx.generated_at.format("%B %-d, %Y at %-I:%M %p").to_string();
    let zone = ctx.generated_at.format("UTC%:z").to_string();

    let mut html = String::with_capacity(8192);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>Test Report - {} - {}</title>\n", name, generated));
    html.push_str(STYLE);
    html.push_str("\n</head>\n<body>\n<h1>Test Report</h1>\n");
    html.push_str(&format!("<h2>Test Case: {}</h2>\n", name));
    html.push_str(&format!("<p>Timestamp: {} ({})</p>\n", generated, zone));

    html.push_str(&format!("<div class=\"test-case {}\">", record.status.css_class()));
    push_metadata(&mut html, record, ctx);
    push_error(&mut html, record);
    html.push_str(&render_steps(&record.steps, 0));
    push_attachments(&mut html, &record.attachments);
    push_stdout(&mut html, &record.stdout);
    html.push_str("</div>\n");

    html.push_str(SCRIPT);
    html.push_str("\n</body>\n</html>\n");
    html
}

fn push_metadata(html: &mut String, record: &TestCaseRecord, ctx: &RenderContext) {
    let or_na = |value: &Option<String>| escape_html(value.as_deref().unwrap_or(NOT_AVAILABLE));

    html.push_str("<div class=\"test-info-container\">");
    info_item(html, "Client", &or_na(&ctx.client));
    info_item(html, "Title", &escape_html(&record.display_name));
    info_item(html, "Status", &record.status.label());
    info_item(html, "Duration", &format_optional_duration(record.duration_ms));
    info_item(html, "Environment", &or_na(&ctx.environment));
    info_item(html, "Build Number", &or_na(&ctx.build_number));
    if let Some(ref start) = record.start_time {
        info_item(html, "Start Time", &escape_html(start));
    }
    html.push_str("</div>");
}

fn info_item(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!(
        "<div class=\"test-info-item\"><b>{}:</b> {}</div>",
        label, value
    ));
}

fn push_error(html: &mut String, record: &TestCaseRecord) {
    if record.status != Status::Failed {
        return;
    }
    let Some(ref error) = record.error else {
        return;
    };

    html.push_str(&format!(
        "<div class=\"error-container\"><b>Error:</b><pre>{}</pre>",
        escape_html(error)
    ));
    if let Some((file, line)) = failure::location(error) {
        html.push_str(&format!(
            "<div class=\"error-location\">at {}:{}</div>",
            escape_html(&file),
            line
        ));
    }
    html.push_str("</div>");
}

/// Nested list of steps. Steps with children are clickable and start collapsed.
pub fn render_steps(steps: &[Step], level: usize) -> String {
    let mut html = String::from("<ul class=\"steps\">");
    for step in steps {
        let (parent_class, marker) = if step.is_parent() {
            (" parent", "[+] ")
        } else {
            ("", "")
        };
        html.push_str(&format!(
            "<li style=\"margin-left: {}px;\"><span class=\"step{} {}\">{}{}</span>",
            level * 20,
            parent_class,
            step.status.css_class(),
            marker,
            escape_html(&step.name)
        ));
        if let Some(duration) = step.duration_ms {
            html.push_str(&format!(" <span class=\"duration\">({}ms)</span>", duration));
        }
        if step.is_parent() {
            html.push_str("<div class=\"children\">");
            html.push_str(&render_steps(&step.children, level + 1));
            html.push_str("</div>");
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");
    html
}

fn push_attachments(html: &mut String, attachments: &[Attachment]) {
    html.push_str("<div class=\"screenshot-container\"><h4>Attachments</h4>");
    for attachment in attachments {
        html.push_str(&format!(
            "<div class=\"attachment-title\">{}</div><img src=\"{}\" class=\"screenshot\">",
            escape_html(&attachment.title),
            escape_html(&attachment.url)
        ));
    }
    html.push_str("</div>");
}

fn push_stdout(html: &mut String, stdout: &[String]) {
    if stdout.is_empty() {
        return;
    }
    html.push_str("<div class=\"stdout-container\"><div class=\"stdout-title\">Console Output (stdout)</div>");
    html.push_str(&format!("<pre>{}</pre>", escape_html(&stdout.concat())));
    html.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        let generated_at = DateTime::parse_from_rfc3339("2024-03-05T13:34:05+05:30").unwrap();
        RenderContext {
            client: Some("acme".into()),
            environment: None,
            build_number: Some("1.2.3".into()),
            generated_at,
        }
    }

    fn step(name: &str, status: Status, duration: u64, children: Vec<Step>) -> Step {
        Step {
            name: name.into(),
            status,
            children,
            duration_ms: Some(duration),
            start_time_ms: Some(0),
        }
    }

    fn failed_record() -> TestCaseRecord {
        TestCaseRecord {
            display_name: "Cart > adds item".into(),
            title: "adds item".into(),
            steps: vec![step(
                "open cart",
                Status::Failed,
                120,
                vec![step("click <Cart>", Status::Passed, 40, vec![])],
            )],
            status: Status::Failed,
            duration_ms: Some(125_000),
            start_time: Some("3/5/2024, 1:34:05 PM".into()),
            error: Some("Error: boom\r\n    at step (/t/cart.spec.ts:14:9)".into()),
            ..TestCaseRecord::default()
        }
    }

    #[test]
    fn renders_nested_steps_with_expandable_parent() {
        let html = render(&failed_record(), &ctx());

        let root = html.find("[+] open cart").expect("root step rendered as parent");
        let child = html.find("click &lt;Cart&gt;").expect("child step escaped");
        assert!(root < child);
        assert!(html.contains("<span class=\"step parent status-failed\">[+] open cart</span>"));
        assert!(html.contains("<li style=\"margin-left: 20px;\"><span class=\"step status-passed\">click &lt;Cart&gt;</span>"));
        assert!(html.contains("<div class=\"children\"><ul class=\"steps\">"));
        assert!(html.contains("(120ms)"));
        assert!(!html.contains("[+] click"));
    }

    #[test]
    fn renders_metadata_and_error() {
        let html = render(&failed_record(), &ctx());
        assert!(html.contains("<b>Client:</b> acme"));
        assert!(html.contains("<b>Environment:</b> N/A"));
        assert!(html.contains("<b>Build Number:</b> 1.2.3"));
        assert!(html.contains("<b>Status:</b> FAILED"));
        assert!(html.contains("<b>Duration:</b> 2 min 5.000 sec"));
        assert!(html.contains("<b>Start Time:</b> 3/5/2024, 1:34:05 PM"));
        assert!(html.contains("<div class=\"error-container\"><b>Error:</b><pre>Error: boom"));
        assert!(html.contains("at /t/cart.spec.ts:14</div>"));
        assert!(html.contains("Timestamp: March 5, 2024 at 1:34 PM (UTC+05:30)"));
    }

    #[test]
    fn error_block_only_for_failures() {
        let mut record = failed_record();
        record.status = Status::Passed;
        let html = render(&record, &ctx());
        assert!(!html.contains("error-container\">"));
    }

    #[test]
    fn empty_sections() {
        let record = TestCaseRecord {
            display_name: "empty".into(),
            status: Status::Passed,
            ..TestCaseRecord::default()
        };
        let html = render(&record, &ctx());
        assert!(html.contains("<div class=\"screenshot-container\"><h4>Attachments</h4></div>"));
        assert!(!html.contains("Console Output"));
        assert!(html.contains("<b>Duration:</b> N/A"));
        assert!(!html.contains("Start Time"));
    }

    #[test]
    fn escapes_test_controlled_text() {
        let record = TestCaseRecord {
            display_name: "<script>alert('x')</script>".into(),
            status: Status::Failed,
            error: Some("<img onerror=x>".into()),
            stdout: vec!["a < b\n".into(), "\"quoted\"".into()],
            attachments: vec![Attachment {
                title: "<b>shot</b>".into(),
                url: "data:image/png;base64,AAAA".into(),
            }],
            ..TestCaseRecord::default()
        };
        let html = render(&record, &ctx());
        assert!(!html.contains("<script>alert"));
        assert!(!html.contains("<img onerror"));
        assert!(!html.contains("<b>shot</b>"));
        assert!(html.contains("<pre>a &lt; b\n&quot;quoted&quot;</pre>"));
        assert!(html.contains("<img src=\"data:image/png;base64,AAAA\" class=\"screenshot\">"));
    }

    #[test]
    fn output_has_no_external_resources() {
        let html = render(&failed_record(), &ctx());
        assert!(!html.contains("src=\"http"));
        assert!(!html.contains("<link"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let record = failed_record();
        assert_eq!(render(&record, &ctx()), render(&record, &ctx()));
    }
}
