use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::events::AttachmentPayload;
use crate::models::Attachment;

const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Turn host attachments into embeddable data URLs, in order.
///
/// Attachments whose file cannot be read are logged and skipped; the report
/// is still produced without them.
pub fn load(payloads: &[AttachmentPayload]) -> Vec<Attachment> {
    payloads.iter().filter_map(load_one).collect()
}

fn load_one(payload: &AttachmentPayload) -> Option<Attachment> {
    let content_type = payload
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let encoded = if let Some(ref body) = payload.body {
        if STANDARD.decode(body.as_bytes()).is_err() {
            tracing::warn!(name = %payload.name, "attachment body is not valid base64, skipping");
            return None;
        }
        body.clone()
    } else if let Some(ref path) = payload.path {
        match std::fs::read(path) {
            Ok(bytes) => STANDARD.encode(bytes),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "error reading screenshot file");
                return None;
            }
        }
    } else {
        return None;
    };

    Some(Attachment {
        title: payload.name.clone(),
        url: format!("data:{};base64,{}", content_type, encoded),
    })
}
