/// Escape text for interpolation into markup or attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// `"<minutes> min <seconds>.<millis> sec"`, millis zero-padded.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!(
        "{} min {}.{:03} sec",
        total_seconds / 60,
        total_seconds % 60,
        ms % 1000
    )
}

pub fn format_optional_duration(ms: Option<u64>) -> String {
    ms.map(format_duration).unwrap_or_else(|| "N/A".into())
}
