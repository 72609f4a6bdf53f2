/// Wrap text in HTML bold tags.
pub fn bold(text: impl AsRef<str>) -> String {
    format!("<b>{}</b>", text.as_ref())
}

/// Render an optional service or trigger note after a status line.
pub fn with_details(headline: &str, details: Option<&str>) -> String {
    match details {
        Some(details) if !details.is_empty() => format!("{headline}\n\n{details}"),
        _ => headline.to_string(),
    }
}
