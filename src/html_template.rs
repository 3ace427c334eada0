use axum::response::Html;

use crate::settings::MapsCredential;

const MAPS_SCRIPT_PLACEHOLDER: &str = "<!-- MAPS_SCRIPT_PLACEHOLDER -->";
const CREDENTIAL_WARNING_PLACEHOLDER: &str = "<!-- CREDENTIAL_WARNING_PLACEHOLDER -->";

/// Fills the page template: the Maps loader when a key exists, a visible
/// banner otherwise.
pub fn render_index(template: &str, credential: Option<&MapsCredential>) -> Html<String> {
    let (script, warning) = match credential {
        Some(key) => (
            format!(
                r#"<script async src="https://maps.googleapis.com/maps/api/js?key={}&callback=poimapMapsReady"></script>"#,
                key.expose()
            ),
            String::new(),
        ),
        None => (
            String::new(),
            r#"<div class="banner banner-error">
            ⚠️ Map provider API key is not configured
            <br><small>Set POIMAP_MAPS_API_KEY or maps_api_key in poimap.ini and restart</small>
        </div>"#
                .to_string(),
        ),
    };

    let html = template
        .replace(MAPS_SCRIPT_PLACEHOLDER, &script)
        .replace(CREDENTIAL_WARNING_PLACEHOLDER, &warning);
    Html(html)
}
