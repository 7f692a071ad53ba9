//! HTML pages shown to the browser when a handshake stops.
//!
//! The protocol has no structured error body; the user sees a short page
//! and the `data-error` attribute carries a stable code for tooling.

/// Terminal error page
#[must_use]
pub fn render_error_page(error_code: &str, message: &str) -> String {
    page(error_code, &format!("<p>{}</p>", html_escape(message)))
}

/// Login prompt that resumes the handshake after signing in
#[must_use]
pub fn render_login_prompt(error_code: &str, message: &str, login_url: &str) -> String {
    page(
        error_code,
        &format!(
            r#"<p>{}</p>
    <p><a href="{}">Log in</a>, then try again.</p>"#,
            html_escape(message),
            html_escape(login_url)
        ),
    )
}

fn page(error_code: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8"/>
    <title>Single Sign On</title>
</head>
<body>
<main data-error="{}">
    {}
</main>
</body>
</html>"#,
        html_escape(error_code),
        body
    )
}

/// HTML escape for XSS prevention
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
