//! HTML page rendering
//!
//! Pages are plain `format!` templates around a shared layout. Everything
//! that comes from data files or the request is passed through
//! [`escape_html`].

use axum::http::StatusCode;
use std::collections::HashMap;

use ecop_common::progress::Progress;
use ecop_common::PoemId;

use crate::api::annotate::AnnotationView;
use crate::session::CSRF_FIELD;

/// Similarity scale offered for every neighbor (value, caption)
pub const LABEL_SCALE: [(&str, &str); 5] = [
    ("1", "1 - Not similar"),
    ("2", "2 - Slightly similar"),
    ("3", "3 - Moderately similar"),
    ("4", "4 - Very similar"),
    ("5", "5 - Almost the same"),
];

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, logged_in: bool, body: &str, scripts: &[&str]) -> String {
    let nav = if logged_in {
        r#"<a href="/instructions">Instructions</a> <a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/login">Log in</a>"#
    };
    let scripts: String = scripts
        .iter()
        .map(|src| format!(r#"<script src="{}"></script>"#, src))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Poem Annotation</title>
    <link rel="stylesheet" href="/static/ecop-ui.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1><a href="/">Poem Annotation</a></h1>
                <div class="subtitle">Similarity judgments for the ecopoetic corpus</div>
            </div>
            <nav class="header-right">{nav}</nav>
        </div>
    </header>
    <main class="content">
{body}
    </main>
    <footer class="build-info">v{version} [{git_hash}]</footer>
    {scripts}
</body>
</html>
"#,
        title = escape_html(title),
        nav = nav,
        body = body,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        scripts = scripts,
    )
}

fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(r#"<div class="error">{}</div>"#, escape_html(message)),
        None => String::new(),
    }
}

/// GET /
pub fn home_page(logged_in: bool) -> String {
    let action = if logged_in {
        r#"<a class="button" href="/instructions">Continue</a>"#
    } else {
        r#"<a class="button" href="/login">Log in to start</a>"#
    };
    let body = format!(
        r#"        <h2>Welcome</h2>
        <p>Each assigned poem is shown next to up to ten poems that a model
        considers similar. Rate how similar each recommended poem is to the
        main poem.</p>
        {action}"#
    );
    layout("Home", logged_in, &body, &[])
}

/// GET /login (and failed POST /login)
pub fn login_page(csrf_token: &str, error: Option<&str>, username: &str) -> String {
    let body = format!(
        r#"        <h2>Log in</h2>
        {error}
        <form method="post" action="/login" class="login-form">
            <input type="hidden" name="{csrf_field}" value="{csrf_token}">
            <div class="form-group">
                <label for="username">Username</label>
                <input id="username" name="username" value="{username}" autocomplete="username" required>
            </div>
            <div class="form-group">
                <label for="password">Password</label>
                <input id="password" name="password" type="password" autocomplete="current-password" required>
            </div>
            <button class="button" type="submit">Log in</button>
        </form>"#,
        error = error_banner(error),
        csrf_field = CSRF_FIELD,
        csrf_token = escape_html(csrf_token),
        username = escape_html(username),
    );
    layout("Log in", false, &body, &[])
}

fn poem_list(poems: &[PoemId], empty_message: &str) -> String {
    if poems.is_empty() {
        return format!(r#"<p class="muted">{}</p>"#, escape_html(empty_message));
    }
    let items: String = poems
        .iter()
        .map(|poem| {
            format!(
                "<li><span class=\"author\">{}</span> - <span class=\"title\">{}</span></li>",
                escape_html(&poem.display_author()),
                escape_html(&poem.display_title())
            )
        })
        .collect();
    format!("<ul class=\"poem-list\">{}</ul>", items)
}

/// GET /instructions
pub fn instructions_page(username: &str, progress: &Progress) -> String {
    let action = if progress.pending.is_empty() {
        r#"<p class="done">All assigned poems are annotated. Thank you!</p>"#
    } else {
        r#"<a class="button" href="/start_annotation">Start annotating</a>"#
    };

    let body = format!(
        r#"        <h2>Instructions</h2>
        <p>Hello, <strong>{username}</strong>. For every poem you will see a list of
        recommended poems. Read the main poem, then choose a similarity rating for
        each recommendation. All recommendations must be rated before the
        annotation can be saved; a saved annotation cannot be changed.</p>
        <p class="progress">{completed} of {total} poems annotated</p>
        {action}
        <h3>Pending</h3>
        {pending}
        <h3>Completed</h3>
        {completed_list}"#,
        username = escape_html(username),
        completed = progress.completed.len(),
        total = progress.total(),
        action = action,
        pending = poem_list(&progress.pending, "No pending poems."),
        completed_list = poem_list(&progress.completed, "Nothing annotated yet."),
    );
    layout("Instructions", true, &body, &[])
}

fn label_select(name: &str, selected: Option<&str>) -> String {
    let mut options = String::from(r#"<option value="">-- rate --</option>"#);
    for (value, caption) in LABEL_SCALE {
        let marker = if selected == Some(value) { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            value, marker, caption
        ));
    }
    format!(
        r#"<select name="{}" class="label-select">{}</select>"#,
        escape_html(name),
        options
    )
}

/// GET/POST /annotate/:poem_url
///
/// `submitted` carries the posted form when re-rendering a rejected
/// submission so earlier choices are kept.
pub fn annotate_page(
    view: &AnnotationView,
    csrf_token: &str,
    submitted: Option<&HashMap<String, String>>,
    error: Option<&str>,
) -> String {
    let neighbors: String = if view.neighbors.is_empty() {
        r#"<p class="muted">This poem has no recommendations. Submit to mark it as done.</p>"#
            .to_string()
    } else {
        view.neighbors
            .iter()
            .enumerate()
            .map(|(i, neighbor)| {
                let key = neighbor.poem.to_string();
                let selected = submitted
                    .and_then(|form| form.get(&key))
                    .map(|v| v.trim());
                let text = match &neighbor.text {
                    Some(text) => format!(r#"<pre class="poem-text">{}</pre>"#, escape_html(text)),
                    None => r#"<p class="error">The text of this poem could not be loaded.</p>"#
                        .to_string(),
                };
                format!(
                    r#"        <section class="recommendation">
            <h3>{number}. {title} <span class="author">({author})</span></h3>
            {text}
            <label>Similarity {select}</label>
        </section>
"#,
                    number = i + 1,
                    title = escape_html(&neighbor.title),
                    author = escape_html(&neighbor.poem.display_author()),
                    text = text,
                    select = label_select(&key, selected),
                )
            })
            .collect()
    };

    let body = format!(
        r#"        <article class="main-poem">
            <h2>{title}</h2>
            <div class="author">{author}</div>
            <pre class="poem-text">{text}</pre>
        </article>
        {error}
        <form method="post" action="/annotate/{slug}" id="annotation-form">
            <input type="hidden" name="{csrf_field}" value="{csrf_token}">
{neighbors}
            <button class="button" type="submit">Save annotation</button>
        </form>"#,
        title = escape_html(&view.original_title),
        author = escape_html(&view.author),
        text = escape_html(&view.text),
        error = error_banner(error),
        slug = escape_html(&view.poem.url_slug()),
        csrf_field = CSRF_FIELD,
        csrf_token = escape_html(csrf_token),
        neighbors = neighbors,
    );

    layout(
        &view.original_title,
        true,
        &body,
        &["/static/form-validation.js", "/static/page-warning.js"],
    )
}

/// Generic error page for 4xx/5xx responses
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"        <h2>Error {code}</h2>
        <div class="error">{message}</div>
        <p><a href="/instructions">Back to instructions</a></p>"#,
        code = status.as_u16(),
        message = escape_html(message),
    );
    layout("Error", false, &body, &[])
}

/// Rejected form post (bad or expired CSRF token)
pub fn csrf_error_page() -> String {
    let body = r#"        <h2>Security token error</h2>
        <div class="error">The form has expired or was not sent from this site. Please reload the page and try again.</div>
        <p><a class="button" href="/login">Back to login</a></p>"#;
    layout("Error", false, body, &[])
}
