//! Server-rendered pages. Every interpolated value goes through `html_escape`.

use std::fmt::Write as _;

use axum::response::Html;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use time::format_description::well_known::Rfc3339;

use crate::store::FeedPost;
use crate::validation::FieldErrors;

/// Data every page needs: its title, the signed-in user and pending flashes.
#[derive(Debug, Default)]
pub struct Page {
    pub title: String,
    pub username: Option<String>,
    pub flashes: Vec<String>,
}

impl Page {
    pub fn new(title: &str, username: Option<&str>, flashes: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            username: username.map(str::to_string),
            flashes,
        }
    }
}

fn layout(page: &Page, content: &str) -> Html<String> {
    let nav = match &page.username {
        Some(name) => format!(
            r#"<a href="/home">Home</a> <a href="/write">Write</a> <span class="user">{}</span> <a href="/logout">Logout</a>"#,
            text(name)
        ),
        None => r#"<a href="/">Microblog</a> <a href="/login">Login</a> <a href="/register">Register</a>"#
            .to_string(),
    };
    let mut flashes = String::new();
    if !page.flashes.is_empty() {
        flashes.push_str(r#"<ul class="flashes">"#);
        for message in &page.flashes {
            let _ = write!(flashes, "<li>{}</li>", text(message));
        }
        flashes.push_str("</ul>");
    }
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - Microblog</title></head>
<body>
<nav>{nav}</nav>
{flashes}
<main>
{content}
</main>
</body>
</html>
"#,
        title = text(&page.title),
    ))
}

fn field_errors(errors: &FieldErrors, field: &str) -> String {
    errors
        .for_field(field)
        .map(|m| format!(r#"<span class="error">[{}]</span>"#, text(m)))
        .collect()
}

pub fn landing(page: &Page) -> Html<String> {
    let content = match &page.username {
        Some(name) => format!(
            r#"<h1>Welcome back, {}!</h1><p><a href="/home">Go to your feed</a></p>"#,
            text(name)
        ),
        None => r#"<h1>Microblog</h1>
<p>Short posts from the people you follow.</p>
<p><a href="/login">Sign in</a> or <a href="/register">create an account</a>.</p>"#
            .to_string(),
    };
    layout(page, &content)
}

pub fn login(page: &Page, username: &str, errors: &FieldErrors, action: &str) -> Html<String> {
    let content = format!(
        r#"<h1>Sign In</h1>
<form action="{action}" method="post" novalidate>
<p><label for="username">Username</label><br>
<input id="username" name="username" type="text" value="{username}"> {username_errors}</p>
<p><label for="password">Password</label><br>
<input id="password" name="password" type="password"> {password_errors}</p>
<p><input id="remember" name="remember" type="checkbox" value="y"> <label for="remember">Remember Me</label></p>
<p><input type="submit" value="Sign In"></p>
</form>
<p>New user? <a href="/register">Click to Register!</a></p>"#,
        action = attr(action),
        username = attr(username),
        username_errors = field_errors(errors, "username"),
        password_errors = field_errors(errors, "password"),
    );
    layout(page, &content)
}

pub fn register(page: &Page, username: &str, email: &str, errors: &FieldErrors) -> Html<String> {
    let content = format!(
        r#"<h1>Register</h1>
<form action="/register" method="post" novalidate>
<p><label for="username">Username</label><br>
<input id="username" name="username" type="text" value="{username}"> {username_errors}</p>
<p><label for="email">Email</label><br>
<input id="email" name="email" type="email" value="{email}"> {email_errors}</p>
<p><label for="password">Password</label><br>
<input id="password" name="password" type="password"> {password_errors}</p>
<p><label for="password2">Repeat Password</label><br>
<input id="password2" name="password2" type="password"> {password2_errors}</p>
<p><input type="submit" value="Register"></p>
</form>"#,
        username = attr(username),
        email = attr(email),
        username_errors = field_errors(errors, "username"),
        email_errors = field_errors(errors, "email"),
        password_errors = field_errors(errors, "password"),
        password2_errors = field_errors(errors, "password2"),
    );
    layout(page, &content)
}

fn post_form(body: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<form action="/home" method="post" novalidate>
<p><label for="post">Say something</label><br>
<textarea id="post" name="post" cols="32" rows="4" maxlength="140">{body}</textarea> {errors}</p>
<p><input type="submit" value="Submit"></p>
</form>"#,
        body = text(body),
        errors = field_errors(errors, "post"),
    )
}

/// Links to the neighbouring feed pages, if any.
#[derive(Debug, Default, Clone, Copy)]
pub struct Paging {
    pub page: i64,
    pub has_newer: bool,
    pub has_older: bool,
}

pub fn home(
    page: &Page,
    posts: &[FeedPost],
    draft: &str,
    errors: &FieldErrors,
    paging: Paging,
) -> Html<String> {
    let mut content = format!(
        "<h1>Hi, {}!</h1>\n{}\n",
        text(page.username.as_deref().unwrap_or_default()),
        post_form(draft, errors)
    );
    if posts.is_empty() {
        content.push_str(r#"<p class="empty">Nothing here yet. Posts from people you follow show up here.</p>"#);
    }
    for post in posts {
        let when = post.created_at.format(&Rfc3339).unwrap_or_default();
        let lang = if post.language.is_empty() {
            String::new()
        } else {
            format!(r#" lang="{}""#, attr(&post.language))
        };
        let _ = write!(
            content,
            r#"<article class="post"><p><b>{author}</b> <time datetime="{when}">{when}</time></p><p{lang}>{body}</p></article>
"#,
            author = text(&post.author_username),
            when = attr(&when),
            body = text(&post.body),
        );
    }
    content.push_str(r#"<nav class="pager">"#);
    if paging.has_newer {
        let _ = write!(content, r#"<a href="/home?page={}">Newer posts</a> "#, paging.page - 1);
    }
    if paging.has_older {
        let _ = write!(content, r#"<a href="/home?page={}">Older posts</a>"#, paging.page + 1);
    }
    content.push_str("</nav>");
    layout(page, &content)
}

pub fn write(page: &Page) -> Html<String> {
    let content = format!("<h1>Write a post</h1>\n{}", post_form("", &FieldErrors::new()));
    layout(page, &content)
}

pub fn error(page: &Page, heading: &str, detail: &str) -> Html<String> {
    let content = format!(
        r#"<h1>{}</h1><p>{}</p><p><a href="/">Back</a></p>"#,
        text(heading),
        text(detail)
    );
    layout(page, &content)
}
