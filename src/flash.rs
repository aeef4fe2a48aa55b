use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const FLASH_COOKIE: &str = "flash";

fn encode(messages: &[String]) -> String {
    urlencoding::encode(&messages.join("\n")).into_owned()
}

fn decode(raw: &str) -> Vec<String> {
    urlencoding::decode(raw)
        .map(|s| {
            s.split('\n')
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn pending(jar: &CookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE)
        .map(|c| decode(c.value()))
        .unwrap_or_default()
}

/// Queues `message` to be shown on the next rendered page.
pub fn push(jar: CookieJar, message: &str) -> CookieJar {
    let mut messages = pending(&jar);
    messages.push(message.replace('\n', " "));
    let cookie = Cookie::build((FLASH_COOKIE, encode(&messages)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Drains queued messages. The returned jar clears the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<String>) {
    let messages = pending(&jar);
    if messages.is_empty() && jar.get(FLASH_COOKIE).is_none() {
        return (jar, messages);
    }
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, messages)
}
