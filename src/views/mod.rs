//! Server-rendered pages. Deliberately small: a layout plus one form per flow.

use crate::config::Config;
use crate::i18n::{Locale, Phrase};
use crate::models::{Flash, FlashKind};

/// Per-request values every page needs.
pub struct PageContext<'a> {
    pub config: &'a Config,
    pub locale: &'a Locale,
    pub flash: Vec<Flash>,
    pub signed_in_as: Option<String>,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(ctx: &PageContext<'_>, title: &str, body: &str) -> String {
    let flash: String = ctx
        .flash
        .iter()
        .map(|f| {
            let class = match f.kind {
                FlashKind::Success => "flash flash-success",
                FlashKind::Error => "flash flash-error",
            };
            format!(r#"<p class="{}">{}</p>"#, class, escape(&f.message))
        })
        .collect();
    let nav = match &ctx.signed_in_as {
        Some(email) => format!(
            r#"<span>{}</span> <a href="{}">logout</a>"#,
            escape(email),
            ctx.locale.path("/logout")
        ),
        None => format!(
            r#"<a href="{}">{}</a> <a href="{}">{}</a>"#,
            ctx.locale.path("/login"),
            escape(&ctx.locale.t(Phrase::LogIn)),
            ctx.locale.path("/signup"),
            escape(&ctx.locale.t(Phrase::SignUp)),
        ),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<title>{title} | {app}</title>
<link rel="stylesheet" href="{css}">
</head>
<body>
<nav><a href="{home}">{app}</a> {nav}</nav>
{flash}
<main>
{body}
</main>
</body>
</html>
"#,
        lang = ctx.locale.as_str(),
        title = escape(title),
        app = escape(&ctx.config.app_name),
        css = escape(&ctx.config.storage.asset_url("/css/app.css")),
        home = ctx.locale.root(),
        nav = nav,
        flash = flash,
        body = body,
    )
}

pub fn home(ctx: &PageContext<'_>) -> String {
    let greeting = format!("<h1>{}</h1>", escape(&ctx.locale.t(Phrase::Welcome)));
    layout(ctx, &ctx.config.app_name, &greeting)
}

/// Shared page for `/signup` and `/login`; `verb` is "sign up" or "log in".
pub fn signup_or_login(ctx: &PageContext<'_>, signup: bool) -> String {
    let verb = ctx
        .locale
        .t(if signup { Phrase::SignUp } else { Phrase::LogIn });
    let action = ctx.locale.path(if signup { "/signup" } else { "/login" });
    let body = format!(
        r#"<h1>{verb}</h1>
<form method="post" action="{action}">
<label>{email} <input type="email" name="email" required></label>
<label>{password} <input type="password" name="password" required></label>
<button type="submit">{verb}</button>
</form>
<p><a href="{forgot}">{forgot_label}</a></p>"#,
        verb = escape(&verb),
        action = action,
        email = escape(&ctx.locale.t(Phrase::Email)),
        password = escape(&ctx.locale.t(Phrase::Password)),
        forgot = ctx.locale.path("/forgot-password"),
        forgot_label = escape(&ctx.locale.t(Phrase::ForgotPassword)),
    );
    layout(ctx, &verb, &body)
}

pub fn forgot_password(ctx: &PageContext<'_>) -> String {
    let title = ctx.locale.t(Phrase::ForgotPassword);
    let body = format!(
        r#"<h1>{title}</h1>
<form method="post" action="{action}">
<label>{email} <input type="email" name="email" required></label>
<button type="submit">{title}</button>
</form>"#,
        title = escape(&title),
        action = ctx.locale.path("/forgot-password"),
        email = escape(&ctx.locale.t(Phrase::Email)),
    );
    layout(ctx, &title, &body)
}

pub fn reset_password(ctx: &PageContext<'_>, token: &str) -> String {
    let title = ctx.locale.t(Phrase::ResetPassword);
    let body = format!(
        r#"<form method="post" action="{action}">
<label>{email} <input type="email" name="email" required></label>
<label>{password} <input type="password" name="password" required></label>
<button type="submit">OK</button>
</form>"#,
        action = escape(&ctx.locale.path(&format!("/reset-password/{}", token))),
        email = escape(&ctx.locale.t(Phrase::Email)),
        password = escape(&ctx.locale.t(Phrase::Password)),
    );
    layout(ctx, &title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "AWS_CF_DOMAIN" => Some("cdn.example.com".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn signup_page_uses_signup_verb_and_action() {
        let config = config();
        let locale = Locale::new("en");
        let ctx = PageContext {
            config: &config,
            locale: &locale,
            flash: vec![],
            signed_in_as: None,
        };
        let html = signup_or_login(&ctx, true);
        assert!(html.contains("<h1>sign up</h1>"));
        assert!(html.contains(r#"action="/en/signup""#));
        let html = signup_or_login(&ctx, false);
        assert!(html.contains("<h1>log in</h1>"));
    }

    #[test]
    fn layout_renders_escaped_flash_and_cdn_assets() {
        let config = config();
        let locale = Locale::new("es");
        let ctx = PageContext {
            config: &config,
            locale: &locale,
            flash: vec![Flash {
                kind: FlashKind::Success,
                message: "<b>ok</b>".into(),
            }],
            signed_in_as: Some("a@x.com".into()),
        };
        let html = home(&ctx);
        assert!(html.contains("&lt;b&gt;ok&lt;/b&gt;"));
        assert!(html.contains("https://cdn.example.com/css/app.css"));
        assert!(html.contains(r#"href="/es/logout""#));
        assert!(html.contains(r#"<html lang="es">"#));
    }
}
