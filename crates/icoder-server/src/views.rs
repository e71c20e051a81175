//! HTML rendering for the site pages.
//!
//! Every page is a body fragment spliced into one shared layout. Templates
//! are compiled into the binary with `include_str!` and filled by
//! `{{PLACEHOLDER}}` substitution.

use crate::session::LoginState;

const LAYOUT: &str = include_str!("../templates/layout.html");
const HOME: &str = include_str!("../templates/home.html");
const TOPICS: &str = include_str!("../templates/topics.html");
const CONTACT: &str = include_str!("../templates/contact.html");

/// A renderable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// `/`, also the body of a successful login.
    Home,
    /// `/base.pug`: the layout with no page content.
    Base,
    /// `/topics.pug`
    Topics,
    /// `/contact.pug`
    Contact,
}

impl Page {
    fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Base => "iCoder",
            Self::Topics => "Topics",
            Self::Contact => "Contact",
        }
    }

    fn content(self) -> &'static str {
        match self {
            Self::Home => HOME,
            Self::Base => "",
            Self::Topics => TOPICS,
            Self::Contact => CONTACT,
        }
    }
}

/// Render `page` inside the layout, reflecting the session's login state.
#[must_use]
pub fn render(page: Page, login: &LoginState) -> String {
    let alert = login.alert().map_or_else(String::new, |message| {
        format!(
            r#"<div class="alert alert-success" role="alert">{}</div>"#,
            escape(message)
        )
    });

    LAYOUT
        .replace("{{CONTENT}}", page.content())
        .replace("{{TITLE}}", page.title())
        .replace("{{LOGGED_IN}}", if login.is_logged_in { "true" } else { "false" })
        .replace("{{ALERT}}", &alert)
}

/// Escape text for an HTML element body or quoted attribute.
fn escape(text: &str) -> String {
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
