//! HTML rendering — chat bubbles and the two page templates.
//!
//! Bubbles are keyed off whether the viewer sent the message: own messages sit
//! on the right in lavender, the partner's on the left in soft yellow. Only
//! own messages carry ticks (`✔` sent, blue `✔✔` read).

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::session::ChatView;
use crate::types::ChatMessage;
use crate::utils::capitalize;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid URL regex"));

/// Colors and corner radii for one side of the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BubbleStyle {
    pub align: &'static str,
    pub background: &'static str,
    pub text_color: &'static str,
    pub border_radius: &'static str,
}

/// Style for the viewer's own messages.
pub const OWN_STYLE: BubbleStyle = BubbleStyle {
    align: "right",
    background: "#E6E6FA",
    text_color: "#2D2D2D",
    border_radius: "20px 20px 5px 20px",
};

/// Style for everyone else's messages.
pub const OTHER_STYLE: BubbleStyle = BubbleStyle {
    align: "left",
    background: "#FFFACD",
    text_color: "#2D2D2D",
    border_radius: "20px 20px 20px 5px",
};

/// Delivery marker shown on the viewer's own messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ticks {
    None,
    Sent,
    Read,
}

impl Ticks {
    pub fn for_message(message: &ChatMessage, viewer: &str) -> Self {
        match (message.is_from(viewer), message.read) {
            (false, _) => Ticks::None,
            (true, false) => Ticks::Sent,
            (true, true) => Ticks::Read,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Ticks::None => "",
            Ticks::Sent => "✔",
            Ticks::Read => "✔✔",
        }
    }

    fn html(&self) -> &'static str {
        match self {
            Ticks::None => "",
            Ticks::Sent => "<span style='color:gray;'>✔</span>",
            Ticks::Read => "<span style='color:#34B7F1;'>✔✔</span>",
        }
    }
}

/// Escape text for safe inclusion in HTML bodies and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Escape `text` and turn `http(s)://` URLs into links that open in a new tab.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        let url = escape_html(m.as_str());
        let _ = write!(
            out,
            r#"<a href="{url}" target="_blank" style="color:#007AFF;text-decoration:none;">{url}</a>"#
        );
        last = m.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// Render one message as a styled bubble for `viewer`.
pub fn render_bubble(message: &ChatMessage, viewer: &str) -> String {
    let style = if message.is_from(viewer) {
        OWN_STYLE
    } else {
        OTHER_STYLE
    };
    let ticks = Ticks::for_message(message, viewer).html();

    format!(
        r#"<div style="display:flex; justify-content:{align}; margin:6px 0;">
  <div class="chat-bubble" style="background:{bg}; padding:12px 16px; border-radius:{radius}; max-width:70%; font-family:'Segoe UI', sans-serif; font-size:15px; line-height:1.4; color:{color};">
    <b style="color:{color};">{sender}</b><br>{body}
    <div style="font-size:11px; color:gray; text-align:right;">🕒 {timestamp} {ticks}</div>
  </div>
</div>
"#,
        align = style.align,
        bg = style.background,
        radius = style.border_radius,
        color = style.text_color,
        sender = escape_html(&capitalize(&message.sender)),
        body = linkify(&message.text),
        timestamp = escape_html(&message.timestamp),
    )
}

// ─────────────────────────────────────────────
// Pages
// ─────────────────────────────────────────────

/// Severity of a banner shown above the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A one-line banner (e.g. "Chat deleted!").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Notice {
            level,
            text: text.into(),
        }
    }

    fn html(&self) -> String {
        let (icon, bg) = match self.level {
            NoticeLevel::Success => ("✅", "#E7F7EC"),
            NoticeLevel::Warning => ("⚠️", "#FFF4D6"),
            NoticeLevel::Error => ("❌", "#FDE2E1"),
        };
        format!(
            r#"<div class="notice" style="background:{bg};">{icon} {}</div>"#,
            escape_html(&self.text)
        )
    }
}

const PAGE_STYLE: &str = r#"<style>
body { margin:0; font-family:'Segoe UI', sans-serif; display:flex; min-height:100vh; }
.sidebar { width:220px; background:#F6F2FB; padding:20px; }
.main { flex:1; padding:20px 32px; max-width:820px; }
.chat-bubble { transition:all 0.2s ease-in-out; box-shadow:0px 1px 3px rgba(0,0,0,0.1); }
.chat-bubble:hover { transform:scale(1.03); box-shadow:0px 4px 12px rgba(255,105,180,0.4); cursor:pointer; }
.notice { padding:10px 14px; border-radius:8px; margin:10px 0; }
.actions form { display:inline; }
.composer { display:flex; gap:8px; margin-top:16px; }
.composer input[type=text] { flex:1; padding:10px; border-radius:18px; border:1px solid #ccc; }
</style>"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>{PAGE_STYLE}</head>\n<body>\n{body}</body></html>\n",
        escape_html(title)
    )
}

/// Login form, with an optional rejection banner.
pub fn render_login_page(app_name: &str, notice: Option<&Notice>) -> String {
    let notice = notice.map(Notice::html).unwrap_or_default();
    let body = format!(
        r#"<div class="main">
<h1>🔐 Login to {name}</h1>
{notice}
<form method="post" action="/login">
  <p><label>Username<br><input type="text" name="username" autofocus></label></p>
  <p><label>Password<br><input type="password" name="password"></label></p>
  <p><button type="submit">Login</button></p>
</form>
</div>
"#,
        name = escape_html(app_name),
    );
    page(app_name, &body)
}

/// The conversation page for one cycle's view.
pub fn render_chat_page(app_name: &str, view: &ChatView, notices: &[Notice]) -> String {
    let mut bubbles = String::new();
    for message in &view.messages {
        bubbles.push_str(&render_bubble(message, &view.user));
    }

    let mut banners: String = notices.iter().map(Notice::html).collect();
    if let Some(warning) = &view.warning {
        banners.push_str(&Notice::new(NoticeLevel::Warning, warning.to_string()).html());
    }

    let body = format!(
        r#"<div class="sidebar">
  <h2>👥 {name}</h2>
  <p>Logged in as: <b>{user}</b></p>
  <p>Chatting with: <b>{partner}</b></p>
  <form method="post" action="/logout"><button type="submit">Logout</button></form>
</div>
<div class="main">
  <h1>💬 {name}</h1>
  {banners}
  <div class="chat">
{bubbles}  </div>
  <div class="actions">
    <form method="get" action="/"><button type="submit">🔄 Refresh Chat</button></form>
    <form method="post" action="/delete"><button type="submit">🗑️ Delete Chat</button></form>
  </div>
  <form class="composer" method="post" action="/send">
    <input type="text" name="text" placeholder="Type your message... (/ai to ask the assistant)" autofocus>
    <button type="submit">Send</button>
  </form>
</div>
"#,
        name = escape_html(app_name),
        user = escape_html(&view.user),
        partner = escape_html(&view.partner),
    );
    page(app_name, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: &str, text: &str, read: bool) -> ChatMessage {
        ChatMessage {
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp: "2026-10-18 05:00 PM".to_string(),
            ts: None,
            read,
        }
    }

    #[test]
    fn test_own_message_right_lavender_with_single_tick() {
        let html = render_bubble(&message("alice", "hi", false), "alice");
        assert!(html.contains("justify-content:right"));
        assert!(html.contains("#E6E6FA"));
        assert!(html.contains("20px 20px 5px 20px"));
        assert!(html.contains("<span style='color:gray;'>✔</span>"));
        assert!(!html.contains("✔✔"));
    }

    #[test]
    fn test_own_read_message_has_double_tick() {
        let html = render_bubble(&message("alice", "hi", true), "alice");
        assert!(html.contains("✔✔"));
        assert!(html.contains("#34B7F1"));
    }

    #[test]
    fn test_partner_message_left_yellow_without_ticks() {
        let html = render_bubble(&message("bob", "yo", true), "alice");
        assert!(html.contains("justify-content:left"));
        assert!(html.contains("#FFFACD"));
        assert!(!html.contains('✔'));
        assert!(html.contains("<b style=\"color:#2D2D2D;\">Bob</b>"));
    }

    #[test]
    fn test_ticks_for_message() {
        assert_eq!(Ticks::for_message(&message("a", "", false), "a"), Ticks::Sent);
        assert_eq!(Ticks::for_message(&message("a", "", true), "a"), Ticks::Read);
        assert_eq!(Ticks::for_message(&message("b", "", false), "a"), Ticks::None);
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_bubble(&message("bob", "<script>alert(1)</script>", false), "alice");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_linkify() {
        let out = linkify("see https://example.com/a?b=1&c=2 now");
        assert!(out.starts_with("see <a href=\"https://example.com/a?b=1&amp;c=2\""));
        assert!(out.contains("target=\"_blank\""));
        assert!(out.ends_with("</a> now"));
    }

    #[test]
    fn test_linkify_plain_text_untouched() {
        assert_eq!(linkify("no links here"), "no links here");
    }

    #[test]
    fn test_chat_page_lists_bubbles_and_warning() {
        let view = ChatView {
            user: "alice".to_string(),
            partner: "bob".to_string(),
            messages: vec![message("alice", "first", false), message("bob", "second", true)],
            warning: Some(crate::store::LoadWarning::Corrupted {
                path: "x.json".into(),
                detail: "eof".to_string(),
            }),
        };
        let html = render_chat_page("MyChatPro", &view, &[]);
        assert!(html.contains("Logged in as: <b>alice</b>"));
        assert!(html.contains("Chatting with: <b>bob</b>"));
        assert!(html.find("first").unwrap() < html.find("second").unwrap());
        assert!(html.contains("corrupted"));
    }

    #[test]
    fn test_login_page_shows_notice() {
        let notice = Notice::new(NoticeLevel::Error, "Invalid username or password");
        let html = render_login_page("MyChatPro", Some(&notice));
        assert!(html.contains("action=\"/login\""));
        assert!(html.contains("Invalid username or password"));
    }
}
