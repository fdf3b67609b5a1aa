//! Ready-made card markup for common bot events.
//!
//! Each builder returns a `<div>` document for [`Canvas::render`]. Every
//! interpolated value is HTML-escaped. Layout properties the built-in
//! engine does not know (`display: flex`, `gap`, ...) are passed through
//! for external layout engines.
//!
//! [`Canvas::render`]: crate::Canvas::render

use std::fmt::Write as _;

use serde::Deserialize;

pub const DEFAULT_BACKGROUND: &str = "linear-gradient(135deg, #667eea 0%, #764ba2 100%)";
pub const LEVEL_UP_BACKGROUND: &str = "linear-gradient(135deg, #f093fb 0%, #f5576c 100%)";
pub const RANK_ACCENT: &str = "#7289DA";
pub const GOLD: &str = "#FFD700";
pub const WELCOME_MESSAGE: &str = "Welcome to the server!";

pub const RANK_CARD_SIZE: (u32, u32) = (934, 282);
pub const WELCOME_CARD_SIZE: (u32, u32) = (800, 400);
pub const LEVEL_UP_CARD_SIZE: (u32, u32) = (600, 300);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankCardData {
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u64,
    #[serde(rename = "requiredXP")]
    pub required_xp: u64,
    pub rank: u32,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    /// Image URL drawn instead of `background_color`
    #[serde(default)]
    pub background_image: Option<String>,
}

impl RankCardData {
    /// Progress towards the next level in percent, clamped to 0..=100.
    pub fn progress(&self) -> f64 {
        if self.required_xp == 0 {
            return 0.0;
        }
        (self.current_xp as f64 / self.required_xp as f64 * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeCardData {
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    pub guild_name: String,
    pub member_count: u64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    /// Image URL drawn instead of `background_color`
    #[serde(default)]
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpData {
    pub username: String,
    pub old_level: u32,
    pub new_level: u32,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

/// `username#discriminator`, or just the username.
pub fn display_name(username: &str, discriminator: Option<&str>) -> String {
    match discriminator.filter(|d| !d.is_empty()) {
        Some(d) => format!("{}#{}", username, d),
        None => username.to_string(),
    }
}

/// Root background declarations: a covering, centered image when one is
/// given, otherwise the color or gradient. The built-in layout does not fetch
/// images and paints the canvas background color behind them.
fn background_style(image: Option<&str>, color: Option<&str>) -> String {
    match image.filter(|url| !url.is_empty()) {
        Some(url) => format!(
            "background-image: url({}); background-size: cover; background-position: center;",
            escape(url)
        ),
        None => format!("background: {};", escape(color.unwrap_or(DEFAULT_BACKGROUND))),
    }
}

pub fn rank_card(data: &RankCardData) -> String {
    let background = background_style(
        data.background_image.as_deref(),
        data.background_color.as_deref(),
    );
    let accent = escape(data.accent_color.as_deref().unwrap_or(RANK_ACCENT));
    let progress = data.progress();
    let (w, h) = RANK_CARD_SIZE;

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div style="width: {w}px; height: {h}px; {background} border-radius: 20px; padding: 30px; font-family: Arial, sans-serif; display: flex; flex-direction: column;">"#
    );
    let _ = write!(
        html,
        r#"<h1 style="font-size: 42px; font-weight: bold; color: white; margin: 0 0 10px 0;">{}</h1>"#,
        escape(&data.username)
    );
    if let Some(d) = data.discriminator.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(
            html,
            r#"<span style="font-size: 28px; color: rgba(255,255,255,0.7);">#{}</span>"#,
            escape(d)
        );
    }
    let _ = write!(
        html,
        r#"<div style="display: flex; gap: 40px; margin: 10px 0 20px 0;"><span style="font-size: 32px; font-weight: bold; color: {accent};">Rank #{rank}</span><span style="font-size: 32px; font-weight: bold; color: {accent};">Level {level}</span></div>"#,
        rank = data.rank,
        level = data.level,
    );
    let _ = write!(
        html,
        r#"<p style="font-size: 16px; color: rgba(255,255,255,0.9); margin: 0 0 8px 0;">{} / {} XP ({}%)</p>"#,
        group_thousands(data.current_xp),
        group_thousands(data.required_xp),
        progress.round()
    );
    let _ = write!(
        html,
        r#"<div style="width: 100%; height: 30px; background: rgba(0,0,0,0.3); border-radius: 15px;"><div style="width: {progress:.2}%; height: 30px; background: {accent}; border-radius: 15px;"></div></div>"#
    );
    html.push_str("</div>");
    html
}

pub fn welcome_card(data: &WelcomeCardData) -> String {
    let background = background_style(
        data.background_image.as_deref(),
        data.background_color.as_deref(),
    );
    let message = escape(data.message.as_deref().unwrap_or(WELCOME_MESSAGE));
    let name = escape(&display_name(&data.username, data.discriminator.as_deref()));
    let (w, h) = WELCOME_CARD_SIZE;

    format!(
        concat!(
            r#"<div style="width: {w}px; height: {h}px; {background} border-radius: 20px; padding: 40px; text-align: center; font-family: Arial, sans-serif;">"#,
            r#"<h1 style="font-size: 48px; font-weight: bold; color: white; margin: 0 0 10px 0;">{message}</h1>"#,
            r#"<h2 style="font-size: 36px; font-weight: bold; color: {gold}; margin: 0 0 20px 0;">{name}</h2>"#,
            r#"<div style="background: rgba(0,0,0,0.5); padding: 15px 30px; border-radius: 10px; margin: 10px 0 0 0;">"#,
            r#"<p style="font-size: 20px; color: rgba(255,255,255,0.9); margin: 0;">You are member #{count}</p>"#,
            r#"<p style="font-size: 18px; color: rgba(255,255,255,0.8); margin: 5px 0 0 0;">{guild}</p>"#,
            "</div></div>"
        ),
        w = w,
        h = h,
        background = background,
        message = message,
        gold = GOLD,
        name = name,
        count = group_thousands(data.member_count),
        guild = escape(&data.guild_name),
    )
}

pub fn level_up_card(data: &LevelUpData) -> String {
    let bg = escape(data.background_color.as_deref().unwrap_or(LEVEL_UP_BACKGROUND));
    let accent = escape(data.accent_color.as_deref().unwrap_or(GOLD));
    let (w, h) = LEVEL_UP_CARD_SIZE;

    format!(
        concat!(
            r#"<div style="width: {w}px; height: {h}px; background: {bg}; border-radius: 20px; padding: 30px; text-align: center; font-family: Arial, sans-serif;">"#,
            r#"<h1 style="font-size: 42px; font-weight: bold; color: white; margin: 0 0 15px 0;">🎉 LEVEL UP! 🎉</h1>"#,
            r#"<h2 style="font-size: 28px; font-weight: bold; color: {accent}; margin: 0 0 10px 0;">{name}</h2>"#,
            r#"<div style="background: rgba(0,0,0,0.5); padding: 10px 20px; border-radius: 10px;">"#,
            r#"<p style="font-size: 32px; font-weight: bold; color: white; margin: 0;">{old} → {new}</p>"#,
            "</div></div>"
        ),
        w = w,
        h = h,
        bg = bg,
        accent = accent,
        name = escape(&data.username),
        old = data.old_level,
        new = data.new_level,
    )
}

/// Escape text for element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
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

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
