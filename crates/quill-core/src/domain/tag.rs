use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag entity - a named label attachable to posts.
///
/// `post_count` is denormalized: it must always equal the number of posts
/// whose tag set contains this tag. Only the tag ledger may change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a tag for an already-normalized (trimmed, lower-cased) name.
    pub fn new(name: String) -> Self {
        let slug = slug::slugify(&name);
        let color = color_for(&name);
        Self {
            id: Uuid::new_v4(),
            name,
            slug,
            color,
            post_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Derive a stable display color from the tag name: hash the name to a hue
/// and convert from HSV at fixed saturation/value.
fn color_for(name: &str) -> String {
    let hash = name
        .bytes()
        .fold(5381u32, |h, b| h.wrapping_mul(33).wrapping_add(b as u32));
    let (r, g, b) = hsv_to_rgb((hash % 360) as f32, 0.55, 0.80);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Convert HSV (hue 0-360, saturation/value 0-1) to RGB bytes.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}
