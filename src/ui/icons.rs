//! Shared UI icons.
//!
//! Each icon falls back to a plain-text marker on terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Review indicators
pub static CLIPBOARD: Emoji<'_, '_> = Emoji("📋 ", "");
pub static PIVOT: Emoji<'_, '_> = Emoji("🔄 ", "[~]");
pub static HOTEL: Emoji<'_, '_> = Emoji("🏨 ", "");
