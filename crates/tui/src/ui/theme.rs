//! Nord palette mapped to the semantic roles the views draw with.

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders},
};

// Polar Night
const N0: Color = Color::Rgb(0x2E, 0x34, 0x40);
const N1: Color = Color::Rgb(0x3B, 0x42, 0x52);
const N3: Color = Color::Rgb(0x4C, 0x56, 0x6A);

// Snow Storm
const S0: Color = Color::Rgb(0xD8, 0xDE, 0xE9);
const S1: Color = Color::Rgb(0xE5, 0xE9, 0xF0);
const S2: Color = Color::Rgb(0xEC, 0xEF, 0xF4);

// Frost
const F1: Color = Color::Rgb(0x88, 0xC0, 0xD0);
const F2: Color = Color::Rgb(0x81, 0xA1, 0xC1);

// Aurora
const A_RED: Color = Color::Rgb(0xBF, 0x61, 0x6A);
const A_YELLOW: Color = Color::Rgb(0xEB, 0xCB, 0x8B);
const A_GREEN: Color = Color::Rgb(0xA3, 0xBE, 0x8C);

const TEXT_MUTED: Color = Color::Rgb(0x61, 0x6E, 0x88);

/// Semantic color roles used throughout the UI.
#[derive(Debug, Clone)]
pub struct ThemeRoles {
    pub background: Color,
    pub border: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub info: Color,
    pub success: Color,
    pub pending: Color,
    pub error: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub focus: Color,
}

pub const NORD: ThemeRoles = ThemeRoles {
    background: N0,
    border: N1,
    text: S0,
    text_secondary: S1,
    text_muted: TEXT_MUTED,
    accent: F1,
    info: F2,
    success: A_GREEN,
    pending: A_YELLOW,
    error: A_RED,
    selection_bg: N3,
    selection_fg: S2,
    focus: F1,
};

impl ThemeRoles {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn text_muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.focus } else { self.border })
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .fg(self.selection_fg)
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn status_style(&self, is_error: bool) -> Style {
        Style::default().fg(if is_error { self.error } else { self.success })
    }

    pub fn pending_style(&self) -> Style {
        Style::default().fg(self.pending)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }

    /// Bordered panel with a bold title; focused panels get the accent border.
    pub fn block(&self, title: &str, focused: bool) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(if focused { BorderType::Thick } else { BorderType::Plain })
            .border_style(self.border_style(focused))
            .style(Style::default().bg(self.background).fg(self.text))
            .title(Span::styled(
                format!(" {title} "),
                Style::default().fg(self.text_secondary).add_modifier(Modifier::BOLD),
            ))
    }
}
