use console::Style;

use crate::vm::{LogRowVm, Tone};

/// Background of odd stripes.
const STRIPE_BG: u8 = 236;

pub(crate) fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Plain => Style::new(),
        Tone::Warning => Style::new().yellow(),
        Tone::Error => Style::new().red(),
        Tone::Banner => Style::new().green().bold(),
        Tone::Muted => Style::new().dim(),
    }
}

pub(crate) fn paint_row(row: &LogRowVm, styled: bool) -> String {
    if !styled {
        return row.text.clone();
    }
    let mut style = tone_style(row.tone);
    if row.stripe == Some(1) {
        style = style.on_color256(STRIPE_BG);
    }
    style.force_styling(true).apply_to(&row.text).to_string()
}

pub(crate) fn paint(text: &str, style: Style, styled: bool) -> String {
    if styled {
        style.force_styling(true).apply_to(text).to_string()
    } else {
        text.to_owned()
    }
}
