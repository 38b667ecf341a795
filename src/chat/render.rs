use console::{Alignment, measure_text_width, pad_str, style};

use super::{Role, TranscriptEntry};

/// Share of the terminal width a message may occupy, in percent
const MESSAGE_WIDTH_PERCENT: usize = 70;
const MIN_MESSAGE_WIDTH: usize = 20;

/// Lay out the transcript as terminal lines, oldest entry first.
///
/// User messages hug the right edge, assistant messages the left. Each
/// message is followed by a dimmed timestamp and a blank separator line.
#[inline]
pub fn render_transcript(entries: &[TranscriptEntry], width: usize) -> Vec<String> {
    let message_width = (width * MESSAGE_WIDTH_PERCENT / 100).max(MIN_MESSAGE_WIDTH);
    let width = width.max(message_width);

    let mut lines = Vec::new();
    for entry in entries {
        let alignment = match entry.role {
            Role::User => Alignment::Right,
            Role::Assistant => Alignment::Left,
        };

        for line in wrap_text(&entry.text, message_width) {
            let styled = match entry.role {
                Role::User => style(line).cyan().to_string(),
                Role::Assistant => line,
            };
            lines.push(align(&styled, width, alignment));
        }

        let timestamp = entry.timestamp.format("%I:%M %p").to_string();
        lines.push(align(&style(timestamp).dim().to_string(), width, alignment));
        lines.push(String::new());
    }
    lines
}

fn align(text: &str, width: usize, alignment: Alignment) -> String {
    match alignment {
        Alignment::Left => text.to_string(),
        _ => pad_str(text, width, alignment, None).into_owned(),
    }
}

/// Greedy word wrap that keeps explicit line breaks and splits words too
/// long to fit
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            for piece in split_long_word(word, width) {
                let needed = if current.is_empty() {
                    measure_text_width(&piece)
                } else {
                    measure_text_width(&current) + 1 + measure_text_width(&piece)
                };

                if needed > width && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&piece);
            }
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_long_word(word: &str, width: usize) -> Vec<String> {
    if measure_text_width(word) <= width {
        return vec![word.to_string()];
    }

    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}
