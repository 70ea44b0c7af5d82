//! Outbound actions produced by the dispatcher.

use unicode_segmentation::UnicodeSegmentation;

/// Longest text sent in one message.
///
/// Telegram rejects messages above 4096 characters; the margin leaves room
/// for entities the platform counts differently.
pub const MESSAGE_CHAR_LIMIT: usize = 4000;

/// How the transport must interpret a reply's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    /// Sent as-is
    #[default]
    Plain,
    /// Telegram HTML subset
    Html,
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label
    pub label: String,
    /// Callback payload
    pub payload: String,
}

impl Button {
    /// Create a button.
    #[must_use]
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// An inline keyboard, row by row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    /// Button rows, top to bottom
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Every payload, in reading order.
    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|b| b.payload.as_str())
    }
}

/// Action the transport performs on behalf of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send a new message to the user
    Send {
        /// Message text
        text: String,
        /// Text interpretation
        format: TextFormat,
        /// Optional inline keyboard
        keyboard: Option<Keyboard>,
    },
    /// Replace the text of the message the pressed button belongs to
    EditText {
        /// New text
        text: String,
        /// Text interpretation
        format: TextFormat,
        /// Optional inline keyboard
        keyboard: Option<Keyboard>,
    },
    /// Replace only the keyboard of the message the pressed button belongs to
    EditKeyboard {
        /// New keyboard
        keyboard: Keyboard,
    },
    /// Dismiss the button spinner
    AnswerCallback,
}

impl Reply {
    /// Plain message without keyboard.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Send {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: None,
        }
    }

    /// Plain message with a keyboard.
    #[must_use]
    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self::Send {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: Some(keyboard),
        }
    }

    /// Text of a `Send` or `EditText` reply.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Send { text, .. } | Self::EditText { text, .. } => Some(text),
            Self::EditKeyboard { .. } | Self::AnswerCallback => None,
        }
    }

    /// Keyboard attached to the reply, if any.
    #[must_use]
    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Self::Send { keyboard, .. } | Self::EditText { keyboard, .. } => keyboard.as_ref(),
            Self::EditKeyboard { keyboard } => Some(keyboard),
            Self::AnswerCallback => None,
        }
    }
}

/// Split text into parts of at most `max_chars` characters.
///
/// Parts break after a newline where possible, otherwise between grapheme
/// clusters. Concatenating the parts yields the input unchanged.
#[must_use]
pub fn split_long_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len <= max_chars {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= max_chars {
            current.push_str(line);
            current_len = line_len;
            continue;
        }

        // A single line longer than the limit
        for grapheme in line.graphemes(true) {
            let grapheme_len = grapheme.chars().count();
            if current_len + grapheme_len > max_chars && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(grapheme);
            current_len += grapheme_len;
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_is_one_part() {
        assert_eq!(split_long_text("hello", 10), vec!["hello".to_string()]);
        assert_eq!(split_long_text("", 10), vec![String::new()]);
    }

    #[test]
    fn test_split_prefers_line_breaks() {
        let parts = split_long_text("aaaa\nbbbb\ncccc", 10);
        assert_eq!(parts, vec!["aaaa\nbbbb\n".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_split_long_line_counts_characters() {
        let text = "中".repeat(25);
        let parts = split_long_text(&text, 10);
        let lens: Vec<usize> = parts.iter().map(|p| p.chars().count()).collect();
        assert_eq!(lens, vec![10, 10, 5]);
    }

    proptest! {
        #[test]
        fn split_preserves_text_within_limit(
            text in "[a-zA-Z0-9 \n\u{0627}-\u{064A}\u{4E2D}\u{6587}]{0,400}",
            max_chars in 8usize..64,
        ) {
            let parts = split_long_text(&text, max_chars);
            prop_assert_eq!(parts.concat(), text);
            for part in &parts {
                prop_assert!(part.chars().count() <= max_chars);
            }
        }
    }
}
