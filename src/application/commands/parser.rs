//! Command parser - Prefix stripping and tokenizing of raw message text

/// Splits raw chat text into command tokens
///
/// Prefixes are tried in configured order and must match literally, case
/// included. The remainder is split on single spaces, so `"a  b"` yields an
/// empty middle token; trailing empty tokens are dropped.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefixes: Vec<String>,
}

impl CommandParser {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Text after the first matching prefix
    pub fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .find_map(|prefix| text.strip_prefix(prefix.as_str()))
    }

    pub fn tokenize(body: &str) -> Vec<String> {
        let mut tokens: Vec<String> = body.split(' ').map(str::to_string).collect();
        while tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }
        tokens
    }

    /// Tokens of a command message; `None` if the text is not a command
    pub fn parse(&self, text: &str) -> Option<Vec<String>> {
        let body = self.strip_prefix(text)?;
        let tokens = Self::tokenize(body);
        if tokens.is_empty() {
            return None;
        }
        Some(tokens)
    }
}
