use serde::Serialize;

/// How far back [`Tokenizer::field_value_ends_at`] looks for a `name:` prefix.
const FIELD_PREFIX_WINDOW: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    /// Grouping `(`.
    Open,
    /// Grouping `)`.
    Close,
    /// Alternative separator. `|` anywhere, `~` and `,` inside a group.
    Or,
    /// A bare tag or a `field:value` term, possibly negated.
    Term(String),
}

/// Splits a cleaned query into terms and structural markers.
///
/// Parentheses are the hard part: tags in the wild carry parenthesized
/// qualifiers (`samus_aran_(metroid)`) and field values may contain them too,
/// so a paren only becomes a grouping token when it is not glued to a word and
/// not part of a `field:` value.
pub fn tokenize(query: &str) -> Vec<Token> {
    Tokenizer::new(query).run()
}

struct Tokenizer {
    chars: Vec<char>,
    tokens: Vec<Token>,
    buffer: String,
    depth: usize,
    in_field_value: bool,
}

impl Tokenizer {
    fn new(query: &str) -> Self {
        Self {
            chars: query.chars().collect(),
            tokens: Vec::new(),
            buffer: String::new(),
            depth: 0,
            in_field_value: false,
        }
    }

    fn run(mut self) -> Vec<Token> {
        for i in 0..self.chars.len() {
            let ch = self.chars[i];

            if ch == ':' && self.buffer.chars().next_back().is_some_and(char::is_alphanumeric) {
                self.buffer.push(ch);
                self.in_field_value = true;
                continue;
            }

            if ch == ' ' && self.depth == 0 {
                self.in_field_value = false;
            }

            match ch {
                '(' => self.open_paren(i),
                ')' => self.close_paren(i),
                '|' => self.separator(),
                '~' | ',' if self.depth > 0 => self.separator(),
                ' ' => self.space(i),
                _ => self.buffer.push(ch),
            }
        }
        self.flush();
        self.tokens
    }

    fn open_paren(&mut self, i: usize) {
        let literal = self.in_field_value
            || self.field_value_ends_at(i)
            || self.buffer.chars().next_back().is_some_and(is_word_char);
        if literal {
            self.buffer.push('(');
            return;
        }
        if self.depth == 0 {
            self.flush();
        }
        self.depth += 1;
        self.tokens.push(Token::Open);
    }

    fn close_paren(&mut self, i: usize) {
        let literal = self.in_field_value
            || self.field_value_ends_at(i + 1)
            || self.chars.get(i + 1).copied().is_some_and(is_word_char)
            || self.depth == 0
            || self.buffer_has_open_paren();
        if literal {
            self.buffer.push(')');
            return;
        }
        self.flush();
        self.depth -= 1;
        self.tokens.push(Token::Close);
    }

    /// The buffer holds a literal `(` still waiting for its `)`.
    fn buffer_has_open_paren(&self) -> bool {
        let opened = self.buffer.matches('(').count();
        let closed = self.buffer.matches(')').count();
        opened > closed
    }

    fn separator(&mut self) {
        self.flush();
        self.tokens.push(Token::Or);
    }

    fn space(&mut self, i: usize) {
        if self.depth == 0 {
            self.flush();
            return;
        }
        if self.buffer.trim().is_empty() {
            return;
        }
        // Inside a group a space only ends the term when a structural token
        // follows; otherwise multi-word tags stay together.
        let next = self.chars[i + 1..].iter().copied().find(|&c| c != ' ');
        if matches!(next, Some('|' | '~' | ',' | ')' | '(')) {
            self.flush();
        } else {
            self.buffer.push(' ');
        }
    }

    fn flush(&mut self) {
        let term = self.buffer.trim();
        if !term.is_empty() {
            self.tokens.push(Token::Term(term.to_string()));
            self.buffer.clear();
        }
    }

    /// True when the text right before `pos` (within a bounded window) ends in
    /// an unbroken `word:value` run.
    fn field_value_ends_at(&self, pos: usize) -> bool {
        if pos == 0 {
            return false;
        }
        let start = pos.saturating_sub(FIELD_PREFIX_WINDOW);
        let window = &self.chars[start..pos];
        let segment_start = window
            .iter()
            .rposition(|c| c.is_whitespace())
            .map_or(0, |idx| idx + 1);
        let segment = &window[segment_start..];
        segment
            .iter()
            .enumerate()
            .any(|(idx, &c)| c == ':' && idx > 0 && is_word_char(segment[idx - 1]))
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
