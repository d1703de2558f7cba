use crate::{
    Node, ParseError,
    filter::{continues_with_time, interpret},
    tokenizer::Token,
};

/// Builds the AND/OR tree for a token stream.
///
/// Juxtaposition is AND, and a separator after a term starts an OR run that
/// lasts until a term with no separator after it. A parenthesized group is
/// one child of the AND or OR group it appears in, and never starts an OR run
/// itself. Unbalanced parentheses are tolerated: a missing `)` closes at the
/// end of input.
pub fn parse_tokens(tokens: &[Token]) -> Result<Node, ParseError> {
    Parser { tokens, pos: 0 }.parse_level()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn parse_level(&mut self) -> Result<Node, ParseError> {
        let mut and_group = Vec::new();

        while let Some(token) = self.peek() {
            match token {
                Token::Close => {
                    self.pos += 1;
                    break;
                }
                Token::Or => self.pos += 1,
                Token::Open => and_group.push(self.group()?),
                Token::Term(text) => {
                    let filter = self.leaf(text)?;
                    if self.peek() == Some(&Token::Or) {
                        and_group.push(self.or_group(filter)?);
                    } else {
                        and_group.push(filter);
                    }
                }
            }
        }

        Ok(collapse(and_group))
    }

    /// Continues an OR run whose first term was just parsed. Groups join the
    /// run without ending it; the run ends after a term that no separator
    /// follows, or before a `)`.
    fn or_group(&mut self, first: Node) -> Result<Node, ParseError> {
        let mut alternatives = vec![first];

        while let Some(token) = self.peek() {
            match token {
                Token::Or => self.pos += 1,
                Token::Close => break,
                Token::Open => alternatives.push(self.group()?),
                Token::Term(text) => {
                    alternatives.push(self.leaf(text)?);
                    if self.peek() != Some(&Token::Or) {
                        break;
                    }
                }
            }
        }

        Ok(Node::Or(alternatives))
    }

    /// The group opened at the cursor, up to and including its `)`.
    fn group(&mut self) -> Result<Node, ParseError> {
        self.pos += 1;
        self.parse_level()
    }

    /// Interprets the term at the cursor, pulling in a following time of day
    /// when the term is a date filter that lacks one.
    fn leaf(&mut self, text: &str) -> Result<Node, ParseError> {
        self.pos += 1;
        if let Some(Token::Term(time)) = self.peek() {
            if continues_with_time(text, time) {
                self.pos += 1;
                return interpret(&format!("{text} {time}")).map(Node::Filter);
            }
        }
        interpret(text).map(Node::Filter)
    }
}

fn collapse(mut children: Vec<Node>) -> Node {
    match children.len() {
        0 => Node::match_all(),
        1 => children.remove(0),
        _ => Node::And(children),
    }
}
