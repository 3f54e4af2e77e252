#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Max,
    Min,
    Vars,

    // Literals
    Ident,
    Number,

    // Operators
    Plus,
    Minus,
    Star,
    Colon,
    Comma,

    // Relations
    Le,
    Ge,
    Eq,

    // Special
    Newline,
    Comment,
    Eof,
    Error,
}

/// A lexeme together with where it sits in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Byte-offset scanner over problem text.
///
/// Iterating yields every token up to and including a single `Eof`.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            done: false,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn token_from(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pos),
            text: self.source[start..self.pos].to_string(),
        }
    }

    /// `//` runs to the end of the line, `/* */` to its closer or end of input.
    fn comment(&mut self, start: usize) -> Token {
        self.bump();
        if self.peek() == Some('/') {
            self.eat_while(|c| c != '\n');
        } else {
            self.bump();
            match self.rest().find("*/") {
                Some(end) => self.pos += end + 2,
                None => self.pos = self.source.len(),
            }
        }
        self.token_from(TokenKind::Comment, start)
    }

    fn number(&mut self, start: usize) -> Token {
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        self.token_from(TokenKind::Number, start)
    }

    fn word(&mut self, start: usize) -> Token {
        self.eat_while(|c| c.is_alphanumeric() || c == '_');
        let kind = match &self.source[start..self.pos] {
            "max" | "maximize" => TokenKind::Max,
            "min" | "minimize" => TokenKind::Min,
            "vars" => TokenKind::Vars,
            _ => TokenKind::Ident,
        };
        self.token_from(kind, start)
    }

    /// Consumes one char, then a trailing `=` if present.
    /// A bare `<` or `>` becomes an error token.
    fn relation(&mut self, kind: TokenKind, start: usize) -> Token {
        self.bump();
        let kind = if self.peek() == Some('=') {
            self.bump();
            kind
        } else if kind == TokenKind::Eq {
            kind
        } else {
            TokenKind::Error
        };
        self.token_from(kind, start)
    }

    pub fn next_token(&mut self) -> Token {
        self.eat_while(|c| matches!(c, ' ' | '\t' | '\r'));
        let start = self.pos;

        let Some(c) = self.peek() else {
            return self.token_from(TokenKind::Eof, start);
        };

        let single = match c {
            '\n' | ';' => Some(TokenKind::Newline),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '≤' => Some(TokenKind::Le),
            '≥' => Some(TokenKind::Ge),
            _ => None,
        };
        if let Some(kind) = single {
            self.bump();
            return self.token_from(kind, start);
        }

        match c {
            '/' if matches!(self.peek_next(), Some('/' | '*')) => self.comment(start),
            '<' => self.relation(TokenKind::Le, start),
            '>' => self.relation(TokenKind::Ge, start),
            '=' => self.relation(TokenKind::Eq, start),
            '0'..='9' => self.number(start),
            '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.number(start),
            c if c.is_alphabetic() || c == '_' => self.word(start),
            _ => {
                self.bump();
                self.token_from(TokenKind::Error, start)
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        self.done = token.kind == TokenKind::Eof;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("max min maximize minimize vars"),
            vec![
                TokenKind::Max,
                TokenKind::Min,
                TokenKind::Max,
                TokenKind::Min,
                TokenKind::Vars,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::tokenize("100 8.5 0.005 .25");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["100", "8.5", "0.005", ".25", ""]);
    }

    #[test]
    fn test_coefficient_then_variable() {
        let tokens = Lexer::tokenize("3x1");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "3");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].text, "x1");
        assert_eq!(tokens[1].span, Span::new(1, 3));
    }

    #[test]
    fn test_relations() {
        assert_eq!(
            kinds("<= >= = == ≤ ≥ <"),
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Eq,
                TokenKind::Eq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Error,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * : ,"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("x // comment\ny /* block */ z"),
            vec![
                TokenKind::Ident,
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Comment,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_problem_snippet() {
        let source = "max: 3x + 5y\n3x + 2y <= 18";
        let kinds: Vec<_> = kinds(source)
            .into_iter()
            .filter(|k| *k != TokenKind::Newline)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Max,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Ident,
                TokenKind::Number,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Ident,
                TokenKind::Le,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }
}
