// Filter expression lexer

use super::token::Token;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: String) -> Self {
        let input: Vec<char> = input.chars().collect();
        let current_char = input.first().copied();
        Lexer {
            input,
            position: 0,
            current_char,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let ch = match self.current_char {
            Some(ch) => ch,
            None => return Token::Eof,
        };

        match ch {
            '+' => self.single(Token::Plus),
            '-' => {
                self.advance();
                match self.current_char {
                    Some('-') => {
                        self.skip_comment();
                        self.next_token()
                    }
                    Some('>') => self.single(Token::Arrow),
                    _ => Token::Minus,
                }
            }
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '=' => self.single(Token::Equal),
            '<' => {
                self.advance();
                match self.current_char {
                    Some('=') => self.single(Token::LessEqual),
                    Some('>') => self.single(Token::NotEqual),
                    _ => Token::Less,
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.single(Token::GreaterEqual)
                } else {
                    Token::Greater
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.single(Token::NotEqual)
                } else {
                    Token::Illegal('!')
                }
            }
            '|' => {
                self.advance();
                if self.current_char == Some('|') {
                    self.single(Token::Concat)
                } else {
                    Token::Pipe
                }
            }
            '&' => self.single(Token::Ampersand),
            '^' => self.single(Token::Caret),
            '~' => self.single(Token::Tilde),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            '.' => self.single(Token::Dot),
            '\'' => self.read_string(),
            '"' | '`' => self.read_quoted_identifier(ch),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            c => self.single(Token::Illegal(c)),
        }
    }

    /// Consume the current character and return `token`
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip single-line comments starting with --
    fn skip_comment(&mut self) {
        while let Some(ch) = self.current_char {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a quoted identifier (e.g., "order date" or `order date`)
    fn read_quoted_identifier(&mut self, quote: char) -> Token {
        self.advance(); // Skip opening quote
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                if self.peek() == Some(quote) {
                    identifier.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Token::Identifier(identifier);
                }
            } else {
                identifier.push(ch);
                self.advance();
            }
        }

        Token::Unterminated(quote)
    }

    /// Read a string literal
    fn read_string(&mut self) -> Token {
        self.advance(); // Skip opening quote
        let mut string = String::new();

        while let Some(ch) = self.current_char {
            if ch == '\'' {
                if self.peek() == Some('\'') {
                    // Handle escaped single quotes
                    string.push('\'');
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // Skip closing quote
                    return Token::String(string);
                }
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Token::Unterminated('\'')
    }

    /// Read a number (integer or decimal)
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        tokens
    }
}
