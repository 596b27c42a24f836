// Filter expression tokens for lexical analysis

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Keywords
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    Null,
    In,
    Exists,
    Between,
    Like,
    Is,
    True,
    False,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    As,
    Div,

    // Typed literal prefixes
    Date,
    Time,
    Timestamp,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Concat,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    Arrow,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Dot,

    // Special
    Illegal(char),
    /// Quoted string or identifier with no closing quote
    Unterminated(char),
    Eof,
}

impl Token {
    /// Check if the token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Select
                | Token::From
                | Token::Where
                | Token::And
                | Token::Or
                | Token::Not
                | Token::Null
                | Token::In
                | Token::Exists
                | Token::Between
                | Token::Like
                | Token::Is
                | Token::True
                | Token::False
                | Token::Case
                | Token::When
                | Token::Then
                | Token::Else
                | Token::End
                | Token::Cast
                | Token::As
                | Token::Div
                | Token::Date
                | Token::Time
                | Token::Timestamp
        )
    }

    /// Convert a string to a keyword token if it matches
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "SELECT" => Some(Token::Select),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "NOT" => Some(Token::Not),
            "NULL" => Some(Token::Null),
            "IN" => Some(Token::In),
            "EXISTS" => Some(Token::Exists),
            "BETWEEN" => Some(Token::Between),
            "LIKE" => Some(Token::Like),
            "IS" => Some(Token::Is),
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),
            "CASE" => Some(Token::Case),
            "WHEN" => Some(Token::When),
            "THEN" => Some(Token::Then),
            "ELSE" => Some(Token::Else),
            "END" => Some(Token::End),
            "CAST" => Some(Token::Cast),
            "AS" => Some(Token::As),
            "DIV" => Some(Token::Div),
            "DATE" => Some(Token::Date),
            "TIME" => Some(Token::Time),
            "TIMESTAMP" => Some(Token::Timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Identifier(name) => return f.write_str(name),
            Token::Number(n) => return f.write_str(n),
            Token::String(s) => return write!(f, "'{}'", s.replace('\'', "''")),
            Token::Illegal(c) => return write!(f, "{}", c),
            Token::Unterminated(quote) => return write!(f, "unterminated {}", quote),
            Token::Select => "SELECT",
            Token::From => "FROM",
            Token::Where => "WHERE",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::Null => "NULL",
            Token::In => "IN",
            Token::Exists => "EXISTS",
            Token::Between => "BETWEEN",
            Token::Like => "LIKE",
            Token::Is => "IS",
            Token::True => "TRUE",
            Token::False => "FALSE",
            Token::Case => "CASE",
            Token::When => "WHEN",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::End => "END",
            Token::Cast => "CAST",
            Token::As => "AS",
            Token::Div => "DIV",
            Token::Date => "DATE",
            Token::Time => "TIME",
            Token::Timestamp => "TIMESTAMP",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Equal => "=",
            Token::NotEqual => "<>",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::Concat => "||",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Tilde => "~",
            Token::Arrow => "->",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Eof => "end of input",
        };
        f.write_str(text)
    }
}
