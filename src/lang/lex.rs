use super::token::*;

/// Splits ST source into positioned tokens. Whitespace and comments are
/// dropped. Anything unrecognized becomes `Token::Unknown` so the parser
/// can report it with a position.
pub fn lex(s: &str) -> Vec<Spanned> {
    StLexer::lex(s)
}

fn is_st_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

fn is_st_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_st_alphanumeric(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

trait Tokenizers<'a> {
    fn chars(&mut self) -> &mut std::iter::Peekable<std::str::Chars<'a>>;
    fn bump(&mut self) -> Option<char>;
    fn peek_second(&self) -> Option<char>;

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.chars().peek() {
            if *ch == '\n' {
                return;
            }
            self.bump();
        }
    }

    /// Returns false when the input ends before `*)`.
    fn skip_block_comment(&mut self) -> bool {
        self.bump();
        self.bump();
        let mut prev = '\0';
        while let Some(ch) = self.bump() {
            if prev == '*' && ch == ')' {
                return true;
            }
            prev = ch;
        }
        false
    }

    fn number(&mut self) -> Token {
        let mut s = String::new();
        while let Some(&ch) = self.chars().peek() {
            if ch.is_ascii_digit() || ch == '_' {
                self.bump();
                if ch != '_' {
                    s.push(ch);
                }
            } else {
                break;
            }
        }
        if s == "0" {
            if let Some('x') | Some('X') = self.chars().peek() {
                self.bump();
                return self.based(16, "0X");
            }
        }
        if let Some('#') = self.chars().peek() {
            self.bump();
            return match s.as_str() {
                "2" => self.based(2, "2#"),
                "8" => self.based(8, "8#"),
                "16" => self.based(16, "16#"),
                _ => Token::Unknown(format!("{}#", s)),
            };
        }
        let mut real = false;
        if let Some('.') = self.chars().peek() {
            if let Some(d) = self.peek_second() {
                if d.is_ascii_digit() {
                    real = true;
                    self.bump();
                    s.push('.');
                    while let Some(&ch) = self.chars().peek() {
                        if ch.is_ascii_digit() || ch == '_' {
                            self.bump();
                            if ch != '_' {
                                s.push(ch);
                            }
                        } else {
                            break;
                        }
                    }
                }
            }
        }
        if let Some('e') | Some('E') = self.chars().peek() {
            let follows_digit = match self.peek_second() {
                Some(d) => d.is_ascii_digit() || d == '+' || d == '-',
                None => false,
            };
            if follows_digit {
                real = true;
                self.bump();
                s.push('E');
                if let Some(&sign) = self.chars().peek() {
                    if sign == '+' || sign == '-' {
                        self.bump();
                        s.push(sign);
                    }
                }
                while let Some(&ch) = self.chars().peek() {
                    if ch.is_ascii_digit() {
                        self.bump();
                        s.push(ch);
                    } else {
                        break;
                    }
                }
            }
        }
        if real {
            match s.parse::<f64>() {
                Ok(n) => Token::Literal(Literal::Real(n)),
                Err(_) => Token::Unknown(s),
            }
        } else {
            match s.parse::<i64>() {
                Ok(n) if n <= u32::max_value() as i64 => Token::Literal(Literal::Integer(n)),
                _ => Token::Unknown(s),
            }
        }
    }

    fn based(&mut self, radix: u32, prefix: &str) -> Token {
        let mut s = String::new();
        while let Some(&ch) = self.chars().peek() {
            if ch.is_digit(radix) || ch == '_' {
                self.bump();
                if ch != '_' {
                    s.push(ch);
                }
            } else if is_st_alphanumeric(ch) {
                self.bump();
                return Token::Unknown(format!("{}{}{}", prefix, s, ch));
            } else {
                break;
            }
        }
        match u32::from_str_radix(&s, radix) {
            Ok(n) => Token::Literal(Literal::Integer(n as i64)),
            Err(_) => Token::Unknown(format!("{}{}", prefix, s)),
        }
    }

    fn alphabetic(&mut self) -> Token {
        let mut s = String::new();
        while let Some(&ch) = self.chars().peek() {
            if is_st_alphanumeric(ch) {
                self.bump();
                s.push(ch.to_ascii_uppercase());
            } else {
                break;
            }
        }
        match Token::from_string(&s) {
            Some(token) => token,
            None => Token::Ident(s),
        }
    }

    fn minutia(&mut self) -> Token {
        let ch = match self.bump() {
            Some(ch) => ch,
            None => return Token::Unknown(String::new()),
        };
        let next = self.chars().peek().cloned();
        let pair = match (ch, next) {
            (':', Some('=')) => Some(Token::Assign),
            ('<', Some('=')) => Some(Token::Operator(Operator::LessEqual)),
            ('<', Some('>')) => Some(Token::Operator(Operator::NotEqual)),
            ('>', Some('=')) => Some(Token::Operator(Operator::GreaterEqual)),
            ('.', Some('.')) => Some(Token::Range),
            _ => None,
        };
        if let Some(token) = pair {
            self.bump();
            return token;
        }
        match ch {
            ':' => Token::Colon,
            '<' => Token::Operator(Operator::Less),
            '>' => Token::Operator(Operator::Greater),
            '=' => Token::Operator(Operator::Equal),
            '+' => Token::Operator(Operator::Plus),
            '-' => Token::Operator(Operator::Minus),
            '*' => Token::Operator(Operator::Multiply),
            '/' => Token::Operator(Operator::Divide),
            '&' => Token::Operator(Operator::And),
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            _ => Token::Unknown(ch.to_string()),
        }
    }
}

struct StLexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    rest: &'a str,
    line: u16,
    col: usize,
}

impl<'a> Tokenizers<'a> for StLexer<'a> {
    fn chars(&mut self) -> &mut std::iter::Peekable<std::str::Chars<'a>> {
        &mut self.chars
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.rest = &self.rest[ch.len_utf8()..];
        if ch == '\n' {
            self.line = self.line.saturating_add(1);
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn peek_second(&self) -> Option<char> {
        self.rest.chars().nth(1)
    }
}

impl<'a> StLexer<'a> {
    fn lex(s: &'a str) -> Vec<Spanned> {
        let mut lexer = StLexer {
            chars: s.chars().peekable(),
            rest: s,
            line: 1,
            col: 0,
        };
        let mut tokens = vec![];
        while let Some(spanned) = lexer.next_spanned() {
            tokens.push(spanned);
        }
        tokens
    }

    fn next_spanned(&mut self) -> Option<Spanned> {
        loop {
            let pk = *self.chars.peek()?;
            if is_st_whitespace(pk) {
                self.bump();
                continue;
            }
            if pk == '/' && self.peek_second() == Some('/') {
                self.skip_line_comment();
                continue;
            }
            let line = self.line;
            let start = self.col;
            if pk == '(' && self.peek_second() == Some('*') {
                if self.skip_block_comment() {
                    continue;
                }
                return Some(Spanned {
                    token: Token::Unknown("(*".to_string()),
                    line,
                    column: start..start + 2,
                });
            }
            let token = if pk.is_ascii_digit() {
                self.number()
            } else if is_st_alphabetic(pk) {
                self.alphabetic()
            } else {
                self.minutia()
            };
            let end = if self.line == line { self.col } else { start + 1 };
            return Some(Spanned {
                token,
                line,
                column: start..end,
            });
        }
    }
}
