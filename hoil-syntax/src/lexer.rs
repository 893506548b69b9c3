//! HOIL lexer (component D, `SPEC_FULL.md` §4.D).

use std::rc::Rc;

use crate::error::Error;
use crate::location::SourceLocation;

/// The fixed set of HOIL keywords (not type keywords, not mnemonics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Module,
    Target,
    Type,
    Constant,
    Global,
    Extern,
    Function,
    Entry,
}

impl Keyword {
    fn lookup(s: &str) -> Option<Self> {
        use Keyword::*;
        Some(match s {
            "MODULE" => Module,
            "TARGET" => Target,
            "TYPE" => Type,
            "CONSTANT" => Constant,
            "GLOBAL" => Global,
            "EXTERN" => Extern,
            "FUNCTION" => Function,
            "ENTRY" => Entry,
            _ => return None,
        })
    }
}

/// The fixed set of HOIL primitive type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKeyword {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
    Ptr,
    Vec,
    Array,
}

impl TypeKeyword {
    fn lookup(s: &str) -> Option<Self> {
        use TypeKeyword::*;
        Some(match s {
            "void" => Void,
            "bool" => Bool,
            "i8" => I8,
            "i16" => I16,
            "i32" => I32,
            "i64" => I64,
            "u8" => U8,
            "u16" => U16,
            "u32" => U32,
            "u64" => U64,
            "f16" => F16,
            "f32" => F32,
            "f64" => F64,
            "ptr" => Ptr,
            "vec" => Vec,
            "array" => Array,
            _ => return None,
        })
    }
}

/// The fixed set of HOIL instruction mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    Load,
    Store,
    Lea,
    Br,
    Call,
    Ret,
}

impl Mnemonic {
    fn lookup(s: &str) -> Option<Self> {
        use Mnemonic::*;
        Some(match s {
            "ADD" => Add,
            "SUB" => Sub,
            "MUL" => Mul,
            "DIV" => Div,
            "REM" => Rem,
            "NEG" => Neg,
            "AND" => And,
            "OR" => Or,
            "XOR" => Xor,
            "NOT" => Not,
            "SHL" => Shl,
            "SHR" => Shr,
            "CMP_EQ" => CmpEq,
            "CMP_NE" => CmpNe,
            "CMP_LT" => CmpLt,
            "CMP_LE" => CmpLe,
            "CMP_GT" => CmpGt,
            "CMP_GE" => CmpGe,
            "LOAD" => Load,
            "STORE" => Store,
            "LEA" => Lea,
            "BR" => Br,
            "CALL" => Call,
            "RET" => Ret,
            _ => return None,
        })
    }

    /// The mnemonic's spelling, as the parser echoes it back into
    /// diagnostics and the code generator maps it to a compact opcode.
    pub fn as_str(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Rem => "REM",
            Neg => "NEG",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
            Not => "NOT",
            Shl => "SHL",
            Shr => "SHR",
            CmpEq => "CMP_EQ",
            CmpNe => "CMP_NE",
            CmpLt => "CMP_LT",
            CmpLe => "CMP_LE",
            CmpGt => "CMP_GT",
            CmpGe => "CMP_GE",
            Load => "LOAD",
            Store => "STORE",
            Lea => "LEA",
            Br => "BR",
            Call => "CALL",
            Ret => "RET",
        }
    }
}

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Arrow,
    Eq,
    Lt,
    Gt,
    Keyword(Keyword),
    TypeKeyword(TypeKeyword),
    Mnemonic(Mnemonic),
    Ident(String),
    IntLit(i64),
    FloatLit(f64),
    /// The raw text between the quotes, `\`-escapes left undecoded
    /// (`SPEC_FULL.md` §4.D, §9 open question 4).
    StringLit(String),
    Eof,
}

/// A token and the location its first character started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

/// Tokenizes HOIL source text with one token of lookahead.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    file: Rc<str>,
    peeked: Option<Token>,
}

impl Lexer {
    /// A lexer over `source`, attributing diagnostics to `filename`.
    pub fn new(source: &str, filename: impl Into<Rc<str>>) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            file: filename.into(),
            peeked: None,
        }
    }

    fn loc(&self) -> SourceLocation {
        SourceLocation {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char2(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<(), Error> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char2() == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char2() == Some('*') => {
                    let start = self.loc();
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(c) = self.peek_char() {
                        if c == '*' && self.peek_char2() == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        return Err(Error::Syntax {
                            location: start,
                            message: "unterminated block comment".to_string(),
                        });
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_ident_or_keyword(&mut self, start: SourceLocation) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = if let Some(k) = Keyword::lookup(&s) {
            TokenKind::Keyword(k)
        } else if let Some(k) = TypeKeyword::lookup(&s) {
            TokenKind::TypeKeyword(k)
        } else if let Some(m) = Mnemonic::lookup(&s) {
            TokenKind::Mnemonic(m)
        } else {
            TokenKind::Ident(s)
        };
        Token {
            kind,
            location: start,
        }
    }

    fn lex_number(&mut self, start: SourceLocation, negative: bool) -> Result<Token, Error> {
        let mut s = String::new();
        if negative {
            s.push('-');
        }
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let mut is_float = false;
        if self.peek_char() == Some('.') && self.peek_char2().map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            s.push('.');
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let save = (self.pos, self.line, self.column);
            let mut exp = String::new();
            exp.push(self.advance().unwrap());
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                exp.push(self.advance().unwrap());
            }
            if self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                is_float = true;
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_digit() {
                        exp.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                s.push_str(&exp);
            } else {
                self.pos = save.0;
                self.line = save.1;
                self.column = save.2;
            }
        }
        let kind = if is_float {
            let v: f64 = s.parse().map_err(|_| Error::Syntax {
                location: start.clone(),
                message: format!("invalid float literal '{s}'"),
            })?;
            TokenKind::FloatLit(v)
        } else {
            let v: i64 = s.parse().map_err(|_| Error::Syntax {
                location: start.clone(),
                message: format!("invalid integer literal '{s}'"),
            })?;
            TokenKind::IntLit(v)
        };
        Ok(Token {
            kind,
            location: start,
        })
    }

    fn lex_string(&mut self, start: SourceLocation) -> Result<Token, Error> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(Error::Syntax {
                        location: start,
                        message: "unterminated string literal".to_string(),
                    })
                }
                Some('"') => break,
                Some('\\') => {
                    // Escapes are recognized (so a literal `"` inside the
                    // string doesn't end it) but not decoded here — see
                    // SPEC_FULL.md §9 open question 4.
                    s.push('\\');
                    if let Some(c) = self.advance() {
                        s.push(c);
                    }
                }
                Some(c) => s.push(c),
            }
        }
        Ok(Token {
            kind: TokenKind::StringLit(s),
            location: start,
        })
    }

    fn lex_one(&mut self) -> Result<Token, Error> {
        self.skip_trivia()?;
        let start = self.loc();
        let Some(c) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                location: start,
            });
        };
        let simple = |kind: TokenKind| Ok((kind, 1));
        let (kind, len): (TokenKind, usize) = match c {
            '(' => simple(TokenKind::LParen)?,
            ')' => simple(TokenKind::RParen)?,
            '{' => simple(TokenKind::LBrace)?,
            '}' => simple(TokenKind::RBrace)?,
            '[' => simple(TokenKind::LBracket)?,
            ']' => simple(TokenKind::RBracket)?,
            ',' => simple(TokenKind::Comma)?,
            '.' => simple(TokenKind::Dot)?,
            ';' => simple(TokenKind::Semicolon)?,
            ':' => simple(TokenKind::Colon)?,
            '=' => simple(TokenKind::Eq)?,
            '<' => simple(TokenKind::Lt)?,
            '>' => simple(TokenKind::Gt)?,
            '-' if self.peek_char2() == Some('>') => (TokenKind::Arrow, 2),
            '-' if self.peek_char2().map_or(false, |c| c.is_ascii_digit()) => {
                self.advance();
                return self.lex_number(start, true);
            }
            c if c.is_ascii_digit() => return self.lex_number(start, false),
            '"' => return self.lex_string(start),
            c if c.is_alphabetic() || c == '_' => return Ok(self.lex_ident_or_keyword(start)),
            other => {
                return Err(Error::Syntax {
                    location: start,
                    message: format!("unexpected character '{other}'"),
                })
            }
        };
        for _ in 0..len {
            self.advance();
        }
        Ok(Token {
            kind,
            location: start,
        })
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token, Error> {
        if let Some(t) = self.peeked.take() {
            return Ok(t);
        }
        self.lex_one()
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<&Token, Error> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex_one()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lx = Lexer::new(src, "test.hoil");
        let mut out = Vec::new();
        loop {
            let t = lx.next_token().unwrap();
            let done = matches!(t.kind, TokenKind::Eof);
            out.push(t.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn tracks_line_and_column() {
        let mut lx = Lexer::new("a\nb", "t.hoil");
        let t1 = lx.next_token().unwrap();
        assert_eq!((t1.location.line, t1.location.column), (1, 1));
        let t2 = lx.next_token().unwrap();
        assert_eq!((t2.location.line, t2.location.column), (2, 1));
    }

    #[test]
    fn line_comment_is_skipped() {
        assert_eq!(
            kinds("// hi\nADD"),
            vec![TokenKind::Mnemonic(Mnemonic::Add), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_fails() {
        let mut lx = Lexer::new("/* never closes", "t.hoil");
        assert!(lx.next_token().is_err());
    }

    #[test]
    fn negative_integer_is_one_token() {
        assert_eq!(kinds("-42"), vec![TokenKind::IntLit(-42), TokenKind::Eof]);
    }

    #[test]
    fn minus_before_ident_is_not_a_number() {
        // `->` still binds as arrow even though '-' can start a number.
        assert_eq!(kinds("->"), vec![TokenKind::Arrow, TokenKind::Eof]);
    }

    #[test]
    fn float_with_exponent() {
        assert_eq!(
            kinds("1.5e-3"),
            vec![TokenKind::FloatLit(1.5e-3), TokenKind::Eof]
        );
    }

    #[test]
    fn string_literal_keeps_escapes_undecoded() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::StringLit("a\\nb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn keywords_type_keywords_and_mnemonics_classify_correctly() {
        assert_eq!(
            kinds("MODULE i32 ADD foo"),
            vec![
                TokenKind::Keyword(Keyword::Module),
                TokenKind::TypeKeyword(TypeKeyword::I32),
                TokenKind::Mnemonic(Mnemonic::Add),
                TokenKind::Ident("foo".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lx = Lexer::new("ADD SUB", "t.hoil");
        assert_eq!(lx.peek_token().unwrap().kind, TokenKind::Mnemonic(Mnemonic::Add));
        assert_eq!(lx.next_token().unwrap().kind, TokenKind::Mnemonic(Mnemonic::Add));
        assert_eq!(lx.next_token().unwrap().kind, TokenKind::Mnemonic(Mnemonic::Sub));
    }
}
