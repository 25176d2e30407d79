use std::iter::Peekable;
use std::str::Chars;

use super::ast::Quote;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word { text: String, quote: Quote },
    Pipe,
    And,
    Or,
    Redirect(RedirectOp),
    Invalid(char),
    Eof,
}

#[derive(Debug, PartialEq, Clone)]
pub enum RedirectOp {
    Input,   // <
    Output,  // >
    Append,  // >>
    Heredoc, // <<
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.peek_char() {
            None => Token::Eof,
            Some(c) => match c {
                '|' => {
                    self.read_char();
                    if self.peek_char() == Some('|') {
                        self.read_char();
                        Token::Or
                    } else {
                        Token::Pipe
                    }
                }
                '&' => {
                    self.read_char();
                    if self.peek_char() == Some('&') {
                        self.read_char();
                        Token::And
                    } else {
                        // no background jobs
                        Token::Invalid('&')
                    }
                }
                '<' => {
                    self.read_char();
                    if self.peek_char() == Some('<') {
                        self.read_char();
                        Token::Redirect(RedirectOp::Heredoc)
                    } else {
                        Token::Redirect(RedirectOp::Input)
                    }
                }
                '>' => {
                    self.read_char();
                    if self.peek_char() == Some('>') {
                        self.read_char();
                        Token::Redirect(RedirectOp::Append)
                    } else {
                        Token::Redirect(RedirectOp::Output)
                    }
                }
                ';' => {
                    self.read_char();
                    Token::Invalid(';')
                }
                '"' => self.read_quoted_string(Quote::Double),
                '\'' => self.read_quoted_string(Quote::Single),
                _ => self.read_word(),
            },
        }
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || ";<>|&'\"".contains(c) {
                break;
            }
            word.push(self.read_char().unwrap_or_default());
        }

        Token::Word {
            text: word,
            quote: Quote::None,
        }
    }

    fn read_quoted_string(&mut self, quote: Quote) -> Token {
        let opener = self.read_char().unwrap_or_default();
        let mut string = String::new();
        let mut escaped = false;

        while let Some(c) = self.read_char() {
            match (escaped, c) {
                (true, _) => {
                    string.push(c);
                    escaped = false;
                }
                (false, '\\') if quote == Quote::Double => escaped = true,
                (false, c) if c == opener => break,
                (false, c) => string.push(c),
            }
        }

        Token::Word {
            text: string,
            quote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Token {
        Token::Word {
            text: text.to_string(),
            quote: Quote::None,
        }
    }

    #[test]
    fn test_simple_command() {
        let mut lexer = Lexer::new("ls -l");
        assert_eq!(lexer.next_token(), word("ls"));
        assert_eq!(lexer.next_token(), word("-l"));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_pipe_and_or() {
        let mut lexer = Lexer::new("ls | grep foo || echo no && echo yes");
        assert_eq!(lexer.next_token(), word("ls"));
        assert_eq!(lexer.next_token(), Token::Pipe);
        assert_eq!(lexer.next_token(), word("grep"));
        assert_eq!(lexer.next_token(), word("foo"));
        assert_eq!(lexer.next_token(), Token::Or);
        assert_eq!(lexer.next_token(), word("echo"));
        assert_eq!(lexer.next_token(), word("no"));
        assert_eq!(lexer.next_token(), Token::And);
        assert_eq!(lexer.next_token(), word("echo"));
        assert_eq!(lexer.next_token(), word("yes"));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_redirections() {
        let mut lexer = Lexer::new("cat < in > out >> log << EOF");
        assert_eq!(lexer.next_token(), word("cat"));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Input));
        assert_eq!(lexer.next_token(), word("in"));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Output));
        assert_eq!(lexer.next_token(), word("out"));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Append));
        assert_eq!(lexer.next_token(), word("log"));
        assert_eq!(lexer.next_token(), Token::Redirect(RedirectOp::Heredoc));
        assert_eq!(lexer.next_token(), word("EOF"));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_quoted_strings() {
        let mut lexer = Lexer::new(r#"echo "hello world" 'foo bar'"#);
        assert_eq!(lexer.next_token(), word("echo"));
        assert_eq!(
            lexer.next_token(),
            Token::Word {
                text: "hello world".to_string(),
                quote: Quote::Double
            }
        );
        assert_eq!(
            lexer.next_token(),
            Token::Word {
                text: "foo bar".to_string(),
                quote: Quote::Single
            }
        );
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_lone_ampersand_is_invalid() {
        let mut lexer = Lexer::new("sleep 10 &");
        assert_eq!(lexer.next_token(), word("sleep"));
        assert_eq!(lexer.next_token(), word("10"));
        assert_eq!(lexer.next_token(), Token::Invalid('&'));
    }
}
