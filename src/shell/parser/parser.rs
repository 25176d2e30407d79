use super::ast::{Node, NodeKind, Quote, RedirKind, Redirection, Word};
use super::lexer::{Lexer, RedirectOp, Token};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    fn next_token(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Parse one full command line. `Ok(None)` means the line was blank.
    pub fn parse(&mut self) -> Result<Option<Node>, String> {
        if self.current_token == Token::Eof {
            return Ok(None);
        }
        let node = self.parse_and_or()?;
        match &self.current_token {
            Token::Eof => Ok(Some(node)),
            token => Err(format!("syntax error near unexpected token {:?}", token)),
        }
    }

    // and_or := pipeline (('&&' | '||') pipeline)*
    fn parse_and_or(&mut self) -> Result<Node, String> {
        let mut node = self.parse_pipeline()?;

        loop {
            let kind = match self.current_token {
                Token::And => NodeKind::And,
                Token::Or => NodeKind::Or,
                _ => break,
            };
            self.next_token();
            let right = self.parse_pipeline()?;
            node = Node::internal(kind, node, right);
        }

        Ok(node)
    }

    // pipeline := command ('|' command)*
    fn parse_pipeline(&mut self) -> Result<Node, String> {
        let mut node = self.parse_simple_command()?;

        while self.current_token == Token::Pipe {
            self.next_token();
            let right = self.parse_simple_command()?;
            node = Node::internal(NodeKind::Pipe, node, right);
        }

        Ok(node)
    }

    fn parse_simple_command(&mut self) -> Result<Node, String> {
        let mut kind = NodeKind::Command;
        let mut argv: Vec<Word> = Vec::new();
        let mut redirections: Vec<Redirection> = Vec::new();

        loop {
            match &self.current_token {
                Token::Word { text, quote } => {
                    if argv.is_empty() && *quote == Quote::Double {
                        kind = NodeKind::QuotedCommand;
                    }
                    argv.push(Word::new(text.clone(), *quote));
                    self.next_token();
                }
                Token::Redirect(op) => {
                    let op = op.clone();
                    self.next_token();
                    redirections.push(self.parse_redirection(op)?);
                }
                Token::Invalid(c) => {
                    return Err(format!("syntax error near unexpected token `{}'", c));
                }
                _ => break,
            }
        }

        if argv.is_empty() {
            return Err("syntax error: expected command name".to_string());
        }

        Ok(Node::leaf(kind, argv, redirections))
    }

    fn parse_redirection(&mut self, op: RedirectOp) -> Result<Redirection, String> {
        match &self.current_token {
            Token::Word { text, .. } => {
                let kind = match op {
                    RedirectOp::Input => RedirKind::Input,
                    RedirectOp::Output => RedirKind::Output,
                    RedirectOp::Append => RedirKind::Append,
                    RedirectOp::Heredoc => RedirKind::Heredoc,
                };
                let redirection = Redirection::new(kind, text.clone());
                self.next_token();
                Ok(redirection)
            }
            _ => Err("syntax error: expected filename after redirection operator".to_string()),
        }
    }
}
