//! Lexer for MiniC++ source

mod scanner;
mod token;

pub use scanner::Lexer;
pub use token::{Token, TokenKind};
