//! Markup tokenization and offset-tracked rewriting.
//!
//! ```text
//! html/
//! ├── token    # Token/TokenKind data model
//! ├── lexer    # streaming mode-stack tokenizer
//! ├── attrs    # forward-scan attribute combinators
//! └── rewrite  # positional fragment injection
//! ```

mod attrs;
mod lexer;
mod rewrite;
mod token;

pub use attrs::{find_attr_value, tag_attributes};
pub use lexer::Lexer;
pub use rewrite::{Injection, inject};
pub use token::{Token, TokenKind};
