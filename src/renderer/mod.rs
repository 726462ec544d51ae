mod markdown;
mod syntax;

pub use markdown::MarkdownRenderer;
pub use syntax::SyntaxCache;
