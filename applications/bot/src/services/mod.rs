/// Services wrapping external tools
pub mod title_resolver;

pub use title_resolver::YtDlpTitleResolver;
