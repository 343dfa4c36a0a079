pub mod debug_sink;
pub mod router;

pub use debug_sink::{FileHtmlSink, HtmlSink};
pub use router::{ClientSource, ConfiguredClients, Generator};
