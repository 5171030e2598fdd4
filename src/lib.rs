pub mod credential;
pub mod paths;
pub mod persist;
pub mod records;
pub mod render;
pub mod ticket;
pub mod writer;

pub mod prelude {
    pub use crate::credential::Credential;
    pub use crate::records::RecordSet;
    pub use crate::render::{RenderView, Renderer, RendererRegistry};
    pub use crate::ticket::KerberosTicket;
    pub use crate::writer::{OutputWriter, WriteOptions};
}
