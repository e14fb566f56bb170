//! Request-scoped computation pipelines.
//!
//! Each engine stages one request flow over the shared [`GraphStore`]:
//! validate → query → normalize → uSID → (optionally) load update. The
//! store calls are the only suspension points; everything else is pure.
//!
//! [`GraphStore`]: jalapeno_kernel::GraphStore

pub mod load;
pub mod path;
pub mod rpo;
