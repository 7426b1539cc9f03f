//! Order builder.
//!
//! An [`OrderSession`] collects selections across three independent flows
//! (frozen desserts, confections, miscellaneous) and turns each into a priced
//! [`OrderLineItem`] on commit. Everything here is synchronous and pure; the
//! catalog is passed in as a [`CatalogSnapshot`].

mod error;
mod flow;
mod line_item;
mod policy;
mod session;
mod snapshot;

pub use error::OrderError;
pub use flow::{ConfectionFlow, FrozenFlow, MiscFlow, Selection};
pub use line_item::OrderLineItem;
pub use policy::{ConfectionPolicy, FlavorPolicy, OrderPolicy};
pub use session::OrderSession;
pub use snapshot::CatalogSnapshot;
