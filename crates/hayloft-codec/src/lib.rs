mod bytes;
mod codec;
mod coerce;
mod column;
mod value;

pub use bytes::prefix_successor;
pub use codec::{CodecError, decode, encode};
pub use coerce::coerce;
pub use column::ColumnKey;
pub use value::{TypeTag, TypedValue};
