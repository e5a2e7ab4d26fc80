//! In-memory record storage: standalone records, column descriptors and
//! schema-enforcing record tables.
pub mod coerce;
pub mod column;
pub mod cursor;
pub mod factory;
pub mod record;
pub mod sortable;
pub mod table;
pub mod value;

pub use coerce::{CoercionRegistry, Converter, NullPolicy, TypeKind};
pub use column::Column;
pub use cursor::{ColumnCursor, RowCursor};
pub use factory::TableFactory;
pub use record::Record;
pub use sortable::{insertion_sort, Sortable};
pub use table::{ColumnHandle, RecordTable, RowId, RowView};
pub use value::{DataType, Value};
