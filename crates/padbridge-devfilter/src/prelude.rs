//! Prelude for padbridge-devfilter.

pub use crate::error::{FilterError, FilterResult, Primitive};
pub use crate::filter::{DeviceFilter, FilterStats};
pub use crate::primitives::{IoPrimitives, LibcPrimitives};
pub use crate::rule::{EVENT_NODE_PREFIX, InterceptionRule, PrefixRule};
