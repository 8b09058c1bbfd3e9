//! Start the bridge when the library is loaded.

#![cfg_attr(not(test), expect(unsafe_code, reason = "registers a load-time constructor"))]

use padbridge::ProcessAttach;
use padbridge_devfilter::DeviceFilter;
use tracing::debug;

use crate::next::NextPrimitives;

/// The event-node filter, calling through to the next libc definitions.
pub(crate) fn preload_filter() -> DeviceFilter {
    DeviceFilter::new().with_primitives(|| *NextPrimitives::get())
}

/// Install the filter and start the bridge from the environment.
///
/// This is what the load-time constructor runs. The filter goes in first so
/// that [`padbridge::attach_process`] keeps it instead of one calling libc
/// directly, which would re-enter the interposed entry points.
pub fn attach() -> &'static ProcessAttach {
    if let Err(e) = padbridge_devfilter::install(preload_filter()) {
        debug!(error = %e, "Keeping the installed device filter");
    }
    padbridge::attach_process()
}

#[cfg(not(test))]
extern "C" fn attach_on_load() {
    attach();
}

#[cfg(not(test))]
#[used]
#[unsafe(link_section = ".init_array")]
static ATTACH_ON_LOAD: extern "C" fn() = attach_on_load;
