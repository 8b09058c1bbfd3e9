//! SDL2 virtual joystick backend, bound at runtime.
//!
//! The library is opened once with `libloading` and every entry point is
//! resolved into an optional function pointer. A missing symbol is logged and
//! only fails the capabilities that need it.

#![expect(unsafe_code, reason = "binds and calls the SDL2 C entry points")]

use std::collections::HashMap;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::time::Duration;

use libloading::Library;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::capability::{
    BackendVersion, DeviceIndex, EntryPoint, JoystickBackend, JoystickHandle, RumbleCallback,
    VirtualPadDesc,
};
use crate::error::{BackendError, BackendResult};

/// Library name loaded when none is configured.
pub const DEFAULT_LIBRARY: &str = "libSDL2-2.0.so.0";

const SDL_INIT_JOYSTICK: u32 = 0x0000_0200;
const SDL_VIRTUAL_JOYSTICK_DESC_VERSION: u16 = 1;
const SDL_JOYSTICK_TYPE_GAMECONTROLLER: u16 = 1;

#[repr(C)]
#[derive(Debug, Default)]
struct SdlVersion {
    major: u8,
    minor: u8,
    patch: u8,
}

/// `SDL_VirtualJoystickDesc`, version 1.
#[repr(C)]
struct SdlVirtualJoystickDesc {
    version: u16,
    kind: u16,
    naxes: u16,
    nbuttons: u16,
    nhats: u16,
    vendor_id: u16,
    product_id: u16,
    padding: u16,
    button_mask: u32,
    axis_mask: u32,
    name: *const c_char,
    userdata: *mut c_void,
    update: Option<unsafe extern "C" fn(*mut c_void)>,
    set_player_index: Option<unsafe extern "C" fn(*mut c_void, c_int)>,
    rumble: Option<unsafe extern "C" fn(*mut c_void, u16, u16) -> c_int>,
    rumble_triggers: Option<unsafe extern "C" fn(*mut c_void, u16, u16) -> c_int>,
    set_led: Option<unsafe extern "C" fn(*mut c_void, u8, u8, u8) -> c_int>,
    send_effect: Option<unsafe extern "C" fn(*mut c_void, *const c_void, c_int) -> c_int>,
}

type InitFn = unsafe extern "C" fn(u32) -> c_int;
type GetErrorFn = unsafe extern "C" fn() -> *const c_char;
type JoystickOpenFn = unsafe extern "C" fn(c_int) -> *mut c_void;
type AttachVirtualExFn = unsafe extern "C" fn(*const SdlVirtualJoystickDesc) -> c_int;
type DetachVirtualFn = unsafe extern "C" fn(c_int) -> c_int;
type SetVirtualAxisFn = unsafe extern "C" fn(*mut c_void, c_int, i16) -> c_int;
type SetVirtualByteFn = unsafe extern "C" fn(*mut c_void, c_int, u8) -> c_int;
type PumpEventsFn = unsafe extern "C" fn();
type DelayFn = unsafe extern "C" fn(u32);
type GetVersionFn = unsafe extern "C" fn(*mut SdlVersion);

struct SdlApi {
    init: Option<InitFn>,
    get_error: Option<GetErrorFn>,
    joystick_open: Option<JoystickOpenFn>,
    attach_virtual: Option<AttachVirtualExFn>,
    detach_virtual: Option<DetachVirtualFn>,
    set_axis: Option<SetVirtualAxisFn>,
    set_button: Option<SetVirtualByteFn>,
    set_hat: Option<SetVirtualByteFn>,
    pump_events: Option<PumpEventsFn>,
    delay: Option<DelayFn>,
    get_version: Option<GetVersionFn>,
}

impl SdlApi {
    fn resolve(library: &Library) -> Self {
        Self {
            init: resolve(library, EntryPoint::Init),
            get_error: resolve(library, EntryPoint::GetError),
            joystick_open: resolve(library, EntryPoint::JoystickOpen),
            attach_virtual: resolve(library, EntryPoint::AttachVirtual),
            detach_virtual: resolve(library, EntryPoint::DetachVirtual),
            set_axis: resolve(library, EntryPoint::SetVirtualAxis),
            set_button: resolve(library, EntryPoint::SetVirtualButton),
            set_hat: resolve(library, EntryPoint::SetVirtualHat),
            pump_events: resolve(library, EntryPoint::PumpEvents),
            delay: resolve(library, EntryPoint::Delay),
            get_version: resolve(library, EntryPoint::GetVersion),
        }
    }

    fn is_resolved(&self, entry: EntryPoint) -> bool {
        match entry {
            EntryPoint::Init => self.init.is_some(),
            EntryPoint::GetError => self.get_error.is_some(),
            EntryPoint::JoystickOpen => self.joystick_open.is_some(),
            EntryPoint::AttachVirtual => self.attach_virtual.is_some(),
            EntryPoint::DetachVirtual => self.detach_virtual.is_some(),
            EntryPoint::SetVirtualAxis => self.set_axis.is_some(),
            EntryPoint::SetVirtualButton => self.set_button.is_some(),
            EntryPoint::SetVirtualHat => self.set_hat.is_some(),
            EntryPoint::PumpEvents => self.pump_events.is_some(),
            EntryPoint::Delay => self.delay.is_some(),
            EntryPoint::GetVersion => self.get_version.is_some(),
        }
    }
}

fn resolve<T: Copy>(library: &Library, entry: EntryPoint) -> Option<T> {
    // SAFETY: every call site pairs `entry` with the C signature SDL2
    // declares for that symbol.
    match unsafe { library.get::<T>(entry.symbol().as_bytes()) } {
        Ok(symbol) => Some(*symbol),
        Err(e) => {
            error!(symbol = entry.symbol(), error = %e, "Failed to load backend symbol");
            None
        }
    }
}

fn require<T: Copy>(f: Option<T>, entry: EntryPoint) -> BackendResult<T> {
    f.ok_or(BackendError::MissingEntryPoint(entry.symbol()))
}

/// Trampoline installed as the descriptor's `Rumble` callback.
///
/// `userdata` is the address of the device's [`RumbleCallback`]. Panics are
/// caught so they never unwind into C.
unsafe extern "C" fn rumble_trampoline(userdata: *mut c_void, low: u16, high: u16) -> c_int {
    if userdata.is_null() {
        return -1;
    }
    // SAFETY: userdata was set from a boxed RumbleCallback held in
    // `Sdl2Backend::devices`, which stays alive until after the device is
    // detached and SDL stops calling this function for it.
    let callback = unsafe { &*userdata.cast::<RumbleCallback>() };
    match catch_unwind(AssertUnwindSafe(|| callback(low, high))) {
        Ok(Ok(())) => 0,
        Ok(Err(_)) => -1,
        Err(_) => {
            error!("Rumble callback panicked");
            -1
        }
    }
}

/// Keeps the descriptor name and rumble callback alive while attached.
struct AttachedDevice {
    _name: CString,
    _callback: Box<RumbleCallback>,
}

/// SDL2 backend loaded with `libloading`.
pub struct Sdl2Backend {
    api: SdlApi,
    devices: Mutex<HashMap<DeviceIndex, AttachedDevice>>,
    library_name: String,
    // Dropped last: the function pointers in `api` point into it.
    _library: Library,
}

impl fmt::Debug for Sdl2Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdl2Backend")
            .field("library", &self.library_name)
            .field("attached", &self.devices.lock().len())
            .field("missing", &self.missing_entry_points())
            .finish()
    }
}

impl Sdl2Backend {
    /// Open `library` and resolve every entry point.
    ///
    /// Missing entry points are logged and left unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::LibraryLoad`] if the library cannot be opened.
    pub fn load(library: &str) -> BackendResult<Self> {
        let handle = open_library(library).map_err(|e| BackendError::LibraryLoad {
            library: library.to_owned(),
            reason: e.to_string(),
        })?;
        let api = SdlApi::resolve(&handle);

        let backend = Self {
            api,
            devices: Mutex::new(HashMap::new()),
            library_name: library.to_owned(),
            _library: handle,
        };
        let missing = backend.missing_entry_points();
        if missing.is_empty() {
            info!(library, "Backend library bound");
        } else {
            warn!(library, missing = missing.len(), "Backend library bound with missing entry points");
        }
        Ok(backend)
    }

    /// Load [`DEFAULT_LIBRARY`].
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::LibraryLoad`] if the library cannot be opened.
    pub fn load_default() -> BackendResult<Self> {
        Self::load(DEFAULT_LIBRARY)
    }

    /// Library name or path this backend was loaded from.
    #[must_use]
    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    /// Entry points that failed to resolve.
    #[must_use]
    pub fn missing_entry_points(&self) -> Vec<EntryPoint> {
        EntryPoint::ALL
            .into_iter()
            .filter(|entry| !self.api.is_resolved(*entry))
            .collect()
    }

    fn error_text(&self) -> String {
        self.last_error()
            .unwrap_or_else(|| "unknown error".to_owned())
    }
}

#[cfg(unix)]
fn open_library(library: &str) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_LAZY};
    // SAFETY: loading SDL2 runs its library initialisers, which have no
    // preconditions on the caller.
    unsafe { UnixLibrary::open(Some(library), RTLD_LAZY | RTLD_GLOBAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_library(library: &str) -> Result<Library, libloading::Error> {
    // SAFETY: as above.
    unsafe { Library::new(library) }
}

fn joystick_ptr(handle: JoystickHandle) -> *mut c_void {
    ptr::with_exposed_provenance_mut(handle.0)
}

impl JoystickBackend for Sdl2Backend {
    fn init_joystick(&self) -> BackendResult<()> {
        let init = require(self.api.init, EntryPoint::Init)?;
        // SAFETY: SDL_Init accepts any flag combination.
        let rc = unsafe { init(SDL_INIT_JOYSTICK) };
        if rc < 0 {
            return Err(BackendError::Init(self.error_text()));
        }
        Ok(())
    }

    fn last_error(&self) -> Option<String> {
        let get_error = self.api.get_error?;
        // SAFETY: SDL_GetError takes no arguments.
        let text = unsafe { get_error() };
        if text.is_null() {
            return None;
        }
        // SAFETY: SDL_GetError returns a NUL-terminated string owned by SDL,
        // valid until the next SDL call on this thread; it is copied here.
        let message = unsafe { CStr::from_ptr(text) }
            .to_string_lossy()
            .into_owned();
        (!message.is_empty()).then_some(message)
    }

    fn version(&self) -> BackendResult<BackendVersion> {
        let get_version = require(self.api.get_version, EntryPoint::GetVersion)?;
        let mut version = SdlVersion::default();
        // SAFETY: the pointer refers to a live, writable SDL_version.
        unsafe { get_version(&raw mut version) };
        Ok(BackendVersion {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
        })
    }

    fn attach_virtual(
        &self,
        desc: &VirtualPadDesc,
        rumble: RumbleCallback,
    ) -> BackendResult<DeviceIndex> {
        let attach = require(self.api.attach_virtual, EntryPoint::AttachVirtual)?;
        let name = CString::new(desc.name.as_str())
            .map_err(|e| BackendError::InvalidDescriptor(e.to_string()))?;
        let callback: Box<RumbleCallback> = Box::new(rumble);
        let userdata = ptr::from_ref::<RumbleCallback>(&*callback)
            .cast_mut()
            .cast::<c_void>();

        let raw = SdlVirtualJoystickDesc {
            version: SDL_VIRTUAL_JOYSTICK_DESC_VERSION,
            kind: SDL_JOYSTICK_TYPE_GAMECONTROLLER,
            naxes: desc.axes,
            nbuttons: desc.buttons,
            nhats: desc.hats,
            vendor_id: desc.vendor_id,
            product_id: desc.product_id,
            padding: 0,
            button_mask: 0,
            axis_mask: 0,
            name: name.as_ptr(),
            userdata,
            update: None,
            set_player_index: None,
            rumble: Some(rumble_trampoline),
            rumble_triggers: None,
            set_led: None,
            send_effect: None,
        };

        // SAFETY: `raw` is a complete version-1 descriptor. The name and the
        // callback it points at are moved into `devices` below and outlive
        // the attached device.
        let id = unsafe { attach(&raw const raw) };
        if id < 0 {
            return Err(BackendError::attach(&desc.name, self.error_text()));
        }

        let device = DeviceIndex(id);
        self.devices.lock().insert(
            device,
            AttachedDevice {
                _name: name,
                _callback: callback,
            },
        );
        debug!(device = id, name = %desc.name, "Virtual joystick attached");
        Ok(device)
    }

    fn detach_virtual(&self, device: DeviceIndex) -> BackendResult<()> {
        let detach = require(self.api.detach_virtual, EntryPoint::DetachVirtual)?;
        // SAFETY: SDL validates the device index itself.
        let rc = unsafe { detach(device.0) };
        if rc < 0 {
            return Err(BackendError::Detach {
                device: device.0,
                reason: self.error_text(),
            });
        }
        self.devices.lock().remove(&device);
        debug!(device = device.0, "Virtual joystick detached");
        Ok(())
    }

    fn open_joystick(&self, device: DeviceIndex) -> BackendResult<JoystickHandle> {
        let open = require(self.api.joystick_open, EntryPoint::JoystickOpen)?;
        // SAFETY: SDL validates the device index itself.
        let joystick = unsafe { open(device.0) };
        if joystick.is_null() {
            return Err(BackendError::Open {
                device: device.0,
                reason: self.error_text(),
            });
        }
        Ok(JoystickHandle(joystick.expose_provenance()))
    }

    fn set_axis(&self, joystick: JoystickHandle, axis: u8, value: i16) -> BackendResult<()> {
        let set = require(self.api.set_axis, EntryPoint::SetVirtualAxis)?;
        // SAFETY: the handle came from SDL_JoystickOpen; SDL validates it.
        let rc = unsafe { set(joystick_ptr(joystick), c_int::from(axis), value) };
        if rc < 0 {
            return Err(BackendError::set_value("axis", axis, self.error_text()));
        }
        Ok(())
    }

    fn set_button(&self, joystick: JoystickHandle, button: u8, value: u8) -> BackendResult<()> {
        let set = require(self.api.set_button, EntryPoint::SetVirtualButton)?;
        // SAFETY: the handle came from SDL_JoystickOpen; SDL validates it.
        let rc = unsafe { set(joystick_ptr(joystick), c_int::from(button), value) };
        if rc < 0 {
            return Err(BackendError::set_value("button", button, self.error_text()));
        }
        Ok(())
    }

    fn set_hat(&self, joystick: JoystickHandle, hat: u8, value: u8) -> BackendResult<()> {
        let set = require(self.api.set_hat, EntryPoint::SetVirtualHat)?;
        // SAFETY: the handle came from SDL_JoystickOpen; SDL validates it.
        let rc = unsafe { set(joystick_ptr(joystick), c_int::from(hat), value) };
        if rc < 0 {
            return Err(BackendError::set_value("hat", hat, self.error_text()));
        }
        Ok(())
    }

    fn pump_events(&self) -> BackendResult<()> {
        let pump = require(self.api.pump_events, EntryPoint::PumpEvents)?;
        // SAFETY: SDL_PumpEvents takes no arguments.
        unsafe { pump() };
        Ok(())
    }

    fn delay(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        match self.api.delay {
            // SAFETY: SDL_Delay accepts any millisecond count.
            Some(delay) => unsafe { delay(millis) },
            None => std::thread::sleep(duration),
        }
    }
}

impl Drop for Sdl2Backend {
    fn drop(&mut self) {
        let devices: Vec<DeviceIndex> = self.devices.lock().keys().copied().collect();
        for device in devices {
            if let Err(e) = self.detach_virtual(device) {
                warn!(device = device.0, error = %e, "Failed to detach virtual joystick on drop");
            }
        }
    }
}
