// fn-switcher macOS Backend
// Text Input Sources (Carbon) provider and the CGEventTap modifier subscription

#![cfg(target_os = "macos")]

use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_foundation::string::CFString;
use core_foundation_sys::array::{CFArrayGetCount, CFArrayGetValueAtIndex, CFArrayRef};
use core_foundation_sys::base::{Boolean, CFRelease, CFTypeRef};
use core_foundation_sys::dictionary::CFDictionaryRef;
use core_foundation_sys::mach_port::CFMachPortRef;
use core_foundation_sys::number::{CFBooleanGetValue, CFBooleanRef};
use core_foundation_sys::string::CFStringRef;
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult,
};
use std::cell::OnceCell;
use std::ffi::c_void;
use std::rc::Rc;

use crate::layout::{Layout, KEYLAYOUT_PREFIX};
use crate::modifier::ModifierFlags;
use crate::source::{InputSourceProvider, SourceError};

type TISInputSourceRef = *const c_void;
type OSStatus = i32;

#[link(name = "Carbon", kind = "framework")]
extern "C" {
    static kTISPropertyInputSourceID: CFStringRef;
    static kTISPropertyInputSourceIsSelectCapable: CFStringRef;

    fn TISCopyCurrentKeyboardInputSource() -> TISInputSourceRef;
    fn TISCreateInputSourceList(
        properties: CFDictionaryRef,
        include_all_installed: Boolean,
    ) -> CFArrayRef;
    fn TISGetInputSourceProperty(source: TISInputSourceRef, key: CFStringRef) -> *const c_void;
    fn TISSelectInputSource(source: TISInputSourceRef) -> OSStatus;
}

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

/// Errors from the macOS backend
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Failed to create event tap. Check Accessibility permissions.")]
    EventTapUnavailable,

    #[error("Failed to attach event tap to the run loop")]
    RunLoopSource,
}

/// Id of an input source, borrowed from the source object.
///
/// # Safety
/// `source` must be a live `TISInputSourceRef`.
unsafe fn source_id(source: TISInputSourceRef) -> Option<String> {
    let id = TISGetInputSourceProperty(source, kTISPropertyInputSourceID) as CFStringRef;
    if id.is_null() {
        return None;
    }
    Some(CFString::wrap_under_get_rule(id).to_string())
}

/// # Safety
/// `source` must be a live `TISInputSourceRef`.
unsafe fn is_select_capable(source: TISInputSourceRef) -> bool {
    let selectable =
        TISGetInputSourceProperty(source, kTISPropertyInputSourceIsSelectCapable) as CFBooleanRef;
    !selectable.is_null() && CFBooleanGetValue(selectable)
}

/// Owned list returned by `TISCreateInputSourceList`
struct SourceList(CFArrayRef);

impl SourceList {
    fn enabled() -> Option<Self> {
        let list = unsafe { TISCreateInputSourceList(std::ptr::null(), 0) };
        if list.is_null() {
            None
        } else {
            Some(SourceList(list))
        }
    }

    fn iter(&self) -> impl Iterator<Item = TISInputSourceRef> + '_ {
        let count = unsafe { CFArrayGetCount(self.0) };
        (0..count).map(move |i| unsafe { CFArrayGetValueAtIndex(self.0, i) as TISInputSourceRef })
    }
}

impl Drop for SourceList {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0 as CFTypeRef) };
    }
}

/// Input sources through the Carbon Text Input Sources API
#[derive(Debug, Clone, Copy, Default)]
pub struct TisInputSource;

impl TisInputSource {
    pub fn new() -> Self {
        TisInputSource
    }
}

impl InputSourceProvider for TisInputSource {
    fn current_layout(&self) -> Result<Layout, SourceError> {
        unsafe {
            let source = TISCopyCurrentKeyboardInputSource();
            if source.is_null() {
                return Err(SourceError::Unavailable(
                    "no current keyboard input source".to_string(),
                ));
            }
            let id = source_id(source);
            CFRelease(source as CFTypeRef);
            id.map(Layout::from).ok_or_else(|| {
                SourceError::Unavailable("current input source has no id".to_string())
            })
        }
    }

    fn select_layout(&self, layout: &Layout) -> Result<(), SourceError> {
        let list = SourceList::enabled()
            .ok_or_else(|| SourceError::Unavailable("cannot list input sources".to_string()))?;
        let target = list
            .iter()
            .find(|&source| unsafe { source_id(source) }.as_deref() == Some(layout.id()))
            .ok_or_else(|| SourceError::NotFound(layout.clone()))?;

        let status = unsafe { TISSelectInputSource(target) };
        if status != 0 {
            log::debug!("TISSelectInputSource({}) returned {}", layout, status);
            return Err(SourceError::NotFound(layout.clone()));
        }
        Ok(())
    }

    fn selectable_layouts(&self) -> Result<Vec<Layout>, SourceError> {
        let list = SourceList::enabled()
            .ok_or_else(|| SourceError::Unavailable("cannot list input sources".to_string()))?;
        Ok(list
            .iter()
            .filter(|&source| unsafe { is_select_capable(source) })
            .filter_map(|source| unsafe { source_id(source) })
            .filter(|id| id.starts_with(KEYLAYOUT_PREFIX))
            .map(Layout::from)
            .collect())
    }
}

/// What the tap callback does with one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TapAction {
    Forward,
    Rearm,
    Ignore,
}

fn tap_action(event_type: CGEventType) -> TapAction {
    match event_type {
        CGEventType::FlagsChanged => TapAction::Forward,
        CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
            TapAction::Rearm
        }
        _ => TapAction::Ignore,
    }
}

/// Mach port of an installed tap, filled in once the tap exists.
///
/// The callback is built before the tap, so it reaches the port through
/// this handle to re-enable a tap the system switched off.
#[derive(Clone, Default)]
struct TapHandle(Rc<OnceCell<CFMachPortRef>>);

impl TapHandle {
    fn attach(&self, port: CFMachPortRef) {
        let _ = self.0.set(port);
    }

    fn rearm(&self) -> bool {
        match self.0.get() {
            Some(&port) => {
                unsafe { CGEventTapEnable(port, true) };
                true
            }
            None => false,
        }
    }
}

/// Install a session event tap for modifier changes and run the current
/// run loop, passing the flags of every `FlagsChanged` event to `on_flags`.
///
/// Blocks for the lifetime of the run loop. Events are passed through
/// untouched. A tap disabled by the system (callback timeout or user input)
/// is re-enabled on the spot.
pub fn run_event_tap<F>(on_flags: F) -> Result<(), PlatformError>
where
    F: Fn(ModifierFlags) + 'static,
{
    let handle = TapHandle::default();
    let callback_handle = handle.clone();
    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        vec![CGEventType::FlagsChanged],
        move |_proxy, event_type, event| {
            match tap_action(event_type) {
                TapAction::Forward => on_flags(ModifierFlags(event.get_flags().bits())),
                TapAction::Rearm => {
                    if callback_handle.rearm() {
                        log::warn!(
                            "Event tap disabled by the system ({:?}), re-enabled",
                            event_type
                        );
                    } else {
                        log::error!("Event tap disabled by the system ({:?})", event_type);
                    }
                }
                TapAction::Ignore => {}
            }
            CallbackResult::Keep
        },
    )
    .map_err(|_| PlatformError::EventTapUnavailable)?;
    handle.attach(tap.mach_port().as_concrete_TypeRef());

    let source = tap
        .mach_port()
        .create_runloop_source(0)
        .map_err(|_| PlatformError::RunLoopSource)?;
    let run_loop = CFRunLoop::get_current();
    run_loop.add_source(&source, unsafe { kCFRunLoopCommonModes });
    tap.enable();

    log::debug!("Event tap installed");
    CFRunLoop::run_current();
    Ok(())
}
