//! Windows display enumeration, cursor relocation and move interception
//!
//! Uses `EnumDisplayMonitors`/`MonitorFromPoint` for topology, `SetCursorPos`
//! for relocation, and a `WH_MOUSE_LL` hook plus a hidden window (display
//! change notifications and the refresh timer) on the calling thread's
//! message loop.
//!
//! Everything runs on one thread. The hook callback must return quickly or
//! Windows silently removes it.

#![cfg(target_os = "windows")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicIsize, AtomicU32, Ordering};

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{BOOL, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, MonitorFromPoint, HDC, HMONITOR, MONITORINFO,
    MONITORINFOEXW, MONITOR_DEFAULTTONULL,
};
use windows::Win32::System::Console::SetConsoleCtrlHandler;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    GetMessageW, KillTimer, PostMessageW, PostQuitMessage, PostThreadMessageW, RegisterClassW,
    SetCursorPos, SetTimer, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HC_ACTION,
    MSG, MSLLHOOKSTRUCT, WH_MOUSE_LL, WINDOW_EX_STYLE, WM_CLOSE, WM_DISPLAYCHANGE,
    WM_MOUSEMOVE, WM_QUIT, WM_SETTINGCHANGE, WM_TIMER, WNDCLASSW, WS_POPUP,
};

use super::events::{DisplayId, DisplayInfo, MouseMoveEvent, RefreshReason};
use super::traits::{
    CursorActuator, DisplayProvider, EventHandler, EventSource, InputError, InputResult,
};
use crate::screen::{Point, Rect};

const LLMHF_INJECTED: u32 = 0x0000_0001;
const MONITORINFOF_PRIMARY: u32 = 0x0000_0001;
const TIMER_TOPOLOGY_CHECK: usize = 1;

// Read from the console control thread
static DISPATCH_THREAD_ID: AtomicU32 = AtomicU32::new(0);
static HIDDEN_HWND: AtomicIsize = AtomicIsize::new(0);

thread_local! {
    static HANDLER: RefCell<Option<Rc<dyn EventHandler>>> = RefCell::new(None);
    static WATCH_DISPLAY_CHANGES: Cell<bool> = Cell::new(true);
}

fn platform_error(what: &str) -> InputError {
    InputError::Platform(format!("{}: {}", what, windows::core::Error::from_win32()))
}

/// Ask for per-monitor DPI awareness so rectangles are in physical pixels.
/// A manifest may already have set it, so refusal is not an error.
pub fn enable_dpi_awareness() {
    // SAFETY: Plain process-wide setting with no pointer arguments.
    let result =
        unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) };
    if let Err(e) = result {
        tracing::debug!("Per-monitor DPI awareness not applied: {}", e);
    }
}

/// Display enumeration through the Win32 monitor API
#[derive(Debug, Default)]
pub struct WindowsDisplays;

impl WindowsDisplays {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayProvider for WindowsDisplays {
    fn enumerate(&self) -> InputResult<Vec<DisplayInfo>> {
        let mut displays: Vec<DisplayInfo> = Vec::new();

        // SAFETY: The callback only runs inside this call, while `displays`
        // is alive and exclusively borrowed through the LPARAM pointer.
        let ok = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(monitor_enum_proc),
                LPARAM(&mut displays as *mut Vec<DisplayInfo> as isize),
            )
        };

        if !ok.as_bool() {
            return Err(platform_error("EnumDisplayMonitors failed"));
        }
        Ok(displays)
    }

    fn display_at(&self, p: Point) -> Option<DisplayId> {
        // SAFETY: No pointers involved.
        let monitor =
            unsafe { MonitorFromPoint(POINT { x: p.x, y: p.y }, MONITOR_DEFAULTTONULL) };
        if monitor.0 == 0 {
            None
        } else {
            Some(DisplayId(monitor.0))
        }
    }
}

unsafe extern "system" fn monitor_enum_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _clip: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let displays = &mut *(lparam.0 as *mut Vec<DisplayInfo>);

    // SAFETY: MONITORINFOEXW is plain data; all-zero is a valid value.
    let mut info: MONITORINFOEXW = std::mem::zeroed();
    info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

    if GetMonitorInfoW(hmonitor, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO).as_bool() {
        let rc = info.monitorInfo.rcMonitor;
        let name_len = info
            .szDevice
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(info.szDevice.len());
        let name = String::from_utf16_lossy(&info.szDevice[..name_len]);

        displays.push(DisplayInfo::new(
            DisplayId(hmonitor.0),
            Rect::new(rc.left, rc.top, rc.right, rc.bottom),
            info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
            &name,
        ));
    }

    BOOL(1) // continue enumeration
}

/// Cursor relocation through `SetCursorPos`.
///
/// The relocation is delivered to the low-level hook before the call returns.
#[derive(Debug, Default)]
pub struct WindowsCursor;

impl WindowsCursor {
    pub fn new() -> Self {
        Self
    }
}

impl CursorActuator for WindowsCursor {
    fn warp(&self, to: Point) -> InputResult<()> {
        // SAFETY: No pointers involved.
        unsafe { SetCursorPos(to.x, to.y) }.map_err(|e| {
            tracing::debug!("SetCursorPos{} failed: {}", to, e);
            InputError::RelocationFailed(to)
        })
    }
}

/// Low-level mouse hook and hidden notification window on the current thread
pub struct WindowsEventSource {
    refresh_interval_ms: u32,
    refresh_on_display_change: bool,
}

impl WindowsEventSource {
    pub fn new(refresh_interval_ms: u32, refresh_on_display_change: bool) -> Self {
        Self {
            refresh_interval_ms,
            refresh_on_display_change,
        }
    }

    /// Create the window, timer and hook, pump messages, then tear down in
    /// reverse: unhook, kill timer, destroy window.
    unsafe fn pump(&self) -> InputResult<()> {
        let instance: HINSTANCE = GetModuleHandleW(None)
            .map_err(|e| InputError::Platform(format!("GetModuleHandleW failed: {}", e)))?
            .into();

        let class_name = w!("CursorMapperHidden");
        let wc = WNDCLASSW {
            lpfnWndProc: Some(hidden_wnd_proc),
            hInstance: instance,
            lpszClassName: class_name,
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(platform_error("Failed to register window class"));
        }

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class_name,
            PCWSTR::null(),
            WS_POPUP,
            0,
            0,
            0,
            0,
            None,
            None,
            instance,
            None,
        );
        if hwnd.0 == 0 {
            return Err(platform_error("Failed to create hidden window"));
        }
        HIDDEN_HWND.store(hwnd.0, Ordering::SeqCst);

        if SetTimer(hwnd, TIMER_TOPOLOGY_CHECK, self.refresh_interval_ms, None) == 0 {
            let err = platform_error("Failed to create topology check timer");
            let _ = DestroyWindow(hwnd);
            HIDDEN_HWND.store(0, Ordering::SeqCst);
            return Err(err);
        }

        let hook = match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), instance, 0) {
            Ok(hook) => hook,
            Err(e) => {
                let _ = KillTimer(hwnd, TIMER_TOPOLOGY_CHECK);
                let _ = DestroyWindow(hwnd);
                HIDDEN_HWND.store(0, Ordering::SeqCst);
                return Err(InputError::Platform(format!(
                    "Failed to install mouse hook: {}",
                    e
                )));
            }
        };

        tracing::info!(
            "Mouse hook installed (topology check every {} ms)",
            self.refresh_interval_ms
        );

        let mut result = Ok(());
        let mut msg = MSG::default();
        loop {
            let ret = GetMessageW(&mut msg, None, 0, 0);
            if ret.0 == 0 {
                break;
            }
            if ret.0 == -1 {
                result = Err(platform_error("GetMessage error"));
                break;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        let _ = UnhookWindowsHookEx(hook);
        let _ = KillTimer(hwnd, TIMER_TOPOLOGY_CHECK);
        let _ = DestroyWindow(hwnd);
        HIDDEN_HWND.store(0, Ordering::SeqCst);

        tracing::info!("Mouse hook removed");
        result
    }
}

impl EventSource for WindowsEventSource {
    fn run(&mut self, handler: Rc<dyn EventHandler>) -> InputResult<()> {
        let installed = HANDLER.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return false;
            }
            *slot = Some(handler);
            true
        });
        if !installed {
            return Err(InputError::AlreadyStarted);
        }
        WATCH_DISPLAY_CHANGES.with(|w| w.set(self.refresh_on_display_change));

        // SAFETY: Reading the calling thread's id has no preconditions.
        DISPATCH_THREAD_ID.store(unsafe { GetCurrentThreadId() }, Ordering::SeqCst);

        // SAFETY: The handler only touches atomics and posts messages.
        if let Err(e) = unsafe { SetConsoleCtrlHandler(Some(console_ctrl_handler), BOOL::from(true)) } {
            tracing::warn!("Ctrl+C handler not installed: {}", e);
        }

        // SAFETY: All handles created in `pump` are used and released on
        // this thread before it returns.
        let result = unsafe { self.pump() };

        HANDLER.with(|slot| slot.borrow_mut().take());
        result
    }
}

fn current_handler() -> Option<Rc<dyn EventHandler>> {
    HANDLER.with(|slot| slot.borrow().clone())
}

/// Low-level mouse hook callback.
///
/// # Safety
///
/// Called by Windows on the thread that installed the hook. `SetCursorPos`
/// inside the handler re-enters this function before returning.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 && w_param.0 as u32 == WM_MOUSEMOVE {
        // SAFETY: l_param points to a MSLLHOOKSTRUCT when n_code == HC_ACTION.
        let mhs = &*(l_param.0 as *const MSLLHOOKSTRUCT);
        let event = MouseMoveEvent {
            position: Point::new(mhs.pt.x, mhs.pt.y),
            injected: mhs.flags & LLMHF_INJECTED != 0,
            timestamp: mhs.time,
        };

        if let Some(handler) = current_handler() {
            if handler.on_pointer_move(&event).suppresses() {
                return LRESULT(1);
            }
        }
    }

    CallNextHookEx(None, n_code, w_param, l_param)
}

unsafe extern "system" fn hidden_wnd_proc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    match msg {
        WM_DISPLAYCHANGE | WM_SETTINGCHANGE => {
            if WATCH_DISPLAY_CHANGES.with(|w| w.get()) {
                let reason = if msg == WM_DISPLAYCHANGE {
                    RefreshReason::DisplayChange
                } else {
                    RefreshReason::SettingChange
                };
                if let Some(handler) = current_handler() {
                    handler.on_refresh(reason);
                }
            }
            LRESULT(0)
        }
        WM_TIMER => {
            if w_param.0 == TIMER_TOPOLOGY_CHECK {
                if let Some(handler) = current_handler() {
                    handler.on_refresh(RefreshReason::Timer);
                }
            }
            LRESULT(0)
        }
        WM_CLOSE => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, w_param, l_param),
    }
}

/// Runs on a system-created thread; only posts to the dispatch thread.
unsafe extern "system" fn console_ctrl_handler(_ctrl_type: u32) -> BOOL {
    let thread_id = DISPATCH_THREAD_ID.load(Ordering::SeqCst);
    if PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)).is_err() {
        let hwnd = HIDDEN_HWND.load(Ordering::SeqCst);
        if hwnd != 0 {
            let _ = PostMessageW(HWND(hwnd), WM_CLOSE, WPARAM(0), LPARAM(0));
        }
    }
    BOOL(1)
}
