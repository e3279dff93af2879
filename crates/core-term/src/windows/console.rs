//! Thin wrapper around the Win32 console handles and mode bits, mirroring
//! the scoped-guard shape of the POSIX termios guard: acquire on `init`,
//! restore on `close`/`Drop`.

use crate::BackendError;
use std::sync::Mutex;
use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::System::Console::{
    GetConsoleMode, GetConsoleScreenBufferInfo, GetStdHandle, SetConsoleMode,
    CONSOLE_SCREEN_BUFFER_INFO, ENABLE_EXTENDED_FLAGS, ENABLE_MOUSE_INPUT,
    ENABLE_PROCESSED_INPUT, ENABLE_VIRTUAL_TERMINAL_PROCESSING, ENABLE_WINDOW_INPUT,
    STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};

pub struct ConsoleHandles {
    stdin: HANDLE,
    stdout: HANDLE,
    original_input_mode: u32,
    original_output_mode: u32,
    current_input_mode: Mutex<u32>,
}

fn last_os_error() -> BackendError {
    BackendError::Io(std::io::Error::last_os_error())
}

impl ConsoleHandles {
    pub fn acquire() -> Result<Self, BackendError> {
        unsafe {
            let stdin = GetStdHandle(STD_INPUT_HANDLE);
            let stdout = GetStdHandle(STD_OUTPUT_HANDLE);

            let mut original_input_mode = 0u32;
            if GetConsoleMode(stdin, &mut original_input_mode) == 0 {
                return Err(last_os_error());
            }
            let mut original_output_mode = 0u32;
            if GetConsoleMode(stdout, &mut original_output_mode) == 0 {
                return Err(last_os_error());
            }

            let raw_input_mode =
                ENABLE_EXTENDED_FLAGS | ENABLE_WINDOW_INPUT | ENABLE_PROCESSED_INPUT;
            if SetConsoleMode(stdin, raw_input_mode) == 0 {
                return Err(last_os_error());
            }

            Ok(ConsoleHandles {
                stdin,
                stdout,
                original_input_mode,
                original_output_mode,
                current_input_mode: Mutex::new(raw_input_mode),
            })
        }
    }

    /// Best-effort: returns `Ok(false)` rather than erroring on consoles
    /// that reject the flag (pre-Windows-10 conhost).
    pub fn enable_virtual_terminal_processing(&self) -> Result<bool, BackendError> {
        unsafe {
            let wanted = self.original_output_mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING;
            if SetConsoleMode(self.stdout, wanted) == 0 {
                return Ok(false);
            }
            let mut check = 0u32;
            GetConsoleMode(self.stdout, &mut check);
            Ok(check & ENABLE_VIRTUAL_TERMINAL_PROCESSING != 0)
        }
    }

    pub fn buffer_size(&self) -> Result<(u16, u16), BackendError> {
        unsafe {
            let mut info: CONSOLE_SCREEN_BUFFER_INFO = std::mem::zeroed();
            if GetConsoleScreenBufferInfo(self.stdout, &mut info) == 0 {
                return Err(last_os_error());
            }
            let width = (info.srWindow.Right - info.srWindow.Left + 1).max(0) as u16;
            let height = (info.srWindow.Bottom - info.srWindow.Top + 1).max(0) as u16;
            Ok((width, height))
        }
    }

    pub fn set_mouse_input(&self, enable: bool) -> Result<(), BackendError> {
        let mut mode = self.current_input_mode.lock().unwrap_or_else(|e| e.into_inner());
        let next = if enable {
            *mode | ENABLE_MOUSE_INPUT
        } else {
            *mode & !ENABLE_MOUSE_INPUT
        };
        unsafe {
            if SetConsoleMode(self.stdin, next) == 0 {
                return Err(last_os_error());
            }
        }
        *mode = next;
        Ok(())
    }

    pub fn stdin_handle(&self) -> HANDLE {
        self.stdin
    }

    pub fn stdout_handle(&self) -> HANDLE {
        self.stdout
    }

    pub fn restore(&self) -> Result<(), BackendError> {
        unsafe {
            SetConsoleMode(self.stdin, self.original_input_mode);
            SetConsoleMode(self.stdout, self.original_output_mode);
        }
        Ok(())
    }
}

// Win32 HANDLEs are thread-transferable; the reader thread only ever reads
// via `ReadConsoleInputW` while the owning session writes via the composer,
// and both are synchronized by the backend's own `&mut self`/Arc boundary.
unsafe impl Send for ConsoleHandles {}
unsafe impl Sync for ConsoleHandles {}
