//! iRacing shared memory connection aligned with C++ SDK

use crate::{RelayError, Result, VariableType};
use std::ptr::NonNull;
use tracing::{debug, trace};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Memory::{
    FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
};
use windows::core::PCWSTR;

/// iRacing shared memory file name
const IRSDK_MEMMAPFILENAME: &str = "Local\\IRSDKMemMapFileName";
/// Expected SDK version
const IRSDK_VER: i32 = 2;
/// Connection status flag
const IRSDK_ST_CONNECTED: i32 = 1;
/// Maximum number of telemetry buffers
const IRSDK_MAX_BUFS: usize = 4;

/// Variable buffer containing tick count and offset information
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VarBuf {
    pub tick_count: i32, // Used to detect changes in data
    pub buf_offset: i32, // Offset from header
    pub pad: [i32; 2],   // 16-byte alignment
}

/// Variable header structure from iRacing SDK
#[repr(C)]
#[derive(Debug)]
struct IRSDKVarHeader {
    var_type: i32,
    offset: i32,
    count: i32,
    count_as_time: bool,
    pad: [u8; 3],
    name: [std::os::raw::c_char; 32],
    desc: [std::os::raw::c_char; 64],
    unit: [std::os::raw::c_char; 32],
}

impl IRSDKVarHeader {
    fn text(raw: &[std::os::raw::c_char]) -> String {
        let bytes: Vec<u8> = raw.iter().take_while(|c| **c != 0).map(|c| *c as u8).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn to_info(&self) -> Option<crate::VariableInfo> {
        let data_type = VariableType::from_irsdk(self.var_type)?;
        if self.offset < 0 || self.count <= 0 {
            return None;
        }
        Some(crate::VariableInfo {
            name: Self::text(&self.name),
            data_type,
            offset: self.offset as usize,
            count: self.count as usize,
            units: Self::text(&self.unit),
        })
    }
}

/// Main iRacing header structure matching C++ SDK exactly
#[repr(C)]
#[derive(Debug)]
pub struct IRSDKHeader {
    pub ver: i32,       // API header version (should be IRSDK_VER)
    pub status: i32,    // Bitfield using status flags
    pub tick_rate: i32, // Ticks per second (60 or 360 etc)

    // Session information, updated periodically
    pub session_info_update: i32,
    pub session_info_len: i32,
    pub session_info_offset: i32,

    // State data, output at tick_rate
    pub num_vars: i32,          // Length of array pointed to by var_header_offset
    pub var_header_offset: i32, // Offset to variable header array

    pub num_buf: i32,                      // Number of buffers (<= IRSDK_MAX_BUFS)
    pub buf_len: i32,                      // Length in bytes for one line
    pub pad1: [i32; 2],                    // 16-byte alignment
    pub var_buf: [VarBuf; IRSDK_MAX_BUFS], // Buffers of data being written to
}

/// Read-only mapping of iRacing's telemetry memory file
pub struct Connection {
    mapping: HANDLE,
    base: NonNull<u8>,
}

impl Connection {
    /// Attempt to map iRacing shared memory.
    ///
    /// Fails when the simulator has never created the memory file or reports an
    /// unsupported SDK version.
    pub fn try_connect() -> Result<Self> {
        trace!("Attempting to map iRacing shared memory");

        let mapping = unsafe {
            let wide_name = wide_string(IRSDK_MEMMAPFILENAME);
            OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR::from_raw(wide_name.as_ptr()))
                .map_err(|e| RelayError::windows_api_error("OpenFileMappingW", e))?
        };

        let base = unsafe {
            let ptr = MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, 0);
            match NonNull::new(ptr.Value as *mut u8) {
                Some(base) => base,
                None => {
                    let win_err = windows::core::Error::from_thread();
                    let _ = CloseHandle(mapping);
                    return Err(RelayError::windows_api_error("MapViewOfFile", win_err));
                }
            }
        };

        let connection = Self { mapping, base };
        connection.validate_connection()?;

        debug!("Mapped iRacing shared memory");
        Ok(connection)
    }

    /// Get direct access to the header
    pub fn header(&self) -> &IRSDKHeader {
        unsafe { &*(self.base.as_ptr() as *const IRSDKHeader) }
    }

    /// Check if iRacing reports an active session
    pub fn is_connected(&self) -> bool {
        let status = unsafe { std::ptr::read_volatile(&self.header().status) };
        status & IRSDK_ST_CONNECTED != 0
    }

    /// Run `f` over the most recent telemetry row.
    ///
    /// Uses the SDK's double-read pattern: the row is only accepted if the buffer's
    /// tick count did not change while `f` ran. Returns `None` when disconnected or
    /// when both attempts raced a write.
    pub fn with_latest_row<T>(&self, f: impl Fn(&[u8]) -> T) -> Option<T> {
        if !self.is_connected() {
            return None;
        }

        let header = self.header();
        let buf_len = usize::try_from(header.buf_len).ok()?;

        for attempt in 0..2 {
            let latest = &header.var_buf[self.find_latest_buffer(header)];
            let tick_before = unsafe { std::ptr::read_volatile(&latest.tick_count) };
            let offset = usize::try_from(latest.buf_offset).ok()?;
            let row = unsafe { std::slice::from_raw_parts(self.base.as_ptr().add(offset), buf_len) };
            let value = f(row);
            let tick_after = unsafe { std::ptr::read_volatile(&latest.tick_count) };

            if tick_before == tick_after {
                return Some(value);
            }
            trace!(attempt = attempt + 1, tick_before, tick_after, "Row changed during read");
        }

        None
    }

    /// Get all variable definitions from the header
    pub fn get_variables(&self) -> Vec<crate::VariableInfo> {
        let header = self.header();
        if header.num_vars <= 0 || header.var_header_offset <= 0 {
            return Vec::new();
        }

        let mut variables = Vec::with_capacity(header.num_vars as usize);

        unsafe {
            let var_header_ptr = self.base.as_ptr().add(header.var_header_offset as usize);

            for i in 0..header.num_vars as usize {
                let var_ptr = var_header_ptr.add(i * std::mem::size_of::<IRSDKVarHeader>());
                let var_header = &*(var_ptr as *const IRSDKVarHeader);

                match var_header.to_info() {
                    Some(info) => variables.push(info),
                    None => trace!(index = i, var_type = var_header.var_type, "Skipping variable"),
                }
            }
        }

        variables
    }

    fn validate_connection(&self) -> Result<()> {
        let header = self.header();

        if header.ver != IRSDK_VER {
            return Err(RelayError::Version { expected: IRSDK_VER as u32, found: header.ver as u32 });
        }

        debug!(
            ver = header.ver,
            num_vars = header.num_vars,
            num_buf = header.num_buf,
            "Validated iRacing header"
        );

        Ok(())
    }

    /// Find the buffer with the highest tick count
    fn find_latest_buffer(&self, header: &IRSDKHeader) -> usize {
        let num_buf = (header.num_buf.max(1) as usize).min(IRSDK_MAX_BUFS);
        let mut latest = 0;
        for i in 1..num_buf {
            if header.var_buf[latest].tick_count < header.var_buf[i].tick_count {
                latest = i;
            }
        }
        latest
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        unsafe {
            let addr = MEMORY_MAPPED_VIEW_ADDRESS { Value: self.base.as_ptr() as *mut _ };
            let _ = UnmapViewOfFile(addr);
            let _ = CloseHandle(self.mapping);
        }
    }
}

// SAFETY: the mapping is read-only and the handle is a kernel object, both usable
// from any thread.
unsafe impl Send for Connection {}
unsafe impl Sync for Connection {}

/// Convert string to null-terminated wide string for Windows APIs
fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}
