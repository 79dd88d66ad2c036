//! File I/O bindings.
//!
//! Guest code never sees a host file handle. It gets small integer
//! descriptors from a [`FileTable`] owned by the VM; `0`, `1` and `2` are
//! the process's standard streams.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};

use tracing::{debug, info};
use vm::marshal::{arg_addr, arg_cstr, arg_i32, arg_uint, ret_int};
use vm::{NativeDescriptor, Operand, Register, RuntimeError, Status, Vm};

// Linux open(2) flag values.
pub const O_RDONLY: i32 = 0;
pub const O_WRONLY: i32 = 1;
pub const O_RDWR: i32 = 2;
pub const O_CREAT: i32 = 0x40;
pub const O_EXCL: i32 = 0x80;
pub const O_TRUNC: i32 = 0x200;
pub const O_APPEND: i32 = 0x400;

const O_ACCMODE: i32 = 3;
const EBADF: i32 = 9;
const EINVAL: i32 = 22;

#[derive(Debug, thiserror::Error)]
pub enum SysError {
    #[error("bad file descriptor {0}")]
    BadDescriptor(i32),
    #[error("invalid open flags {0:#x}")]
    InvalidFlags(i32),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SysError {
    /// Status handed back to the guest: the OS error code when there is one.
    pub fn status(&self) -> Status {
        match self {
            SysError::BadDescriptor(_) => Status(EBADF),
            SysError::InvalidFlags(_) => Status(EINVAL),
            SysError::Io(e) => Status(e.raw_os_error().unwrap_or(1)),
        }
    }
}

#[derive(Debug)]
enum Handle {
    Stdin,
    Stdout,
    Stderr,
    File(File),
}

/// Descriptor table for one VM.
#[derive(Debug)]
pub struct FileTable {
    handles: HashMap<i32, Handle>,
    next_fd: i32,
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTable {
    pub fn new() -> Self {
        let handles = HashMap::from([
            (0, Handle::Stdin),
            (1, Handle::Stdout),
            (2, Handle::Stderr),
        ]);
        Self { handles, next_fd: 3 }
    }

    pub fn is_open(&self, fd: i32) -> bool {
        self.handles.contains_key(&fd)
    }

    /// Number of open descriptors, standard streams included.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn open(&mut self, path: &str, flags: i32, mode: u32) -> Result<i32, SysError> {
        let options = open_options(flags, mode)?;
        let file = options.open(path)?;
        let fd = self.next_fd;
        self.next_fd += 1;
        self.handles.insert(fd, Handle::File(file));
        Ok(fd)
    }

    pub fn close(&mut self, fd: i32) -> Result<(), SysError> {
        self.handles
            .remove(&fd)
            .map(drop)
            .ok_or(SysError::BadDescriptor(fd))
    }

    pub fn read(&mut self, fd: i32, buf: &mut [u8]) -> Result<usize, SysError> {
        let n = match self.handles.get_mut(&fd) {
            Some(Handle::Stdin) => io::stdin().read(buf)?,
            Some(Handle::File(file)) => file.read(buf)?,
            Some(Handle::Stdout | Handle::Stderr) => {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied).into())
            }
            None => return Err(SysError::BadDescriptor(fd)),
        };
        Ok(n)
    }

    pub fn write(&mut self, fd: i32, buf: &[u8]) -> Result<usize, SysError> {
        let n = match self.handles.get_mut(&fd) {
            Some(Handle::Stdout) => write_unbuffered(io::stdout().lock(), buf)?,
            Some(Handle::Stderr) => write_unbuffered(io::stderr().lock(), buf)?,
            Some(Handle::File(file)) => file.write(buf)?,
            Some(Handle::Stdin) => {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied).into())
            }
            None => return Err(SysError::BadDescriptor(fd)),
        };
        Ok(n)
    }
}

/// Guest writes to the standard streams show up immediately, newline or not.
pub(crate) fn write_unbuffered(mut out: impl Write, buf: &[u8]) -> io::Result<usize> {
    let n = out.write(buf)?;
    out.flush()?;
    Ok(n)
}

fn open_options(flags: i32, mode: u32) -> Result<OpenOptions, SysError> {
    let mut options = OpenOptions::new();
    match flags & O_ACCMODE {
        O_RDONLY => options.read(true),
        O_WRONLY => options.write(true),
        O_RDWR => options.read(true).write(true),
        _ => return Err(SysError::InvalidFlags(flags)),
    };
    if flags & O_APPEND != 0 {
        options.append(true);
    }
    if flags & O_TRUNC != 0 {
        options.truncate(true);
    }
    if flags & O_CREAT != 0 {
        if flags & O_EXCL != 0 {
            options.create_new(true);
        } else {
            options.create(true);
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _mode = mode;

    Ok(options)
}

// ======================================================================
// Bindings
// ======================================================================

fn fail(vm: &mut Vm, result: Register, symbol: &str, err: SysError) -> Status {
    debug!(symbol, error = %err, "sys call failed");
    ret_int(vm, result, -1);
    err.status()
}

pub fn native_sys_open(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let path = arg_cstr(vm, Register::Q0)?.to_owned();
    let flags = arg_i32(vm, Register::D1);
    let mode = arg_uint(vm, Register::D2) as u32;

    let opened = vm.host_mut::<FileTable>()?.open(&path, flags, mode);
    match opened {
        Ok(fd) => {
            info!(fd, path = %path, flags, "file opened");
            ret_int(vm, Register::D0, i64::from(fd));
            Ok(Status::OK)
        }
        Err(err) => Ok(fail(vm, Register::D0, "sys_open", err)),
    }
}

pub fn native_sys_close(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let fd = arg_i32(vm, Register::D0);
    let closed = vm.host_mut::<FileTable>()?.close(fd);
    match closed {
        Ok(()) => {
            info!(fd, "file closed");
            ret_int(vm, Register::D0, 0);
            Ok(Status::OK)
        }
        Err(err) => Ok(fail(vm, Register::D0, "sys_close", err)),
    }
}

/// Guest buffer length from a register. Lengths that do not fit the host
/// address space are left for the bounds check to reject.
fn buffer_len(vm: &Vm, reg: Register) -> usize {
    usize::try_from(arg_uint(vm, reg)).unwrap_or(usize::MAX)
}

pub fn native_sys_read(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let fd = arg_i32(vm, Register::D0);
    let addr = arg_addr(vm, Register::Q1);
    let count = buffer_len(vm, Register::Q2);

    let (files, mem) = vm.host_and_memory_mut::<FileTable>()?;
    let buf = mem.bytes_mut(addr, count)?;
    let read = files.read(fd, buf);
    match read {
        Ok(n) => {
            ret_int(vm, Register::Q0, n as i64);
            Ok(Status::OK)
        }
        Err(err) => Ok(fail(vm, Register::Q0, "sys_read", err)),
    }
}

pub fn native_sys_write(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let fd = arg_i32(vm, Register::D0);
    let addr = arg_addr(vm, Register::Q1);
    let count = buffer_len(vm, Register::Q2);

    let (files, mem) = vm.host_and_memory_mut::<FileTable>()?;
    let buf = mem.read_bytes(addr, count)?;
    let written = files.write(fd, buf);
    match written {
        Ok(n) => {
            ret_int(vm, Register::Q0, n as i64);
            Ok(Status::OK)
        }
        Err(err) => Ok(fail(vm, Register::Q0, "sys_write", err)),
    }
}

// Syscall numbers: open 0, close 1, read 2, write 3. `crate::natives` puts
// this table first so they are also the native indices.
pub const SYS_NATIVES: &[NativeDescriptor] = &[
    NativeDescriptor::new("sys_open", native_sys_open)
        .reads(&[
            Operand::CString(Register::Q0),
            Operand::Int(Register::D1),
            Operand::Int(Register::D2),
        ])
        .writes(&[Register::D0]),
    NativeDescriptor::new("sys_close", native_sys_close)
        .reads(&[Operand::Int(Register::D0)])
        .writes(&[Register::D0]),
    NativeDescriptor::new("sys_read", native_sys_read)
        .reads(&[
            Operand::Int(Register::D0),
            Operand::Buffer {
                addr: Register::Q1,
                len: Register::Q2,
            },
        ])
        .writes(&[Register::Q0])
        .blocking(),
    NativeDescriptor::new("sys_write", native_sys_write)
        .reads(&[
            Operand::Int(Register::D0),
            Operand::Buffer {
                addr: Register::Q1,
                len: Register::Q2,
            },
        ])
        .writes(&[Register::Q0])
        .blocking(),
];

const _: () = assert!(SYS_NATIVES.len() == 4);
