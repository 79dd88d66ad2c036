#![cfg(feature = "io")]
//! File I/O bindings against real files in a temporary directory.

use corvid_std::sys::{O_APPEND, O_CREAT, O_EXCL, O_RDONLY, O_RDWR, O_TRUNC, O_WRONLY};
use corvid_std::FileTable;
use vm::{GuestAddr, MemoryError, Register, RuntimeError, Status, Vm, VmConfig};

const PATH: u64 = 0x100;
const BUF: u64 = 0x400;

fn vm() -> Vm {
    let config = VmConfig::default().with_verify_contracts(true);
    let mut vm = Vm::new(config, corvid_std::natives().unwrap()).unwrap();
    vm.attach(FileTable::new());
    vm
}

fn open(vm: &mut Vm, path: &std::path::Path, flags: i32, mode: i64) -> (Status, i64) {
    let mut bytes = path.to_str().unwrap().as_bytes().to_vec();
    bytes.push(0);
    vm.load_image(GuestAddr(PATH), &bytes).unwrap();
    vm.set_register_int(Register::Q0, PATH as i64);
    vm.set_register_int(Register::D1, i64::from(flags));
    vm.set_register_int(Register::D2, mode);
    let status = vm.call_native("sys_open").unwrap();
    (status, vm.get_register_int(Register::D0))
}

fn io(
    vm: &mut Vm,
    symbol: &str,
    fd: i64,
    addr: u64,
    count: u64,
) -> Result<(Status, i64), RuntimeError> {
    vm.set_register_int(Register::D0, fd);
    vm.set_register_int(Register::Q1, addr as i64);
    vm.set_register_int(Register::Q2, count as i64);
    let status = vm.call_native(symbol)?;
    Ok((status, vm.get_register_int(Register::Q0)))
}

fn close(vm: &mut Vm, fd: i64) -> (Status, i64) {
    vm.set_register_int(Register::D0, fd);
    let status = vm.call_native("sys_close").unwrap();
    (status, vm.get_register_int(Register::D0))
}

#[test]
fn syscall_numbers_match_table_indices() {
    let table = corvid_std::natives().unwrap();
    assert_eq!(table.index_of("sys_open"), Some(0));
    assert_eq!(table.index_of("sys_close"), Some(1));
    assert_eq!(table.index_of("sys_read"), Some(2));
    assert_eq!(table.index_of("sys_write"), Some(3));
    assert_eq!(table.index_of("init_window"), Some(4));
}

#[test]
fn index_zero_dispatches_sys_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("by_index.txt");
    let mut bytes = path.to_str().unwrap().as_bytes().to_vec();
    bytes.push(0);

    let mut vm = vm();
    vm.load_image(GuestAddr(PATH), &bytes).unwrap();
    vm.set_register_int(Register::Q0, PATH as i64);
    vm.set_register_int(Register::D1, i64::from(O_WRONLY | O_CREAT));
    vm.set_register_int(Register::D2, 0o600);
    assert_eq!(vm.call_native_index(0), Ok(Status::OK));
    assert!(vm.get_register_int(Register::D0) >= 3);
    assert!(path.exists());
}

#[test]
fn write_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let mut vm = vm();

    let (status, fd) = open(&mut vm, &path, O_WRONLY | O_CREAT | O_TRUNC, 0o644);
    assert_eq!(status, Status::OK);
    assert!(fd >= 3);

    vm.load_image(GuestAddr(BUF), b"hello corvid").unwrap();
    assert_eq!(io(&mut vm, "sys_write", fd, BUF, 12), Ok((Status::OK, 12)));
    assert_eq!(close(&mut vm, fd), (Status::OK, 0));
    assert_eq!(std::fs::read(&path).unwrap(), b"hello corvid");

    let (status, fd) = open(&mut vm, &path, O_RDONLY, 0);
    assert_eq!(status, Status::OK);
    assert_eq!(io(&mut vm, "sys_read", fd, 0x800, 64), Ok((Status::OK, 12)));
    assert_eq!(
        vm.memory().read_bytes(GuestAddr(0x800), 12),
        Ok(&b"hello corvid"[..])
    );
    // End of file.
    assert_eq!(io(&mut vm, "sys_read", fd, 0x800, 64), Ok((Status::OK, 0)));
    assert_eq!(close(&mut vm, fd), (Status::OK, 0));
}

#[test]
fn append_keeps_existing_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    std::fs::write(&path, b"one\n").unwrap();
    let mut vm = vm();

    let (_, fd) = open(&mut vm, &path, O_WRONLY | O_APPEND, 0);
    vm.load_image(GuestAddr(BUF), b"two\n").unwrap();
    io(&mut vm, "sys_write", fd, BUF, 4).unwrap();
    close(&mut vm, fd);

    assert_eq!(std::fs::read(&path).unwrap(), b"one\ntwo\n");
}

#[test]
fn open_failure_reports_os_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut vm = vm();

    let (status, fd) = open(&mut vm, &dir.path().join("absent"), O_RDONLY, 0);
    assert_ne!(status, Status::OK);
    assert_eq!(fd, -1);

    let existing = dir.path().join("exists");
    std::fs::write(&existing, b"").unwrap();
    let (status, fd) = open(&mut vm, &existing, O_RDWR | O_CREAT | O_EXCL, 0o600);
    assert_ne!(status, Status::OK);
    assert_eq!(fd, -1);
}

#[test]
fn unknown_descriptor_is_ebadf() {
    let mut vm = vm();
    assert_eq!(close(&mut vm, 77), (Status(9), -1));
    assert_eq!(io(&mut vm, "sys_read", 77, BUF, 4), Ok((Status(9), -1)));
    assert_eq!(io(&mut vm, "sys_write", 77, BUF, 4), Ok((Status(9), -1)));
}

#[test]
fn buffer_is_bounds_checked_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    std::fs::write(&path, b"0123456789").unwrap();
    let mut vm = vm();
    let size = vm.memory().len() as u64;

    let (_, fd) = open(&mut vm, &path, O_RDONLY, 0);
    let err = io(&mut vm, "sys_read", fd, size - 4, 8).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Memory(MemoryError::OutOfBounds { len: 8, .. })
    ));

    // Nothing was consumed from the file.
    assert_eq!(io(&mut vm, "sys_read", fd, BUF, 10), Ok((Status::OK, 10)));
    assert_eq!(
        vm.memory().read_bytes(GuestAddr(BUF), 10),
        Ok(&b"0123456789"[..])
    );
}

#[test]
fn stdout_is_writable_and_closable() {
    let mut vm = vm();
    vm.load_image(GuestAddr(BUF), b"").unwrap();
    assert_eq!(io(&mut vm, "sys_write", 1, BUF, 0), Ok((Status::OK, 0)));
    vm.load_image(GuestAddr(BUF), b"partial").unwrap();
    assert_eq!(io(&mut vm, "sys_write", 1, BUF, 7), Ok((Status::OK, 7)));
    assert_eq!(io(&mut vm, "sys_write", 2, BUF, 7), Ok((Status::OK, 7)));
    assert_eq!(close(&mut vm, 1), (Status::OK, 0));
    assert_eq!(io(&mut vm, "sys_write", 1, BUF, 0), Ok((Status(9), -1)));
    assert!(!vm.host::<FileTable>().unwrap().is_open(1));
}
