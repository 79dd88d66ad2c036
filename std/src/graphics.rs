//! Window and drawing bindings.
//!
//! The graphics library itself sits behind the [`Graphics`] trait and is
//! attached to the VM as a [`GraphicsContext`]. Each binding reads its
//! arguments from fixed registers, validates them, and forwards the call.

use tracing::info;
use vm::marshal::{arg_color, arg_cstr, arg_i32, ret_bool};
use vm::{NativeDescriptor, Operand, Register, RuntimeError, Status, Vm};

use vm::Color;

/// A width, height, fps or font size was out of range.
pub const STATUS_INVALID_ARGUMENT: Status = Status(1);
/// Drawing was requested before `init_window` (or after `close_window`).
pub const STATUS_WINDOW_NOT_OPEN: Status = Status(2);

/// Host graphics library.
pub trait Graphics {
    fn init_window(&mut self, width: i32, height: i32, title: &str);
    fn close_window(&mut self);
    fn is_window_ready(&self) -> bool;
    fn set_target_fps(&mut self, fps: i32);
    fn window_should_close(&mut self) -> bool;
    fn begin_drawing(&mut self);
    /// Finish the frame. May block until the next frame is due.
    fn end_drawing(&mut self);
    fn clear_background(&mut self, color: Color);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, font_size: i32, color: Color);
}

/// The graphics backend attached to one VM.
pub struct GraphicsContext {
    backend: Box<dyn Graphics>,
}

impl GraphicsContext {
    pub fn new(backend: impl Graphics + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn backend(&self) -> &dyn Graphics {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Graphics {
        self.backend.as_mut()
    }
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("window_ready", &self.backend.is_window_ready())
            .finish()
    }
}

fn graphics(vm: &mut Vm) -> Result<&mut dyn Graphics, RuntimeError> {
    Ok(vm.host_mut::<GraphicsContext>()?.backend_mut())
}

/// Open window ready for drawing, or `None` if there is none.
fn open_window(vm: &mut Vm) -> Result<Option<&mut dyn Graphics>, RuntimeError> {
    let gfx = graphics(vm)?;
    Ok(gfx.is_window_ready().then_some(gfx))
}

// ======================================================================
// Bindings
// ======================================================================

pub fn native_init_window(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let width = arg_i32(vm, Register::D0);
    let height = arg_i32(vm, Register::D1);
    let title = arg_cstr(vm, Register::Q2)?.to_owned();

    if width <= 0 || height <= 0 {
        return Ok(STATUS_INVALID_ARGUMENT);
    }
    graphics(vm)?.init_window(width, height, &title);
    info!(width, height, title = %title, "window opened");
    Ok(Status::OK)
}

pub fn native_close_window(vm: &mut Vm) -> Result<Status, RuntimeError> {
    graphics(vm)?.close_window();
    info!("window closed");
    Ok(Status::OK)
}

pub fn native_set_target_fps(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let fps = arg_i32(vm, Register::D0);
    if fps < 0 {
        return Ok(STATUS_INVALID_ARGUMENT);
    }
    graphics(vm)?.set_target_fps(fps);
    Ok(Status::OK)
}

pub fn native_window_should_close(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let close = graphics(vm)?.window_should_close();
    ret_bool(vm, Register::B0, close);
    Ok(Status::OK)
}

pub fn native_begin_drawing(vm: &mut Vm) -> Result<Status, RuntimeError> {
    match open_window(vm)? {
        Some(gfx) => gfx.begin_drawing(),
        None => return Ok(STATUS_WINDOW_NOT_OPEN),
    }
    Ok(Status::OK)
}

pub fn native_end_drawing(vm: &mut Vm) -> Result<Status, RuntimeError> {
    match open_window(vm)? {
        Some(gfx) => gfx.end_drawing(),
        None => return Ok(STATUS_WINDOW_NOT_OPEN),
    }
    Ok(Status::OK)
}

pub fn native_clear_background(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let color = arg_color(vm, Register::Q0)?;
    match open_window(vm)? {
        Some(gfx) => gfx.clear_background(color),
        None => return Ok(STATUS_WINDOW_NOT_OPEN),
    }
    Ok(Status::OK)
}

pub fn native_draw_text(vm: &mut Vm) -> Result<Status, RuntimeError> {
    let text = arg_cstr(vm, Register::Q0)?.to_owned();
    let x = arg_i32(vm, Register::D1);
    let y = arg_i32(vm, Register::D2);
    let font_size = arg_i32(vm, Register::D3);
    let color = arg_color(vm, Register::Q4)?;

    if font_size <= 0 {
        return Ok(STATUS_INVALID_ARGUMENT);
    }
    match open_window(vm)? {
        Some(gfx) => gfx.draw_text(&text, x, y, font_size, color),
        None => return Ok(STATUS_WINDOW_NOT_OPEN),
    }
    Ok(Status::OK)
}

// Registration order is the call index order.
pub const GRAPHICS_NATIVES: &[NativeDescriptor] = &[
    NativeDescriptor::new("init_window", native_init_window).reads(&[
        Operand::Int(Register::D0),
        Operand::Int(Register::D1),
        Operand::CString(Register::Q2),
    ]),
    NativeDescriptor::new("close_window", native_close_window),
    NativeDescriptor::new("set_target_fps", native_set_target_fps)
        .reads(&[Operand::Int(Register::D0)]),
    NativeDescriptor::new("window_should_close", native_window_should_close)
        .writes(&[Register::B0]),
    NativeDescriptor::new("begin_drawing", native_begin_drawing),
    NativeDescriptor::new("end_drawing", native_end_drawing).blocking(),
    NativeDescriptor::new("clear_background", native_clear_background).reads(&[
        Operand::Composite {
            addr: Register::Q0,
            size: Color::SIZE,
        },
    ]),
    NativeDescriptor::new("draw_text", native_draw_text).reads(&[
        Operand::CString(Register::Q0),
        Operand::Int(Register::D1),
        Operand::Int(Register::D2),
        Operand::Int(Register::D3),
        Operand::Composite {
            addr: Register::Q4,
            size: Color::SIZE,
        },
    ]),
];

const _: () = assert!(GRAPHICS_NATIVES.len() == 8);
