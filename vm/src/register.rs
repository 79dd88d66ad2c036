use std::fmt;
use std::str::FromStr;

use crate::error::RuntimeError;

/// Number of general-purpose cells (`B*`/`W*`/`D*`/`Q*` views).
pub const GPR_COUNT: usize = 16;
/// Number of floating-point cells: `FF0..FF15` on cells 0-15 and
/// `DD0..DD15` on cells 16-31.
pub const FPR_COUNT: usize = 32;

const VIEWS_PER_SLOT: u8 = 6;
/// Number of distinct register names.
pub const REGISTER_COUNT: usize = GPR_COUNT * VIEWS_PER_SLOT as usize;

/// Width and kind a register name reads and writes its cell through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterView {
    Byte,
    Word,
    DWord,
    QWord,
    Float,
    Double,
}

impl RegisterView {
    const ALL: [RegisterView; VIEWS_PER_SLOT as usize] = [
        RegisterView::Byte,
        RegisterView::Word,
        RegisterView::DWord,
        RegisterView::QWord,
        RegisterView::Float,
        RegisterView::Double,
    ];

    /// Width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            RegisterView::Byte => 8,
            RegisterView::Word => 16,
            RegisterView::DWord | RegisterView::Float => 32,
            RegisterView::QWord | RegisterView::Double => 64,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, RegisterView::Float | RegisterView::Double)
    }

    const fn mask(self) -> u64 {
        match self.bits() {
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            RegisterView::Byte => "b",
            RegisterView::Word => "w",
            RegisterView::DWord => "d",
            RegisterView::QWord => "q",
            RegisterView::Float => "ff",
            RegisterView::Double => "dd",
        }
    }
}

/// Register names visible to guest code and native bindings.
///
/// The one-byte wire code of a register is its discriminant,
/// `slot * 6 + view`, with views ordered `B, W, D, Q, FF, DD`.
#[rustfmt::skip]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Register {
    B0, W0, D0, Q0, FF0, DD0,
    B1, W1, D1, Q1, FF1, DD1,
    B2, W2, D2, Q2, FF2, DD2,
    B3, W3, D3, Q3, FF3, DD3,
    B4, W4, D4, Q4, FF4, DD4,
    B5, W5, D5, Q5, FF5, DD5,
    B6, W6, D6, Q6, FF6, DD6,
    B7, W7, D7, Q7, FF7, DD7,
    B8, W8, D8, Q8, FF8, DD8,
    B9, W9, D9, Q9, FF9, DD9,
    B10, W10, D10, Q10, FF10, DD10,
    B11, W11, D11, Q11, FF11, DD11,
    B12, W12, D12, Q12, FF12, DD12,
    B13, W13, D13, Q13, FF13, DD13,
    B14, W14, D14, Q14, FF14, DD14,
    B15, W15, D15, Q15, FF15, DD15,
}

impl Register {
    #[rustfmt::skip]
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::B0, Register::W0, Register::D0, Register::Q0, Register::FF0, Register::DD0,
        Register::B1, Register::W1, Register::D1, Register::Q1, Register::FF1, Register::DD1,
        Register::B2, Register::W2, Register::D2, Register::Q2, Register::FF2, Register::DD2,
        Register::B3, Register::W3, Register::D3, Register::Q3, Register::FF3, Register::DD3,
        Register::B4, Register::W4, Register::D4, Register::Q4, Register::FF4, Register::DD4,
        Register::B5, Register::W5, Register::D5, Register::Q5, Register::FF5, Register::DD5,
        Register::B6, Register::W6, Register::D6, Register::Q6, Register::FF6, Register::DD6,
        Register::B7, Register::W7, Register::D7, Register::Q7, Register::FF7, Register::DD7,
        Register::B8, Register::W8, Register::D8, Register::Q8, Register::FF8, Register::DD8,
        Register::B9, Register::W9, Register::D9, Register::Q9, Register::FF9, Register::DD9,
        Register::B10, Register::W10, Register::D10, Register::Q10, Register::FF10, Register::DD10,
        Register::B11, Register::W11, Register::D11, Register::Q11, Register::FF11, Register::DD11,
        Register::B12, Register::W12, Register::D12, Register::Q12, Register::FF12, Register::DD12,
        Register::B13, Register::W13, Register::D13, Register::Q13, Register::FF13, Register::DD13,
        Register::B14, Register::W14, Register::D14, Register::Q14, Register::FF14, Register::DD14,
        Register::B15, Register::W15, Register::D15, Register::Q15, Register::FF15, Register::DD15,
    ];

    /// One-byte wire code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Slot number shown in the register name.
    #[inline]
    pub const fn slot(self) -> usize {
        (self.code() / VIEWS_PER_SLOT) as usize
    }

    #[inline]
    pub const fn view(self) -> RegisterView {
        RegisterView::ALL[(self.code() % VIEWS_PER_SLOT) as usize]
    }

    /// Register for `view` of cell `slot`, if the slot exists.
    pub fn from_parts(slot: usize, view: RegisterView) -> Option<Register> {
        if slot >= GPR_COUNT {
            return None;
        }
        let view_idx = RegisterView::ALL.iter().position(|v| *v == view)?;
        Some(Register::ALL[slot * VIEWS_PER_SLOT as usize + view_idx])
    }

    /// Index of the physical cell inside its bank. Integer views of one
    /// slot share a cell; `FF*` and `DD*` never do.
    #[inline]
    pub const fn cell_index(self) -> usize {
        match self.view() {
            RegisterView::Double => GPR_COUNT + self.slot(),
            _ => self.slot(),
        }
    }

    /// True when both names resolve to the same physical cell.
    #[inline]
    pub const fn shares_cell(self, other: Register) -> bool {
        self.view().is_float() == other.view().is_float()
            && self.cell_index() == other.cell_index()
    }
}

impl TryFrom<u8> for Register {
    type Error = RuntimeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Register::ALL
            .get(code as usize)
            .copied()
            .ok_or(RuntimeError::InvalidRegister(code))
    }
}

impl FromStr for Register {
    type Err = RuntimeError;

    /// Parses names like `d0`, `Q2` or `ff15`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let unknown = || RuntimeError::UnknownRegisterName(s.to_string());

        // Two-letter prefixes first so `dd3` is not taken as `d` + "d3".
        let (view, digits) = [
            RegisterView::Float,
            RegisterView::Double,
            RegisterView::Byte,
            RegisterView::Word,
            RegisterView::DWord,
            RegisterView::QWord,
        ]
        .into_iter()
        .find_map(|view| lower.strip_prefix(view.prefix()).map(|rest| (view, rest)))
        .ok_or_else(unknown)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unknown());
        }
        let slot: usize = digits.parse().map_err(|_| unknown())?;
        Register::from_parts(slot, view).ok_or_else(unknown)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.view().prefix(), self.slot())
    }
}

/// The register file: raw 64-bit cells, one bank for integers and one for
/// floating point. `FF*` and `DD*` live in separate float cells.
///
/// Cells are untyped. The view named by a [`Register`] only decides how many
/// bits are read or written. Every write replaces the whole cell,
/// zero-extended from the view width, so a narrow write never keeps stale
/// upper bits from an earlier wide one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registers {
    gpr: [u64; GPR_COUNT],
    fpr: [u64; FPR_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn cell(&self, reg: Register) -> u64 {
        if reg.view().is_float() {
            self.fpr[reg.cell_index()]
        } else {
            self.gpr[reg.slot()]
        }
    }

    #[inline]
    fn cell_mut(&mut self, reg: Register) -> &mut u64 {
        if reg.view().is_float() {
            &mut self.fpr[reg.cell_index()]
        } else {
            &mut self.gpr[reg.slot()]
        }
    }

    /// Raw bits of the view, zero-extended.
    #[inline]
    pub fn get(&self, reg: Register) -> u64 {
        self.cell(reg) & reg.view().mask()
    }

    /// Unsigned value of the view. Same as [`Registers::get`].
    #[inline]
    pub fn get_uint(&self, reg: Register) -> u64 {
        self.get(reg)
    }

    /// Truncate `bits` to the view width and overwrite the whole cell.
    #[inline]
    pub fn set(&mut self, reg: Register, bits: u64) {
        *self.cell_mut(reg) = bits & reg.view().mask();
    }

    /// Integer value of the view, sign-extended from its width.
    #[inline]
    pub fn get_int(&self, reg: Register) -> i64 {
        let shift = 64 - reg.view().bits();
        ((self.get(reg) << shift) as i64) >> shift
    }

    #[inline]
    pub fn set_int(&mut self, reg: Register, value: i64) {
        self.set(reg, value as u64);
    }

    /// 64-bit views decode as `f64`, everything narrower as `f32`.
    pub fn get_float(&self, reg: Register) -> f64 {
        let bits = self.get(reg);
        if reg.view().bits() == 64 {
            f64::from_bits(bits)
        } else {
            f32::from_bits(bits as u32) as f64
        }
    }

    pub fn set_float(&mut self, reg: Register, value: f64) {
        let bits = if reg.view().bits() == 64 {
            value.to_bits()
        } else {
            (value as f32).to_bits() as u64
        };
        self.set(reg, bits);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Cells that differ from `before`. Integer cells are named by their
    /// widest view (`Q*`), float cells by the only view they have.
    pub fn changed_since<'a>(
        &'a self,
        before: &'a Registers,
    ) -> impl Iterator<Item = Register> + 'a {
        let gpr = (0..GPR_COUNT)
            .filter(move |&i| self.gpr[i] != before.gpr[i])
            .filter_map(|i| Register::from_parts(i, RegisterView::QWord));
        let fpr = (0..FPR_COUNT)
            .filter(move |&i| self.fpr[i] != before.fpr[i])
            .filter_map(|i| match i.checked_sub(GPR_COUNT) {
                None => Register::from_parts(i, RegisterView::Float),
                Some(slot) => Register::from_parts(slot, RegisterView::Double),
            });
        gpr.chain(fpr)
    }
}
