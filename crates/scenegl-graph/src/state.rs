//! Graphics pipeline state: the values state nodes override, and the driver that owns them.
//!
//! Overrides are scoped to one draw: the driver is snapshotted per kind, the overrides are applied
//! in declaration order, the node draws, and the snapshots are written back in the same order.

use std::collections::HashMap;

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

named_enum!(BlendFactor {
    Zero => "zero",
    One => "one",
    SrcColor => "src_color",
    OneMinusSrcColor => "one_minus_src_color",
    DstColor => "dst_color",
    OneMinusDstColor => "one_minus_dst_color",
    SrcAlpha => "src_alpha",
    OneMinusSrcAlpha => "one_minus_src_alpha",
    DstAlpha => "dst_alpha",
    OneMinusDstAlpha => "one_minus_dst_alpha",
});

named_enum!(BlendOp {
    Add => "add",
    Subtract => "sub",
    ReverseSubtract => "revsub",
    Min => "min",
    Max => "max",
});

named_enum!(CompareOp {
    Never => "never",
    Less => "less",
    Equal => "equal",
    LessEqual => "lequal",
    Greater => "greater",
    NotEqual => "notequal",
    GreaterEqual => "gequal",
    Always => "always",
});

named_enum!(StencilOp {
    Keep => "keep",
    Zero => "zero",
    Replace => "replace",
    Increment => "incr",
    IncrementWrap => "incr_wrap",
    Decrement => "decr",
    DecrementWrap => "decr_wrap",
    Invert => "invert",
});

named_enum!(PolygonMode {
    Fill => "fill",
    Line => "line",
    Point => "point",
});

named_enum!(
    /// Toggleable pipeline capabilities.
    Capability {
        DepthTest => "depth_test",
        CullFace => "cull_face",
        ScissorTest => "scissor_test",
        Dither => "dither",
        PolygonOffsetFill => "polygon_offset_fill",
        SampleAlphaToCoverage => "sample_alpha_to_coverage",
    }
);

impl Capability {
    /// Power-on value of the capability.
    pub fn default_enabled(self) -> bool {
        matches!(self, Capability::Dither)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub enabled: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub color_op: BlendOp,
    pub alpha_op: BlendOp,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            color_op: BlendOp::Add,
            alpha_op: BlendOp::Add,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilState {
    pub enabled: bool,
    pub write_mask: u32,
    pub func: CompareOp,
    pub reference: i32,
    pub read_mask: u32,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub depth_pass: StencilOp,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            enabled: false,
            write_mask: u32::MAX,
            func: CompareOp::Always,
            reference: 0,
            read_mask: u32::MAX,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            depth_pass: StencilOp::Keep,
        }
    }
}

/// Which slice of pipeline state a value covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Blend,
    Stencil,
    ColorMask,
    PolygonMode,
    Capability(Capability),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateValue {
    Blend(BlendState),
    Stencil(StencilState),
    ColorMask([bool; 4]),
    PolygonMode(PolygonMode),
    Capability(Capability, bool),
}

impl StateValue {
    pub fn kind(&self) -> StateKind {
        match self {
            StateValue::Blend(_) => StateKind::Blend,
            StateValue::Stencil(_) => StateKind::Stencil,
            StateValue::ColorMask(_) => StateKind::ColorMask,
            StateValue::PolygonMode(_) => StateKind::PolygonMode,
            StateValue::Capability(cap, _) => StateKind::Capability(*cap),
        }
    }
}

/// Owner of the live pipeline state of one execution context.
pub trait StateDriver {
    fn read(&mut self, kind: StateKind) -> StateValue;
    fn write(&mut self, value: &StateValue);
}

/// In-memory driver. Records every write so callers can check what reached the pipeline.
#[derive(Debug, Clone)]
pub struct SoftwareStateDriver {
    blend: BlendState,
    stencil: StencilState,
    color_mask: [bool; 4],
    polygon_mode: PolygonMode,
    caps: HashMap<Capability, bool>,
    writes: Vec<StateValue>,
}

impl Default for SoftwareStateDriver {
    fn default() -> Self {
        Self {
            blend: BlendState::default(),
            stencil: StencilState::default(),
            color_mask: [true; 4],
            polygon_mode: PolygonMode::Fill,
            caps: Capability::ALL.iter().map(|c| (*c, c.default_enabled())).collect(),
            writes: Vec::new(),
        }
    }
}

impl SoftwareStateDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[StateValue] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl StateDriver for SoftwareStateDriver {
    fn read(&mut self, kind: StateKind) -> StateValue {
        match kind {
            StateKind::Blend => StateValue::Blend(self.blend),
            StateKind::Stencil => StateValue::Stencil(self.stencil),
            StateKind::ColorMask => StateValue::ColorMask(self.color_mask),
            StateKind::PolygonMode => StateValue::PolygonMode(self.polygon_mode),
            StateKind::Capability(cap) => {
                let on = self.caps.get(&cap).copied().unwrap_or(cap.default_enabled());
                StateValue::Capability(cap, on)
            }
        }
    }

    fn write(&mut self, value: &StateValue) {
        match *value {
            StateValue::Blend(b) => self.blend = b,
            StateValue::Stencil(s) => self.stencil = s,
            StateValue::ColorMask(m) => self.color_mask = m,
            StateValue::PolygonMode(p) => self.polygon_mode = p,
            StateValue::Capability(cap, on) => {
                self.caps.insert(cap, on);
            }
        }
        self.writes.push(*value);
    }
}

/// Snapshot each overridden kind, then apply the overrides. Returns the snapshots in
/// application order.
///
/// A kind overridden twice is snapshotted once, before its first override, so restoring always
/// lands on the value the caller had set.
pub(crate) fn apply_overrides(driver: &mut dyn StateDriver, overrides: &[StateValue]) -> Vec<StateValue> {
    let mut saved: Vec<StateValue> = Vec::with_capacity(overrides.len());
    for value in overrides {
        let kind = value.kind();
        if !saved.iter().any(|s| s.kind() == kind) {
            saved.push(driver.read(kind));
        }
        driver.write(value);
    }
    saved
}

/// Write snapshots back in the order they were taken.
pub(crate) fn restore(driver: &mut dyn StateDriver, saved: &[StateValue]) {
    for value in saved {
        driver.write(value);
    }
}
