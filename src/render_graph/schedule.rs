//! Pass results and the ping-pong blur schedule.
//!
//! Each pass of a frame returns the [`SurfaceId`] it wrote, and the next pass
//! binds exactly that surface as input. The blur schedule is plain data so its
//! parity can be checked without a GPU.

/// One of the two ping-pong blur surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PingPongSlot {
    First,
    Second,
}

impl PingPongSlot {
    pub fn index(self) -> usize {
        match self {
            PingPongSlot::First => 0,
            PingPongSlot::Second => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            PingPongSlot::First => PingPongSlot::Second,
            PingPongSlot::Second => PingPongSlot::First,
        }
    }

    /// Destination slot for a blur pass along the given axis.
    ///
    /// Horizontal passes write the second surface, vertical passes the first.
    pub fn for_axis(horizontal: bool) -> Self {
        if horizontal {
            PingPongSlot::Second
        } else {
            PingPongSlot::First
        }
    }
}

/// Every color surface a pass can write or read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    /// Full shaded HDR color (geometry pass, attachment 0).
    HdrScene,
    /// Bright-only HDR color (geometry pass, attachment 1).
    HdrBright,
    PingPong(PingPongSlot),
}

/// The bright-pass extraction always writes here.
pub const BRIGHT_PASS_SLOT: PingPongSlot = PingPongSlot::First;

/// One iteration of the separable blur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurStep {
    pub iteration: u32,
    pub horizontal: bool,
    pub source: PingPongSlot,
    pub destination: PingPongSlot,
}

/// The `passes` blur iterations in order.
///
/// Iteration `i` blurs horizontally when `i` is even. Iteration 0 reads the
/// bright-pass output; every later iteration reads what the previous one wrote,
/// which is always the slot it does not write itself.
pub fn blur_schedule(passes: u32) -> impl Iterator<Item = BlurStep> {
    (0..passes).map(|iteration| {
        let horizontal = iteration % 2 == 0;
        let destination = PingPongSlot::for_axis(horizontal);
        let source = if iteration == 0 {
            BRIGHT_PASS_SLOT
        } else {
            PingPongSlot::for_axis(!horizontal)
        };
        BlurStep {
            iteration,
            horizontal,
            source,
            destination,
        }
    })
}

/// Slot holding the finished blur after `passes` iterations.
///
/// Odd counts end on a horizontal pass (second slot); even counts, including
/// zero, end in the first slot.
pub fn final_blur_slot(passes: u32) -> PingPongSlot {
    if passes % 2 == 1 {
        PingPongSlot::Second
    } else {
        BRIGHT_PASS_SLOT
    }
}

/// Output of the geometry pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryOutput {
    pub scene: SurfaceId,
    pub bright: SurfaceId,
    /// False when the mesh or the program was unavailable and nothing was drawn.
    pub drew_mesh: bool,
}

/// Output of the bright-pass extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrightPassOutput {
    pub bright: SurfaceId,
}

/// Output of the blur chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurOutput {
    pub blurred: SurfaceId,
    pub passes: u32,
}

/// Everything one frame produced, in pass order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOutput {
    pub geometry: GeometryOutput,
    pub bright: BrightPassOutput,
    pub blur: BlurOutput,
}
