//! Multiply/divide ratios relative to the master tick.

/// Largest multiply value a channel accepts.
pub const MAX_MULTIPLY: u8 = 99;

/// Largest divide value a channel accepts.
pub const MAX_DIVIDE: u8 = 99;

/// The master's own divide. It is the timing reference and is never disabled.
pub const MASTER_DIVIDE: u32 = 1;

/// Greatest common divisor. `gcd(0, n) == n`.
pub const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple. Returns 0 if either side is 0.
pub const fn lcm(a: u32, b: u32) -> u32 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// A channel's tick rate relative to the master: `multiply` ticks per `divide` master ticks.
///
/// `divide == 0` marks a disabled channel, `multiply == 0` a muted one that keeps timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ratio {
    multiply: u8,
    divide: u8,
}

impl Default for Ratio {
    fn default() -> Self {
        Self::UNITY
    }
}

impl Ratio {
    /// 1:1, the master's own rate.
    pub const UNITY: Ratio = Ratio { multiply: 1, divide: 1 };

    /// Create a ratio, clamping both sides to their valid range.
    ///
    /// `divide` may only be 0 when `allow_disable` is set.
    pub fn new(multiply: u8, divide: u8, allow_disable: bool) -> Self {
        let min_divide = if allow_disable { 0 } else { 1 };
        Self {
            multiply: multiply.min(MAX_MULTIPLY),
            divide: divide.clamp(min_divide, MAX_DIVIDE),
        }
    }

    pub const fn multiply(self) -> u8 {
        self.multiply
    }

    pub const fn divide(self) -> u8 {
        self.divide
    }

    pub const fn is_disabled(self) -> bool {
        self.divide == 0
    }

    pub const fn is_muted(self) -> bool {
        self.multiply == 0
    }

    /// Reduce by the GCD of both sides. A muted ratio reduces to 0:1,
    /// a disabled one stays as is.
    pub const fn simplified(self) -> Self {
        if self.divide == 0 {
            return self;
        }
        let g = gcd(self.multiply as u32, self.divide as u32);
        Self {
            multiply: (self.multiply as u32 / g) as u8,
            divide: (self.divide as u32 / g) as u8,
        }
    }

    /// Raw `multiply / divide`, 0.0 for a disabled channel.
    pub fn value(self) -> f64 {
        if self.divide == 0 {
            return 0.0;
        }
        self.multiply as f64 / self.divide as f64
    }

    /// Ratio used to derive a timer period. Never zero, negative or non-finite:
    /// muted and disabled channels time at 1.0.
    pub fn timing_value(self) -> f64 {
        let v = self.value();
        if v > 0.0 && v.is_finite() {
            v
        } else {
            1.0
        }
    }

    /// Step `multiply` by one in either direction, staying in range.
    pub fn step_multiply(self, up: bool) -> Self {
        let multiply = if up {
            self.multiply.saturating_add(1).min(MAX_MULTIPLY)
        } else {
            self.multiply.saturating_sub(1)
        };
        Self { multiply, ..self }
    }

    /// Step `divide` by one in either direction, staying in range.
    pub fn step_divide(self, up: bool, allow_disable: bool) -> Self {
        let min_divide = if allow_disable { 0 } else { 1 };
        let divide = if up {
            self.divide.saturating_add(1).min(MAX_DIVIDE)
        } else {
            self.divide.saturating_sub(1).max(min_divide)
        };
        Self { divide, ..self }
    }

    /// Number of master ticks between hard realignments of this channel.
    /// 0 means the channel never realigns on its own (disabled).
    pub const fn alignment_period(self) -> u32 {
        lcm(self.simplified().divide as u32, MASTER_DIVIDE)
    }
}

impl core::fmt::Display for Ratio {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_disabled() {
            write!(f, "off")
        } else {
            write!(f, "{}:{}", self.multiply, self.divide)
        }
    }
}
