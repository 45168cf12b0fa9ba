use std::fmt;

/// Globally unique identifier assigned to a block at compile time. Stable for
/// the block's whole lifetime between push and dispose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey(u64);

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block:{}", self.0)
    }
}

/// Hands out monotonically increasing [`BlockKey`]s. Owned by the JIT
/// compiler, which assigns a key to every block it instantiates.
#[derive(Debug, Default)]
pub struct KeyGenerator(u64);

impl KeyGenerator {
    pub fn new() -> Self {
        KeyGenerator(0)
    }

    pub fn next(&mut self) -> BlockKey {
        self.0 += 1;
        BlockKey(self.0)
    }
}
