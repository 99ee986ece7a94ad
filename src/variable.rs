use std::fmt;

/// 1-based word position in the sentence; 0 means "no word".
pub type Position = u16;

/// Fillers of one category variable: the word positions it is bound to, in
/// ascending order. More than one filler only arises under coordination
/// ("apples and pears"). The first slot doubles as the filled flag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Variable {
    fillers: [Position; Variable::CAPACITY],
}

impl Variable {
    pub const CAPACITY: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }
    pub fn filled(position: Position) -> Self {
        let mut fillers = [0; Self::CAPACITY];
        fillers[0] = position;
        Self { fillers }
    }
    pub fn is_filled(&self) -> bool {
        self.fillers[0] != 0
    }
    pub fn len(&self) -> usize {
        self.fillers.iter().take_while(|p| **p != 0).count()
    }
    pub fn is_empty(&self) -> bool {
        !self.is_filled()
    }
    pub fn fillers(&self) -> impl Iterator<Item = Position> + '_ {
        self.fillers.iter().copied().take_while(|p| *p != 0)
    }
    pub fn contains(&self, position: Position) -> bool {
        self.fillers().any(|p| p == position)
    }

    /// Sorted union of both filler chains. Fillers beyond the capacity are
    /// dropped from the high end.
    pub fn unify(&self, other: &Variable) -> Variable {
        if !other.is_filled() {
            return *self;
        }
        if !self.is_filled() {
            return *other;
        }
        let mut merged = [0; Self::CAPACITY];
        let (mut i, mut j, mut k) = (0, 0, 0);
        let (a, b) = (&self.fillers, &other.fillers);
        while k < Self::CAPACITY {
            let x = if i < Self::CAPACITY { a[i] } else { 0 };
            let y = if j < Self::CAPACITY { b[j] } else { 0 };
            let next = match (x, y) {
                (0, 0) => break,
                (0, y) => {
                    j += 1;
                    y
                }
                (x, 0) => {
                    i += 1;
                    x
                }
                (x, y) if x < y => {
                    i += 1;
                    x
                }
                (x, y) if y < x => {
                    j += 1;
                    y
                }
                (x, _) => {
                    i += 1;
                    j += 1;
                    x
                }
            };
            merged[k] = next;
            k += 1;
        }
        Variable { fillers: merged }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.fillers()).finish()
    }
}
