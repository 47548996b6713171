//! Hierarchical cell addresses and same-level neighbour lookup

use crate::config::MAX_OCTREE_LEVEL;

use super::face::Side;

/// Child position within a parent cell
/// a=000 (x-,y-,z-)  e=100 (x+,y-,z-)
/// b=001 (x-,y-,z+)  f=101 (x+,y-,z+)
/// c=010 (x-,y+,z-)  g=110 (x+,y+,z-)
/// d=011 (x-,y+,z+)  h=111 (x+,y+,z+)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Octant {
    A = 0, // 000
    B = 1, // 001
    C = 2, // 010
    D = 3, // 011
    E = 4, // 100
    F = 5, // 101
    G = 6, // 110
    H = 7, // 111
}

impl Octant {
    pub const ALL: [Octant; 8] = [
        Octant::A,
        Octant::B,
        Octant::C,
        Octant::D,
        Octant::E,
        Octant::F,
        Octant::G,
        Octant::H,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Offset of this octant's min corner in units of the child size
    pub fn offset(self) -> glam::IVec3 {
        let idx = self.index();
        glam::IVec3::new(
            ((idx & 0b100) != 0) as i32,
            ((idx & 0b010) != 0) as i32,
            ((idx & 0b001) != 0) as i32,
        )
    }
}

const SLOTS: usize = MAX_OCTREE_LEVEL as usize;

/// Path of child choices from the root
///
/// Slot `level - 1` holds `octant + 1` for the choice made at that level;
/// unused slots are zero, so the root address is all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address {
    slots: [u8; SLOTS],
}

impl Address {
    pub const ROOT: Address = Address { slots: [0; SLOTS] };

    /// Address of the child at `octant` below this one
    pub fn child(&self, octant: Octant) -> Self {
        let mut slots = self.slots;
        if let Some(slot) = slots.iter_mut().find(|s| **s == 0) {
            *slot = octant.index() as u8 + 1;
        }
        Self { slots }
    }

    /// Depth of the addressed cell (root is 0)
    pub fn level(&self) -> usize {
        self.slots.iter().take_while(|s| **s != 0).count()
    }

    /// Octant chosen at each level, root first
    pub fn path(&self) -> Vec<Octant> {
        self.slots
            .iter()
            .take_while(|s| **s != 0)
            .filter_map(|s| Octant::from_index(*s as usize - 1))
            .collect()
    }

    /// Address of the same-level cell across `side`
    ///
    /// Walks from the deepest choice upwards, mirroring each choice across
    /// the side's axis until one of them stays inside the common parent.
    /// The remaining shallower choices are shared. Returns `None` when the
    /// walk leaves the root, i.e. the cell touches the outer boundary.
    pub fn neighbour(&self, side: Side) -> Option<Self> {
        let bit = side.axis_bit() as u8;
        let mut slots = self.slots;

        for slot in slots.iter_mut().rev() {
            if *slot == 0 {
                continue;
            }
            let octant = *slot - 1;
            *slot = (octant ^ bit) + 1;

            let towards_positive = octant & bit == 0;
            if towards_positive == side.is_positive() {
                return Some(Self { slots });
            }
        }
        None
    }
}
