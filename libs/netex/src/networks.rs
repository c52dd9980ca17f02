//! Electrical networks of realized ports and wires.

use ena::unify::{InPlaceUnificationTable, UnifyKey};

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NetKey(u32);

impl UnifyKey for NetKey {
    type Value = ();

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        Self(u)
    }

    fn tag() -> &'static str {
        "NetKey"
    }
}

/// A union-find table of networks.
pub struct Networks {
    table: InPlaceUnificationTable<NetKey>,
}

impl Default for Networks {
    fn default() -> Self {
        Self {
            table: InPlaceUnificationTable::new(),
        }
    }
}

impl std::fmt::Debug for Networks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Networks")
            .field("len", &self.table.len())
            .finish()
    }
}

impl Networks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a network connected to nothing.
    pub fn new_net(&mut self) -> NetKey {
        self.table.new_key(())
    }

    /// Connects two networks.
    pub fn union(&mut self, a: NetKey, b: NetKey) {
        self.table.union(a, b);
    }

    /// The representative of `net`.
    pub fn find(&mut self, net: NetKey) -> NetKey {
        self.table.find(net)
    }

    pub fn same(&mut self, a: NetKey, b: NetKey) -> bool {
        self.find(a) == self.find(b)
    }

    /// The distinct networks among `nets`, as sorted representatives.
    pub fn distinct(&mut self, nets: impl IntoIterator<Item = NetKey>) -> Vec<NetKey> {
        let mut out: Vec<NetKey> = nets.into_iter().map(|n| self.find(n)).collect();
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_joins_networks() {
        let mut nets = Networks::new();
        let a = nets.new_net();
        let b = nets.new_net();
        let c = nets.new_net();
        assert_eq!(nets.distinct([a, b, c]).len(), 3);
        nets.union(a, c);
        assert!(nets.same(a, c));
        assert!(!nets.same(a, b));
        assert_eq!(nets.distinct([a, b, c]).len(), 2);
    }
}
