use std::{fmt, result};

use crate::rbt::Depth;

/// Statistic type, for [crate::rbt::Index]. Returned by a successful
/// [crate::rbt::Index::validate] call.
pub struct Stats {
    pub node_size: usize,
    pub n_keys: usize,
    pub n_values: usize,
    pub blacks: Option<usize>,
    pub depths: Option<Depth>,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let none = "none".to_string();
        let b = self.blacks.as_ref().map_or(none.clone(), |x| x.to_string());
        let d = self.depths.as_ref().map_or(none, |x| x.to_string());
        writeln!(
            f,
            "rbt = {{ n_keys={}, n_values={}, node_size={}, blacks={} }}",
            self.n_keys, self.n_values, self.node_size, b,
        )?;
        writeln!(f, "rbt.depths = {}", d)
    }
}
