//! Hop and path signature types.

use std::fmt;

use crate::trace::Origin;

/// Separator between hop names in a published path key.
pub const PATH_KEY_SEPARATOR: &str = "->";

/// One ranked position in a transaction path, e.g. the second `Upc` event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hop {
    pub origin: Origin,
    pub rank: u32,
}

impl Hop {
    pub fn new(origin: Origin, rank: u32) -> Self {
        Self { origin, rank }
    }

    /// Column name of this hop's timestamp, `<origin>_<rank>`.
    pub fn column_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.origin, self.rank)
    }
}

/// Ordered hop shape of one transaction instance.
///
/// Hops are stored in the chronological order of the row they came from.
/// Tables are keyed by the signature value itself, so two shapes never share a
/// table even if their rendered keys happen to look alike.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSignature(Vec<Hop>);

impl PathSignature {
    pub fn new(hops: Vec<Hop>) -> Self {
        Self(hops)
    }

    pub fn hops(&self) -> &[Hop] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Published path key: hop column names joined by `->`.
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(Hop::column_name)
            .collect::<Vec<_>>()
            .join(PATH_KEY_SEPARATOR)
    }

    /// Names of the adjacent-pair delay columns, `delay-<a>-><b>_us`.
    pub fn hop_delay_columns(&self) -> Vec<String> {
        self.0
            .windows(2)
            .map(|pair| format!("delay-{}->{}_us", pair[0], pair[1]))
            .collect()
    }
}

impl fmt::Display for PathSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(hops: &[(&str, u32)]) -> PathSignature {
        PathSignature::new(
            hops.iter()
                .map(|&(origin, rank)| Hop::new(Origin::from(origin), rank))
                .collect(),
        )
    }

    #[test]
    fn test_key_and_columns() {
        let s = sig(&[("Ims", 1), ("Upc", 1)]);
        assert_eq!(s.key(), "Ims_1->Upc_1");
        assert_eq!(s.hop_delay_columns(), vec!["delay-Ims_1->Upc_1_us"]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_order_matters() {
        let a = sig(&[("Ims", 1), ("Upc", 1)]);
        let b = sig(&[("Upc", 1), ("Ims", 1)]);
        assert_ne!(a, b);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_rank_matters() {
        assert_ne!(sig(&[("Upc", 1), ("Ims", 1)]), sig(&[("Upc", 2), ("Ims", 2)]));
    }

    #[test]
    fn test_unknown_origin_treated_like_known() {
        let s = sig(&[("Gnb", 3), ("Upc", 3)]);
        assert_eq!(s.key(), "Gnb_3->Upc_3");
    }
}
