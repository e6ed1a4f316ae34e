/// Chemical data the structure model needs from a periodic table.
///
/// Injected wherever formulas or sizes are computed, so callers can
/// substitute their own data source (or a stub in tests).
pub trait ElementData {
    /// Pauling electronegativity, `None` when undefined (noble gases) or unknown
    fn electronegativity(&self, symbol: &str) -> Option<f64>;
    /// Atomic radius in Angstroms
    fn atomic_radius(&self, symbol: &str) -> Option<f64>;
}

pub struct ElementInfo {
    pub symbol: &'static str,
    pub atomic_number: u8,
    pub electronegativity: Option<f64>,
    pub radius: f64,
}

const fn el(symbol: &'static str, atomic_number: u8, electronegativity: Option<f64>, radius: f64) -> ElementInfo {
    ElementInfo { symbol, atomic_number, electronegativity, radius }
}

/// Radii are covalent radii (Angstroms); electronegativities are Pauling values.
pub static ELEMENTS: &[ElementInfo] = &[
    // --- Period 1 ---
    el("H", 1, Some(2.20), 0.37), el("He", 2, None, 0.32),
    // --- Period 2 ---
    el("Li", 3, Some(0.98), 1.34), el("Be", 4, Some(1.57), 0.90), el("B", 5, Some(2.04), 0.82),
    el("C", 6, Some(2.55), 0.77), el("N", 7, Some(3.04), 0.75), el("O", 8, Some(3.44), 0.73),
    el("F", 9, Some(3.98), 0.71), el("Ne", 10, None, 0.69),
    // --- Period 3 ---
    el("Na", 11, Some(0.93), 1.54), el("Mg", 12, Some(1.31), 1.30), el("Al", 13, Some(1.61), 1.18),
    el("Si", 14, Some(1.90), 1.11), el("P", 15, Some(2.19), 1.06), el("S", 16, Some(2.58), 1.02),
    el("Cl", 17, Some(3.16), 0.99), el("Ar", 18, None, 0.97),
    // --- Period 4 ---
    el("K", 19, Some(0.82), 1.96), el("Ca", 20, Some(1.00), 1.74), el("Sc", 21, Some(1.36), 1.44),
    el("Ti", 22, Some(1.54), 1.36), el("V", 23, Some(1.63), 1.25), el("Cr", 24, Some(1.66), 1.27),
    el("Mn", 25, Some(1.55), 1.39), el("Fe", 26, Some(1.83), 1.25), el("Co", 27, Some(1.88), 1.26),
    el("Ni", 28, Some(1.91), 1.21), el("Cu", 29, Some(1.90), 1.38), el("Zn", 30, Some(1.65), 1.31),
    el("Ga", 31, Some(1.81), 1.26), el("Ge", 32, Some(2.01), 1.22), el("As", 33, Some(2.18), 1.19),
    el("Se", 34, Some(2.55), 1.16), el("Br", 35, Some(2.96), 1.14), el("Kr", 36, Some(3.00), 1.10),
    // --- Period 5 ---
    el("Rb", 37, Some(0.82), 2.16), el("Sr", 38, Some(0.95), 1.91), el("Y", 39, Some(1.22), 1.62),
    el("Zr", 40, Some(1.33), 1.48), el("Nb", 41, Some(1.60), 1.37), el("Mo", 42, Some(2.16), 1.45),
    el("Ru", 44, Some(2.20), 1.26), el("Rh", 45, Some(2.28), 1.35), el("Pd", 46, Some(2.20), 1.31),
    el("Ag", 47, Some(1.93), 1.53), el("Cd", 48, Some(1.69), 1.48), el("In", 49, Some(1.78), 1.44),
    el("Sn", 50, Some(1.96), 1.41), el("Sb", 51, Some(2.05), 1.38), el("Te", 52, Some(2.10), 1.35),
    el("I", 53, Some(2.66), 1.33), el("Xe", 54, Some(2.60), 1.30),
    // --- Period 6 (Selected) ---
    el("Cs", 55, Some(0.79), 2.25), el("Ba", 56, Some(0.89), 1.98), el("La", 57, Some(1.10), 1.69),
    el("Hf", 72, Some(1.30), 1.50), el("Ta", 73, Some(1.50), 1.38), el("W", 74, Some(2.36), 1.46),
    el("Pt", 78, Some(2.28), 1.28), el("Au", 79, Some(2.54), 1.44), el("Hg", 80, Some(2.00), 1.49),
    el("Pb", 82, Some(2.33), 1.47), el("Bi", 83, Some(2.02), 1.46),
];

pub fn lookup(symbol: &str) -> Option<&'static ElementInfo> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Built-in table backed by [`ELEMENTS`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PeriodicTable;

impl ElementData for PeriodicTable {
    fn electronegativity(&self, symbol: &str) -> Option<f64> {
        lookup(symbol).and_then(|e| e.electronegativity)
    }

    fn atomic_radius(&self, symbol: &str) -> Option<f64> {
        lookup(symbol).map(|e| e.radius)
    }
}
