//! Wax-blend recipe catalogue
//!
//! Recipe codes are ledger data; only the descriptions and the sentinel
//! codes are fixed here.

pub const MFC_A: &str = "MFC-A";
pub const MFC_B: &str = "MFC-B";
pub const MFC_C: &str = "MFC-C";
pub const MFC_D: &str = "MFC-D";
pub const MFC_E: &str = "MFC-E";
pub const MFC_F: &str = "MFC-F";
pub const MFC_G: &str = "MFC-G";
pub const MFC_H: &str = "MFC-H";
pub const MFC_I: &str = "MFC-I";

/// Ledger marker for a formulation that failed in production
pub const FAILURE: &str = "ECHEC";

/// Ledger marker for a one-off formulation
pub const ONE_OFF: &str = "SPECIAL";

/// Output marker: the fragrance must be reformulated by the supplier
pub const REFORMULATION: &str = "REFORMULATION";

/// Failure and one-off markers are not recipes
pub fn is_sentinel(code: &str) -> bool {
    code == FAILURE || code == ONE_OFF
}

pub fn describe(code: &str) -> Option<&'static str> {
    let description = match code {
        MFC_A => "standard tripartite 49/36/5",
        MFC_B => "bipartite 80/10 without 6213",
        MFC_C => "reinforced tripartite 47/38/5",
        MFC_D => "cetyl-alcohol base",
        MFC_E => "high 5203",
        MFC_F => "pure 6213",
        MFC_G => "inverted tripartite (6213 at 49)",
        MFC_H => "pillar: paraffin 6670/DUB/Vybar",
        MFC_I => "vegetal: soy/Nafol/DUB",
        REFORMULATION => "supplier reformulation required",
        _ => return None,
    };
    Some(description)
}
